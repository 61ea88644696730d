//! Agent chat session — the tool-call dispatch loop.
//!
//! A session owns the conversation history, the tool registry, and a
//! [`ChatTransport`]. One call to [`AgentSession::send`] runs a full turn:
//! the user message and manifest are posted, the assistant reply is
//! appended, any tool calls it carries are dispatched against the registry,
//! and the turn auto-continues while the assistant keeps responding with
//! nothing but resolved tool calls.
//!
//! Turns are strictly sequential: a new message is rejected while the prior
//! turn still has unresolved tool calls. Executors within one assistant
//! message run concurrently; the turn resumes only once all of them settle.

use std::collections::HashSet;

use anyhow::{anyhow, bail, Context, Result};
use futures::future;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::gateway::chat::{ChatRequest, ChatResponse, ChatTransport, HttpChatTransport};
use crate::message::{normalize_messages, Role, ViewMessage, WireMessage};
use crate::tools::ToolRegistry;

/// Where the session stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Ready for the next user message.
    Idle,
    /// A chat round is in flight.
    AwaitingAssistant,
    /// The last assistant message has tool calls awaiting results
    /// (descriptive tools resolved via [`AgentSession::add_tool_result`]).
    ToolCallsPending,
    /// The last turn failed; the history up to the failure is kept.
    Failed,
}

/// A resolved tool call, recorded exactly once per call id.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool: String,
    pub output: String,
}

/// Outcome of dispatching one assistant message.
enum Dispatch {
    /// The message carried no tool calls.
    NoToolCalls,
    /// Some calls have no local executor and await external results.
    Pending,
    /// Every call in the message is resolved.
    Resolved,
}

pub struct AgentSession {
    transport: Box<dyn ChatTransport>,
    registry: ToolRegistry,
    messages: Vec<WireMessage>,
    /// Call ids already fed a result; executors never re-run for these.
    resolved_calls: HashSet<String>,
    results: Vec<ToolResult>,
    state: TurnState,
    max_tool_rounds: u32,
}

impl AgentSession {
    pub fn new(config: &GatewayConfig, registry: ToolRegistry) -> Self {
        Self::with_transport(
            Box::new(HttpChatTransport::new(config)),
            registry,
            config.max_tool_rounds,
        )
    }

    /// Builds a session over an arbitrary transport (scripted in tests).
    pub fn with_transport(
        transport: Box<dyn ChatTransport>,
        registry: ToolRegistry,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            transport,
            registry,
            messages: Vec::new(),
            resolved_calls: HashSet::new(),
            results: Vec::new(),
            state: TurnState::Idle,
            max_tool_rounds,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The raw wire history.
    pub fn messages(&self) -> &[WireMessage] {
        &self.messages
    }

    /// The history projected into the normalized view.
    pub fn view(&self) -> Vec<ViewMessage> {
        normalize_messages(&self.messages)
    }

    /// All tool results recorded so far, in resolution order.
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.results
    }

    /// The tool manifest advertised with every request.
    pub fn manifest(&self) -> Value {
        self.registry.manifest()
    }

    /// Runs one turn: sends `text` as a user message and processes the
    /// assistant's response, including tool-call rounds.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<()> {
        if self.state == TurnState::ToolCallsPending {
            bail!("previous turn has unresolved tool calls");
        }

        self.push_message(WireMessage::user_text(text));

        match self.run_rounds().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = TurnState::Failed;
                Err(e)
            }
        }
    }

    /// Supplies the result for a tool call the client could not execute
    /// locally. When this resolves the last outstanding call of the turn,
    /// the conversation continues automatically if warranted.
    pub async fn add_tool_result(
        &mut self,
        tool_call_id: &str,
        output: impl Into<String>,
    ) -> Result<()> {
        if self.resolved_calls.contains(tool_call_id) {
            bail!("tool call {tool_call_id} is already resolved");
        }

        let tool = {
            let last = self
                .messages
                .last()
                .ok_or_else(|| anyhow!("no assistant message to resolve"))?;
            let part = last
                .tool_calls()
                .find(|p| p.tool_call_id.as_deref() == Some(tool_call_id))
                .ok_or_else(|| anyhow!("unknown tool call id: {tool_call_id}"))?;
            part.tool_name().unwrap_or_default().to_string()
        };

        self.apply_results(vec![ToolResult {
            tool_call_id: tool_call_id.to_string(),
            tool,
            output: output.into(),
        }]);

        let (unresolved, continues) = match self.messages.last() {
            Some(m) => (
                m.tool_calls().any(|p| p.output.is_none()),
                ready_for_continuation(m),
            ),
            None => (false, false),
        };

        if unresolved {
            self.state = TurnState::ToolCallsPending;
            return Ok(());
        }

        if continues {
            match self.run_rounds().await {
                Ok(()) => Ok(()),
                Err(e) => {
                    self.state = TurnState::Failed;
                    Err(e)
                }
            }
        } else {
            self.state = TurnState::Idle;
            Ok(())
        }
    }

    // ── Turn loop ────────────────────────────────────────

    async fn run_rounds(&mut self) -> Result<()> {
        for round in 0..self.max_tool_rounds {
            self.state = TurnState::AwaitingAssistant;

            let request = ChatRequest {
                tools: self.registry.manifest(),
                messages: self.messages.clone(),
            };
            let ChatResponse { message } = self.transport.send(&request).await?;
            self.push_message(message);

            match self.dispatch_last().await? {
                Dispatch::NoToolCalls => {
                    self.state = TurnState::Idle;
                    return Ok(());
                }
                Dispatch::Pending => {
                    self.state = TurnState::ToolCallsPending;
                    return Ok(());
                }
                Dispatch::Resolved => {
                    let continues = self
                        .messages
                        .last()
                        .map(ready_for_continuation)
                        .unwrap_or(false);
                    if !continues {
                        self.state = TurnState::Idle;
                        return Ok(());
                    }
                    debug!("Round {} resolved all tool calls, continuing", round + 1);
                }
            }
        }

        warn!(
            "Turn exceeded {} tool-call rounds, aborting",
            self.max_tool_rounds
        );
        bail!(
            "exceeded {} tool-call rounds in one turn",
            self.max_tool_rounds
        )
    }

    /// Dispatches the tool calls of the last message.
    ///
    /// Unknown tool names and duplicate call ids are fatal for the turn:
    /// both indicate a manifest mismatch or a malformed assistant message,
    /// not a retryable condition.
    async fn dispatch_last(&mut self) -> Result<Dispatch> {
        let Some(last) = self.messages.last() else {
            return Ok(Dispatch::NoToolCalls);
        };
        if last.role != Role::Assistant {
            return Ok(Dispatch::NoToolCalls);
        }

        let mut seen = HashSet::new();
        let mut jobs = Vec::new();
        let mut pending = 0usize;
        let mut had_calls = false;

        for part in last.tool_calls() {
            had_calls = true;
            let name = part.tool_name().unwrap_or_default().to_string();
            let id = part
                .tool_call_id
                .clone()
                .ok_or_else(|| anyhow!("tool call for {name} is missing a call id"))?;
            if !seen.insert(id.clone()) {
                bail!("duplicate tool call id in assistant message: {id}");
            }
            if part.output.is_some() || self.resolved_calls.contains(&id) {
                continue;
            }

            let tool = self
                .registry
                .get(&name)
                .ok_or_else(|| anyhow!("tool not found: {name}"))?;
            match &tool.executor {
                Some(executor) => jobs.push((
                    id,
                    name,
                    executor.clone(),
                    part.input.clone().unwrap_or(Value::Null),
                )),
                // Descriptive-only tool: no local action, result comes
                // from elsewhere via add_tool_result().
                None => pending += 1,
            }
        }

        if !had_calls {
            return Ok(Dispatch::NoToolCalls);
        }

        // All executors of this message run concurrently.
        let results = future::try_join_all(jobs.into_iter().map(|(id, name, executor, input)| {
            async move {
                debug!("Executing tool {name} (call {id})");
                let output = executor
                    .execute(input)
                    .await
                    .with_context(|| format!("tool {name} failed (call {id})"))?;
                Ok::<ToolResult, anyhow::Error>(ToolResult {
                    tool_call_id: id,
                    tool: name,
                    output,
                })
            }
        }))
        .await?;

        self.apply_results(results);

        if pending > 0 {
            Ok(Dispatch::Pending)
        } else {
            Ok(Dispatch::Resolved)
        }
    }

    // ── History updates ──────────────────────────────────

    /// Appends a message by replacing the sequence wholesale; renderers
    /// holding the previous sequence never observe a partial update.
    fn push_message(&mut self, message: WireMessage) {
        let mut next = self.messages.clone();
        next.push(message);
        self.messages = next;
    }

    /// Writes outputs into the matching tool parts of the last message and
    /// records each result, once per call id.
    fn apply_results(&mut self, results: Vec<ToolResult>) {
        if results.is_empty() {
            return;
        }

        let mut next = self.messages.clone();
        if let Some(last) = next.last_mut() {
            for part in &mut last.parts {
                let Some(id) = part.tool_call_id.clone() else {
                    continue;
                };
                if let Some(result) = results.iter().find(|r| r.tool_call_id == id) {
                    part.output = Some(Value::String(result.output.clone()));
                }
            }
        }

        for result in &results {
            self.resolved_calls.insert(result.tool_call_id.clone());
        }
        self.results.extend(results);
        self.messages = next;
    }
}

/// True when the turn should auto-continue: the assistant message consists
/// of resolved tool calls with no trailing text after the final call.
fn ready_for_continuation(message: &WireMessage) -> bool {
    if message.role != Role::Assistant {
        return false;
    }
    let Some(last_tool) = message.parts.iter().rposition(|p| p.is_tool_call()) else {
        return false;
    };
    if message.tool_calls().any(|p| p.output.is_none()) {
        return false;
    }
    !message.parts[last_tool + 1..].iter().any(|p| {
        p.kind == "text"
            && p.text
                .as_deref()
                .map(|t| !t.trim().is_empty())
                .unwrap_or(false)
    })
}
