//! Conversation message model.
//!
//! Two layers:
//! - **Wire types** (`WireMessage`, `WirePart`) mirror the gateway payload,
//!   where a part's `type` field is a dynamic tag: `"text"` for text parts,
//!   `"tool-<name>"` for tool invocation parts, plus bookkeeping tags the
//!   client does not render (e.g. `"step-start"`).
//! - **View types** (`ViewMessage`, `Part`) are a closed sum renderers can
//!   match on exhaustively. The dynamic tag never leaves the wire layer.
//!
//! [`normalize_messages`] projects wire history into the view shape. It is a
//! pure function over the full sequence, recomputed on every history change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Prefix marking a tool invocation part on the wire.
const TOOL_TAG_PREFIX: &str = "tool-";

// ── Wire types ───────────────────────────────────────────

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Raw message part as exchanged with the gateway.
///
/// `kind` carries the dynamic tag. Only the fields relevant to the tag are
/// present; the rest serialize as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "toolCallId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl WirePart {
    /// A plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            tool_call_id: None,
            input: None,
            output: None,
        }
    }

    /// A tool invocation part with the dynamic `tool-<name>` tag.
    pub fn tool_call(name: &str, tool_call_id: impl Into<String>, input: Value) -> Self {
        Self {
            kind: format!("{TOOL_TAG_PREFIX}{name}"),
            text: None,
            tool_call_id: Some(tool_call_id.into()),
            input: Some(input),
            output: None,
        }
    }

    /// The tool name if this part carries a `tool-<name>` tag.
    pub fn tool_name(&self) -> Option<&str> {
        self.kind.strip_prefix(TOOL_TAG_PREFIX)
    }

    /// True for tool invocation parts.
    pub fn is_tool_call(&self) -> bool {
        self.tool_name().is_some()
    }

    /// True for tool invocation parts that already have an output.
    pub fn is_resolved(&self) -> bool {
        self.is_tool_call() && self.output.is_some()
    }
}

/// A conversation message in the gateway wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<WirePart>,
}

impl WireMessage {
    /// A user message with a single text part and a fresh id.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![WirePart::text(text)],
        }
    }

    /// Iterator over the tool invocation parts of this message.
    pub fn tool_calls(&self) -> impl Iterator<Item = &WirePart> {
        self.parts.iter().filter(|p| p.is_tool_call())
    }
}

// ── View types ───────────────────────────────────────────

/// Normalized message part — a closed sum renderers can branch on.
///
/// Serializes with an explicit `toolName` instead of the wire's dynamic tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    #[serde(rename = "tool")]
    ToolInvocation {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        input: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },
}

/// A message projected into the normalized view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

// ── Normalizer ───────────────────────────────────────────

/// Projects the wire history into the normalized view.
///
/// Never introduces or removes messages — only parts are filtered or
/// reshaped. Text parts pass through unchanged; `tool-<name>` parts are
/// rewritten with the name extracted from the tag suffix; anything else is
/// elided from the view (the underlying history keeps it).
pub fn normalize_messages(messages: &[WireMessage]) -> Vec<ViewMessage> {
    messages
        .iter()
        .map(|m| ViewMessage {
            id: m.id.clone(),
            role: m.role,
            parts: m.parts.iter().filter_map(normalize_part).collect(),
        })
        .collect()
}

fn normalize_part(part: &WirePart) -> Option<Part> {
    if part.kind == "text" {
        return Some(Part::Text {
            text: part.text.clone().unwrap_or_default(),
        });
    }
    if let Some(name) = part.tool_name() {
        return Some(Part::ToolInvocation {
            tool_name: name.to_string(),
            tool_call_id: part.tool_call_id.clone().unwrap_or_default(),
            input: part.input.clone().unwrap_or(Value::Null),
            output: part.output.clone(),
        });
    }
    None
}
