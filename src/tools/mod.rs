//! Tool registry — named capabilities advertised to the gateway model.
//!
//! A [`Tool`] is a description plus a JSON Schema for its input, optionally
//! backed by a local [`ToolExecutor`]. Executor-less tools are descriptive
//! only: the model sees them in the manifest but the client performs no
//! action when they are called.
//!
//! The registry is declared once at session construction and is immutable
//! for the session's lifetime.

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Executes a tool call issued by the model.
///
/// The input arrives already shaped by the model against the tool's declared
/// schema; it is not re-validated client-side. The returned string is fed
/// back into the conversation as the call's output.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, input: Value) -> anyhow::Result<String>;
}

/// Adapter turning a plain function into a [`ToolExecutor`].
struct FnExecutor<F>
where
    F: Fn(Value) -> anyhow::Result<String> + Send + Sync,
{
    f: F,
}

#[async_trait]
impl<F> ToolExecutor for FnExecutor<F>
where
    F: Fn(Value) -> anyhow::Result<String> + Send + Sync,
{
    async fn execute(&self, input: Value) -> anyhow::Result<String> {
        (self.f)(input)
    }
}

/// A named capability advertised to the model.
#[derive(Clone)]
pub struct Tool {
    /// Shown to the model so it knows when to invoke this tool.
    pub description: String,
    /// JSON Schema of the tool's input, sent verbatim in the manifest.
    pub input_schema: Value,
    /// Local executor; `None` for descriptive-only tools.
    pub executor: Option<Arc<dyn ToolExecutor>>,
}

impl Tool {
    /// A tool backed by a local executor.
    pub fn new(
        description: impl Into<String>,
        input_schema: Value,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            description: description.into(),
            input_schema,
            executor: Some(executor),
        }
    }

    /// A tool backed by a plain function.
    pub fn from_fn<F>(description: impl Into<String>, input_schema: Value, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self::new(description, input_schema, Arc::new(FnExecutor { f }))
    }

    /// A descriptive-only tool with no client-side action.
    pub fn descriptive(description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            description: description.into(),
            input_schema,
            executor: None,
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("executor", &self.executor.as_ref().map(|_| "<executor>"))
            .finish()
    }
}

/// Name-keyed tool registry.
///
/// Registering the same name twice shadows the earlier entry (last wins).
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tool under `name` and returns a reference to the stored
    /// entry. The stored tool is the registered value, unchanged.
    pub fn register(&mut self, name: impl Into<String>, tool: Tool) -> &Tool {
        let name = name.into();
        self.tools.insert(name.clone(), tool);
        &self.tools[&name]
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Iterator over registered tool names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Serializes the registry into the manifest shape sent with every chat
    /// request: `{ name: { "description": ..., "jsonSchema": ... } }`.
    pub fn manifest(&self) -> Value {
        let entries: Map<String, Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                let mut entry = Map::new();
                entry.insert(
                    "description".to_string(),
                    Value::String(tool.description.clone()),
                );
                entry.insert("jsonSchema".to_string(), tool.input_schema.clone());
                (name.clone(), Value::Object(entry))
            })
            .collect();
        Value::Object(entries)
    }
}
