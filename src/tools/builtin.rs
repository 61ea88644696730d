//! Builtin tools available to any session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use super::{Tool, ToolExecutor};

/// Reports the device's current local date and time.
///
/// The model has no clock of its own; this gives it one without a round
/// trip to any external service.
pub struct LocalTimeTool;

#[async_trait]
impl ToolExecutor for LocalTimeTool {
    async fn execute(&self, _input: Value) -> anyhow::Result<String> {
        Ok(Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string())
    }
}

/// The `local_time` tool definition.
pub fn local_time() -> Tool {
    Tool::new(
        "Returns the current local date and time on the user's device. \
         Use this when the user asks about the time, the date, or anything \
         relative to 'now'.",
        json!({
            "type": "object",
            "properties": {}
        }),
        Arc::new(LocalTimeTool),
    )
}
