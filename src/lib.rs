//! Client runtime for a tool-augmented LLM agent gateway.
//!
//! The gateway hosts the model; this crate hosts the conversation. A
//! [`session::AgentSession`] posts the history plus a tool manifest to the
//! gateway's chat endpoint, dispatches the tool calls the model emits
//! against a local [`tools::ToolRegistry`], and projects the resulting
//! history into a render-friendly view. Single-shot text/object generation
//! and toolkit connection management are separate, stateless clients.

pub mod config;
pub mod gateway;
pub mod message;
pub mod session;
pub mod tools;

pub use config::{Config, GatewayConfig};
pub use gateway::{ChatTransport, Connection, ConnectionClient, ConnectionStatus, GenerationClient};
pub use message::{normalize_messages, Part, Role, ViewMessage, WireMessage, WirePart};
pub use session::{AgentSession, ToolResult, TurnState};
pub use tools::{Tool, ToolExecutor, ToolRegistry};
