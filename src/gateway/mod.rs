//! Gateway HTTP clients.
//!
//! Each client takes its endpoint configuration explicitly — there is no
//! process-wide base URL. Every request is a single attempt bounded by the
//! configured deadline; failures surface to the caller unretried.

pub mod chat;
pub mod connections;
pub mod generate;

pub use chat::{ChatRequest, ChatResponse, ChatTransport, HttpChatTransport};
pub use connections::{Connection, ConnectionClient, ConnectionInit, ConnectionStatus};
pub use generate::{ContentPart, GenerationClient, Message, MessageContent};
