//! Agent module - memory-augmented query answering
//!
//! - OpenAI-compatible chat-completion client
//! - Prompt templates
//! - Query pipeline over the memory store

mod client;
pub mod prompts;
mod query;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ChatClient;
pub use prompts::PromptTemplate;
pub use query::{Agent, AgentResponse, QueryContext};
pub use types::{Message, Role};
