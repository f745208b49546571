//! Core module - Fundamental traits and types for Atlas
//!
//! This module defines the abstractions the rest of the crate is wired
//! through:
//! - `VectorIndex` for the vector database holding memories
//! - `Embedder` for the embedding provider
//! - `LlmProvider` for the chat-completion backend
//! - `Clock` for write timestamps

pub mod clock;
pub mod embedding;
pub mod provider;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use embedding::Embedder;
pub use provider::{GenerationOptions, LlmProvider, LlmResponse, Message, UsageStats};
pub use storage::{l2_distance, Metadata, NewMemory, ScoredMemory, VectorIndex};
