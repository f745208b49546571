//! # Atlas
//!
//! An AI agent with a vector-backed long-term memory.
//!
//! ## Features
//!
//! - **Memory store:** embed, store, retrieve by L2 similarity, and expire by age
//! - **Pluggable index:** in-process for development, PostgreSQL + pgvector for production
//! - **Local embeddings:** fastembed models, or any OpenAI-compatible `/embeddings` endpoint
//! - **Grounded answers:** queries are answered from the closest memories and remembered
//! - **HTTP gateway:** axum service with a background expiry sweeper

pub mod agent;
pub mod config;
pub mod core;
pub mod database;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod sweeper;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
