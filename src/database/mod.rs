//! Database module - PostgreSQL + pgvector
//!
//! Provides the durable vector index for long-term memory.

mod postgres;
mod vector_index;

pub use postgres::{init_pool, init_pool_for_migrations, migrations, PostgresPool};
pub use vector_index::PgVectorIndex;
