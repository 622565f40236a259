//! # Speedrun Storage
//!
//! The Persistence Gateway (§4.C): idempotent upserts, cursors, and
//! paginated reads over Postgres. [`PersistenceGateway`] is the seam;
//! [`PgGateway`] is the only production implementation, grounded in the
//! pack's multi-chain indexer's direct `sqlx::PgPool` usage rather than the
//! teacher's file-backed `StorageInterface` — the spec requires a SQL store
//! the teacher doesn't have.

mod error;
mod filter;
mod gateway;
mod pg;
mod rows;

pub use error::StoreError;
pub use filter::{IntentFilter, Page, Pagination};
pub use gateway::PersistenceGateway;
pub use pg::PgGateway;
