//! # Speedrun Core
//!
//! The Orchestrator (§4.I): wires the chain registry, the per-`(chain,
//! event_kind)` ingestion workers, the subscription supervisor, the metrics
//! ticker, and the read API server under one root cancellation token.
//! Grounded in `solver_core::engine::Orchestrator`/`OrchestratorBuilder`.

mod error;
mod lifecycle;
mod orchestrator;

pub use error::CoreError;
pub use lifecycle::LifecycleState;
pub use orchestrator::Orchestrator;
