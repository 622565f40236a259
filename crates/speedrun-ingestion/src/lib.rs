//! # Speedrun Ingestion
//!
//! The Ingestion Worker (§4.D): one task per `(ChainId, EventKind)` that
//! fetches, decodes, and folds logs into storage, moving through
//! `Initializing -> CatchingUp -> Live` and reporting progress via a
//! lock-free [`speedrun_types::snapshot::WorkerSnapshot`] for the
//! supervisor and metrics observer to read.

mod error;
mod worker;

pub use error::IngestionError;
pub use worker::IngestionWorker;
