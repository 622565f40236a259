//! # Speedrun Supervisor
//!
//! The Subscription Supervisor (§4.E): watches every ingestion worker's
//! heartbeat, restarts the ones that stall or exit, and flips a `degraded`
//! flag after too many consecutive failures in a row — grounded in the
//! teacher's `solver_core::lifecycle::LifecycleManager` state machine and
//! `solver_discovery::monitor::ChainEventSource` polling loop, generalized
//! from "one indexer" to "supervise N of them".

mod error;
mod supervisor;

pub use error::SupervisorError;
pub use supervisor::Supervisor;
