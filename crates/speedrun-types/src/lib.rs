//! # Speedrun Types
//!
//! Core type definitions shared across the indexing pipeline: the domain
//! model (§3), the `ChainAdapter` trait the registry implements (§4.A), the
//! decoded-record contract between the decoder and the lifecycle engine
//! (§4.B/§4.F), and the cross-crate error type.

pub mod chains;
pub mod common;
pub mod errors;
pub mod events;
pub mod model;
pub mod snapshot;

pub use common::{Address, BlockNumber, Bytes32, ChainId, EventKind, Timestamp, U256};
pub use errors::{Result, SpeedrunError};
pub use events::{DecodedRecord, FulfilledRecord, InitiatedRecord, Provenance, SettledRecord};
pub use model::{Fulfillment, Intent, IntentStatus, Settlement, UpsertOutcome};
