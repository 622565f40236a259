//! # Speedrun Decoder
//!
//! The Event Decoder (§4.B): translates a raw [`speedrun_types::chains::Log`]
//! plus the [`speedrun_types::common::EventKind`] the caller already knows it
//! is (from which topic filter matched) into a normalized
//! [`speedrun_types::events::DecodedRecord`].

mod abi;
mod decode;
mod error;

pub use decode::{decode, topic0_signatures};
pub use error::DecodeError;
