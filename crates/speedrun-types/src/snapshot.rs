//! Immutable snapshot types read by the Metrics Observer (§4.H) and the
//! Read API's health endpoints. Per §9's design note, components expose
//! these read-only snapshots instead of handing out shared mutable state.

use crate::common::{BlockNumber, ChainId, EventKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
	Initializing,
	CatchingUp,
	Live,
	Stopped,
}

impl WorkerPhase {
	pub fn as_str(&self) -> &'static str {
		match self {
			WorkerPhase::Initializing => "initializing",
			WorkerPhase::CatchingUp => "catching_up",
			WorkerPhase::Live => "live",
			WorkerPhase::Stopped => "stopped",
		}
	}
}

/// Point-in-time view of one ingestion worker, as read by the supervisor
/// and the metrics observer. Cheap to clone; produced from `AtomicU64`/
/// `ArcSwap` reads, never from a lock held across an await point.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
	pub chain_id: ChainId,
	pub event_kind: EventKind,
	pub phase: WorkerPhaseWire,
	pub cursor_block: BlockNumber,
	pub events_decoded: u64,
	pub events_persisted: u64,
	pub decode_errors: u64,
	pub rpc_errors: u64,
	pub last_progress_age_seconds: u64,
	pub restarts_total: u64,
	pub degraded: bool,
}

/// Serializable mirror of [`WorkerPhase`] (kept distinct so the internal
/// enum can gain variants without touching the wire representation).
pub type WorkerPhaseWire = &'static str;
