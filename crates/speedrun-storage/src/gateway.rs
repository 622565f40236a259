use crate::error::StoreError;
use crate::filter::{IntentFilter, Page, Pagination};
use async_trait::async_trait;
use speedrun_types::common::{Address, BlockNumber, Bytes32, ChainId, EventKind, U256};
use speedrun_types::model::{Fulfillment, Intent, Settlement, UpsertOutcome};

/// The Persistence Gateway seam (§4.C), implemented by [`crate::PgGateway`]
/// for production and by hand-rolled in-memory fakes in tests elsewhere in
/// the workspace (lifecycle, API) — mirroring the teacher's
/// `StorageInterface` trait-per-concern style.
///
/// None of these take a deadline parameter directly: per §5, callers wrap
/// each call in `tokio::time::timeout(db_timeout, ...)` rather than the
/// gateway managing its own deadlines.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn upsert_intent(&self, intent: Intent) -> Result<UpsertOutcome, StoreError>;
    async fn upsert_fulfillment(&self, fulfillment: Fulfillment) -> Result<UpsertOutcome, StoreError>;
    async fn upsert_settlement(&self, settlement: Settlement) -> Result<UpsertOutcome, StoreError>;

    async fn get_intent(&self, id: Bytes32) -> Result<Option<Intent>, StoreError>;
    async fn list_intents(
        &self,
        filter: IntentFilter,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError>;
    async fn list_intents_by_sender(
        &self,
        sender: Address,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError>;
    async fn list_intents_by_recipient(
        &self,
        recipient: Address,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError>;

    async fn get_fulfillment(&self, id: Bytes32) -> Result<Option<Fulfillment>, StoreError>;
    async fn list_fulfillments(&self, pagination: Pagination) -> Result<Page<Fulfillment>, StoreError>;

    /// `(chain_id, event_kind) → last_processed_block`. `None` means no
    /// cursor has ever been set — the ingestion worker starts from genesis
    /// or a configured floor.
    async fn get_cursor(
        &self,
        chain_id: ChainId,
        kind: EventKind,
    ) -> Result<Option<BlockNumber>, StoreError>;

    /// Monotonic: a `block` at or below the current cursor is a no-op, never
    /// an error, per §4.C.
    async fn set_cursor(
        &self,
        chain_id: ChainId,
        kind: EventKind,
        block: BlockNumber,
    ) -> Result<(), StoreError>;

    /// Sum of all `fulfillments.amount` for `intent_id`, used by the
    /// lifecycle engine to decide whether a partial fulfillment has reached
    /// the intent's total (§4.F).
    async fn sum_fulfilled_amount(&self, intent_id: Bytes32) -> Result<U256, StoreError>;
}
