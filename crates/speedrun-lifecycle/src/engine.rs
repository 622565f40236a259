//! Correlation / Lifecycle Engine — §4.F. Folds a single decoded record into
//! the `intents`/`fulfillments`/`settlements` tables, tolerating arrival in
//! any order across event kinds for the same intent id.

use crate::error::LifecycleError;
use speedrun_storage::PersistenceGateway;
use speedrun_types::common::{bytes32_to_hex, derive_record_id, Address, Timestamp, U256};
use speedrun_types::events::{DecodedRecord, FulfilledRecord, InitiatedRecord, SettledRecord};
use speedrun_types::model::{Fulfillment, Intent, IntentStatus, Settlement};
use std::sync::Arc;
use tracing::warn;

/// Folds [`DecodedRecord`]s into intent state. One engine per process; all
/// state lives in the gateway, so this type is cheap to clone and share
/// across workers.
pub struct LifecycleEngine {
    gateway: Arc<dyn PersistenceGateway>,
}

impl LifecycleEngine {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// `block_time` is the timestamp the ingestion worker resolved for the
    /// log's block (§4.A) — `Provenance` carries no timestamp of its own.
    /// `timestamp_is_fallback` is `true` when the worker couldn't resolve a
    /// real block timestamp and substituted ingestion wall clock (§3/§9).
    pub async fn apply(&self, record: DecodedRecord, block_time: Timestamp, timestamp_is_fallback: bool) -> Result<(), LifecycleError> {
        match record {
            DecodedRecord::Initiated(r) => self.apply_initiated(r, block_time, timestamp_is_fallback).await,
            DecodedRecord::Fulfilled(r) => self.apply_fulfilled(r, block_time, timestamp_is_fallback).await,
            DecodedRecord::Settled(r) => self.apply_settled(r, block_time, timestamp_is_fallback).await,
        }
    }

    async fn apply_initiated(&self, r: InitiatedRecord, block_time: Timestamp, timestamp_is_fallback: bool) -> Result<(), LifecycleError> {
        let existing = self.gateway.get_intent(r.intent_id).await?;

        if let Some(existing) = &existing {
            if !existing.is_placeholder {
                warn_on_identity_mismatch(existing, &r);
            }
        }

        let created_at = existing.as_ref().map(|e| e.created_at).unwrap_or(block_time);
        // Monotonicity (§4.F/§8): a late-arriving `Initiated` must never
        // downgrade a status a later event already advanced past. The
        // gateway's own upsert may additionally guard this in SQL, but the
        // engine cannot rely on that alone — it must hold regardless of
        // which `PersistenceGateway` implementation is behind it.
        let status = match &existing {
            Some(e) if !e.status.can_advance_to(IntentStatus::Pending) => e.status,
            _ => IntentStatus::Pending,
        };
        let intent = Intent {
            id: r.intent_id,
            source_chain: r.provenance.chain_id,
            destination_chain: r.target_chain,
            token: r.asset,
            amount: r.amount,
            tip: r.tip,
            sender: r.sender,
            recipient: r.receiver,
            is_call: r.is_call,
            call_data: r.call_data,
            status,
            created_at,
            updated_at: block_time,
            timestamp_is_fallback,
            block_number: r.provenance.block_number,
            tx_hash: r.provenance.tx_hash,
            target_chain_fallback: r.target_chain_was_zero,
            is_placeholder: false,
        };

        intent.validate_invariants().map_err(|reason| LifecycleError::InvalidIntent {
            intent_id: bytes32_to_hex(&intent.id),
            reason,
        })?;

        self.gateway.upsert_intent(intent).await?;
        self.maybe_advance_to_fulfilled(r.intent_id, block_time, timestamp_is_fallback).await
    }

    async fn apply_fulfilled(&self, r: FulfilledRecord, block_time: Timestamp, timestamp_is_fallback: bool) -> Result<(), LifecycleError> {
        let fulfillment_id = derive_record_id(&r.provenance.tx_hash, &r.intent_id, r.provenance.log_index);
        let fulfillment = Fulfillment {
            id: fulfillment_id,
            intent_id: r.intent_id,
            asset: r.asset,
            amount: r.amount,
            receiver: r.receiver,
            is_call: r.is_call,
            call_data: r.call_data,
            block_number: r.provenance.block_number,
            tx_hash: r.provenance.tx_hash,
            created_at: block_time,
            updated_at: block_time,
        };
        self.gateway.upsert_fulfillment(fulfillment).await?;

        let existing = self.gateway.get_intent(r.intent_id).await?;
        if existing.is_none() {
            let placeholder = placeholder_intent(
                r.intent_id,
                r.asset,
                r.amount,
                r.receiver,
                r.is_call,
                r.provenance.block_number,
                r.provenance.tx_hash,
                block_time,
                timestamp_is_fallback,
            );
            self.gateway.upsert_intent(placeholder).await?;
            // A freshly-created placeholder's `amount` is a guess equal to
            // this single fulfillment, so it would trivially satisfy
            // `total_fulfilled >= amount` — don't fast-track it to
            // fulfilled until the real `Initiated` confirms the amount.
            return Ok(());
        }

        self.maybe_advance_to_fulfilled(r.intent_id, block_time, timestamp_is_fallback).await
    }

    async fn apply_settled(&self, r: SettledRecord, block_time: Timestamp, timestamp_is_fallback: bool) -> Result<(), LifecycleError> {
        let settlement_id = derive_record_id(&r.provenance.tx_hash, &r.intent_id, r.provenance.log_index);
        let settlement = Settlement {
            id: settlement_id,
            intent_id: r.intent_id,
            asset: r.asset,
            amount: r.amount,
            actual_amount: r.actual_amount,
            receiver: r.receiver,
            fulfilled: r.fulfilled,
            fulfiller: r.fulfiller,
            paid_tip: r.paid_tip,
            is_call: r.is_call,
            call_data: r.call_data.clone(),
            block_number: r.provenance.block_number,
            tx_hash: r.provenance.tx_hash,
            created_at: block_time,
            updated_at: block_time,
        };
        self.gateway.upsert_settlement(settlement).await?;

        let intent = match self.gateway.get_intent(r.intent_id).await? {
            Some(intent) => intent,
            None => placeholder_intent(
                r.intent_id,
                r.asset,
                r.amount,
                r.receiver,
                r.is_call,
                r.provenance.block_number,
                r.provenance.tx_hash,
                block_time,
                timestamp_is_fallback,
            ),
        };

        // Terminal: settlement is valid directly from `pending` with no
        // fulfillment observed (§4.F). `is_placeholder` is left as-is —
        // identity fields remain unconfirmed guesses until `Initiated`
        // eventually arrives, if it ever does.
        let settled = Intent { status: IntentStatus::Settled, updated_at: block_time, timestamp_is_fallback, ..intent };
        self.gateway.upsert_intent(settled).await?;
        Ok(())
    }

    async fn maybe_advance_to_fulfilled(
        &self,
        intent_id: speedrun_types::Bytes32,
        block_time: Timestamp,
        timestamp_is_fallback: bool,
    ) -> Result<(), LifecycleError> {
        let Some(intent) = self.gateway.get_intent(intent_id).await? else {
            return Ok(());
        };
        if intent.is_placeholder || intent.status != IntentStatus::Pending {
            return Ok(());
        }
        let total = self.gateway.sum_fulfilled_amount(intent_id).await?;
        if total >= intent.amount {
            let fulfilled = Intent { status: IntentStatus::Fulfilled, updated_at: block_time, timestamp_is_fallback, ..intent };
            self.gateway.upsert_intent(fulfilled).await?;
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn placeholder_intent(
    intent_id: speedrun_types::Bytes32,
    asset: Address,
    amount: U256,
    receiver: Address,
    is_call: bool,
    block_number: speedrun_types::BlockNumber,
    tx_hash: speedrun_types::Bytes32,
    block_time: Timestamp,
    timestamp_is_fallback: bool,
) -> Intent {
    Intent {
        id: intent_id,
        source_chain: speedrun_types::ChainId(0),
        destination_chain: speedrun_types::ChainId(0),
        token: asset,
        amount,
        tip: U256::ZERO,
        sender: Address::ZERO,
        recipient: receiver,
        is_call,
        call_data: None,
        status: IntentStatus::Pending,
        created_at: block_time,
        updated_at: block_time,
        timestamp_is_fallback,
        block_number,
        tx_hash,
        target_chain_fallback: false,
        is_placeholder: true,
    }
}

fn warn_on_identity_mismatch(existing: &Intent, r: &InitiatedRecord) {
    if existing.amount != r.amount || existing.token != r.asset || existing.sender != r.sender {
        warn!(
            intent_id = %bytes32_to_hex(&existing.id),
            "duplicate Initiated for an already-materialized intent disagrees with the stored record; \
             on-chain values from this event are kept, existing row is left untouched"
        );
    }
}
