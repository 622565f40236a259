//! End-to-end scenarios from §8 of the specification, driven against an
//! in-memory gateway fake rather than Postgres.

use crate::engine::LifecycleEngine;
use async_trait::async_trait;
use speedrun_storage::{IntentFilter, Page, Pagination, PersistenceGateway, StoreError};
use speedrun_types::events::{DecodedRecord, FulfilledRecord, InitiatedRecord, Provenance, SettledRecord};
use speedrun_types::model::{Fulfillment, Intent, IntentStatus, Settlement, UpsertOutcome};
use speedrun_types::{Address, BlockNumber, Bytes32, ChainId, EventKind, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeGateway {
    intents: Mutex<HashMap<Bytes32, Intent>>,
    fulfillments: Mutex<HashMap<Bytes32, Fulfillment>>,
    settlements: Mutex<HashMap<Bytes32, Settlement>>,
    cursors: Mutex<HashMap<(ChainId, EventKind), BlockNumber>>,
}

#[async_trait]
impl PersistenceGateway for FakeGateway {
    async fn upsert_intent(&self, intent: Intent) -> Result<UpsertOutcome, StoreError> {
        let mut intents = self.intents.lock().unwrap();
        let outcome = if intents.contains_key(&intent.id) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        intents.insert(intent.id, intent);
        Ok(outcome)
    }

    async fn upsert_fulfillment(&self, fulfillment: Fulfillment) -> Result<UpsertOutcome, StoreError> {
        let mut fulfillments = self.fulfillments.lock().unwrap();
        let outcome = if fulfillments.contains_key(&fulfillment.id) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        fulfillments.insert(fulfillment.id, fulfillment);
        Ok(outcome)
    }

    async fn upsert_settlement(&self, settlement: Settlement) -> Result<UpsertOutcome, StoreError> {
        let mut settlements = self.settlements.lock().unwrap();
        let outcome = if settlements.contains_key(&settlement.id) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        settlements.insert(settlement.id, settlement);
        Ok(outcome)
    }

    async fn get_intent(&self, id: Bytes32) -> Result<Option<Intent>, StoreError> {
        Ok(self.intents.lock().unwrap().get(&id).cloned())
    }

    async fn list_intents(&self, _filter: IntentFilter, pagination: Pagination) -> Result<Page<Intent>, StoreError> {
        Ok(Page::new(Vec::new(), pagination, 0))
    }

    async fn list_intents_by_sender(&self, _sender: Address, pagination: Pagination) -> Result<Page<Intent>, StoreError> {
        Ok(Page::new(Vec::new(), pagination, 0))
    }

    async fn list_intents_by_recipient(&self, _recipient: Address, pagination: Pagination) -> Result<Page<Intent>, StoreError> {
        Ok(Page::new(Vec::new(), pagination, 0))
    }

    async fn get_fulfillment(&self, id: Bytes32) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self.fulfillments.lock().unwrap().get(&id).cloned())
    }

    async fn list_fulfillments(&self, pagination: Pagination) -> Result<Page<Fulfillment>, StoreError> {
        Ok(Page::new(Vec::new(), pagination, 0))
    }

    async fn get_cursor(&self, chain_id: ChainId, kind: EventKind) -> Result<Option<BlockNumber>, StoreError> {
        Ok(self.cursors.lock().unwrap().get(&(chain_id, kind)).copied())
    }

    async fn set_cursor(&self, chain_id: ChainId, kind: EventKind, block: BlockNumber) -> Result<(), StoreError> {
        let mut cursors = self.cursors.lock().unwrap();
        let slot = cursors.entry((chain_id, kind)).or_insert(0);
        *slot = (*slot).max(block);
        Ok(())
    }

    async fn sum_fulfilled_amount(&self, intent_id: Bytes32) -> Result<U256, StoreError> {
        let total = self
            .fulfillments
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.intent_id == intent_id)
            .fold(U256::ZERO, |acc, f| acc + f.amount);
        Ok(total)
    }
}

fn provenance(log_index: u64) -> Provenance {
    Provenance { chain_id: ChainId(8453), block_number: 100, tx_hash: Bytes32::from([0xAA; 32]), log_index }
}

fn initiated(id: Bytes32, amount: u64, tip: u64, target: u64, log_index: u64) -> InitiatedRecord {
    InitiatedRecord {
        provenance: provenance(log_index),
        intent_id: id,
        asset: Address::repeat_byte(0x01),
        amount: U256::from(amount),
        target_chain: ChainId(target),
        target_chain_was_zero: false,
        receiver: Address::repeat_byte(0x02),
        tip: U256::from(tip),
        salt: U256::from(1u64),
        sender: Address::repeat_byte(0x03),
        is_call: false,
        call_data: None,
    }
}

fn fulfilled(id: Bytes32, amount: u64, log_index: u64) -> FulfilledRecord {
    FulfilledRecord {
        provenance: provenance(log_index),
        intent_id: id,
        asset: Address::repeat_byte(0x01),
        amount: U256::from(amount),
        receiver: Address::repeat_byte(0x04),
        is_call: false,
        call_data: None,
    }
}

fn settled(id: Bytes32, actual_amount: u64, fulfilled_flag: bool, log_index: u64) -> SettledRecord {
    SettledRecord {
        provenance: provenance(log_index),
        intent_id: id,
        asset: Address::repeat_byte(0x01),
        amount: U256::from(actual_amount),
        receiver: Address::repeat_byte(0x04),
        fulfilled: fulfilled_flag,
        fulfiller: Address::repeat_byte(0x05),
        actual_amount: U256::from(actual_amount),
        paid_tip: U256::from(10_000u64),
        is_call: false,
        call_data: None,
    }
}

fn engine() -> (LifecycleEngine, Arc<FakeGateway>) {
    let gateway = Arc::new(FakeGateway::default());
    (LifecycleEngine::new(gateway.clone()), gateway)
}

#[tokio::test]
async fn happy_path_reaches_settled() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x11; 32]);

    engine.apply(DecodedRecord::Initiated(initiated(id, 1_000_000, 10_000, 42161, 0)), 1, false).await.unwrap();
    engine.apply(DecodedRecord::Fulfilled(fulfilled(id, 1_000_000, 1)), 2, false).await.unwrap();
    engine.apply(DecodedRecord::Settled(settled(id, 1_000_000, true, 2)), 3, false).await.unwrap();

    let intent = gateway.get_intent(id).await.unwrap().unwrap();
    assert_eq!(intent.status, IntentStatus::Settled);
    assert_eq!(gateway.fulfillments.lock().unwrap().len(), 1);
    assert_eq!(gateway.settlements.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn partial_fulfillment_only_advances_once_total_reaches_amount() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x22; 32]);

    engine.apply(DecodedRecord::Initiated(initiated(id, 1_000_000, 0, 42161, 0)), 1, false).await.unwrap();
    engine.apply(DecodedRecord::Fulfilled(fulfilled(id, 400_000, 1)), 2, false).await.unwrap();
    assert_eq!(gateway.get_intent(id).await.unwrap().unwrap().status, IntentStatus::Pending);

    engine.apply(DecodedRecord::Fulfilled(fulfilled(id, 600_000, 2)), 3, false).await.unwrap();
    assert_eq!(gateway.get_intent(id).await.unwrap().unwrap().status, IntentStatus::Fulfilled);
}

#[tokio::test]
async fn out_of_order_fulfilled_before_initiated_materializes_placeholder() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x33; 32]);

    engine.apply(DecodedRecord::Fulfilled(fulfilled(id, 1_000_000, 0)), 1, false).await.unwrap();
    let placeholder = gateway.get_intent(id).await.unwrap().unwrap();
    assert!(placeholder.is_placeholder);
    assert_eq!(placeholder.status, IntentStatus::Pending);

    engine.apply(DecodedRecord::Initiated(initiated(id, 1_000_000, 0, 42161, 1)), 2, false).await.unwrap();
    let intent = gateway.get_intent(id).await.unwrap().unwrap();
    assert!(!intent.is_placeholder);
    assert_eq!(intent.status, IntentStatus::Fulfilled);
    assert_eq!(intent.sender, Address::repeat_byte(0x03));
}

#[tokio::test]
async fn unfulfilled_settlement_advances_straight_to_settled() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x44; 32]);

    engine.apply(DecodedRecord::Initiated(initiated(id, 1_000_000, 0, 42161, 0)), 1, false).await.unwrap();
    engine.apply(DecodedRecord::Settled(settled(id, 1_000_000, false, 1)), 2, false).await.unwrap();

    let intent = gateway.get_intent(id).await.unwrap().unwrap();
    assert_eq!(intent.status, IntentStatus::Settled);
    assert!(gateway.fulfillments.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_initiated_delivery_is_idempotent() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x55; 32]);

    for _ in 0..5 {
        engine.apply(DecodedRecord::Initiated(initiated(id, 1_000_000, 10_000, 42161, 0)), 7, false).await.unwrap();
    }

    assert_eq!(gateway.intents.lock().unwrap().len(), 1);
    let intent = gateway.get_intent(id).await.unwrap().unwrap();
    assert_eq!(intent.created_at, 7);
    assert_eq!(intent.updated_at, 7);
}

#[tokio::test]
async fn settled_before_initiated_leaves_placeholder_flag_until_initiated_arrives() {
    let (engine, gateway) = engine();
    let id = Bytes32::from([0x66; 32]);

    engine.apply(DecodedRecord::Settled(settled(id, 500_000, false, 0)), 1, false).await.unwrap();
    let placeholder = gateway.get_intent(id).await.unwrap().unwrap();
    assert!(placeholder.is_placeholder);
    assert_eq!(placeholder.status, IntentStatus::Settled);

    engine.apply(DecodedRecord::Initiated(initiated(id, 500_000, 0, 42161, 1)), 2, false).await.unwrap();
    let intent = gateway.get_intent(id).await.unwrap().unwrap();
    assert!(!intent.is_placeholder);
    assert_eq!(intent.status, IntentStatus::Settled);
}
