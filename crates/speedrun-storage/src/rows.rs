//! Conversions between the `TEXT`-column row shape described in §3.1 and the
//! domain types in `speedrun_types::model`.

use crate::error::StoreError;
use speedrun_types::common::{address_to_hex, bytes32_to_hex, parse_address, parse_bytes32};
use speedrun_types::model::{Fulfillment, Intent, IntentStatus, Settlement};
use speedrun_types::{Address, Bytes32, U256};

fn parse_amount(raw: &str) -> Result<U256, StoreError> {
    U256::from_str_radix(raw, 10).map_err(|e| StoreError::Integrity(format!("bad amount {raw:?}: {e}")))
}

fn parse_addr(raw: &str) -> Result<Address, StoreError> {
    parse_address(raw).map_err(|e| StoreError::Integrity(e.to_string()))
}

fn parse_hash(raw: &str) -> Result<Bytes32, StoreError> {
    parse_bytes32(raw).map_err(|e| StoreError::Integrity(e.to_string()))
}

fn parse_call_data(raw: Option<&str>) -> Result<Option<Vec<u8>>, StoreError> {
    raw.map(|s| {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(stripped).map_err(|e| StoreError::Integrity(format!("bad call_data hex: {e}")))
    })
    .transpose()
}

fn call_data_hex(data: &Option<Vec<u8>>) -> Option<String> {
    data.as_ref().map(|bytes| format!("0x{}", hex::encode(bytes)))
}

#[derive(sqlx::FromRow)]
pub(crate) struct IntentRow {
    pub id: String,
    pub source_chain: i64,
    pub destination_chain: i64,
    pub token: String,
    pub amount: String,
    pub tip: String,
    pub sender: String,
    pub recipient: String,
    pub is_call: bool,
    pub call_data: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub timestamp_is_fallback: bool,
    pub block_number: i64,
    pub tx_hash: String,
    pub target_chain_fallback: bool,
    pub is_placeholder: bool,
}

impl IntentRow {
    pub(crate) fn into_domain(self) -> Result<Intent, StoreError> {
        Ok(Intent {
            id: parse_hash(&self.id)?,
            source_chain: speedrun_types::ChainId(self.source_chain as u64),
            destination_chain: speedrun_types::ChainId(self.destination_chain as u64),
            token: parse_addr(&self.token)?,
            amount: parse_amount(&self.amount)?,
            tip: parse_amount(&self.tip)?,
            sender: parse_addr(&self.sender)?,
            recipient: parse_addr(&self.recipient)?,
            is_call: self.is_call,
            call_data: parse_call_data(self.call_data.as_deref())?,
            status: IntentStatus::from_str_opt(&self.status)
                .ok_or_else(|| StoreError::Integrity(format!("unknown status {:?}", self.status)))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            timestamp_is_fallback: self.timestamp_is_fallback,
            block_number: self.block_number as u64,
            tx_hash: parse_hash(&self.tx_hash)?,
            target_chain_fallback: self.target_chain_fallback,
            is_placeholder: self.is_placeholder,
        })
    }
}

pub(crate) struct IntentParams {
    pub id: String,
    pub source_chain: i64,
    pub destination_chain: i64,
    pub token: String,
    pub amount: String,
    pub tip: String,
    pub sender: String,
    pub recipient: String,
    pub is_call: bool,
    pub call_data: Option<String>,
    pub status: String,
    pub status_rank: i16,
    pub created_at: i64,
    pub updated_at: i64,
    pub timestamp_is_fallback: bool,
    pub block_number: i64,
    pub tx_hash: String,
    pub target_chain_fallback: bool,
    pub is_placeholder: bool,
}

impl From<&Intent> for IntentParams {
    fn from(intent: &Intent) -> Self {
        Self {
            id: bytes32_to_hex(&intent.id),
            source_chain: intent.source_chain.0 as i64,
            destination_chain: intent.destination_chain.0 as i64,
            token: address_to_hex(&intent.token),
            amount: intent.amount.to_string(),
            tip: intent.tip.to_string(),
            sender: address_to_hex(&intent.sender),
            recipient: address_to_hex(&intent.recipient),
            is_call: intent.is_call,
            call_data: call_data_hex(&intent.call_data),
            status: intent.status.as_str().to_string(),
            status_rank: intent.status.rank(),
            created_at: intent.created_at,
            updated_at: intent.updated_at,
            timestamp_is_fallback: intent.timestamp_is_fallback,
            block_number: intent.block_number as i64,
            tx_hash: bytes32_to_hex(&intent.tx_hash),
            target_chain_fallback: intent.target_chain_fallback,
            is_placeholder: intent.is_placeholder,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct FulfillmentRow {
    pub id: String,
    pub intent_id: String,
    pub asset: String,
    pub amount: String,
    pub receiver: String,
    pub is_call: bool,
    pub call_data: Option<String>,
    pub block_number: i64,
    pub tx_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FulfillmentRow {
    pub(crate) fn into_domain(self) -> Result<Fulfillment, StoreError> {
        Ok(Fulfillment {
            id: parse_hash(&self.id)?,
            intent_id: parse_hash(&self.intent_id)?,
            asset: parse_addr(&self.asset)?,
            amount: parse_amount(&self.amount)?,
            receiver: parse_addr(&self.receiver)?,
            is_call: self.is_call,
            call_data: parse_call_data(self.call_data.as_deref())?,
            block_number: self.block_number as u64,
            tx_hash: parse_hash(&self.tx_hash)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) struct FulfillmentParams {
    pub id: String,
    pub intent_id: String,
    pub asset: String,
    pub amount: String,
    pub receiver: String,
    pub is_call: bool,
    pub call_data: Option<String>,
    pub block_number: i64,
    pub tx_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Fulfillment> for FulfillmentParams {
    fn from(f: &Fulfillment) -> Self {
        Self {
            id: bytes32_to_hex(&f.id),
            intent_id: bytes32_to_hex(&f.intent_id),
            asset: address_to_hex(&f.asset),
            amount: f.amount.to_string(),
            receiver: address_to_hex(&f.receiver),
            is_call: f.is_call,
            call_data: call_data_hex(&f.call_data),
            block_number: f.block_number as i64,
            tx_hash: bytes32_to_hex(&f.tx_hash),
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

pub(crate) struct SettlementParams {
    pub id: String,
    pub intent_id: String,
    pub asset: String,
    pub amount: String,
    pub actual_amount: String,
    pub receiver: String,
    pub fulfilled: bool,
    pub fulfiller: String,
    pub paid_tip: String,
    pub is_call: bool,
    pub call_data: Option<String>,
    pub block_number: i64,
    pub tx_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Settlement> for SettlementParams {
    fn from(s: &Settlement) -> Self {
        Self {
            id: bytes32_to_hex(&s.id),
            intent_id: bytes32_to_hex(&s.intent_id),
            asset: address_to_hex(&s.asset),
            amount: s.amount.to_string(),
            actual_amount: s.actual_amount.to_string(),
            receiver: address_to_hex(&s.receiver),
            fulfilled: s.fulfilled,
            fulfiller: address_to_hex(&s.fulfiller),
            paid_tip: s.paid_tip.to_string(),
            is_call: s.is_call,
            call_data: call_data_hex(&s.call_data),
            block_number: s.block_number as i64,
            tx_hash: bytes32_to_hex(&s.tx_hash),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
