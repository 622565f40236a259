use crate::abi::{
    IntentFulfilled, IntentFulfilledWithCall, IntentInitiated, IntentInitiatedWithCall,
    IntentSettled, IntentSettledWithCall,
};
use crate::error::DecodeError;
use alloy::primitives::{Log as PrimLog, LogData};
use alloy::sol_types::SolEvent;
use speedrun_config::FeatureFlags;
use speedrun_types::chains::Log;
use speedrun_types::common::{Address, ChainId, EventKind};
use speedrun_types::events::{
    DecodedRecord, FulfilledRecord, InitiatedRecord, Provenance, SettledRecord,
};

fn to_prim_log(log: &Log) -> PrimLog {
    PrimLog {
        address: log.address,
        data: LogData::new_unchecked(log.topics.clone(), log.data.clone().into()),
    }
}

fn topic0(log: &Log) -> Result<alloy::primitives::B256, DecodeError> {
    log.topics.first().copied().ok_or(DecodeError::MissingTopic0)
}

/// Extracts a 20-byte address from a `bytes` payload by keeping only the
/// trailing 20 bytes, per §4.B. Anything shorter is malformed.
fn receiver_from_bytes(raw: &[u8]) -> Result<Address, DecodeError> {
    if raw.len() < 20 {
        return Err(DecodeError::Malformed(format!(
            "receiver payload is {} bytes, need at least 20",
            raw.len()
        )));
    }
    let tail = &raw[raw.len() - 20..];
    Ok(Address::from_slice(tail))
}

/// The topic0 hash of each ABI variant (plain, `WithCall`) an ingestion
/// worker must fetch logs for to cover every way a given [`EventKind`] can
/// be emitted.
pub fn topic0_signatures(kind: EventKind) -> [alloy::primitives::B256; 2] {
    match kind {
        EventKind::Initiated => [IntentInitiated::SIGNATURE_HASH, IntentInitiatedWithCall::SIGNATURE_HASH],
        EventKind::Fulfilled => [IntentFulfilled::SIGNATURE_HASH, IntentFulfilledWithCall::SIGNATURE_HASH],
        EventKind::Settled => [IntentSettled::SIGNATURE_HASH, IntentSettledWithCall::SIGNATURE_HASH],
    }
}

fn provenance(log: &Log, chain_id: ChainId) -> Provenance {
    Provenance {
        chain_id,
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
        log_index: log.log_index,
    }
}

/// Decodes a raw log into a [`DecodedRecord`]. `kind` narrows which of the
/// plain/`WithCall` ABI pair the topic0 is expected to match; `chain_id` is
/// the chain the log was observed on (used for the `targetChain == 0`
/// fallback and for provenance). `IntentInitiated` carries no `sender` topic
/// of its own, so the caller resolves it (via
/// [`ChainAdapter::transaction_sender`](speedrun_types::chains::ChainAdapter::transaction_sender))
/// and passes it in; it's ignored for `Fulfilled`/`Settled`.
pub fn decode(
    log: &Log,
    kind: EventKind,
    chain_id: ChainId,
    sender: Address,
    flags: &FeatureFlags,
) -> Result<DecodedRecord, DecodeError> {
    let topic0 = topic0(log)?;
    let prim_log = to_prim_log(log);
    let prov = provenance(log, chain_id);

    match kind {
        EventKind::Initiated => decode_initiated(&prim_log, topic0, prov, chain_id, sender, flags),
        EventKind::Fulfilled => decode_fulfilled(&prim_log, topic0, prov),
        EventKind::Settled => decode_settled(&prim_log, topic0, prov),
    }
}

fn decode_initiated(
    prim_log: &PrimLog,
    topic0: alloy::primitives::B256,
    prov: Provenance,
    chain_id: ChainId,
    sender: Address,
    flags: &FeatureFlags,
) -> Result<DecodedRecord, DecodeError> {
    let (intent_id, asset, amount, raw_target_chain, receiver_bytes, tip, salt, is_call, call_data) =
        if topic0 == IntentInitiated::SIGNATURE_HASH {
            let event = IntentInitiated::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (
                event.intentId,
                event.asset,
                event.amount,
                event.targetChain,
                event.receiver.clone(),
                event.tip,
                event.salt,
                false,
                None,
            )
        } else if topic0 == IntentInitiatedWithCall::SIGNATURE_HASH {
            let event = IntentInitiatedWithCall::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (
                event.intentId,
                event.asset,
                event.amount,
                event.targetChain,
                event.receiver.clone(),
                event.tip,
                event.salt,
                true,
                Some(event.data.to_vec()),
            )
        } else {
            return Err(DecodeError::UnknownTopic(topic0));
        };

    let receiver = receiver_from_bytes(&receiver_bytes)?;

    let (target_chain, target_chain_was_zero) = if raw_target_chain.is_zero() {
        if flags.target_chain_zero_fallback {
            tracing::warn!(
                intent_id = %intent_id,
                "targetChain was 0, falling back to source chain"
            );
            (chain_id, true)
        } else {
            (ChainId(0), false)
        }
    } else {
        (ChainId(raw_target_chain.to::<u64>()), false)
    };

    Ok(DecodedRecord::Initiated(InitiatedRecord {
        provenance: prov,
        intent_id,
        asset,
        amount,
        target_chain,
        target_chain_was_zero,
        receiver,
        tip,
        salt,
        sender,
        is_call,
        call_data,
    }))
}

fn decode_fulfilled(
    prim_log: &PrimLog,
    topic0: alloy::primitives::B256,
    prov: Provenance,
) -> Result<DecodedRecord, DecodeError> {
    let (intent_id, asset, amount, receiver, is_call, call_data) =
        if topic0 == IntentFulfilled::SIGNATURE_HASH {
            let event = IntentFulfilled::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (event.intentId, event.asset, event.amount, event.receiver, false, None)
        } else if topic0 == IntentFulfilledWithCall::SIGNATURE_HASH {
            let event = IntentFulfilledWithCall::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (
                event.intentId,
                event.asset,
                event.amount,
                event.receiver,
                true,
                Some(event.data.to_vec()),
            )
        } else {
            return Err(DecodeError::UnknownTopic(topic0));
        };

    Ok(DecodedRecord::Fulfilled(FulfilledRecord {
        provenance: prov,
        intent_id,
        asset,
        amount,
        receiver,
        is_call,
        call_data,
    }))
}

fn decode_settled(
    prim_log: &PrimLog,
    topic0: alloy::primitives::B256,
    prov: Provenance,
) -> Result<DecodedRecord, DecodeError> {
    let (intent_id, asset, amount, receiver, fulfilled, fulfiller, actual_amount, paid_tip, is_call, call_data) =
        if topic0 == IntentSettled::SIGNATURE_HASH {
            let event = IntentSettled::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (
                event.intentId,
                event.asset,
                event.amount,
                event.receiver,
                event.fulfilled,
                event.fulfiller,
                event.actualAmount,
                event.paidTip,
                false,
                None,
            )
        } else if topic0 == IntentSettledWithCall::SIGNATURE_HASH {
            let event = IntentSettledWithCall::decode_log(prim_log, true)
                .map_err(|e| DecodeError::Abi(e.to_string()))?;
            (
                event.intentId,
                event.asset,
                event.amount,
                event.receiver,
                event.fulfilled,
                event.fulfiller,
                event.actualAmount,
                event.paidTip,
                true,
                Some(event.data.to_vec()),
            )
        } else {
            return Err(DecodeError::UnknownTopic(topic0));
        };

    Ok(DecodedRecord::Settled(SettledRecord {
        provenance: prov,
        intent_id,
        asset,
        amount,
        receiver,
        fulfilled,
        fulfiller,
        actual_amount,
        paid_tip,
        is_call,
        call_data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U256};
    use speedrun_types::chains::Log as ChainLog;

    fn flags(fallback: bool) -> FeatureFlags {
        FeatureFlags { target_chain_zero_fallback: fallback }
    }

    fn encode_initiated(target_chain: U256, receiver: Vec<u8>) -> ChainLog {
        let event = IntentInitiated {
            intentId: B256::repeat_byte(0x42),
            asset: Address::repeat_byte(0x11),
            amount: U256::from(1000u64),
            targetChain: target_chain,
            receiver: receiver.into(),
            tip: U256::from(5u64),
            salt: U256::from(7u64),
        };
        let encoded = event.encode_log_data();
        ChainLog {
            address: Address::repeat_byte(0x22),
            topics: encoded.topics().to_vec(),
            data: encoded.data.to_vec(),
            block_number: 100,
            transaction_hash: B256::repeat_byte(0x99),
            log_index: 3,
        }
    }

    #[test]
    fn decodes_plain_initiated_event() {
        let log = encode_initiated(U256::from(8453u64), vec![0xaau8; 20]);
        let record = decode(&log, EventKind::Initiated, ChainId(7000), Address::repeat_byte(0x01), &flags(true)).unwrap();
        match record {
            DecodedRecord::Initiated(r) => {
                assert_eq!(r.target_chain, ChainId(8453));
                assert!(!r.target_chain_was_zero);
                assert!(!r.is_call);
            }
            _ => panic!("expected Initiated"),
        }
    }

    #[test]
    fn zero_target_chain_falls_back_to_source_when_enabled() {
        let log = encode_initiated(U256::ZERO, vec![0xaau8; 20]);
        let record = decode(&log, EventKind::Initiated, ChainId(7000), Address::repeat_byte(0x01), &flags(true)).unwrap();
        match record {
            DecodedRecord::Initiated(r) => {
                assert_eq!(r.target_chain, ChainId(7000));
                assert!(r.target_chain_was_zero);
            }
            _ => panic!("expected Initiated"),
        }
    }

    #[test]
    fn zero_target_chain_kept_as_is_when_fallback_disabled() {
        let log = encode_initiated(U256::ZERO, vec![0xaau8; 20]);
        let record = decode(&log, EventKind::Initiated, ChainId(7000), Address::repeat_byte(0x01), &flags(false)).unwrap();
        match record {
            DecodedRecord::Initiated(r) => {
                assert_eq!(r.target_chain, ChainId(0));
                assert!(!r.target_chain_was_zero);
            }
            _ => panic!("expected Initiated"),
        }
    }

    #[test]
    fn short_receiver_payload_is_malformed() {
        let log = encode_initiated(U256::from(1u64), vec![0xaau8; 10]);
        let err = decode(&log, EventKind::Initiated, ChainId(7000), Address::repeat_byte(0x01), &flags(true)).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
