use alloy::eips::BlockNumberOrTag;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::Filter;
use async_trait::async_trait;
use speedrun_types::chains::{BlockTime, ChainAdapter, ChainError, ChainResult, Log};
use speedrun_types::common::{Address, BlockNumber, Bytes32, ChainId, Timestamp};
use std::time::Duration;

/// Read-only `ChainAdapter` backed by an `alloy` HTTP `RootProvider`.
///
/// One instance per configured chain, built eagerly (and probed) by
/// [`crate::ChainClientRegistry::connect`].
pub struct AlloyChainAdapter {
    chain_id: ChainId,
    provider: RootProvider,
}

impl AlloyChainAdapter {
    pub(crate) async fn connect(chain_id: ChainId, rpc_url: &str) -> ChainResult<Self> {
        let url = rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("invalid rpc url: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);

        with_retry(|| provider.get_block_number())
            .await
            .map_err(|e| ChainError::Rpc(format!("startup probe failed: {e}")))?;

        Ok(Self { chain_id, provider })
    }
}

#[async_trait]
impl ChainAdapter for AlloyChainAdapter {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn block_number(&self) -> ChainResult<BlockNumber> {
        with_retry(|| self.provider.get_block_number())
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn block_time(&self, number: BlockNumber) -> ChainResult<BlockTime> {
        let tag = BlockNumberOrTag::Number(number);

        // Tier 1: full block fetch.
        match with_retry(|| self.provider.get_block_by_number(tag)).await {
            Ok(Some(block)) => {
                return Ok(BlockTime {
                    timestamp: block.header.timestamp as Timestamp,
                    header_only: false,
                })
            }
            Ok(None) => return Err(ChainError::Rpc(format!("block {number} not found"))),
            Err(_) => {}
        }

        // Tier 2: header-only fetch via the raw JSON-RPC client, used when
        // the full-block round-trip above fails (oversized body, node under
        // load, etc) but the node can still answer a lighter request.
        let header: Option<alloy::rpc::types::Header> = self
            .provider
            .client()
            .request("eth_getBlockByNumber", (tag, false))
            .await
            .map_err(|e| ChainError::Rpc(format!("header-only fetch failed: {e}")))?;

        let header = header.ok_or_else(|| ChainError::Rpc(format!("block {number} not found")))?;
        Ok(BlockTime {
            timestamp: header.timestamp as Timestamp,
            header_only: true,
        })
    }

    async fn get_logs(
        &self,
        addresses: &[Address],
        topic0: Bytes32,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> ChainResult<Vec<Log>> {
        let filter = Filter::new()
            .address(addresses.to_vec())
            .event_signature(topic0)
            .from_block(from_block)
            .to_block(to_block);

        let logs = with_retry(|| self.provider.get_logs(&filter))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        logs.into_iter()
            .map(|log| {
                let block_number = log
                    .block_number
                    .ok_or_else(|| ChainError::Rpc("log missing block_number".into()))?;
                let transaction_hash = log
                    .transaction_hash
                    .ok_or_else(|| ChainError::Rpc("log missing transaction_hash".into()))?;
                let log_index = log
                    .log_index
                    .ok_or_else(|| ChainError::Rpc("log missing log_index".into()))?;
                let address = log.address();
                let topics = log.topics().to_vec();
                let data = log.data().data.to_vec();

                Ok(Log {
                    address,
                    topics,
                    data,
                    block_number,
                    transaction_hash,
                    log_index,
                })
            })
            .collect()
    }

    async fn transaction_sender(&self, tx_hash: Bytes32) -> ChainResult<Address> {
        let tx = with_retry(|| self.provider.get_transaction_by_hash(tx_hash))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or_else(|| ChainError::Rpc(format!("transaction {tx_hash} not found")))?;
        Ok(tx.from)
    }
}

/// Exponential backoff retry for a single RPC call, grounded in the same
/// shape as indexers that treat transient RPC failures as recoverable
/// rather than worker-fatal.
async fn with_retry<F, Fut, T, E>(mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = Duration::from_millis(250);
    let max_attempts = 5;

    for attempt in 1..=max_attempts {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt == max_attempts => return Err(e),
            Err(e) => {
                tracing::warn!(attempt, max_attempts, error = %e, delay_ms = delay.as_millis() as u64, "rpc call failed, retrying");
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(10));
            }
        }
    }

    unreachable!("loop always returns by the final attempt")
}
