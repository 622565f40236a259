use crate::adapter::AlloyChainAdapter;
use crate::error::ChainRegistryError;
use speedrun_config::Config;
use speedrun_types::chains::ChainAdapter;
use speedrun_types::common::ChainId;
use std::collections::HashMap;
use std::sync::Arc;

/// One `alloy` provider per configured chain, connected and probed once at
/// startup. Every other component — decoder, ingestion, API — reads chain
/// state through this registry rather than holding its own provider handle,
/// mirroring `solver_core::registry::ComponentRegistry`.
pub struct ChainClientRegistry {
    adapters: HashMap<ChainId, Arc<dyn ChainAdapter>>,
}

impl ChainClientRegistry {
    /// Connects to every chain in `config.chains`, probing each with an
    /// `eth_blockNumber` call. Fails fast — and takes the whole process down
    /// with it — if any single chain is unreachable, per §4.A.
    pub async fn connect(config: &Config) -> Result<Self, ChainRegistryError> {
        let mut adapters: HashMap<ChainId, Arc<dyn ChainAdapter>> =
            HashMap::with_capacity(config.chains.len());

        for (chain_id, endpoint) in &config.chains {
            tracing::info!(chain_id = %chain_id, name = %endpoint.name, "connecting to chain");
            let adapter = AlloyChainAdapter::connect(*chain_id, &endpoint.rpc_url)
                .await
                .map_err(|e| ChainRegistryError::ProbeFailed {
                    chain_id: *chain_id,
                    name: endpoint.name.clone(),
                    source: e.to_string(),
                })?;
            adapters.insert(*chain_id, Arc::new(adapter));
        }

        Ok(Self { adapters })
    }

    pub fn get(&self, chain_id: ChainId) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&chain_id).cloned()
    }

    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.adapters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedrun_types::chains::{BlockTime, ChainResult, Log};
    use speedrun_types::common::{Address, BlockNumber, Bytes32};
    use async_trait::async_trait;

    struct FakeAdapter(ChainId);

    #[async_trait]
    impl ChainAdapter for FakeAdapter {
        fn chain_id(&self) -> ChainId {
            self.0
        }
        async fn block_number(&self) -> ChainResult<BlockNumber> {
            Ok(1)
        }
        async fn block_time(&self, _number: BlockNumber) -> ChainResult<BlockTime> {
            Ok(BlockTime { timestamp: 0, header_only: false })
        }
        async fn get_logs(
            &self,
            _addresses: &[Address],
            _topic0: Bytes32,
            _from_block: BlockNumber,
            _to_block: BlockNumber,
        ) -> ChainResult<Vec<Log>> {
            Ok(vec![])
        }
        async fn transaction_sender(&self, _tx_hash: Bytes32) -> ChainResult<Address> {
            Ok(Address::ZERO)
        }
    }

    #[test]
    fn lookup_returns_registered_adapter() {
        let mut adapters: HashMap<ChainId, Arc<dyn ChainAdapter>> = HashMap::new();
        adapters.insert(ChainId(7000), Arc::new(FakeAdapter(ChainId(7000))));
        let registry = ChainClientRegistry { adapters };

        assert!(registry.get(ChainId(7000)).is_some());
        assert!(registry.get(ChainId(1)).is_none());
        assert_eq!(registry.len(), 1);
    }
}
