use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use speedrun_config::IngestionTuning;
use speedrun_ingestion::IngestionWorker;
use speedrun_types::snapshot::WorkerSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capped exponential backoff for restart attempts (§4.E/§8): a healthy
/// worker resets to this on its next good tick.
fn fresh_backoff() -> ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_secs(1))
        .with_max_interval(Duration::from_secs(60))
        .with_multiplier(2.0)
        .with_max_elapsed_time(None)
        .build()
}

struct Managed {
    worker: Arc<IngestionWorker>,
    token: CancellationToken,
    handle: Option<JoinHandle<Result<(), speedrun_ingestion::IngestionError>>>,
    consecutive_failures: u64,
    backoff: ExponentialBackoff,
    retry_after: Option<Instant>,
}

/// Watches every registered ingestion worker, restarting the ones that exit
/// or stall, bounded to `supervisor_max_concurrent_restarts` restarts per
/// sweep so a correlated outage (e.g. an RPC provider going down) doesn't
/// thunder-herd reconnect attempts.
pub struct Supervisor {
    managed: Mutex<Vec<Managed>>,
    tuning: IngestionTuning,
    restart_permits: Semaphore,
    root_token: CancellationToken,
    degraded: AtomicBool,
}

impl Supervisor {
    pub fn new(tuning: IngestionTuning, root_token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            managed: Mutex::new(Vec::new()),
            restart_permits: Semaphore::new(tuning.supervisor_max_concurrent_restarts.max(1) as usize),
            tuning,
            root_token,
            degraded: AtomicBool::new(false),
        })
    }

    /// Registers a worker and starts its task immediately under a child of
    /// the supervisor's root cancellation token.
    pub async fn spawn(&self, worker: Arc<IngestionWorker>) {
        let token = self.root_token.child_token();
        let handle = tokio::spawn(worker.clone().run(token.clone()));
        self.managed.lock().await.push(Managed {
            worker,
            token,
            handle: Some(handle),
            consecutive_failures: 0,
            backoff: fresh_backoff(),
            retry_after: None,
        });
    }

    pub async fn snapshots(&self) -> Vec<WorkerSnapshot> {
        self.managed.lock().await.iter().map(|m| m.worker.snapshot()).collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Runs the supervision loop until `root_token` is cancelled, then
    /// cancels and awaits every remaining worker before returning so the
    /// caller's shutdown sequence can rely on this resolving only once
    /// ingestion has fully stopped.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.tuning.supervisor_interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.root_token.cancelled() => break,
            }
            self.sweep().await;
        }

        let mut managed = self.managed.lock().await;
        for m in managed.iter() {
            m.token.cancel();
        }
        for m in managed.iter_mut() {
            if let Some(handle) = m.handle.take() {
                let _ = handle.await;
            }
        }
    }

    async fn sweep(&self) {
        let stall_threshold = self.tuning.stall_threshold_secs();
        let mut managed = self.managed.lock().await;

        for m in managed.iter_mut() {
            let snapshot = m.worker.snapshot();
            let finished = m.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true);
            let stalled = !finished && snapshot.last_progress_age_seconds >= stall_threshold;

            if !finished && !stalled {
                m.consecutive_failures = 0;
                m.backoff = fresh_backoff();
                m.retry_after = None;
                continue;
            }

            if let Some(retry_after) = m.retry_after {
                if Instant::now() < retry_after {
                    continue;
                }
            }

            let Ok(_permit) = self.restart_permits.try_acquire() else {
                tracing::warn!(
                    chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind,
                    "restart budget exhausted this tick, deferring"
                );
                continue;
            };

            if stalled {
                tracing::warn!(
                    chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind,
                    age_seconds = snapshot.last_progress_age_seconds,
                    "ingestion worker heartbeat stalled, restarting"
                );
                m.token.cancel();
            }

            if let Some(handle) = m.handle.take() {
                let abort_handle = handle.abort_handle();
                match tokio::time::timeout(Duration::from_secs(5), handle).await {
                    Ok(Ok(Ok(()))) => {}
                    Ok(Ok(Err(e))) => {
                        tracing::warn!(chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind, error = %e, "ingestion worker exited with an error")
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind, error = %e, "ingestion worker task panicked")
                    }
                    Err(_) => {
                        // Cooperative cancellation didn't land in time (the
                        // task is stuck in a non-cancellation-aware await,
                        // e.g. a hung RPC call) — abort it outright.
                        abort_handle.abort();
                        tracing::warn!(
                            chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind,
                            "ingestion worker did not stop within the grace period, aborted"
                        );
                    }
                }
            }

            m.consecutive_failures += 1;
            m.worker.record_restart();

            let delay = m.backoff.next_backoff().unwrap_or(Duration::from_secs(60));
            m.retry_after = Some(Instant::now() + delay);
            tracing::info!(
                chain_id = %snapshot.chain_id, event_kind = %snapshot.event_kind,
                consecutive_failures = m.consecutive_failures, next_retry_delay_ms = delay.as_millis() as u64,
                "restarting ingestion worker"
            );

            let degraded_now = m.consecutive_failures >= self.tuning.supervisor_max_consecutive_failures;
            m.worker.set_degraded(degraded_now);
            if degraded_now {
                self.degraded.store(true, Ordering::Relaxed);
            }

            m.token = self.root_token.child_token();
            m.handle = Some(tokio::spawn(m.worker.clone().run(m.token.clone())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedrun_config::FeatureFlags;
    use speedrun_storage::PersistenceGateway;
    use speedrun_types::chains::{ChainAdapter, ChainError, ChainResult, Log};
    use speedrun_types::common::{Address, BlockNumber, Bytes32, ChainId, EventKind};
    use speedrun_types::model::{Fulfillment, Intent, Settlement, UpsertOutcome};
    use speedrun_storage::{IntentFilter, Page, Pagination, StoreError};
    use async_trait::async_trait;
    use speedrun_lifecycle::LifecycleEngine;

    struct StubGateway;

    #[async_trait]
    impl PersistenceGateway for StubGateway {
        async fn upsert_intent(&self, _intent: Intent) -> Result<UpsertOutcome, StoreError> {
            Ok(UpsertOutcome::Inserted)
        }
        async fn upsert_fulfillment(&self, _f: Fulfillment) -> Result<UpsertOutcome, StoreError> {
            Ok(UpsertOutcome::Inserted)
        }
        async fn upsert_settlement(&self, _s: Settlement) -> Result<UpsertOutcome, StoreError> {
            Ok(UpsertOutcome::Inserted)
        }
        async fn get_intent(&self, _id: Bytes32) -> Result<Option<Intent>, StoreError> {
            Ok(None)
        }
        async fn list_intents(&self, _f: IntentFilter, p: Pagination) -> Result<Page<Intent>, StoreError> {
            Ok(Page::new(vec![], p, 0))
        }
        async fn list_intents_by_sender(&self, _s: Address, p: Pagination) -> Result<Page<Intent>, StoreError> {
            Ok(Page::new(vec![], p, 0))
        }
        async fn list_intents_by_recipient(&self, _r: Address, p: Pagination) -> Result<Page<Intent>, StoreError> {
            Ok(Page::new(vec![], p, 0))
        }
        async fn get_fulfillment(&self, _id: Bytes32) -> Result<Option<Fulfillment>, StoreError> {
            Ok(None)
        }
        async fn list_fulfillments(&self, p: Pagination) -> Result<Page<Fulfillment>, StoreError> {
            Ok(Page::new(vec![], p, 0))
        }
        async fn get_cursor(&self, _c: ChainId, _k: EventKind) -> Result<Option<BlockNumber>, StoreError> {
            Ok(None)
        }
        async fn set_cursor(&self, _c: ChainId, _k: EventKind, _b: BlockNumber) -> Result<(), StoreError> {
            Ok(())
        }
        async fn sum_fulfilled_amount(&self, _id: Bytes32) -> Result<speedrun_types::common::U256, StoreError> {
            Ok(speedrun_types::common::U256::ZERO)
        }
    }

    struct StuckAdapter;

    #[async_trait]
    impl ChainAdapter for StuckAdapter {
        fn chain_id(&self) -> ChainId {
            ChainId(1)
        }
        async fn block_number(&self) -> ChainResult<BlockNumber> {
            std::future::pending().await
        }
        async fn block_time(&self, _n: BlockNumber) -> ChainResult<speedrun_types::chains::BlockTime> {
            Err(ChainError::Timeout)
        }
        async fn get_logs(&self, _a: &[Address], _t: Bytes32, _f: BlockNumber, _t2: BlockNumber) -> ChainResult<Vec<Log>> {
            Ok(vec![])
        }
        async fn transaction_sender(&self, _tx: Bytes32) -> ChainResult<Address> {
            Ok(Address::ZERO)
        }
    }

    fn tuning() -> IngestionTuning {
        IngestionTuning {
            catchup_window_size: 10,
            heartbeat_interval_secs: 1,
            supervisor_interval_secs: 1,
            supervisor_max_concurrent_restarts: 2,
            supervisor_max_consecutive_failures: 2,
            shutdown_timeout_secs: 5,
            rpc_timeout_secs: 5,
            db_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn stalled_worker_is_restarted_and_eventually_marked_degraded() {
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(StubGateway);
        let lifecycle = Arc::new(LifecycleEngine::new(gateway.clone()));
        let adapter: Arc<dyn ChainAdapter> = Arc::new(StuckAdapter);
        let worker = IngestionWorker::new(
            ChainId(1),
            EventKind::Initiated,
            adapter,
            gateway,
            lifecycle,
            vec![],
            FeatureFlags { target_chain_zero_fallback: true },
            10,
            Duration::from_millis(20),
            1,
        );

        let root = CancellationToken::new();
        let supervisor = Supervisor::new(tuning(), root.clone());
        supervisor.spawn(worker).await;

        // block_number() never resolves, so the worker is perpetually stuck
        // in catch-up with a heartbeat that goes stale almost immediately.
        // Each sweep below waits out the previous one's backoff delay before
        // the next restart attempt is eligible.
        tokio::time::sleep(Duration::from_secs(3)).await;
        supervisor.sweep().await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        supervisor.sweep().await;

        assert!(supervisor.is_degraded());
        root.cancel();
    }
}
