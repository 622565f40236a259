//! Ingestion Worker — §4.D. One instance per `(ChainId, EventKind)`, run as
//! its own `tokio::task`: a catch-up pass from the persisted cursor to the
//! chain head observed at startup, then a live poll loop from there on.
//! Grounded in the teacher's `ChainEventSource`/`OnChainSource` split and the
//! pack's `force23airr-stableguard` chain indexer's backfill/live-index
//! split.

use crate::error::IngestionError;
use arc_swap::ArcSwap;
use speedrun_config::FeatureFlags;
use speedrun_decoder::topic0_signatures;
use speedrun_lifecycle::LifecycleEngine;
use speedrun_storage::PersistenceGateway;
use speedrun_types::chains::{ChainAdapter, ChainError, ChainResult, Log};
use speedrun_types::common::{Address, BlockNumber, ChainId, EventKind};
use speedrun_types::events::DecodedRecord;
use speedrun_types::snapshot::{WorkerPhase, WorkerSnapshot};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

pub struct IngestionWorker {
    chain_id: ChainId,
    event_kind: EventKind,
    adapter: Arc<dyn ChainAdapter>,
    gateway: Arc<dyn PersistenceGateway>,
    lifecycle: Arc<LifecycleEngine>,
    watch_addresses: Vec<Address>,
    feature_flags: FeatureFlags,
    window_size: u64,
    poll_interval: Duration,
    heartbeat_interval_secs: u64,

    phase: ArcSwap<WorkerPhase>,
    heartbeat: AtomicU64,
    cursor_block: AtomicU64,
    events_decoded: AtomicU64,
    events_persisted: AtomicU64,
    decode_errors: AtomicU64,
    rpc_errors: AtomicU64,
    restarts_total: AtomicU64,
    degraded: AtomicBool,
}

impl IngestionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: ChainId,
        event_kind: EventKind,
        adapter: Arc<dyn ChainAdapter>,
        gateway: Arc<dyn PersistenceGateway>,
        lifecycle: Arc<LifecycleEngine>,
        watch_addresses: Vec<Address>,
        feature_flags: FeatureFlags,
        window_size: u64,
        poll_interval: Duration,
        heartbeat_interval_secs: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            event_kind,
            adapter,
            gateway,
            lifecycle,
            watch_addresses,
            feature_flags,
            window_size: window_size.max(1),
            poll_interval,
            heartbeat_interval_secs,
            phase: ArcSwap::from_pointee(WorkerPhase::Initializing),
            heartbeat: AtomicU64::new(unix_now()),
            cursor_block: AtomicU64::new(0),
            events_decoded: AtomicU64::new(0),
            events_persisted: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            rpc_errors: AtomicU64::new(0),
            restarts_total: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            chain_id: self.chain_id,
            event_kind: self.event_kind,
            phase: self.phase.load().as_str(),
            cursor_block: self.cursor_block.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            events_persisted: self.events_persisted.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            rpc_errors: self.rpc_errors.load(Ordering::Relaxed),
            last_progress_age_seconds: unix_now().saturating_sub(self.heartbeat.load(Ordering::Relaxed)),
            restarts_total: self.restarts_total.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }

    pub fn record_restart(&self) {
        self.restarts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_degraded(&self, degraded: bool) {
        self.degraded.store(degraded, Ordering::Relaxed);
    }

    /// Runs catch-up then live polling until `shutdown` fires. A transient
    /// RPC error during live polling re-enters catch-up after reconnecting,
    /// per §4.D; an exhausted catch-up retry bubbles up so the supervisor
    /// can restart this worker from its last persisted cursor.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<(), IngestionError> {
        self.phase.store(Arc::new(WorkerPhase::Initializing));
        self.touch_heartbeat();

        loop {
            let from = self.gateway.get_cursor(self.chain_id, self.event_kind).await?.map(|b| b + 1).unwrap_or(0);
            let head = match self.adapter.block_number().await {
                Ok(head) => head,
                Err(e) => {
                    self.rpc_errors.fetch_add(1, Ordering::Relaxed);
                    return Err(e.into());
                }
            };

            self.catch_up(from, head, &shutdown).await?;
            if shutdown.is_cancelled() {
                break;
            }

            self.phase.store(Arc::new(WorkerPhase::Live));
            match self.live_loop(head + 1, &shutdown).await {
                Ok(()) => break,
                Err(IngestionError::Chain(_)) => {
                    // Transient: fall back to catch-up, which re-reads the
                    // cursor and snapshots a fresh head.
                    tracing::warn!(chain_id = %self.chain_id, event_kind = %self.event_kind, "live loop hit a chain error, re-entering catch-up");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        self.phase.store(Arc::new(WorkerPhase::Stopped));
        Ok(())
    }

    async fn catch_up(&self, mut from: BlockNumber, head: BlockNumber, shutdown: &CancellationToken) -> Result<(), IngestionError> {
        self.phase.store(Arc::new(WorkerPhase::CatchingUp));

        if from > head {
            return Ok(());
        }

        while from <= head && !shutdown.is_cancelled() {
            let to = (from + self.window_size - 1).min(head);

            tracing::info!(
                chain_id = %self.chain_id, event_kind = %self.event_kind,
                from, to, head, "catching up window"
            );

            let logs = self.fetch_logs_with_backoff(from, to).await?;
            self.process_logs(logs).await?;
            self.gateway.set_cursor(self.chain_id, self.event_kind, to).await?;
            self.cursor_block.store(to, Ordering::Relaxed);
            self.touch_heartbeat();

            from = to + 1;
        }

        Ok(())
    }

    async fn live_loop(&self, mut from: BlockNumber, shutdown: &CancellationToken) -> Result<(), IngestionError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => return Ok(()),
            }

            let head = match self.adapter.block_number().await {
                Ok(head) => head,
                Err(e) => {
                    self.rpc_errors.fetch_add(1, Ordering::Relaxed);
                    return Err(IngestionError::Chain(e));
                }
            };
            if head < from {
                self.touch_heartbeat_if_stale();
                continue;
            }

            let logs = self.fetch_logs_with_backoff(from, head).await?;
            self.process_logs(logs).await?;
            self.gateway.set_cursor(self.chain_id, self.event_kind, head).await?;
            self.cursor_block.store(head, Ordering::Relaxed);
            self.touch_heartbeat();

            from = head + 1;

            if shutdown.is_cancelled() {
                return Ok(());
            }
        }
    }

    async fn process_logs(&self, logs: Vec<Log>) -> Result<(), IngestionError> {
        for log in logs {
            let sender = if self.event_kind == EventKind::Initiated {
                match self.adapter.transaction_sender(log.transaction_hash).await {
                    Ok(sender) => sender,
                    Err(e) => {
                        self.rpc_errors.fetch_add(1, Ordering::Relaxed);
                        return Err(e.into());
                    }
                }
            } else {
                Address::ZERO
            };

            let decoded = match speedrun_decoder::decode(&log, self.event_kind, self.chain_id, sender, &self.feature_flags) {
                Ok(record) => record,
                Err(e) => {
                    self.decode_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        chain_id = %self.chain_id, event_kind = %self.event_kind,
                        tx_hash = %log.transaction_hash, error = %e,
                        "failed to decode log, skipping"
                    );
                    continue;
                }
            };
            self.events_decoded.fetch_add(1, Ordering::Relaxed);

            let (timestamp, timestamp_is_fallback) = match self.adapter.block_time(log.block_number).await {
                Ok(bt) => (bt.timestamp, false),
                Err(e) => {
                    self.rpc_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        chain_id = %self.chain_id, event_kind = %self.event_kind,
                        block_number = log.block_number, error = %e,
                        "block_time unrecoverable, falling back to ingestion wall clock"
                    );
                    (unix_now() as i64, true)
                }
            };

            self.apply_with_retry(decoded, timestamp, timestamp_is_fallback).await?;
            self.events_persisted.fetch_add(1, Ordering::Relaxed);
            self.touch_heartbeat();
        }
        Ok(())
    }

    /// A transient `StoreError` (dropped connection, timed-out pool
    /// acquire) gets one jittered retry before the worker halts; a
    /// persistent one halts immediately, per §4.D/§8.
    async fn apply_with_retry(&self, record: DecodedRecord, timestamp: i64, timestamp_is_fallback: bool) -> Result<(), IngestionError> {
        match self.lifecycle.apply(record.clone(), timestamp, timestamp_is_fallback).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_transient() => {
                let mut policy = backoff::ExponentialBackoffBuilder::new()
                    .with_initial_interval(Duration::from_millis(200))
                    .with_randomization_factor(0.5)
                    .build();
                let delay = backoff::backoff::Backoff::next_backoff(&mut policy).unwrap_or(Duration::from_millis(200));
                tracing::warn!(
                    chain_id = %self.chain_id, event_kind = %self.event_kind, error = %e,
                    delay_ms = delay.as_millis() as u64, "store error was transient, retrying once"
                );
                tokio::time::sleep(delay).await;
                Ok(self.lifecycle.apply(record, timestamp, timestamp_is_fallback).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_logs_with_backoff(&self, from: BlockNumber, to: BlockNumber) -> Result<Vec<Log>, IngestionError> {
        let result = with_backoff(|| self.fetch_logs(from, to)).await;
        if result.is_err() {
            self.rpc_errors.fetch_add(1, Ordering::Relaxed);
        }
        Ok(result?)
    }

    async fn fetch_logs(&self, from: BlockNumber, to: BlockNumber) -> ChainResult<Vec<Log>> {
        let mut logs = Vec::new();
        for topic0 in topic0_signatures(self.event_kind) {
            logs.extend(self.adapter.get_logs(&self.watch_addresses, topic0, from, to).await?);
        }
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(logs)
    }

    fn touch_heartbeat(&self) {
        self.heartbeat.store(unix_now(), Ordering::Relaxed);
    }

    /// Called on an empty poll tick so a quiet chain still looks alive —
    /// refreshed at least every `heartbeat_interval_secs`, per §4.D.
    fn touch_heartbeat_if_stale(&self) {
        let age = unix_now().saturating_sub(self.heartbeat.load(Ordering::Relaxed));
        if age >= self.heartbeat_interval_secs {
            self.touch_heartbeat();
        }
    }
}

async fn with_backoff<F, Fut, T>(f: F) -> ChainResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let policy = backoff::ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(500))
        .with_max_interval(Duration::from_secs(30))
        .with_max_elapsed_time(Some(Duration::from_secs(300)))
        .build();

    backoff::future::retry(policy, || async {
        f().await.map_err(|e| match e {
            ChainError::UnknownChain(_) => backoff::Error::permanent(e),
            other => backoff::Error::transient(other),
        })
    })
    .await
}
