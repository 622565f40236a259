//! Orchestrator — §4.I. Owns the chain registry, the per-`(chain,
//! event_kind)` worker set, the supervisor, the metrics ticker, and the API
//! server, all driven by a single root [`CancellationToken`]. Grounded in
//! `solver_core::engine::Orchestrator`/`OrchestratorBuilder`.

use crate::error::CoreError;
use crate::lifecycle::{LifecycleManager, LifecycleState};
use speedrun_api::AppState;
use speedrun_chains::ChainClientRegistry;
use speedrun_config::Config;
use speedrun_lifecycle::LifecycleEngine;
use speedrun_storage::{PersistenceGateway, PgGateway};
use speedrun_supervisor::Supervisor;
use speedrun_types::common::EventKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Orchestrator {
    config: Config,
    gateway: Arc<PgGateway>,
    supervisor: Arc<Supervisor>,
    lifecycle_manager: LifecycleManager,
    root_token: CancellationToken,
    http_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    metrics_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    metrics_ticker_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    supervisor_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Connects to Postgres and every configured chain, wires one ingestion
    /// worker per `(chain, event_kind)` into the supervisor, and registers
    /// (but does not yet start) the HTTP/metrics servers.
    pub async fn build(config: Config) -> Result<Arc<Self>, CoreError> {
        let lifecycle_manager = LifecycleManager::new();
        lifecycle_manager.transition(LifecycleState::Initializing).await.ok();

        let gateway = Arc::new(PgGateway::connect(&config.database_url).await?);
        gateway.migrate().await?;

        let registry = ChainClientRegistry::connect(&config).await?;
        let persistence: Arc<dyn PersistenceGateway> = gateway.clone();
        let lifecycle_engine = Arc::new(LifecycleEngine::new(persistence.clone()));

        let root_token = CancellationToken::new();
        let supervisor = Supervisor::new(config.tuning, root_token.clone());

        for (chain_id, endpoint) in &config.chains {
            let adapter = registry.get(*chain_id).ok_or_else(|| {
                CoreError::Configuration(format!("no adapter registered for chain {chain_id}"))
            })?;
            let watch_addresses = endpoint.gateway_address.into_iter().collect::<Vec<_>>();

            for kind in EventKind::ALL {
                let worker = speedrun_ingestion::IngestionWorker::new(
                    *chain_id,
                    kind,
                    adapter.clone(),
                    persistence.clone(),
                    lifecycle_engine.clone(),
                    watch_addresses.clone(),
                    config.feature_flags,
                    config.tuning.catchup_window_size,
                    Duration::from_secs(config.tuning.heartbeat_interval_secs.max(1)),
                    config.tuning.heartbeat_interval_secs,
                );
                supervisor.spawn(worker).await;
            }
        }

        Ok(Arc::new(Self {
            config,
            gateway,
            supervisor,
            lifecycle_manager,
            root_token,
            http_handle: tokio::sync::Mutex::new(None),
            metrics_handle: tokio::sync::Mutex::new(None),
            metrics_ticker_handle: tokio::sync::Mutex::new(None),
            supervisor_handle: tokio::sync::Mutex::new(None),
        }))
    }

    /// Starts the supervisor loop, the metrics ticker/server, and the read
    /// API server as background tasks.
    pub async fn start(self: &Arc<Self>) -> Result<(), CoreError> {
        let supervisor_task = tokio::spawn(self.supervisor.clone().run());
        *self.supervisor_handle.lock().await = Some(supervisor_task);

        let collector = speedrun_metrics::MetricsCollector::new(self.supervisor.clone());
        let metrics_port = self.config.metrics_port;

        let ticker_token = self.root_token.clone();
        let ticker_collector = collector.clone();
        let ticker_task = tokio::spawn(async move { ticker_collector.run(15, ticker_token).await });
        *self.metrics_ticker_handle.lock().await = Some(ticker_task);

        let metrics_token = self.root_token.clone();
        let metrics_task = tokio::spawn(async move {
            if let Err(e) = speedrun_metrics::start_metrics_server(metrics_port, collector, metrics_token).await {
                error!(error = %e, "metrics server exited with an error");
            }
        });
        *self.metrics_handle.lock().await = Some(metrics_task);

        let state = AppState {
            gateway: Arc::clone(&self.gateway) as Arc<dyn PersistenceGateway>,
            supervisor: self.supervisor.clone(),
            db_timeout: Duration::from_secs(self.config.tuning.db_timeout_secs),
        };
        let router = speedrun_api::build_router(state, &self.config.allowed_origins);
        let http_port = self.config.port;
        let http_token = self.root_token.clone();
        let http_task = tokio::spawn(async move {
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], http_port));
            info!(%addr, "http server listening");
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, "failed to bind http listener");
                    return;
                }
            };
            let result = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move { http_token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "http server exited with an error");
            }
        });
        *self.http_handle.lock().await = Some(http_task);

        self.lifecycle_manager.transition(LifecycleState::Running).await?;
        info!("orchestrator started");
        Ok(())
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle_manager.get_state().await
    }

    /// Stop accepting HTTP, cancel every worker token with a grace period,
    /// close the pool, and report any per-subsystem errors. Per §4.I.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.lifecycle_manager.transition(LifecycleState::Stopping).await?;
        info!("orchestrator shutting down");

        self.root_token.cancel();

        let grace = Duration::from_secs(self.config.tuning.shutdown_timeout_secs.max(1));

        if let Some(handle) = self.http_handle.lock().await.take() {
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("http server did not stop within the shutdown grace period");
            }
        }
        if let Some(handle) = self.supervisor_handle.lock().await.take() {
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("supervisor did not stop within the shutdown grace period");
            }
        }
        if let Some(handle) = self.metrics_handle.lock().await.take() {
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("metrics server did not stop within the shutdown grace period");
            }
        }
        if let Some(handle) = self.metrics_ticker_handle.lock().await.take() {
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("metrics ticker did not stop within the shutdown grace period");
            }
        }

        self.gateway.close().await;
        self.lifecycle_manager.transition(LifecycleState::Stopped).await?;
        info!("orchestrator shutdown complete");
        Ok(())
    }
}
