use crate::render::render;
use arc_swap::ArcSwap;
use axum::{response::IntoResponse, routing::get, Router};
use speedrun_supervisor::Supervisor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Periodically snapshots the supervisor's workers and caches the rendered
/// Prometheus text, so a scrape never blocks on a live gateway/worker lock —
/// it just reads the last render (§4.H).
pub struct MetricsCollector {
    supervisor: Arc<Supervisor>,
    rendered: ArcSwap<String>,
}

impl MetricsCollector {
    pub fn new(supervisor: Arc<Supervisor>) -> Arc<Self> {
        Arc::new(Self { supervisor, rendered: ArcSwap::from_pointee(String::new()) })
    }

    pub async fn run(self: Arc<Self>, interval_secs: u64, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            self.refresh().await;
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => return,
            }
        }
    }

    async fn refresh(&self) {
        let snapshots = self.supervisor.snapshots().await;
        let text = render(&snapshots, self.supervisor.is_degraded());
        self.rendered.store(Arc::new(text));
    }

    fn current(&self) -> Arc<String> {
        self.rendered.load_full()
    }
}

async fn metrics_handler(axum::extract::State(collector): axum::extract::State<Arc<MetricsCollector>>) -> impl IntoResponse {
    (*collector.current()).clone()
}

pub fn router(collector: Arc<MetricsCollector>) -> Router {
    Router::new().route("/metrics", get(metrics_handler)).with_state(collector)
}

/// Binds the metrics port and serves `GET /metrics` until `shutdown` fires —
/// grounded in the teacher's `solver_service::api::start_metrics_server`.
pub async fn start_metrics_server(port: u16, collector: Arc<MetricsCollector>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let app = router(collector);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "metrics server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
