//! # Speedrun Metrics
//!
//! The Metrics Observer (§4.H): a ticker that snapshots every ingestion
//! worker and the supervisor, renders Prometheus text exposition format, and
//! serves it on `GET /metrics` on its own port — grounded in the teacher's
//! `solver_service::api::start_metrics_server`/`metrics_handler`.

mod render;
mod server;

pub use server::{router, start_metrics_server, MetricsCollector};
