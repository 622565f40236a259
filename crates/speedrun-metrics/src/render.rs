use speedrun_types::snapshot::WorkerSnapshot;
use std::fmt::Write as _;

/// Renders the latest worker snapshots plus supervisor-level counters as
/// Prometheus text exposition format, per §4.H. No metrics client crate is
/// used — this is a direct, hand-rolled port of the teacher's placeholder
/// `metrics_handler`, now actually populated.
pub fn render(snapshots: &[WorkerSnapshot], supervisor_degraded: bool) -> String {
    let mut out = String::new();

    write_help(&mut out, "speedrun_events_decoded_total", "counter", "Events decoded by an ingestion worker");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_events_decoded_total", s, s.events_decoded as f64);
    }

    write_help(&mut out, "speedrun_events_persisted_total", "counter", "Events successfully persisted by an ingestion worker");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_events_persisted_total", s, s.events_persisted as f64);
    }

    write_help(&mut out, "speedrun_decode_errors_total", "counter", "Logs that failed to decode and were skipped");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_decode_errors_total", s, s.decode_errors as f64);
    }

    write_help(&mut out, "speedrun_rpc_errors_total", "counter", "RPC calls that failed after retry");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_rpc_errors_total", s, s.rpc_errors as f64);
    }

    write_help(&mut out, "speedrun_last_progress_age_seconds", "gauge", "Seconds since an ingestion worker last made progress");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_last_progress_age_seconds", s, s.last_progress_age_seconds as f64);
    }

    write_help(&mut out, "speedrun_cursor_block", "gauge", "Last block number persisted to the cursor");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_cursor_block", s, s.cursor_block as f64);
    }

    write_help(&mut out, "speedrun_restarts_total", "counter", "Times the supervisor has restarted this worker");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_restarts_total", s, s.restarts_total as f64);
    }

    write_help(&mut out, "speedrun_worker_degraded", "gauge", "1 if this worker has hit the consecutive-failure threshold");
    for s in snapshots {
        writeln_metric(&mut out, "speedrun_worker_degraded", s, if s.degraded { 1.0 } else { 0.0 });
    }

    write_help(&mut out, "speedrun_degraded", "gauge", "1 if the supervisor considers the service degraded overall");
    let _ = writeln!(out, "speedrun_degraded {}", if supervisor_degraded { 1 } else { 0 });

    out
}

fn write_help(out: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn writeln_metric(out: &mut String, name: &str, s: &WorkerSnapshot, value: f64) {
    let _ = writeln!(
        out,
        r#"{name}{{chain_id="{}",event_kind="{}",phase="{}"}} {value}"#,
        s.chain_id, s.event_kind, s.phase
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedrun_types::common::{ChainId, EventKind};

    fn snapshot() -> WorkerSnapshot {
        WorkerSnapshot {
            chain_id: ChainId(8453),
            event_kind: EventKind::Initiated,
            phase: "live",
            cursor_block: 100,
            events_decoded: 5,
            events_persisted: 5,
            decode_errors: 0,
            rpc_errors: 1,
            last_progress_age_seconds: 2,
            restarts_total: 0,
            degraded: false,
        }
    }

    #[test]
    fn renders_one_line_per_metric_per_worker() {
        let text = render(&[snapshot()], false);
        assert!(text.contains(r#"speedrun_cursor_block{chain_id="8453",event_kind="initiated",phase="live"} 100"#));
        assert!(text.contains("speedrun_degraded 0"));
    }

    #[test]
    fn empty_snapshot_list_still_renders_degraded_line() {
        let text = render(&[], true);
        assert!(text.contains("speedrun_degraded 1"));
    }
}
