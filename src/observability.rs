use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: assignment lifecycle operations. Labels: op, status.
pub const ASSIGNMENT_OPS_TOTAL: &str = "capacityd_assignment_ops_total";

/// Counter: creates/updates refused because the engineer would be over capacity.
pub const CAPACITY_REJECTIONS_TOTAL: &str = "capacityd_capacity_rejections_total";

/// Histogram: candidates returned per match.
pub const CANDIDATES_RETURNED: &str = "capacityd_candidates_returned";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: time spent waiting for a per-engineer section, in seconds.
pub const LOCK_WAIT_SECONDS: &str = "capacityd_lock_wait_seconds";

/// Gauge: engineers with a ledger partition.
pub const LEDGER_PARTITIONS: &str = "capacityd_ledger_partitions";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Record the outcome of a lifecycle operation.
pub fn record_op<T, E>(op: &'static str, result: &Result<T, E>, status: impl Fn(&E) -> &'static str) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => status(e),
    };
    metrics::counter!(ASSIGNMENT_OPS_TOTAL, "op" => op, "status" => status).increment(1);
}
