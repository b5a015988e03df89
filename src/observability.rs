use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: range conflict checks. Labels: outcome (available|conflict|error).
pub const RANGE_CHECKS_TOTAL: &str = "staygrid_range_checks_total";

/// Histogram: range-check latency in seconds.
pub const RANGE_CHECK_DURATION_SECONDS: &str = "staygrid_range_check_duration_seconds";

/// Counter: per-day fetch failures resolved by the fetch-error policy.
/// Labels: policy.
pub const DAY_FETCH_FAILURES_TOTAL: &str = "staygrid_day_fetch_failures_total";

// ── Cache metrics ───────────────────────────────────────────────

/// Histogram: days fetched per month fill.
pub const CACHE_FILL_DAYS: &str = "staygrid_cache_fill_days";

/// Counter: month fills skipped because the cache was warm enough.
pub const CACHE_FILLS_SKIPPED_TOTAL: &str = "staygrid_cache_fills_skipped_total";

/// Counter: resolved month fills discarded because the session moved on.
pub const STALE_FILLS_DISCARDED_TOTAL: &str = "staygrid_stale_fills_discarded_total";

/// Counter: alternative rooms returned by suggestion queries.
pub const ALTERNATIVE_SUGGESTIONS_TOTAL: &str = "staygrid_alternative_suggestions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
