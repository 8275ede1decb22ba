use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static RIGHTS_RECONCILED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CACHE_LOOKUPS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Create and register every collector. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let rights_reconciled = IntCounterVec::new(
        Opts::new(
            "rights_reconciled_total",
            "Rights persisted by reconciliation, per phase",
        ),
        &["phase"],
    )?;
    let cache_lookups = IntCounterVec::new(
        Opts::new("cache_lookups_total", "Cache lookups by outcome"),
        &["outcome"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(rights_reconciled.clone()))?;
    registry.register(Box::new(cache_lookups.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = RIGHTS_RECONCILED_TOTAL.set(rights_reconciled);
    let _ = CACHE_LOOKUPS_TOTAL.set(cache_lookups);

    Ok(())
}

/// Count rights persisted by one reconciliation phase (`create`, `update`, `delete`).
pub fn record_rights_phase(phase: &str, count: usize) {
    if let Some(counter) = RIGHTS_RECONCILED_TOTAL.get() {
        counter.with_label_values(&[phase]).inc_by(count as u64);
    }
}

/// Count a cache lookup (`hit` or `miss`).
pub fn record_cache_lookup(outcome: &str) {
    if let Some(counter) = CACHE_LOOKUPS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconciliation_counter_is_exported() {
        init_metrics().unwrap();
        record_rights_phase("create", 2);
        record_cache_lookup("miss");

        let text = get_metrics();
        assert!(text.contains("rights_reconciled_total"));
        assert!(text.contains("cache_lookups_total"));
    }
}
