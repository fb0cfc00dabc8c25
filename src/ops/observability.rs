//! Client-side metrics.
//!
//! Metric namespace: `lattice.client.kv.*`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metric names.
pub mod metrics {
    /// RPC attempts issued, retries included.
    pub const KV_REQUESTS_TOTAL: &str = "lattice.client.kv.requests_total";
    /// Attempts rejected by the remote.
    pub const KV_RPC_ERRORS_TOTAL: &str = "lattice.client.kv.rpc_errors_total";
    /// Attempts that hit a transport failure.
    pub const KV_TRANSPORT_ERRORS_TOTAL: &str = "lattice.client.kv.transport_errors_total";
    /// Read attempts repeated after a rotation.
    pub const KV_READ_RETRIES_TOTAL: &str = "lattice.client.kv.read_retries_total";
    /// Replacement connections installed.
    pub const KV_ROTATIONS_TOTAL: &str = "lattice.client.kv.rotations_total";
    /// Rotations where the pool produced no connection.
    pub const KV_ROTATION_FAILURES_TOTAL: &str = "lattice.client.kv.rotation_failures_total";
}

/// Counter registry shared by a client and its dispatchers.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter.
    pub fn counter_inc(&self, name: &str) {
        self.counter_add(name, 1);
    }

    /// Add to a counter.
    pub fn counter_add(&self, name: &str, value: u64) {
        let counters = self.counters.read();
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }
        drop(counters);

        let mut counters = self.counters.write();
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Get counter value.
    pub fn counter_get(&self, name: &str) -> u64 {
        self.counters
            .read()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Export counters in Prometheus text format, sorted by name.
    pub fn export_prometheus(&self) -> String {
        let counters = self.counters.read();
        let mut names: Vec<&String> = counters.keys().collect();
        names.sort();

        let mut output = String::new();
        for name in names {
            let prometheus_name = name.replace('.', "_");
            output.push_str(&format!(
                "# TYPE {} counter\n{} {}\n",
                prometheus_name,
                prometheus_name,
                counters[name].load(Ordering::Relaxed)
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let registry = MetricsRegistry::new();

        registry.counter_inc(metrics::KV_ROTATIONS_TOTAL);
        assert_eq!(registry.counter_get(metrics::KV_ROTATIONS_TOTAL), 1);

        registry.counter_add(metrics::KV_ROTATIONS_TOTAL, 4);
        assert_eq!(registry.counter_get(metrics::KV_ROTATIONS_TOTAL), 5);
        assert_eq!(registry.counter_get(metrics::KV_REQUESTS_TOTAL), 0);
    }

    #[test]
    fn prometheus_export_uses_underscores() {
        let registry = MetricsRegistry::new();
        registry.counter_add(metrics::KV_REQUESTS_TOTAL, 3);

        let text = registry.export_prometheus();
        assert!(text.contains("# TYPE lattice_client_kv_requests_total counter"));
        assert!(text.contains("lattice_client_kv_requests_total 3"));
    }
}
