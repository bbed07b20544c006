//! In-memory metrics registry backing the `metrics` facade.
//!
//! Counters and gauges recorded anywhere in the crate through
//! `metrics::counter!` / `metrics::gauge!` land here and are exposed as a
//! JSON snapshot on `GET /metrics`. Histograms are accepted but not stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use metrics::{Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Recorder, SharedString, Unit};
use serde_json::{json, Value};
use tracing::warn;

#[derive(Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, Arc<AtomicU64>>,
    gauges: DashMap<String, Arc<GaugeCell>>,
}

/// f64 gauge stored as raw bits.
#[derive(Default)]
struct GaugeCell(AtomicU64);

impl GaugeCell {
    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl GaugeFn for GaugeCell {
    fn increment(&self, value: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    fn decrement(&self, value: f64) {
        self.increment(-value);
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl MetricsRegistry {
    fn counter_handle(&self, name: &str) -> Arc<AtomicU64> {
        self.counters
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn gauge_handle(&self, name: &str) -> Arc<GaugeCell> {
        self.gauges.entry(name.to_string()).or_default().clone()
    }

    /// JSON snapshot of every counter and gauge seen so far.
    pub fn snapshot(&self) -> Value {
        let counters: HashMap<String, u64> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        let gauges: HashMap<String, f64> = self
            .gauges
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        json!({ "counters": counters, "gauges": gauges })
    }
}

impl Recorder for MetricsRegistry {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key) -> Counter {
        Counter::from_arc(self.counter_handle(key.name()))
    }

    fn register_gauge(&self, key: &Key) -> Gauge {
        Gauge::from_arc(self.gauge_handle(key.name()))
    }

    fn register_histogram(&self, _key: &Key) -> Histogram {
        Histogram::noop()
    }
}

static REGISTRY: OnceLock<MetricsRegistry> = OnceLock::new();

/// The process-wide registry, created on first use.
pub fn registry() -> &'static MetricsRegistry {
    REGISTRY.get_or_init(MetricsRegistry::default)
}

/// Installs the registry as the global `metrics` recorder. Safe to call more
/// than once; later calls are no-ops.
pub fn install_recorder() {
    if metrics::set_recorder(registry()).is_err() {
        warn!("metrics recorder already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_in_snapshot() {
        let registry = MetricsRegistry::default();
        let handle = registry.counter_handle("test.counter");
        handle.fetch_add(3, Ordering::Relaxed);
        handle.fetch_add(2, Ordering::Relaxed);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot["counters"]["test.counter"], 5);
    }

    #[test]
    fn gauges_set_and_adjust() {
        let registry = MetricsRegistry::default();
        let cell = registry.gauge_handle("test.gauge");
        cell.set(10.0);
        cell.increment(2.5);
        cell.decrement(0.5);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot["gauges"]["test.gauge"], 12.0);
    }
}
