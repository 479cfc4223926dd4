//! Block generation metrics using metrics-rs.
//!
//! Records generated blocks and generation failures. The CLI installs a
//! `CliRecorder` when `--metrics` is given and prints a summary on exit.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_histogram, histogram,
};
use mrec_gen::GenError;
use parking_lot::RwLock;

use crate::recompiler::failure_kind;

/// Initialize metric descriptions.
///
/// Call this once at startup, after installing a recorder.
pub fn init() {
    describe_counter!(
        "mrec_blocks_generated_total",
        Unit::Count,
        "Total blocks generated"
    );
    describe_counter!(
        "mrec_guest_instructions_total",
        Unit::Count,
        "Total guest instructions placed in generated blocks"
    );
    describe_counter!(
        "mrec_generation_failures_total",
        Unit::Count,
        "Total failed generation passes"
    );
    describe_histogram!(
        "mrec_block_instructions",
        Unit::Count,
        "Guest instructions per generated block"
    );
}

/// Record a successfully generated block.
pub fn record_block(guest_instructions: usize) {
    let count = u64::try_from(guest_instructions).unwrap_or(u64::MAX);
    counter!("mrec_blocks_generated_total").increment(1);
    counter!("mrec_guest_instructions_total").increment(count);
    #[allow(clippy::cast_precision_loss)]
    let value = count as f64;
    histogram!("mrec_block_instructions").record(value);
}

/// Record a failed generation pass, labelled by failure kind.
pub fn record_failure(err: &GenError) {
    let labels = [("kind", failure_kind(err).to_string())];
    counter!("mrec_generation_failures_total", &labels).increment(1);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.values.write().insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// Recorder that keeps counters and histograms in memory for the CLI.
///
/// Gauges are accepted and discarded.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install this recorder as the global metrics recorder.
    ///
    /// Returns `None` if a global recorder is already installed.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }

    /// Handle onto this recorder's storage, without installing it.
    #[must_use]
    pub fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            counters: Arc::clone(&self.counters),
            histograms: Arc::clone(&self.histograms),
        }
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Handle for reading metrics collected by a `CliRecorder`.
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    /// Get a counter value by rendered key, e.g. `name{kind=...}`.
    #[must_use]
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    #[must_use]
    pub fn get_histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.histograms.values.read().get(key).cloned()
    }

    /// Print all collected metrics in a human-readable format.
    pub fn print_summary(&self) {
        let counters = self.counters.values.read();
        let histograms = self.histograms.values.read();

        if counters.is_empty() && histograms.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut entries: Vec<_> = counters.iter().collect();
            entries.sort();
            for (key, value) in entries {
                println!("  {key}: {value}");
            }
            println!();
        }

        if !histograms.is_empty() {
            println!("### Histograms");
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(values) = histograms.get(key)
                    && !values.is_empty()
                {
                    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    #[allow(clippy::cast_precision_loss)]
                    let avg = values.iter().sum::<f64>() / values.len() as f64;
                    println!(
                        "  {key}: count={}, min={min:.0}, max={max:.0}, avg={avg:.2}",
                        values.len()
                    );
                }
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use metrics::Label;

    use super::*;

    #[test]
    fn test_key_to_string() {
        let key = Key::from_name("mrec_blocks_generated_total");
        assert_eq!(key_to_string(&key), "mrec_blocks_generated_total");

        let key = Key::from_parts(
            "mrec_generation_failures_total",
            vec![Label::new("kind", "block_too_large")],
        );
        assert_eq!(
            key_to_string(&key),
            "mrec_generation_failures_total{kind=block_too_large}"
        );
    }

    #[test]
    fn test_recorder_collects_block_metrics() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_block(3);
            record_block(5);
            record_failure(&GenError::InvalidEntryPoint { address: 0 });
        });

        assert_eq!(handle.get_counter("mrec_blocks_generated_total"), Some(2));
        assert_eq!(handle.get_counter("mrec_guest_instructions_total"), Some(8));
        assert_eq!(
            handle.get_counter("mrec_generation_failures_total{kind=invalid_entry_point}"),
            Some(1)
        );
        assert_eq!(
            handle.get_histogram("mrec_block_instructions"),
            Some(vec![3.0, 5.0])
        );
    }
}
