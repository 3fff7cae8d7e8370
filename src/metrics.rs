//! Execution metrics: phase durations, vertex/edge counts, and
//! reclamation counts, tracked in-memory and optionally printed or
//! dumped to JSON. The built-in counter names this crate registers are
//! `vertices_visited`, `edges_created`, `destructors_invoked`, and
//! `phase_*_us`.

use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A custom metric implementation.
pub trait Metric: Send + Sync + Any {
    fn name(&self) -> &str;
    fn value(&self) -> Value;
    fn description(&self) -> Option<&str> {
        None
    }
    fn as_any(&self) -> &dyn Any;
}

/// Thread-safe container for collecting execution metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                metrics: HashMap::new(),
                start_time: None,
                end_time: None,
            })),
        }
    }

    pub fn register(&self, metric: Box<dyn Metric>) {
        let mut inner = self.inner.lock().unwrap();
        inner.metrics.insert(metric.name().to_string(), metric);
    }

    pub fn record_start(&self) {
        self.inner.lock().unwrap().start_time = Some(Instant::now());
    }

    pub fn record_end(&self) {
        self.inner.lock().unwrap().end_time = Some(Instant::now());
    }

    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.inner.lock().unwrap();
        match (inner.start_time, inner.end_time) {
            (Some(s), Some(e)) => Some(e.duration_since(s)),
            _ => None,
        }
    }

    /// Add `value` to a counter metric, creating it at zero first if
    /// it doesn't exist yet.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.inner.lock().unwrap();
        let new_count = inner
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map_or(value, |c| c.count + value);
        inner.metrics.insert(
            name.to_string(),
            Box::new(CounterMetric {
                name: name.to_string(),
                count: new_count,
            }),
        );
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.inner.lock().unwrap();
        let mut out = serde_json::Map::new();
        for (name, metric) in &inner.metrics {
            let mut obj = serde_json::Map::new();
            obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                obj.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(obj));
        }
        if let (Some(s), Some(e)) = (inner.start_time, inner.end_time) {
            out.insert(
                "execution_time_ms".to_string(),
                json!({ "value": e.duration_since(s).as_millis() }),
            );
        }
        json!(out)
    }

    pub fn print(&self) {
        println!("\n========== Engine Metrics ==========");
        let inner = self.inner.lock().unwrap();
        if let (Some(s), Some(e)) = (inner.start_time, inner.end_time) {
            let elapsed = e.duration_since(s);
            println!("Execution Time: {:.3}s ({} ms)", elapsed.as_secs_f64(), elapsed.as_millis());
            println!("-------------------------------------");
        }
        let mut sorted: Vec<_> = inner.metrics.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);
        for (name, metric) in sorted {
            match metric.description() {
                Some(desc) => println!("{name}: {} ({desc})", metric.value()),
                None => println!("{name}: {}", metric.value()),
            }
        }
        println!("=====================================\n");
    }

    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(&self.to_json())?.as_bytes())?;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let inner = self.inner.lock().unwrap();
        inner.metrics.iter().map(|(n, m)| (n.clone(), m.value())).collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple counter metric.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), count: 0 }
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }
    fn value(&self) -> Value {
        json!(self.count)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = MetricsCollector::new();
        m.increment_counter("vertices_visited", 4);
        m.increment_counter("vertices_visited", 12);
        let snap = m.snapshot();
        assert_eq!(snap["vertices_visited"], json!(16));
    }
}
