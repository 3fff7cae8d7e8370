//! The kernel scheduler: phase state machine and lane-barrier
//! execution shared by every operation.
//!
//! Runs one phase over every lane, then barriers, either sequentially
//! or via `rayon` across lanes, selected per invocation by
//! [`EngineConfig`].

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::Graph;
use crate::lane::Lane;
use rayon::prelude::*;
use std::fmt;

/// How the kernel spreads lane work across threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Parallel,
}

/// Lane count and execution mode for one invocation. Constructed
/// programmatically per call; there is no file-based configuration.
///
/// When the `metrics` feature is enabled every constructor attaches a
/// fresh [`crate::metrics::MetricsCollector`] — clone `metrics` out
/// before handing `self` to an operation if you want to inspect it
/// afterward, since every `ops::*` entry point takes `cfg` by value.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub lanes: usize,
    pub mode: ExecMode,
    #[cfg(feature = "metrics")]
    pub metrics: Option<crate::metrics::MetricsCollector>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lanes: num_cpus::get().max(1),
            mode: ExecMode::Parallel,
            #[cfg(feature = "metrics")]
            metrics: Some(crate::metrics::MetricsCollector::new()),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn sequential(lanes: usize) -> Self {
        Self {
            lanes,
            mode: ExecMode::Sequential,
            #[cfg(feature = "metrics")]
            metrics: Some(crate::metrics::MetricsCollector::new()),
        }
    }

    #[must_use]
    pub fn parallel(lanes: usize) -> Self {
        Self {
            lanes,
            mode: ExecMode::Parallel,
            #[cfg(feature = "metrics")]
            metrics: Some(crate::metrics::MetricsCollector::new()),
        }
    }

    /// Replaces this invocation's metrics collector, e.g. to share one
    /// collector across a pipeline of several operations instead of
    /// getting a fresh one per call.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, collector: crate::metrics::MetricsCollector) -> Self {
        self.metrics = Some(collector);
        self
    }

    pub(crate) fn validate(&self, errors: &ErrorChannel) -> anyhow::Result<()> {
        if self.lanes == 0 {
            errors.set(GraphError::NoLanes);
            anyhow::bail!(GraphError::NoLanes);
        }
        Ok(())
    }

    /// Builds the [`PhaseTracker`] every operation drives its phases
    /// through, wired to this invocation's metrics collector (if any).
    pub(crate) fn phase_tracker(&self) -> PhaseTracker {
        #[cfg(feature = "metrics")]
        {
            PhaseTracker::new(self.metrics.clone())
        }
        #[cfg(not(feature = "metrics"))]
        {
            PhaseTracker::new()
        }
    }
}

/// Phase state machine driving every transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Discovering,
    Propping,
    Classifying,
    Mapping,
    Reducing,
    Rewiring,
    Reclaiming,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "INIT",
            Phase::Discovering => "DISCOVERING",
            Phase::Propping => "PROPPING",
            Phase::Classifying => "CLASSIFYING",
            Phase::Mapping => "MAPPING",
            Phase::Reducing => "REDUCING",
            Phase::Rewiring => "REWIRING",
            Phase::Reclaiming => "RECLAIMING",
            Phase::Done => "DONE",
            Phase::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}

/// Tracks the current phase of one invocation, transitioning to
/// `Failed` from any state on error/cancellation, and feeding
/// `metrics::MetricsCollector` phase timings when the
/// `metrics` feature is enabled.
pub struct PhaseTracker {
    current: Phase,
    #[cfg(feature = "metrics")]
    started_at: std::time::Instant,
    #[cfg(feature = "metrics")]
    collector: Option<crate::metrics::MetricsCollector>,
}

impl PhaseTracker {
    #[must_use]
    pub fn new(#[cfg(feature = "metrics")] collector: Option<crate::metrics::MetricsCollector>) -> Self {
        Self {
            current: Phase::Init,
            #[cfg(feature = "metrics")]
            started_at: std::time::Instant::now(),
            #[cfg(feature = "metrics")]
            collector,
        }
    }

    #[must_use]
    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn enter(&mut self, phase: Phase) {
        #[cfg(feature = "metrics")]
        {
            if let Some(c) = &self.collector {
                let elapsed = self.started_at.elapsed();
                c.increment_counter(&format!("phase_{}_us", self.current).to_lowercase(), elapsed.as_micros() as u64);
            }
            self.started_at = std::time::Instant::now();
        }
        self.current = phase;
    }

    pub fn fail(&mut self, errors: &ErrorChannel, killswitch: &Killswitch) {
        if killswitch.is_tripped() {
            errors.set(GraphError::Cancelled);
        }
        self.enter(Phase::Failed);
    }

    /// Adds `value` to a named counter on the attached collector.
    /// A no-op when the `metrics` feature is off or no collector was
    /// attached to this invocation's [`EngineConfig`].
    #[allow(unused_variables)]
    pub fn record(&self, name: &str, value: u64) {
        #[cfg(feature = "metrics")]
        {
            if let Some(c) = &self.collector {
                c.increment_counter(name, value);
            }
        }
    }
}

/// Runs `f` once per lane, in parallel or sequentially per `mode`. The
/// universal barrier primitive: no task from the next phase starts
/// until every lane's closure here has returned.
pub fn for_each_lane_mut<V, E, F>(graph: &mut Graph<V, E>, mode: ExecMode, f: F)
where
    V: Send,
    E: Send,
    F: Fn(&mut Lane<V, E>) + Sync,
{
    match mode {
        ExecMode::Sequential => {
            for lane in &mut graph.lanes {
                f(lane);
            }
        }
        ExecMode::Parallel => {
            graph.lanes.par_iter_mut().for_each(|lane| f(lane));
        }
    }
}

/// Read-only variant used by PROP/REDUCE passes that only need a
/// snapshot of each lane (still lane-parallel; the snapshot taken at
/// the barrier is what lets later stages iterate a stable view).
pub fn for_each_lane<V, E, F>(graph: &Graph<V, E>, mode: ExecMode, f: F)
where
    V: Send + Sync,
    E: Send + Sync,
    F: Fn(&Lane<V, E>) + Sync,
{
    match mode {
        ExecMode::Sequential => {
            for lane in &graph.lanes {
                f(lane);
            }
        }
        ExecMode::Parallel => {
            graph.lanes.par_iter().for_each(|lane| f(lane));
        }
    }
}

/// Read-only per-lane map, collecting one `T` per lane in lane order.
/// The MAP/CLASSIFY workhorse: every op that first computes something
/// lane-local (a property, a predicate, a bucket of candidate slots)
/// before a later phase redistributes it across lanes goes through
/// here so that scan honors `mode` the same way the barrier primitives
/// above do.
pub fn map_lanes<V, E, T, F>(graph: &Graph<V, E>, mode: ExecMode, f: F) -> Vec<T>
where
    V: Send + Sync,
    E: Send + Sync,
    T: Send,
    F: Fn(&Lane<V, E>) -> T + Sync,
{
    match mode {
        ExecMode::Sequential => graph.lanes.iter().map(|lane| f(lane)).collect(),
        ExecMode::Parallel => graph.lanes.par_iter().map(|lane| f(lane)).collect(),
    }
}
