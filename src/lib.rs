//! A parallel, in-memory directed-labeled-graph discovery and
//! transformation engine.
//!
//! A client supplies vertex/edge typing (hash, equality, destructors)
//! and a connector rule; the engine discovers the reachable graph
//! lane-parallel and supports thirteen whole-graph transformations —
//! [`build`](ops::built), [`fabricate`](ops::fabricated),
//! [`mutate`](ops::mutated), [`filter`](ops::filtered),
//! [`compose`](ops::composed), [`merge`](ops::merged),
//! [`deduplicate`](ops::deduplicated), [`stretch`](ops::stretched),
//! [`map-reduce`](ops::mapreduced), [`induce`](ops::induced),
//! [`postpone`](ops::postponed), [`cross`](ops::crossed), and
//! [`split`](ops::split) — driven through a shared kernel of phases
//! (discover → prop → classify → map → reduce → rewire → reclaim).
//!
//! Every vertex lives in one of `lanes` partitions, assigned by the
//! client's hash; every transformation runs one lane-barriered phase
//! at a time, in parallel across lanes via `rayon` or sequentially for
//! deterministic testing, selected by [`EngineConfig`].
//!
//! # Example
//!
//! ```no_run
//! use graphkernel::connector::{ConnectCtx, Connector};
//! use graphkernel::error::Killswitch;
//! use graphkernel::graph::{NoopDestructor, VertexOrdering};
//! use graphkernel::kernel::EngineConfig;
//! use graphkernel::plan::BuildPlan;
//! use graphkernel::ops::built;
//! use std::sync::Arc;
//!
//! struct IdOrd;
//! impl VertexOrdering<u32> for IdOrd {
//!     fn hash(&self, v: &u32) -> u64 { *v as u64 }
//!     fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> { Ok(a == b) }
//! }
//!
//! struct Succ;
//! impl Connector<u32, u32> for Succ {
//!     fn connect(&self, v: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
//!         if *v < 3 { ctx.connect(1, v + 1); }
//!         Ok(())
//!     }
//! }
//!
//! let plan = BuildPlan {
//!     seeds: vec![0u32],
//!     connector: Arc::new(Succ),
//!     subconnector: None,
//!     vertex_ord: Arc::new(IdOrd),
//!     edge_ord: None,
//!     vertex_destructor: Arc::new(NoopDestructor),
//!     edge_destructor: Arc::new(NoopDestructor),
//! };
//! let g = built(plan, &Killswitch::new(), EngineConfig::sequential(2)).unwrap();
//! assert_eq!(g.vertex_count(), 4);
//! ```

pub mod combine;
pub mod combiners;
pub mod connector;
pub mod error;
pub mod graph;
pub mod ids;
pub mod kernel;
pub mod lane;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod ops;
pub mod plan;
pub mod reachability;
pub mod record;

pub mod testing;

pub use error::{GraphError, Killswitch};
pub use graph::{Destructor, EdgeOrdering, Graph, NoopDestructor, VertexOrdering};
pub use kernel::{EngineConfig, ExecMode};
pub use ops::{built, composed, crossed, deduplicated, fabricated, filtered, induced, mapreduced, merged, mutated, postponed, stretched};
pub use ops::split::split;
