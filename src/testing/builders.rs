//! A fluent builder for small test graphs: accumulate `(from, label,
//! to)` triples, then `build()` into a real `Graph<u32, u32>` via the
//! ordinary `built` operation.

use crate::connector::{ConnectCtx, Connector};
use crate::error::Killswitch;
use crate::graph::{Graph, NoopDestructor, VertexOrdering};
use crate::kernel::EngineConfig;
use crate::ops::build::built;
use crate::plan::BuildPlan;
use std::collections::HashMap;
use std::sync::Arc;

struct IdentityOrdering;
impl VertexOrdering<u32> for IdentityOrdering {
    fn hash(&self, v: &u32) -> u64 {
        u64::from(*v)
    }
    fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> {
        Ok(a == b)
    }
}

struct AdjacencyConnector {
    edges: HashMap<u32, Vec<(u32, u32)>>,
}

impl Connector<u32, u32> for AdjacencyConnector {
    fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
        if let Some(out) = self.edges.get(vertex) {
            for &(label, terminus) in out {
                ctx.connect(label, terminus);
            }
        }
        Ok(())
    }
}

/// Fluent builder for a small `u32`-vertex, `u32`-edge test graph.
///
/// # Example
///
/// ```no_run
/// use graphkernel::testing::TestGraph;
///
/// let g = TestGraph::new()
///     .seed(0)
///     .edge(0, 10, 1)
///     .edge(0, 20, 2)
///     .build(1)
///     .unwrap();
///
/// assert_eq!(g.vertex_count(), 3);
/// assert_eq!(g.edge_count(), 2);
/// ```
#[derive(Default)]
pub struct TestGraph {
    seeds: Vec<u32>,
    edges: HashMap<u32, Vec<(u32, u32)>>,
}

impl TestGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            seeds: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Add a seed vertex to discover from.
    #[must_use]
    pub fn seed(mut self, vertex: u32) -> Self {
        self.seeds.push(vertex);
        self
    }

    /// Declare an edge `from -label-> to`, adding `from` as a
    /// discoverable vertex if it isn't a seed already.
    #[must_use]
    pub fn edge(mut self, from: u32, label: u32, to: u32) -> Self {
        self.edges.entry(from).or_default().push((label, to));
        self
    }

    /// Build the graph by discovering from every declared seed across
    /// `lanes` lanes, sequentially (determinism over throughput — this
    /// is test scaffolding, not a benchmark).
    pub fn build(self, lanes: usize) -> anyhow::Result<Graph<u32, u32>> {
        let plan = BuildPlan {
            seeds: self.seeds,
            connector: Arc::new(AdjacencyConnector { edges: self.edges }),
            subconnector: None,
            vertex_ord: Arc::new(IdentityOrdering),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        built(plan, &Killswitch::new(), EngineConfig::sequential(lanes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_small_fan_graph() {
        let g = TestGraph::new()
            .seed(0)
            .edge(0, 10, 1)
            .edge(0, 20, 2)
            .edge(1, 30, 2)
            .build(2)
            .unwrap();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn a_seed_with_no_edges_builds_a_single_vertex() {
        let g = TestGraph::new().seed(42).build(1).unwrap();
        assert_eq!(g.vertex_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }
}
