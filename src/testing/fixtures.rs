//! Pre-built graphs for the §8 end-to-end scenarios: canonical
//! hypercube and chain topologies with known vertex/edge counts.

use crate::connector::{ConnectCtx, Connector};
use crate::error::Killswitch;
use crate::graph::{Graph, NoopDestructor, VertexOrdering};
use crate::kernel::EngineConfig;
use crate::ops::build::built;
use crate::plan::BuildPlan;
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

struct HypercubeConnector {
    dimension: u32,
}

impl Connector<u32, u32> for HypercubeConnector {
    fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
        for bit in 0..self.dimension {
            ctx.connect(bit, vertex ^ (1 << bit));
        }
        Ok(())
    }
}

/// A `dimension`-dimensional hypercube: `2^dimension` vertices numbered
/// `0..2^dimension`, each connected to the `dimension` neighbors that
/// differ from it by exactly one bit, labeled by the bit that flipped.
/// The canonical fixture behind the build/compose/mutate/merge
/// end-to-end tests.
///
/// # Example
///
/// ```no_run
/// use graphkernel::testing::hypercube;
///
/// let g = hypercube(4, 2).unwrap();
/// assert_eq!(g.vertex_count(), 16);
/// ```
pub fn hypercube(dimension: u32, lanes: usize) -> anyhow::Result<Graph<u32, u32>> {
    let plan = BuildPlan {
        seeds: vec![0u32],
        connector: Arc::new(HypercubeConnector { dimension }),
        subconnector: None,
        vertex_ord: Arc::new(IdentityOrdering),
        edge_ord: None,
        vertex_destructor: Arc::new(NoopDestructor),
        edge_destructor: Arc::new(NoopDestructor),
    };
    built(plan, &Killswitch::new(), EngineConfig::sequential(lanes))
}

struct ChainConnector {
    length: u32,
}

impl Connector<u32, u32> for ChainConnector {
    fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
        if *vertex + 1 < self.length {
            ctx.connect(1, vertex + 1);
        }
        Ok(())
    }
}

/// A simple directed path `0 -> 1 -> ... -> length - 1`, each edge
/// labeled `1`. Useful for induce/map-reduce scenarios where the
/// hypercube's branching factor would obscure the fold being tested.
pub fn chain(length: u32, lanes: usize) -> anyhow::Result<Graph<u32, u32>> {
    let plan = BuildPlan {
        seeds: vec![0u32],
        connector: Arc::new(ChainConnector { length }),
        subconnector: None,
        vertex_ord: Arc::new(IdentityOrdering),
        edge_ord: None,
        vertex_destructor: Arc::new(NoopDestructor),
        edge_destructor: Arc::new(NoopDestructor),
    };
    built(plan, &Killswitch::new(), EngineConfig::sequential(lanes))
}
