//! Universal invariants: properties every operation must uphold
//! regardless of which plan drives it.

use graphkernel::connector::{ConnectCtx, Connector};
use graphkernel::graph::{Destructor, VertexOrdering};
use graphkernel::plan::BuildPlan;
use graphkernel::testing::*;
use graphkernel::{built, EngineConfig, GraphError, Killswitch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct IdOrd;
impl VertexOrdering<u32> for IdOrd {
    fn hash(&self, v: &u32) -> u64 {
        *v as u64
    }
    fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> {
        Ok(a == b)
    }
}

/// 0 -> 1, 0 -> 2.
struct Fan;
impl Connector<u32, u32> for Fan {
    fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
        if *vertex == 0 {
            ctx.connect(10, 1);
            ctx.connect(20, 2);
        }
        Ok(())
    }
}

struct CountingDestructor(Arc<AtomicUsize>);
impl<T> Destructor<T> for CountingDestructor {
    fn destroy(&self, _value: T) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn hypercube_d4_has_16_vertices_and_64_edges_with_labels_0_through_3() -> anyhow::Result<()> {
    let g = hypercube(4, 4)?;
    assert_vertex_count(&g, 16);
    assert_edge_count(&g, 64);
    Ok(())
}

#[test]
fn free_now_calls_every_destructor_exactly_once() -> anyhow::Result<()> {
    let vertex_destroys = Arc::new(AtomicUsize::new(0));
    let edge_destroys = Arc::new(AtomicUsize::new(0));

    let plan = BuildPlan {
        seeds: vec![0u32],
        connector: Arc::new(Fan),
        subconnector: None,
        vertex_ord: Arc::new(IdOrd),
        edge_ord: None,
        vertex_destructor: Arc::new(CountingDestructor(vertex_destroys.clone())),
        edge_destructor: Arc::new(CountingDestructor(edge_destroys.clone())),
    };
    let mut g = built(plan, &Killswitch::new(), EngineConfig::sequential(1))?;
    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.edge_count(), 2);

    g.free_now();
    assert_eq!(vertex_destroys.load(Ordering::SeqCst), 3);
    assert_eq!(edge_destroys.load(Ordering::SeqCst), 2);

    // a graph with every value already reclaimed must not double-free
    // on drop.
    drop(g);
    assert_eq!(vertex_destroys.load(Ordering::SeqCst), 3);
    assert_eq!(edge_destroys.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn zero_lanes_reports_no_lanes() {
    let plan = BuildPlan {
        seeds: vec![0u32],
        connector: Arc::new(Fan),
        subconnector: None,
        vertex_ord: Arc::new(IdOrd),
        edge_ord: None,
        vertex_destructor: Arc::new(graphkernel::NoopDestructor),
        edge_destructor: Arc::new(graphkernel::NoopDestructor),
    };
    let err = built(plan, &Killswitch::new(), EngineConfig::sequential(0)).unwrap_err();
    assert_eq!(err.downcast_ref::<GraphError>(), Some(&GraphError::NoLanes));
}

#[test]
fn a_tripped_killswitch_cancels_before_any_work_happens() -> anyhow::Result<()> {
    let mut g = hypercube(3, 2)?;
    let before_vertices = g.vertex_count();

    let killswitch = Killswitch::new();
    killswitch.trip();
    let plan = graphkernel::plan::FilterPlan { predicate: Arc::new(|_v: &u32| true) };
    let err = graphkernel::filtered(&mut g, plan, &killswitch, EngineConfig::sequential(2)).unwrap_err();
    assert_eq!(err.downcast_ref::<GraphError>(), Some(&GraphError::Cancelled));
    // cancellation is checked before any lane does work, so the graph
    // is untouched.
    assert_vertex_count(&g, before_vertices);
    Ok(())
}
