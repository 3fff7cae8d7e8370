//! Round-trip law: a predicate that always keeps every vertex is a
//! no-op; a real predicate drops vertices and any edge touching them.

use graphkernel::plan::FilterPlan;
use graphkernel::testing::*;
use graphkernel::{filtered, EngineConfig, Killswitch};
use std::sync::Arc;

#[test]
fn always_true_predicate_is_a_no_op() -> anyhow::Result<()> {
    let mut g = hypercube(3, 2)?;
    let before_vertices = g.vertex_count();
    let before_edges = g.edge_count();
    let plan = FilterPlan { predicate: Arc::new(|_v: &u32| true) };
    filtered(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(2))?;
    assert_vertex_count(&g, before_vertices);
    assert_edge_count(&g, before_edges);
    Ok(())
}

#[test]
fn dropping_the_sink_also_drops_its_incident_edges() -> anyhow::Result<()> {
    let mut g = chain(4, 2)?;
    assert_vertex_count(&g, 4);
    assert_edge_count(&g, 3);

    let plan = FilterPlan { predicate: Arc::new(|v: &u32| *v != 3) };
    filtered(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(2))?;
    assert_vertex_count(&g, 3);
    assert_edge_count(&g, 2);
    Ok(())
}
