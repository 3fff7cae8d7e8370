//! Merging a D=4 hypercube by `value >> 1` pairs every vertex with
//! its bit-0 neighbor, collapsing 16 vertices
//! into 8 representatives. Per DESIGN.md Open Question 6, `merged`
//! never implicitly deduplicates the edges it redirects onto a
//! representative, so each representative keeps its own 4 original
//! out-edges plus its fused partner's 4 redirected out-edges — 8 per
//! representative, 64 total (not the class-count-collapsed 32 a
//! dedup'd reading would produce).

use graphkernel::combiners::PickFirst;
use graphkernel::plan::MergePlan;
use graphkernel::testing::*;
use graphkernel::{merged, EngineConfig, Killswitch};
use std::sync::Arc;

#[test]
fn merging_bit0_pairs_halves_the_vertex_count() -> anyhow::Result<()> {
    let mut g = hypercube(4, 4)?;
    assert_vertex_count(&g, 16);

    let plan = MergePlan {
        property: Arc::new(|v: &u32| *v),
        classifier: Arc::new(|p: &u32| p >> 1),
        fuse: Arc::new(|v: &u32| *v >> 1),
        reduce: Arc::new(PickFirst),
        pruner: None,
    };
    merged(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(4))?;

    assert_vertex_count(&g, 8);
    assert_edge_count(&g, 64);
    Ok(())
}

#[test]
fn a_pruner_can_drop_redirected_edges_by_label() -> anyhow::Result<()> {
    let mut g = hypercube(4, 1)?;
    let plan = MergePlan {
        property: Arc::new(|v: &u32| *v),
        classifier: Arc::new(|p: &u32| p >> 1),
        fuse: Arc::new(|v: &u32| *v >> 1),
        reduce: Arc::new(PickFirst),
        pruner: Some(Arc::new(|_everywhere: bool, label: &u32| *label != 0)),
    };
    merged(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(1))?;

    assert_vertex_count(&g, 8);
    // each representative loses its fused partner's bit-0 edge (the
    // one pruned), so 4 own + 3 redirected = 7 per representative.
    assert_edge_count(&g, 56);
    Ok(())
}
