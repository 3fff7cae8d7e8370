//! Round-trip law: fabricating with identity copy callbacks produces
//! a graph isomorphic to the source.

use graphkernel::plan::FabricatePlan;
use graphkernel::testing::*;
use graphkernel::{fabricated, Killswitch};
use std::sync::Arc;

#[test]
fn identity_fabricate_is_isomorphic_to_the_source() -> anyhow::Result<()> {
    let source = hypercube(3, 2)?;
    let plan = FabricatePlan {
        vertex_copy: Arc::new(|v: &u32| *v),
        edge_copy: Arc::new(|e: &u32| *e),
    };
    let copy = fabricated(&source, plan, &Killswitch::new(), graphkernel::EngineConfig::sequential(2))?;
    assert_isomorphic(&copy, &source);
    assert_vertex_count(&copy, source.vertex_count());
    assert_edge_count(&copy, source.edge_count());
    Ok(())
}
