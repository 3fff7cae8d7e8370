//! Mutating a D=4 hypercube's vertex values by XOR 15 is a bijection
//! on the vertex set (round-trip law: counts are
//! preserved), and a map-reduce counting vertices afterwards still
//! sees all 16.

use graphkernel::combiners::Count;
use graphkernel::plan::{MapReducePlan, MutatePlan, Zone};
use graphkernel::testing::*;
use graphkernel::{mapreduced, mutated, EngineConfig, Killswitch};
use std::sync::Arc;

#[test]
fn xor_mutation_preserves_vertex_and_edge_counts() -> anyhow::Result<()> {
    let mut g = hypercube(4, 4)?;
    let plan = MutatePlan {
        v_op: Arc::new(|v: &u32| v ^ 15),
        e_op: Arc::new(|e: &u32| *e),
        zone: Zone::default(),
    };
    mutated(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(4))?;
    assert_vertex_count(&g, 16);
    assert_edge_count(&g, 64);

    let count_plan = MapReducePlan {
        map: Arc::new(|_v: &u32| 1u64),
        reduce: Arc::new(Count),
    };
    let total = mapreduced(&g, count_plan, &Killswitch::new(), EngineConfig::sequential(4))?;
    assert_eq!(total, 16);
    Ok(())
}

#[test]
fn identity_mutation_is_isomorphic_to_the_source() -> anyhow::Result<()> {
    let mut g = hypercube(3, 2)?;
    let before_vertices = g.vertex_count();
    let before_edges = g.edge_count();
    let plan = MutatePlan {
        v_op: Arc::new(|v: &u32| *v),
        e_op: Arc::new(|e: &u32| *e),
        zone: Zone::default(),
    };
    mutated(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(2))?;
    assert_vertex_count(&g, before_vertices);
    assert_edge_count(&g, before_edges);
    Ok(())
}
