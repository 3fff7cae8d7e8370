//! Reduction associativity: a sum over all sixteen hypercube vertex
//! values is independent of lane count.

use graphkernel::combiners::{Count, Sum};
use graphkernel::plan::MapReducePlan;
use graphkernel::testing::*;
use graphkernel::{mapreduced, EngineConfig, Killswitch};
use std::sync::Arc;

#[test]
fn vertex_value_sum_is_independent_of_lane_count() -> anyhow::Result<()> {
    let expected: u32 = (0..16u32).sum();
    for lanes in [1usize, 2, 5, 8] {
        let g = hypercube(4, lanes)?;
        let plan = MapReducePlan { map: Arc::new(|v: &u32| *v), reduce: Arc::new(Sum) };
        let total = mapreduced(&g, plan, &Killswitch::new(), EngineConfig::sequential(lanes))?;
        assert_eq!(total, expected, "mismatch with {lanes} lanes");
    }
    Ok(())
}

#[test]
fn counting_vertices_matches_vertex_count() -> anyhow::Result<()> {
    let g = hypercube(3, 3)?;
    let plan = MapReducePlan { map: Arc::new(|_v: &u32| ()), reduce: Arc::new(Count) };
    let total = mapreduced(&g, plan, &Killswitch::new(), EngineConfig::sequential(3))?;
    assert_eq!(total, g.vertex_count());
    Ok(())
}
