//! Discovering a D=4 hypercube from a single seed yields 16 vertices
//! and 64 directed edges.

use graphkernel::testing::*;

#[test]
fn hypercube_d4_matches_the_textbook_counts() -> anyhow::Result<()> {
    let g = hypercube(4, 4)?;
    assert_vertex_count(&g, 16);
    assert_edge_count(&g, 64);
    assert!(g.initial_vertex().is_some());
    Ok(())
}

#[test]
fn lane_count_does_not_change_discovered_shape() -> anyhow::Result<()> {
    let single_lane = hypercube(4, 1)?;
    let many_lanes = hypercube(4, 8)?;
    assert_isomorphic(&single_lane, &many_lanes);
    Ok(())
}

#[test]
fn chain_of_five_has_four_edges() -> anyhow::Result<()> {
    let g = chain(5, 3)?;
    assert_vertex_count(&g, 5);
    assert_edge_count(&g, 4);
    Ok(())
}
