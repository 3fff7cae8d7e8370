//! `induced` folds from every sink back to the initial vertex, the
//! shape used to count monotone paths through an
//! acyclic graph. Exercised here on the dimension-3 Boolean lattice (0
//! at the bottom, 7 at the top, one edge per single-bit increment) —
//! the textbook count of monotone paths from bottom to top is `3! = 6`
//! (one per ordering of the three bit flips).

use graphkernel::combine::BinaryOp;
use graphkernel::plan::{InducePlan, Zone};
use graphkernel::testing::{assert_vertex_count, TestGraph};
use graphkernel::{induced, EngineConfig, Killswitch};
use std::sync::Arc;

fn boolean_lattice_3() -> anyhow::Result<graphkernel::Graph<u32, u32>> {
    TestGraph::new()
        .seed(0)
        .edge(0, 1, 1)
        .edge(0, 2, 2)
        .edge(0, 4, 4)
        .edge(1, 1, 3)
        .edge(1, 4, 5)
        .edge(2, 1, 3)
        .edge(2, 4, 6)
        .edge(4, 1, 5)
        .edge(4, 2, 6)
        .edge(3, 1, 7)
        .edge(5, 1, 7)
        .edge(6, 1, 7)
        .build(4)
}

#[test]
fn counts_monotone_paths_through_the_boolean_lattice() -> anyhow::Result<()> {
    let g = boolean_lattice_3()?;
    assert_vertex_count(&g, 8);
    assert_eq!(g.edge_count(), 12);

    let plan = InducePlan::<u32, u32, u64> {
        map: Arc::new(|_v: &u32, _label: &u32, remote: &u64| *remote),
        reduce: Arc::new(BinaryOp { f: |a: &u64, b: &u64| a + b }),
        vacuous_case: Arc::new(|| 1u64),
        zone: Zone::default(),
        co_fix: true,
    };
    let paths = induced(&g, plan, &Killswitch::new(), EngineConfig::sequential(4))?;
    assert_eq!(paths, 6);
    Ok(())
}
