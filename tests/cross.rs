//! `crossed` builds the full cross product of two graphs' vertex sets,
//! connecting `(lu, ru) -> (lv, rv)` wherever both factors have an
//! edge with an equal label.

use graphkernel::plan::CrossPlan;
use graphkernel::testing::*;
use graphkernel::{crossed, EngineConfig, Killswitch};
use std::sync::Arc;

#[test]
fn product_of_two_chains_has_the_full_vertex_cross_product() -> anyhow::Result<()> {
    let left = chain(3, 1)?;
    let right = chain(3, 1)?;
    assert_vertex_count(&left, 3);
    assert_edge_count(&left, 2);

    let plan = CrossPlan {
        edge_equal: Arc::new(|a: &u32, b: &u32| a == b),
        product_label: Arc::new(|a: &u32, _b: &u32| *a),
    };
    let product = crossed(&left, &right, plan, &Killswitch::new(), EngineConfig::sequential(2))?;
    assert_vertex_count(&product, 9);
    // every one of the 2 left edges pairs with every one of the 2
    // right edges, since both chains label every edge `1`.
    assert_edge_count(&product, 4);
    Ok(())
}
