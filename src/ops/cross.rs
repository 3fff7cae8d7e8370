//! `crossed` — pairwise cross product of two graphs.
//!
//! The product's vertex set is the full cross `left × right`; an edge
//! `(lu, ru) -> (lv, rv)` is added whenever `left` has an edge `lu ->
//! lv` and `right` has an edge `ru -> rv` whose labels satisfy
//! `edge_equal`, labeled by `product_label`. Unlike the other
//! operations this one needs no existing product graph — it is built
//! directly from the two inputs rather than driven through
//! `reachability::discover`, since both factors are already fully
//! materialized in memory.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph, VertexOrdering};
use crate::ids::{LaneId, VertexId};
use crate::kernel::{EngineConfig, Phase};
use crate::lane::lane_of;
use crate::plan::CrossPlan;
use std::collections::HashMap;
use std::sync::Arc;

struct PairOrdering<V> {
    a: Arc<dyn VertexOrdering<V>>,
    b: Arc<dyn VertexOrdering<V>>,
}

impl<V> VertexOrdering<(V, V)> for PairOrdering<V> {
    fn hash(&self, v: &(V, V)) -> u64 {
        self.a.hash(&v.0).wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(self.b.hash(&v.1))
    }

    fn equal(&self, x: &(V, V), y: &(V, V)) -> anyhow::Result<bool> {
        Ok(self.a.equal(&x.0, &y.0)? && self.b.equal(&x.1, &y.1)?)
    }
}

struct PairDestructor<V> {
    a: Arc<dyn Destructor<V>>,
    b: Arc<dyn Destructor<V>>,
}

impl<V> Destructor<(V, V)> for PairDestructor<V> {
    fn destroy(&self, value: (V, V)) {
        self.a.destroy(value.0);
        self.b.destroy(value.1);
    }
}

pub fn crossed<V, E>(
    left: &Graph<V, E>,
    right: &Graph<V, E>,
    plan: CrossPlan<E>,
    killswitch: &Killswitch,
    cfg: EngineConfig,
) -> anyhow::Result<Graph<(V, V), E>>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;
    if killswitch.is_tripped() {
        errors.set(GraphError::Cancelled);
        tracker.fail(&errors, killswitch);
        anyhow::bail!(GraphError::Cancelled);
    }

    let pair_ord: Arc<dyn VertexOrdering<(V, V)>> = Arc::new(PairOrdering {
        a: left.vertex_ord.clone(),
        b: right.vertex_ord.clone(),
    });
    let pair_destructor: Arc<dyn Destructor<(V, V)>> = Arc::new(PairDestructor {
        a: left.vertex_destructor.clone(),
        b: right.vertex_destructor.clone(),
    });

    let lanes = cfg.lanes;
    let mut out = Graph::empty(lanes, pair_ord.clone(), None, pair_destructor, left.edge_destructor.clone());

    // Every `(lv, rv)` pair's target lane depends on its hash, not on
    // `l_lane_idx`/`r_lane_idx`, so two pairs from different source
    // lanes can land in the same output lane — this stays
    // lane-sequential rather than parallel over either input's lanes.
    tracker.enter(Phase::Discovering);
    let mut pair_id_of: HashMap<(VertexId, VertexId), VertexId> = HashMap::new();
    for (l_lane_idx, l_lane) in left.lanes.iter().enumerate() {
        for (l_slot, l_rec) in l_lane.vertices.iter().enumerate() {
            let Some(lv) = l_rec.value.as_ref() else { continue };
            for (r_lane_idx, r_lane) in right.lanes.iter().enumerate() {
                for (r_slot, r_rec) in r_lane.vertices.iter().enumerate() {
                    let Some(rv) = r_rec.value.as_ref() else { continue };
                    let pair_value = (lv.clone(), rv.clone());
                    let h = pair_ord.hash(&pair_value);
                    let target = lane_of(h, lanes);
                    let mut eq = |a: &(V, V), b: &(V, V)| pair_ord.equal(a, b);
                    let (slot, dup) = out.lanes[target.index()].insert_if_absent(pair_value, h, &mut eq)?;
                    if let Some(d) = dup {
                        out.vertex_destructor.destroy(d);
                    }
                    pair_id_of.insert(
                        (VertexId::new(LaneId(l_lane_idx), l_slot), VertexId::new(LaneId(r_lane_idx), r_slot)),
                        VertexId::new(target, slot),
                    );
                }
            }
        }
    }

    tracker.record("vertices_visited", out.vertex_count());
    tracker.enter(Phase::Rewiring);
    for (l_lane_idx, l_lane) in left.lanes.iter().enumerate() {
        for (l_slot, l_rec) in l_lane.vertices.iter().enumerate() {
            if !l_rec.is_live() {
                continue;
            }
            for &l_edge_slot in &l_rec.outgoing {
                let l_edge = &l_lane.edges[l_edge_slot];
                let Some(label1) = l_edge.label.as_ref() else { continue };
                let lv_id = l_edge.terminus;

                for (r_lane_idx, r_lane) in right.lanes.iter().enumerate() {
                    for (r_slot, r_rec) in r_lane.vertices.iter().enumerate() {
                        if !r_rec.is_live() {
                            continue;
                        }
                        for &r_edge_slot in &r_rec.outgoing {
                            let r_edge = &r_lane.edges[r_edge_slot];
                            let Some(label2) = r_edge.label.as_ref() else { continue };
                            if !(plan.edge_equal)(label1, label2) {
                                continue;
                            }
                            let rv_id = r_edge.terminus;
                            let source_pid = *pair_id_of
                                .get(&(VertexId::new(LaneId(l_lane_idx), l_slot), VertexId::new(LaneId(r_lane_idx), r_slot)))
                                .expect("every left×right pair was pre-inserted");
                            let target_pid = *pair_id_of.get(&(lv_id, rv_id)).expect("every left×right pair was pre-inserted");
                            let new_label = (plan.product_label)(label1, label2);
                            let edge_slot = out.lanes[source_pid.lane.index()].alloc_placeholder_edge(source_pid, new_label, target_pid);
                            out.lanes[source_pid.lane.index()].vertices[source_pid.slot].outgoing.push(edge_slot);
                            out.lanes[target_pid.lane.index()].vertices[target_pid.slot]
                                .incident
                                .push((source_pid.lane, edge_slot));
                        }
                    }
                }
            }
        }
    }

    if let (Some(li), Some(ri)) = (left.initial_vertex(), right.initial_vertex()) {
        out.initial_vertex = pair_id_of.get(&(li, ri)).copied();
    }

    tracker.enter(Phase::Done);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectCtx, Connector};
    use crate::graph::NoopDestructor;
    use crate::ops::build::built;
    use crate::plan::BuildPlan;

    struct IdOrd;
    impl VertexOrdering<u32> for IdOrd {
        fn hash(&self, v: &u32) -> u64 {
            *v as u64
        }
        fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> {
            Ok(a == b)
        }
    }

    struct Pair01;
    impl Connector<u32, u32> for Pair01 {
        fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
            if *vertex == 0 {
                ctx.connect(1, 1);
            }
            Ok(())
        }
    }

    fn tiny() -> Graph<u32, u32> {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Pair01),
            subconnector: None,
            vertex_ord: Arc::new(IdOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        built(plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap()
    }

    #[test]
    fn product_vertex_count_is_the_full_cross() {
        let left = tiny();
        let right = tiny();
        let plan = CrossPlan::<u32> {
            edge_equal: Arc::new(|a: &u32, b: &u32| a == b),
            product_label: Arc::new(|a: &u32, _b: &u32| *a),
        };
        let product = crossed(&left, &right, plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        assert_eq!(product.vertex_count(), 4);
        assert_eq!(product.edge_count(), 1);
    }
}
