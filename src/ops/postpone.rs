//! `postponed` — edge reordering at a vertex.
//!
//! For each vertex `u`, for every pair of its outgoing edges
//! `(e1, e2)` where `e1` is postponable and `pair_predicate(L1, L2)`
//! holds, a new edge `v1 -combine(L1,L2)-> v2` is created at `e1`'s
//! terminus (`v1 = e1.terminus`, `v2 = e2.terminus`) — effectively
//! moving `e1`'s effect past `e2`. Every postponable edge is then
//! dropped from `u`, matched or not.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::{LaneId, VertexId};
use crate::kernel::{map_lanes, EngineConfig, Phase};
use crate::lane::Lane;
use crate::plan::PostponePlan;

pub fn postponed<V, E>(graph: &mut Graph<V, E>, plan: PostponePlan<E>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
where
    V: Send + Sync,
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

    let n_lanes = graph.lanes.len();

    // The per-vertex pair scan only ever reads its own lane's edges
    // (it just reads off `e1.terminus`, a foreign `VertexId`, without
    // touching that lane) so it honors `mode`; the new edge it
    // produces is bucketed by *target* lane only once every lane's
    // scan has finished, back on one thread.
    tracker.enter(Phase::Propping);
    let scanned: Vec<(Vec<(VertexId, E, VertexId)>, Vec<usize>)> = map_lanes(graph, cfg.mode, |lane: &Lane<V, E>| scan_lane(lane, &plan));
    tracker.record("vertices_visited", graph.vertex_count());

    tracker.enter(Phase::Classifying);
    let mut new_edges: Vec<Vec<(VertexId, E, VertexId)>> = (0..n_lanes).map(|_| Vec::new()).collect();
    let mut to_drop: Vec<Vec<usize>> = (0..n_lanes).map(|_| Vec::new()).collect();
    for (lane_idx, (produced, dropped)) in scanned.into_iter().enumerate() {
        to_drop[lane_idx] = dropped;
        for (v1, label, terminus) in produced {
            new_edges[v1.lane.index()].push((v1, label, terminus));
        }
    }

    tracker.enter(Phase::Rewiring);
    for lane_idx in 0..n_lanes {
        for (source, label, terminus) in new_edges[lane_idx].drain(..) {
            let edge_slot = graph.lanes[lane_idx].alloc_placeholder_edge(source, label, terminus);
            graph.lanes[lane_idx].vertices[source.slot].outgoing.push(edge_slot);
            graph.lanes[terminus.lane.index()].vertices[terminus.slot]
                .incident
                .push((LaneId(lane_idx), edge_slot));
        }
        for e_slot in to_drop[lane_idx].drain(..) {
            if let Some(label) = graph.lanes[lane_idx].edges[e_slot].take() {
                graph.edge_destructor.destroy(label);
            }
        }
    }

    tracker.enter(Phase::Done);
    Ok(())
}

/// One lane's share of the pair scan: every postponable edge out of a
/// live vertex, matched against every other outgoing edge at that same
/// vertex. Reads only this lane's own vertices and edges.
fn scan_lane<V, E>(lane: &Lane<V, E>, plan: &PostponePlan<E>) -> (Vec<(VertexId, E, VertexId)>, Vec<usize>) {
    let mut produced = Vec::new();
    let mut dropped = Vec::new();
    for u_rec in &lane.vertices {
        if !u_rec.is_live() {
            continue;
        }
        let outgoing = &u_rec.outgoing;
        for &e1_slot in outgoing {
            let e1 = &lane.edges[e1_slot];
            let Some(label1) = e1.label.as_ref() else { continue };
            if !(plan.postponable)(label1) {
                continue;
            }
            let v1 = e1.terminus;
            for &e2_slot in outgoing {
                if e2_slot == e1_slot {
                    continue;
                }
                let e2 = &lane.edges[e2_slot];
                let Some(label2) = e2.label.as_ref() else { continue };
                if (plan.pair_predicate)(label1, label2) {
                    let new_label = (plan.combine)(label1, label2);
                    produced.push((v1, new_label, e2.terminus));
                }
            }
            dropped.push(e1_slot);
        }
    }
    (produced, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectCtx, Connector};
    use crate::graph::{NoopDestructor, VertexOrdering};
    use crate::ops::build::built;
    use crate::plan::BuildPlan;
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

    /// 0 fans out to 1 (label 10, postponable) and 2 (label 20).
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

    #[test]
    fn postponable_edge_relocates_to_its_sibling_terminus() {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Fan),
            subconnector: None,
            vertex_ord: Arc::new(IdOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        let mut g = built(plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        assert_eq!(g.edge_count(), 2);

        let postpone_plan = PostponePlan::<u32> {
            postponable: Arc::new(|l: &u32| *l == 10),
            pair_predicate: Arc::new(|_l1: &u32, _l2: &u32| true),
            combine: Arc::new(|l1: &u32, l2: &u32| l1 + l2),
        };
        postponed(&mut g, postpone_plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        // the 0->1 edge is dropped, 0->2 survives, and a new 1->2 edge appears.
        assert_eq!(g.edge_count(), 2);
    }
}
