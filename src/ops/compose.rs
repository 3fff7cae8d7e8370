//! `composed` — edge rerouting to adjacent vertices.
//!
//! For each pair of outgoing edges `u -L1-> v -L2-> w` where
//! `qpred(prop(u), L1, prop(v), L2)` holds, a new edge `u -qop(...)->
//! w` is added. `destructive` additionally drops every `u -L1-> v`
//! edge that participated in at least one such rewrite. `co_fix`
//! repeats the pass to a fixed point instead of running it once.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::LaneId;
use crate::kernel::{map_lanes, EngineConfig, ExecMode, Phase};
use crate::plan::ComposePlan;
use std::collections::HashSet;

/// Safety valve on `co_fix`: a qpred/qop pair that never settles would
/// otherwise spin forever. No graph in the test suite needs more
/// passes than its vertex count to converge.
const MAX_FIXPOINT_PASSES: usize = 4096;

pub fn composed<V, E, P>(graph: &mut Graph<V, E>, plan: ComposePlan<V, E, P>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
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

    let mut passes = 0usize;
    loop {
        tracker.enter(Phase::Propping);
        let changed = compose_pass(graph, &plan, cfg.mode, &tracker)?;
        passes += 1;
        if !changed || !plan.co_fix || passes >= MAX_FIXPOINT_PASSES {
            break;
        }
        if killswitch.is_tripped() {
            errors.set(GraphError::Cancelled);
            tracker.fail(&errors, killswitch);
            anyhow::bail!(GraphError::Cancelled);
        }
    }
    tracker.enter(Phase::Done);
    Ok(())
}

fn compose_pass<V, E, P>(graph: &mut Graph<V, E>, plan: &ComposePlan<V, E, P>, mode: ExecMode, tracker: &crate::kernel::PhaseTracker) -> anyhow::Result<bool>
where
    V: Send + Sync,
    E: Send + Sync,
{
    let n_lanes = graph.lanes.len();

    // PROP: every vertex's property is read-only and lane-local, so
    // this scan honors `mode` directly; only the CLASSIFY/REWIRE pass
    // below needs to stay lane-sequential, since it writes new edges
    // and incident-list entries into whatever lane a match's terminus
    // happens to live in.
    let properties: Vec<Vec<Option<P>>> =
        map_lanes(graph, mode, |lane| lane.vertices.iter().map(|rec| rec.value.as_ref().map(|v| (plan.property)(v))).collect());
    tracker.record("vertices_visited", graph.vertex_count());

    let mut new_edges: Vec<Vec<(usize, E, crate::ids::VertexId)>> = (0..n_lanes).map(|_| Vec::new()).collect();
    let mut consumed: Vec<HashSet<usize>> = (0..n_lanes).map(|_| HashSet::new()).collect();
    let mut changed = false;

    for (lane_idx, lane) in graph.lanes.iter().enumerate() {
        for (u_slot, u_rec) in lane.vertices.iter().enumerate() {
            if !u_rec.is_live() {
                continue;
            }
            let Some(prop_u) = properties[lane_idx][u_slot].as_ref() else {
                continue;
            };
            for &e1_slot in &u_rec.outgoing {
                let e1 = &lane.edges[e1_slot];
                let Some(label1) = e1.label.as_ref() else { continue };
                let v_id = e1.terminus;
                let v_lane = &graph.lanes[v_id.lane.index()];
                let v_rec = &v_lane.vertices[v_id.slot];
                if !v_rec.is_live() {
                    continue;
                }
                let Some(prop_v) = properties[v_id.lane.index()][v_id.slot].as_ref() else {
                    continue;
                };
                for &e2_slot in &v_rec.outgoing {
                    let e2 = &v_lane.edges[e2_slot];
                    let Some(label2) = e2.label.as_ref() else { continue };
                    if (plan.qpred)(prop_u, label1, prop_v, label2) {
                        let new_label = (plan.qop)(prop_u, label1, prop_v, label2);
                        new_edges[lane_idx].push((u_slot, new_label, e2.terminus));
                        consumed[lane_idx].insert(e1_slot);
                        changed = true;
                    }
                }
            }
        }
    }

    for lane_idx in 0..n_lanes {
        for (u_slot, label, terminus) in new_edges[lane_idx].drain(..) {
            let source_id = crate::ids::VertexId::new(LaneId(lane_idx), u_slot);
            let edge_slot = graph.lanes[lane_idx].alloc_placeholder_edge(source_id, label, terminus);
            graph.lanes[lane_idx].vertices[u_slot].outgoing.push(edge_slot);
            graph.lanes[terminus.lane.index()].vertices[terminus.slot]
                .incident
                .push((LaneId(lane_idx), edge_slot));
        }
        if plan.destructive {
            for e_slot in consumed[lane_idx].drain() {
                if let Some(label) = graph.lanes[lane_idx].edges[e_slot].take() {
                    graph.edge_destructor.destroy(label);
                }
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectCtx, Connector};
    use crate::error::Killswitch;
    use crate::graph::{NoopDestructor, VertexOrdering};
    use crate::kernel::EngineConfig;
    use crate::ops::build::built;
    use crate::plan::{BuildPlan, Zone};
    use std::sync::Arc;

    struct ChainOrd;
    impl VertexOrdering<u32> for ChainOrd {
        fn hash(&self, v: &u32) -> u64 {
            *v as u64
        }
        fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> {
            Ok(a == b)
        }
    }

    struct Chain;
    impl Connector<u32, u32> for Chain {
        fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
            if *vertex < 2 {
                ctx.connect(*vertex, vertex + 1);
            }
            Ok(())
        }
    }

    #[test]
    fn bypasses_one_hop_and_drops_original_when_destructive() {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Chain),
            subconnector: None,
            vertex_ord: Arc::new(ChainOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        let mut g = built(plan, &Killswitch::new(), EngineConfig::sequential(2)).unwrap();
        assert_eq!(g.edge_count(), 2);

        let compose_plan = crate::plan::ComposePlan {
            property: Arc::new(|v: &u32| *v),
            qpred: Arc::new(|_pu: &u32, _l1: &u32, _pv: &u32, _l2: &u32| true),
            qop: Arc::new(|_pu: &u32, l1: &u32, _pv: &u32, l2: &u32| l1 + l2),
            destructive: true,
            co_fix: false,
            zone: Zone::default(),
        };
        composed(&mut g, compose_plan, &Killswitch::new(), EngineConfig::sequential(2)).unwrap();
        // 0->1 (dropped), 1->2 (untouched, no further hop from 2), plus new 0->2.
        assert_eq!(g.edge_count(), 2);
    }
}
