//! `split` — vertex bisection.
//!
//! Every live vertex `u` is replaced by a pair `u_in = ana(u)`,
//! `u_out = cata(u)`, joined by two new internal edges: `u_in
//! -inward_label(u)-> u_out` and `u_out -outward_label(u)-> u_in`.
//! Edges that used to terminate at `u` are redirected to land on
//! `u_in`; edges that used to depart from `u` are re-homed to depart
//! from `u_out` instead, so external traffic still enters through the
//! "in" half and leaves through the "out" half. `u` itself is
//! destroyed and tombstoned.
//!
//! Like `fabricate`/`mutate`/`merge`/`stretch`, the two new vertices
//! bypass `insert_if_absent` — `ana`/`cata` values are per-source
//! structural copies, not meant to coalesce with another vertex's split
//! halves — so a `rebuild_index` pass follows at the barrier.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::{LaneId, VertexId};
use crate::kernel::{for_each_lane_mut, map_lanes, EngineConfig, Phase};
use crate::plan::SplitPlan;
use crate::record::VertexRecord;

pub fn split<V, E>(graph: &mut Graph<V, E>, plan: SplitPlan<V, E>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
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

    tracker.enter(Phase::Classifying);
    let per_lane_targets: Vec<Vec<usize>> = map_lanes(graph, cfg.mode, |lane| {
        lane.vertices.iter().enumerate().filter(|(_, rec)| rec.is_live()).map(|(slot, _)| slot).collect()
    });
    let targets: Vec<(usize, usize)> = per_lane_targets
        .into_iter()
        .enumerate()
        .flat_map(|(lane_idx, slots)| slots.into_iter().map(move |slot| (lane_idx, slot)))
        .collect();
    tracker.record("vertices_visited", graph.vertex_count());

    tracker.enter(Phase::Rewiring);
    for (lane_idx, slot) in targets {
        let old_value = graph.lanes[lane_idx].vertices[slot]
            .take()
            .expect("target was confirmed live before this pass");
        let in_value = (plan.ana)(&old_value);
        let out_value = (plan.cata)(&old_value);
        let inward_label = (plan.inward_label)(&old_value);
        let outward_label = (plan.outward_label)(&old_value);
        graph.vertex_destructor.destroy(old_value);

        let in_slot = graph.lanes[lane_idx].vertices.len();
        graph.lanes[lane_idx].vertices.push(VertexRecord::new(in_value));
        let out_slot = graph.lanes[lane_idx].vertices.len();
        graph.lanes[lane_idx].vertices.push(VertexRecord::new(out_value));
        let in_id = VertexId::new(LaneId(lane_idx), in_slot);
        let out_id = VertexId::new(LaneId(lane_idx), out_slot);

        let inward_slot = graph.lanes[lane_idx].alloc_placeholder_edge(in_id, inward_label, out_id);
        graph.lanes[lane_idx].vertices[in_slot].outgoing.push(inward_slot);
        graph.lanes[lane_idx].vertices[out_slot].incident.push((LaneId(lane_idx), inward_slot));

        let outward_slot = graph.lanes[lane_idx].alloc_placeholder_edge(out_id, outward_label, in_id);
        graph.lanes[lane_idx].vertices[out_slot].outgoing.push(outward_slot);
        graph.lanes[lane_idx].vertices[in_slot].incident.push((LaneId(lane_idx), outward_slot));

        let (old_outgoing, old_incident) = {
            let rec = &mut graph.lanes[lane_idx].vertices[slot];
            (std::mem::take(&mut rec.outgoing), std::mem::take(&mut rec.incident))
        };

        for edge_slot in old_outgoing {
            // The edge record keeps its slot, so every foreign lane's
            // `incident` entry `(lane_idx, edge_slot)` is still valid —
            // only the source vertex and this lane's `outgoing` list
            // need to move.
            graph.lanes[lane_idx].edges[edge_slot].source = out_id;
            graph.lanes[lane_idx].vertices[out_slot].outgoing.push(edge_slot);
        }

        for (owner_lane, edge_slot) in old_incident {
            graph.lanes[owner_lane.index()].edges[edge_slot].terminus = in_id;
            graph.lanes[lane_idx].vertices[in_slot].incident.push((owner_lane, edge_slot));
        }

        graph.lanes[lane_idx].tombstone(slot);
    }

    tracker.enter(Phase::Reclaiming);
    let vertex_ord = graph.vertex_ord.clone();
    for_each_lane_mut(graph, cfg.mode, |lane| lane.rebuild_index(|v| vertex_ord.hash(v)));
    tracker.enter(Phase::Done);
    Ok(())
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

    /// 0 -> 1 -> 2.
    struct Chain3;
    impl Connector<u32, u32> for Chain3 {
        fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
            if *vertex < 2 {
                ctx.connect(1, vertex + 1);
            }
            Ok(())
        }
    }

    #[test]
    fn every_vertex_gains_an_internal_edge_pair() {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Chain3),
            subconnector: None,
            vertex_ord: Arc::new(IdOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        let mut g = built(plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);

        let split_plan = SplitPlan::<u32, u32> {
            ana: Arc::new(|v: &u32| v * 10),
            cata: Arc::new(|v: &u32| v * 10 + 1),
            inward_label: Arc::new(|_v: &u32| 100u32),
            outward_label: Arc::new(|_v: &u32| 200u32),
        };
        split(&mut g, split_plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();

        // 3 originals each contribute one internal edge pair (6), plus
        // the 2 original chain edges re-homed onto the "out"/"in" halves.
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.edge_count(), 8);
    }
}
