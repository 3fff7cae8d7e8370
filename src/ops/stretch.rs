//! `stretched` — new-vertex insertion along selected edges.
//!
//! For every edge `u -L-> v` where `expander(prop(u), L, prop(v))`
//! holds, `interpose(L)` produces `(in_label, new_vertex, out_label)`;
//! the edge is replaced by `u -in_label-> new_vertex -out_label-> v`.
//! `new_vertex` goes through the ordinary insert-if-absent path, so
//! interposed vertices with client-equal values collapse onto the
//! same record automatically without a separate deduplication step.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::{LaneId, VertexId};
use crate::kernel::{map_lanes, EngineConfig, Phase};
use crate::lane::lane_of;
use crate::plan::StretchPlan;

pub fn stretched<V, E, P>(graph: &mut Graph<V, E>, plan: StretchPlan<V, E, P>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
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

    // PROP is read-only and lane-local; honors `mode`. The interpose
    // pass below has to stay lane-sequential, since a new vertex's
    // lane is whatever its hash lands on and its edges may need to
    // reach into the terminus's foreign lane.
    tracker.enter(Phase::Propping);
    let properties: Vec<Vec<Option<P>>> =
        map_lanes(graph, cfg.mode, |lane| lane.vertices.iter().map(|rec| rec.value.as_ref().map(|v| (plan.property)(v))).collect());
    tracker.record("vertices_visited", graph.vertex_count());

    tracker.enter(Phase::Classifying);
    let mut targets: Vec<(usize, usize, usize)> = Vec::new();
    for (lane_idx, lane) in graph.lanes.iter().enumerate() {
        for (u_slot, rec) in lane.vertices.iter().enumerate() {
            if !rec.is_live() {
                continue;
            }
            for &e_slot in &rec.outgoing {
                if lane.edges[e_slot].is_live() {
                    targets.push((lane_idx, u_slot, e_slot));
                }
            }
        }
    }

    let vertex_ord = graph.vertex_ord.clone();
    let vertex_destructor = graph.vertex_destructor.clone();

    tracker.enter(Phase::Rewiring);
    for (lane_idx, u_slot, e_slot) in targets {
        if !graph.lanes[lane_idx].edges[e_slot].is_live() {
            continue;
        }
        let terminus = graph.lanes[lane_idx].edges[e_slot].terminus;
        if !graph.lanes[terminus.lane.index()].vertices[terminus.slot].is_live() {
            continue;
        }
        let Some(prop_u) = properties[lane_idx][u_slot].as_ref() else { continue };
        let Some(prop_v) = properties[terminus.lane.index()][terminus.slot].as_ref() else {
            continue;
        };
        let keep_stretching = {
            let label_ref = graph.lanes[lane_idx].edges[e_slot].label.as_ref().unwrap();
            (plan.expander)(prop_u, label_ref, prop_v)
        };
        if !keep_stretching {
            continue;
        }

        let old_label = graph.lanes[lane_idx].edges[e_slot].take().unwrap();
        let (in_label, new_value, out_label) = (plan.interpose)(&old_label);
        graph.edge_destructor.destroy(old_label);

        let h = vertex_ord.hash(&new_value);
        let target_lane = lane_of(h, graph.lanes.len());
        let mut eq = |a: &V, b: &V| vertex_ord.equal(a, b);
        let (new_slot, dup) = graph.lanes[target_lane.index()].insert_if_absent(new_value, h, &mut eq)?;
        if let Some(d) = dup {
            vertex_destructor.destroy(d);
        }
        let new_id = VertexId::new(target_lane, new_slot);

        let u_id = VertexId::new(LaneId(lane_idx), u_slot);
        let in_slot = graph.lanes[lane_idx].alloc_placeholder_edge(u_id, in_label, new_id);
        graph.lanes[lane_idx].vertices[u_slot].outgoing.push(in_slot);
        graph.lanes[new_id.lane.index()].vertices[new_id.slot]
            .incident
            .push((LaneId(lane_idx), in_slot));

        let out_slot = graph.lanes[new_id.lane.index()].alloc_placeholder_edge(new_id, out_label, terminus);
        graph.lanes[new_id.lane.index()].vertices[new_id.slot].outgoing.push(out_slot);
        graph.lanes[terminus.lane.index()].vertices[terminus.slot]
            .incident
            .push((new_id.lane, out_slot));
    }

    tracker.enter(Phase::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectCtx, Connector};
    use crate::graph::{Graph, NoopDestructor, VertexOrdering};
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

    struct Single;
    impl Connector<u32, u32> for Single {
        fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
            if *vertex == 0 {
                ctx.connect(7, 1);
            }
            Ok(())
        }
    }

    fn build_pair() -> Graph<u32, u32> {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Single),
            subconnector: None,
            vertex_ord: Arc::new(IdOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        built(plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap()
    }

    #[test]
    fn expander_false_is_a_no_op() {
        let mut g = build_pair();
        let before_v = g.vertex_count();
        let before_e = g.edge_count();
        let plan = StretchPlan::<u32, u32, u32> {
            property: Arc::new(|v: &u32| *v),
            expander: Arc::new(|_p1: &u32, _l: &u32, _p2: &u32| false),
            interpose: Arc::new(|l: &u32| (*l, 999, *l)),
        };
        stretched(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        assert_eq!(g.vertex_count(), before_v);
        assert_eq!(g.edge_count(), before_e);
    }

    #[test]
    fn expander_true_interposes_one_vertex() {
        let mut g = build_pair();
        let plan = StretchPlan::<u32, u32, u32> {
            property: Arc::new(|v: &u32| *v),
            expander: Arc::new(|_p1: &u32, _l: &u32, _p2: &u32| true),
            interpose: Arc::new(|l: &u32| (*l, 99, *l)),
        };
        stretched(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(1)).unwrap();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);
    }
}
