//! `mutated` — in-place vertex/edge rewriting.
//!
//! Pointwise: unlike compose or induce, `v_op`/`e_op` here see only the
//! value being rewritten, so the zone's traversal order has no
//! observable effect and this operation needs no PROP pass — every
//! lane rewrites its own vertices/edges independently, in parallel.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph, VertexOrdering};
use crate::kernel::{for_each_lane_mut, EngineConfig, Phase};
use crate::plan::MutatePlan;

pub fn mutated<V, E>(
    graph: &mut Graph<V, E>,
    plan: MutatePlan<V, E>,
    killswitch: &Killswitch,
    cfg: EngineConfig,
) -> anyhow::Result<()>
where
    V: Send,
    E: Send,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;
    if killswitch.is_tripped() {
        errors.set(GraphError::Cancelled);
        tracker.fail(&errors, killswitch);
        anyhow::bail!(GraphError::Cancelled);
    }

    let v_op = &plan.v_op;
    let e_op = &plan.e_op;
    let vertex_destructor = graph.vertex_destructor.clone();
    let edge_destructor = graph.edge_destructor.clone();

    tracker.enter(Phase::Mapping);
    tracker.record("vertices_visited", graph.vertex_count());
    for_each_lane_mut(graph, cfg.mode, |lane| {
        for record in &mut lane.vertices {
            if let Some(old) = record.value.take() {
                let new_value = v_op(&old);
                vertex_destructor.destroy(old);
                record.value = Some(new_value);
            }
        }
        for edge in &mut lane.edges {
            if let Some(old) = edge.label.take() {
                let new_label = e_op(&old);
                edge_destructor.destroy(old);
                edge.label = Some(new_label);
            }
        }
    });

    tracker.enter(Phase::Rewiring);
    let vertex_ord = graph.vertex_ord.clone();
    for_each_lane_mut(graph, cfg.mode, |lane| lane.rebuild_index(|v| vertex_ord.hash(v)));

    tracker.enter(Phase::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::hypercube;

    #[test]
    fn identity_mutate_preserves_topology() {
        let mut g = hypercube(3, 4).expect("build");
        let before_v = g.vertex_count();
        let before_e = g.edge_count();
        let plan = MutatePlan::<u32, u32> {
            v_op: std::sync::Arc::new(|v: &u32| *v),
            e_op: std::sync::Arc::new(|e: &u32| *e),
            zone: crate::plan::Zone::default(),
        };
        mutated(&mut g, plan, &Killswitch::new(), EngineConfig::sequential(4)).unwrap();
        assert_eq!(g.vertex_count(), before_v);
        assert_eq!(g.edge_count(), before_e);
    }
}
