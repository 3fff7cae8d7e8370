//! `filtered` — vertex deletion with edge pruning.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::kernel::{map_lanes, EngineConfig, Phase};
use crate::plan::FilterPlan;
use crate::record::Color;

pub fn filtered<V, E>(
    graph: &mut Graph<V, E>,
    plan: FilterPlan<V>,
    killswitch: &Killswitch,
    cfg: EngineConfig,
) -> anyhow::Result<()>
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

    // MAP(predicate): evaluate lane-parallel, predicate ≡ true keeps a
    // vertex untouched.
    tracker.enter(Phase::Classifying);
    let mut drops: Vec<Vec<usize>> = map_lanes(graph, cfg.mode, |lane| {
        lane.vertices
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.is_live() && !(plan.predicate)(rec.value.as_ref().unwrap()))
            .map(|(slot, _)| slot)
            .collect()
    });
    tracker.record("vertices_visited", graph.vertex_count());

    // REWIRE(drop) + RECLAIM: destroy the vertex and every edge
    // touching it (outgoing and incident), tombstoning rather than
    // compacting the arena so surviving indices stay valid. This has
    // to stay lane-sequential: dropping a vertex destroys incident
    // edges that may be owned by a foreign lane.
    tracker.enter(Phase::Reclaiming);
    let mut destroyed = 0u64;
    for (lane_idx, slots) in drops.drain(..).enumerate() {
        for slot in slots {
            let (outgoing, incident) = {
                let rec = &mut graph.lanes[lane_idx].vertices[slot];
                if let Some(v) = rec.take() {
                    graph.vertex_destructor.destroy(v);
                    destroyed += 1;
                }
                rec.color = Color::Dead;
                (std::mem::take(&mut rec.outgoing), std::mem::take(&mut rec.incident))
            };
            graph.lanes[lane_idx].tombstones.push(slot);

            for edge_slot in outgoing {
                if let Some(label) = graph.lanes[lane_idx].edges[edge_slot].take() {
                    graph.edge_destructor.destroy(label);
                }
            }
            for (owner_lane, edge_slot) in incident {
                if let Some(label) = graph.lanes[owner_lane.index()].edges[edge_slot].take() {
                    graph.edge_destructor.destroy(label);
                }
            }
        }
    }

    tracker.record("destructors_invoked", destroyed);
    tracker.enter(Phase::Done);
    Ok(())
}
