//! `merged` — vertex fusion by equivalence class.
//!
//! PROP computes a property per vertex; CLASSIFY groups vertices by
//! `classifier(property)`; within a class, `fuse` maps every member to
//! a fused value and `reduce` folds those into one representative
//! value, which replaces the class's earliest member. Every other
//! member's edges redirect onto the representative and the member is
//! destroyed. A class of size one is left untouched.
//!
//! Redirected edges are not implicitly deduplicated — two members that
//! both point at the same vertex leave two parallel edges on the
//! representative; run `deduplicated` afterwards if that's unwanted
//! (DESIGN.md).

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::{LaneId, VertexId};
use crate::kernel::{for_each_lane_mut, map_lanes, EngineConfig, Phase};
use crate::plan::MergePlan;
use std::collections::HashMap;
use std::hash::Hash;

pub fn merged<V, E, K, P>(graph: &mut Graph<V, E>, plan: MergePlan<V, E, K, P>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
where
    V: Send + Sync,
    E: Send + Sync,
    K: Eq + Hash,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;
    if killswitch.is_tripped() {
        errors.set(GraphError::Cancelled);
        tracker.fail(&errors, killswitch);
        anyhow::bail!(GraphError::Cancelled);
    }

    // PROP+CLASSIFY: each lane computes its own `(key, vertex)` pairs
    // read-only, honoring `mode`; only folding those per-lane lists
    // into one cross-lane `classes` map has to run on one thread.
    tracker.enter(Phase::Propping);
    let per_lane: Vec<Vec<(K, VertexId)>> = map_lanes(graph, cfg.mode, |lane| {
        lane.vertices
            .iter()
            .enumerate()
            .filter_map(|(slot, rec)| {
                rec.value.as_ref().map(|v| {
                    let prop = (plan.property)(v);
                    ((plan.classifier)(&prop), VertexId::new(lane.id, slot))
                })
            })
            .collect()
    });
    tracker.record("vertices_visited", graph.vertex_count());

    tracker.enter(Phase::Classifying);
    let mut classes: HashMap<K, Vec<VertexId>> = HashMap::new();
    for (key, id) in per_lane.into_iter().flatten() {
        classes.entry(key).or_default().push(id);
    }

    tracker.enter(Phase::Rewiring);
    let mut destroyed = 0u64;
    for members in classes.into_values() {
        if members.len() < 2 {
            continue;
        }
        let representative = members[0];

        let mut acc = plan.reduce.create();
        for &id in &members {
            let value = graph.lanes[id.lane.index()].vertices[id.slot]
                .value
                .as_ref()
                .expect("classified vertex was already dead");
            let fused = (plan.fuse)(value);
            acc = plan.reduce.add_input(acc, &fused);
        }
        let representative_value = plan.reduce.finish(acc);

        for &id in &members {
            if id == representative {
                continue;
            }
            let (outgoing, incident) = {
                let rec = &mut graph.lanes[id.lane.index()].vertices[id.slot];
                (std::mem::take(&mut rec.outgoing), std::mem::take(&mut rec.incident))
            };

            for edge_slot in outgoing {
                let (label, terminus) = {
                    let edge = &mut graph.lanes[id.lane.index()].edges[edge_slot];
                    (edge.take(), edge.terminus)
                };
                let Some(label) = label else { continue };
                let keep = plan.pruner.as_ref().is_none_or(|p| p(true, &label));
                if !keep {
                    graph.edge_destructor.destroy(label);
                    continue;
                }
                let new_slot = graph.lanes[representative.lane.index()].alloc_placeholder_edge(representative, label, terminus);
                graph.lanes[representative.lane.index()].vertices[representative.slot]
                    .outgoing
                    .push(new_slot);
                graph.lanes[terminus.lane.index()].vertices[terminus.slot]
                    .incident
                    .push((representative.lane, new_slot));
            }

            for (owner_lane, edge_slot) in incident {
                graph.lanes[owner_lane.index()].edges[edge_slot].terminus = representative;
                graph.lanes[representative.lane.index()].vertices[representative.slot]
                    .incident
                    .push((owner_lane, edge_slot));
            }

            if let Some(old) = graph.lanes[id.lane.index()].vertices[id.slot].take() {
                graph.vertex_destructor.destroy(old);
                destroyed += 1;
            }
            graph.lanes[id.lane.index()].tombstone(id.slot);
        }

        let rep_rec = &mut graph.lanes[representative.lane.index()].vertices[representative.slot];
        if let Some(old) = rep_rec.take() {
            graph.vertex_destructor.destroy(old);
            destroyed += 1;
        }
        rep_rec.value = Some(representative_value);
    }

    tracker.record("destructors_invoked", destroyed);
    let vertex_ord = graph.vertex_ord.clone();
    for_each_lane_mut(graph, cfg.mode, |lane| lane.rebuild_index(|v| vertex_ord.hash(v)));
    tracker.enter(Phase::Done);
    Ok(())
}
