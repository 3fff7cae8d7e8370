//! `induced` — path-folding from a terminus.
//!
//! A stage fold: every sink (no outgoing edges, or no incident edges
//! when `zone.backwards`) starts at `vacuous_case`; every other vertex
//! folds `map(vertex, edge_label, remote(neighbor))` over its fold-set
//! edges via `reduce`. The value at the graph's initial vertex is
//! returned.
//!
//! Implemented as a reverse-topological fold (Kahn's algorithm over the
//! fold-edge dependency graph): a vertex becomes eligible once every
//! neighbor its fold-set edges point at has already resolved, so each
//! acyclic vertex is folded exactly once, over already-computed
//! neighbor values, regardless of how many hops separate it from a
//! sink. Vertices left over once the topological frontier runs dry sit
//! on a cycle in the chosen direction; `co_fix` relaxes that residual
//! set to a fixed point via bounded Jacobi iteration, while without it
//! each cyclic vertex folds once over whatever neighbor values have
//! resolved so far, falling back to `vacuous_case` for any neighbor
//! still stuck in the same cycle (DESIGN.md Open Question 2).

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::Graph;
use crate::ids::{LaneId, VertexId};
use crate::kernel::{EngineConfig, Phase};
use crate::plan::InducePlan;
use std::collections::{HashMap, HashSet, VecDeque};

pub fn induced<V, E, R>(graph: &Graph<V, E>, plan: InducePlan<V, E, R>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<R>
where
    V: Send + Sync,
    E: Send + Sync,
    R: Clone + Send + Sync + 'static,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;
    if killswitch.is_tripped() {
        errors.set(GraphError::Cancelled);
        tracker.fail(&errors, killswitch);
        anyhow::bail!(GraphError::Cancelled);
    }

    let Some(start) = graph.initial_vertex() else {
        tracker.enter(Phase::Done);
        return Ok((plan.vacuous_case)());
    };

    tracker.enter(Phase::Classifying);
    let mut remote: HashMap<VertexId, R> = HashMap::new();
    let mut remaining: HashMap<VertexId, usize> = HashMap::new();
    let mut queue: VecDeque<VertexId> = VecDeque::new();

    for (lane_idx, lane) in graph.lanes.iter().enumerate() {
        for (slot, rec) in lane.vertices.iter().enumerate() {
            if !rec.is_live() {
                continue;
            }
            let id = VertexId::new(LaneId(lane_idx), slot);
            let fold_count = neighbor_edges(graph, lane_idx, slot, plan.zone.backwards).len();
            remote.insert(id, (plan.vacuous_case)());
            remaining.insert(id, fold_count);
            if fold_count == 0 {
                queue.push_back(id);
            }
        }
    }

    tracker.enter(Phase::Reducing);
    let mut resolved: HashSet<VertexId> = HashSet::new();
    while let Some(id) = queue.pop_front() {
        if killswitch.is_tripped() {
            errors.set(GraphError::Cancelled);
            tracker.fail(&errors, killswitch);
            anyhow::bail!(GraphError::Cancelled);
        }
        if !resolved.insert(id) {
            continue;
        }
        fold_one(graph, &plan, &mut remote, id);
        for dependent in dependents(graph, id, plan.zone.backwards) {
            if let Some(count) = remaining.get_mut(&dependent) {
                if *count > 0 {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    // Vertices never reached by the topological frontier sit on a cycle
    // in the chosen direction.
    let cyclic: Vec<VertexId> = remaining.keys().copied().filter(|id| !resolved.contains(id)).collect();
    if !cyclic.is_empty() {
        let passes = if plan.co_fix { cyclic.len() + 1 } else { 1 };
        for _ in 0..passes {
            if killswitch.is_tripped() {
                errors.set(GraphError::Cancelled);
                tracker.fail(&errors, killswitch);
                anyhow::bail!(GraphError::Cancelled);
            }
            let mut next = remote.clone();
            for &id in &cyclic {
                fold_one(graph, &plan, &mut next, id);
            }
            remote = next;
        }
    }

    tracker.record("vertices_visited", graph.vertex_count());
    tracker.enter(Phase::Done);
    Ok(remote.get(&start).cloned().unwrap_or_else(|| (plan.vacuous_case)()))
}

/// Fold `id`'s fold-set edges against the current `remote` snapshot and
/// write the result back into it. A vertex with no fold edges keeps
/// whatever `remote` already holds for it (`vacuous_case` on first
/// insertion).
fn fold_one<V, E, R>(graph: &Graph<V, E>, plan: &InducePlan<V, E, R>, remote: &mut HashMap<VertexId, R>, id: VertexId)
where
    R: Clone,
{
    let lane_idx = id.lane.index();
    let slot = id.slot;
    let value = graph.lanes[lane_idx].vertices[slot]
        .value
        .as_ref()
        .expect("live vertex with no value");
    let edges = neighbor_edges(graph, lane_idx, slot, plan.zone.backwards);
    if edges.is_empty() {
        return;
    }
    let mut acc = plan.reduce.create();
    for (label, neighbor) in edges {
        let neighbor_remote = remote.get(&neighbor).cloned().unwrap_or_else(|| (plan.vacuous_case)());
        let mapped = (plan.map)(value, label, &neighbor_remote);
        acc = plan.reduce.add_input(acc, &mapped);
    }
    remote.insert(id, plan.reduce.finish(acc));
}

/// Vertices `u` whose fold-set edges point at `v` — the dependency
/// graph's predecessors of `v`, i.e. who becomes eligible once `v`
/// resolves.
fn dependents<V, E>(graph: &Graph<V, E>, v: VertexId, backwards: bool) -> Vec<VertexId> {
    let lane = &graph.lanes[v.lane.index()];
    if !backwards {
        lane.vertices[v.slot]
            .incident
            .iter()
            .filter_map(|&(owner_lane, e_slot)| {
                let e = &graph.lanes[owner_lane.index()].edges[e_slot];
                e.label.as_ref().map(|_| e.source)
            })
            .collect()
    } else {
        lane.vertices[v.slot]
            .outgoing
            .iter()
            .filter_map(|&e_slot| lane.edges[e_slot].label.as_ref().map(|_| lane.edges[e_slot].terminus))
            .collect()
    }
}

fn neighbor_edges<'a, V, E>(graph: &'a Graph<V, E>, lane_idx: usize, slot: usize, backwards: bool) -> Vec<(&'a E, VertexId)> {
    let lane = &graph.lanes[lane_idx];
    if !backwards {
        lane.vertices[slot]
            .outgoing
            .iter()
            .filter_map(|&e_slot| lane.edges[e_slot].label.as_ref().map(|l| (l, lane.edges[e_slot].terminus)))
            .collect()
    } else {
        lane.vertices[slot]
            .incident
            .iter()
            .filter_map(|&(owner_lane, e_slot)| {
                let e = &graph.lanes[owner_lane.index()].edges[e_slot];
                e.label.as_ref().map(|l| (l, e.source))
            })
            .collect()
    }
}
