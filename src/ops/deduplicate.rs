//! `deduplicated` — duplicate coalescing via classification by
//! identity key.
//!
//! Equivalent to `merge` with the vertex ordering's own hash+equality
//! standing in for classifier/property — two vertices coalesce exactly
//! when the client's `equal` callback says they're the same value.
//! Since equal values always hash to the same lane (the partitioning
//! invariant), every duplicate group lives inside a single lane and
//! this never needs the cross-lane bookkeeping `merge` does for its
//! classifier classes.
//!
//! If `equal_edges` is supplied, parallel edges a coalescence produces
//! (same representative, same terminus, `equal_edges` ≡ true) collapse
//! to one; the first survives, the rest are destroyed. Absent
//! `equal_edges`, parallel edges are left alone (DESIGN.md Open
//! Question 1 — no edge coalescing happens without the callback).

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph};
use crate::ids::VertexId;
use crate::kernel::{for_each_lane_mut, EngineConfig, Phase};
use crate::lane::Lane;
use crate::plan::DeduplicatePlan;
use std::collections::HashMap;
use std::sync::Arc;

pub fn deduplicated<V, E>(graph: &mut Graph<V, E>, plan: DeduplicatePlan<V, E>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<()>
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

    let vertex_ord = graph.vertex_ord.clone();

    // Bucketing and coalescing share a lane here because coalescing a
    // duplicate group writes into whatever foreign lane holds the
    // group's incident edges — it needs the same single-thread
    // discipline as merge's REWIRE phase, so this whole pass stays
    // lane-sequential even though the bucket scan itself is read-only.
    tracker.enter(Phase::Classifying);
    for lane_idx in 0..graph.lanes.len() {
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
        {
            let lane = &graph.lanes[lane_idx];
            for (slot, rec) in lane.vertices.iter().enumerate() {
                if let Some(v) = rec.value.as_ref() {
                    buckets.entry(vertex_ord.hash(v)).or_default().push(slot);
                }
            }
        }

        for (_, mut candidates) in buckets {
            if candidates.len() < 2 {
                continue;
            }
            // Split `candidates` into equality classes under the
            // client's `equal`; each class of size > 1 coalesces.
            while let Some(anchor) = candidates.pop() {
                let mut group = vec![anchor];
                let mut rest = Vec::new();
                for slot in candidates.drain(..) {
                    let anchor_val = graph.lanes[lane_idx].vertices[anchor].value.as_ref().unwrap();
                    let other_val = graph.lanes[lane_idx].vertices[slot].value.as_ref().unwrap();
                    if vertex_ord.equal(anchor_val, other_val)? {
                        group.push(slot);
                    } else {
                        rest.push(slot);
                    }
                }
                candidates = rest;
                if group.len() > 1 {
                    coalesce(graph, lane_idx, &group, &plan)?;
                }
            }
        }
    }

    // This pass never writes outside the lane it's scanning — a
    // coalesced group's edges all still terminate wherever they did
    // before, only their source-side duplicates collapse — so unlike
    // the bucket pass above it can run every lane on its own thread.
    if let Some(equal_edges) = &plan.equal_edges {
        tracker.enter(Phase::Rewiring);
        let edge_destructor = graph.edge_destructor.clone();
        let first_error: std::sync::Mutex<Option<anyhow::Error>> = std::sync::Mutex::new(None);
        for_each_lane_mut(graph, cfg.mode, |lane| {
            if let Err(e) = coalesce_parallel_edges_in_lane(lane, equal_edges.as_ref(), &edge_destructor) {
                let mut slot = first_error.lock().expect("poisoned");
                if slot.is_none() {
                    *slot = Some(e);
                }
            }
        });
        if let Some(e) = first_error.into_inner().expect("poisoned") {
            return Err(e);
        }
    }

    tracker.enter(Phase::Rewiring);
    for_each_lane_mut(graph, cfg.mode, |lane| lane.rebuild_index(|v| vertex_ord.hash(v)));
    tracker.record("vertices_visited", graph.vertex_count());
    tracker.enter(Phase::Done);
    Ok(())
}

fn coalesce<V, E>(graph: &mut Graph<V, E>, lane_idx: usize, group: &[usize], plan: &DeduplicatePlan<V, E>) -> anyhow::Result<()> {
    let representative_slot = group[0];
    let representative = VertexId::new(crate::ids::LaneId(lane_idx), representative_slot);

    let mut acc = plan.reduce.create();
    for &slot in group {
        let value = graph.lanes[lane_idx].vertices[slot].value.as_ref().expect("duplicate group referenced a dead vertex");
        acc = plan.reduce.add_input(acc, value);
    }
    let merged_value = plan.reduce.finish(acc);

    for &slot in &group[1..] {
        let id = VertexId::new(crate::ids::LaneId(lane_idx), slot);
        let (outgoing, incident) = {
            let rec = &mut graph.lanes[lane_idx].vertices[slot];
            (std::mem::take(&mut rec.outgoing), std::mem::take(&mut rec.incident))
        };
        for edge_slot in outgoing {
            graph.lanes[lane_idx].edges[edge_slot].source = representative;
            graph.lanes[lane_idx].vertices[representative_slot].outgoing.push(edge_slot);
            let terminus = graph.lanes[lane_idx].edges[edge_slot].terminus;
            graph.lanes[terminus.lane.index()].vertices[terminus.slot]
                .incident
                .push((representative.lane, edge_slot));
        }
        for (owner_lane, edge_slot) in incident {
            graph.lanes[owner_lane.index()].edges[edge_slot].terminus = representative;
            graph.lanes[representative.lane.index()].vertices[representative_slot]
                .incident
                .push((owner_lane, edge_slot));
        }
        if let Some(old) = graph.lanes[lane_idx].vertices[slot].take() {
            graph.vertex_destructor.destroy(old);
        }
        graph.lanes[lane_idx].tombstone(slot);
        let _ = id;
    }

    let rep_rec = &mut graph.lanes[lane_idx].vertices[representative_slot];
    if let Some(old) = rep_rec.take() {
        graph.vertex_destructor.destroy(old);
    }
    rep_rec.value = Some(merged_value);
    Ok(())
}

/// Collapses parallel outgoing edges within one lane.
fn coalesce_parallel_edges_in_lane<V, E>(
    lane: &mut Lane<V, E>,
    equal_edges: &(dyn Fn(&E, &E) -> anyhow::Result<bool> + Send + Sync),
    edge_destructor: &Arc<dyn Destructor<E>>,
) -> anyhow::Result<()> {
    for slot in 0..lane.vertices.len() {
        if !lane.vertices[slot].is_live() {
            continue;
        }
        let outgoing = lane.vertices[slot].outgoing.clone();
        let mut kept: Vec<usize> = Vec::new();
        let mut survivors: Vec<usize> = Vec::new();

        'outer: for edge_slot in outgoing {
            if !lane.edges[edge_slot].is_live() {
                continue;
            }
            let terminus = lane.edges[edge_slot].terminus;
            for &kept_slot in &survivors {
                if lane.edges[kept_slot].terminus != terminus {
                    continue;
                }
                let (a, b) = (
                    lane.edges[kept_slot].label.as_ref().unwrap(),
                    lane.edges[edge_slot].label.as_ref().unwrap(),
                );
                if equal_edges(a, b)? {
                    if let Some(label) = lane.edges[edge_slot].take() {
                        edge_destructor.destroy(label);
                    }
                    continue 'outer;
                }
            }
            survivors.push(edge_slot);
            kept.push(edge_slot);
        }
        lane.vertices[slot].outgoing = kept;
    }
    Ok(())
}
