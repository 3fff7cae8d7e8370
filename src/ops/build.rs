//! `built` / `fabricated` — the two operations that produce a graph
//! without one already existing as input.

use crate::connector::AsSubconnector;
use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Graph, VertexOrdering};
use crate::kernel::{EngineConfig, Phase};
use crate::plan::{BuildPlan, FabricatePlan};
use crate::reachability::discover;

/// `built(plan, killswitch, lanes) -> graph`. Discovers the whole
/// reachable graph from `plan.seeds` via the connector
/// protocol, then returns it; on failure no partial graph escapes —
/// the half-built graph is reclaimed and the error propagated.
pub fn built<V, E>(plan: BuildPlan<V, E>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<Graph<V, E>>
where
    V: Send,
    E: Send,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;

    let mut graph = Graph::empty(
        cfg.lanes,
        plan.vertex_ord.clone(),
        plan.edge_ord.clone(),
        plan.vertex_destructor.clone(),
        plan.edge_destructor.clone(),
    );

    tracker.enter(Phase::Discovering);
    let is_initial_seed = plan.subconnector.is_none();
    let result = match &plan.subconnector {
        Some(sub) => discover(&mut graph, sub.as_ref(), plan.seeds, is_initial_seed, killswitch, &errors),
        None => {
            let adapter = AsSubconnector(plan.connector.clone());
            discover(&mut graph, &adapter, plan.seeds, is_initial_seed, killswitch, &errors)
        }
    };

    if let Err(e) = result {
        tracker.fail(&errors, killswitch);
        graph.reclaim_all();
        return Err(e);
    }
    tracker.record("vertices_visited", graph.vertex_count());
    tracker.enter(Phase::Done);
    Ok(graph)
}

/// `fabricated(graph, plan, killswitch, lanes) -> graph`: a structural
/// copy. Every vertex/edge value is mapped through the client's copy
/// callbacks; topology (edge endpoints, per-vertex edge order) is
/// preserved exactly, so the result is isomorphic to the input.
pub fn fabricated<V, E>(
    graph: &Graph<V, E>,
    plan: FabricatePlan<V, E>,
    killswitch: &Killswitch,
    cfg: EngineConfig,
) -> anyhow::Result<Graph<V, E>>
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

    let mut out = Graph::empty(
        graph.lanes.len(),
        graph.vertex_ord.clone(),
        graph.edge_ord.clone(),
        graph.vertex_destructor.clone(),
        graph.edge_destructor.clone(),
    );

    // Lane `i` of `out` only ever holds copies sourced from lane `i` of
    // `graph` — a fixed 1:1 correspondence, unlike the cross-lane
    // rewiring every other mutating op needs, so this can run each
    // lane's copy pass on its own thread with no aliasing hazard.
    tracker.enter(Phase::Mapping);
    let copy_lane = |lane: &crate::lane::Lane<V, E>| -> crate::lane::Lane<V, E> {
        let mut out_lane = crate::lane::Lane::new(lane.id);
        for v in &lane.vertices {
            out_lane.vertices.push(match v.value.as_ref() {
                Some(val) => crate::record::VertexRecord {
                    value: Some((plan.vertex_copy)(val)),
                    outgoing: v.outgoing.clone(),
                    incident: v.incident.clone(),
                    color: v.color,
                    scratch: None,
                },
                None => crate::record::VertexRecord {
                    value: None,
                    outgoing: Vec::new(),
                    incident: Vec::new(),
                    color: crate::record::Color::Dead,
                    scratch: None,
                },
            });
        }
        for e in &lane.edges {
            out_lane.edges.push(match e.label.as_ref() {
                Some(label) => crate::record::EdgeRecord::new(e.source, (plan.edge_copy)(label), e.terminus),
                None => crate::record::EdgeRecord {
                    label: None,
                    source: e.source,
                    terminus: e.terminus,
                },
            });
        }
        out_lane
    };
    out.lanes = match cfg.mode {
        crate::kernel::ExecMode::Sequential => graph.lanes.iter().map(copy_lane).collect(),
        crate::kernel::ExecMode::Parallel => {
            use rayon::prelude::*;
            graph.lanes.par_iter().map(copy_lane).collect()
        }
    };

    tracker.enter(Phase::Rewiring);
    let vertex_ord = out.vertex_ord.clone();
    crate::kernel::for_each_lane_mut(&mut out, cfg.mode, |lane| lane.rebuild_index(|v| vertex_ord.hash(v)));
    out.initial_vertex = graph.initial_vertex;

    tracker.record("vertices_visited", graph.vertex_count());
    tracker.enter(Phase::Done);
    Ok(out)
}
