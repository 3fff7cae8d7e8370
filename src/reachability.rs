//! The reachability engine: connector-driven discovery across lanes
//! until quiescence.

use crate::connector::{ConnectCtx, Subconnector};
use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::{Destructor, Graph, VertexOrdering};
use crate::ids::VertexId;
use crate::lane::{lane_of, FinalizeEdge, LaneMessage, ResolveTerminus};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Bound on a lane's connection inbox. An attempt to enqueue beyond
/// this limit blocks the producer until the target lane drains.
const QUEUE_DEPTH: usize = 4096;

/// Two-phase termination counter: one unit of credit per unit of work
/// not yet accounted for — a vertex waiting to be visited, or a
/// message in flight between lanes. Reaches zero only when nothing is
/// left anywhere — standard two-phase quiescence detection.
#[derive(Default)]
pub struct Quiescence {
    outstanding: AtomicI64,
}

impl Quiescence {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawn(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    pub fn settle(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.outstanding.load(Ordering::Acquire) <= 0
    }
}

/// Runs discovery from the given seeds until every lane's to-visit
/// list and connection inbox are empty. Each of `graph.lanes` is
/// visited by exactly one task for the duration of this call — a lane
/// is owned by exactly one worker thread.
pub fn discover<V, E>(
    graph: &mut Graph<V, E>,
    subconnector: &dyn Subconnector<V, E>,
    seeds: Vec<V>,
    is_initial: bool,
    killswitch: &Killswitch,
    errors: &ErrorChannel,
) -> anyhow::Result<()>
where
    V: Send,
    E: Send,
{
    let n = graph.lanes.len();
    if n == 0 {
        errors.set(GraphError::NoLanes);
        anyhow::bail!(GraphError::NoLanes);
    }

    let quiescence = Quiescence::new();
    let (txs, rxs): (Vec<Sender<LaneMessage<V>>>, Vec<Receiver<LaneMessage<V>>>) =
        (0..n).map(|_| bounded(QUEUE_DEPTH)).unzip();

    let vertex_ord = Arc::clone(&graph.vertex_ord);
    let vertex_destructor = Arc::clone(&graph.vertex_destructor);

    // Seed each value into its home lane's to-visit list up front.
    for seed in seeds {
        let h = vertex_ord.hash(&seed);
        let target = lane_of(h, n);
        let lane = &mut graph.lanes[target.index()];
        let mut eq = |a: &V, b: &V| vertex_ord.equal(a, b);
        match lane.insert_if_absent(seed, h, &mut eq)? {
            (slot, None) => {
                quiescence.spawn();
                lane.to_visit.push(slot);
                if graph.initial_vertex.is_none() {
                    graph.initial_vertex = Some(VertexId::new(target, slot));
                }
            }
            (_, Some(dup)) => vertex_destructor.destroy(dup),
        }
    }

    let lanes = &mut graph.lanes;
    let edge_ord_present = graph.edge_ord.is_some();
    let _ = edge_ord_present;

    rayon::scope(|scope| {
        for (lane, rx) in lanes.iter_mut().zip(rxs.into_iter()) {
            let txs = txs.clone();
            let quiescence = Arc::clone(&quiescence);
            let vertex_ord: Arc<dyn VertexOrdering<V>> = Arc::clone(&vertex_ord);
            let vertex_destructor: Arc<dyn Destructor<V>> = Arc::clone(&vertex_destructor);
            scope.spawn(move |_| {
                run_lane(
                    lane,
                    &rx,
                    &txs,
                    is_initial,
                    subconnector,
                    vertex_ord.as_ref(),
                    vertex_destructor.as_ref(),
                    &quiescence,
                    killswitch,
                    errors,
                );
            });
        }
    });

    if errors.is_tripped() {
        anyhow::bail!("discovery failed: {}", errors.code());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_lane<V, E>(
    lane: &mut crate::lane::Lane<V, E>,
    rx: &Receiver<LaneMessage<V>>,
    txs: &[Sender<LaneMessage<V>>],
    is_initial_build: bool,
    subconnector: &dyn Subconnector<V, E>,
    vertex_ord: &dyn VertexOrdering<V>,
    vertex_destructor: &dyn Destructor<V>,
    quiescence: &Quiescence,
    killswitch: &Killswitch,
    errors: &ErrorChannel,
) where
    V: Send,
    E: Send,
{
    let n = txs.len();
    loop {
        if killswitch.is_tripped() {
            errors.set(GraphError::Cancelled);
            return;
        }
        if errors.is_tripped() {
            return;
        }

        let mut drained_any = false;
        while let Ok(msg) = rx.try_recv() {
            drained_any = true;
            match msg {
                LaneMessage::ResolveTerminus(ResolveTerminus {
                    value,
                    source,
                    back_edge,
                }) => {
                    let h = vertex_ord.hash(&value);
                    let mut eq = |a: &V, b: &V| vertex_ord.equal(a, b);
                    match lane.insert_if_absent(value, h, &mut eq) {
                        Ok((slot, None)) => {
                            quiescence.spawn();
                            lane.to_visit.push(slot);
                            lane.vertices[slot].incident.push((source.lane, back_edge));
                            let reply = LaneMessage::FinalizeEdge(FinalizeEdge {
                                back_edge,
                                terminus: VertexId::new(lane.id, slot),
                            });
                            quiescence.spawn();
                            if txs[source.lane.index()].send(reply).is_err() {
                                errors.set(GraphError::Overflow);
                            }
                        }
                        Ok((slot, Some(dup))) => {
                            vertex_destructor.destroy(dup);
                            lane.vertices[slot].incident.push((source.lane, back_edge));
                            let reply = LaneMessage::FinalizeEdge(FinalizeEdge {
                                back_edge,
                                terminus: VertexId::new(lane.id, slot),
                            });
                            quiescence.spawn();
                            if txs[source.lane.index()].send(reply).is_err() {
                                errors.set(GraphError::Overflow);
                            }
                        }
                        Err(_) => errors.set(GraphError::ContractViolation),
                    }
                }
                LaneMessage::FinalizeEdge(FinalizeEdge { back_edge, terminus }) => {
                    lane.edges[back_edge].terminus = terminus;
                }
            }
            quiescence.settle();
        }

        if let Some(slot) = lane.to_visit.pop() {
            drained_any = true;
            let mut declared = Vec::new();
            {
                let mut ctx = ConnectCtx::new(&mut declared);
                let value_ref = lane.vertices[slot]
                    .value
                    .as_ref()
                    .expect("to-visit entry referenced a dead vertex");
                let is_initial = is_initial_build && lane.vertices[slot].incident.is_empty();
                if let Err(e) = subconnector.connect(is_initial, None, value_ref, &mut ctx) {
                    errors.set(GraphError::ClientReported(0));
                    let _ = e;
                }
            }
            lane.mark_visited(slot);

            for (label, terminus_value) in declared {
                if errors.is_tripped() {
                    break;
                }
                let h = vertex_ord.hash(&terminus_value);
                let target = lane_of(h, n);
                if target == lane.id {
                    let source_id = VertexId::new(lane.id, slot);
                    let placeholder = VertexId::new(lane.id, usize::MAX);
                    let edge_slot = lane.alloc_placeholder_edge(source_id, label, placeholder);
                    lane.vertices[slot].outgoing.push(edge_slot);
                    let mut eq = |a: &V, b: &V| vertex_ord.equal(a, b);
                    match lane.insert_if_absent(terminus_value, h, &mut eq) {
                        Ok((t_slot, None)) => {
                            let tid = VertexId::new(lane.id, t_slot);
                            lane.edges[edge_slot].terminus = tid;
                            lane.vertices[t_slot].incident.push((lane.id, edge_slot));
                            quiescence.spawn();
                            lane.to_visit.push(t_slot);
                        }
                        Ok((t_slot, Some(dup))) => {
                            vertex_destructor.destroy(dup);
                            let tid = VertexId::new(lane.id, t_slot);
                            lane.edges[edge_slot].terminus = tid;
                            lane.vertices[t_slot].incident.push((lane.id, edge_slot));
                        }
                        Err(_) => errors.set(GraphError::ContractViolation),
                    }
                } else {
                    let source_id = VertexId::new(lane.id, slot);
                    let placeholder = VertexId::new(lane.id, usize::MAX);
                    let edge_slot = lane.alloc_placeholder_edge(source_id, label, placeholder);
                    lane.vertices[slot].outgoing.push(edge_slot);
                    quiescence.spawn();
                    let msg = LaneMessage::ResolveTerminus(ResolveTerminus {
                        value: terminus_value,
                        source: VertexId::new(lane.id, slot),
                        back_edge: edge_slot,
                    });
                    if txs[target.index()].send(msg).is_err() {
                        errors.set(GraphError::Overflow);
                    }
                }
            }
            quiescence.settle();
        }

        if !drained_any {
            if quiescence.is_quiescent() && rx.is_empty() && lane.to_visit.is_empty() {
                return;
            }
            std::thread::yield_now();
        }
    }
}
