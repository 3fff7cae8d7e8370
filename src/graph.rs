//! The graph handle: lanes, orderings, destructors, and reclamation.

use crate::error::ErrorChannel;
use crate::ids::{LaneId, VertexId};
use crate::lane::{lane_of, Lane};
use std::sync::Arc;

/// Client-supplied hash + equality for vertex values. Two values the
/// client considers equal must always hash to the same lane, or the
/// engine's partitioning invariant breaks.
pub trait VertexOrdering<V>: Send + Sync {
    fn hash(&self, v: &V) -> u64;
    fn equal(&self, a: &V, b: &V) -> anyhow::Result<bool>;
}

/// Client-supplied hash + equality for edge labels. Optional: a graph
/// whose edges are never deduplicated needn't supply one.
pub trait EdgeOrdering<E>: Send + Sync {
    fn hash(&self, e: &E) -> u64;
    fn equal(&self, a: &E, b: &E) -> anyhow::Result<bool>;
}

/// Destructor dispatch for a value the engine owns. Must be callable
/// even after the error channel has tripped.
pub trait Destructor<T>: Send + Sync {
    fn destroy(&self, value: T);
}

/// A destructor that does nothing — the default for value types with
/// no external resources (plain data, no `Drop` side effects beyond
/// Rust's own).
pub struct NoopDestructor;
impl<T> Destructor<T> for NoopDestructor {
    fn destroy(&self, _value: T) {}
}

/// A graph handle: the lane table, the vertex/edge orderings and
/// destructors, and the initial vertex.
pub struct Graph<V, E> {
    pub(crate) lanes: Vec<Lane<V, E>>,
    pub(crate) vertex_ord: Arc<dyn VertexOrdering<V>>,
    pub(crate) edge_ord: Option<Arc<dyn EdgeOrdering<E>>>,
    pub(crate) vertex_destructor: Arc<dyn Destructor<V>>,
    pub(crate) edge_destructor: Arc<dyn Destructor<E>>,
    pub(crate) initial_vertex: Option<VertexId>,
    pub(crate) errors: Arc<ErrorChannel>,
}

impl<V: Send, E: Send> Graph<V, E> {
    pub(crate) fn empty(
        lanes: usize,
        vertex_ord: Arc<dyn VertexOrdering<V>>,
        edge_ord: Option<Arc<dyn EdgeOrdering<E>>>,
        vertex_destructor: Arc<dyn Destructor<V>>,
        edge_destructor: Arc<dyn Destructor<E>>,
    ) -> Self {
        Self {
            lanes: (0..lanes).map(|i| Lane::new(LaneId(i))).collect(),
            vertex_ord,
            edge_ord,
            vertex_destructor,
            edge_destructor,
            initial_vertex: None,
            errors: Arc::new(ErrorChannel::new()),
        }
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Total live vertices, saturating rather than wrapping (DESIGN.md
    /// Open Question 3).
    #[must_use]
    pub fn vertex_count(&self) -> u64 {
        self.lanes
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.live_vertex_count() as u64))
    }

    #[must_use]
    pub fn edge_count(&self) -> u64 {
        self.lanes.iter().fold(0u64, |acc, l| {
            acc.saturating_add(l.edges.iter().filter(|e| e.is_live()).count() as u64)
        })
    }

    #[must_use]
    pub fn initial_vertex(&self) -> Option<VertexId> {
        self.initial_vertex
    }

    #[must_use]
    pub fn lane_of_hash(&self, hash: u64) -> LaneId {
        lane_of(hash, self.lanes.len())
    }

    #[must_use]
    pub fn vertex_value(&self, id: VertexId) -> &V {
        self.lanes[id.lane.index()].vertices[id.slot]
            .value
            .as_ref()
            .expect("dead vertex record referenced")
    }

    #[must_use]
    pub fn edge_label(&self, source_lane: LaneId, slot: usize) -> &E {
        self.lanes[source_lane.index()].edges[slot]
            .label
            .as_ref()
            .expect("dead edge record referenced")
    }

    /// Call destructors on every live vertex and edge, then drop the
    /// lane table. Used both by `free_now` and internally whenever a
    /// graph is discarded (a failed build, or a graph superseded by a
    /// transformation's output).
    /// Eagerly destroy every live value rather than waiting for `Drop`.
    pub fn free_now(&mut self) {
        self.reclaim_all();
    }

    pub fn reclaim_all(&mut self) {
        for lane in &mut self.lanes {
            for edge in &mut lane.edges {
                if let Some(label) = edge.take() {
                    self.edge_destructor.destroy(label);
                }
            }
            for vertex in &mut lane.vertices {
                if let Some(value) = vertex.take() {
                    self.vertex_destructor.destroy(value);
                }
            }
        }
    }
}

impl<V, E> Drop for Graph<V, E> {
    fn drop(&mut self) {
        // Anything `reclaim_all` hasn't already taken is swept here so
        // no destructor call is skipped.
        for lane in &mut self.lanes {
            for edge in &mut lane.edges {
                if let Some(label) = edge.take() {
                    self.edge_destructor.destroy(label);
                }
            }
            for vertex in &mut lane.vertices {
                if let Some(value) = vertex.take() {
                    self.vertex_destructor.destroy(value);
                }
            }
        }
    }
}
