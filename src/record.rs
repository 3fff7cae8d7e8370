//! Vertex and edge records: the engine's owned storage for client values.

use crate::ids::VertexId;
use std::any::Any;

/// Mark used by reachability and reclamation to track visitation state
/// without a second pass over the vertex store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Declared but not yet visited by the connector.
    Pending,
    /// Visited; its outgoing edges are final for this phase.
    Visited,
    /// Reachable only transiently during reclamation sweep.
    Dead,
}

/// A transient, per-phase scratch value — a reduction accumulator
/// during REDUCE, a classifier key during CLASSIFY. Cleared at every
/// barrier; never carries meaning across phases.
pub type Scratch = Option<Box<dyn Any + Send + Sync>>;

/// An edge: client label plus the terminus it points at. Appears in
/// exactly two lists across the graph — the source's outgoing list and
/// the terminus's incident list — sharing one label value, never
/// cloned. Rust ownership makes literal aliasing of the label
/// impractical without `Rc`, so the two lists instead hold an
/// `EdgeRecord` and a lightweight incident reference that looks the
/// label up by following the edge id; see `graph::Graph` for how the
/// two lists are kept consistent at barriers.
#[derive(Debug, Clone)]
pub struct EdgeRecord<E> {
    /// `None` once the label has been consumed by a destructor: rather
    /// than a magic-number sentinel, destruction is an ownership-taking
    /// operation that leaves nothing to double-free.
    pub label: Option<E>,
    /// The vertex this edge departs from. Kept alongside `terminus` so
    /// a backward traversal (induce/mutate/compose with `zone.backwards`)
    /// can walk a vertex's incident list without a reverse lookup from
    /// edge slot back to owning vertex.
    pub source: VertexId,
    pub terminus: VertexId,
}

impl<E> EdgeRecord<E> {
    #[must_use]
    pub fn new(source: VertexId, label: E, terminus: VertexId) -> Self {
        Self {
            label: Some(label),
            source,
            terminus,
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.label.is_some()
    }

    /// Take the label for destruction, if it hasn't been already.
    pub(crate) fn take(&mut self) -> Option<E> {
        self.label.take()
    }
}

/// An index into a vertex's outgoing or incident edge list.
pub type EdgeSlot = usize;

/// One vertex: the client value, its edge lists, transient scratch,
/// and a visitation color. The graph owns every vertex record for the
/// value's lifetime.
#[derive(Debug)]
pub struct VertexRecord<V> {
    /// `None` once destroyed (see [`EdgeRecord::label`] for why this
    /// replaces a magic-word guard).
    pub value: Option<V>,
    pub outgoing: Vec<EdgeSlot>,
    /// Cross-lane references: `(source_lane, edge_slot)` into the
    /// source's edge arena, since incident edges may be owned by a
    /// foreign lane (`graph::Graph`'s Design Notes).
    pub incident: Vec<(crate::ids::LaneId, EdgeSlot)>,
    pub color: Color,
    pub scratch: Scratch,
}

impl<V> VertexRecord<V> {
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            value: Some(value),
            outgoing: Vec::new(),
            incident: Vec::new(),
            color: Color::Pending,
            scratch: None,
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<V> {
        self.value.take()
    }
}
