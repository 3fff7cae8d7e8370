//! Per-lane vertex store, connection inbox, and the lane-assignment hash mixer.

use crate::ids::{LaneId, VertexId};
use crate::record::{Color, EdgeRecord, VertexRecord};
use std::collections::HashMap;

/// Spreads a client hash across the address range before reducing it
/// mod the lane count, so low-entropy client hashes (sequential
/// integers, pointer-derived values) don't pile every vertex into one
/// lane.
#[must_use]
pub fn spread_hash(h: u64) -> u64 {
    let half = u64::BITS / 2;
    let rotated = h.rotate_left(half);
    rotated ^ (h >> (half / 2))
}

#[must_use]
pub fn lane_of(h: u64, lanes: usize) -> LaneId {
    debug_assert!(lanes > 0);
    LaneId((spread_hash(h) as usize) % lanes)
}

/// A declaration routed to the lane that will own the terminus value:
/// "insert this vertex if absent, and remember that `source` needs an
/// edge record pointing here." The label itself never travels with
/// this message — it already lives in the source lane's edge arena at
/// `back_edge`, never cloned.
pub struct ResolveTerminus<V> {
    pub value: V,
    pub source: VertexId,
    /// Slot in the source lane's edge arena whose `terminus` field is
    /// still a placeholder until this message is answered.
    pub back_edge: crate::record::EdgeSlot,
}

/// Reply routed back to the lane owning `back_edge`, filling in the
/// edge's resolved terminus (and triggering destruction of the
/// duplicate value the target lane found, if any — handled on the
/// target side before the reply is sent).
pub struct FinalizeEdge {
    pub back_edge: crate::record::EdgeSlot,
    pub terminus: VertexId,
}

pub enum LaneMessage<V> {
    ResolveTerminus(ResolveTerminus<V>),
    FinalizeEdge(FinalizeEdge),
}

/// One partition of the vertex store, owned by exactly one worker
/// thread for the duration of a phase. Bucketed by
/// client hash (a stand-in for an open-addressed table: the `buckets`
/// map plays the role of probing, resolved by the client's equality
/// callback on collision).
pub struct Lane<V, E> {
    pub id: LaneId,
    pub vertices: Vec<VertexRecord<V>>,
    /// Edges whose source lives in this lane; this lane is their
    /// sole arena owner. Edges are referenced by index, never by
    /// owning pointer.
    pub edges: Vec<EdgeRecord<E>>,
    buckets: HashMap<u64, Vec<usize>>,
    pub to_visit: Vec<usize>,
    pub tombstones: Vec<usize>,
}

impl<V, E> Lane<V, E> {
    #[must_use]
    pub fn new(id: LaneId) -> Self {
        Self {
            id,
            vertices: Vec::new(),
            edges: Vec::new(),
            buckets: HashMap::new(),
            to_visit: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    #[must_use]
    pub fn live_vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_live()).count()
    }

    /// Insert-if-absent using the client's hash+equality callbacks.
    /// Returns `(slot, duplicate)` — `duplicate` is `Some(value)`,
    /// handed back to the caller to destroy, when an existing record
    /// already satisfied equality.
    pub fn insert_if_absent(
        &mut self,
        value: V,
        hash: u64,
        equal: &mut dyn FnMut(&V, &V) -> anyhow::Result<bool>,
    ) -> anyhow::Result<(usize, Option<V>)> {
        if let Some(candidates) = self.buckets.get(&hash) {
            for &slot in candidates {
                let rec = &self.vertices[slot];
                if let Some(existing) = rec.value.as_ref() {
                    if equal(existing, &value)? {
                        return Ok((slot, Some(value)));
                    }
                }
            }
        }
        let slot = self.vertices.len();
        self.vertices.push(VertexRecord::new(value));
        self.buckets.entry(hash).or_default().push(slot);
        Ok((slot, None))
    }

    /// Allocate an edge record with a placeholder terminus, returning
    /// its slot so the caller can attach it to a vertex's outgoing
    /// list immediately (preserving connector-call order) and fill in
    /// the real terminus once it's resolved.
    pub fn alloc_placeholder_edge(&mut self, source: VertexId, label: E, placeholder: VertexId) -> usize {
        let slot = self.edges.len();
        self.edges.push(EdgeRecord::new(source, label, placeholder));
        slot
    }

    /// Rebuilds the hash index from scratch. Operations that rewrite
    /// the vertex arena directly (fabricate, mutate, merge, stretch,
    /// split) bypass `insert_if_absent` and must call this once at the
    /// following barrier so subsequent lookups still work — resizing
    /// or reindexing only ever happens at a barrier.
    pub fn rebuild_index(&mut self, hash_of: impl Fn(&V) -> u64) {
        self.buckets.clear();
        for (slot, v) in self.vertices.iter().enumerate() {
            if let Some(val) = v.value.as_ref() {
                self.buckets.entry(hash_of(val)).or_default().push(slot);
            }
        }
    }

    pub fn mark_visited(&mut self, slot: usize) {
        self.vertices[slot].color = Color::Visited;
    }

    /// Tombstone a vertex: it stays in the arena (other records still
    /// reference it by index) but is no longer live.
    pub fn tombstone(&mut self, slot: usize) {
        self.vertices[slot].color = Color::Dead;
        self.tombstones.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_hash_separates_sequential_keys() {
        let lanes = 8;
        let assigned: Vec<_> = (0u64..8).map(|k| lane_of(k, lanes).index()).collect();
        let distinct = assigned.iter().collect::<std::collections::HashSet<_>>().len();
        assert!(distinct > 1, "sequential keys should not collapse to one lane");
    }

    #[test]
    fn insert_if_absent_dedupes_by_equality() {
        let mut lane = Lane::<i32, ()>::new(LaneId(0));
        let (slot_a, dup_a) = lane.insert_if_absent(5, 5, &mut |a, b| Ok(a == b)).unwrap();
        let (slot_b, dup_b) = lane.insert_if_absent(5, 5, &mut |a, b| Ok(a == b)).unwrap();
        assert!(dup_a.is_none());
        assert_eq!(dup_b, Some(5));
        assert_eq!(slot_a, slot_b);
    }
}
