//! Assertion functions for testing graph-shaped outputs.

use crate::graph::Graph;

/// Assert a graph has exactly `expected` live vertices.
///
/// # Panics
///
/// Panics with the actual and expected counts if they differ.
pub fn assert_vertex_count<V, E>(graph: &Graph<V, E>, expected: u64) {
    let actual = graph.vertex_count();
    assert_eq!(actual, expected, "vertex count mismatch:\n  expected: {expected}\n  actual:   {actual}");
}

/// Assert a graph has exactly `expected` live edges.
///
/// # Panics
///
/// Panics with the actual and expected counts if they differ.
pub fn assert_edge_count<V, E>(graph: &Graph<V, E>, expected: u64) {
    let actual = graph.edge_count();
    assert_eq!(actual, expected, "edge count mismatch:\n  expected: {expected}\n  actual:   {actual}");
}

/// A degree-sequence fingerprint: each live vertex's `(out_degree,
/// in_degree)`, sorted. Two isomorphic graphs always produce the same
/// fingerprint; the converse isn't guaranteed (this is not a full
/// isomorphism test), which is enough for round-trip laws like
/// fabricate/mutate/filter no-ops preserving shape.
fn degree_fingerprint<V, E>(graph: &Graph<V, E>) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for lane in &graph.lanes {
        for rec in &lane.vertices {
            if rec.is_live() {
                out.push((rec.outgoing.len(), rec.incident.len()));
            }
        }
    }
    out.sort_unstable();
    out
}

/// Assert that two graphs share a degree-sequence fingerprint: the same
/// vertex and edge counts, and the same multiset of `(out_degree,
/// in_degree)` pairs. Used for round-trip laws where a transformation
/// is expected to preserve topology exactly.
///
/// # Panics
///
/// Panics if the fingerprints differ.
pub fn assert_isomorphic<V, E, V2, E2>(actual: &Graph<V, E>, expected: &Graph<V2, E2>) {
    let actual_fp = degree_fingerprint(actual);
    let expected_fp = degree_fingerprint(expected);
    assert_eq!(
        actual_fp, expected_fp,
        "graphs are not isomorphic by degree fingerprint:\n  expected: {expected_fp:?}\n  actual:   {actual_fp:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{chain, hypercube};

    #[test]
    fn assert_vertex_count_passes_on_match() {
        let g = chain(3, 1).unwrap();
        assert_vertex_count(&g, 3);
        assert_edge_count(&g, 2);
    }

    #[test]
    fn assert_isomorphic_passes_for_a_graph_against_itself_shaped_copy() {
        let a = hypercube(3, 1).unwrap();
        let b = hypercube(3, 2).unwrap();
        assert_isomorphic(&a, &b);
    }

    #[test]
    #[should_panic(expected = "vertex count mismatch")]
    fn assert_vertex_count_panics_on_mismatch() {
        let g = chain(3, 1).unwrap();
        assert_vertex_count(&g, 99);
    }
}
