//! Transformation plans: immutable value objects naming an operation
//! and carrying every callback it needs.
//!
//! One struct per operation. A plan is consumed once per invocation.

use crate::combine::ReduceFn;
use crate::connector::{Connector, Subconnector};
use crate::graph::{Destructor, EdgeOrdering, VertexOrdering};
use std::sync::Arc;

/// Directional restriction on a traversal. Accepted by mutate,
/// induce, and compose.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zone {
    pub backwards: bool,
    pub offset: usize,
    pub local_first: bool,
    pub remote_first: bool,
}

/// Per-side property computation used by PROP: `map` combines the
/// vertex value with the two reductions (incident, outgoing) into a
/// property value; `reduction`/`vacuous_case` fold one side's edges.
pub struct PropSpec<V, E, P, R> {
    pub reduction: Option<Arc<dyn ReduceFn<E, R, R> + Send + Sync>>,
    pub vacuous_case: Option<Arc<dyn Fn() -> R + Send + Sync>>,
    pub map: Arc<dyn Fn(&V, Option<&R>, Option<&R>) -> P + Send + Sync>,
}

/// `built(plan, seed, killswitch, lanes, err) -> graph`.
/// `seeds` may hold more than one value for an endogenous build, where
/// every declared terminus is its own potential root.
pub struct BuildPlan<V, E> {
    pub seeds: Vec<V>,
    pub connector: Arc<dyn Connector<V, E>>,
    pub subconnector: Option<Arc<dyn Subconnector<V, E>>>,
    pub vertex_ord: Arc<dyn VertexOrdering<V>>,
    pub edge_ord: Option<Arc<dyn EdgeOrdering<E>>>,
    pub vertex_destructor: Arc<dyn Destructor<V>>,
    pub edge_destructor: Arc<dyn Destructor<E>>,
}

/// `fabricated`: structural copy, mapping each vertex/edge value
/// through client callbacks while preserving topology.
pub struct FabricatePlan<V, E> {
    pub vertex_copy: Arc<dyn Fn(&V) -> V + Send + Sync>,
    pub edge_copy: Arc<dyn Fn(&E) -> E + Send + Sync>,
}

/// `mutated`: in-place vertex/edge rewriting.
pub struct MutatePlan<V, E> {
    pub v_op: Arc<dyn Fn(&V) -> V + Send + Sync>,
    pub e_op: Arc<dyn Fn(&E) -> E + Send + Sync>,
    pub zone: Zone,
}

/// `filtered`: vertex deletion with edge pruning. `predicate(v) ==
/// true` keeps the vertex; a predicate that always returns true is a
/// no-op.
pub struct FilterPlan<V> {
    pub predicate: Arc<dyn Fn(&V) -> bool + Send + Sync>,
}

/// `composed`: edge rerouting. `qpred` sees both endpoints' properties
/// and both edge labels; `qop` produces the new label.
pub struct ComposePlan<V, E, P> {
    pub property: Arc<dyn Fn(&V) -> P + Send + Sync>,
    pub qpred: Arc<dyn Fn(&P, &E, &P, &E) -> bool + Send + Sync>,
    pub qop: Arc<dyn Fn(&P, &E, &P, &E) -> E + Send + Sync>,
    pub destructive: bool,
    pub co_fix: bool,
    pub zone: Zone,
}

/// `merged`: vertex fusion by equivalence class.
pub struct MergePlan<V, E, K, P> {
    pub property: Arc<dyn Fn(&V) -> P + Send + Sync>,
    pub classifier: Arc<dyn Fn(&P) -> K + Send + Sync>,
    pub fuse: Arc<dyn Fn(&V) -> V + Send + Sync>,
    pub reduce: Arc<dyn ReduceFn<V, V, V> + Send + Sync>,
    pub pruner: Option<Arc<dyn Fn(bool, &E) -> bool + Send + Sync>>,
}

/// `deduplicated`: merge with an identity classifier key and an
/// optional edge-equality callback deciding whether two otherwise
/// distinct edges between the same pair coalesce too (DESIGN.md Open
/// Question 1).
pub struct DeduplicatePlan<V, E> {
    pub reduce: Arc<dyn ReduceFn<V, V, V> + Send + Sync>,
    pub equal_edges: Option<Arc<dyn Fn(&E, &E) -> anyhow::Result<bool> + Send + Sync>>,
}

/// `stretched`: new-vertex insertion along selected edges.
pub struct StretchPlan<V, E, P> {
    pub property: Arc<dyn Fn(&V) -> P + Send + Sync>,
    pub expander: Arc<dyn Fn(&P, &E, &P) -> bool + Send + Sync>,
    pub interpose: Arc<dyn Fn(&E) -> (E, V, E) + Send + Sync>,
}

/// `mapreduced`: parallel fold returning a client value, no graph
/// mutation.
pub struct MapReducePlan<V, A, O> {
    pub map: Arc<dyn Fn(&V) -> A + Send + Sync>,
    pub reduce: Arc<dyn ReduceFn<A, A, O> + Send + Sync>,
}

/// `induced`: stage fold from every sink back to the initial vertex.
pub struct InducePlan<V, E, R> {
    pub map: Arc<dyn Fn(&V, &E, &R) -> R + Send + Sync>,
    pub reduce: Arc<dyn ReduceFn<R, R, R> + Send + Sync>,
    pub vacuous_case: Arc<dyn Fn() -> R + Send + Sync>,
    pub zone: Zone,
    pub co_fix: bool,
}

/// `postponed`: pairwise edge combination followed by dropping the
/// postponable edges.
pub struct PostponePlan<E> {
    pub postponable: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    pub pair_predicate: Arc<dyn Fn(&E, &E) -> bool + Send + Sync>,
    pub combine: Arc<dyn Fn(&E, &E) -> E + Send + Sync>,
}

/// `crossed`: pairwise product of two graphs' vertices, connected
/// wherever both sides' edges share an edge equivalence.
pub struct CrossPlan<E> {
    pub edge_equal: Arc<dyn Fn(&E, &E) -> bool + Send + Sync>,
    pub product_label: Arc<dyn Fn(&E, &E) -> E + Send + Sync>,
}

/// `split`: vertex bisection.
pub struct SplitPlan<V, E> {
    pub ana: Arc<dyn Fn(&V) -> V + Send + Sync>,
    pub cata: Arc<dyn Fn(&V) -> V + Send + Sync>,
    pub inward_label: Arc<dyn Fn(&V) -> E + Send + Sync>,
    pub outward_label: Arc<dyn Fn(&V) -> E + Send + Sync>,
}
