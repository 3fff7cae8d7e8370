//! Associative accumulator traits used by REDUCE-phase operations
//! (merge, map-reduce, induce, postpone's pairwise combiner).
//!
//! An accumulator-based combiner that can optionally be built straight
//! from a prior grouping step instead of folding one element at a
//! time.

/// A value reducible by REDUCE: the marker bound (`Send + Sync + Clone
/// + 'static`) every combine-eligible type satisfies.
pub trait ReduceValue: Send + Sync + Clone + 'static {}
impl<T: Send + Sync + Clone + 'static> ReduceValue for T {}

/// An associative, commutative fold with an explicit vacuous case —
/// the value used by a reduction when its input set is empty.
/// `create`/`add_input`/`merge`/`finish` shape a
/// two-type-parameter combiner (`V` the element type, `A` the
/// accumulator, `O` the finished output).
pub trait ReduceFn<V, A, O>: Send + Sync {
    fn create(&self) -> A;
    fn add_input(&self, acc: A, input: &V) -> A;
    fn merge(&self, a: A, b: A) -> A;
    fn finish(&self, acc: A) -> O;

    /// The vacuous case: `finish(create())`, unless a reducer needs a
    /// cheaper shortcut.
    fn vacuous_case(&self) -> O {
        self.finish(self.create())
    }
}

/// A `ReduceFn` that can also build its accumulator directly from an
/// already-grouped slice, skipping the per-element `add_input` loop —
/// the "lifted" path exploited after CLASSIFY groups vertices by
/// equivalence key, ahead of merge's fold.
pub trait LiftableReduceFn<V, A, O>: ReduceFn<V, A, O> {
    fn build_from_group(&self, values: &[V]) -> A {
        values.iter().fold(self.create(), |acc, v| self.add_input(acc, v))
    }
}

/// A plain binary reducer lifted to the `ReduceFn` shape: no
/// accumulator distinct from the value type, useful for postpone's
/// pairwise combiner and compose's label-merge op, which only need a
/// binary function and have no vacuous case.
pub struct BinaryOp<F> {
    pub f: F,
}

impl<V, F> ReduceFn<V, V, V> for BinaryOp<F>
where
    V: ReduceValue + Default,
    F: Fn(&V, &V) -> V + Send + Sync,
{
    fn create(&self) -> V {
        V::default()
    }

    fn add_input(&self, acc: V, input: &V) -> V {
        (self.f)(&acc, input)
    }

    fn merge(&self, a: V, b: V) -> V {
        (self.f)(&a, &b)
    }

    fn finish(&self, acc: V) -> V {
        acc
    }
}
