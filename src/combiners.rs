//! Built-in reducers (`Sum`, `Count`, `PickFirst`, `MaxBy`) implementing
//! the `ReduceFn` shape.

use crate::combine::ReduceFn;
use std::ops::Add;

/// Sums a numeric quantity; vacuous case is the additive identity.
pub struct Sum;

impl<V> ReduceFn<V, V, V> for Sum
where
    V: Copy + Send + Sync + 'static + Add<Output = V> + Default,
{
    fn create(&self) -> V {
        V::default()
    }

    fn add_input(&self, acc: V, input: &V) -> V {
        acc + *input
    }

    fn merge(&self, a: V, b: V) -> V {
        a + b
    }

    fn finish(&self, acc: V) -> V {
        acc
    }
}

/// Counts inputs; used by map-reduce's `sums 1 per vertex` idiom for
/// a plain vertex count.
pub struct Count;

impl<V: Send + Sync + 'static> ReduceFn<V, u64, u64> for Count {
    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: u64, _input: &V) -> u64 {
        acc + 1
    }

    fn merge(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn finish(&self, acc: u64) -> u64 {
        acc
    }
}

/// Picks the first input it ever saw, discarding the rest — the
/// `v_reduce(a,b) = a` idiom for a representative-keeps-arbitrary-member
/// merge.
pub struct PickFirst;

impl<V: Clone + Send + Sync + 'static> ReduceFn<V, Option<V>, V> for PickFirst {
    fn create(&self) -> Option<V> {
        None
    }

    fn add_input(&self, acc: Option<V>, input: &V) -> Option<V> {
        acc.or_else(|| Some(input.clone()))
    }

    fn merge(&self, a: Option<V>, b: Option<V>) -> Option<V> {
        a.or(b)
    }

    fn finish(&self, acc: Option<V>) -> V {
        acc.expect("PickFirst.finish called on an empty class")
    }

    fn vacuous_case(&self) -> V {
        panic!("PickFirst has no vacuous case: every class has at least one member")
    }
}

/// Keeps the maximum, by a client-supplied ordering.
pub struct MaxBy<F> {
    pub cmp: F,
}

impl<V, F> ReduceFn<V, Option<V>, Option<V>> for MaxBy<F>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(&V, &V) -> std::cmp::Ordering + Send + Sync,
{
    fn create(&self) -> Option<V> {
        None
    }

    fn add_input(&self, acc: Option<V>, input: &V) -> Option<V> {
        match acc {
            None => Some(input.clone()),
            Some(cur) => {
                if (self.cmp)(input, &cur) == std::cmp::Ordering::Greater {
                    Some(input.clone())
                } else {
                    Some(cur)
                }
            }
        }
    }

    fn merge(&self, a: Option<V>, b: Option<V>) -> Option<V> {
        match (a, b) {
            (None, x) | (x, None) => x,
            (Some(a), Some(b)) => {
                if (self.cmp)(&a, &b) == std::cmp::Ordering::Greater {
                    Some(a)
                } else {
                    Some(b)
                }
            }
        }
    }

    fn finish(&self, acc: Option<V>) -> Option<V> {
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_reduces_associatively() {
        let s = Sum;
        let left = s.add_input(s.add_input(s.create(), &1i64), &2i64);
        let right = s.add_input(s.create(), &3i64);
        assert_eq!(s.finish(s.merge(left, right)), 6);
    }

    #[test]
    fn count_matches_vertex_total() {
        let c = Count;
        let acc = (0..16).fold(c.create(), |acc, i: i32| c.add_input(acc, &i));
        assert_eq!(c.finish(acc), 16);
    }
}
