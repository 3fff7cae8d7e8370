//! `mapreduced` — parallel fold over every vertex returning a client
//! value; no graph mutation.

use crate::error::{ErrorChannel, GraphError, Killswitch};
use crate::graph::Graph;
use crate::kernel::{map_lanes, EngineConfig, Phase};
use crate::lane::Lane;
use crate::plan::MapReducePlan;

pub fn mapreduced<V, E, A, O>(graph: &Graph<V, E>, plan: MapReducePlan<V, A, O>, killswitch: &Killswitch, cfg: EngineConfig) -> anyhow::Result<O>
where
    V: Send + Sync,
    E: Send + Sync,
    A: Send,
{
    let mut tracker = cfg.phase_tracker();
    let errors = ErrorChannel::new();
    cfg.validate(&errors)?;
    if killswitch.is_tripped() {
        errors.set(GraphError::Cancelled);
        tracker.fail(&errors, killswitch);
        anyhow::bail!(GraphError::Cancelled);
    }

    if graph.vertex_count() == 0 {
        tracker.enter(Phase::Done);
        return Ok(plan.reduce.vacuous_case());
    }

    tracker.enter(Phase::Mapping);
    tracker.record("vertices_visited", graph.vertex_count());
    let per_lane: Vec<A> = map_lanes(graph, cfg.mode, |lane| lane_fold(lane, &plan));

    tracker.enter(Phase::Reducing);
    let mut iter = per_lane.into_iter();
    let mut acc = iter.next().expect("at least one lane");
    for other in iter {
        acc = plan.reduce.merge(acc, other);
    }
    let result = plan.reduce.finish(acc);
    tracker.enter(Phase::Done);
    Ok(result)
}

fn lane_fold<V, E, A, O>(lane: &Lane<V, E>, plan: &MapReducePlan<V, A, O>) -> A {
    let mut acc = plan.reduce.create();
    for rec in &lane.vertices {
        if let Some(v) = rec.value.as_ref() {
            let mapped = (plan.map)(v);
            acc = plan.reduce.add_input(acc, &mapped);
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiners::Sum;
    use crate::connector::{ConnectCtx, Connector};
    use crate::graph::{NoopDestructor, VertexOrdering};
    use crate::ops::build::built;
    use crate::plan::BuildPlan;
    use std::sync::Arc;

    struct IdOrd;
    impl VertexOrdering<u32> for IdOrd {
        fn hash(&self, v: &u32) -> u64 {
            *v as u64
        }
        fn equal(&self, a: &u32, b: &u32) -> anyhow::Result<bool> {
            Ok(a == b)
        }
    }

    struct Chain3;
    impl Connector<u32, u32> for Chain3 {
        fn connect(&self, vertex: &u32, ctx: &mut ConnectCtx<'_, u32, u32>) -> anyhow::Result<()> {
            if *vertex < 2 {
                ctx.connect(1, vertex + 1);
            }
            Ok(())
        }
    }

    #[test]
    fn sums_ones_to_vertex_count() {
        let plan = BuildPlan {
            seeds: vec![0u32],
            connector: Arc::new(Chain3),
            subconnector: None,
            vertex_ord: Arc::new(IdOrd),
            edge_ord: None,
            vertex_destructor: Arc::new(NoopDestructor),
            edge_destructor: Arc::new(NoopDestructor),
        };
        let g = built(plan, &Killswitch::new(), EngineConfig::sequential(2)).unwrap();
        assert_eq!(g.vertex_count(), 3);

        let mr = MapReducePlan::<u32, u64, u64> {
            map: Arc::new(|_v: &u32| 1u64),
            reduce: Arc::new(Sum),
        };
        let total = mapreduced(&g, mr, &Killswitch::new(), EngineConfig::sequential(2)).unwrap();
        assert_eq!(total, 3);
    }
}
