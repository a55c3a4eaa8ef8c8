//! Method and method-no-exception coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use mosa_goal::{CoverageGoal, Criterion};

/// Attaches each method goal below every spine goal of its method
///
/// Any branch of the method being reached means the method was entered, so
/// the goal is probed as soon as the first of them is covered. A method
/// with no spine goal makes the goal a root.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodAdapter;

impl CriterionAdapter for MethodAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::Method
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            if !matches!(goal, CoverageGoal::Method { .. }) {
                wrong_kind(self.criterion(), goal);
            }
            attach_to_method_spine(goal, ctx);
        }
    }
}

/// Same placement as [`MethodAdapter`] for goals that also require a normal return
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNoExceptionAdapter;

impl CriterionAdapter for MethodNoExceptionAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::MethodNoException
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            if !matches!(goal, CoverageGoal::MethodNoException { .. }) {
                wrong_kind(self.criterion(), goal);
            }
            attach_to_method_spine(goal, ctx);
        }
    }
}

fn attach_to_method_spine(goal: &CoverageGoal, ctx: &mut AttachContext<'_>) {
    let graph = ctx.graph();
    let mut attached = false;
    for parent in graph.branch_goals_of(goal.method()) {
        attached |= ctx.attach_to(parent, goal);
    }
    if !attached {
        ctx.add_root(goal);
    }
}
