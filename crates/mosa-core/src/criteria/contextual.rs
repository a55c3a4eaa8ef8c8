//! Context-sensitive branch coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use indexmap::IndexSet;
use mosa_goal::{CoverageGoal, Criterion};

/// Attaches contextual branch goals below the spine goal they refine
///
/// For every spine goal and every calling context through which its method
/// can be entered, the matching contextual goal (if it is a target of this
/// run) becomes a dependent of that spine goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextualBranchAdapter;

impl CriterionAdapter for ContextualBranchAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::ContextualBranch
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        let mut targets: IndexSet<&CoverageGoal> = IndexSet::with_capacity(goals.len());
        for goal in goals {
            if !matches!(goal, CoverageGoal::ContextualBranch { .. }) {
                wrong_kind(self.criterion(), goal);
            }
            targets.insert(goal);
        }

        let graph = ctx.graph();
        let facts = ctx.facts();
        for spine in graph.branch_goals() {
            let outcome = spine.as_branch().map(|b| b.outcome);
            for context in facts.method_entry_contexts(spine.method()) {
                let candidate = CoverageGoal::contextual(spine.method().clone(), outcome, context);
                if targets.contains(&candidate) {
                    ctx.attach_to(spine, &candidate);
                }
            }
        }
    }
}
