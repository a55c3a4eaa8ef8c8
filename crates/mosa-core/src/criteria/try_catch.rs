//! Try/catch coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use mosa_goal::{CoverageGoal, Criterion};

/// Attaches each try/catch goal below the branch goal it wraps
#[derive(Debug, Clone, Copy, Default)]
pub struct TryCatchAdapter;

impl CriterionAdapter for TryCatchAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::TryCatch
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let CoverageGoal::TryCatch(branch) = goal else {
                wrong_kind(self.criterion(), goal);
            };
            ctx.attach_to_outcomes(&[branch.outcome], goal);
        }
    }
}
