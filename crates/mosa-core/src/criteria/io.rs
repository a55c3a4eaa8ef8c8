//! Input and output value coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use indexmap::IndexSet;
use mosa_goal::{BranchOutcome, CoverageGoal, Criterion, MethodRef};

/// Attaches input goals below the block dependencies of their method
#[derive(Debug, Clone, Copy, Default)]
pub struct InputAdapter;

impl CriterionAdapter for InputAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::Input
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let CoverageGoal::Input { method, .. } = goal else {
                wrong_kind(self.criterion(), goal);
            };
            attach_to_method_blocks(method, goal, ctx);
        }
    }
}

/// Attaches output goals below the block dependencies of their method
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputAdapter;

impl CriterionAdapter for OutputAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::Output
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let CoverageGoal::Output { method, .. } = goal else {
                wrong_kind(self.criterion(), goal);
            };
            attach_to_method_blocks(method, goal, ctx);
        }
    }
}

/// Root the goal if any block of the method is unguarded (or the method
/// is unknown), and attach it below every guard of every block.
fn attach_to_method_blocks(method: &MethodRef, goal: &CoverageGoal, ctx: &mut AttachContext<'_>) {
    let facts = ctx.facts();
    let Some(instructions) = facts.instructions_in_method(method) else {
        ctx.add_root(goal);
        return;
    };

    let blocks: IndexSet<_> = instructions
        .into_iter()
        .filter_map(|insn| facts.basic_block_of(insn))
        .collect();

    let mut guards: IndexSet<BranchOutcome> = IndexSet::new();
    for block in blocks {
        let deps = facts.block_control_dependencies(block);
        if deps.is_empty() {
            ctx.add_root(goal);
        }
        guards.extend(deps);
    }

    let guards: Vec<BranchOutcome> = guards.into_iter().collect();
    ctx.attach_to_outcomes(&guards, goal);
}
