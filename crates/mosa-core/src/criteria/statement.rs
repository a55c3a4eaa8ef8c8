//! Statement and line coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use mosa_goal::{BranchOutcome, CoverageGoal, Criterion, InstructionId};
use tracing::debug;

/// Attaches statement goals below the branches guarding their block
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementAdapter;

impl CriterionAdapter for StatementAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::Statement
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let CoverageGoal::Statement { instruction, .. } = goal else {
                wrong_kind(self.criterion(), goal);
            };
            let guards = guarding_outcomes(ctx, *instruction);
            ctx.root_or_attach(&guards, goal);
        }
    }
}

/// Attaches line goals below the control dependencies of the line's first instruction
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAdapter;

impl CriterionAdapter for LineAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::Line
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let CoverageGoal::Line { method, line } = goal else {
                wrong_kind(self.criterion(), goal);
            };
            let Some(insn) = ctx.facts().first_instruction_at_line(method, *line) else {
                debug!(goal = %goal, "line has no instruction");
                continue;
            };
            let deps = if ctx.facts().is_root_dependent(insn) {
                Vec::new()
            } else {
                ctx.facts().control_dependencies(insn)
            };
            ctx.root_or_attach(&deps, goal);
        }
    }
}

/// Branch outcomes guarding the block that holds `insn`
fn guarding_outcomes(ctx: &AttachContext<'_>, insn: InstructionId) -> Vec<BranchOutcome> {
    let facts = ctx.facts();
    if facts.is_root_dependent(insn) {
        return Vec::new();
    }
    match facts.basic_block_of(insn) {
        Some(block) => facts.block_control_dependencies(block),
        None => facts.control_dependencies(insn),
    }
}
