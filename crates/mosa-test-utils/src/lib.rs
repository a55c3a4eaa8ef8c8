//! Testing utilities for the MOSA workspace
//!
//! In-memory control-flow fixtures, trace and candidate builders, and a
//! tracing subscriber for test output.

#![allow(missing_docs)]

use mosa_archive::{TestCandidate, TestId};
use mosa_goal::{
    BlockId, BranchId, BranchInfo, BranchOutcome, CallContext, ControlFlowFacts, CoverageGoal,
    ExceptionKind, ExecutionTrace, InstructionId, MethodRef, MutationId, ThrownException,
};
use std::collections::{HashMap, HashSet};
use std::sync::Once;

pub mod scenarios;

/// Install a `fmt` subscriber filtered by `RUST_LOG`; safe to call from every test
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Hand-built control-flow facts
///
/// Blocks, branches and dependencies are declared explicitly; nothing is
/// inferred except the owning method of a block's instructions.
#[derive(Debug, Clone, Default)]
pub struct FixtureFacts {
    branches: HashMap<BranchId, BranchInfo>,
    instrumentation_only: HashSet<BranchId>,
    control_deps: HashMap<InstructionId, Vec<BranchOutcome>>,
    root_dependent: HashSet<InstructionId>,
    block_of: HashMap<InstructionId, BlockId>,
    block_insns: HashMap<BlockId, Vec<InstructionId>>,
    preds: HashMap<BlockId, Vec<BlockId>>,
    branch_at: HashMap<InstructionId, BranchId>,
    method_insns: HashMap<MethodRef, Vec<InstructionId>>,
    lines: HashMap<(MethodRef, u32), InstructionId>,
    mutation_deps: HashMap<MutationId, Vec<BranchOutcome>>,
    contexts: HashMap<MethodRef, Vec<CallContext>>,
}

impl FixtureFacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a basic block of `method` holding `insns`, entered from `preds`
    #[must_use]
    pub fn block(mut self, method: &MethodRef, block: u32, insns: &[u32], preds: &[u32]) -> Self {
        let block = BlockId(block);
        let insns: Vec<InstructionId> = insns.iter().copied().map(InstructionId).collect();
        for &insn in &insns {
            self.block_of.insert(insn, block);
        }
        self.method_insns
            .entry(method.clone())
            .or_default()
            .extend(insns.iter().copied());
        self.block_insns.insert(block, insns);
        self.preds.insert(block, preds.iter().copied().map(BlockId).collect());
        self
    }

    /// Declare branch `branch` whose conditional jump is `insn`
    #[must_use]
    pub fn conditional(mut self, method: &MethodRef, branch: u32, insn: u32) -> Self {
        let id = BranchId(branch);
        let instruction = InstructionId(insn);
        self.branches.insert(
            id,
            BranchInfo {
                id,
                instruction,
                method: method.clone(),
            },
        );
        self.branch_at.insert(instruction, id);
        self
    }

    /// Control dependencies of each listed instruction
    #[must_use]
    pub fn depends(mut self, insns: &[u32], outcomes: &[(u32, bool)]) -> Self {
        let outcomes: Vec<BranchOutcome> = outcomes
            .iter()
            .map(|&(b, v)| BranchOutcome::new(BranchId(b), v))
            .collect();
        for &insn in insns {
            self.control_deps.insert(InstructionId(insn), outcomes.clone());
        }
        self
    }

    #[must_use]
    pub fn root_dependent(mut self, insns: &[u32]) -> Self {
        self.root_dependent.extend(insns.iter().copied().map(InstructionId));
        self
    }

    #[must_use]
    pub fn instrumentation_only(mut self, branch: u32) -> Self {
        self.instrumentation_only.insert(BranchId(branch));
        self
    }

    #[must_use]
    pub fn line(mut self, method: &MethodRef, line: u32, insn: u32) -> Self {
        self.lines.insert((method.clone(), line), InstructionId(insn));
        self
    }

    #[must_use]
    pub fn mutation(mut self, mutation: u32, outcomes: &[(u32, bool)]) -> Self {
        self.mutation_deps.insert(
            MutationId(mutation),
            outcomes
                .iter()
                .map(|&(b, v)| BranchOutcome::new(BranchId(b), v))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn entry_context(mut self, method: &MethodRef, context: CallContext) -> Self {
        self.contexts.entry(method.clone()).or_default().push(context);
        self
    }
}

impl ControlFlowFacts for FixtureFacts {
    fn branch(&self, branch: BranchId) -> Option<BranchInfo> {
        self.branches.get(&branch).cloned()
    }

    fn is_instrumentation_only(&self, branch: BranchId) -> bool {
        self.instrumentation_only.contains(&branch)
    }

    fn control_dependencies(&self, instruction: InstructionId) -> Vec<BranchOutcome> {
        self.control_deps.get(&instruction).cloned().unwrap_or_default()
    }

    fn block_control_dependencies(&self, block: BlockId) -> Vec<BranchOutcome> {
        self.block_insns
            .get(&block)
            .and_then(|insns| insns.first())
            .map(|&insn| self.control_dependencies(insn))
            .unwrap_or_default()
    }

    fn is_root_dependent(&self, instruction: InstructionId) -> bool {
        self.root_dependent.contains(&instruction)
    }

    fn basic_block_of(&self, instruction: InstructionId) -> Option<BlockId> {
        self.block_of.get(&instruction).copied()
    }

    fn predecessor_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.preds.get(&block).cloned().unwrap_or_default()
    }

    fn instructions_in(&self, block: BlockId) -> Vec<InstructionId> {
        self.block_insns.get(&block).cloned().unwrap_or_default()
    }

    fn branch_at(&self, instruction: InstructionId) -> Option<BranchId> {
        self.branch_at.get(&instruction).copied()
    }

    fn instructions_in_method(&self, method: &MethodRef) -> Option<Vec<InstructionId>> {
        self.method_insns.get(method).cloned()
    }

    fn first_instruction_at_line(&self, method: &MethodRef, line: u32) -> Option<InstructionId> {
        self.lines.get(&(method.clone(), line)).copied()
    }

    fn mutation_control_dependencies(&self, mutation: MutationId) -> Vec<BranchOutcome> {
        self.mutation_deps.get(&mutation).cloned().unwrap_or_default()
    }

    fn method_entry_contexts(&self, method: &MethodRef) -> Vec<CallContext> {
        self.contexts.get(method).cloned().unwrap_or_default()
    }
}

/// Fluent [`ExecutionTrace`] construction
#[derive(Debug, Clone, Default)]
pub struct TraceBuilder {
    trace: ExecutionTrace,
}

impl TraceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entered(mut self, method: &MethodRef) -> Self {
        self.trace.record_method_entry(method.clone());
        self
    }

    #[must_use]
    pub fn entered_branchless(mut self, method: &MethodRef) -> Self {
        self.trace.record_branchless_entry(method.clone());
        self
    }

    #[must_use]
    pub fn returned(mut self, method: &MethodRef) -> Self {
        self.trace.record_normal_return(method.clone());
        self
    }

    #[must_use]
    pub fn took(mut self, branch: u32, value: bool) -> Self {
        self.trace.record_outcome(BranchOutcome::new(BranchId(branch), value));
        self
    }

    #[must_use]
    pub fn predicate(mut self, branch: u32, true_distance: f64, false_distance: f64) -> Self {
        self.trace.record_predicate(BranchId(branch), true_distance, false_distance);
        self
    }

    #[must_use]
    pub fn executed(mut self, insns: &[u32]) -> Self {
        for &insn in insns {
            self.trace.record_instruction(InstructionId(insn));
        }
        self
    }

    #[must_use]
    pub fn line(mut self, method: &MethodRef, line: u32) -> Self {
        self.trace.record_line(method.clone(), line);
        self
    }

    #[must_use]
    pub fn touched(mut self, mutation: u32) -> Self {
        self.trace.record_touched_mutant(MutationId(mutation));
        self
    }

    #[must_use]
    pub fn killed(mut self, mutation: u32) -> Self {
        self.trace.record_killed_mutant(MutationId(mutation));
        self
    }

    #[must_use]
    pub fn input(mut self, method: &MethodRef, category: &str) -> Self {
        self.trace.record_input(method.clone(), category);
        self
    }

    #[must_use]
    pub fn output(mut self, method: &MethodRef, category: &str) -> Self {
        self.trace.record_output(method.clone(), category);
        self
    }

    #[must_use]
    pub fn took_in_context(mut self, branch: u32, value: bool, context: CallContext) -> Self {
        self.trace
            .record_context_outcome(BranchOutcome::new(BranchId(branch), value), context);
        self
    }

    #[must_use]
    pub fn entered_in_context(mut self, context: CallContext) -> Self {
        self.trace.record_context_entry(context);
        self
    }

    /// Exception raised by the unit under test at statement `position`
    #[must_use]
    pub fn threw(mut self, position: usize, method: &MethodRef, exception_type: &str, kind: ExceptionKind) -> Self {
        self.trace.record_exception(ThrownException {
            position,
            method: method.clone(),
            exception_type: exception_type.to_string(),
            kind,
            sut_origin: true,
            skip: false,
        });
        self
    }

    #[must_use]
    pub fn exception(mut self, exception: ThrownException) -> Self {
        self.trace.record_exception(exception);
        self
    }

    #[must_use]
    pub fn timed_out(mut self) -> Self {
        self.trace.record_timeout();
        self
    }

    #[must_use]
    pub fn uncaught_exception(mut self) -> Self {
        self.trace.record_uncaught_exception();
        self
    }

    #[must_use]
    pub fn reflection(mut self) -> Self {
        self.trace.record_reflection();
        self
    }

    #[must_use]
    pub fn build(self) -> ExecutionTrace {
        self.trace
    }
}

/// Minimal test candidate: an id and a statement count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureTest {
    pub id: TestId,
    pub size: usize,
}

impl FixtureTest {
    #[must_use]
    pub fn sized(size: usize) -> Self {
        Self {
            id: TestId::new(),
            size,
        }
    }
}

impl TestCandidate for FixtureTest {
    fn id(&self) -> TestId {
        self.id
    }

    fn size(&self) -> usize {
        self.size
    }
}

/// Both outcome goals of a branch
#[must_use]
pub fn branch_pair(method: &MethodRef, branch: u32) -> [CoverageGoal; 2] {
    [
        CoverageGoal::branch_true(method.clone(), BranchId(branch)),
        CoverageGoal::branch_false(method.clone(), BranchId(branch)),
    ]
}
