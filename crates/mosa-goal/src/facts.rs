//! Read-only control-flow facts about the unit under test
//!
//! The control-flow / data-flow analysis that turns a compiled unit into
//! basic blocks and control dependencies lives outside this workspace.
//! [`ControlFlowFacts`] is the seam it is consumed through: the dependency
//! graph builder and the criterion adapters query it once, at
//! initialization, and never mutate it.

use crate::id::{BlockId, BranchId, BranchOutcome, CallContext, InstructionId, MethodRef, MutationId};

/// Static description of one branch instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch id
    pub id: BranchId,
    /// The conditional jump instruction
    pub instruction: InstructionId,
    /// Owning method
    pub method: MethodRef,
}

/// Analysis facts consumed at graph-build and adapter-build time
///
/// Implementations must be deterministic: the same question always gets
/// the same answer during one search run.
pub trait ControlFlowFacts {
    /// Static description of a branch; `None` for branches the analysis
    /// does not know (synthetic branches)
    fn branch(&self, branch: BranchId) -> Option<BranchInfo>;

    /// Whether the branch only exists because of instrumentation
    fn is_instrumentation_only(&self, branch: BranchId) -> bool;

    /// Branch outcomes that must occur for control to reach the instruction
    fn control_dependencies(&self, instruction: InstructionId) -> Vec<BranchOutcome>;

    /// Control dependencies shared by every instruction of the block
    fn block_control_dependencies(&self, block: BlockId) -> Vec<BranchOutcome>;

    /// Whether the instruction is reached whenever its method is entered
    fn is_root_dependent(&self, instruction: InstructionId) -> bool;

    /// Basic block containing the instruction
    fn basic_block_of(&self, instruction: InstructionId) -> Option<BlockId>;

    /// Control-flow predecessors of a block
    fn predecessor_blocks(&self, block: BlockId) -> Vec<BlockId>;

    /// Instructions of a block, in order
    fn instructions_in(&self, block: BlockId) -> Vec<InstructionId>;

    /// Branch whose conditional jump is the given instruction
    fn branch_at(&self, instruction: InstructionId) -> Option<BranchId>;

    /// All instructions of a method; `None` when the method was not analysed
    fn instructions_in_method(&self, method: &MethodRef) -> Option<Vec<InstructionId>>;

    /// First instruction compiled from a source line of a method
    fn first_instruction_at_line(&self, method: &MethodRef, line: u32) -> Option<InstructionId>;

    /// Branch outcomes guarding a mutated instruction
    fn mutation_control_dependencies(&self, mutation: MutationId) -> Vec<BranchOutcome>;

    /// Concrete calling contexts through which the method can be entered
    fn method_entry_contexts(&self, method: &MethodRef) -> Vec<CallContext>;

    /// Branch contained in the block, if any
    ///
    /// A block holds at most one conditional jump, as its last instruction.
    fn branch_in_block(&self, block: BlockId) -> Option<BranchId> {
        self.instructions_in(block)
            .into_iter()
            .rev()
            .find_map(|insn| self.branch_at(insn))
    }
}
