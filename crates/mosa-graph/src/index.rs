//! Id -> goal lookup tables for trace-driven coverage

use indexmap::IndexMap;
use mosa_goal::{BranchId, ControlFlowFacts, CoverageGoal, MethodRef, MutationId, MutationStrength};

/// Fast-path indexes from trace identifiers to goals
///
/// Built once alongside the dependency graph. Branches that only exist
/// because of instrumentation are left out so a trace can never cover them
/// through the fast path.
#[derive(Debug, Clone, Default)]
pub struct GoalIndex {
    true_branches: IndexMap<BranchId, CoverageGoal>,
    false_branches: IndexMap<BranchId, CoverageGoal>,
    branchless: IndexMap<MethodRef, CoverageGoal>,
    weak_mutants: IndexMap<MutationId, CoverageGoal>,
    strong_mutants: IndexMap<MutationId, CoverageGoal>,
}

impl GoalIndex {
    /// Index every goal of a kind the fast path understands
    pub fn build<'g>(goals: impl IntoIterator<Item = &'g CoverageGoal>, facts: &dyn ControlFlowFacts) -> Self {
        let mut index = Self::default();
        for goal in goals {
            index.insert(goal, facts);
        }
        index
    }

    fn insert(&mut self, goal: &CoverageGoal, facts: &dyn ControlFlowFacts) {
        match goal {
            CoverageGoal::Branch(b) => {
                if facts.is_instrumentation_only(b.branch()) {
                    return;
                }
                let table = if b.value() {
                    &mut self.true_branches
                } else {
                    &mut self.false_branches
                };
                table.insert(b.branch(), goal.clone());
            }
            CoverageGoal::BranchlessMethod { method } => {
                self.branchless.insert(method.clone(), goal.clone());
            }
            CoverageGoal::Mutant {
                mutation,
                strength: MutationStrength::Weak,
                ..
            } => {
                self.weak_mutants.insert(*mutation, goal.clone());
            }
            CoverageGoal::Mutant {
                mutation,
                strength: MutationStrength::Strong,
                ..
            } => {
                self.strong_mutants.insert(*mutation, goal.clone());
            }
            _ => {}
        }
    }

    /// Goal for the `true` outcome of a branch
    #[inline]
    #[must_use]
    pub fn true_branch(&self, branch: BranchId) -> Option<&CoverageGoal> {
        self.true_branches.get(&branch)
    }

    /// Goal for the `false` outcome of a branch
    #[inline]
    #[must_use]
    pub fn false_branch(&self, branch: BranchId) -> Option<&CoverageGoal> {
        self.false_branches.get(&branch)
    }

    /// Entry goal of a branchless method
    #[inline]
    #[must_use]
    pub fn branchless(&self, method: &MethodRef) -> Option<&CoverageGoal> {
        self.branchless.get(method)
    }

    /// Weak mutant goal
    #[inline]
    #[must_use]
    pub fn weak_mutant(&self, mutation: MutationId) -> Option<&CoverageGoal> {
        self.weak_mutants.get(&mutation)
    }

    /// Strong mutant goal
    #[inline]
    #[must_use]
    pub fn strong_mutant(&self, mutation: MutationId) -> Option<&CoverageGoal> {
        self.strong_mutants.get(&mutation)
    }

    /// Total number of indexed goals
    #[must_use]
    pub fn len(&self) -> usize {
        self.true_branches.len()
            + self.false_branches.len()
            + self.branchless.len()
            + self.weak_mutants.len()
            + self.strong_mutants.len()
    }

    /// Whether nothing was indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
