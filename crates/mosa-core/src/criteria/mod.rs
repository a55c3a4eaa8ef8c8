//! Criterion adapters
//!
//! Every goal kind other than branch outcomes hangs off the branch
//! dependency graph. A [`CriterionAdapter`] decides, for the goals of its
//! criterion, which branch-spine goals they depend on; the result lands in
//! the [`Dependents`] side-table or, for goals reachable without any branch
//! decision, in the root set.

mod contextual;
mod io;
mod method;
mod mutation;
mod registry;
mod statement;
mod try_catch;

pub use contextual::ContextualBranchAdapter;
pub use io::{InputAdapter, OutputAdapter};
pub use method::{MethodAdapter, MethodNoExceptionAdapter};
pub use mutation::{StrongMutationAdapter, WeakMutationAdapter};
pub use registry::CriterionRegistry;
pub use statement::{LineAdapter, StatementAdapter};
pub use try_catch::TryCatchAdapter;

use indexmap::{IndexMap, IndexSet};
use mosa_goal::{BranchOutcome, ControlFlowFacts, CoverageGoal, Criterion};
use mosa_graph::DependencyGraph;

/// Attaches the goals of one criterion to the branch dependency graph
///
/// Adapters are handed only goals of their own criterion; receiving any
/// other kind is a goal-set construction bug and panics.
pub trait CriterionAdapter: Send + Sync {
    /// Criterion whose goals this adapter attaches
    fn criterion(&self) -> Criterion;

    /// Root or attach every goal in `goals`
    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>);
}

/// Spine goal -> goals to probe once it is covered
///
/// Kept apart from the graph edges so several criteria can share one
/// branch spine without changing its structure.
#[derive(Debug, Clone, Default)]
pub struct Dependents {
    by_parent: IndexMap<CoverageGoal, IndexSet<CoverageGoal>>,
    attached: IndexSet<CoverageGoal>,
}

impl Dependents {
    /// Record `child` as a dependent of `parent`; returns whether it was new
    pub fn insert(&mut self, parent: &CoverageGoal, child: &CoverageGoal) -> bool {
        self.attached.insert(child.clone());
        self.by_parent
            .entry(parent.clone())
            .or_default()
            .insert(child.clone())
    }

    /// Dependents of `parent`
    pub fn of<'a>(&'a self, parent: &CoverageGoal) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.by_parent.get(parent).into_iter().flatten()
    }

    /// Whether `goal` depends on at least one spine goal
    #[inline]
    #[must_use]
    pub fn is_attached(&self, goal: &CoverageGoal) -> bool {
        self.attached.contains(goal)
    }

    /// Number of parent -> dependent links
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_parent.values().map(IndexSet::len).sum()
    }

    /// Whether no link exists
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }
}

/// What an adapter may read and write while attaching goals
pub struct AttachContext<'a> {
    graph: &'a DependencyGraph,
    facts: &'a dyn ControlFlowFacts,
    dependents: &'a mut Dependents,
    roots: &'a mut IndexSet<CoverageGoal>,
}

impl<'a> AttachContext<'a> {
    /// Create a context over shared build state
    pub fn new(
        graph: &'a DependencyGraph,
        facts: &'a dyn ControlFlowFacts,
        dependents: &'a mut Dependents,
        roots: &'a mut IndexSet<CoverageGoal>,
    ) -> Self {
        Self {
            graph,
            facts,
            dependents,
            roots,
        }
    }

    /// Branch dependency graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &'a DependencyGraph {
        self.graph
    }

    /// Analysis facts
    #[inline]
    #[must_use]
    pub fn facts(&self) -> &'a dyn ControlFlowFacts {
        self.facts
    }

    /// Make `goal` a live objective from the start
    pub fn add_root(&mut self, goal: &CoverageGoal) {
        self.roots.insert(goal.clone());
    }

    /// Whether `goal` is already a root
    #[inline]
    #[must_use]
    pub fn is_root(&self, goal: &CoverageGoal) -> bool {
        self.roots.contains(goal)
    }

    /// Attach `goal` below a spine goal; `false` when `parent` is not in the graph
    pub fn attach_to(&mut self, parent: &CoverageGoal, goal: &CoverageGoal) -> bool {
        if !self.graph.contains(parent) {
            return false;
        }
        self.dependents.insert(parent, goal);
        true
    }

    /// Attach `goal` below the branch goal of every outcome; returns how many links were made
    pub fn attach_to_outcomes(&mut self, outcomes: &[BranchOutcome], goal: &CoverageGoal) -> usize {
        let graph = self.graph;
        outcomes
            .iter()
            .filter_map(|&o| graph.branch_goal(o))
            .filter(|parent| self.attach_to(parent, goal))
            .count()
    }

    /// Root `goal` when `outcomes` is empty, otherwise attach it below them
    pub fn root_or_attach(&mut self, outcomes: &[BranchOutcome], goal: &CoverageGoal) {
        if outcomes.is_empty() {
            self.add_root(goal);
        } else {
            self.attach_to_outcomes(outcomes, goal);
        }
    }

    /// Whether `goal` has been rooted or attached
    #[must_use]
    pub fn is_placed(&self, goal: &CoverageGoal) -> bool {
        self.roots.contains(goal) || self.dependents.is_attached(goal)
    }
}

/// Panic on a goal of the wrong kind
#[cold]
#[track_caller]
pub(crate) fn wrong_kind(adapter: Criterion, goal: &CoverageGoal) -> ! {
    panic!("{adapter} adapter received {} goal: {goal}", goal.criterion())
}
