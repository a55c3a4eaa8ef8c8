//! Criterion adapter registry
//!
//! Provides [`CriterionRegistry`] for looking up the adapter that places the
//! goals of a criterion on the branch spine.

use super::{
    AttachContext, ContextualBranchAdapter, CriterionAdapter, InputAdapter, LineAdapter, MethodAdapter,
    MethodNoExceptionAdapter, OutputAdapter, StatementAdapter, StrongMutationAdapter, TryCatchAdapter,
    WeakMutationAdapter,
};
use indexmap::IndexMap;
use mosa_goal::{CoverageGoal, Criterion};
use std::fmt;
use tracing::debug;

/// Registry of criterion adapters, one per criterion
#[derive(Default)]
pub struct CriterionRegistry {
    adapters: IndexMap<Criterion, Box<dyn CriterionAdapter>>,
}

impl fmt::Debug for CriterionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriterionRegistry")
            .field("criteria", &self.criteria())
            .finish()
    }
}

impl CriterionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in adapters
    ///
    /// Branch goals form the graph itself and exception goals are only
    /// discovered at runtime, so neither criterion has an adapter.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(StatementAdapter);
        registry.register(LineAdapter);
        registry.register(MethodAdapter);
        registry.register(MethodNoExceptionAdapter);
        registry.register(WeakMutationAdapter);
        registry.register(StrongMutationAdapter);
        registry.register(InputAdapter);
        registry.register(OutputAdapter);
        registry.register(TryCatchAdapter);
        registry.register(ContextualBranchAdapter);
        registry
    }

    /// Register an adapter, replacing any previous one for its criterion
    pub fn register(&mut self, adapter: impl CriterionAdapter + 'static) {
        self.adapters.insert(adapter.criterion(), Box::new(adapter));
    }

    /// Check if an adapter exists for `criterion`
    #[inline]
    #[must_use]
    pub fn contains(&self, criterion: Criterion) -> bool {
        self.adapters.contains_key(&criterion)
    }

    /// Adapter for `criterion`
    #[must_use]
    pub fn get(&self, criterion: Criterion) -> Option<&dyn CriterionAdapter> {
        self.adapters.get(&criterion).map(AsRef::as_ref)
    }

    /// Remove the adapter for `criterion`
    pub fn remove(&mut self, criterion: Criterion) -> bool {
        self.adapters.shift_remove(&criterion).is_some()
    }

    /// Criteria with an adapter, in registration order
    #[must_use]
    pub fn criteria(&self) -> Vec<Criterion> {
        self.adapters.keys().copied().collect()
    }

    /// Run the adapter of `criterion` over `goals`
    ///
    /// Goals left neither rooted nor attached afterwards, and all goals of
    /// a criterion without adapter, become roots.
    pub fn attach(&self, criterion: Criterion, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        match self.get(criterion) {
            Some(adapter) => adapter.attach(goals, ctx),
            None => debug!(%criterion, "no adapter registered"),
        }

        let mut degraded = 0usize;
        for goal in goals {
            if !ctx.is_placed(goal) {
                ctx.add_root(goal);
                degraded += 1;
            }
        }
        debug!(%criterion, goals = goals.len(), degraded, "attached goals for criterion");
    }
}
