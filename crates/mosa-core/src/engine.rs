//! Frontier propagation engine
//!
//! Owns the archive, the branch dependency graph and the dependents
//! side-table of one search run. Per evaluated candidate it:
//!
//! 1. skips runs that timed out or raised an uncaught exception
//! 2. walks the current goals, probing the children of every covered goal
//! 3. drops covered goals from the frontier
//! 4. covers branch, branchless-method and mutant goals named by the trace
//! 5. turns exceptions raised by the unit under test into covered goals

use crate::config::SearchConfig;
use crate::criteria::{AttachContext, CriterionRegistry, Dependents};
use crate::error::EngineError;
use indexmap::{IndexMap, IndexSet};
use mosa_archive::{Archive, CoverageUpdate, TestCandidate};
use mosa_goal::{ControlFlowFacts, CoverageGoal, Criterion, ExecutionTrace, WORST_FITNESS};
use mosa_graph::{DependencyGraph, DependencyGraphBuilder, GoalIndex};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What one evaluated candidate did to the goal partitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Fitness of every goal evaluated for this candidate
    pub fitness: IndexMap<CoverageGoal, f64>,
    /// Goals this candidate covered for the first time
    pub newly_covered: Vec<CoverageGoal>,
    /// Goals whose witness this candidate replaced
    pub replaced: Vec<CoverageGoal>,
    /// The run was unusable and left the archive untouched
    pub skipped: bool,
}

impl Evaluation {
    fn unusable_run<'a>(current: impl Iterator<Item = &'a CoverageGoal>) -> Self {
        Self {
            fitness: current.map(|g| (g.clone(), WORST_FITNESS)).collect(),
            skipped: true,
            ..Self::default()
        }
    }

    /// Fitness assigned to `goal`, if it was evaluated
    #[inline]
    #[must_use]
    pub fn fitness_of(&self, goal: &CoverageGoal) -> Option<f64> {
        self.fitness.get(goal).copied()
    }

    /// Whether the archive changed
    #[inline]
    #[must_use]
    pub fn improved(&self) -> bool {
        !self.newly_covered.is_empty() || !self.replaced.is_empty()
    }

    fn record(&mut self, goal: &CoverageGoal, update: CoverageUpdate) {
        match update {
            CoverageUpdate::Installed => self.newly_covered.push(goal.clone()),
            CoverageUpdate::Replaced { .. } => self.replaced.push(goal.clone()),
            CoverageUpdate::Kept => {}
        }
    }
}

/// Goal selection for one search run
#[derive(Debug)]
pub struct FrontierEngine<T> {
    config: SearchConfig,
    graph: Arc<DependencyGraph>,
    dependents: Dependents,
    index: GoalIndex,
    archive: Archive<T>,
}

impl<T: TestCandidate> FrontierEngine<T> {
    /// Build the graph, attach every goal and seed the frontier with the roots
    pub fn initialize(
        goals: impl IntoIterator<Item = CoverageGoal>,
        facts: &dyn ControlFlowFacts,
        config: SearchConfig,
    ) -> Result<Self, EngineError> {
        Self::initialize_with_registry(goals, facts, config, &CriterionRegistry::with_defaults())
    }

    /// [`FrontierEngine::initialize`] with a caller-supplied adapter registry
    pub fn initialize_with_registry(
        goals: impl IntoIterator<Item = CoverageGoal>,
        facts: &dyn ControlFlowFacts,
        config: SearchConfig,
        registry: &CriterionRegistry,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let goals: IndexSet<CoverageGoal> = goals.into_iter().collect();
        for goal in &goals {
            let criterion = goal.criterion();
            // branch goals form the spine every other criterion hangs off
            if criterion != Criterion::Branch && !config.is_enabled(criterion) {
                return Err(EngineError::CriterionNotEnabled {
                    goal: Box::new(goal.clone()),
                    criterion,
                });
            }
        }

        let graph = DependencyGraphBuilder::new(facts).build(&goals);
        let mut roots = graph.roots().clone();
        let mut dependents = Dependents::default();

        let mut by_criterion: IndexMap<Criterion, Vec<CoverageGoal>> = IndexMap::new();
        for goal in goals.iter().filter(|g| !g.is_branch_spine()) {
            by_criterion.entry(goal.criterion()).or_default().push(goal.clone());
        }

        {
            let mut ctx = AttachContext::new(&graph, facts, &mut dependents, &mut roots);
            for (criterion, goals) in &by_criterion {
                registry.attach(*criterion, goals, &mut ctx);
            }
        }

        let index = GoalIndex::build(&goals, facts);
        let archive = Archive::new(goals, roots)?;

        info!(
            goals = archive.goal_count(),
            current = archive.current_goals().len(),
            dependents = dependents.len(),
            indexed = index.len(),
            "initialized frontier engine"
        );

        Ok(Self {
            config,
            graph: Arc::new(graph),
            dependents,
            index,
            archive,
        })
    }

    /// Update the archive and the frontier with one executed candidate
    pub fn on_candidate_evaluated(&mut self, candidate: &T, trace: &ExecutionTrace) -> Result<Evaluation, EngineError> {
        let empty = self.config.skip_empty_traces && trace.covered_line_count() == 0;
        if trace.is_failed_run() || empty {
            debug!(
                test = %candidate.id(),
                timed_out = trace.has_timeout(),
                uncaught_exception = trace.has_uncaught_exception(),
                "skipping unusable run"
            );
            return Ok(Evaluation::unusable_run(self.archive.current_goals().iter()));
        }

        let mut eval = Evaluation::default();
        let mut visited: HashSet<CoverageGoal> = HashSet::new();

        let queue: VecDeque<CoverageGoal> = self.archive.current_goals().iter().cloned().collect();
        self.propagate(queue, &mut visited, candidate, trace, &mut eval)?;

        let fast_covered = self.cover_from_trace(candidate, trace, &mut eval)?;
        if !fast_covered.is_empty() {
            let this = &*self;
            let queue: VecDeque<CoverageGoal> = fast_covered
                .iter()
                .flat_map(|g| this.children(g))
                .filter(|c| !visited.contains(*c))
                .cloned()
                .collect();
            self.propagate(queue, &mut visited, candidate, trace, &mut eval)?;
        }

        self.archive.retain_uncovered_current();

        if self.config.exception_coverage() {
            self.cover_exceptions(candidate, trace, &mut eval)?;
        }

        if cfg!(debug_assertions) || self.config.check_invariants {
            self.archive.check_invariants()?;
        }

        Ok(eval)
    }

    fn children<'a>(&'a self, goal: &CoverageGoal) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.graph
            .structural_children(goal)
            .chain(self.dependents.of(goal))
    }

    /// FIFO worklist: covered goals enqueue their children, missed goals join the frontier
    fn propagate(
        &mut self,
        mut queue: VecDeque<CoverageGoal>,
        visited: &mut HashSet<CoverageGoal>,
        candidate: &T,
        trace: &ExecutionTrace,
        eval: &mut Evaluation,
    ) -> Result<(), EngineError> {
        while let Some(goal) = queue.pop_front() {
            if !visited.insert(goal.clone()) {
                continue;
            }

            let fitness = self.fitness(&goal, trace);
            trace!(goal = %goal, fitness, "visited");
            eval.fitness.insert(goal.clone(), fitness);

            if fitness <= 0.0 {
                let update = self.archive.record_coverage(&goal, candidate)?;
                eval.record(&goal, update);
                queue.extend(self.children(&goal).filter(|c| !visited.contains(*c)).cloned());
            } else {
                self.archive.add_current(&goal);
            }
        }
        Ok(())
    }

    /// Cover the goals the trace names directly; returns the newly covered ones
    fn cover_from_trace(
        &mut self,
        candidate: &T,
        trace: &ExecutionTrace,
        eval: &mut Evaluation,
    ) -> Result<Vec<CoverageGoal>, EngineError> {
        let index = &self.index;
        let mut hits: Vec<CoverageGoal> = Vec::new();
        hits.extend(trace.covered_true_branches().filter_map(|b| index.true_branch(b)).cloned());
        hits.extend(trace.covered_false_branches().filter_map(|b| index.false_branch(b)).cloned());
        hits.extend(trace.covered_branchless_methods().filter_map(|m| index.branchless(m)).cloned());
        if self.config.mutation_criterion() {
            hits.extend(trace.touched_mutants().filter_map(|m| index.weak_mutant(m)).cloned());
            hits.extend(trace.killed_mutants().filter_map(|m| index.strong_mutant(m)).cloned());
        }

        let mut covered = Vec::new();
        for goal in hits {
            if self.archive.is_already_covered(&goal) {
                continue;
            }
            let update = self.archive.record_coverage(&goal, candidate)?;
            eval.record(&goal, update);
            eval.fitness.insert(goal.clone(), 0.0);
            trace!(goal = %goal, "covered from trace");
            covered.push(goal);
        }
        Ok(covered)
    }

    /// Turn exceptions raised by the unit under test into covered goals
    fn cover_exceptions(&mut self, candidate: &T, trace: &ExecutionTrace, eval: &mut Evaluation) -> Result<(), EngineError> {
        if trace.called_reflection() {
            return Ok(());
        }

        let mut seen: IndexSet<CoverageGoal> = IndexSet::new();
        for thrown in trace.thrown_exceptions() {
            if thrown.skip || !thrown.sut_origin {
                continue;
            }
            let method = thrown.attributed_method(self.config.target_class.as_deref());
            seen.insert(CoverageGoal::exception(method, &thrown.exception_type, thrown.kind));
        }

        for goal in seen {
            if !self.archive.goals().contains(&goal) {
                if self.graph.branch_goals_of(goal.method()).next().is_none() {
                    warn!(goal = %goal, "exception raised in method unknown to the dependency graph");
                }
                self.archive.register_goal(goal.clone())?;
            }
            let update = self.archive.record_coverage(&goal, candidate)?;
            eval.record(&goal, update);
            eval.fitness.insert(goal, 0.0);
        }
        Ok(())
    }

    /// Fitness of `trace` for `goal`, as the worklist scores it
    ///
    /// Exception goals are matched under the configured target class.
    #[must_use]
    pub fn fitness(&self, goal: &CoverageGoal, trace: &ExecutionTrace) -> f64 {
        goal.fitness_for_target(trace, self.config.target_class.as_deref())
    }

    /// Live objectives for the next generation
    #[inline]
    #[must_use]
    pub fn current_goals(&self) -> &IndexSet<CoverageGoal> {
        self.archive.current_goals()
    }

    /// Goals without a witness
    #[inline]
    #[must_use]
    pub fn uncovered_goals(&self) -> &IndexSet<CoverageGoal> {
        self.archive.uncovered_goals()
    }

    /// Goal -> best covering test
    #[inline]
    #[must_use]
    pub fn covered_goals(&self) -> &IndexMap<CoverageGoal, T> {
        self.archive.covered_goals()
    }

    /// Distinct witness tests
    #[inline]
    #[must_use]
    pub fn best_tests_archive(&self) -> Vec<&T> {
        self.archive.best_tests_archive()
    }

    /// Underlying archive
    #[inline]
    #[must_use]
    pub fn archive(&self) -> &Archive<T> {
        &self.archive
    }

    /// Mutable archive, e.g. to clear its update flag between generations
    #[inline]
    pub fn archive_mut(&mut self) -> &mut Archive<T> {
        &mut self.archive
    }

    /// Shared, read-only dependency graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> Arc<DependencyGraph> {
        Arc::clone(&self.graph)
    }

    /// Dependents side-table
    #[inline]
    #[must_use]
    pub fn dependents(&self) -> &Dependents {
        &self.dependents
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
