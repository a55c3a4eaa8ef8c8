//! Weak and strong mutation coverage

use super::{wrong_kind, AttachContext, CriterionAdapter};
use indexmap::{IndexMap, IndexSet};
use mosa_goal::{ControlFlowFacts, CoverageGoal, Criterion, MutationId, MutationStrength};
use mosa_graph::DependencyGraph;
use std::collections::VecDeque;
use tracing::debug;

fn mutation_of(criterion: Criterion, strength: MutationStrength, goal: &CoverageGoal) -> MutationId {
    match goal {
        CoverageGoal::Mutant {
            mutation,
            strength: s,
            ..
        } if *s == strength => *mutation,
        _ => wrong_kind(criterion, goal),
    }
}

/// Attaches weak mutants below the branches guarding the mutated instruction
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakMutationAdapter;

impl CriterionAdapter for WeakMutationAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::WeakMutation
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        for goal in goals {
            let mutation = mutation_of(self.criterion(), MutationStrength::Weak, goal);
            let deps = ctx.facts().mutation_control_dependencies(mutation);
            ctx.root_or_attach(&deps, goal);
        }
    }
}

/// Attaches strong mutants below their infected branches and derives root mutants
///
/// A mutant's guarding branches may sit deep in the graph, below branches
/// that carry no mutant at all. The first infected branches met on each
/// path from the roots stand in for "reached": their mutants become roots
/// so the search targets them from the first generation on.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrongMutationAdapter;

impl StrongMutationAdapter {
    /// Spine goal -> strong mutants whose mutated instruction it guards
    ///
    /// Mutants without any control dependency are returned separately: they
    /// are reachable without a branch decision.
    #[must_use]
    pub fn derive_infected_branches(
        &self,
        goals: &[CoverageGoal],
        graph: &DependencyGraph,
        facts: &dyn ControlFlowFacts,
    ) -> (IndexMap<CoverageGoal, IndexSet<CoverageGoal>>, IndexSet<CoverageGoal>) {
        let mut infected: IndexMap<CoverageGoal, IndexSet<CoverageGoal>> = IndexMap::new();
        let mut unguarded = IndexSet::new();

        for goal in goals {
            let mutation = mutation_of(self.criterion(), MutationStrength::Strong, goal);
            let deps = facts.mutation_control_dependencies(mutation);
            if deps.is_empty() {
                unguarded.insert(goal.clone());
                continue;
            }
            for outcome in deps {
                if let Some(branch) = graph.branch_goal(outcome) {
                    infected.entry(branch.clone()).or_default().insert(goal.clone());
                }
            }
        }

        (infected, unguarded)
    }

    /// Breadth-first from the graph roots, collecting the mutants of the
    /// first infected branch on every path
    #[must_use]
    pub fn derive_root_mutants(
        &self,
        graph: &DependencyGraph,
        infected: &IndexMap<CoverageGoal, IndexSet<CoverageGoal>>,
    ) -> IndexSet<CoverageGoal> {
        let mut roots = IndexSet::new();
        let mut visited: IndexSet<&CoverageGoal> = IndexSet::new();
        let mut queue: VecDeque<&CoverageGoal> = graph.roots().iter().collect();

        while let Some(branch) = queue.pop_front() {
            if !visited.insert(branch) {
                continue;
            }
            if let Some(mutants) = infected.get(branch) {
                roots.extend(mutants.iter().cloned());
                continue;
            }
            queue.extend(graph.structural_children(branch).filter(|c| !visited.contains(c)));
        }

        roots
    }
}

impl CriterionAdapter for StrongMutationAdapter {
    fn criterion(&self) -> Criterion {
        Criterion::StrongMutation
    }

    fn attach(&self, goals: &[CoverageGoal], ctx: &mut AttachContext<'_>) {
        let graph = ctx.graph();
        let (infected, unguarded) = self.derive_infected_branches(goals, graph, ctx.facts());

        for goal in &unguarded {
            ctx.add_root(goal);
        }
        for (branch, mutants) in &infected {
            for mutant in mutants {
                ctx.attach_to(branch, mutant);
            }
        }

        let root_mutants = self.derive_root_mutants(graph, &infected);
        debug!(
            infected_branches = infected.len(),
            unguarded = unguarded.len(),
            root_mutants = root_mutants.len(),
            "derived strong mutation roots"
        );
        for goal in &root_mutants {
            ctx.add_root(goal);
        }

        // mutants none of whose guards made it into the graph
        for goal in goals {
            if !ctx.is_placed(goal) {
                ctx.add_root(goal);
            }
        }
    }
}
