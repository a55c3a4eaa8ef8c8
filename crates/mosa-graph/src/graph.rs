//! Branch dependency graph
//!
//! Nodes are branch-spine goals (branch outcomes and branchless-method
//! entries); an edge `A -> B` means covering `A` resolves a decision on
//! every path into `B`'s block. The graph is built once per search run and
//! is read-only afterwards.

use indexmap::{IndexMap, IndexSet};
use mosa_goal::{BlockId, BranchId, BranchOutcome, ControlFlowFacts, CoverageGoal, MethodRef};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, trace};

/// Summary counts of a built graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Number of goal nodes
    pub goals: usize,
    /// Number of structural edges
    pub edges: usize,
    /// Number of root goals
    pub roots: usize,
    /// Number of distinct methods owning at least one node
    pub methods: usize,
}

/// Structural dependency graph over branch-spine goals
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<CoverageGoal, ()>,
    nodes: IndexMap<CoverageGoal, NodeIndex>,
    roots: IndexSet<CoverageGoal>,
    by_method: IndexMap<MethodRef, Vec<NodeIndex>>,
    by_outcome: IndexMap<BranchOutcome, NodeIndex>,
}

impl DependencyGraph {
    fn add_goal(&mut self, goal: &CoverageGoal) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(goal) {
            return ix;
        }
        let ix = self.graph.add_node(goal.clone());
        self.nodes.insert(goal.clone(), ix);
        self.by_method.entry(goal.method().clone()).or_default().push(ix);
        if let CoverageGoal::Branch(b) = goal {
            self.by_outcome.insert(b.outcome, ix);
        }
        ix
    }

    /// Goals that become reachable once `goal` is covered
    pub fn structural_children<'a>(&'a self, goal: &CoverageGoal) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.neighbors(goal, Direction::Outgoing)
    }

    /// Goals that must be covered before `goal` becomes reachable
    pub fn structural_parents<'a>(&'a self, goal: &CoverageGoal) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.neighbors(goal, Direction::Incoming)
    }

    fn neighbors<'a>(&'a self, goal: &CoverageGoal, dir: Direction) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.nodes
            .get(goal)
            .copied()
            .into_iter()
            .flat_map(move |ix| self.graph.neighbors_directed(ix, dir))
            .map(move |n| &self.graph[n])
    }

    /// Goals reachable without any branch decision
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &IndexSet<CoverageGoal> {
        &self.roots
    }

    /// Whether `goal` is a root
    #[inline]
    #[must_use]
    pub fn is_root(&self, goal: &CoverageGoal) -> bool {
        self.roots.contains(goal)
    }

    /// Whether `goal` is a node of the graph
    #[inline]
    #[must_use]
    pub fn contains(&self, goal: &CoverageGoal) -> bool {
        self.nodes.contains_key(goal)
    }

    /// Every node, in insertion order
    pub fn branch_goals(&self) -> impl Iterator<Item = &CoverageGoal> + '_ {
        self.nodes.keys()
    }

    /// Nodes owned by `method`
    pub fn branch_goals_of<'a>(&'a self, method: &MethodRef) -> impl Iterator<Item = &'a CoverageGoal> + 'a {
        self.by_method
            .get(method)
            .into_iter()
            .flatten()
            .map(move |&ix| &self.graph[ix])
    }

    /// Branch goal for a specific outcome, if it is part of the graph
    #[must_use]
    pub fn branch_goal(&self, outcome: BranchOutcome) -> Option<&CoverageGoal> {
        self.by_outcome.get(&outcome).map(|&ix| &self.graph[ix])
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn goal_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Summary counts
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            goals: self.goal_count(),
            edges: self.edge_count(),
            roots: self.roots.len(),
            methods: self.by_method.len(),
        }
    }
}

/// Result of the backward walk from one block
#[derive(Debug, Default)]
struct ParentSearch {
    branches: Vec<BranchId>,
    reaches_entry: bool,
}

/// Derives a [`DependencyGraph`] from analysis facts
pub struct DependencyGraphBuilder<'a> {
    facts: &'a dyn ControlFlowFacts,
}

impl<'a> DependencyGraphBuilder<'a> {
    /// Create a builder over the given facts
    #[must_use]
    pub fn new(facts: &'a dyn ControlFlowFacts) -> Self {
        Self { facts }
    }

    /// Build the graph over the branch-spine goals of `goals`
    ///
    /// Goals that are not branch-spine goals are ignored; criterion adapters
    /// hang them off the graph afterwards.
    pub fn build<'g>(&self, goals: impl IntoIterator<Item = &'g CoverageGoal>) -> DependencyGraph {
        let mut graph = DependencyGraph::default();

        let spine: Vec<&CoverageGoal> = goals.into_iter().filter(|g| g.is_branch_spine()).collect();
        for goal in &spine {
            graph.add_goal(goal);
        }

        for goal in spine {
            let Some(branch) = goal.as_branch() else {
                graph.roots.insert(goal.clone());
                continue;
            };

            let parents = self.parent_branches(branch.branch());
            let Some(parents) = parents else {
                graph.roots.insert(goal.clone());
                continue;
            };

            let Some(&child) = graph.nodes.get(goal) else {
                continue;
            };

            let mut linked = 0usize;
            for parent in parents {
                for value in [true, false] {
                    if let Some(&from) = graph.by_outcome.get(&BranchOutcome::new(parent, value)) {
                        graph.graph.update_edge(from, child, ());
                        linked += 1;
                    }
                }
            }

            if linked == 0 {
                debug!(goal = %goal, "no parent goal in goal set, treating as root");
                graph.roots.insert(goal.clone());
            }
        }

        let stats = graph.stats();
        info!(
            goals = stats.goals,
            edges = stats.edges,
            roots = stats.roots,
            methods = stats.methods,
            "built branch dependency graph"
        );
        graph
    }

    /// Structural parent branches of `branch`; `None` when it is a root
    fn parent_branches(&self, branch: BranchId) -> Option<Vec<BranchId>> {
        let facts = self.facts;

        let Some(info) = facts.branch(branch) else {
            debug!(%branch, "unknown branch, treating as root");
            return None;
        };
        if facts.is_instrumentation_only(branch) {
            trace!(%branch, "instrumentation-only branch");
            return None;
        }

        let insn = info.instruction;
        if facts.is_root_dependent(insn) || facts.control_dependencies(insn).is_empty() {
            return None;
        }

        let Some(block) = facts.basic_block_of(insn) else {
            debug!(%branch, instruction = %insn, "instruction has no basic block, treating as root");
            return None;
        };

        let search = self.look_for_parents(block);
        if search.reaches_entry {
            return None;
        }

        let parents: Vec<BranchId> = search.branches.into_iter().filter(|&p| p != branch).collect();
        if parents.is_empty() {
            return None;
        }
        Some(parents)
    }

    /// Breadth-first walk over predecessors of `start`, stopping at the
    /// first block on each path that holds a branch
    fn look_for_parents(&self, start: BlockId) -> ParentSearch {
        let mut search = ParentSearch::default();
        let mut visited: HashSet<BlockId> = HashSet::new();
        visited.insert(start);

        let preds = self.facts.predecessor_blocks(start);
        if preds.is_empty() {
            search.reaches_entry = true;
            return search;
        }
        let mut queue: VecDeque<BlockId> = preds.into();

        while let Some(block) = queue.pop_front() {
            if !visited.insert(block) {
                continue;
            }
            if let Some(branch) = self.facts.branch_in_block(block) {
                if !search.branches.contains(&branch) {
                    search.branches.push(branch);
                }
                continue;
            }
            let preds = self.facts.predecessor_blocks(block);
            if preds.is_empty() {
                search.reaches_entry = true;
                continue;
            }
            queue.extend(preds);
        }

        search
    }
}
