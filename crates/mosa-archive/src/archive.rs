//! Best-covering-test archive
//!
//! The archive owns the goal partitions of a search run:
//!
//! - `uncovered`: goals without a covering witness
//! - `current`: the live objectives, always a subset of `uncovered`
//! - `covered`: goal -> best known covering test
//! - `test_to_goals`: inverse index, one test may witness many goals
//!
//! [`Archive::record_coverage`] is the only operation that moves a goal
//! from `uncovered` to `covered`, which keeps the partitions consistent.

use crate::candidate::{TestCandidate, TestId};
use crate::error::ArchiveError;
use indexmap::{IndexMap, IndexSet};
use mosa_goal::{CoverageGoal, Criterion, MethodRef};
use serde::Serialize;
use tracing::trace;

/// Outcome of offering a covering candidate for one goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageUpdate {
    /// The goal had no witness; the candidate is now its witness
    Installed,
    /// The candidate displaced a larger witness
    Replaced {
        /// The displaced witness
        previous: TestId,
    },
    /// The incumbent witness stays
    Kept,
}

impl CoverageUpdate {
    /// Whether the archive changed
    #[inline]
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Kept)
    }
}

/// Serializable snapshot of archive counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveSummary {
    /// Registered goals
    pub goals: usize,
    /// Goals with a witness
    pub covered: usize,
    /// Goals without a witness
    pub uncovered: usize,
    /// Live objectives
    pub current: usize,
    /// Distinct witness tests
    pub solutions: usize,
    /// `covered / goals`
    pub coverage: f64,
}

/// Goal partitions plus the best covering test per goal
#[derive(Debug, Clone)]
pub struct Archive<T> {
    goals: IndexSet<CoverageGoal>,
    uncovered: IndexSet<CoverageGoal>,
    current: IndexSet<CoverageGoal>,
    covered: IndexMap<CoverageGoal, T>,
    test_to_goals: IndexMap<TestId, IndexSet<CoverageGoal>>,
    remaining_by_method: IndexMap<MethodRef, IndexSet<CoverageGoal>>,
    updated: bool,
}

impl<T: TestCandidate> Archive<T> {
    /// Create an archive over `goals`, seeding the live objectives with `roots`
    ///
    /// Duplicate goals are collapsed. Every root must be one of `goals`.
    pub fn new<G, R>(goals: G, roots: R) -> Result<Self, ArchiveError>
    where
        G: IntoIterator<Item = CoverageGoal>,
        R: IntoIterator<Item = CoverageGoal>,
    {
        let mut archive = Self {
            goals: IndexSet::new(),
            uncovered: IndexSet::new(),
            current: IndexSet::new(),
            covered: IndexMap::new(),
            test_to_goals: IndexMap::new(),
            remaining_by_method: IndexMap::new(),
            updated: false,
        };

        for goal in goals {
            if !archive.goals.contains(&goal) {
                archive.insert_goal(goal);
            }
        }

        for root in roots {
            if !archive.goals.contains(&root) {
                return Err(ArchiveError::unknown(&root));
            }
            archive.current.insert(root);
        }

        Ok(archive)
    }

    fn insert_goal(&mut self, goal: CoverageGoal) {
        self.remaining_by_method
            .entry(goal.method().clone())
            .or_default()
            .insert(goal.clone());
        self.uncovered.insert(goal.clone());
        self.goals.insert(goal);
    }

    /// Register a goal discovered at runtime
    ///
    /// The goal starts uncovered and is not a live objective until the
    /// caller adds it with [`Archive::add_current`].
    pub fn register_goal(&mut self, goal: CoverageGoal) -> Result<(), ArchiveError> {
        if self.goals.contains(&goal) {
            return Err(ArchiveError::duplicate(&goal));
        }
        trace!(goal = %goal, "registered goal");
        self.insert_goal(goal);
        Ok(())
    }

    /// Offer `candidate` as a covering test for `goal`
    ///
    /// The first covering test is always installed. An incumbent is only
    /// replaced by a candidate that is strictly smaller and has more than
    /// one statement.
    pub fn record_coverage(&mut self, goal: &CoverageGoal, candidate: &T) -> Result<CoverageUpdate, ArchiveError> {
        if !self.goals.contains(goal) {
            return Err(ArchiveError::unknown(goal));
        }

        let new_id = candidate.id();
        let incumbent = self.covered.get(goal).map(|t| (t.id(), t.size()));
        let Some((previous, previous_size)) = incumbent else {
            self.install(goal, candidate);
            return Ok(CoverageUpdate::Installed);
        };

        if previous == new_id || !is_better(candidate.size(), previous_size) {
            return Ok(CoverageUpdate::Kept);
        }

        trace!(
            goal = %goal,
            previous = %previous,
            previous_size,
            test = %new_id,
            size = candidate.size(),
            "replaced witness"
        );
        self.covered.insert(goal.clone(), candidate.clone());

        if let Some(goals) = self.test_to_goals.get_mut(&previous) {
            goals.swap_remove(goal);
            if goals.is_empty() {
                self.test_to_goals.swap_remove(&previous);
            }
        }
        self.test_to_goals.entry(new_id).or_default().insert(goal.clone());
        self.updated = true;

        Ok(CoverageUpdate::Replaced { previous })
    }

    fn install(&mut self, goal: &CoverageGoal, candidate: &T) {
        let id = candidate.id();
        self.covered.insert(goal.clone(), candidate.clone());
        self.uncovered.swap_remove(goal);
        self.current.swap_remove(goal);
        self.test_to_goals.entry(id).or_default().insert(goal.clone());
        self.mark_method_target_covered(goal);
        self.updated = true;
        trace!(goal = %goal, test = %id, size = candidate.size(), "installed witness");
    }

    fn mark_method_target_covered(&mut self, goal: &CoverageGoal) {
        let method = goal.method();
        if let Some(remaining) = self.remaining_by_method.get_mut(method) {
            remaining.swap_remove(goal);
            if remaining.is_empty() {
                self.remaining_by_method.swap_remove(method);
                trace!(method = %method, "method fully covered");
            }
        }
    }

    /// Whether `goal` has a witness
    ///
    /// Membership is answered from whichever of the two complementary
    /// partitions is currently smaller.
    #[must_use]
    pub fn is_already_covered(&self, goal: &CoverageGoal) -> bool {
        if self.uncovered.len() < self.covered.len() {
            self.goals.contains(goal) && !self.uncovered.contains(goal)
        } else {
            self.covered.contains_key(goal)
        }
    }

    /// Make an uncovered goal a live objective; returns whether it was added
    pub fn add_current(&mut self, goal: &CoverageGoal) -> bool {
        if !self.uncovered.contains(goal) {
            return false;
        }
        self.current.insert(goal.clone())
    }

    /// Drop every live objective that has a witness
    pub fn retain_uncovered_current(&mut self) {
        let covered = &self.covered;
        self.current.retain(|g| !covered.contains_key(g));
    }

    /// Live objectives
    #[inline]
    #[must_use]
    pub fn current_goals(&self) -> &IndexSet<CoverageGoal> {
        &self.current
    }

    /// Goals without a witness
    #[inline]
    #[must_use]
    pub fn uncovered_goals(&self) -> &IndexSet<CoverageGoal> {
        &self.uncovered
    }

    /// Goal -> best covering test
    #[inline]
    #[must_use]
    pub fn covered_goals(&self) -> &IndexMap<CoverageGoal, T> {
        &self.covered
    }

    /// Every registered goal
    #[inline]
    #[must_use]
    pub fn goals(&self) -> &IndexSet<CoverageGoal> {
        &self.goals
    }

    /// Best covering test of a goal
    #[inline]
    #[must_use]
    pub fn best_test(&self, goal: &CoverageGoal) -> Option<&T> {
        self.covered.get(goal)
    }

    /// Distinct witness tests, in first-covered order
    #[must_use]
    pub fn best_tests_archive(&self) -> Vec<&T> {
        let mut seen: IndexMap<TestId, &T> = IndexMap::new();
        for test in self.covered.values() {
            seen.entry(test.id()).or_insert(test);
        }
        seen.into_values().collect()
    }

    /// Goals a test currently witnesses
    #[must_use]
    pub fn goals_of(&self, test: TestId) -> Option<&IndexSet<CoverageGoal>> {
        self.test_to_goals.get(&test)
    }

    /// Uncovered goals owned by `method`
    #[must_use]
    pub fn remaining_targets(&self, method: &MethodRef) -> usize {
        self.remaining_by_method.get(method).map_or(0, IndexSet::len)
    }

    /// Whether no goal of `method` is left uncovered
    ///
    /// Methods that never owned a goal count as fully covered.
    #[must_use]
    pub fn is_method_fully_covered(&self, method: &MethodRef) -> bool {
        self.remaining_targets(method) == 0
    }

    /// Whether the archive changed since the last [`Archive::clear_updated`]
    #[inline]
    #[must_use]
    pub fn has_been_updated(&self) -> bool {
        self.updated
    }

    /// Reset the update flag
    #[inline]
    pub fn clear_updated(&mut self) {
        self.updated = false;
    }

    /// Registered goals
    #[inline]
    #[must_use]
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// Goals with a witness
    #[inline]
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    /// Goals without a witness
    #[inline]
    #[must_use]
    pub fn uncovered_count(&self) -> usize {
        self.uncovered.len()
    }

    /// Covered goals of one criterion
    #[must_use]
    pub fn covered_count_of(&self, criterion: Criterion) -> usize {
        self.covered.keys().filter(|g| g.criterion() == criterion).count()
    }

    /// Uncovered goals of one criterion
    #[must_use]
    pub fn uncovered_count_of(&self, criterion: Criterion) -> usize {
        self.uncovered.iter().filter(|g| g.criterion() == criterion).count()
    }

    /// Distinct witness tests
    #[inline]
    #[must_use]
    pub fn solution_count(&self) -> usize {
        self.test_to_goals.len()
    }

    /// Fraction of goals with a witness; `1.0` when there are no goals
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_ratio(&self) -> f64 {
        if self.goals.is_empty() {
            return 1.0;
        }
        self.covered.len() as f64 / self.goals.len() as f64
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            goals: self.goal_count(),
            covered: self.covered_count(),
            uncovered: self.uncovered_count(),
            current: self.current.len(),
            solutions: self.solution_count(),
            coverage: self.coverage_ratio(),
        }
    }

    /// Verify the partition invariants
    ///
    /// Linear in the number of goals; callers run it in debug builds or
    /// on demand, never per goal.
    pub fn check_invariants(&self) -> Result<(), ArchiveError> {
        for goal in &self.goals {
            match (self.uncovered.contains(goal), self.covered.contains_key(goal)) {
                (true, true) => return Err(ArchiveError::inconsistent(goal, "both covered and uncovered")),
                (false, false) => return Err(ArchiveError::inconsistent(goal, "neither covered nor uncovered")),
                _ => {}
            }
        }
        for goal in self.uncovered.iter().chain(self.covered.keys()) {
            if !self.goals.contains(goal) {
                return Err(ArchiveError::inconsistent(goal, "not a registered goal"));
            }
        }
        for goal in &self.current {
            if !self.uncovered.contains(goal) {
                return Err(ArchiveError::inconsistent(goal, "live objective already covered"));
            }
        }
        for (goal, test) in &self.covered {
            let indexed = self
                .test_to_goals
                .get(&test.id())
                .is_some_and(|goals| goals.contains(goal));
            if !indexed {
                return Err(ArchiveError::inconsistent(goal, "witness missing from inverse index"));
            }
        }
        for goals in self.test_to_goals.values() {
            if let Some(goal) = goals.iter().find(|g| !self.covered.contains_key(*g)) {
                return Err(ArchiveError::inconsistent(goal, "inverse index lists uncovered goal"));
            }
        }
        Ok(())
    }
}

/// Replacement rule for an existing witness
///
/// Single-statement candidates never displace an incumbent.
fn is_better(size: usize, incumbent_size: usize) -> bool {
    size < incumbent_size && size > 1
}
