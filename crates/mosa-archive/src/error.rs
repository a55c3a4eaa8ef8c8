//! Archive errors

use mosa_goal::CoverageGoal;

/// Errors raised by [`Archive`](crate::Archive) operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchiveError {
    /// The goal is not part of the registered goal set
    #[error("unknown goal: {0}")]
    UnknownGoal(Box<CoverageGoal>),

    /// The goal was already registered
    #[error("goal already registered: {0}")]
    DuplicateGoal(Box<CoverageGoal>),

    /// The goal partitions disagree
    #[error("archive inconsistent at {goal}: {reason}")]
    Inconsistent {
        /// Offending goal
        goal: Box<CoverageGoal>,
        /// Which invariant broke
        reason: &'static str,
    },
}

impl ArchiveError {
    pub(crate) fn unknown(goal: &CoverageGoal) -> Self {
        Self::UnknownGoal(Box::new(goal.clone()))
    }

    pub(crate) fn duplicate(goal: &CoverageGoal) -> Self {
        Self::DuplicateGoal(Box::new(goal.clone()))
    }

    pub(crate) fn inconsistent(goal: &CoverageGoal, reason: &'static str) -> Self {
        Self::Inconsistent {
            goal: Box::new(goal.clone()),
            reason,
        }
    }
}
