//! Engine errors

use crate::config::ConfigError;
use mosa_archive::ArchiveError;
use mosa_goal::{CoverageGoal, Criterion};

/// Errors raised while initializing or driving the frontier engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Archive rejected an operation or failed its consistency check
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A goal of a disabled criterion was handed to the engine
    #[error("goal {goal} belongs to disabled criterion '{criterion}'")]
    CriterionNotEnabled {
        /// Offending goal
        goal: Box<CoverageGoal>,
        /// Its criterion
        criterion: Criterion,
    },
}
