//! MOSA goal-selection core
//!
//! Decides, candidate after candidate, which coverage goals a search-based
//! test generator should currently optimize for, and keeps the smallest
//! known covering test for every goal already satisfied.
//!
//! # Architecture
//!
//! ```text
//! goals + ControlFlowFacts
//!         │
//!         ▼
//! DependencyGraphBuilder ──► DependencyGraph (branch spine + roots)
//!         │
//!         ▼
//! CriterionRegistry ───────► Dependents side-table + extra roots
//!         │
//!         ▼
//! FrontierEngine ──────────► Archive (covered / uncovered / current)
//!         ▲
//!         └── on_candidate_evaluated(test, trace)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use mosa_core::{FrontierEngine, SearchConfig};
//!
//! let mut engine = FrontierEngine::initialize(goals, &facts, SearchConfig::default())?;
//! for (test, trace) in evaluated_population {
//!     engine.on_candidate_evaluated(&test, &trace)?;
//! }
//! let objectives = engine.current_goals();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod criteria;
pub mod engine;
pub mod error;

// Re-exports
pub use config::{ConfigError, SearchConfig};
pub use criteria::{AttachContext, CriterionAdapter, CriterionRegistry, Dependents, StrongMutationAdapter};
pub use engine::{Evaluation, FrontierEngine};
pub use error::EngineError;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a search run
    pub use crate::{EngineError, Evaluation, FrontierEngine, SearchConfig};
    pub use mosa_archive::{Archive, TestCandidate, TestId};
    pub use mosa_goal::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
