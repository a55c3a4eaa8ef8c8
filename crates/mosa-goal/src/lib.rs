//! MOSA goal model
//!
//! The leaf data model of the goal-selection core:
//!
//! - [`CoverageGoal`]: closed tagged union over every coverage-goal kind
//! - [`ExecutionTrace`]: what one executed candidate covered
//! - [`ControlFlowFacts`]: read-only analysis facts about the unit under test
//! - [`Criterion`]: the goal families a search run can enable
//!
//! # Example
//!
//! ```rust
//! use mosa_goal::{BranchId, CoverageGoal, ExecutionTrace, MethodRef};
//!
//! let method = MethodRef::new("com.acme.Stack", "push");
//! let goal = CoverageGoal::branch_true(method.clone(), BranchId(1));
//!
//! let mut trace = ExecutionTrace::new();
//! trace.record_method_entry(method);
//! trace.record_predicate(BranchId(1), 0.0, 2.0);
//!
//! assert_eq!(goal.fitness(&trace), 0.0);
//! ```

#![warn(missing_docs)]

pub mod criterion;
pub mod facts;
pub mod goal;
pub mod id;
pub mod trace;

// Re-exports
pub use criterion::Criterion;
pub use facts::{BranchInfo, ControlFlowFacts};
pub use goal::{normalize, BranchGoal, CoverageGoal, MutationStrength, WORST_FITNESS};
pub use id::{BlockId, BranchId, BranchOutcome, CallContext, GoalError, InstructionId, MethodRef, MutationId};
pub use trace::{ExceptionKind, ExecutionTrace, ThrownException};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with goals and traces
    pub use crate::{
        BranchGoal, BranchId, BranchOutcome, ControlFlowFacts, CoverageGoal, Criterion,
        ExecutionTrace, MethodRef, MutationId, WORST_FITNESS,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
