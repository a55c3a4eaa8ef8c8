//! Coverage criteria

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A coverage criterion: the family a [`CoverageGoal`](crate::CoverageGoal) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Branch outcomes and branchless method entry
    Branch,
    /// Individual instructions
    Statement,
    /// Source lines
    Line,
    /// Method invocation
    Method,
    /// Method invocation returning without exception
    MethodNoException,
    /// Weak mutation (mutant infected)
    WeakMutation,
    /// Strong mutation (mutant killed)
    StrongMutation,
    /// Input value categories
    Input,
    /// Output value categories
    Output,
    /// Branches guarding try/catch regions
    TryCatch,
    /// Context-sensitive branch coverage
    ContextualBranch,
    /// Exceptions raised by the unit under test
    Exception,
}

impl Criterion {
    /// Every criterion, in declaration order
    pub const ALL: [Criterion; 12] = [
        Criterion::Branch,
        Criterion::Statement,
        Criterion::Line,
        Criterion::Method,
        Criterion::MethodNoException,
        Criterion::WeakMutation,
        Criterion::StrongMutation,
        Criterion::Input,
        Criterion::Output,
        Criterion::TryCatch,
        Criterion::ContextualBranch,
        Criterion::Exception,
    ];

    /// Stable lowercase name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Criterion::Branch => "branch",
            Criterion::Statement => "statement",
            Criterion::Line => "line",
            Criterion::Method => "method",
            Criterion::MethodNoException => "method_no_exception",
            Criterion::WeakMutation => "weak_mutation",
            Criterion::StrongMutation => "strong_mutation",
            Criterion::Input => "input",
            Criterion::Output => "output",
            Criterion::TryCatch => "try_catch",
            Criterion::ContextualBranch => "contextual_branch",
            Criterion::Exception => "exception",
        }
    }

    /// Whether this is one of the mutation criteria
    #[inline]
    #[must_use]
    pub fn is_mutation(self) -> bool {
        matches!(self, Criterion::WeakMutation | Criterion::StrongMutation)
    }
}

impl Display for Criterion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
