//! Coverage goals
//!
//! [`CoverageGoal`] is a closed tagged union over every goal kind the
//! search can target. Equality and hashing are structural: two goals of the
//! same kind with the same identifying fields are the same goal.

use crate::criterion::Criterion;
use crate::id::{BranchId, BranchOutcome, CallContext, InstructionId, MethodRef, MutationId};
use crate::trace::{ExceptionKind, ExecutionTrace};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Fitness assigned to every current goal when a candidate's run is unusable
pub const WORST_FITNESS: f64 = f64::MAX;

/// One outcome of one branch, inside its owning method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchGoal {
    /// Owning method
    pub method: MethodRef,
    /// Branch and desired outcome
    pub outcome: BranchOutcome,
}

impl BranchGoal {
    /// Create a branch goal
    #[inline]
    #[must_use]
    pub fn new(method: MethodRef, outcome: BranchOutcome) -> Self {
        Self { method, outcome }
    }

    /// Branch id
    #[inline]
    #[must_use]
    pub fn branch(&self) -> BranchId {
        self.outcome.branch
    }

    /// Desired outcome
    #[inline]
    #[must_use]
    pub fn value(&self) -> bool {
        self.outcome.value
    }

    /// Distance-based fitness of reaching this outcome
    ///
    /// `0` when taken, the normalized branch distance when the predicate
    /// executed, `1` when the method was entered but the predicate never
    /// evaluated, `2` when the method was never entered.
    #[must_use]
    pub fn fitness(&self, trace: &ExecutionTrace) -> f64 {
        if trace.is_outcome_covered(self.outcome) {
            return 0.0;
        }
        match trace.branch_distance(self.outcome) {
            Some(d) => normalize(d),
            None if trace.entered(&self.method) => 1.0,
            None => 2.0,
        }
    }
}

/// Weak or strong mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStrength {
    /// Mutant infects program state
    Weak,
    /// Mutant changes an observable outcome
    Strong,
}

/// A single coverage target
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageGoal {
    /// Take one outcome of a branch
    Branch(BranchGoal),
    /// Enter a method that has no branches
    BranchlessMethod {
        /// Target method
        method: MethodRef,
    },
    /// Execute an instruction
    Statement {
        /// Owning method
        method: MethodRef,
        /// Target instruction
        instruction: InstructionId,
    },
    /// Execute a source line
    Line {
        /// Owning method
        method: MethodRef,
        /// Line number
        line: u32,
    },
    /// Invoke a method
    Method {
        /// Target method
        method: MethodRef,
    },
    /// Invoke a method and have it return normally
    MethodNoException {
        /// Target method
        method: MethodRef,
    },
    /// Weakly or strongly kill a mutant
    Mutant {
        /// Mutated method
        method: MethodRef,
        /// Mutation id
        mutation: MutationId,
        /// Weak or strong
        strength: MutationStrength,
    },
    /// Observe an input value category on a method call
    Input {
        /// Target method
        method: MethodRef,
        /// Value category (e.g. `arg0:Negative`)
        category: Arc<str>,
    },
    /// Observe an output value category on a method return
    Output {
        /// Target method
        method: MethodRef,
        /// Value category (e.g. `Null`)
        category: Arc<str>,
    },
    /// Take the branch guarding a try/catch region
    TryCatch(BranchGoal),
    /// Take a branch outcome (or enter a branchless method) under a calling context
    ContextualBranch {
        /// Owning method
        method: MethodRef,
        /// Outcome; `None` targets entry of a branchless method
        outcome: Option<BranchOutcome>,
        /// Required calling context
        context: CallContext,
    },
    /// Have the unit under test raise an exception
    Exception {
        /// Method of the unit under test being called
        method: MethodRef,
        /// Fully qualified exception type
        exception_type: Arc<str>,
        /// How the exception arose
        exception_kind: ExceptionKind,
    },
}

impl CoverageGoal {
    /// Branch goal for the `true` outcome
    #[must_use]
    pub fn branch_true(method: MethodRef, branch: BranchId) -> Self {
        Self::Branch(BranchGoal::new(method, BranchOutcome::new(branch, true)))
    }

    /// Branch goal for the `false` outcome
    #[must_use]
    pub fn branch_false(method: MethodRef, branch: BranchId) -> Self {
        Self::Branch(BranchGoal::new(method, BranchOutcome::new(branch, false)))
    }

    /// Branch goal for an arbitrary outcome
    #[must_use]
    pub fn branch(method: MethodRef, outcome: BranchOutcome) -> Self {
        Self::Branch(BranchGoal::new(method, outcome))
    }

    /// Entry goal of a branchless method
    #[must_use]
    pub fn branchless(method: MethodRef) -> Self {
        Self::BranchlessMethod { method }
    }

    /// Statement goal
    #[must_use]
    pub fn statement(method: MethodRef, instruction: InstructionId) -> Self {
        Self::Statement { method, instruction }
    }

    /// Line goal
    #[must_use]
    pub fn line(method: MethodRef, line: u32) -> Self {
        Self::Line { method, line }
    }

    /// Method goal
    #[must_use]
    pub fn method_call(method: MethodRef) -> Self {
        Self::Method { method }
    }

    /// Method-no-exception goal
    #[must_use]
    pub fn method_no_exception(method: MethodRef) -> Self {
        Self::MethodNoException { method }
    }

    /// Weak mutant goal
    #[must_use]
    pub fn weak_mutant(method: MethodRef, mutation: MutationId) -> Self {
        Self::Mutant {
            method,
            mutation,
            strength: MutationStrength::Weak,
        }
    }

    /// Strong mutant goal
    #[must_use]
    pub fn strong_mutant(method: MethodRef, mutation: MutationId) -> Self {
        Self::Mutant {
            method,
            mutation,
            strength: MutationStrength::Strong,
        }
    }

    /// Input category goal
    #[must_use]
    pub fn input(method: MethodRef, category: &str) -> Self {
        Self::Input {
            method,
            category: Arc::from(category),
        }
    }

    /// Output category goal
    #[must_use]
    pub fn output(method: MethodRef, category: &str) -> Self {
        Self::Output {
            method,
            category: Arc::from(category),
        }
    }

    /// Try/catch goal over a branch outcome
    #[must_use]
    pub fn try_catch(method: MethodRef, outcome: BranchOutcome) -> Self {
        Self::TryCatch(BranchGoal::new(method, outcome))
    }

    /// Context-sensitive branch goal
    #[must_use]
    pub fn contextual(method: MethodRef, outcome: Option<BranchOutcome>, context: CallContext) -> Self {
        Self::ContextualBranch {
            method,
            outcome,
            context,
        }
    }

    /// Exception goal
    #[must_use]
    pub fn exception(method: MethodRef, exception_type: &str, exception_kind: ExceptionKind) -> Self {
        Self::Exception {
            method,
            exception_type: Arc::from(exception_type),
            exception_kind,
        }
    }

    /// Criterion this goal belongs to
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        match self {
            Self::Branch(_) | Self::BranchlessMethod { .. } => Criterion::Branch,
            Self::Statement { .. } => Criterion::Statement,
            Self::Line { .. } => Criterion::Line,
            Self::Method { .. } => Criterion::Method,
            Self::MethodNoException { .. } => Criterion::MethodNoException,
            Self::Mutant {
                strength: MutationStrength::Weak,
                ..
            } => Criterion::WeakMutation,
            Self::Mutant {
                strength: MutationStrength::Strong,
                ..
            } => Criterion::StrongMutation,
            Self::Input { .. } => Criterion::Input,
            Self::Output { .. } => Criterion::Output,
            Self::TryCatch(_) => Criterion::TryCatch,
            Self::ContextualBranch { .. } => Criterion::ContextualBranch,
            Self::Exception { .. } => Criterion::Exception,
        }
    }

    /// Method the goal lives in
    #[must_use]
    pub fn method(&self) -> &MethodRef {
        match self {
            Self::Branch(b) | Self::TryCatch(b) => &b.method,
            Self::BranchlessMethod { method }
            | Self::Statement { method, .. }
            | Self::Line { method, .. }
            | Self::Method { method }
            | Self::MethodNoException { method }
            | Self::Mutant { method, .. }
            | Self::Input { method, .. }
            | Self::Output { method, .. }
            | Self::ContextualBranch { method, .. }
            | Self::Exception { method, .. } => method,
        }
    }

    /// Whether the goal is a node of the branch dependency graph
    ///
    /// Branch outcomes and branchless-method entries form the spine every
    /// other goal kind hangs off.
    #[inline]
    #[must_use]
    pub fn is_branch_spine(&self) -> bool {
        matches!(self, Self::Branch(_) | Self::BranchlessMethod { .. })
    }

    /// Branch goal payload, if this is a branch outcome
    #[inline]
    #[must_use]
    pub fn as_branch(&self) -> Option<&BranchGoal> {
        match self {
            Self::Branch(b) => Some(b),
            _ => None,
        }
    }

    /// Fitness of the trace w.r.t. this goal; `0.0` means covered
    ///
    /// The value is always `>= 0.0`. Smaller is closer. Exceptions are
    /// matched against the method that raised them; see
    /// [`CoverageGoal::fitness_for_target`] when exception goals are keyed
    /// by a target class.
    #[must_use]
    pub fn fitness(&self, trace: &ExecutionTrace) -> f64 {
        self.fitness_for_target(trace, None)
    }

    /// Fitness with exceptions attributed to `target_class`
    ///
    /// With a target class, a thrown exception counts for the goal named
    /// [`crate::ThrownException::attributed_method`], the same key the search
    /// uses when it synthesizes exception goals. Runs that used reflection
    /// never cover an exception goal.
    #[must_use]
    pub fn fitness_for_target(&self, trace: &ExecutionTrace, target_class: Option<&str>) -> f64 {
        match self {
            Self::Branch(b) | Self::TryCatch(b) => b.fitness(trace),
            Self::BranchlessMethod { method } | Self::Method { method } => {
                if trace.entered(method) {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Statement {
                method,
                instruction,
            } => reach(trace.executed(*instruction), trace.entered(method)),
            Self::Line { method, line } => {
                reach(trace.is_line_covered(method, *line), trace.entered(method))
            }
            Self::MethodNoException { method } => {
                if trace.returned_normally(method) {
                    0.0
                } else if trace.entered(method) {
                    0.5
                } else {
                    1.0
                }
            }
            Self::Mutant {
                mutation,
                strength: MutationStrength::Weak,
                ..
            } => {
                if trace.is_touched(*mutation) {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Mutant {
                mutation,
                strength: MutationStrength::Strong,
                ..
            } => {
                if trace.is_killed(*mutation) {
                    0.0
                } else if trace.is_touched(*mutation) {
                    0.5
                } else {
                    1.0
                }
            }
            Self::Input { method, category } => {
                if trace.observed_input(method, category) {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Output { method, category } => {
                if trace.observed_output(method, category) {
                    0.0
                } else {
                    1.0
                }
            }
            Self::ContextualBranch {
                method,
                outcome: Some(outcome),
                context,
            } => {
                if trace.is_context_outcome_covered(*outcome, context) {
                    0.0
                } else {
                    1.0 + BranchGoal::new(method.clone(), *outcome).fitness(trace)
                }
            }
            Self::ContextualBranch {
                method,
                outcome: None,
                context,
            } => reach(trace.is_context_entered(context), trace.entered(method)),
            Self::Exception {
                method,
                exception_type,
                exception_kind,
            } => {
                let raised = !trace.called_reflection()
                    && trace.thrown_exceptions().iter().any(|e| {
                        e.sut_origin
                            && !e.skip
                            && e.kind == *exception_kind
                            && e.is_attributed_to(method, target_class)
                            && *e.exception_type == **exception_type
                    });
                if raised {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

impl From<BranchGoal> for CoverageGoal {
    fn from(value: BranchGoal) -> Self {
        Self::Branch(value)
    }
}

impl Display for CoverageGoal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(b) => write!(f, "branch {} {}", b.method, b.outcome),
            Self::BranchlessMethod { method } => write!(f, "branchless {method}"),
            Self::Statement {
                method,
                instruction,
            } => write!(f, "statement {method} {instruction}"),
            Self::Line { method, line } => write!(f, "line {method}:{line}"),
            Self::Method { method } => write!(f, "method {method}"),
            Self::MethodNoException { method } => write!(f, "method-no-exception {method}"),
            Self::Mutant {
                method,
                mutation,
                strength,
            } => {
                let s = match strength {
                    MutationStrength::Weak => "weak",
                    MutationStrength::Strong => "strong",
                };
                write!(f, "{s} mutant {mutation} in {method}")
            }
            Self::Input { method, category } => write!(f, "input {method} {category}"),
            Self::Output { method, category } => write!(f, "output {method} {category}"),
            Self::TryCatch(b) => write!(f, "try-catch {} {}", b.method, b.outcome),
            Self::ContextualBranch {
                method,
                outcome,
                context,
            } => match outcome {
                Some(o) => write!(f, "cbranch {method} {o} [{context}]"),
                None => write!(f, "cbranch {method} entry [{context}]"),
            },
            Self::Exception {
                method,
                exception_type,
                exception_kind,
            } => write!(f, "exception {method} {exception_type} ({exception_kind:?})"),
        }
    }
}

/// Map a raw branch distance into `[0, 1]`
///
/// Finite distances land in `[0, 1)`. Infinite or NaN distances map to
/// `1.0`, the fitness of a predicate that never evaluated.
#[inline]
#[must_use]
pub fn normalize(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 1.0;
    }
    distance / (distance + 1.0)
}

fn reach(covered: bool, method_entered: bool) -> f64 {
    if covered {
        0.0
    } else if method_entered {
        1.0
    } else {
        2.0
    }
}
