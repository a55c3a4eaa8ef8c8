//! Execution traces
//!
//! An [`ExecutionTrace`] is the concrete record of what one executed
//! candidate did. The executor fills it through the `record_*` methods;
//! the goal-selection core only reads it.

use crate::id::{BranchId, BranchOutcome, CallContext, InstructionId, MethodRef, MutationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How an exception came to be thrown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Raised by an explicit `throw` in the unit under test
    Explicit,
    /// Raised by the runtime (null dereference, bad index, ...)
    Implicit,
    /// Declared in the method signature and propagated
    Declared,
}

/// One exception observed while executing a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrownException {
    /// Index of the test statement that raised it
    pub position: usize,
    /// Method of the unit under test that was being called
    pub method: MethodRef,
    /// Fully qualified exception type
    pub exception_type: String,
    /// Explicit / implicit / declared
    pub kind: ExceptionKind,
    /// Raised by a direct call on the unit under test, not by a library it uses
    pub sut_origin: bool,
    /// Statement whose exceptions are not attributable (synthetic or mocked call)
    pub skip: bool,
}

impl ThrownException {
    /// Method an exception goal for this exception is keyed by
    ///
    /// With a target class the raising method is renamed into it, so an
    /// exception escaping through a helper class counts for the class
    /// under test.
    #[must_use]
    pub fn attributed_method(&self, target_class: Option<&str>) -> MethodRef {
        match target_class {
            Some(class) => MethodRef::new(class, self.method.method()),
            None => self.method.clone(),
        }
    }

    /// Whether this exception is attributed to `method`
    ///
    /// Same key as [`ThrownException::attributed_method`], without building it.
    #[must_use]
    pub fn is_attributed_to(&self, method: &MethodRef, target_class: Option<&str>) -> bool {
        match target_class {
            Some(class) => method.class() == class && method.method() == self.method.method(),
            None => *method == self.method,
        }
    }
}

/// Concrete coverage record of one executed candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTrace {
    timed_out: bool,
    uncaught_exception: bool,
    called_reflection: bool,

    covered_true: BTreeSet<BranchId>,
    covered_false: BTreeSet<BranchId>,
    true_distances: BTreeMap<BranchId, f64>,
    false_distances: BTreeMap<BranchId, f64>,

    entered_methods: BTreeSet<MethodRef>,
    branchless_methods: BTreeSet<MethodRef>,
    normally_returned: BTreeSet<MethodRef>,

    executed_instructions: BTreeSet<InstructionId>,
    covered_lines: BTreeMap<MethodRef, BTreeSet<u32>>,

    touched_mutants: BTreeSet<MutationId>,
    killed_mutants: BTreeSet<MutationId>,

    inputs: BTreeMap<MethodRef, BTreeSet<String>>,
    outputs: BTreeMap<MethodRef, BTreeSet<String>>,

    context_outcomes: BTreeSet<(BranchOutcome, CallContext)>,
    context_entries: BTreeSet<CallContext>,

    thrown: Vec<ThrownException>,
}

impl ExecutionTrace {
    /// Empty trace
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace of a run that hit the time limit
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    // ----- recording -----

    /// Mark the run as timed out
    pub fn record_timeout(&mut self) {
        self.timed_out = true;
    }

    /// Mark the run as ended by an uncaught exception of the test itself
    pub fn record_uncaught_exception(&mut self) {
        self.uncaught_exception = true;
    }

    /// Mark the run as having used reflection
    pub fn record_reflection(&mut self) {
        self.called_reflection = true;
    }

    /// Record one evaluation of a predicate with its distances to each outcome
    ///
    /// A distance of `0.0` means that outcome was taken. The smallest
    /// distance seen for each outcome is kept.
    pub fn record_predicate(&mut self, branch: BranchId, true_distance: f64, false_distance: f64) {
        debug_assert!(true_distance >= 0.0 && false_distance >= 0.0);
        if true_distance == 0.0 {
            self.covered_true.insert(branch);
        }
        if false_distance == 0.0 {
            self.covered_false.insert(branch);
        }
        keep_min(&mut self.true_distances, branch, true_distance);
        keep_min(&mut self.false_distances, branch, false_distance);
    }

    /// Record that a branch outcome was taken
    pub fn record_outcome(&mut self, outcome: BranchOutcome) {
        if outcome.value {
            self.record_predicate(outcome.branch, 0.0, 1.0);
        } else {
            self.record_predicate(outcome.branch, 1.0, 0.0);
        }
    }

    /// Record a method entry
    pub fn record_method_entry(&mut self, method: MethodRef) {
        self.entered_methods.insert(method);
    }

    /// Record entry into a method without branches
    pub fn record_branchless_entry(&mut self, method: MethodRef) {
        self.entered_methods.insert(method.clone());
        self.branchless_methods.insert(method);
    }

    /// Record a method returning without exception
    pub fn record_normal_return(&mut self, method: MethodRef) {
        self.normally_returned.insert(method);
    }

    /// Record an executed instruction
    pub fn record_instruction(&mut self, instruction: InstructionId) {
        self.executed_instructions.insert(instruction);
    }

    /// Record an executed source line
    pub fn record_line(&mut self, method: MethodRef, line: u32) {
        self.covered_lines.entry(method).or_default().insert(line);
    }

    /// Record that a mutant's mutated code was executed
    pub fn record_touched_mutant(&mut self, mutation: MutationId) {
        self.touched_mutants.insert(mutation);
    }

    /// Record that a mutant changed the observable outcome
    pub fn record_killed_mutant(&mut self, mutation: MutationId) {
        self.touched_mutants.insert(mutation);
        self.killed_mutants.insert(mutation);
    }

    /// Record an input value category observed on a call
    pub fn record_input(&mut self, method: MethodRef, category: impl Into<String>) {
        self.inputs.entry(method).or_default().insert(category.into());
    }

    /// Record an output value category observed on a return
    pub fn record_output(&mut self, method: MethodRef, category: impl Into<String>) {
        self.outputs.entry(method).or_default().insert(category.into());
    }

    /// Record a branch outcome taken under a specific calling context
    pub fn record_context_outcome(&mut self, outcome: BranchOutcome, context: CallContext) {
        self.context_outcomes.insert((outcome, context));
    }

    /// Record entry into a method under a specific calling context
    pub fn record_context_entry(&mut self, context: CallContext) {
        self.context_entries.insert(context);
    }

    /// Record an exception raised during execution
    pub fn record_exception(&mut self, exception: ThrownException) {
        self.thrown.push(exception);
    }

    // ----- queries -----

    /// Whether the run hit the time limit
    #[inline]
    #[must_use]
    pub fn has_timeout(&self) -> bool {
        self.timed_out
    }

    /// Whether the test itself ended with an uncaught exception
    #[inline]
    #[must_use]
    pub fn has_uncaught_exception(&self) -> bool {
        self.uncaught_exception
    }

    /// Whether the run produced no usable coverage signal
    #[inline]
    #[must_use]
    pub fn is_failed_run(&self) -> bool {
        self.timed_out || self.uncaught_exception
    }

    /// Whether the run used reflection
    #[inline]
    #[must_use]
    pub fn called_reflection(&self) -> bool {
        self.called_reflection
    }

    /// Branch ids whose `true` outcome was taken
    #[inline]
    pub fn covered_true_branches(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.covered_true.iter().copied()
    }

    /// Branch ids whose `false` outcome was taken
    #[inline]
    pub fn covered_false_branches(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.covered_false.iter().copied()
    }

    /// Whether the given outcome was taken
    #[must_use]
    pub fn is_outcome_covered(&self, outcome: BranchOutcome) -> bool {
        if outcome.value {
            self.covered_true.contains(&outcome.branch)
        } else {
            self.covered_false.contains(&outcome.branch)
        }
    }

    /// Smallest recorded distance to the given outcome, if its predicate executed
    #[must_use]
    pub fn branch_distance(&self, outcome: BranchOutcome) -> Option<f64> {
        let distances = if outcome.value {
            &self.true_distances
        } else {
            &self.false_distances
        };
        distances.get(&outcome.branch).copied()
    }

    /// Whether the method was entered
    #[inline]
    #[must_use]
    pub fn entered(&self, method: &MethodRef) -> bool {
        self.entered_methods.contains(method)
    }

    /// Entered methods without branches
    #[inline]
    pub fn covered_branchless_methods(&self) -> impl Iterator<Item = &MethodRef> + '_ {
        self.branchless_methods.iter()
    }

    /// Whether the method returned normally at least once
    #[inline]
    #[must_use]
    pub fn returned_normally(&self, method: &MethodRef) -> bool {
        self.normally_returned.contains(method)
    }

    /// Whether the instruction executed
    #[inline]
    #[must_use]
    pub fn executed(&self, instruction: InstructionId) -> bool {
        self.executed_instructions.contains(&instruction)
    }

    /// Whether the line of the method executed
    #[must_use]
    pub fn is_line_covered(&self, method: &MethodRef, line: u32) -> bool {
        self.covered_lines
            .get(method)
            .is_some_and(|lines| lines.contains(&line))
    }

    /// Total number of covered lines across methods
    #[must_use]
    pub fn covered_line_count(&self) -> usize {
        self.covered_lines.values().map(BTreeSet::len).sum()
    }

    /// Mutants whose mutated code executed
    #[inline]
    pub fn touched_mutants(&self) -> impl Iterator<Item = MutationId> + '_ {
        self.touched_mutants.iter().copied()
    }

    /// Mutants that were killed
    #[inline]
    pub fn killed_mutants(&self) -> impl Iterator<Item = MutationId> + '_ {
        self.killed_mutants.iter().copied()
    }

    /// Whether the mutant's mutated code executed
    #[inline]
    #[must_use]
    pub fn is_touched(&self, mutation: MutationId) -> bool {
        self.touched_mutants.contains(&mutation)
    }

    /// Whether the mutant was killed
    #[inline]
    #[must_use]
    pub fn is_killed(&self, mutation: MutationId) -> bool {
        self.killed_mutants.contains(&mutation)
    }

    /// Whether the input category was observed on the method
    #[must_use]
    pub fn observed_input(&self, method: &MethodRef, category: &str) -> bool {
        self.inputs.get(method).is_some_and(|c| c.contains(category))
    }

    /// Whether the output category was observed on the method
    #[must_use]
    pub fn observed_output(&self, method: &MethodRef, category: &str) -> bool {
        self.outputs.get(method).is_some_and(|c| c.contains(category))
    }

    /// Whether the outcome was taken under the given context
    #[must_use]
    pub fn is_context_outcome_covered(&self, outcome: BranchOutcome, context: &CallContext) -> bool {
        self.context_outcomes.contains(&(outcome, context.clone()))
    }

    /// Whether a method was entered under the given context
    #[inline]
    #[must_use]
    pub fn is_context_entered(&self, context: &CallContext) -> bool {
        self.context_entries.contains(context)
    }

    /// Exceptions in the order they were raised
    #[inline]
    #[must_use]
    pub fn thrown_exceptions(&self) -> &[ThrownException] {
        &self.thrown
    }

    /// Positions (test statement indices) where exceptions were raised
    pub fn positions_where_exceptions_were_thrown(&self) -> impl Iterator<Item = usize> + '_ {
        self.thrown.iter().map(|e| e.position)
    }
}

fn keep_min(map: &mut BTreeMap<BranchId, f64>, branch: BranchId, distance: f64) {
    map.entry(branch)
        .and_modify(|d| *d = d.min(distance))
        .or_insert(distance);
}
