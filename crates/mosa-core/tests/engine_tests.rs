use mosa_core::{EngineError, FrontierEngine, SearchConfig};
use mosa_goal::{
    BranchId, BranchOutcome, CoverageGoal, Criterion, ExceptionKind, ExecutionTrace, InstructionId, MethodRef, MutationId,
    ThrownException, WORST_FITNESS,
};
use mosa_test_utils::{branch_pair, init_tracing, scenarios, FixtureFacts, FixtureTest, TraceBuilder};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;

fn engine_for(facts: &FixtureFacts, goals: Vec<CoverageGoal>, config: SearchConfig) -> FrontierEngine<FixtureTest> {
    init_tracing();
    FrontierEngine::initialize(goals, facts, config).unwrap()
}

fn nested_engine() -> (scenarios::Scenario, FrontierEngine<FixtureTest>) {
    let s = scenarios::nested_if();
    let config = SearchConfig::new().with_criterion(Criterion::Statement);
    let engine = engine_for(&s.facts, s.goals.clone(), config);
    (s, engine)
}

fn sorted(goals: impl IntoIterator<Item = CoverageGoal>) -> Vec<CoverageGoal> {
    let mut goals: Vec<CoverageGoal> = goals.into_iter().collect();
    goals.sort();
    goals
}

fn current(engine: &FrontierEngine<FixtureTest>) -> Vec<CoverageGoal> {
    sorted(engine.current_goals().iter().cloned())
}

fn covered(engine: &FrontierEngine<FixtureTest>) -> Vec<CoverageGoal> {
    sorted(engine.covered_goals().keys().cloned())
}

// Frontier

#[test]
fn initial_frontier_is_the_outer_branch() {
    let (s, engine) = nested_engine();
    assert_eq!(current(&engine), sorted(branch_pair(&s.method, 1)));
    assert_eq!(engine.uncovered_goals().len(), 5);
    assert!(engine.covered_goals().is_empty());
}

#[test]
fn covering_outer_branch_opens_inner_goals() {
    let (s, mut engine) = nested_engine();
    let trace = TraceBuilder::new().entered(&s.method).took(1, false).build();

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(3), &trace).unwrap();

    let [outer_t, outer_f] = branch_pair(&s.method, 1);
    let [inner_t, inner_f] = branch_pair(&s.method, 2);
    assert_eq!(eval.newly_covered, vec![outer_f.clone()]);
    assert_eq!(eval.fitness_of(&outer_f), Some(0.0));
    assert_eq!(eval.fitness_of(&inner_t), Some(1.0));
    assert_eq!(covered(&engine), vec![outer_f]);
    assert_eq!(current(&engine), sorted([outer_t, inner_t, inner_f]));
}

#[test]
fn worklist_covers_the_whole_chain_in_one_candidate() {
    let (s, mut engine) = nested_engine();
    let trace = TraceBuilder::new()
        .entered(&s.method)
        .took(1, true)
        .took(2, true)
        .executed(&[0, 1, 2, 3, 4, 5])
        .build();

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(4), &trace).unwrap();

    let [outer_t, outer_f] = branch_pair(&s.method, 1);
    let [inner_t, inner_f] = branch_pair(&s.method, 2);
    let statement = CoverageGoal::statement(s.method.clone(), InstructionId(4));
    assert_eq!(eval.newly_covered.len(), 3);
    assert_eq!(covered(&engine), sorted([outer_t, inner_t, statement]));
    assert_eq!(current(&engine), sorted([outer_f, inner_f]));
    assert_eq!(engine.best_tests_archive().len(), 1);
}

#[test]
fn fast_path_covers_goals_outside_the_frontier() {
    let (s, mut engine) = nested_engine();
    // inner outcome recorded without the outer one, as after instrumentation gaps
    let trace = TraceBuilder::new().entered(&s.method).took(2, true).executed(&[4]).build();

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    let [inner_t, _] = branch_pair(&s.method, 2);
    let statement = CoverageGoal::statement(s.method.clone(), InstructionId(4));
    assert!(eval.improved());
    assert_eq!(covered(&engine), sorted([inner_t, statement.clone()]));
    assert_eq!(eval.fitness_of(&statement), Some(0.0));
    assert_eq!(current(&engine), sorted(branch_pair(&s.method, 1)));
}

#[test]
fn covered_goals_leave_the_frontier_for_good() {
    let (s, mut engine) = nested_engine();
    let first = TraceBuilder::new().entered(&s.method).took(1, false).build();
    engine.on_candidate_evaluated(&FixtureTest::sized(3), &first).unwrap();

    let [_, outer_f] = branch_pair(&s.method, 1);
    let second = TraceBuilder::new().entered(&s.method).took(1, true).build();
    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(2), &second).unwrap();

    assert!(eval.fitness_of(&outer_f).is_none());
    assert!(!engine.current_goals().contains(&outer_f));
    assert!(engine.covered_goals().contains_key(&outer_f));
}

#[test]
fn method_goals_follow_their_method_spine() {
    let s = scenarios::nested_if();
    let call = CoverageGoal::method_call(s.method.clone());
    let clean = CoverageGoal::method_no_exception(s.method.clone());
    let mut goals = s.goals[..4].to_vec();
    goals.extend([call.clone(), clean.clone()]);
    let config = SearchConfig::new().with_criteria([Criterion::Branch, Criterion::Method, Criterion::MethodNoException]);
    let mut engine = engine_for(&s.facts, goals, config);

    let trace = TraceBuilder::new()
        .entered(&s.method)
        .took(1, false)
        .returned(&s.method)
        .build();
    engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    assert!(engine.covered_goals().contains_key(&call));
    assert!(engine.covered_goals().contains_key(&clean));
}

// Unusable runs

#[test]
fn timeout_leaves_the_archive_untouched() {
    let s = scenarios::single_if();
    let mut engine = engine_for(&s.facts, s.goals.clone(), SearchConfig::default());
    let before = current(&engine);

    let eval = engine
        .on_candidate_evaluated(&FixtureTest::sized(1), &ExecutionTrace::timed_out())
        .unwrap();

    assert!(eval.skipped);
    assert!(!eval.improved());
    for goal in &s.goals {
        assert_eq!(eval.fitness_of(goal), Some(WORST_FITNESS));
    }
    assert!(engine.covered_goals().is_empty());
    assert_eq!(current(&engine), before);
}

#[test]
fn uncaught_exception_is_unusable() {
    let s = scenarios::single_if();
    let mut engine = engine_for(&s.facts, s.goals.clone(), SearchConfig::default());
    let trace = TraceBuilder::new()
        .entered(&s.method)
        .took(1, true)
        .uncaught_exception()
        .build();

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(1), &trace).unwrap();
    assert!(eval.skipped);
    assert!(engine.covered_goals().is_empty());
}

#[test]
fn empty_traces_skipped_only_when_configured() {
    let s = scenarios::single_if();
    let trace = TraceBuilder::new().entered(&s.method).took(1, true).build();

    let mut lenient = engine_for(&s.facts, s.goals.clone(), SearchConfig::default());
    assert!(!lenient.on_candidate_evaluated(&FixtureTest::sized(1), &trace).unwrap().skipped);

    let strict_config = SearchConfig::default().with_skip_empty_traces(true);
    let mut strict = engine_for(&s.facts, s.goals.clone(), strict_config);
    assert!(strict.on_candidate_evaluated(&FixtureTest::sized(1), &trace).unwrap().skipped);

    let with_lines = TraceBuilder::new().entered(&s.method).took(1, true).line(&s.method, 3).build();
    assert!(!strict.on_candidate_evaluated(&FixtureTest::sized(1), &with_lines).unwrap().skipped);
}

// Mutation

#[test]
fn unguarded_strong_mutant_is_live_from_the_start() {
    let s = scenarios::single_if();
    let facts = s.facts.clone().mutation(1, &[]);
    let mutant = CoverageGoal::strong_mutant(s.method.clone(), MutationId(1));
    let mut goals = s.goals.clone();
    goals.push(mutant.clone());
    let mut engine = engine_for(&facts, goals, SearchConfig::new().with_criterion(Criterion::StrongMutation));

    assert!(engine.current_goals().contains(&mutant));

    let trace = TraceBuilder::new().entered(&s.method).touched(1).killed(1).build();
    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    assert_eq!(eval.newly_covered, vec![mutant.clone()]);
    assert!(engine.covered_goals().contains_key(&mutant));
    assert!(!engine.current_goals().contains(&mutant));
}

#[test]
fn touched_mutant_covered_through_the_fast_path() {
    let s = scenarios::nested_if();
    let facts = s.facts.clone().mutation(1, &[(2, true)]);
    let mutant = CoverageGoal::weak_mutant(s.method.clone(), MutationId(1));
    let mut goals = s.goals[..4].to_vec();
    goals.push(mutant.clone());
    let mut engine = engine_for(&facts, goals, SearchConfig::new().with_criterion(Criterion::WeakMutation));
    assert!(!engine.current_goals().contains(&mutant));

    let trace = TraceBuilder::new().touched(1).build();
    engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    assert!(engine.covered_goals().contains_key(&mutant));
    assert_eq!(current(&engine), sorted(branch_pair(&s.method, 1)));
}

// Exceptions

fn exception_engine() -> (scenarios::Scenario, FrontierEngine<FixtureTest>) {
    let s = scenarios::nested_if();
    let config = SearchConfig::new()
        .with_criterion(Criterion::Exception)
        .with_target_class("Calc");
    let engine = engine_for(&s.facts, s.goals[..4].to_vec(), config);
    (s, engine)
}

#[test]
fn raised_exception_becomes_a_covered_goal() {
    let (s, mut engine) = exception_engine();
    let trace = TraceBuilder::new()
        .entered(&s.method)
        .threw(0, &s.method, "java.lang.ArithmeticException", ExceptionKind::Implicit)
        .build();

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    let goal = CoverageGoal::exception(s.method.clone(), "java.lang.ArithmeticException", ExceptionKind::Implicit);
    assert!(eval.newly_covered.contains(&goal));
    assert!(engine.covered_goals().contains_key(&goal));
    assert_eq!(engine.archive().goal_count(), 5);

    // same exception again: no second registration
    engine.on_candidate_evaluated(&FixtureTest::sized(1), &trace).unwrap();
    assert_eq!(engine.archive().goal_count(), 5);
}

#[test]
fn exception_goals_are_named_after_the_target_class() {
    let (_, mut engine) = exception_engine();
    let helper = MethodRef::new("Helper", "div(II)I");
    let trace = TraceBuilder::new()
        .threw(1, &helper, "java.lang.IllegalStateException", ExceptionKind::Explicit)
        .build();

    engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();

    let goal = CoverageGoal::exception(
        MethodRef::new("Calc", "div(II)I"),
        "java.lang.IllegalStateException",
        ExceptionKind::Explicit,
    );
    assert!(engine.covered_goals().contains_key(&goal));
}

#[test]
fn upfront_exception_goal_is_scored_under_the_target_class() {
    let s = scenarios::nested_if();
    let goal = CoverageGoal::exception(
        MethodRef::new("Calc", "div(II)I"),
        "java.lang.ArithmeticException",
        ExceptionKind::Implicit,
    );
    let mut goals = s.goals[..4].to_vec();
    goals.push(goal.clone());
    let config = SearchConfig::new()
        .with_criterion(Criterion::Exception)
        .with_target_class("Calc");
    let mut engine = engine_for(&s.facts, goals, config);
    assert!(engine.current_goals().contains(&goal));

    let helper = MethodRef::new("Helper", "div(II)I");
    let reflective = TraceBuilder::new()
        .reflection()
        .threw(1, &helper, "java.lang.ArithmeticException", ExceptionKind::Implicit)
        .build();
    assert_eq!(engine.fitness(&goal, &reflective), 1.0);

    let trace = TraceBuilder::new()
        .threw(1, &helper, "java.lang.ArithmeticException", ExceptionKind::Implicit)
        .build();
    assert_eq!(engine.fitness(&goal, &trace), 0.0);

    let eval = engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();
    assert_eq!(eval.fitness_of(&goal), Some(0.0));
    assert_eq!(eval.newly_covered.iter().filter(|g| **g == goal).count(), 1);
    assert!(engine.covered_goals().contains_key(&goal));
    assert!(!engine.current_goals().contains(&goal));
    assert_eq!(engine.archive().goal_count(), 5);
}

#[test]
fn reflection_and_foreign_exceptions_are_ignored() {
    let (s, mut engine) = exception_engine();
    let reflective = TraceBuilder::new()
        .reflection()
        .threw(0, &s.method, "java.lang.NullPointerException", ExceptionKind::Implicit)
        .build();
    engine.on_candidate_evaluated(&FixtureTest::sized(2), &reflective).unwrap();

    let foreign = TraceBuilder::new()
        .exception(ThrownException {
            position: 0,
            method: s.method.clone(),
            exception_type: "java.io.IOException".to_string(),
            kind: ExceptionKind::Declared,
            sut_origin: false,
            skip: false,
        })
        .build();
    engine.on_candidate_evaluated(&FixtureTest::sized(2), &foreign).unwrap();

    assert_eq!(engine.archive().goal_count(), 4);
    assert!(engine.covered_goals().is_empty());
}

// Configuration errors

#[test]
fn goal_of_disabled_criterion_is_rejected() {
    let s = scenarios::nested_if();
    let result = FrontierEngine::<FixtureTest>::initialize(s.goals.clone(), &s.facts, SearchConfig::default());
    assert!(matches!(
        result,
        Err(EngineError::CriterionNotEnabled {
            criterion: Criterion::Statement,
            ..
        })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let s = scenarios::single_if();
    let config = SearchConfig::new().with_criterion(Criterion::Exception);
    let result = FrontierEngine::<FixtureTest>::initialize(s.goals.clone(), &s.facts, config);
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[test]
fn fully_covered_method() {
    let s = scenarios::single_if();
    let mut engine = engine_for(&s.facts, s.goals.clone(), SearchConfig::default());
    for value in [true, false] {
        let trace = TraceBuilder::new().entered(&s.method).took(1, value).build();
        engine.on_candidate_evaluated(&FixtureTest::sized(2), &trace).unwrap();
    }
    assert!(engine.archive().is_method_fully_covered(&s.method));
    assert!(engine.current_goals().is_empty());
    assert!((engine.archive().coverage_ratio() - 1.0).abs() < f64::EPSILON);
}

// Property tests

#[derive(Debug, Clone)]
struct Run {
    outer: Option<bool>,
    inner: Option<bool>,
    entered: bool,
    reached_statement: bool,
    size: usize,
}

fn arb_run() -> impl Strategy<Value = Run> {
    (
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
        any::<bool>(),
        1usize..8,
    )
        .prop_map(|(outer, inner, entered, reached_statement, size)| Run {
            outer,
            inner,
            entered,
            reached_statement,
            size,
        })
}

fn trace_of(method: &MethodRef, run: &Run) -> ExecutionTrace {
    let mut builder = TraceBuilder::new();
    if run.entered {
        builder = builder.entered(method);
    }
    if let Some(value) = run.outer {
        builder = builder.took(1, value);
    }
    if let Some(value) = run.inner {
        builder = builder.took(2, value);
    }
    if run.reached_statement {
        builder = builder.executed(&[4]);
    }
    builder.build()
}

proptest! {
    #[test]
    fn prop_partitions_stay_consistent(runs in prop::collection::vec(arb_run(), 1..12)) {
        let (s, mut engine) = nested_engine();
        let mut witness_sizes: HashMap<CoverageGoal, usize> = HashMap::new();

        for run in &runs {
            let trace = trace_of(&s.method, run);
            let covered_before = engine.covered_goals().len();
            engine.on_candidate_evaluated(&FixtureTest::sized(run.size), &trace).unwrap();

            prop_assert!(engine.archive().check_invariants().is_ok());
            prop_assert!(engine.covered_goals().len() >= covered_before);
            for goal in engine.current_goals() {
                prop_assert!(engine.uncovered_goals().contains(goal));
            }

            // witnesses only ever get smaller
            for (goal, test) in engine.covered_goals() {
                if let Some(&previous) = witness_sizes.get(goal) {
                    prop_assert!(test.size <= previous);
                }
                witness_sizes.insert(goal.clone(), test.size);
            }
        }
    }

    #[test]
    fn prop_taken_outcomes_are_covered(runs in prop::collection::vec(arb_run(), 1..8)) {
        let (s, mut engine) = nested_engine();
        for run in &runs {
            engine.on_candidate_evaluated(&FixtureTest::sized(run.size), &trace_of(&s.method, run)).unwrap();
            for (branch, taken) in [(1, run.outer), (2, run.inner)] {
                if let Some(value) = taken {
                    let goal = CoverageGoal::branch(s.method.clone(), BranchOutcome::new(BranchId(branch), value));
                    prop_assert!(engine.covered_goals().contains_key(&goal));
                }
            }
        }
    }

    #[test]
    fn prop_no_orphaned_frontier(runs in prop::collection::vec(arb_run(), 1..8)) {
        let (s, mut engine) = nested_engine();
        for run in &runs {
            engine.on_candidate_evaluated(&FixtureTest::sized(run.size), &trace_of(&s.method, run)).unwrap();
        }

        let graph = engine.graph();
        for goal in engine.covered_goals().keys() {
            let children = graph.structural_children(goal).chain(engine.dependents().of(goal));
            for child in children {
                prop_assert!(
                    engine.covered_goals().contains_key(child) || engine.current_goals().contains(child),
                    "child {} of covered {} is neither covered nor current",
                    child,
                    goal
                );
            }
        }
    }
}
