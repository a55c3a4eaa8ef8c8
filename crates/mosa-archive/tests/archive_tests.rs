use mosa_archive::{Archive, CoverageUpdate, TestCandidate};
use mosa_goal::{BranchId, CoverageGoal, Criterion, InstructionId, MethodRef};
use mosa_test_utils::{branch_pair, FixtureTest};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn method() -> MethodRef {
    MethodRef::new("Calc", "abs(I)I")
}

fn two_branch_archive() -> Archive<FixtureTest> {
    let mut goals = branch_pair(&method(), 1).to_vec();
    goals.extend(branch_pair(&method(), 2));
    let roots = branch_pair(&method(), 1);
    Archive::new(goals, roots).unwrap()
}

#[test]
fn smaller_witness_replaces_until_single_statement() {
    let mut archive = two_branch_archive();
    let goal = CoverageGoal::branch_true(method(), BranchId(1));
    let t1 = FixtureTest::sized(5);
    let t2 = FixtureTest::sized(3);
    let t3 = FixtureTest::sized(1);

    assert_eq!(archive.record_coverage(&goal, &t1).unwrap(), CoverageUpdate::Installed);
    assert_eq!(
        archive.record_coverage(&goal, &t2).unwrap(),
        CoverageUpdate::Replaced { previous: t1.id() }
    );
    assert_eq!(archive.record_coverage(&goal, &t3).unwrap(), CoverageUpdate::Kept);

    assert_eq!(archive.best_test(&goal), Some(&t2));
    assert!(archive.goals_of(t1.id()).is_none());
    assert_eq!(archive.goals_of(t2.id()).map(|g| g.len()), Some(1));
    assert!(archive.check_invariants().is_ok());
}

#[test]
fn one_test_can_witness_many_goals() {
    let mut archive = two_branch_archive();
    let test = FixtureTest::sized(4);
    let [t1, f1] = branch_pair(&method(), 1);
    archive.record_coverage(&t1, &test).unwrap();
    archive.record_coverage(&f1, &test).unwrap();

    assert_eq!(archive.solution_count(), 1);
    assert_eq!(archive.best_tests_archive(), vec![&test]);
    assert_eq!(archive.covered_count_of(Criterion::Branch), 2);
    assert_eq!(archive.uncovered_count_of(Criterion::Branch), 2);
    assert!(archive.current_goals().is_empty());

    // replacing one of its goals keeps the test as witness of the other
    let smaller = FixtureTest::sized(2);
    archive.record_coverage(&t1, &smaller).unwrap();
    assert_eq!(archive.solution_count(), 2);
    assert_eq!(archive.goals_of(test.id()).map(|g| g.len()), Some(1));
}

#[test]
fn runtime_goal_joins_the_partitions() {
    let mut archive = two_branch_archive();
    let goal = CoverageGoal::method_call(MethodRef::new("Calc", "reset()V"));
    archive.register_goal(goal.clone()).unwrap();

    assert_eq!(archive.goal_count(), 5);
    assert!(archive.uncovered_goals().contains(&goal));
    assert!(!archive.is_method_fully_covered(goal.method()));
    assert!(archive.register_goal(goal.clone()).is_err());

    archive.record_coverage(&goal, &FixtureTest::sized(1)).unwrap();
    assert!(archive.is_method_fully_covered(goal.method()));
}

#[test]
fn summary_serializes() {
    let mut archive = two_branch_archive();
    archive
        .record_coverage(&CoverageGoal::branch_true(method(), BranchId(1)), &FixtureTest::sized(2))
        .unwrap();
    let json = serde_json::to_value(archive.summary()).unwrap();
    assert_eq!(json["goals"], 4);
    assert_eq!(json["covered"], 1);
    assert_eq!(json["coverage"], 0.25);
}

#[test]
fn covering_thousands_of_goals_stays_fast() {
    const GOALS: u32 = 10_000;
    let goals: Vec<CoverageGoal> = (0..GOALS)
        .map(|i| CoverageGoal::statement(method(), InstructionId(i)))
        .collect();
    let mut archive: Archive<FixtureTest> = Archive::new(goals.clone(), goals.clone()).unwrap();

    let start = Instant::now();
    for goal in &goals {
        archive.record_coverage(goal, &FixtureTest::sized(2)).unwrap();
    }
    let elapsed = start.elapsed();

    assert_eq!(archive.covered_count(), goals.len());
    assert!(archive.current_goals().is_empty());
    assert!(archive.uncovered_goals().is_empty());
    assert!(archive.is_method_fully_covered(&method()));
    assert!(archive.check_invariants().is_ok());
    assert!(elapsed < Duration::from_secs(2), "covering {GOALS} goals took {elapsed:?}");
}

#[derive(Debug, Clone)]
enum Op {
    Cover { goal: usize, size: usize },
    Promote { goal: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, 1usize..10).prop_map(|(goal, size)| Op::Cover { goal, size }),
        (0usize..4).prop_map(|goal| Op::Promote { goal }),
    ]
}

proptest! {
    #[test]
    fn prop_archive_is_monotonic(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut archive = two_branch_archive();
        let goals: Vec<CoverageGoal> = archive.goals().iter().cloned().collect();

        for op in ops {
            let before_covered = archive.covered_count();
            let before_size = match &op {
                Op::Cover { goal, .. } => archive.best_test(&goals[*goal]).map(|t| t.size),
                Op::Promote { .. } => None,
            };

            match op {
                Op::Cover { goal, size } => {
                    let update = archive.record_coverage(&goals[goal], &FixtureTest::sized(size)).unwrap();
                    let after = archive.best_test(&goals[goal]).map(|t| t.size);
                    match (before_size, after) {
                        (None, Some(s)) => {
                            prop_assert_eq!(s, size);
                            prop_assert_eq!(update, CoverageUpdate::Installed);
                        }
                        (Some(b), Some(a)) => {
                            prop_assert!(a <= b);
                            prop_assert_eq!(a < b, size < b && size > 1);
                        }
                        _ => prop_assert!(false, "covered goal lost its witness"),
                    }
                }
                Op::Promote { goal } => {
                    let added = archive.add_current(&goals[goal]);
                    prop_assert!(!added || archive.uncovered_goals().contains(&goals[goal]));
                }
            }

            prop_assert!(archive.covered_count() >= before_covered);
            prop_assert_eq!(archive.covered_count() + archive.uncovered_count(), archive.goal_count());
            prop_assert!(archive.check_invariants().is_ok());
        }
    }
}
