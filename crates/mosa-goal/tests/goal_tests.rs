use mosa_goal::{
    normalize, BranchId, BranchOutcome, CoverageGoal, ExceptionKind, ExecutionTrace, InstructionId, MethodRef,
    MutationId,
};
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Plain fields a goal is built from; building twice must give equal goals
#[derive(Debug, Clone, PartialEq)]
struct GoalFields {
    kind: u8,
    class: &'static str,
    method: &'static str,
    id: u32,
}

impl GoalFields {
    fn build(&self) -> CoverageGoal {
        let method = MethodRef::new(self.class, self.method);
        match self.kind {
            0 => CoverageGoal::branch_true(method, BranchId(self.id)),
            1 => CoverageGoal::branch_false(method, BranchId(self.id)),
            2 => CoverageGoal::statement(method, InstructionId(self.id)),
            3 => CoverageGoal::line(method, self.id),
            4 => CoverageGoal::weak_mutant(method, MutationId(self.id)),
            5 => CoverageGoal::strong_mutant(method, MutationId(self.id)),
            6 => CoverageGoal::try_catch(method, BranchOutcome::new(BranchId(self.id), true)),
            _ => CoverageGoal::exception(method, &format!("E{}", self.id), ExceptionKind::Explicit),
        }
    }
}

fn arb_fields() -> impl Strategy<Value = GoalFields> {
    (
        0u8..8,
        prop::sample::select(vec!["Stack", "Calc"]),
        prop::sample::select(vec!["push(I)V", "pop()I"]),
        0u32..6,
    )
        .prop_map(|(kind, class, method, id)| GoalFields {
            kind,
            class,
            method,
            id,
        })
}

fn arb_distance() -> impl Strategy<Value = f64> {
    prop_oneof![0.0f64..100.0, Just(f64::INFINITY)]
}

fn hash_of(goal: &CoverageGoal) -> u64 {
    let mut hasher = DefaultHasher::new();
    goal.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn prop_goal_identity_follows_fields(a in arb_fields(), b in arb_fields()) {
        let (ga, gb) = (a.build(), b.build());

        prop_assert_eq!(&ga, &a.build());
        prop_assert_eq!(hash_of(&ga), hash_of(&a.build()));
        prop_assert_eq!(ga == gb, a == b);
        if ga == gb {
            prop_assert_eq!(hash_of(&ga), hash_of(&gb));
        }

        let set: HashSet<CoverageGoal> = [ga, gb, a.build()].into_iter().collect();
        prop_assert_eq!(set.len(), if a == b { 1 } else { 2 });
    }

    #[test]
    fn prop_normalize_stays_in_unit_range(distance in prop_oneof![
        0.0f64..1e12,
        Just(f64::MAX),
        Just(f64::INFINITY),
    ]) {
        let n = normalize(distance);
        prop_assert!((0.0..=1.0).contains(&n), "normalize({}) = {}", distance, n);
    }

    #[test]
    fn prop_branch_fitness_is_never_negative(
        distances in prop::collection::vec((arb_distance(), arb_distance()), 0..6),
    ) {
        let method = MethodRef::new("Calc", "abs(I)I");
        let mut trace = ExecutionTrace::new();
        trace.record_method_entry(method.clone());
        for (t, f) in &distances {
            trace.record_predicate(BranchId(1), *t, *f);
        }

        for goal in [
            CoverageGoal::branch_true(method.clone(), BranchId(1)),
            CoverageGoal::branch_false(method.clone(), BranchId(1)),
        ] {
            let fitness = goal.fitness(&trace);
            prop_assert!((0.0..=2.0).contains(&fitness), "{} scored {}", goal, fitness);
        }
    }
}
