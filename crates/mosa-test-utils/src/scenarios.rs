//! Small control-flow shapes shared by the integration tests

use crate::{branch_pair, FixtureFacts};
use mosa_goal::{CoverageGoal, InstructionId, MethodRef};

/// Facts for one method plus the goals a search run would target in it
#[derive(Debug, Clone)]
pub struct Scenario {
    pub method: MethodRef,
    pub facts: FixtureFacts,
    pub goals: Vec<CoverageGoal>,
}

/// `abs(x)`: a single `if` with no enclosing decision
///
/// ```text
/// BB0 [I0, I1: B1] -> BB1 [I2] (B1:T)
///     \-----------------------> BB2 [I3]
/// ```
#[must_use]
pub fn single_if() -> Scenario {
    let method = MethodRef::new("Calc", "abs(I)I");
    let facts = FixtureFacts::new()
        .block(&method, 0, &[0, 1], &[])
        .block(&method, 1, &[2], &[0])
        .block(&method, 2, &[3], &[0, 1])
        .conditional(&method, 1, 1)
        .depends(&[2], &[(1, true)])
        .root_dependent(&[0, 1, 3]);

    let goals = branch_pair(&method, 1).to_vec();
    Scenario { method, facts, goals }
}

/// `classify(x, y)`: an `if` nested in another `if`, with a statement in
/// the inner block
///
/// ```text
/// BB0 [I0, I1: B1] -> BB1 [I2, I3: B2] (B1:T) -> BB2 [I4] (B1:T, B2:T)
///      all paths join in BB3 [I5]
/// ```
#[must_use]
pub fn nested_if() -> Scenario {
    let method = MethodRef::new("Calc", "classify(II)I");
    let facts = FixtureFacts::new()
        .block(&method, 0, &[0, 1], &[])
        .block(&method, 1, &[2, 3], &[0])
        .block(&method, 2, &[4], &[1])
        .block(&method, 3, &[5], &[0, 1, 2])
        .conditional(&method, 1, 1)
        .conditional(&method, 2, 3)
        .depends(&[2, 3], &[(1, true)])
        .depends(&[4], &[(1, true), (2, true)])
        .root_dependent(&[0, 1, 5]);

    let mut goals = branch_pair(&method, 1).to_vec();
    goals.extend(branch_pair(&method, 2));
    goals.push(CoverageGoal::statement(method.clone(), InstructionId(4)));
    Scenario { method, facts, goals }
}
