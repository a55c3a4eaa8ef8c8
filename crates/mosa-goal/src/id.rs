//! Identifiers shared by goals, traces and control-flow facts
//!
//! All identifiers are cheap to clone and hash: numeric newtypes for
//! analysis-assigned ids, and [`MethodRef`] backed by shared `Arc<str>`
//! segments so goals can be copied freely between sets and maps.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Analysis-assigned id of a conditional branch instruction
    BranchId,
    "B"
);
numeric_id!(
    /// Id of a single instruction of the unit under test
    InstructionId,
    "I"
);
numeric_id!(
    /// Id of a basic block in a method's control-flow graph
    BlockId,
    "BB"
);
numeric_id!(
    /// Id of a mutation applied to the unit under test
    MutationId,
    "M"
);

/// Fully qualified method: owning class plus method name (with descriptor)
///
/// Displays as `Class.method`. The method part may carry a descriptor such
/// as `parse(Ljava/lang/String;)I`; dots inside the descriptor are not
/// treated as separators when parsing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    class: Arc<str>,
    method: Arc<str>,
}

impl MethodRef {
    /// Create a method reference
    #[inline]
    #[must_use]
    pub fn new(class: impl AsRef<str>, method: impl AsRef<str>) -> Self {
        Self {
            class: Arc::from(class.as_ref()),
            method: Arc::from(method.as_ref()),
        }
    }

    /// Owning class name
    #[inline]
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Method name, including descriptor when present
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.method)
    }
}

impl FromStr for MethodRef {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let descriptor_start = s.find('(').unwrap_or(s.len());
        let split = s[..descriptor_start]
            .rfind('.')
            .ok_or_else(|| GoalError::MalformedMethod(s.to_string()))?;

        let (class, method) = (&s[..split], &s[split + 1..]);
        if class.is_empty() || method.is_empty() {
            return Err(GoalError::MalformedMethod(s.to_string()));
        }

        Ok(Self::new(class, method))
    }
}

/// A branch decision: the branch and the outcome it must take
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchOutcome {
    /// Branch instruction
    pub branch: BranchId,
    /// `true` for the taken (then) edge, `false` for the fall-through edge
    pub value: bool,
}

impl BranchOutcome {
    /// Create a branch outcome
    #[inline]
    #[must_use]
    pub fn new(branch: BranchId, value: bool) -> Self {
        Self { branch, value }
    }

    /// The opposite outcome of the same branch
    #[inline]
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            branch: self.branch,
            value: !self.value,
        }
    }
}

impl Display for BranchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.branch, if self.value { "T" } else { "F" })
    }
}

/// Calling context: the chain of call sites leading into a method, outermost first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CallContext(Vec<MethodRef>);

impl CallContext {
    /// Create a context from a call chain
    #[inline]
    #[must_use]
    pub fn new(chain: Vec<MethodRef>) -> Self {
        Self(chain)
    }

    /// Context of a method invoked directly by the test
    #[inline]
    #[must_use]
    pub fn direct(method: MethodRef) -> Self {
        Self(vec![method])
    }

    /// Call chain, outermost first
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &[MethodRef] {
        &self.0
    }

    /// Depth of the chain
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CallContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for m in &self.0 {
            if !first {
                f.write_str(" -> ")?;
            }
            write!(f, "{m}")?;
            first = false;
        }
        Ok(())
    }
}

/// Errors produced by the goal model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GoalError {
    /// Text could not be split into `Class.method`
    #[error("malformed method reference: '{0}' (expected Class.method)")]
    MalformedMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_ref_display() {
        let m = MethodRef::new("com.acme.Stack", "push(I)V");
        assert_eq!(m.to_string(), "com.acme.Stack.push(I)V");
        assert_eq!(m.class(), "com.acme.Stack");
        assert_eq!(m.method(), "push(I)V");
    }

    #[test]
    fn method_ref_parse_ignores_descriptor_dots() {
        let m: MethodRef = "a.B.parse(Ljava.lang.String;)I".parse().unwrap();
        assert_eq!(m.class(), "a.B");
        assert_eq!(m.method(), "parse(Ljava.lang.String;)I");
    }

    #[test]
    fn method_ref_parse_rejects_missing_class() {
        assert!("parse".parse::<MethodRef>().is_err());
        assert!(".parse".parse::<MethodRef>().is_err());
        assert!("Foo.".parse::<MethodRef>().is_err());
    }

    #[test]
    fn branch_outcome_negated() {
        let o = BranchOutcome::new(BranchId(3), true);
        assert_eq!(o.negated(), BranchOutcome::new(BranchId(3), false));
        assert_eq!(o.to_string(), "B3:T");
    }

    #[test]
    fn call_context_display() {
        let ctx = CallContext::new(vec![MethodRef::new("A", "a"), MethodRef::new("B", "b")]);
        assert_eq!(ctx.to_string(), "A.a -> B.b");
        assert_eq!(ctx.len(), 2);
    }
}
