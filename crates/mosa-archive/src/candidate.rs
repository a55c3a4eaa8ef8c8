//! Test candidates as seen by the archive

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Stable identity of an evaluated test candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestId(Ulid);

impl TestId {
    /// Fresh, time-ordered id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Wrap an existing ULID
    #[inline]
    #[must_use]
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Underlying ULID
    #[inline]
    #[must_use]
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for TestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "test-{}", self.0)
    }
}

/// An executed test the archive can keep as a covering witness
///
/// Two candidates with the same [`TestId`] are the same test. `size` is the
/// number of statements; the archive only ever replaces a witness with a
/// strictly smaller one.
pub trait TestCandidate: Clone {
    /// Identity of the test
    fn id(&self) -> TestId;

    /// Number of statements
    fn size(&self) -> usize;
}
