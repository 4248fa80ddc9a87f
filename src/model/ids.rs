//! Session-scoped identity generation for visuals.
//!
//! Identities are decimal strings so they survive a trip through the JSON
//! block embedded in the pull request description. The generator is an
//! owned value rather than process-wide state; whoever builds presentations
//! threads it through explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a visual within a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualId(String);

impl VisualId {
    /// Wraps an identity read from serialized data or supplied by a caller.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identity value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Numeric value of the identity, when it is a decimal integer.
    ///
    /// Identities issued by [`IdentityGenerator`] always have one; imported
    /// identities may not.
    #[must_use]
    pub fn numeric(&self) -> Option<u64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VisualId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Returns true when the identity is usable, i.e. non-empty.
#[must_use]
pub const fn is_valid(id: &str) -> bool {
    !id.is_empty()
}

/// Monotonic counter issuing [`VisualId`]s.
///
/// # Examples
///
/// ```
/// use storyline::model::IdentityGenerator;
///
/// let mut ids = IdentityGenerator::new();
/// assert_eq!(ids.next_id().as_str(), "1");
///
/// ids.init_id(41);
/// assert_eq!(ids.next_id().as_str(), "42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityGenerator {
    last: u64,
}

impl IdentityGenerator {
    /// Creates a generator whose first identity is `"1"`.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Issues the next identity.
    pub fn next_id(&mut self) -> VisualId {
        self.last = self.last.saturating_add(1);
        VisualId(self.last.to_string())
    }

    /// Resets the counter so the next issued identity is `seed + 1`.
    pub const fn init_id(&mut self, seed: u64) {
        self.last = seed;
    }

    /// The most recently issued value (or the reseed value), zero when
    /// nothing has been issued yet.
    #[must_use]
    pub const fn last_issued(&self) -> u64 {
        self.last
    }
}
