//! Result-count limits for list endpoints.

use serde::{Deserialize, Serialize};

/// Maximum number of rows any list endpoint returns.
pub const MAX_LIMIT: u64 = 500;

/// Requested number of rows, clamped to `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListLimit(u64);

impl ListLimit {
    /// Default limit for audit and list reads.
    pub const DEFAULT: Self = Self(100);

    /// Creates a limit, clamping out-of-range values.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value.clamp(1, MAX_LIMIT))
    }

    /// Builds a limit from an optional query parameter.
    #[must_use]
    pub fn from_query(value: Option<u64>) -> Self {
        value.map_or(Self::DEFAULT, Self::new)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for ListLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_100() {
        assert_eq!(ListLimit::from_query(None).get(), 100);
        assert_eq!(ListLimit::default().get(), 100);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(ListLimit::new(0).get(), 1);
        assert_eq!(ListLimit::new(10_000).get(), MAX_LIMIT);
        assert_eq!(ListLimit::from_query(Some(25)).get(), 25);
    }
}
