//! Human-readable document numbers, e.g. `PO-2026-00042`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of numbered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Purchase request.
    Request,
    /// Vendor quote.
    Quote,
    /// Contract.
    Contract,
    /// Purchase order.
    PurchaseOrder,
}

impl DocumentKind {
    /// Number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Request => "PR",
            Self::Quote => "Q",
            Self::Contract => "C",
            Self::PurchaseOrder => "PO",
        }
    }

    /// `<prefix>-<year>-<5-digit sequence>`.
    #[must_use]
    pub fn format(self, year: i32, sequence: i64) -> String {
        format!("{}-{year}-{sequence:05}", self.prefix())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(DocumentKind::PurchaseOrder.format(2026, 1), "PO-2026-00001");
        assert_eq!(DocumentKind::Request.format(2026, 42), "PR-2026-00042");
        assert_eq!(DocumentKind::Quote.format(2027, 12345), "Q-2027-12345");
        assert_eq!(DocumentKind::Contract.to_string(), "C");
    }
}
