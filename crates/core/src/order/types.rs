//! Purchase-order domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purchase-order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoStatus {
    /// Sent to the vendor.
    Issued,
    /// Vendor confirmed.
    Acknowledged,
    /// On its way.
    Shipped,
    /// Some goods arrived.
    PartiallyDelivered,
    /// All goods arrived.
    Delivered,
    /// Vendor invoiced.
    Invoiced,
    /// Settled.
    Paid,
    /// Withdrawn.
    Cancelled,
}

impl PoStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "ISSUED",
            Self::Acknowledged => "ACKNOWLEDGED",
            Self::Shipped => "SHIPPED",
            Self::PartiallyDelivered => "PARTIALLY_DELIVERED",
            Self::Delivered => "DELIVERED",
            Self::Invoiced => "INVOICED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ISSUED" => Some(Self::Issued),
            "ACKNOWLEDGED" => Some(Self::Acknowledged),
            "SHIPPED" => Some(Self::Shipped),
            "PARTIALLY_DELIVERED" => Some(Self::PartiallyDelivered),
            "DELIVERED" => Some(Self::Delivered),
            "INVOICED" => Some(Self::Invoiced),
            "PAID" => Some(Self::Paid),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for PoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vendor action on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OrderAction {
    /// Confirm receipt of the PO.
    Acknowledge,
    /// Record a shipment.
    Ship {
        /// Carrier tracking number.
        tracking_number: Option<String>,
        /// Carrier name.
        carrier: Option<String>,
    },
    /// Record arrival of shipped goods.
    Deliver {
        /// Only part of the order arrived.
        #[serde(default)]
        partial: bool,
    },
}

impl OrderAction {
    /// Returns the wire name of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::Ship { .. } => "ship",
            Self::Deliver { .. } => "deliver",
        }
    }
}
