//! Authentication claims for the two token realms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which population a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    /// Employees: requesters, managers, finance, admins.
    Internal,
    /// External vendors using the portal.
    Vendor,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, or vendor ID for the vendor realm).
    pub sub: Uuid,
    /// Token realm.
    pub realm: Realm,
    /// Role name for internal users; empty for vendors.
    #[serde(default)]
    pub role: String,
    /// Department of an internal user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an internal user.
    #[must_use]
    pub fn internal(
        user_id: Uuid,
        role: &str,
        department: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id,
            realm: Realm::Internal,
            role: role.to_string(),
            department,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Creates claims for a vendor account.
    #[must_use]
    pub fn vendor(vendor_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: vendor_id,
            realm: Realm::Vendor,
            role: String::new(),
            department: None,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the subject id.
    #[must_use]
    pub const fn subject(&self) -> Uuid {
        self.sub
    }
}
