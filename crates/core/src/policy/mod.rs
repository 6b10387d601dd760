//! Role and capability policy.
//!
//! Operations ask for a [`Capability`]; roles are mapped to capabilities in
//! one place instead of string checks scattered across handlers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use procura_shared::AppError;

/// Internal user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Raises purchase requests.
    Requester,
    /// Approves requests for a department.
    Manager,
    /// Owns budgets and payments.
    Finance,
    /// Full access.
    Admin,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requester => "requester",
            Self::Manager => "manager",
            Self::Finance => "finance",
            Self::Admin => "admin",
        }
    }

    /// Parses a role, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requester" => Some(Self::Requester),
            "manager" => Some(Self::Manager),
            "finance" => Some(Self::Finance),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something an operation may require of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create budgets and change their monetary fields.
    ManageBudgets,
    /// See budgets of every department.
    ViewAllBudgets,
    /// Register vendors.
    ManageVendors,
    /// Patch `status`/`stage` directly.
    CorrectWorkflowState,
    /// Trigger the recurring tick and deferred tasks.
    RunScheduler,
    /// Read the audit log.
    ViewAuditLog,
    /// Act on requests owned by someone else.
    ActOnAnyRequest,
    /// Approve, dispute and pay invoices.
    SettleInvoices,
    /// See spend analytics across every requester.
    ViewAllSpend,
}

/// Policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Role lacks the capability.
    #[error("role {role} lacks capability {capability:?}")]
    Forbidden {
        /// Caller's role.
        role: Role,
        /// Capability asked for.
        capability: Capability,
    },

    /// Caller neither owns the resource nor may act on others'.
    #[error("user {actor} does not own this request")]
    NotOwner {
        /// Caller id.
        actor: Uuid,
    },
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

/// Maps roles to capabilities.
pub struct Policy;

impl Policy {
    /// Whether `role` holds `capability`.
    #[must_use]
    pub fn allows(role: Role, capability: Capability) -> bool {
        match role {
            Role::Finance | Role::Admin => true,
            Role::Manager => matches!(
                capability,
                Capability::ViewAuditLog | Capability::ActOnAnyRequest
            ),
            Role::Requester => false,
        }
    }

    /// Fails unless `role` holds `capability`.
    pub fn require(role: Role, capability: Capability) -> Result<(), PolicyError> {
        if Self::allows(role, capability) {
            Ok(())
        } else {
            Err(PolicyError::Forbidden { role, capability })
        }
    }
}

/// Request metadata captured for audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorMetadata {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// An authenticated internal user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User id.
    pub id: Uuid,
    /// User role.
    pub role: Role,
    /// Department, used to scope budget reads.
    pub department: Option<String>,
    /// Transport metadata.
    pub metadata: ActorMetadata,
}

impl Actor {
    /// Creates an actor with empty metadata.
    #[must_use]
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            department: None,
            metadata: ActorMetadata::default(),
        }
    }

    /// Sets the department.
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Fails unless this actor holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), PolicyError> {
        Policy::require(self.role, capability)
    }

    /// Fails unless this actor owns `owner_id` or may act on any request.
    pub fn require_owner_or(&self, owner_id: Uuid) -> Result<(), PolicyError> {
        if self.id == owner_id || Policy::allows(self.role, Capability::ActOnAnyRequest) {
            Ok(())
        } else {
            Err(PolicyError::NotOwner { actor: self.id })
        }
    }
}

/// An authenticated vendor-portal account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorActor {
    /// Vendor id.
    pub vendor_id: Uuid,
}
