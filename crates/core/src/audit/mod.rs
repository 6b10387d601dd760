//! Audit records and field-level diffs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::policy::ActorMetadata;

/// Audited verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Fields changed.
    Update,
    /// Entity deleted.
    Delete,
    /// Lifecycle directive applied.
    Transition,
    /// Approval granted.
    Approve,
    /// Approval refused.
    Reject,
    /// Invoice or order action.
    StatusChange,
    /// Recurring schedule spawned a request.
    Spawn,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Transition => "TRANSITION",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::StatusChange => "STATUS_CHANGE",
            Self::Spawn => "SPAWN",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audited entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEntity {
    /// Purchase request.
    Request,
    /// Approval step.
    Approval,
    /// Budget.
    Budget,
    /// Negotiation.
    Negotiation,
    /// Invoice.
    Invoice,
    /// Purchase order.
    PurchaseOrder,
    /// Recurring schedule.
    RecurringSchedule,
    /// Vendor quote.
    Quote,
    /// Vendor.
    Vendor,
    /// Contract.
    Contract,
    /// Attachment metadata.
    Attachment,
    /// Deferred task.
    Task,
}

impl AuditEntity {
    /// Returns the string representation of the entity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "ProcurementRequest",
            Self::Approval => "Approval",
            Self::Budget => "Budget",
            Self::Negotiation => "Negotiation",
            Self::Invoice => "Invoice",
            Self::PurchaseOrder => "PurchaseOrder",
            Self::RecurringSchedule => "RecurringSchedule",
            Self::Quote => "Quote",
            Self::Vendor => "Vendor",
            Self::Contract => "Contract",
            Self::Attachment => "Attachment",
            Self::Task => "ScheduledTask",
        }
    }
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    /// Who did it; `None` for system actions such as the scheduler.
    pub actor_id: Option<Uuid>,
    /// Request the entry belongs to.
    pub request_id: Option<Uuid>,
    /// Verb.
    pub action: AuditAction,
    /// Entity kind.
    pub entity: AuditEntity,
    /// Entity id.
    pub entity_id: Uuid,
    /// Snapshot before.
    pub before: Option<Value>,
    /// Snapshot after.
    pub after: Option<Value>,
    /// Transport metadata.
    pub metadata: ActorMetadata,
}

impl AuditRecord {
    /// Starts a record.
    #[must_use]
    pub fn new(action: AuditAction, entity: AuditEntity, entity_id: Uuid) -> Self {
        Self {
            actor_id: None,
            request_id: None,
            action,
            entity,
            entity_id,
            before: None,
            after: None,
            metadata: ActorMetadata::default(),
        }
    }

    /// Sets the actor and its metadata.
    #[must_use]
    pub fn by(mut self, actor_id: Uuid, metadata: &ActorMetadata) -> Self {
        self.actor_id = Some(actor_id);
        self.metadata = metadata.clone();
        self
    }

    /// Links a request.
    #[must_use]
    pub fn for_request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Attaches snapshots.
    #[must_use]
    pub fn snapshots(mut self, before: Option<Value>, after: Option<Value>) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    /// Diff between the snapshots, when both are present.
    #[must_use]
    pub fn diff(&self) -> Option<Value> {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => compute_diff(before, after),
            _ => None,
        }
    }
}

/// `{field: {from, to}}` for every key of `after` whose value differs from
/// `before`. `None` when nothing changed or `after` is not an object.
#[must_use]
pub fn compute_diff(before: &Value, after: &Value) -> Option<Value> {
    let after = after.as_object()?;
    let mut changes = Map::new();
    for (key, to) in after {
        let from = before.get(key).unwrap_or(&Value::Null);
        if from != to {
            changes.insert(
                key.clone(),
                serde_json::json!({ "from": from, "to": to }),
            );
        }
    }
    if changes.is_empty() {
        None
    } else {
        Some(Value::Object(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_lists_changed_keys_only() {
        let before = json!({"status": "DRAFT", "quantity": 40, "category": "furniture"});
        let after = json!({"status": "SOURCING", "quantity": 40});
        assert_eq!(
            compute_diff(&before, &after),
            Some(json!({"status": {"from": "DRAFT", "to": "SOURCING"}}))
        );
    }

    #[test]
    fn test_diff_new_key_is_from_null() {
        let diff = compute_diff(&json!({}), &json!({"budgetId": "b1"})).unwrap();
        assert_eq!(diff["budgetId"]["from"], Value::Null);
    }

    #[test]
    fn test_no_changes() {
        let v = json!({"a": 1});
        assert_eq!(compute_diff(&v, &v), None);
        assert_eq!(compute_diff(&v, &json!(3)), None);
    }

    #[test]
    fn test_record_builder() {
        let id = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let record = AuditRecord::new(AuditAction::Update, AuditEntity::Request, id)
            .by(actor, &ActorMetadata::default())
            .for_request(id)
            .snapshots(Some(json!({"a": 1})), Some(json!({"a": 2})));
        assert_eq!(record.actor_id, Some(actor));
        assert_eq!(record.diff(), Some(json!({"a": {"from": 1, "to": 2}})));
        assert_eq!(record.entity.as_str(), "ProcurementRequest");
    }
}
