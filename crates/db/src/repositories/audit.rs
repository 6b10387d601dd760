//! Audit trail: append inside the caller's transaction, read newest first.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use procura_core::audit::AuditRecord;
use procura_core::policy::{Actor, Capability};
use procura_shared::AppResult;
use procura_shared::types::ListLimit;

use crate::context::EngineContext;
use crate::db_err;
use crate::entities::audit_logs;

/// Filter for audit reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Only entries about this request.
    pub request_id: Option<Uuid>,
    /// Only this entity type, e.g. `ProcurementRequest`.
    pub entity_type: Option<String>,
    /// Only this action, e.g. `TRANSITION`.
    pub action: Option<String>,
    /// Maximum rows, default 100.
    pub limit: Option<u64>,
}

/// Appends an entry using the caller's connection or transaction.
pub(crate) async fn append<C: ConnectionTrait>(
    conn: &C,
    record: AuditRecord,
) -> AppResult<audit_logs::Model> {
    let diff = record.diff();
    let entry = audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        actor_id: Set(record.actor_id),
        request_id: Set(record.request_id),
        action: Set(record.action.as_str().to_string()),
        entity_type: Set(record.entity.as_str().to_string()),
        entity_id: Set(record.entity_id),
        before: Set(record.before),
        after: Set(record.after),
        diff: Set(diff),
        ip_address: Set(record.metadata.ip_address),
        user_agent: Set(record.metadata.user_agent),
        created_at: Set(Utc::now().into()),
    };
    entry.insert(conn).await.map_err(db_err)
}

/// JSON snapshot of a model for audit entries.
pub(crate) fn snapshot<T: Serialize>(model: &T) -> Option<serde_json::Value> {
    serde_json::to_value(model).ok()
}

/// Read side of the audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    ctx: EngineContext,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Lists entries newest first.
    ///
    /// # Errors
    ///
    /// `Forbidden` without the audit capability, or a database error.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: AuditFilter,
    ) -> AppResult<Vec<audit_logs::Model>> {
        actor.require(Capability::ViewAuditLog)?;

        let mut query = audit_logs::Entity::find();
        if let Some(request_id) = filter.request_id {
            query = query.filter(audit_logs::Column::RequestId.eq(request_id));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(audit_logs::Column::EntityType.eq(entity_type));
        }
        if let Some(action) = filter.action {
            query = query.filter(audit_logs::Column::Action.eq(action.to_uppercase()));
        }

        query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .limit(ListLimit::from_query(filter.limit).get())
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }
}
