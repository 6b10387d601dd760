//! Approval repository: chain creation and step decisions.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use procura_core::approval::{
    ApprovalChain, ApprovalDecision, ApprovalStatus, ApprovalStep, ApproverSpec, DecisionOutcome,
};
use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::policy::Actor;
use procura_core::request::LifecycleService;
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use super::request::{apply_transition, load_request};
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{approvals, requests};

fn approval_required(request: &requests::Model, approver_id: Uuid, step: i32) -> Notification {
    Notification::new(
        approver_id,
        NotificationKind::ApprovalRequired,
        format!("Approval needed for {}", request.request_number),
        format!(
            "Step {step} of the approval chain for {} is waiting for you",
            request.title.as_deref().unwrap_or(&request.request_number)
        ),
    )
    .with_link(format!("/requests/{}", request.id))
}

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    ctx: EngineContext,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Materializes the whole chain, moves the request to PENDING_APPROVAL
    /// and notifies the first approver only.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty or duplicated approver list,
    /// `InvalidTransition` once past review, `NotFound`, `Forbidden`, or a
    /// database error.
    pub async fn create_chain(
        &self,
        actor: &Actor,
        request_id: Uuid,
        approvers: &[ApproverSpec],
    ) -> AppResult<Vec<approvals::Model>> {
        let now = Utc::now();
        let plan = ApprovalChain::plan(
            approvers,
            now,
            Duration::hours(self.ctx.settings.approval_sla_hours),
        )?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        let transition = LifecycleService::submit_for_approval(request.status()?)?;
        let updated = apply_transition(&txn, &request, transition).await?;

        let mut steps = Vec::with_capacity(plan.len());
        for planned in &plan {
            let step = approvals::ActiveModel {
                id: Set(Uuid::new_v4()),
                request_id: Set(request_id),
                step: Set(planned.step),
                approver_id: Set(planned.approver_id),
                role: Set(planned.role.as_str().to_string()),
                threshold: Set(planned.threshold),
                status: Set(ApprovalStatus::Pending.as_str().to_string()),
                comments: Set(None),
                due_date: Set(planned.due_at.into()),
                decided_at: Set(None),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            steps.push(step);
        }

        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::Request, request_id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(snapshot(&request), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            request_id = %request_id,
            steps = steps.len(),
            "approval chain created"
        );
        if let Some(first) = ApprovalChain::first(&plan) {
            self.ctx
                .dispatch(vec![approval_required(&updated, first, 1)])
                .await;
        }
        Ok(steps)
    }

    /// Records the assigned approver's decision.
    ///
    /// Approving hands over to the next pending step or, after the last one,
    /// approves the request. Rejecting rejects the request at once; later
    /// pending steps stay as they are.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized` if `actor` is not the assigned approver,
    /// `InvalidTransition` if the step or request already moved, or a
    /// database error.
    pub async fn decide(
        &self,
        actor: &Actor,
        approval_id: Uuid,
        decision: ApprovalDecision,
        comments: Option<String>,
    ) -> AppResult<approvals::Model> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let approval = approvals::Entity::find_by_id(approval_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Approval {approval_id} not found")))?;
        let chain = approvals::Entity::find()
            .filter(approvals::Column::RequestId.eq(approval.request_id))
            .order_by_asc(approvals::Column::Step)
            .all(&txn)
            .await
            .map_err(db_err)?
            .iter()
            .map(approvals::Model::as_step)
            .collect::<AppResult<Vec<ApprovalStep>>>()?;

        let outcome = ApprovalChain::decide(&approval.as_step()?, actor.id, decision, &chain)?;
        let now = Utc::now();

        let claimed = approvals::Entity::update_many()
            .set(approvals::ActiveModel {
                status: Set(decision.status().as_str().to_string()),
                comments: Set(comments.clone()),
                decided_at: Set(Some(now.into())),
                ..Default::default()
            })
            .filter(approvals::Column::Id.eq(approval_id))
            .filter(approvals::Column::Status.eq(ApprovalStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if claimed.rows_affected == 0 {
            return Err(AppError::InvalidTransition(format!(
                "approval {approval_id} is no longer PENDING"
            )));
        }
        let decided = approvals::Entity::find_by_id(approval_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Approval {approval_id} not found")))?;

        let request = load_request(&txn, approval.request_id).await?;
        let mut outbox = Vec::new();
        match outcome {
            DecisionOutcome::NotifyNext { step } => {
                outbox.push(approval_required(&request, step.approver_id, step.step));
            }
            DecisionOutcome::RequestApproved | DecisionOutcome::RequestRejected => {
                let approved = outcome == DecisionOutcome::RequestApproved;
                let transition = LifecycleService::conclude_approval(request.status()?, approved)?;
                let updated = apply_transition(&txn, &request, transition).await?;
                append(
                    &txn,
                    AuditRecord::new(AuditAction::StatusChange, AuditEntity::Request, request.id)
                        .by(actor.id, &actor.metadata)
                        .for_request(request.id)
                        .snapshots(snapshot(&request), snapshot(&updated)),
                )
                .await?;
                let verdict = if approved { "approved" } else { "rejected" };
                outbox.push(
                    Notification::new(
                        request.owner_id,
                        NotificationKind::ApprovalCompleted,
                        format!("Request {} {verdict}", request.request_number),
                        comments.clone().unwrap_or_else(|| {
                            format!("Your request was {verdict} at step {}", approval.step)
                        }),
                    )
                    .with_link(format!("/requests/{}", request.id)),
                );
            }
        }

        let action = match decision {
            ApprovalDecision::Approve => AuditAction::Approve,
            ApprovalDecision::Reject => AuditAction::Reject,
        };
        append(
            &txn,
            AuditRecord::new(action, AuditEntity::Approval, approval_id)
                .by(actor.id, &actor.metadata)
                .for_request(approval.request_id)
                .snapshots(snapshot(&approval), snapshot(&decided)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            approval_id = %approval_id,
            request_id = %approval.request_id,
            step = approval.step,
            decision = %decided.status,
            "approval decided"
        );
        self.ctx.dispatch(outbox).await;
        Ok(decided)
    }

    /// Steps assigned to `actor`, optionally filtered by status, soonest due
    /// first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_for_approver(
        &self,
        actor: &Actor,
        status: Option<ApprovalStatus>,
    ) -> AppResult<Vec<approvals::Model>> {
        let mut query = approvals::Entity::find()
            .filter(approvals::Column::ApproverId.eq(actor.id))
            .order_by_asc(approvals::Column::DueDate);
        if let Some(status) = status {
            query = query.filter(approvals::Column::Status.eq(status.as_str()));
        }
        query.all(&self.ctx.db).await.map_err(db_err)
    }

    /// The request's chain by step.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or a database error.
    pub async fn list_for_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> AppResult<Vec<approvals::Model>> {
        let request = load_request(&self.ctx.db, request_id).await?;
        let assigned = approvals::Entity::find()
            .filter(approvals::Column::RequestId.eq(request_id))
            .order_by_asc(approvals::Column::Step)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?;
        if !assigned.iter().any(|a| a.approver_id == actor.id) {
            actor.require_owner_or(request.owner_id)?;
        }
        Ok(assigned)
    }
}
