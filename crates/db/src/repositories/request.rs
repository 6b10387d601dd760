//! Request repository: the lifecycle state machine applied transactionally.
//!
//! Every state change is a compare-and-swap on the request's `version` (and,
//! for transitions, its status), so of two racing writers exactly one wins and
//! the other sees `InvalidTransition` or `Conflict`.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::contract::{self, DraftSettings};
use procura_core::intent::{
    ConversationTurn, FALLBACK_REPLY, IntentExtractor, IntentResponse, StageContext,
};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::numbering::DocumentKind;
use procura_core::order::PoStatus;
use procura_core::policy::{Actor, Capability};
use procura_core::request::{
    Directive, LifecycleError, LifecycleService, NewRequest, RequestFacts, RequestPatch,
    RequestStatus, Stage, Transition,
};
use procura_core::sourcing::{QuoteCandidate, SourcingPolicy};
use procura_shared::types::ListLimit;
use procura_shared::{AppError, AppResult, ProcurementConfig};

use super::audit::{append, snapshot};
use super::budget::{LedgerStep, find_budget, post};
use super::negotiation::{close_in, latest_negotiation, open_in, supersede_in};
use super::sequence::allocate;
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{
    approvals, attachments, contracts, negotiation_rounds, negotiations, purchase_orders, quotes,
    recurring_schedules, request_messages, requests, vendors,
};

/// What a directive produced besides the request itself.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveOutcome {
    /// Request after the transition.
    pub request: requests::Model,
    /// Quotes created by `issue_rfq`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<quotes::Model>,
    /// Negotiation opened by `start_negotiation` or accepted by `generate_contract`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiation: Option<negotiations::Model>,
    /// Contract drafted by `generate_contract`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<contracts::Model>,
    /// Order issued by `generate_po`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<purchase_orders::Model>,
}

impl DirectiveOutcome {
    fn new(request: requests::Model) -> Self {
        Self {
            request,
            quotes: Vec::new(),
            negotiation: None,
            contract: None,
            purchase_order: None,
        }
    }
}

/// A request with everything hanging off it.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    /// The request.
    pub request: requests::Model,
    /// Quotes, oldest first.
    pub quotes: Vec<quotes::Model>,
    /// Approval chain by step.
    pub approvals: Vec<approvals::Model>,
    /// Live or most recent negotiation.
    pub negotiation: Option<negotiations::Model>,
    /// Rounds of that negotiation.
    pub rounds: Vec<negotiation_rounds::Model>,
    /// Contract, once drafted.
    pub contract: Option<contracts::Model>,
    /// Purchase order, once issued.
    pub purchase_order: Option<purchase_orders::Model>,
    /// File metadata.
    pub attachments: Vec<attachments::Model>,
    /// Conversation, oldest first.
    pub messages: Vec<request_messages::Model>,
}

/// Result of handling one conversational message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    /// Request after the message was applied.
    pub request: requests::Model,
    /// Assistant reply.
    pub reply: String,
    /// Directive applied, if any.
    pub directive: Option<Directive>,
    /// Follow-up suggestions.
    pub suggestions: Vec<String>,
    /// Directive side effects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DirectiveOutcome>,
}

/// Metadata of an uploaded file. The bytes live in external storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttachment {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Key in the external store.
    pub storage_key: String,
}

pub(crate) async fn load_request<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> AppResult<requests::Model> {
    requests::Entity::find_by_id(request_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Request {request_id} not found")))
}

/// Writes `changes` only if the request still has the version it was read
/// with and, when given, the expected status.
pub(crate) async fn swap_request<C: ConnectionTrait>(
    conn: &C,
    current: &requests::Model,
    expected: Option<RequestStatus>,
    mut changes: requests::ActiveModel,
) -> AppResult<requests::Model> {
    changes.version = Set(current.version + 1);
    changes.updated_at = Set(Utc::now().into());

    let mut update = requests::Entity::update_many()
        .set(changes)
        .filter(requests::Column::Id.eq(current.id))
        .filter(requests::Column::Version.eq(current.version));
    if let Some(status) = expected {
        update = update.filter(requests::Column::Status.eq(status.as_str()));
    }
    let result = update.exec(conn).await.map_err(db_err)?;

    if result.rows_affected == 0 {
        let fresh = load_request(conn, current.id).await?;
        if let Some(status) = expected
            && fresh.status != status.as_str()
        {
            return Err(AppError::InvalidTransition(format!(
                "request {} is {}; expected {}",
                current.id, fresh.status, status
            )));
        }
        return Err(AppError::Conflict(format!(
            "request {} was modified concurrently",
            current.id
        )));
    }
    load_request(conn, current.id).await
}

/// Persists a validated transition.
pub(crate) async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    current: &requests::Model,
    transition: Transition,
) -> AppResult<requests::Model> {
    let mut changes = requests::ActiveModel {
        status: Set(transition.to.as_str().to_string()),
        ..Default::default()
    };
    if let Some(stage) = transition.stage {
        changes.stage = Set(stage.as_str().to_string());
    }
    swap_request(conn, current, Some(transition.from), changes).await
}

/// Quotes of a request with the ranking inputs for each.
pub(crate) async fn quote_candidates<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> AppResult<(Vec<quotes::Model>, Vec<QuoteCandidate>)> {
    let rows = quotes::Entity::find()
        .filter(quotes::Column::RequestId.eq(request_id))
        .order_by_asc(quotes::Column::CreatedAt)
        .order_by_asc(quotes::Column::QuoteNumber)
        .all(conn)
        .await
        .map_err(db_err)?;
    let vendor_ids: Vec<Uuid> = rows.iter().map(|q| q.vendor_id).collect();
    let ratings = vendors::Entity::find()
        .filter(vendors::Column::Id.is_in(vendor_ids))
        .all(conn)
        .await
        .map_err(db_err)?;

    let candidates = rows
        .iter()
        .map(|q| QuoteCandidate {
            id: q.id,
            total_price: q.total_price,
            delivery_days: q.delivery_days,
            vendor_rating: ratings
                .iter()
                .find(|v| v.id == q.vendor_id)
                .map_or(Decimal::ZERO, |v| v.rating),
            recommended: q.recommended,
        })
        .collect();
    Ok((rows, candidates))
}

/// Flags exactly one quote of the request as recommended.
pub(crate) async fn mark_recommended<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> AppResult<Vec<quotes::Model>> {
    let (_, candidates) = quote_candidates(conn, request_id).await?;
    let Some(best) = SourcingPolicy::recommend(&candidates).map(|i| candidates[i].id) else {
        return Ok(Vec::new());
    };

    quotes::Entity::update_many()
        .col_expr(quotes::Column::Recommended, Expr::value(false))
        .filter(quotes::Column::RequestId.eq(request_id))
        .filter(quotes::Column::Id.ne(best))
        .exec(conn)
        .await
        .map_err(db_err)?;
    quotes::Entity::update_many()
        .col_expr(quotes::Column::Recommended, Expr::value(true))
        .filter(quotes::Column::Id.eq(best))
        .exec(conn)
        .await
        .map_err(db_err)?;

    let (rows, _) = quote_candidates(conn, request_id).await?;
    Ok(rows)
}

pub(crate) async fn find_contract<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> AppResult<Option<contracts::Model>> {
    contracts::Entity::find()
        .filter(contracts::Column::RequestId.eq(request_id))
        .one(conn)
        .await
        .map_err(db_err)
}

async fn request_facts<C: ConnectionTrait>(conn: &C, request_id: Uuid) -> AppResult<RequestFacts> {
    let has_contract = find_contract(conn, request_id).await?.is_some();
    let negotiation = match latest_negotiation(conn, request_id).await? {
        Some(n) => Some(n.status()?),
        None => None,
    };
    Ok(RequestFacts {
        has_contract,
        negotiation,
    })
}

/// Inserts a DRAFT request and commits its estimate when linked to a budget.
pub(crate) async fn insert_draft<C: ConnectionTrait>(
    conn: &C,
    settings: &ProcurementConfig,
    owner_id: Uuid,
    input: &NewRequest,
    parent_request_id: Option<Uuid>,
    outbox: &mut Vec<Notification>,
) -> AppResult<requests::Model> {
    LifecycleService::validate_new(input)?;
    let now = Utc::now();
    let number = allocate(
        conn,
        DocumentKind::Request,
        now.year(),
        settings.max_number_attempts,
    )
    .await?;
    if let Some(budget_id) = input.budget_id {
        find_budget(conn, budget_id).await?;
    }

    let request = requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        request_number: Set(number),
        owner_id: Set(owner_id),
        title: Set(input.title.clone()),
        category: Set(input.category.clone()),
        description: Set(input.description.clone()),
        quantity: Set(input.quantity),
        specifications: Set(input.specifications.clone()),
        budget_estimate: Set(input.budget_estimate),
        urgency: Set(input.urgency.unwrap_or_default().as_str().to_string()),
        delivery_location: Set(input.delivery_location.clone()),
        status: Set(RequestStatus::Draft.as_str().to_string()),
        stage: Set(Stage::Initial.as_str().to_string()),
        budget_id: Set(input.budget_id),
        parent_request_id: Set(parent_request_id),
        is_recurring: Set(false),
        version: Set(1),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;

    if let (Some(budget_id), Some(amount)) = (request.budget_id, committed_amount(&request)?) {
        outbox.extend(post(conn, budget_id, LedgerStep::Commit, amount).await?);
    }
    Ok(request)
}

/// Amount the request holds against its budget in its current status.
fn committed_amount(request: &requests::Model) -> AppResult<Option<Decimal>> {
    Ok(commitment(request.status()?, request.budget_estimate))
}

fn commitment(status: RequestStatus, estimate: Option<Decimal>) -> Option<Decimal> {
    estimate.filter(|e| status.holds_commitment() && *e > Decimal::ZERO)
}

/// Applies a field patch on `conn`, moving the budget commitment with it.
pub(crate) async fn update_in<C: ConnectionTrait>(
    conn: &C,
    actor: &Actor,
    current: &requests::Model,
    patch: &RequestPatch,
    outbox: &mut Vec<Notification>,
) -> AppResult<requests::Model> {
    LifecycleService::validate_patch(patch)?;
    if patch.touches_workflow_state() {
        actor.require(Capability::CorrectWorkflowState)?;
    }

    let old_budget = current.budget_id;
    let old_amount = committed_amount(current)?;
    let new_budget = patch.budget_id.unwrap_or(current.budget_id);
    let new_amount = commitment(
        patch.status.map_or_else(|| current.status(), Ok)?,
        patch.budget_estimate.or(current.budget_estimate),
    );
    if (old_budget, old_amount) != (new_budget, new_amount) {
        if let (Some(budget_id), Some(amount)) = (old_budget, old_amount) {
            post(conn, budget_id, LedgerStep::Decommit, amount).await?;
        }
        if let Some(budget_id) = new_budget {
            find_budget(conn, budget_id).await?;
            if let Some(amount) = new_amount {
                outbox.extend(post(conn, budget_id, LedgerStep::Commit, amount).await?);
            }
        }
    }

    let mut changes = <requests::ActiveModel as sea_orm::ActiveModelTrait>::default();
    if let Some(title) = &patch.title {
        changes.title = Set(Some(title.clone()));
    }
    if let Some(category) = &patch.category {
        changes.category = Set(Some(category.clone()));
    }
    if let Some(description) = &patch.description {
        changes.description = Set(Some(description.clone()));
    }
    if let Some(quantity) = patch.quantity {
        changes.quantity = Set(Some(quantity));
    }
    if let Some(specifications) = &patch.specifications {
        changes.specifications = Set(Some(specifications.clone()));
    }
    if let Some(estimate) = patch.budget_estimate {
        changes.budget_estimate = Set(Some(estimate));
    }
    if let Some(urgency) = patch.urgency {
        changes.urgency = Set(urgency.as_str().to_string());
    }
    if let Some(location) = &patch.delivery_location {
        changes.delivery_location = Set(Some(location.clone()));
    }
    if let Some(budget_id) = patch.budget_id {
        changes.budget_id = Set(budget_id);
    }
    if let Some(status) = patch.status {
        changes.status = Set(status.as_str().to_string());
    }
    if let Some(stage) = patch.stage {
        changes.stage = Set(stage.as_str().to_string());
    }

    let updated = swap_request(conn, current, None, changes).await?;
    append(
        conn,
        AuditRecord::new(AuditAction::Update, AuditEntity::Request, current.id)
            .by(actor.id, &actor.metadata)
            .for_request(current.id)
            .snapshots(snapshot(current), snapshot(&updated)),
    )
    .await?;
    Ok(updated)
}

/// Validates and applies one directive on `conn`.
pub(crate) async fn directive_in<C: ConnectionTrait>(
    conn: &C,
    settings: &ProcurementConfig,
    actor: &Actor,
    request: requests::Model,
    directive: Directive,
    outbox: &mut Vec<Notification>,
) -> AppResult<DirectiveOutcome> {
    let facts = request_facts(conn, request.id).await?;
    let transition = LifecycleService::apply(request.status()?, directive, facts)?;
    let now = Utc::now();

    let outcome = match directive {
        Directive::AdvanceToSourcing => {
            DirectiveOutcome::new(apply_transition(conn, &request, transition).await?)
        }
        Directive::IssueRfq => {
            issue_rfq(conn, settings, actor, &request, transition, now).await?
        }
        Directive::StartNegotiation { quote_id } => {
            let (rows, candidates) = quote_candidates(conn, request.id).await?;
            let chosen = SourcingPolicy::select_for_negotiation(&candidates, quote_id)?;
            let quote = rows
                .iter()
                .find(|q| q.id == chosen.id)
                .ok_or(LifecycleError::QuoteNotFound(chosen.id))?;

            let updated = apply_transition(conn, &request, transition).await?;
            let superseded = supersede_in(conn, request.id, now).await?;
            if superseded > 0 {
                tracing::debug!(request_id = %request.id, superseded, "prior negotiation superseded");
            }
            let mut outcome = DirectiveOutcome::new(updated);
            outcome.negotiation = Some(open_in(conn, actor, quote, settings, now).await?);
            outcome
        }
        Directive::GenerateContract => {
            generate_contract(conn, settings, actor, &request, transition, now).await?
        }
        Directive::GeneratePo => {
            generate_po(conn, settings, actor, &request, transition, now, outbox).await?
        }
    };

    append(
        conn,
        AuditRecord::new(AuditAction::Transition, AuditEntity::Request, request.id)
            .by(actor.id, &actor.metadata)
            .for_request(request.id)
            .snapshots(snapshot(&request), snapshot(&outcome.request)),
    )
    .await?;

    tracing::info!(
        request_id = %request.id,
        directive = %directive,
        from = %transition.from,
        to = %transition.to,
        "directive applied"
    );
    Ok(outcome)
}

async fn issue_rfq<C: ConnectionTrait>(
    conn: &C,
    settings: &ProcurementConfig,
    actor: &Actor,
    request: &requests::Model,
    transition: Transition,
    now: DateTime<Utc>,
) -> AppResult<DirectiveOutcome> {
    let candidates: Vec<_> = vendors::Entity::find()
        .all(conn)
        .await
        .map_err(db_err)?
        .iter()
        .map(vendors::Model::candidate)
        .collect();
    let selected = SourcingPolicy::select_vendors(
        candidates,
        request.category.as_deref(),
        usize::try_from(settings.rfq_batch_size).unwrap_or(usize::MAX),
    );

    // Status moves first: a repeated RFQ fails here before any quote exists.
    let updated = apply_transition(
        conn,
        request,
        transition.with_stage(LifecycleService::rfq_stage(selected.len())),
    )
    .await?;

    let valid_until = now + Duration::days(settings.quote_validity_days);
    for (index, vendor) in selected.iter().enumerate() {
        let draft = SourcingPolicy::synthesize_quote(
            vendor,
            index,
            request.quantity,
            request.budget_estimate,
        );
        let number = allocate(
            conn,
            DocumentKind::Quote,
            now.year(),
            settings.max_number_attempts,
        )
        .await?;
        let quote = quotes::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_number: Set(number),
            request_id: Set(request.id),
            vendor_id: Set(draft.vendor_id),
            unit_price: Set(draft.unit_price),
            quantity: Set(draft.quantity),
            total_price: Set(draft.total_price),
            delivery_days: Set(draft.delivery_days),
            warranty: Set(Some(draft.warranty)),
            valid_until: Set(valid_until.into()),
            recommended: Set(false),
            created_at: Set(now.into()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        append(
            conn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Quote, quote.id)
                .by(actor.id, &actor.metadata)
                .for_request(request.id)
                .snapshots(None, snapshot(&quote)),
        )
        .await?;
    }

    let mut outcome = DirectiveOutcome::new(updated);
    outcome.quotes = mark_recommended(conn, request.id).await?;
    tracing::debug!(
        request_id = %request.id,
        solicited = selected.len(),
        "rfq issued"
    );
    Ok(outcome)
}

async fn generate_contract<C: ConnectionTrait>(
    conn: &C,
    settings: &ProcurementConfig,
    actor: &Actor,
    request: &requests::Model,
    transition: Transition,
    now: DateTime<Utc>,
) -> AppResult<DirectiveOutcome> {
    let negotiation = latest_negotiation(conn, request.id)
        .await?
        .ok_or(LifecycleError::MissingNegotiation)?;
    let negotiation = if negotiation.status()?.is_live() {
        close_in(conn, &negotiation, true, now).await?
    } else {
        negotiation
    };

    let updated = apply_transition(conn, request, transition).await?;
    let description = request
        .description
        .as_deref()
        .or(request.title.as_deref());
    let draft = contract::draft(
        description,
        request.quantity,
        negotiation.current_price,
        &DraftSettings {
            payment_terms: &settings.default_payment_terms,
            warranty: &settings.default_warranty,
            delivery_days: settings.contract_delivery_days,
        },
        now,
    );
    let number = allocate(
        conn,
        DocumentKind::Contract,
        now.year(),
        settings.max_number_attempts,
    )
    .await?;
    let items = serde_json::to_value(&draft.items)
        .map_err(|e| AppError::Internal(format!("contract items: {e}")))?;

    let contract = contracts::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_number: Set(number),
        request_id: Set(request.id),
        negotiation_id: Set(negotiation.id),
        vendor_id: Set(negotiation.vendor_id),
        items: Set(items),
        total_value: Set(draft.total_value),
        payment_terms: Set(draft.payment_terms),
        delivery_date: Set(draft.delivery_date.into()),
        warranty: Set(draft.warranty),
        terms: Set(serde_json::Value::from(draft.terms)),
        status: Set(contracts::STATUS_DRAFT.to_string()),
        signed_at: Set(None),
        created_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;
    append(
        conn,
        AuditRecord::new(AuditAction::Create, AuditEntity::Contract, contract.id)
            .by(actor.id, &actor.metadata)
            .for_request(request.id)
            .snapshots(None, snapshot(&contract)),
    )
    .await?;

    let mut outcome = DirectiveOutcome::new(updated);
    outcome.negotiation = Some(negotiation);
    outcome.contract = Some(contract);
    Ok(outcome)
}

async fn generate_po<C: ConnectionTrait>(
    conn: &C,
    settings: &ProcurementConfig,
    actor: &Actor,
    request: &requests::Model,
    transition: Transition,
    now: DateTime<Utc>,
    outbox: &mut Vec<Notification>,
) -> AppResult<DirectiveOutcome> {
    let contract = find_contract(conn, request.id)
        .await?
        .ok_or(LifecycleError::MissingContract)?;

    let updated = apply_transition(conn, request, transition).await?;
    let number = allocate(
        conn,
        DocumentKind::PurchaseOrder,
        now.year(),
        settings.max_number_attempts,
    )
    .await?;
    let ship_to = serde_json::to_value(&settings.ship_to)
        .map_err(|e| AppError::Internal(format!("ship-to snapshot: {e}")))?;

    let order = purchase_orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        po_number: Set(number),
        request_id: Set(request.id),
        contract_id: Set(contract.id),
        vendor_id: Set(contract.vendor_id),
        ship_to: Set(ship_to),
        items: Set(contract.items.clone()),
        subtotal: Set(contract.total_value),
        total: Set(contract.total_value),
        status: Set(PoStatus::Issued.as_str().to_string()),
        acknowledged_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;

    append(
        conn,
        AuditRecord::new(AuditAction::Create, AuditEntity::PurchaseOrder, order.id)
            .by(actor.id, &actor.metadata)
            .for_request(request.id)
            .snapshots(None, snapshot(&order)),
    )
    .await?;

    let before = snapshot(&contract);
    let mut signed: contracts::ActiveModel = contract.into();
    signed.status = Set(contracts::STATUS_SIGNED.to_string());
    signed.signed_at = Set(Some(now.into()));
    let contract = signed.update(conn).await.map_err(db_err)?;
    append(
        conn,
        AuditRecord::new(AuditAction::StatusChange, AuditEntity::Contract, contract.id)
            .by(actor.id, &actor.metadata)
            .for_request(request.id)
            .snapshots(before, snapshot(&contract)),
    )
    .await?;

    outbox.push(
        Notification::new(
            order.vendor_id,
            NotificationKind::PoIssued,
            format!("Purchase order {}", order.po_number),
            format!(
                "Purchase order {} for {} has been issued",
                order.po_number, order.total
            ),
        )
        .with_link(format!("/vendor-portal/orders/{}", order.id)),
    );

    let mut outcome = DirectiveOutcome::new(updated);
    outcome.contract = Some(contract);
    outcome.purchase_order = Some(order);
    Ok(outcome)
}

/// Request repository.
#[derive(Debug, Clone)]
pub struct RequestRepository {
    ctx: EngineContext,
}

impl RequestRepository {
    /// Creates a new request repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Creates a request in DRAFT/initial owned by `actor`.
    ///
    /// # Errors
    ///
    /// `Validation` for bad amounts, `NotFound` for an unknown budget, or a
    /// database error.
    pub async fn create_draft(&self, actor: &Actor, input: NewRequest) -> AppResult<requests::Model> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let mut outbox = Vec::new();
        let request = insert_draft(&txn, &self.ctx.settings, actor.id, &input, None, &mut outbox)
            .await?;
        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Request, request.id)
                .by(actor.id, &actor.metadata)
                .for_request(request.id)
                .snapshots(None, snapshot(&request)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            request_id = %request.id,
            request_number = %request.request_number,
            "request created"
        );
        self.ctx.dispatch(outbox).await;
        Ok(request)
    }

    /// Reads a request.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for someone else's request, or a database
    /// error.
    pub async fn get(&self, actor: &Actor, request_id: Uuid) -> AppResult<requests::Model> {
        let request = load_request(&self.ctx.db, request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        Ok(request)
    }

    /// Reads a request with quotes, approvals, negotiation, contract, order,
    /// attachments and conversation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn detail(&self, actor: &Actor, request_id: Uuid) -> AppResult<RequestDetail> {
        let request = self.get(actor, request_id).await?;
        let db = &self.ctx.db;

        let (quotes, _) = quote_candidates(db, request_id).await?;
        let approvals = approvals::Entity::find()
            .filter(approvals::Column::RequestId.eq(request_id))
            .order_by_asc(approvals::Column::Step)
            .all(db)
            .await
            .map_err(db_err)?;
        let negotiation = latest_negotiation(db, request_id).await?;
        let rounds = match &negotiation {
            Some(n) => negotiation_rounds::Entity::find()
                .filter(negotiation_rounds::Column::NegotiationId.eq(n.id))
                .order_by_asc(negotiation_rounds::Column::Round)
                .all(db)
                .await
                .map_err(db_err)?,
            None => Vec::new(),
        };
        let purchase_order = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::RequestId.eq(request_id))
            .one(db)
            .await
            .map_err(db_err)?;
        let attachments = attachments::Entity::find()
            .filter(attachments::Column::RequestId.eq(request_id))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(db)
            .await
            .map_err(db_err)?;

        Ok(RequestDetail {
            contract: find_contract(db, request_id).await?,
            messages: self.messages(request_id).await?,
            request,
            quotes,
            approvals,
            negotiation,
            rounds,
            purchase_order,
            attachments,
        })
    }

    /// Requests owned by `actor`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_for_owner(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
        limit: ListLimit,
    ) -> AppResult<Vec<requests::Model>> {
        let mut query = requests::Entity::find()
            .filter(requests::Column::OwnerId.eq(actor.id))
            .order_by_desc(requests::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(requests::Column::Status.eq(status.as_str()));
        }
        query
            .limit(limit.get())
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }

    /// Applies a lifecycle directive.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the request is not in the directive's source
    /// state (nothing is written), `NotFound`, `Forbidden`, `Conflict` if a
    /// concurrent change won, or a database error.
    pub async fn apply_directive(
        &self,
        actor: &Actor,
        request_id: Uuid,
        directive: Directive,
    ) -> AppResult<DirectiveOutcome> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let mut outbox = Vec::new();
        let outcome =
            directive_in(&txn, &self.ctx.settings, actor, request, directive, &mut outbox).await?;
        txn.commit().await.map_err(db_err)?;

        self.ctx.dispatch(outbox).await;
        Ok(outcome)
    }

    /// Manual field correction. Moving the budget link moves the commitment
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// `Forbidden` for status/stage edits without `CorrectWorkflowState`,
    /// `Validation`, `NotFound`, `Conflict`, or a database error.
    pub async fn update_fields(
        &self,
        actor: &Actor,
        request_id: Uuid,
        patch: RequestPatch,
    ) -> AppResult<requests::Model> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let current = load_request(&txn, request_id).await?;
        actor.require_owner_or(current.owner_id)?;

        let mut outbox = Vec::new();
        let updated = update_in(&txn, actor, &current, &patch, &mut outbox).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(request_id = %request_id, version = updated.version, "request updated");
        self.ctx.dispatch(outbox).await;
        Ok(updated)
    }

    /// Deletes a DRAFT request with its children.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the request is DRAFT, `NotFound`,
    /// `Forbidden`, `Conflict`, or a database error.
    pub async fn delete(&self, actor: &Actor, request_id: Uuid) -> AppResult<()> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        LifecycleService::ensure_deletable(request.status()?)?;
        actor.require_owner_or(request.owner_id)?;

        if let (Some(budget_id), Some(amount)) = (request.budget_id, committed_amount(&request)?) {
            post(&txn, budget_id, LedgerStep::Decommit, amount).await?;
        }

        let negotiation_ids: Vec<Uuid> = negotiations::Entity::find()
            .select_only()
            .column(negotiations::Column::Id)
            .filter(negotiations::Column::RequestId.eq(request_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(db_err)?;
        negotiation_rounds::Entity::delete_many()
            .filter(negotiation_rounds::Column::NegotiationId.is_in(negotiation_ids))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        contracts::Entity::delete_many()
            .filter(contracts::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        negotiations::Entity::delete_many()
            .filter(negotiations::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        quotes::Entity::delete_many()
            .filter(quotes::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        approvals::Entity::delete_many()
            .filter(approvals::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        attachments::Entity::delete_many()
            .filter(attachments::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        request_messages::Entity::delete_many()
            .filter(request_messages::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        recurring_schedules::Entity::delete_many()
            .filter(recurring_schedules::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let deleted = requests::Entity::delete_many()
            .filter(requests::Column::Id.eq(request_id))
            .filter(requests::Column::Version.eq(request.version))
            .filter(requests::Column::Status.eq(RequestStatus::Draft.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if deleted.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "request {request_id} was modified concurrently"
            )));
        }

        append(
            &txn,
            AuditRecord::new(AuditAction::Delete, AuditEntity::Request, request_id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(snapshot(&request), None),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(request_id = %request_id, "draft request deleted");
        Ok(())
    }

    /// Cancels a request that has no purchase order yet, releasing its
    /// budget commitment.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once ordered, `NotFound`, `Forbidden`, `Conflict`,
    /// or a database error.
    pub async fn cancel(&self, actor: &Actor, request_id: Uuid) -> AppResult<requests::Model> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        let transition = LifecycleService::cancel(request.status()?)?;

        if let (Some(budget_id), Some(amount)) = (request.budget_id, committed_amount(&request)?) {
            post(&txn, budget_id, LedgerStep::Decommit, amount).await?;
        }
        if let Some(negotiation) = latest_negotiation(&txn, request_id).await?
            && negotiation.status()?.is_live()
        {
            close_in(&txn, &negotiation, false, Utc::now()).await?;
        }

        let updated = apply_transition(&txn, &request, transition).await?;
        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::Request, request_id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(snapshot(&request), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(request_id = %request_id, from = %transition.from, "request cancelled");
        Ok(updated)
    }

    /// Records metadata of a file attached to the request.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty name or key or a negative size, `NotFound`,
    /// `Forbidden`, or a database error.
    pub async fn add_attachment(
        &self,
        actor: &Actor,
        request_id: Uuid,
        input: NewAttachment,
    ) -> AppResult<attachments::Model> {
        if input.file_name.trim().is_empty() {
            return Err(AppError::Validation("file name is required".to_string()));
        }
        if input.storage_key.trim().is_empty() {
            return Err(AppError::Validation("storage key is required".to_string()));
        }
        if input.size_bytes < 0 {
            return Err(AppError::Validation("size must not be negative".to_string()));
        }

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let attachment = attachments::ActiveModel {
            id: Set(Uuid::new_v4()),
            request_id: Set(request_id),
            file_name: Set(input.file_name),
            content_type: Set(input.content_type),
            size_bytes: Set(input.size_bytes),
            storage_key: Set(input.storage_key),
            uploaded_by: Set(actor.id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Attachment, attachment.id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(None, snapshot(&attachment)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;
        Ok(attachment)
    }

    /// Handles one conversational message.
    ///
    /// Without `request_id` a new draft is created. Extracted fields are
    /// merged, the proposed directive applied, and the stage moved to the
    /// suggested one; all of it commits together with both messages. An
    /// extractor failure falls back to a canned reply with no directive.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty message or an unknown directive, plus
    /// anything [`Self::apply_directive`] or [`Self::update_fields`] returns.
    pub async fn process_message(
        &self,
        actor: &Actor,
        request_id: Option<Uuid>,
        text: &str,
        extractor: &dyn IntentExtractor,
    ) -> AppResult<MessageOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("message is required".to_string()));
        }

        let existing = match request_id {
            Some(id) => Some(self.get(actor, id).await?),
            None => None,
        };
        let (history, context) = match &existing {
            Some(request) => (
                self.messages(request.id)
                    .await?
                    .into_iter()
                    .map(|m| ConversationTurn {
                        role: m.role,
                        content: m.content,
                    })
                    .collect(),
                StageContext {
                    status: request.status()?,
                    stage: request.stage()?,
                    quote_count: quotes::Entity::find()
                        .filter(quotes::Column::RequestId.eq(request.id))
                        .count(&self.ctx.db)
                        .await
                        .map_err(db_err)?
                        .try_into()
                        .unwrap_or(usize::MAX),
                },
            ),
            None => (
                Vec::new(),
                StageContext {
                    status: RequestStatus::Draft,
                    stage: Stage::Initial,
                    quote_count: 0,
                },
            ),
        };

        let intent = match extractor.extract(text, &history, context).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "intent extraction failed, using fallback reply");
                IntentResponse {
                    reply: FALLBACK_REPLY.to_string(),
                    action: "none".to_string(),
                    fields: procura_core::intent::ExtractedFields::default(),
                    next_stage: None,
                    suggestions: Vec::new(),
                }
            }
        };
        let directive =
            LifecycleService::parse_directive(&intent.action, intent.fields.selected_quote_id)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let mut outbox = Vec::new();
        let mut request = match &existing {
            Some(request) => load_request(&txn, request.id).await?,
            None => {
                let created = insert_draft(
                    &txn,
                    &self.ctx.settings,
                    actor.id,
                    &NewRequest::default(),
                    None,
                    &mut outbox,
                )
                .await?;
                append(
                    &txn,
                    AuditRecord::new(AuditAction::Create, AuditEntity::Request, created.id)
                        .by(actor.id, &actor.metadata)
                        .for_request(created.id)
                        .snapshots(None, snapshot(&created)),
                )
                .await?;
                created
            }
        };

        let fields = &intent.fields;
        let patch = RequestPatch {
            category: fields.category.clone(),
            description: fields.description.clone(),
            quantity: fields.quantity,
            budget_estimate: fields.budget,
            urgency: fields.urgency,
            delivery_location: fields.delivery_location.clone(),
            ..Default::default()
        };
        if patch.category.is_some()
            || patch.description.is_some()
            || patch.quantity.is_some()
            || patch.budget_estimate.is_some()
            || patch.urgency.is_some()
            || patch.delivery_location.is_some()
        {
            request = update_in(&txn, actor, &request, &patch, &mut outbox).await?;
        }

        let now = Utc::now();
        insert_message(&txn, request.id, "user", text, now).await?;

        let mut outcome = None;
        if let Some(directive) = directive {
            let applied =
                directive_in(&txn, &self.ctx.settings, actor, request, directive, &mut outbox)
                    .await?;
            request = applied.request.clone();
            outcome = Some(applied);
        } else if let Some(stage) = intent.next_stage
            && stage != request.stage()?
        {
            request = swap_request(
                &txn,
                &request,
                None,
                requests::ActiveModel {
                    stage: Set(stage.as_str().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        }

        insert_message(
            &txn,
            request.id,
            "assistant",
            &intent.reply,
            now + Duration::milliseconds(1),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(
            request_id = %request.id,
            action = %intent.action,
            "message processed"
        );
        self.ctx.dispatch(outbox).await;
        Ok(MessageOutcome {
            request,
            reply: intent.reply,
            directive,
            suggestions: intent.suggestions,
            outcome,
        })
    }

    async fn messages(&self, request_id: Uuid) -> AppResult<Vec<request_messages::Model>> {
        request_messages::Entity::find()
            .filter(request_messages::Column::RequestId.eq(request_id))
            .order_by_asc(request_messages::Column::CreatedAt)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }
}

async fn insert_message<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    role: &str,
    content: &str,
    at: DateTime<Utc>,
) -> AppResult<request_messages::Model> {
    request_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        request_id: Set(request_id),
        role: Set(role.to_string()),
        content: Set(content.to_string()),
        created_at: Set(at.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use procura_core::policy::Role;

    use super::*;
    use crate::context::TracingNotifier;

    async fn context() -> EngineContext {
        let db = crate::connect_pool("sqlite::memory:", 1, 1).await.unwrap();
        crate::migrate(&db).await.unwrap();
        EngineContext::new(db, Arc::new(TracingNotifier), ProcurementConfig::default())
    }

    fn retitle(title: &str) -> requests::ActiveModel {
        requests::ActiveModel {
            title: Set(Some(title.to_string())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stale_version_loses_the_swap() {
        let ctx = context().await;
        let owner = Actor::new(Uuid::new_v4(), Role::Requester);
        let draft = RequestRepository::new(ctx.clone())
            .create_draft(
                &owner,
                NewRequest {
                    title: Some("Chairs".to_string()),
                    category: Some("furniture".to_string()),
                    quantity: Some(12),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stale = load_request(&ctx.db, draft.id).await.unwrap();
        let fresh = swap_request(&ctx.db, &stale, None, retitle("Desk chairs"))
            .await
            .unwrap();
        assert_eq!(fresh.version, stale.version + 1);

        let err = swap_request(&ctx.db, &stale, None, retitle("Stools"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = swap_request(&ctx.db, &stale, Some(RequestStatus::Sourcing), retitle("Stools"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let stored = load_request(&ctx.db, draft.id).await.unwrap();
        assert_eq!(stored.title.as_deref(), Some("Desk chairs"));
        assert_eq!(stored.version, fresh.version);
    }
}
