//! Procurement schema.
//!
//! Built with the `SeaQuery` schema builder so the same migration runs on
//! PostgreSQL and on the SQLite databases used by the test suite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn money<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(19, 4).not_null().to_owned()
}

fn timestamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn fk<T: IntoIden + 'static, R: IntoIden + 'static>(
    name: &str,
    table: T,
    col: impl IntoIden,
    ref_table: R,
    ref_col: impl IntoIden,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(ref_table, ref_col)
        .on_delete(ForeignKeyAction::NoAction)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(id(Budgets::Id))
                    .col(ColumnDef::new(Budgets::Department).string().not_null())
                    .col(ColumnDef::new(Budgets::FiscalYear).integer().not_null())
                    .col(ColumnDef::new(Budgets::Quarter).integer())
                    .col(money(Budgets::TotalAmount))
                    .col(money(Budgets::SpentAmount))
                    .col(money(Budgets::CommittedAmount))
                    .col(ColumnDef::new(Budgets::AlertThreshold).decimal_len(5, 2).not_null())
                    .col(ColumnDef::new(Budgets::ManagerId).uuid())
                    .col(timestamp(Budgets::CreatedAt))
                    .col(timestamp(Budgets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(id(Vendors::Id))
                    .col(ColumnDef::new(Vendors::Name).string().not_null())
                    .col(ColumnDef::new(Vendors::Email).string())
                    .col(ColumnDef::new(Vendors::Categories).json().not_null())
                    .col(ColumnDef::new(Vendors::Rating).decimal_len(3, 2).not_null())
                    .col(ColumnDef::new(Vendors::Verified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Vendors::TotalOrders).integer().not_null().default(0))
                    .col(money(Vendors::TotalValue))
                    .col(timestamp(Vendors::CreatedAt))
                    .col(timestamp(Vendors::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Requests::Table)
                    .if_not_exists()
                    .col(id(Requests::Id))
                    .col(
                        ColumnDef::new(Requests::RequestNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Requests::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Requests::Title).string())
                    .col(ColumnDef::new(Requests::Category).string())
                    .col(ColumnDef::new(Requests::Description).text())
                    .col(ColumnDef::new(Requests::Quantity).integer())
                    .col(ColumnDef::new(Requests::Specifications).json())
                    .col(ColumnDef::new(Requests::BudgetEstimate).decimal_len(19, 4))
                    .col(ColumnDef::new(Requests::Urgency).string().not_null())
                    .col(ColumnDef::new(Requests::DeliveryLocation).string())
                    .col(ColumnDef::new(Requests::Status).string().not_null())
                    .col(ColumnDef::new(Requests::Stage).string().not_null())
                    .col(ColumnDef::new(Requests::BudgetId).uuid())
                    .col(ColumnDef::new(Requests::ParentRequestId).uuid())
                    .col(
                        ColumnDef::new(Requests::IsRecurring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Requests::Version).integer().not_null().default(0))
                    .col(timestamp(Requests::CreatedAt))
                    .col(timestamp(Requests::UpdatedAt))
                    .foreign_key(&mut fk(
                        "fk_requests_budget",
                        Requests::Table,
                        Requests::BudgetId,
                        Budgets::Table,
                        Budgets::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_requests_owner")
                    .table(Requests::Table)
                    .col(Requests::OwnerId)
                    .col(Requests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RequestMessages::Table)
                    .if_not_exists()
                    .col(id(RequestMessages::Id))
                    .col(ColumnDef::new(RequestMessages::RequestId).uuid().not_null())
                    .col(ColumnDef::new(RequestMessages::Role).string().not_null())
                    .col(ColumnDef::new(RequestMessages::Content).text().not_null())
                    .col(timestamp(RequestMessages::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_request_messages_request",
                        RequestMessages::Table,
                        RequestMessages::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(id(Attachments::Id))
                    .col(ColumnDef::new(Attachments::RequestId).uuid().not_null())
                    .col(ColumnDef::new(Attachments::FileName).string().not_null())
                    .col(ColumnDef::new(Attachments::ContentType).string())
                    .col(ColumnDef::new(Attachments::SizeBytes).big_integer().not_null())
                    .col(ColumnDef::new(Attachments::StorageKey).string().not_null())
                    .col(ColumnDef::new(Attachments::UploadedBy).uuid().not_null())
                    .col(timestamp(Attachments::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_attachments_request",
                        Attachments::Table,
                        Attachments::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(id(Quotes::Id))
                    .col(
                        ColumnDef::new(Quotes::QuoteNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Quotes::RequestId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::VendorId).uuid().not_null())
                    .col(money(Quotes::UnitPrice))
                    .col(ColumnDef::new(Quotes::Quantity).integer().not_null())
                    .col(money(Quotes::TotalPrice))
                    .col(ColumnDef::new(Quotes::DeliveryDays).integer().not_null())
                    .col(ColumnDef::new(Quotes::Warranty).string())
                    .col(timestamp(Quotes::ValidUntil))
                    .col(
                        ColumnDef::new(Quotes::Recommended)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(timestamp(Quotes::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_quotes_request",
                        Quotes::Table,
                        Quotes::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .foreign_key(&mut fk(
                        "fk_quotes_vendor",
                        Quotes::Table,
                        Quotes::VendorId,
                        Vendors::Table,
                        Vendors::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quotes_request_vendor")
                    .table(Quotes::Table)
                    .col(Quotes::RequestId)
                    .col(Quotes::VendorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Negotiations::Table)
                    .if_not_exists()
                    .col(id(Negotiations::Id))
                    .col(ColumnDef::new(Negotiations::RequestId).uuid().not_null())
                    .col(ColumnDef::new(Negotiations::QuoteId).uuid().not_null())
                    .col(ColumnDef::new(Negotiations::VendorId).uuid().not_null())
                    .col(money(Negotiations::OriginalPrice))
                    .col(money(Negotiations::CurrentPrice))
                    .col(money(Negotiations::TargetPrice))
                    .col(ColumnDef::new(Negotiations::Status).string().not_null())
                    .col(ColumnDef::new(Negotiations::CompletedAt).timestamp_with_time_zone())
                    .col(timestamp(Negotiations::CreatedAt))
                    .col(timestamp(Negotiations::UpdatedAt))
                    .foreign_key(&mut fk(
                        "fk_negotiations_request",
                        Negotiations::Table,
                        Negotiations::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NegotiationRounds::Table)
                    .if_not_exists()
                    .col(id(NegotiationRounds::Id))
                    .col(
                        ColumnDef::new(NegotiationRounds::NegotiationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NegotiationRounds::Round).integer().not_null())
                    .col(ColumnDef::new(NegotiationRounds::OurOffer).decimal_len(19, 4))
                    .col(ColumnDef::new(NegotiationRounds::VendorResponse).decimal_len(19, 4))
                    .col(ColumnDef::new(NegotiationRounds::Status).string().not_null())
                    .col(ColumnDef::new(NegotiationRounds::Message).text().not_null())
                    .col(timestamp(NegotiationRounds::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_negotiation_rounds_negotiation",
                        NegotiationRounds::Table,
                        NegotiationRounds::NegotiationId,
                        Negotiations::Table,
                        Negotiations::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_negotiation_rounds_round")
                    .table(NegotiationRounds::Table)
                    .col(NegotiationRounds::NegotiationId)
                    .col(NegotiationRounds::Round)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(id(Contracts::Id))
                    .col(
                        ColumnDef::new(Contracts::ContractNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Contracts::RequestId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Contracts::NegotiationId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::Items).json().not_null())
                    .col(money(Contracts::TotalValue))
                    .col(ColumnDef::new(Contracts::PaymentTerms).string().not_null())
                    .col(timestamp(Contracts::DeliveryDate))
                    .col(ColumnDef::new(Contracts::Warranty).string().not_null())
                    .col(ColumnDef::new(Contracts::Terms).json().not_null())
                    .col(ColumnDef::new(Contracts::Status).string().not_null())
                    .col(ColumnDef::new(Contracts::SignedAt).timestamp_with_time_zone())
                    .col(timestamp(Contracts::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_contracts_request",
                        Contracts::Table,
                        Contracts::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(id(PurchaseOrders::Id))
                    .col(
                        ColumnDef::new(PurchaseOrders::PoNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::RequestId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::ContractId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::VendorId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::ShipTo).json().not_null())
                    .col(ColumnDef::new(PurchaseOrders::Items).json().not_null())
                    .col(money(PurchaseOrders::Subtotal))
                    .col(money(PurchaseOrders::Total))
                    .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::AcknowledgedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PurchaseOrders::ShippedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PurchaseOrders::DeliveredAt).timestamp_with_time_zone())
                    .col(timestamp(PurchaseOrders::CreatedAt))
                    .col(timestamp(PurchaseOrders::UpdatedAt))
                    .foreign_key(&mut fk(
                        "fk_purchase_orders_request",
                        PurchaseOrders::Table,
                        PurchaseOrders::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(id(Deliveries::Id))
                    .col(ColumnDef::new(Deliveries::PoId).uuid().not_null())
                    .col(ColumnDef::new(Deliveries::TrackingNumber).string())
                    .col(ColumnDef::new(Deliveries::Carrier).string())
                    .col(ColumnDef::new(Deliveries::Status).string().not_null())
                    .col(timestamp(Deliveries::ShippedAt))
                    .col(ColumnDef::new(Deliveries::DeliveredAt).timestamp_with_time_zone())
                    .col(timestamp(Deliveries::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_deliveries_po",
                        Deliveries::Table,
                        Deliveries::PoId,
                        PurchaseOrders::Table,
                        PurchaseOrders::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(id(Invoices::Id))
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string().not_null())
                    .col(ColumnDef::new(Invoices::PoId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::RequestId).uuid().not_null())
                    .col(money(Invoices::Subtotal))
                    .col(money(Invoices::Tax))
                    .col(money(Invoices::Total))
                    .col(money(Invoices::PoTotal))
                    .col(money(Invoices::Variance))
                    .col(money(Invoices::VariancePercent))
                    .col(ColumnDef::new(Invoices::VarianceReason).text())
                    .col(ColumnDef::new(Invoices::MatchStatus).string().not_null())
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::Items).json().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Invoices::DisputeReason).text())
                    .col(ColumnDef::new(Invoices::PaidAmount).decimal_len(19, 4))
                    .col(ColumnDef::new(Invoices::PaidAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Invoices::PaymentMethod).string())
                    .col(ColumnDef::new(Invoices::PaymentReference).string())
                    .col(timestamp(Invoices::CreatedAt))
                    .col(timestamp(Invoices::UpdatedAt))
                    .foreign_key(&mut fk(
                        "fk_invoices_po",
                        Invoices::Table,
                        Invoices::PoId,
                        PurchaseOrders::Table,
                        PurchaseOrders::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Approvals::Table)
                    .if_not_exists()
                    .col(id(Approvals::Id))
                    .col(ColumnDef::new(Approvals::RequestId).uuid().not_null())
                    .col(ColumnDef::new(Approvals::Step).integer().not_null())
                    .col(ColumnDef::new(Approvals::ApproverId).uuid().not_null())
                    .col(ColumnDef::new(Approvals::Role).string().not_null())
                    .col(ColumnDef::new(Approvals::Threshold).decimal_len(19, 4))
                    .col(ColumnDef::new(Approvals::Status).string().not_null())
                    .col(ColumnDef::new(Approvals::Comments).text())
                    .col(timestamp(Approvals::DueDate))
                    .col(ColumnDef::new(Approvals::DecidedAt).timestamp_with_time_zone())
                    .col(timestamp(Approvals::CreatedAt))
                    .foreign_key(&mut fk(
                        "fk_approvals_request",
                        Approvals::Table,
                        Approvals::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approvals_approver")
                    .table(Approvals::Table)
                    .col(Approvals::ApproverId)
                    .col(Approvals::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecurringSchedules::Table)
                    .if_not_exists()
                    .col(id(RecurringSchedules::Id))
                    .col(
                        ColumnDef::new(RecurringSchedules::RequestId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RecurringSchedules::Frequency).string().not_null())
                    .col(ColumnDef::new(RecurringSchedules::Interval).integer().not_null())
                    .col(ColumnDef::new(RecurringSchedules::DayOfWeek).integer())
                    .col(ColumnDef::new(RecurringSchedules::DayOfMonth).integer())
                    .col(timestamp(RecurringSchedules::StartDate))
                    .col(ColumnDef::new(RecurringSchedules::EndDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(RecurringSchedules::LastRunDate).timestamp_with_time_zone())
                    .col(timestamp(RecurringSchedules::NextRunDate))
                    .col(
                        ColumnDef::new(RecurringSchedules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(RecurringSchedules::CreatedAt))
                    .col(timestamp(RecurringSchedules::UpdatedAt))
                    .foreign_key(&mut fk(
                        "fk_recurring_schedules_request",
                        RecurringSchedules::Table,
                        RecurringSchedules::RequestId,
                        Requests::Table,
                        Requests::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(id(AuditLogs::Id))
                    .col(ColumnDef::new(AuditLogs::ActorId).uuid())
                    .col(ColumnDef::new(AuditLogs::RequestId).uuid())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                    .col(ColumnDef::new(AuditLogs::EntityId).uuid().not_null())
                    .col(ColumnDef::new(AuditLogs::Before).json())
                    .col(ColumnDef::new(AuditLogs::After).json())
                    .col(ColumnDef::new(AuditLogs::Diff).json())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string())
                    .col(ColumnDef::new(AuditLogs::UserAgent).string())
                    .col(timestamp(AuditLogs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_request")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::RequestId)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScheduledTasks::Table)
                    .if_not_exists()
                    .col(id(ScheduledTasks::Id))
                    .col(ColumnDef::new(ScheduledTasks::Kind).string().not_null())
                    .col(ColumnDef::new(ScheduledTasks::Payload).json().not_null())
                    .col(ColumnDef::new(ScheduledTasks::Status).string().not_null())
                    .col(timestamp(ScheduledTasks::DueAt))
                    .col(
                        ColumnDef::new(ScheduledTasks::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScheduledTasks::LastError).text())
                    .col(ColumnDef::new(ScheduledTasks::ExecutedAt).timestamp_with_time_zone())
                    .col(timestamp(ScheduledTasks::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DocumentSequences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DocumentSequences::Prefix).string().not_null())
                    .col(ColumnDef::new(DocumentSequences::Year).integer().not_null())
                    .col(
                        ColumnDef::new(DocumentSequences::NextValue)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DocumentSequences::Prefix)
                            .col(DocumentSequences::Year),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            DocumentSequences::Table.into_iden(),
            ScheduledTasks::Table.into_iden(),
            AuditLogs::Table.into_iden(),
            RecurringSchedules::Table.into_iden(),
            Approvals::Table.into_iden(),
            Invoices::Table.into_iden(),
            Deliveries::Table.into_iden(),
            PurchaseOrders::Table.into_iden(),
            Contracts::Table.into_iden(),
            NegotiationRounds::Table.into_iden(),
            Negotiations::Table.into_iden(),
            Quotes::Table.into_iden(),
            Attachments::Table.into_iden(),
            RequestMessages::Table.into_iden(),
            Requests::Table.into_iden(),
            Vendors::Table.into_iden(),
            Budgets::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Department,
    FiscalYear,
    Quarter,
    TotalAmount,
    SpentAmount,
    CommittedAmount,
    AlertThreshold,
    ManagerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    Name,
    Email,
    Categories,
    Rating,
    Verified,
    TotalOrders,
    TotalValue,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Requests {
    Table,
    Id,
    RequestNumber,
    OwnerId,
    Title,
    Category,
    Description,
    Quantity,
    Specifications,
    BudgetEstimate,
    Urgency,
    DeliveryLocation,
    Status,
    Stage,
    BudgetId,
    ParentRequestId,
    IsRecurring,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RequestMessages {
    Table,
    Id,
    RequestId,
    Role,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    RequestId,
    FileName,
    ContentType,
    SizeBytes,
    StorageKey,
    UploadedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Quotes {
    Table,
    Id,
    QuoteNumber,
    RequestId,
    VendorId,
    UnitPrice,
    Quantity,
    TotalPrice,
    DeliveryDays,
    Warranty,
    ValidUntil,
    Recommended,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Negotiations {
    Table,
    Id,
    RequestId,
    QuoteId,
    VendorId,
    OriginalPrice,
    CurrentPrice,
    TargetPrice,
    Status,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NegotiationRounds {
    Table,
    Id,
    NegotiationId,
    Round,
    OurOffer,
    VendorResponse,
    Status,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
    ContractNumber,
    RequestId,
    NegotiationId,
    VendorId,
    Items,
    TotalValue,
    PaymentTerms,
    DeliveryDate,
    Warranty,
    Terms,
    Status,
    SignedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    PoNumber,
    RequestId,
    ContractId,
    VendorId,
    ShipTo,
    Items,
    Subtotal,
    Total,
    Status,
    AcknowledgedAt,
    ShippedAt,
    DeliveredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Deliveries {
    Table,
    Id,
    PoId,
    TrackingNumber,
    Carrier,
    Status,
    ShippedAt,
    DeliveredAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    PoId,
    VendorId,
    RequestId,
    Subtotal,
    Tax,
    Total,
    PoTotal,
    Variance,
    VariancePercent,
    VarianceReason,
    MatchStatus,
    Status,
    Items,
    DueDate,
    DisputeReason,
    PaidAmount,
    PaidAt,
    PaymentMethod,
    PaymentReference,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Approvals {
    Table,
    Id,
    RequestId,
    Step,
    ApproverId,
    Role,
    Threshold,
    Status,
    Comments,
    DueDate,
    DecidedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RecurringSchedules {
    Table,
    Id,
    RequestId,
    Frequency,
    Interval,
    DayOfWeek,
    DayOfMonth,
    StartDate,
    EndDate,
    LastRunDate,
    NextRunDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    ActorId,
    RequestId,
    Action,
    EntityType,
    EntityId,
    Before,
    After,
    Diff,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScheduledTasks {
    Table,
    Id,
    Kind,
    Payload,
    Status,
    DueAt,
    Attempts,
    LastError,
    ExecutedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DocumentSequences {
    Table,
    Prefix,
    Year,
    NextValue,
}
