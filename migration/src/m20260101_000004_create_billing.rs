use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create quotes table
        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Quotes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::Number).string().not_null())
                    .col(ColumnDef::new(Quotes::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::ContactId).uuid())
                    .col(ColumnDef::new(Quotes::Status).string().not_null())
                    .col(ColumnDef::new(Quotes::Lines).json_binary().not_null())
                    .col(ColumnDef::new(Quotes::Discount).json_binary())
                    .col(ColumnDef::new(Quotes::TaxRateBps).integer().not_null())
                    .col(ColumnDef::new(Quotes::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Quotes::DiscountTotal).big_integer().not_null())
                    .col(ColumnDef::new(Quotes::TaxTotal).big_integer().not_null())
                    .col(ColumnDef::new(Quotes::Total).big_integer().not_null())
                    .col(ColumnDef::new(Quotes::ValidUntil).date().not_null())
                    .col(ColumnDef::new(Quotes::InvoiceId).uuid())
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Quotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quotes_tenant_account")
                    .table(Quotes::Table)
                    .col(Quotes::TenantId)
                    .col(Quotes::AccountId)
                    .to_owned(),
            )
            .await?;

        // Create invoices table
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::Number).string().not_null())
                    .col(ColumnDef::new(Invoices::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::BillingEmail).string())
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).date())
                    .col(ColumnDef::new(Invoices::DueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::Currency).string().not_null())
                    .col(ColumnDef::new(Invoices::Lines).json_binary().not_null())
                    .col(ColumnDef::new(Invoices::Discount).json_binary())
                    .col(ColumnDef::new(Invoices::TaxRateBps).integer().not_null())
                    .col(ColumnDef::new(Invoices::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::DiscountTotal).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::TaxTotal).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Total).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::AmountPaid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invoices::AmountRefunded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Invoices::Source).string().not_null())
                    .col(ColumnDef::new(Invoices::QuoteId).uuid())
                    .col(ColumnDef::new(Invoices::RenewalId).uuid())
                    .col(ColumnDef::new(Invoices::IssuanceEntryId).uuid())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Invoices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_tenant_number")
                    .table(Invoices::Table)
                    .col(Invoices::TenantId)
                    .col(Invoices::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_tenant_account")
                    .table(Invoices::Table)
                    .col(Invoices::TenantId)
                    .col(Invoices::AccountId)
                    .to_owned(),
            )
            .await?;

        // Create payments table (payments and refunds)
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                    .col(ColumnDef::new(Payments::Kind).string().not_null())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::Fee)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::Provider).string().not_null())
                    .col(ColumnDef::new(Payments::ExternalId).string().not_null())
                    .col(ColumnDef::new(Payments::PaymentId).uuid())
                    .col(ColumnDef::new(Payments::JournalEntryId).uuid())
                    .col(
                        ColumnDef::new(Payments::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_external")
                    .table(Payments::Table)
                    .col(Payments::TenantId)
                    .col(Payments::Provider)
                    .col(Payments::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_invoice")
                    .table(Payments::Table)
                    .col(Payments::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // Create renewals table
        manager
            .create_table(
                Table::create()
                    .table(Renewals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Renewals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Renewals::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Renewals::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Renewals::ProductId).uuid())
                    .col(ColumnDef::new(Renewals::Name).string().not_null())
                    .col(ColumnDef::new(Renewals::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Renewals::TaxRateBps).integer().not_null())
                    .col(ColumnDef::new(Renewals::TermMonths).integer().not_null())
                    .col(ColumnDef::new(Renewals::StartDate).date().not_null())
                    .col(ColumnDef::new(Renewals::RenewalDate).date().not_null())
                    .col(
                        ColumnDef::new(Renewals::AutoRenew)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Renewals::Status).string().not_null())
                    .col(ColumnDef::new(Renewals::BillingEmail).string())
                    .col(
                        ColumnDef::new(Renewals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Renewals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_renewals_tenant_date")
                    .table(Renewals::Table)
                    .col(Renewals::TenantId)
                    .col(Renewals::RenewalDate)
                    .to_owned(),
            )
            .await?;

        // Create time entries table
        manager
            .create_table(
                Table::create()
                    .table(TimeEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TimeEntries::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TimeEntries::UserId).uuid().not_null())
                    .col(ColumnDef::new(TimeEntries::AccountId).uuid().not_null())
                    .col(ColumnDef::new(TimeEntries::TicketId).uuid())
                    .col(ColumnDef::new(TimeEntries::WorkDate).date().not_null())
                    .col(ColumnDef::new(TimeEntries::Minutes).integer().not_null())
                    .col(ColumnDef::new(TimeEntries::Billable).boolean().not_null())
                    .col(ColumnDef::new(TimeEntries::BillRate).big_integer().not_null())
                    .col(ColumnDef::new(TimeEntries::CostRate).big_integer().not_null())
                    .col(ColumnDef::new(TimeEntries::Description).string().not_null())
                    .col(ColumnDef::new(TimeEntries::JournalEntryId).uuid())
                    .col(
                        ColumnDef::new(TimeEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payment webhook idempotency table
        manager
            .create_table(
                Table::create()
                    .table(PaymentWebhookEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentWebhookEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentWebhookEvents::Provider).string().not_null())
                    .col(ColumnDef::new(PaymentWebhookEvents::EventId).string().not_null())
                    .col(ColumnDef::new(PaymentWebhookEvents::EventType).string().not_null())
                    .col(ColumnDef::new(PaymentWebhookEvents::TenantId).uuid())
                    .col(ColumnDef::new(PaymentWebhookEvents::Status).string().not_null())
                    .col(ColumnDef::new(PaymentWebhookEvents::Error).text())
                    .col(
                        ColumnDef::new(PaymentWebhookEvents::Payload)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentWebhookEvents::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PaymentWebhookEvents::ProcessedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_webhook_events_provider_event")
                    .table(PaymentWebhookEvents::Table)
                    .col(PaymentWebhookEvents::Provider)
                    .col(PaymentWebhookEvents::EventId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentWebhookEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TimeEntries::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Renewals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Quotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Quotes {
    Table,
    Id,
    TenantId,
    Number,
    AccountId,
    ContactId,
    Status,
    Lines,
    Discount,
    TaxRateBps,
    Subtotal,
    DiscountTotal,
    TaxTotal,
    Total,
    ValidUntil,
    InvoiceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    TenantId,
    Number,
    AccountId,
    BillingEmail,
    Status,
    IssueDate,
    DueDate,
    Currency,
    Lines,
    Discount,
    TaxRateBps,
    Subtotal,
    DiscountTotal,
    TaxTotal,
    Total,
    AmountPaid,
    AmountRefunded,
    Source,
    QuoteId,
    RenewalId,
    IssuanceEntryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    TenantId,
    InvoiceId,
    Kind,
    Amount,
    Fee,
    Method,
    Provider,
    ExternalId,
    PaymentId,
    JournalEntryId,
    ReceivedAt,
}

#[derive(DeriveIden)]
enum Renewals {
    Table,
    Id,
    TenantId,
    AccountId,
    ProductId,
    Name,
    Amount,
    TaxRateBps,
    TermMonths,
    StartDate,
    RenewalDate,
    AutoRenew,
    Status,
    BillingEmail,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TimeEntries {
    Table,
    Id,
    TenantId,
    UserId,
    AccountId,
    TicketId,
    WorkDate,
    Minutes,
    Billable,
    BillRate,
    CostRate,
    Description,
    JournalEntryId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PaymentWebhookEvents {
    Table,
    Id,
    Provider,
    EventId,
    EventType,
    TenantId,
    Status,
    Error,
    Payload,
    ReceivedAt,
    ProcessedAt,
}
