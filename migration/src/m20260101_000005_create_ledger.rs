// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create chart of accounts table
        manager
            .create_table(
                Table::create()
                    .table(LedgerAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerAccounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LedgerAccounts::Code).string().not_null())
                    .col(ColumnDef::new(LedgerAccounts::Name).string().not_null())
                    .col(ColumnDef::new(LedgerAccounts::Kind).string().not_null())
                    .col(ColumnDef::new(LedgerAccounts::NormalBalance).string().not_null())
                    .col(
                        ColumnDef::new(LedgerAccounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::CreatedAt)
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
                    .name("idx_ledger_accounts_tenant_code")
                    .table(LedgerAccounts::Table)
                    .col(LedgerAccounts::TenantId)
                    .col(LedgerAccounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create accounting periods table
        manager
            .create_table(
                Table::create()
                    .table(AccountingPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountingPeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountingPeriods::TenantId).uuid().not_null())
                    .col(ColumnDef::new(AccountingPeriods::Name).string().not_null())
                    .col(ColumnDef::new(AccountingPeriods::StartDate).date().not_null())
                    .col(ColumnDef::new(AccountingPeriods::EndDate).date().not_null())
                    .col(ColumnDef::new(AccountingPeriods::Status).string().not_null())
                    .col(
                        ColumnDef::new(AccountingPeriods::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AccountingPeriods::UpdatedAt)
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
                    .name("idx_accounting_periods_tenant_start")
                    .table(AccountingPeriods::Table)
                    .col(AccountingPeriods::TenantId)
                    .col(AccountingPeriods::StartDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create journal entries table
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::TenantId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::Number).string().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::PeriodId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::Memo).string().not_null())
                    .col(ColumnDef::new(JournalEntries::SourceType).string().not_null())
                    .col(ColumnDef::new(JournalEntries::SourceId).uuid())
                    .col(ColumnDef::new(JournalEntries::SourceEvent).string().not_null())
                    .col(ColumnDef::new(JournalEntries::Status).string().not_null())
                    .col(ColumnDef::new(JournalEntries::ReversalOf).uuid())
                    .col(ColumnDef::new(JournalEntries::ReversedBy).uuid())
                    .col(ColumnDef::new(JournalEntries::Total).big_integer().not_null())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).uuid())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
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
                    .name("idx_journal_entries_tenant_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_source")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::SourceType)
                    .col(JournalEntries::SourceId)
                    .col(JournalEntries::SourceEvent)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create journal lines table
        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalLines::TenantId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::EntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::LineNo).integer().not_null())
                    .col(ColumnDef::new(JournalLines::AccountCode).string().not_null())
                    .col(
                        ColumnDef::new(JournalLines::Debit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalLines::Credit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalLines::Memo).string())
                    .col(ColumnDef::new(JournalLines::EntryDate).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_entry")
                    .table(JournalLines::Table)
                    .col(JournalLines::EntryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_account")
                    .table(JournalLines::Table)
                    .col(JournalLines::TenantId)
                    .col(JournalLines::AccountCode)
                    .col(JournalLines::EntryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalLines::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AccountingPeriods::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LedgerAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LedgerAccounts {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    Kind,
    NormalBalance,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AccountingPeriods {
    Table,
    Id,
    TenantId,
    Name,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    TenantId,
    Number,
    EntryDate,
    PeriodId,
    Memo,
    SourceType,
    SourceId,
    SourceEvent,
    Status,
    ReversalOf,
    ReversedBy,
    Total,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JournalLines {
    Table,
    Id,
    TenantId,
    EntryId,
    LineNo,
    AccountCode,
    Debit,
    Credit,
    Memo,
    EntryDate,
}
