// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::{Alias, Expr, Func, OnConflict};
use sea_orm::*;
use uuid::Uuid;

use super::sequence_repo_impl::next_sequence_value;
use super::{parse_column, tz, utc, write_err};
use crate::domain::models::ledger::{
    entry_number, AccountingPeriod, EntrySource, EntryStatus, JournalEntry, JournalLine,
    LedgerAccount, NewJournalEntry, PeriodStatus,
};
use crate::domain::repositories::ledger_repository::{AccountTotals, EntryQuery, LedgerRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{
    accounting_period, journal_entry, journal_line, ledger_account,
};

/// 总账仓库实现
///
/// 凭证与分录在同一事务中写入，凭证号按年度序列分配
#[derive(Clone)]
pub struct LedgerRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl LedgerRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 加载凭证的分录并组装
    async fn with_lines(
        &self,
        models: Vec<journal_entry::Model>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut lines: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
        for line in journal_line::Entity::find()
            .filter(journal_line::Column::EntryId.is_in(ids))
            .order_by_asc(journal_line::Column::LineNo)
            .all(self.db.as_ref())
            .await?
        {
            lines.entry(line.entry_id).or_default().push(line.into());
        }
        models
            .into_iter()
            .map(|model| {
                let entry_lines = lines.remove(&model.id).unwrap_or_default();
                entry_from_model(model, entry_lines)
            })
            .collect()
    }
}

fn account_active_model(account: &LedgerAccount) -> ledger_account::ActiveModel {
    ledger_account::ActiveModel {
        id: Set(account.id),
        tenant_id: Set(account.tenant_id),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        kind: Set(account.kind.as_str().to_string()),
        normal_balance: Set(account.normal_balance.as_str().to_string()),
        active: Set(account.active),
        created_at: Set(tz(account.created_at)),
    }
}

impl TryFrom<ledger_account::Model> for LedgerAccount {
    type Error = RepositoryError;

    fn try_from(model: ledger_account::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            code: model.code,
            name: model.name,
            kind: parse_column(&model.kind, "account kind")?,
            normal_balance: parse_column(&model.normal_balance, "normal balance")?,
            active: model.active,
            created_at: utc(model.created_at),
        })
    }
}

impl TryFrom<accounting_period::Model> for AccountingPeriod {
    type Error = RepositoryError;

    fn try_from(model: accounting_period::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            status: parse_column(&model.status, "period status")?,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl From<journal_line::Model> for JournalLine {
    fn from(model: journal_line::Model) -> Self {
        Self {
            id: model.id,
            entry_id: model.entry_id,
            line_no: model.line_no,
            account_code: model.account_code,
            debit: model.debit,
            credit: model.credit,
            memo: model.memo,
            entry_date: model.entry_date,
        }
    }
}

fn entry_from_model(
    model: journal_entry::Model,
    lines: Vec<JournalLine>,
) -> Result<JournalEntry, RepositoryError> {
    Ok(JournalEntry {
        id: model.id,
        tenant_id: model.tenant_id,
        number: model.number,
        entry_date: model.entry_date,
        period_id: model.period_id,
        memo: model.memo,
        source: EntrySource {
            source_type: model.source_type,
            source_id: model.source_id,
            event: model.source_event,
        },
        status: parse_column(&model.status, "entry status")?,
        reversal_of: model.reversal_of,
        reversed_by: model.reversed_by,
        total: model.total,
        created_by: model.created_by,
        created_at: utc(model.created_at),
        lines,
    })
}

/// 在事务中分配凭证号并写入凭证与分录
async fn write_entry(
    txn: &DatabaseTransaction,
    id: Uuid,
    entry: &NewJournalEntry,
    period_id: Uuid,
    total: i64,
    reversal_of: Option<Uuid>,
) -> Result<JournalEntry, RepositoryError> {
    let year = entry.entry_date.year();
    let sequence = next_sequence_value(txn, entry.tenant_id, &format!("journal:{}", year)).await?;
    let number = entry_number(year, sequence);
    let created_at = Utc::now();

    journal_entry::Entity::insert(journal_entry::ActiveModel {
        id: Set(id),
        tenant_id: Set(entry.tenant_id),
        number: Set(number.clone()),
        entry_date: Set(entry.entry_date),
        period_id: Set(period_id),
        memo: Set(entry.memo.clone()),
        source_type: Set(entry.source.source_type.clone()),
        source_id: Set(entry.source.source_id),
        source_event: Set(entry.source.event.clone()),
        status: Set(EntryStatus::Posted.as_str().to_string()),
        reversal_of: Set(reversal_of),
        reversed_by: Set(None),
        total: Set(total),
        created_by: Set(entry.created_by),
        created_at: Set(tz(created_at)),
    })
    .exec_without_returning(txn)
    .await
    .map_err(write_err)?;

    let lines: Vec<JournalLine> = entry
        .lines
        .iter()
        .enumerate()
        .map(|(i, draft)| JournalLine {
            id: Uuid::new_v4(),
            entry_id: id,
            line_no: i as i32 + 1,
            account_code: draft.account_code.clone(),
            debit: draft.debit,
            credit: draft.credit,
            memo: draft.memo.clone(),
            entry_date: entry.entry_date,
        })
        .collect();

    journal_line::Entity::insert_many(lines.iter().map(|line| journal_line::ActiveModel {
        id: Set(line.id),
        tenant_id: Set(entry.tenant_id),
        entry_id: Set(line.entry_id),
        line_no: Set(line.line_no),
        account_code: Set(line.account_code.clone()),
        debit: Set(line.debit),
        credit: Set(line.credit),
        memo: Set(line.memo.clone()),
        entry_date: Set(line.entry_date),
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(JournalEntry {
        id,
        tenant_id: entry.tenant_id,
        number,
        entry_date: entry.entry_date,
        period_id,
        memo: entry.memo.clone(),
        source: entry.source.clone(),
        status: EntryStatus::Posted,
        reversal_of,
        reversed_by: None,
        total,
        created_by: entry.created_by,
        created_at,
        lines,
    })
}

#[async_trait]
impl LedgerRepository for LedgerRepoImpl {
    async fn seed_accounts(&self, accounts: &[LedgerAccount]) -> Result<u64, RepositoryError> {
        if accounts.is_empty() {
            return Ok(0);
        }
        let inserted = ledger_account::Entity::insert_many(accounts.iter().map(account_active_model))
            .on_conflict(
                OnConflict::columns([ledger_account::Column::TenantId, ledger_account::Column::Code])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(inserted)
    }

    async fn create_account(&self, account: &LedgerAccount) -> Result<LedgerAccount, RepositoryError> {
        ledger_account::Entity::insert(account_active_model(account))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(account.clone())
    }

    async fn set_account_active(
        &self,
        tenant_id: Uuid,
        code: &str,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let result = ledger_account::Entity::update_many()
            .col_expr(ledger_account::Column::Active, Expr::value(active))
            .filter(ledger_account::Column::TenantId.eq(tenant_id))
            .filter(ledger_account::Column::Code.eq(code))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<LedgerAccount>, RepositoryError> {
        ledger_account::Entity::find()
            .filter(ledger_account::Column::TenantId.eq(tenant_id))
            .order_by_asc(ledger_account::Column::Code)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(LedgerAccount::try_from)
            .collect()
    }

    async fn find_accounts_by_codes(
        &self,
        tenant_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<LedgerAccount>, RepositoryError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        ledger_account::Entity::find()
            .filter(ledger_account::Column::TenantId.eq(tenant_id))
            .filter(ledger_account::Column::Code.is_in(codes.iter().cloned()))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(LedgerAccount::try_from)
            .collect()
    }

    async fn create_period(&self, period: &AccountingPeriod) -> Result<AccountingPeriod, RepositoryError> {
        let active_model = accounting_period::ActiveModel {
            id: Set(period.id),
            tenant_id: Set(period.tenant_id),
            name: Set(period.name.clone()),
            start_date: Set(period.start_date),
            end_date: Set(period.end_date),
            status: Set(period.status.as_str().to_string()),
            created_at: Set(tz(period.created_at)),
            updated_at: Set(tz(period.updated_at)),
        };
        accounting_period::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(period.clone())
    }

    async fn find_period(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AccountingPeriod>, RepositoryError> {
        accounting_period::Entity::find_by_id(id)
            .filter(accounting_period::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(AccountingPeriod::try_from)
            .transpose()
    }

    async fn find_period_for_date(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, RepositoryError> {
        accounting_period::Entity::find()
            .filter(accounting_period::Column::TenantId.eq(tenant_id))
            .filter(accounting_period::Column::StartDate.lte(date))
            .filter(accounting_period::Column::EndDate.gte(date))
            .one(self.db.as_ref())
            .await?
            .map(AccountingPeriod::try_from)
            .transpose()
    }

    async fn find_overlapping_periods(
        &self,
        tenant_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, RepositoryError> {
        accounting_period::Entity::find()
            .filter(accounting_period::Column::TenantId.eq(tenant_id))
            .filter(accounting_period::Column::StartDate.lte(end))
            .filter(accounting_period::Column::EndDate.gte(start))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(AccountingPeriod::try_from)
            .collect()
    }

    async fn list_periods(&self, tenant_id: Uuid) -> Result<Vec<AccountingPeriod>, RepositoryError> {
        accounting_period::Entity::find()
            .filter(accounting_period::Column::TenantId.eq(tenant_id))
            .order_by_asc(accounting_period::Column::StartDate)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(AccountingPeriod::try_from)
            .collect()
    }

    async fn update_period_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: PeriodStatus,
    ) -> Result<(), RepositoryError> {
        let result = accounting_period::Entity::update_many()
            .col_expr(accounting_period::Column::Status, Expr::value(status.as_str()))
            .col_expr(accounting_period::Column::UpdatedAt, Expr::value(tz(Utc::now())))
            .filter(accounting_period::Column::TenantId.eq(tenant_id))
            .filter(accounting_period::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_entry_by_source(
        &self,
        tenant_id: Uuid,
        source: &EntrySource,
    ) -> Result<Option<JournalEntry>, RepositoryError> {
        let mut query = journal_entry::Entity::find()
            .filter(journal_entry::Column::TenantId.eq(tenant_id))
            .filter(journal_entry::Column::SourceType.eq(source.source_type.as_str()))
            .filter(journal_entry::Column::SourceEvent.eq(source.event.as_str()));
        query = match source.source_id {
            Some(source_id) => query.filter(journal_entry::Column::SourceId.eq(source_id)),
            None => query.filter(journal_entry::Column::SourceId.is_null()),
        };
        let Some(model) = query.one(self.db.as_ref()).await? else {
            return Ok(None);
        };
        Ok(self.with_lines(vec![model]).await?.pop())
    }

    async fn find_entry(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<JournalEntry>, RepositoryError> {
        let Some(model) = journal_entry::Entity::find_by_id(id)
            .filter(journal_entry::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };
        Ok(self.with_lines(vec![model]).await?.pop())
    }

    async fn list_entries(
        &self,
        tenant_id: Uuid,
        query: EntryQuery,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        let mut select = journal_entry::Entity::find()
            .filter(journal_entry::Column::TenantId.eq(tenant_id));
        if let Some(from) = query.from {
            select = select.filter(journal_entry::Column::EntryDate.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(journal_entry::Column::EntryDate.lte(to));
        }
        if let Some(source_type) = query.source_type {
            select = select.filter(journal_entry::Column::SourceType.eq(source_type));
        }
        if let Some(source_id) = query.source_id {
            select = select.filter(journal_entry::Column::SourceId.eq(source_id));
        }
        let models = select
            .order_by_desc(journal_entry::Column::EntryDate)
            .order_by_desc(journal_entry::Column::Number)
            .limit(query.limit.unwrap_or(200))
            .all(self.db.as_ref())
            .await?;
        self.with_lines(models).await
    }

    async fn insert_entry(
        &self,
        entry: &NewJournalEntry,
        period_id: Uuid,
        total: i64,
    ) -> Result<JournalEntry, RepositoryError> {
        let txn = self.db.begin().await?;
        let posted = write_entry(&txn, Uuid::new_v4(), entry, period_id, total, None).await?;
        txn.commit().await?;
        Ok(posted)
    }

    async fn insert_reversal(
        &self,
        original_id: Uuid,
        entry: &NewJournalEntry,
        period_id: Uuid,
        total: i64,
    ) -> Result<JournalEntry, RepositoryError> {
        let txn = self.db.begin().await?;
        let reversal_id = Uuid::new_v4();

        let marked = journal_entry::Entity::update_many()
            .col_expr(
                journal_entry::Column::Status,
                Expr::value(EntryStatus::Reversed.as_str()),
            )
            .col_expr(journal_entry::Column::ReversedBy, Expr::value(Some(reversal_id)))
            .filter(journal_entry::Column::TenantId.eq(entry.tenant_id))
            .filter(journal_entry::Column::Id.eq(original_id))
            .filter(journal_entry::Column::Status.eq(EntryStatus::Posted.as_str()))
            .filter(journal_entry::Column::ReversedBy.is_null())
            .exec(&txn)
            .await?;
        if marked.rows_affected != 1 {
            txn.rollback().await?;
            return Err(RepositoryError::Conflict(
                "journal entry has already been reversed".to_string(),
            ));
        }

        let posted = write_entry(&txn, reversal_id, entry, period_id, total, Some(original_id)).await?;
        txn.commit().await?;
        Ok(posted)
    }

    async fn account_lines(
        &self,
        tenant_id: Uuid,
        code: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<JournalLine>, RepositoryError> {
        let mut select = journal_line::Entity::find()
            .filter(journal_line::Column::TenantId.eq(tenant_id))
            .filter(journal_line::Column::AccountCode.eq(code));
        if let Some(from) = from {
            select = select.filter(journal_line::Column::EntryDate.gte(from));
        }
        if let Some(to) = to {
            select = select.filter(journal_line::Column::EntryDate.lte(to));
        }
        let models = select
            .order_by_asc(journal_line::Column::EntryDate)
            .order_by_asc(journal_line::Column::EntryId)
            .order_by_asc(journal_line::Column::LineNo)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn totals_as_of(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<AccountTotals>, RepositoryError> {
        // Postgres 的 SUM(bigint) 返回 numeric，统一转换回 bigint
        let sum = |column: journal_line::Column| -> sea_orm::sea_query::SimpleExpr {
            Func::cast_as(Func::sum(Expr::col(column)), Alias::new("BIGINT")).into()
        };
        let rows: Vec<(String, i64, i64)> = journal_line::Entity::find()
            .select_only()
            .column(journal_line::Column::AccountCode)
            .column_as(sum(journal_line::Column::Debit), "debit")
            .column_as(sum(journal_line::Column::Credit), "credit")
            .filter(journal_line::Column::TenantId.eq(tenant_id))
            .filter(journal_line::Column::EntryDate.lte(as_of))
            .group_by(journal_line::Column::AccountCode)
            .order_by_asc(journal_line::Column::AccountCode)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(account_code, debit, credit)| AccountTotals {
                account_code,
                debit,
                credit,
            })
            .collect())
    }
}
