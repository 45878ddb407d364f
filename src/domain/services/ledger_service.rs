// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::auto_posting::PostingEvent;
use crate::domain::errors::DomainError;
use crate::domain::models::ledger::{
    default_chart, validate_lines, AccountActivity, AccountKind, AccountingPeriod, EntrySource,
    JournalEntry, JournalLineDraft, LedgerAccount, NewJournalEntry, NormalBalance, PeriodStatus,
    TrialBalance, TrialBalanceRow,
};
use crate::domain::repositories::ledger_repository::{EntryQuery, LedgerRepository};
use crate::domain::repositories::RepositoryError;

/// 总账服务
///
/// 负责凭证校验、期间查找、幂等过账、冲销以及报表。
/// 其他业务模块只通过 [`LedgerService::post_event`] 写入总账。
pub struct LedgerService {
    repo: Arc<dyn LedgerRepository>,
    auto_create_periods: bool,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LedgerRepository>, auto_create_periods: bool) -> Self {
        Self {
            repo,
            auto_create_periods,
        }
    }

    /// 为租户写入默认科目表
    pub async fn seed_chart(&self, tenant_id: Uuid) -> Result<u64, DomainError> {
        let inserted = self.repo.seed_accounts(&default_chart(tenant_id)).await?;
        debug!(tenant_id = %tenant_id, inserted, "Seeded chart of accounts");
        Ok(inserted)
    }

    pub async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<LedgerAccount>, DomainError> {
        Ok(self.repo.list_accounts(tenant_id).await?)
    }

    pub async fn create_account(
        &self,
        tenant_id: Uuid,
        code: String,
        name: String,
        kind: AccountKind,
        normal_balance: NormalBalance,
    ) -> Result<LedgerAccount, DomainError> {
        let account = LedgerAccount {
            id: Uuid::new_v4(),
            tenant_id,
            code: code.trim().to_string(),
            name,
            kind,
            normal_balance,
            active: true,
            created_at: Utc::now(),
        };
        match self.repo.create_account(&account).await {
            Ok(account) => Ok(account),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "account {} already exists",
                account.code
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_account_active(
        &self,
        tenant_id: Uuid,
        code: &str,
        active: bool,
    ) -> Result<(), DomainError> {
        match self.repo.set_account_active(tenant_id, code, active).await {
            Err(RepositoryError::NotFound) => Err(DomainError::NotFound("ledger account")),
            other => Ok(other?),
        }
    }

    /// 创建会计期间，同一租户的期间不能重叠
    pub async fn create_period(
        &self,
        tenant_id: Uuid,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AccountingPeriod, DomainError> {
        let period = AccountingPeriod::new(tenant_id, name, start_date, end_date)?;
        let overlapping = self
            .repo
            .find_overlapping_periods(tenant_id, start_date, end_date)
            .await?;
        if let Some(existing) = overlapping.first() {
            return Err(DomainError::conflict(format!(
                "period overlaps existing period {}",
                existing.name
            )));
        }
        match self.repo.create_period(&period).await {
            Ok(period) => Ok(period),
            Err(RepositoryError::Conflict(msg)) => Err(DomainError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_periods(&self, tenant_id: Uuid) -> Result<Vec<AccountingPeriod>, DomainError> {
        Ok(self.repo.list_periods(tenant_id).await?)
    }

    /// 变更期间状态：结账、重新开放或锁定
    pub async fn transition_period(
        &self,
        tenant_id: Uuid,
        period_id: Uuid,
        target: PeriodStatus,
    ) -> Result<AccountingPeriod, DomainError> {
        let mut period = self
            .repo
            .find_period(tenant_id, period_id)
            .await?
            .ok_or(DomainError::NotFound("accounting period"))?;
        period.transition(target)?;
        self.repo
            .update_period_status(tenant_id, period_id, target)
            .await?;
        info!(
            tenant_id = %tenant_id,
            period = %period.name,
            status = %target,
            "Accounting period status changed"
        );
        Ok(period)
    }

    /// 查找日期所属期间，必要时按自然月自动创建
    async fn period_for(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<AccountingPeriod, DomainError> {
        if let Some(period) = self.repo.find_period_for_date(tenant_id, date).await? {
            return Ok(period);
        }
        if !self.auto_create_periods {
            return Err(DomainError::validation(format!(
                "no accounting period covers {}",
                date
            )));
        }

        let month = AccountingPeriod::calendar_month(tenant_id, date)?;
        let overlapping = self
            .repo
            .find_overlapping_periods(tenant_id, month.start_date, month.end_date)
            .await?;
        if !overlapping.is_empty() {
            return Err(DomainError::validation(format!(
                "no accounting period covers {} and the calendar month overlaps existing periods",
                date
            )));
        }

        match self.repo.create_period(&month).await {
            Ok(period) => {
                info!(tenant_id = %tenant_id, period = %period.name, "Auto-created accounting period");
                Ok(period)
            }
            // 并发请求已创建同一期间
            Err(RepositoryError::Conflict(_)) => self
                .repo
                .find_period_for_date(tenant_id, date)
                .await?
                .ok_or(DomainError::NotFound("accounting period")),
            Err(e) => Err(e.into()),
        }
    }

    /// 检查日期所在期间是否允许过账
    pub async fn ensure_postable(&self, tenant_id: Uuid, date: NaiveDate) -> Result<(), DomainError> {
        self.period_for(tenant_id, date).await?.ensure_open()
    }

    async fn check_accounts(
        &self,
        tenant_id: Uuid,
        lines: &[JournalLineDraft],
        require_active: bool,
    ) -> Result<(), DomainError> {
        let codes: Vec<String> = lines
            .iter()
            .map(|l| l.account_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let accounts: HashMap<String, LedgerAccount> = self
            .repo
            .find_accounts_by_codes(tenant_id, &codes)
            .await?
            .into_iter()
            .map(|a| (a.code.clone(), a))
            .collect();
        for code in &codes {
            match accounts.get(code) {
                None => {
                    return Err(DomainError::validation(format!("unknown account code {}", code)))
                }
                Some(account) if require_active && !account.active => {
                    return Err(DomainError::validation(format!("account {} is inactive", code)))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// 过账
    ///
    /// 同一业务来源重复过账时返回已有凭证。
    pub async fn post(&self, entry: NewJournalEntry) -> Result<JournalEntry, DomainError> {
        let total = validate_lines(&entry.lines)?;

        let idempotent = entry.source.source_id.is_some();
        if idempotent {
            if let Some(existing) = self
                .repo
                .find_entry_by_source(entry.tenant_id, &entry.source)
                .await?
            {
                debug!(
                    entry = %existing.number,
                    source_type = %entry.source.source_type,
                    event = %entry.source.event,
                    "Journal entry already posted for source"
                );
                return Ok(existing);
            }
        }

        self.check_accounts(entry.tenant_id, &entry.lines, true)
            .await?;
        let period = self.period_for(entry.tenant_id, entry.entry_date).await?;
        period.ensure_open()?;

        match self.repo.insert_entry(&entry, period.id, total).await {
            Ok(posted) => {
                counter!(
                    "journal_entries_posted_total",
                    "source_type" => entry.source.source_type.clone()
                )
                .increment(1);
                info!(
                    tenant_id = %entry.tenant_id,
                    entry = %posted.number,
                    total,
                    source_type = %entry.source.source_type,
                    event = %entry.source.event,
                    "Journal entry posted"
                );
                Ok(posted)
            }
            Err(RepositoryError::Conflict(msg)) if idempotent => {
                warn!(error = %msg, "Concurrent posting for the same source, returning existing entry");
                self.repo
                    .find_entry_by_source(entry.tenant_id, &entry.source)
                    .await?
                    .ok_or(DomainError::Conflict(msg))
            }
            Err(RepositoryError::Conflict(msg)) => Err(DomainError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// 按模板过账业务事件
    pub async fn post_event(
        &self,
        tenant_id: Uuid,
        entry_date: NaiveDate,
        event: &PostingEvent,
        created_by: Option<Uuid>,
    ) -> Result<JournalEntry, DomainError> {
        let entry = NewJournalEntry {
            tenant_id,
            entry_date,
            memo: event.memo(),
            source: event.source(),
            lines: event.lines()?,
            created_by,
        };
        self.post(entry).await
    }

    /// 手工凭证
    pub async fn post_manual(
        &self,
        tenant_id: Uuid,
        entry_date: NaiveDate,
        memo: String,
        lines: Vec<JournalLineDraft>,
        created_by: Option<Uuid>,
    ) -> Result<JournalEntry, DomainError> {
        self.post(NewJournalEntry {
            tenant_id,
            entry_date,
            memo,
            source: EntrySource::manual(),
            lines,
            created_by,
        })
        .await
    }

    /// 冲销凭证
    ///
    /// 生成借贷互换的新凭证并将原凭证标记为已冲销，每张凭证只能冲销一次。
    pub async fn reverse(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
        entry_date: NaiveDate,
        memo: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<JournalEntry, DomainError> {
        let original = self
            .repo
            .find_entry(tenant_id, entry_id)
            .await?
            .ok_or(DomainError::NotFound("journal entry"))?;
        if original.reversed_by.is_some() {
            return Err(DomainError::conflict(format!(
                "entry {} has already been reversed",
                original.number
            )));
        }
        if original.reversal_of.is_some() {
            return Err(DomainError::conflict(format!(
                "entry {} is itself a reversal",
                original.number
            )));
        }

        let lines = original.reversal_lines();
        let total = validate_lines(&lines)?;
        self.check_accounts(tenant_id, &lines, false).await?;
        let period = self.period_for(tenant_id, entry_date).await?;
        period.ensure_open()?;

        let reversal = NewJournalEntry {
            tenant_id,
            entry_date,
            memo: memo.unwrap_or_else(|| format!("Reversal of {}", original.number)),
            source: EntrySource::new("reversal", original.id, "reversed"),
            lines,
            created_by,
        };
        match self
            .repo
            .insert_reversal(original.id, &reversal, period.id, total)
            .await
        {
            Ok(entry) => {
                counter!("journal_entries_posted_total", "source_type" => "reversal").increment(1);
                info!(
                    tenant_id = %tenant_id,
                    original = %original.number,
                    reversal = %entry.number,
                    "Journal entry reversed"
                );
                Ok(entry)
            }
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "entry {} has already been reversed",
                original.number
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_entry(&self, tenant_id: Uuid, id: Uuid) -> Result<JournalEntry, DomainError> {
        self.repo
            .find_entry(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("journal entry"))
    }

    pub async fn list_entries(
        &self,
        tenant_id: Uuid,
        query: EntryQuery,
    ) -> Result<Vec<JournalEntry>, DomainError> {
        Ok(self.repo.list_entries(tenant_id, query).await?)
    }

    /// 科目明细
    pub async fn account_activity(
        &self,
        tenant_id: Uuid,
        code: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AccountActivity, DomainError> {
        let account = self
            .repo
            .find_accounts_by_codes(tenant_id, &[code.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(DomainError::NotFound("ledger account"))?;
        let lines = self.repo.account_lines(tenant_id, code, from, to).await?;
        let debit_total: i64 = lines.iter().map(|l| l.debit).sum();
        let credit_total: i64 = lines.iter().map(|l| l.credit).sum();
        Ok(AccountActivity {
            code: account.code,
            name: account.name,
            balance: account.normal_balance.balance(debit_total, credit_total),
            lines,
            debit_total,
            credit_total,
        })
    }

    /// 试算平衡表
    pub async fn trial_balance(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, DomainError> {
        let accounts = self.repo.list_accounts(tenant_id).await?;
        let totals: HashMap<String, (i64, i64)> = self
            .repo
            .totals_as_of(tenant_id, as_of)
            .await?
            .into_iter()
            .map(|t| (t.account_code, (t.debit, t.credit)))
            .collect();

        let mut rows: Vec<TrialBalanceRow> = accounts
            .into_iter()
            .map(|account| {
                let (debit_total, credit_total) =
                    totals.get(&account.code).copied().unwrap_or((0, 0));
                TrialBalanceRow {
                    balance: account.normal_balance.balance(debit_total, credit_total),
                    code: account.code,
                    name: account.name,
                    kind: account.kind,
                    normal_balance: account.normal_balance,
                    debit_total,
                    credit_total,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debits = rows.iter().map(|r| r.debit_total).sum();
        let total_credits = rows.iter().map(|r| r.credit_total).sum();
        Ok(TrialBalance {
            as_of,
            rows,
            total_debits,
            total_credits,
        })
    }
}
