// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::ledger::{
    AccountingPeriod, EntrySource, JournalEntry, JournalLine, LedgerAccount, NewJournalEntry,
    PeriodStatus,
};

/// 凭证查询参数
#[derive(Debug, Default, Clone)]
pub struct EntryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub source_type: Option<String>,
    pub source_id: Option<Uuid>,
    pub limit: Option<u64>,
}

/// 科目合计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTotals {
    pub account_code: String,
    pub debit: i64,
    pub credit: i64,
}

/// 总账仓库
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// 写入科目，已存在的代码被跳过
    async fn seed_accounts(&self, accounts: &[LedgerAccount]) -> Result<u64, RepositoryError>;
    async fn create_account(&self, account: &LedgerAccount) -> Result<LedgerAccount, RepositoryError>;
    async fn set_account_active(
        &self,
        tenant_id: Uuid,
        code: &str,
        active: bool,
    ) -> Result<(), RepositoryError>;
    async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<LedgerAccount>, RepositoryError>;
    async fn find_accounts_by_codes(
        &self,
        tenant_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<LedgerAccount>, RepositoryError>;

    async fn create_period(&self, period: &AccountingPeriod) -> Result<AccountingPeriod, RepositoryError>;
    async fn find_period(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<AccountingPeriod>, RepositoryError>;
    /// 查找包含指定日期的期间
    async fn find_period_for_date(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, RepositoryError>;
    /// 查找与日期区间重叠的期间
    async fn find_overlapping_periods(
        &self,
        tenant_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, RepositoryError>;
    async fn list_periods(&self, tenant_id: Uuid) -> Result<Vec<AccountingPeriod>, RepositoryError>;
    async fn update_period_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: PeriodStatus,
    ) -> Result<(), RepositoryError>;

    /// 按业务来源查找凭证
    async fn find_entry_by_source(
        &self,
        tenant_id: Uuid,
        source: &EntrySource,
    ) -> Result<Option<JournalEntry>, RepositoryError>;
    async fn find_entry(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<JournalEntry>, RepositoryError>;
    async fn list_entries(
        &self,
        tenant_id: Uuid,
        query: EntryQuery,
    ) -> Result<Vec<JournalEntry>, RepositoryError>;

    /// 在同一事务中分配凭证号并写入凭证与分录
    ///
    /// 来源重复时返回 Conflict。
    async fn insert_entry(
        &self,
        entry: &NewJournalEntry,
        period_id: Uuid,
        total: i64,
    ) -> Result<JournalEntry, RepositoryError>;

    /// 在同一事务中写入冲销凭证并标记原凭证为已冲销
    ///
    /// 原凭证已被冲销时返回 Conflict。
    async fn insert_reversal(
        &self,
        original_id: Uuid,
        entry: &NewJournalEntry,
        period_id: Uuid,
        total: i64,
    ) -> Result<JournalEntry, RepositoryError>;

    /// 科目在日期区间内的分录
    async fn account_lines(
        &self,
        tenant_id: Uuid,
        code: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<JournalLine>, RepositoryError>;

    /// 截至指定日期各科目的借贷合计
    async fn totals_as_of(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<AccountTotals>, RepositoryError>;
}
