// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// 标准科目代码
pub mod codes {
    pub const CASH: &str = "1000";
    pub const ACCOUNTS_RECEIVABLE: &str = "1100";
    pub const UNBILLED_RECEIVABLES: &str = "1150";
    pub const ACCRUED_PAYROLL: &str = "2100";
    pub const SALES_TAX_PAYABLE: &str = "2200";
    pub const DEFERRED_REVENUE: &str = "2300";
    pub const RETAINED_EARNINGS: &str = "3000";
    pub const REVENUE: &str = "4000";
    pub const SERVICE_REVENUE: &str = "4100";
    pub const SUBSCRIPTION_REVENUE: &str = "4200";
    pub const SALES_RETURNS: &str = "4900";
    pub const COST_OF_SERVICES: &str = "5000";
    pub const PROCESSING_FEES: &str = "6100";
}

/// 科目类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

string_enum!(AccountKind {
    Asset => "asset",
    Liability => "liability",
    Equity => "equity",
    Revenue => "revenue",
    Expense => "expense",
});

/// 科目余额方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    Debit,
    Credit,
}

string_enum!(NormalBalance {
    Debit => "debit",
    Credit => "credit",
});

impl NormalBalance {
    /// 按余额方向计算带符号余额
    pub fn balance(&self, debits: i64, credits: i64) -> i64 {
        match self {
            NormalBalance::Debit => debits - credits,
            NormalBalance::Credit => credits - debits,
        }
    }
}

/// 总账科目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub normal_balance: NormalBalance,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// 新租户的默认科目表
pub fn default_chart(tenant_id: Uuid) -> Vec<LedgerAccount> {
    use AccountKind::*;
    use NormalBalance::{Credit, Debit};

    let chart: [(&str, &str, AccountKind, NormalBalance); 13] = [
        (codes::CASH, "Cash", Asset, Debit),
        (codes::ACCOUNTS_RECEIVABLE, "Accounts Receivable", Asset, Debit),
        (codes::UNBILLED_RECEIVABLES, "Unbilled Receivables", Asset, Debit),
        (codes::ACCRUED_PAYROLL, "Accrued Payroll", Liability, Credit),
        (codes::SALES_TAX_PAYABLE, "Sales Tax Payable", Liability, Credit),
        (codes::DEFERRED_REVENUE, "Deferred Revenue", Liability, Credit),
        (codes::RETAINED_EARNINGS, "Retained Earnings", Equity, Credit),
        (codes::REVENUE, "Revenue", Revenue, Credit),
        (codes::SERVICE_REVENUE, "Service Revenue", Revenue, Credit),
        (codes::SUBSCRIPTION_REVENUE, "Subscription Revenue", Revenue, Credit),
        // 收入的备抵科目，借方余额
        (codes::SALES_RETURNS, "Sales Returns & Allowances", Revenue, Debit),
        (codes::COST_OF_SERVICES, "Cost of Services", Expense, Debit),
        (codes::PROCESSING_FEES, "Payment Processing Fees", Expense, Debit),
    ];

    let now = Utc::now();
    chart
        .into_iter()
        .map(|(code, name, kind, normal_balance)| LedgerAccount {
            id: Uuid::new_v4(),
            tenant_id,
            code: code.to_string(),
            name: name.to_string(),
            kind,
            normal_balance,
            active: true,
            created_at: now,
        })
        .collect()
}

/// 会计期间状态
///
/// Open ⇄ Closed → Locked，Locked 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// 开放，可以过账
    #[default]
    Open,
    /// 已结账，可重新开放
    Closed,
    /// 已锁定，不可再变更
    Locked,
}

string_enum!(PeriodStatus {
    Open => "open",
    Closed => "closed",
    Locked => "locked",
});

impl PeriodStatus {
    pub fn can_transition_to(&self, target: PeriodStatus) -> bool {
        matches!(
            (self, target),
            (PeriodStatus::Open, PeriodStatus::Closed)
                | (PeriodStatus::Closed, PeriodStatus::Open)
                | (PeriodStatus::Closed, PeriodStatus::Locked)
        )
    }
}

/// 会计期间，起止日期均包含在内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingPeriod {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountingPeriod {
    pub fn new(
        tenant_id: Uuid,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::validation("period end date precedes start date"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            start_date,
            end_date,
            status: PeriodStatus::Open,
            created_at: now,
            updated_at: now,
        })
    }

    /// 包含指定日期的自然月期间
    pub fn calendar_month(tenant_id: Uuid, date: NaiveDate) -> Result<Self, DomainError> {
        let start = date
            .with_day(1)
            .ok_or_else(|| DomainError::validation("invalid period date"))?;
        let end = last_day_of_month(date.year(), date.month())
            .ok_or_else(|| DomainError::validation("invalid period date"))?;
        Self::new(tenant_id, start.format("%Y-%m").to_string(), start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    pub fn transition(&mut self, target: PeriodStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::transition(self.status, target));
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status != PeriodStatus::Open {
            return Err(DomainError::PeriodNotOpen {
                period: self.name.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// 凭证来源，`(source_type, source_id, event)` 在租户内唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySource {
    /// 来源类型，如 invoice、payment、time_entry、renewal、manual、reversal
    pub source_type: String,
    pub source_id: Option<Uuid>,
    /// 业务事件名，如 invoice_issued
    pub event: String,
}

impl EntrySource {
    pub fn new(source_type: &str, source_id: Uuid, event: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            source_id: Some(source_id),
            event: event.to_string(),
        }
    }

    pub fn manual() -> Self {
        Self {
            source_type: "manual".to_string(),
            source_id: None,
            event: "manual".to_string(),
        }
    }
}

/// 凭证状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Posted,
    Reversed,
}

string_enum!(EntryStatus {
    Posted => "posted",
    Reversed => "reversed",
});

/// 待过账的分录行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineDraft {
    pub account_code: String,
    #[serde(default)]
    pub debit: i64,
    #[serde(default)]
    pub credit: i64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl JournalLineDraft {
    pub fn debit(account_code: &str, amount: i64) -> Self {
        Self {
            account_code: account_code.to_string(),
            debit: amount,
            credit: 0,
            memo: None,
        }
    }

    pub fn credit(account_code: &str, amount: i64) -> Self {
        Self {
            account_code: account_code.to_string(),
            debit: 0,
            credit: amount,
            memo: None,
        }
    }
}

/// 待过账的凭证
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub tenant_id: Uuid,
    pub entry_date: NaiveDate,
    pub memo: String,
    pub source: EntrySource,
    pub lines: Vec<JournalLineDraft>,
    pub created_by: Option<Uuid>,
}

/// 校验分录行并返回凭证金额
///
/// 至少两行；每行借贷恰有一方为正；借贷合计相等。
pub fn validate_lines(lines: &[JournalLineDraft]) -> Result<i64, DomainError> {
    if lines.len() < 2 {
        return Err(DomainError::validation("a journal entry needs at least two lines"));
    }
    let mut debits: i64 = 0;
    let mut credits: i64 = 0;
    for (index, line) in lines.iter().enumerate() {
        if line.debit < 0 || line.credit < 0 {
            return Err(DomainError::validation(format!(
                "line {} has a negative amount",
                index + 1
            )));
        }
        if (line.debit > 0) == (line.credit > 0) {
            return Err(DomainError::validation(format!(
                "line {} must have exactly one of debit or credit",
                index + 1
            )));
        }
        if line.account_code.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "line {} has no account code",
                index + 1
            )));
        }
        debits = debits
            .checked_add(line.debit)
            .ok_or_else(|| DomainError::validation("debit total out of range"))?;
        credits = credits
            .checked_add(line.credit)
            .ok_or_else(|| DomainError::validation("credit total out of range"))?;
    }
    if debits != credits {
        return Err(DomainError::Unbalanced { debits, credits });
    }
    Ok(debits)
}

/// 已过账的分录行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub line_no: i32,
    pub account_code: String,
    pub debit: i64,
    pub credit: i64,
    pub memo: Option<String>,
    pub entry_date: NaiveDate,
}

/// 记账凭证
///
/// 过账后不可修改，仅冲销时标记为 Reversed。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// 凭证号，格式 `JE-{year}-{000001}`
    pub number: String,
    pub entry_date: NaiveDate,
    pub period_id: Uuid,
    pub memo: String,
    pub source: EntrySource,
    pub status: EntryStatus,
    pub reversal_of: Option<Uuid>,
    pub reversed_by: Option<Uuid>,
    pub total: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// 借贷互换后的冲销分录行
    pub fn reversal_lines(&self) -> Vec<JournalLineDraft> {
        self.lines
            .iter()
            .map(|line| JournalLineDraft {
                account_code: line.account_code.clone(),
                debit: line.credit,
                credit: line.debit,
                memo: line.memo.clone(),
            })
            .collect()
    }
}

pub fn entry_number(year: i32, sequence: i64) -> String {
    format!("JE-{}-{:06}", year, sequence)
}

/// 试算平衡表中的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub normal_balance: NormalBalance,
    pub debit_total: i64,
    pub credit_total: i64,
    /// 按余额方向计算的余额
    pub balance: i64,
}

/// 试算平衡表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: i64,
    pub total_credits: i64,
}

/// 科目明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountActivity {
    pub code: String,
    pub name: String,
    pub lines: Vec<JournalLine>,
    pub debit_total: i64,
    pub credit_total: i64,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_chart() {
        let chart = default_chart(Uuid::new_v4());
        assert_eq!(chart.len(), 13);
        let returns = chart.iter().find(|a| a.code == codes::SALES_RETURNS).unwrap();
        assert_eq!(returns.kind, AccountKind::Revenue);
        assert_eq!(returns.normal_balance, NormalBalance::Debit);
        let tax = chart
            .iter()
            .find(|a| a.code == codes::SALES_TAX_PAYABLE)
            .unwrap();
        assert_eq!(tax.normal_balance, NormalBalance::Credit);
    }

    #[test]
    fn test_validate_lines() {
        let balanced = vec![
            JournalLineDraft::debit(codes::CASH, 500),
            JournalLineDraft::credit(codes::REVENUE, 500),
        ];
        assert_eq!(validate_lines(&balanced).unwrap(), 500);

        let unbalanced = vec![
            JournalLineDraft::debit(codes::CASH, 500),
            JournalLineDraft::credit(codes::REVENUE, 400),
        ];
        assert!(matches!(
            validate_lines(&unbalanced),
            Err(DomainError::Unbalanced {
                debits: 500,
                credits: 400
            })
        ));

        assert!(validate_lines(&balanced[..1]).is_err());

        let both_sides = vec![
            JournalLineDraft {
                account_code: codes::CASH.into(),
                debit: 100,
                credit: 100,
                memo: None,
            },
            JournalLineDraft::credit(codes::REVENUE, 0),
        ];
        assert!(matches!(
            validate_lines(&both_sides),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_period_transitions() {
        let mut period = AccountingPeriod::calendar_month(Uuid::new_v4(), day(2026, 2, 14)).unwrap();
        assert_eq!(period.name, "2026-02");
        assert_eq!(period.start_date, day(2026, 2, 1));
        assert_eq!(period.end_date, day(2026, 2, 28));
        assert!(period.contains(day(2026, 2, 28)));
        assert!(!period.contains(day(2026, 3, 1)));

        assert!(period.transition(PeriodStatus::Locked).is_err());
        period.transition(PeriodStatus::Closed).unwrap();
        assert!(period.ensure_open().is_err());
        period.transition(PeriodStatus::Open).unwrap();
        period.transition(PeriodStatus::Closed).unwrap();
        period.transition(PeriodStatus::Locked).unwrap();
        assert!(period.transition(PeriodStatus::Open).is_err());
    }

    #[test]
    fn test_entry_number_and_month_end() {
        assert_eq!(entry_number(2026, 42), "JE-2026-000042");
        assert_eq!(last_day_of_month(2024, 2), Some(day(2024, 2, 29)));
        assert_eq!(last_day_of_month(2026, 12), Some(day(2026, 12, 31)));
    }

    #[test]
    fn test_normal_balance_sign() {
        assert_eq!(NormalBalance::Debit.balance(700, 200), 500);
        assert_eq!(NormalBalance::Credit.balance(700, 200), -500);
    }
}
