// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::last_day_of_month;
use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenewalStatus {
    #[default]
    Active,
    Cancelled,
}

string_enum!(RenewalStatus {
    Active => "active",
    Cancelled => "cancelled",
});

/// 续约（订阅）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Renewal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    /// 每期金额（不含税，分）
    pub amount: i64,
    pub tax_rate_bps: i32,
    /// 期长（月），1 到 36
    pub term_months: i32,
    pub start_date: NaiveDate,
    /// 下次续约日期
    pub renewal_date: NaiveDate,
    pub auto_renew: bool,
    pub status: RenewalStatus,
    pub billing_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Renewal {
    pub fn validate_term(term_months: i32) -> Result<(), DomainError> {
        if !(1..=36).contains(&term_months) {
            return Err(DomainError::validation("term_months must be between 1 and 36"));
        }
        Ok(())
    }

    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != RenewalStatus::Active {
            return Err(DomainError::conflict(format!(
                "renewal {} is cancelled",
                self.id
            )));
        }
        Ok(())
    }

    /// 续约日期顺延一个周期
    pub fn advance(&mut self) -> Result<(), DomainError> {
        self.renewal_date = add_months(self.renewal_date, self.term_months as u32)
            .ok_or_else(|| DomainError::validation("renewal date out of range"))?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == RenewalStatus::Cancelled {
            return Err(DomainError::transition(
                RenewalStatus::Cancelled,
                RenewalStatus::Cancelled,
            ));
        }
        self.status = RenewalStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// 日期加上若干月，日超出目标月天数时取月末
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, date.day().min(last.day()))
}

/// 工时记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub minutes: i32,
    pub billable: bool,
    /// 计费费率（分/小时）
    pub bill_rate: i64,
    /// 成本费率（分/小时）
    pub cost_rate: i64,
    pub description: String,
    pub journal_entry_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(day(2026, 1, 31), 1), Some(day(2026, 2, 28)));
        assert_eq!(add_months(day(2024, 1, 31), 1), Some(day(2024, 2, 29)));
        assert_eq!(add_months(day(2026, 11, 15), 3), Some(day(2027, 2, 15)));
        assert_eq!(add_months(day(2026, 3, 31), 12), Some(day(2027, 3, 31)));
    }

    #[test]
    fn test_term_validation() {
        assert!(Renewal::validate_term(0).is_err());
        assert!(Renewal::validate_term(1).is_ok());
        assert!(Renewal::validate_term(36).is_ok());
        assert!(Renewal::validate_term(37).is_err());
    }
}
