// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::ledger::{AccountKind, JournalLineDraft, NormalBalance, PeriodStatus};

/// 手工凭证请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ManualEntryRequestDto {
    pub entry_date: NaiveDate,
    #[validate(length(min = 1, max = 500))]
    pub memo: String,
    #[validate(length(min = 2))]
    pub lines: Vec<JournalLineDraft>,
}

/// 冲销请求DTO
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReverseRequestDto {
    pub entry_date: Option<NaiveDate>,
    pub memo: Option<String>,
}

/// 会计期间请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PeriodRequestDto {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// 期间状态变更DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeriodStatusRequestDto {
    pub status: PeriodStatus,
}

/// 科目请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LedgerAccountRequestDto {
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: AccountKind,
    pub normal_balance: NormalBalance,
}

/// 科目启用状态DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountActiveRequestDto {
    pub active: bool,
}

/// 凭证查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct EntryQueryDto {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub source_type: Option<String>,
    pub source_id: Option<Uuid>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// 报表日期参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportQueryDto {
    pub as_of: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
