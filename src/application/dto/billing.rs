// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::pricing::LineItem;
use crate::domain::models::quote::QuoteStatus;
use crate::domain::models::invoice::InvoiceStatus;

/// 单据明细来源：手工明细行与套餐可以混用
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LinesDto {
    #[serde(default)]
    pub lines: Vec<LineItem>,
    /// 展开为明细行的套餐
    #[serde(default)]
    pub bundle_ids: Vec<Uuid>,
    /// 折扣码
    pub discount_code: Option<String>,
    /// 税率（基点）
    #[validate(range(min = 0, max = 10000))]
    #[serde(default)]
    pub tax_rate_bps: i32,
}

/// 报价请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuoteRequestDto {
    pub account_id: Uuid,
    pub contact_id: Option<Uuid>,
    #[serde(flatten)]
    #[validate(nested)]
    pub pricing: LinesDto,
    pub valid_until: NaiveDate,
}

/// 报价过滤参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuoteFilterDto {
    pub account_id: Option<Uuid>,
    pub status: Option<QuoteStatus>,
}

/// 发票请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct InvoiceRequestDto {
    pub account_id: Uuid,
    #[validate(email)]
    pub billing_email: Option<String>,
    pub due_date: NaiveDate,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub pricing: LinesDto,
}

/// 发票过滤参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvoiceFilterDto {
    pub account_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
}

/// 收款请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PaymentRequestDto {
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub fee: i64,
    #[validate(length(min = 1, max = 64))]
    pub method: String,
    #[validate(length(min = 1, max = 64))]
    pub provider: String,
    #[validate(length(min = 1, max = 255))]
    pub external_id: String,
    /// 入账日期，默认今天
    pub received_on: Option<NaiveDate>,
}

/// 退款请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RefundRequestDto {
    #[validate(range(min = 1))]
    pub amount: i64,
    pub payment_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub provider: String,
    #[validate(length(min = 1, max = 255))]
    pub external_id: String,
    pub refunded_on: Option<NaiveDate>,
}

/// 续约请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RenewalRequestDto {
    pub account_id: Uuid,
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub amount: i64,
    #[validate(range(min = 0, max = 10000))]
    #[serde(default)]
    pub tax_rate_bps: i32,
    #[validate(range(min = 1, max = 36))]
    pub term_months: i32,
    pub start_date: NaiveDate,
    pub renewal_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub auto_renew: bool,
    #[validate(email)]
    pub billing_email: Option<String>,
}

fn default_true() -> bool {
    true
}

/// 即将到期的续约查询参数
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpcomingQueryDto {
    #[serde(default = "default_upcoming_days")]
    pub days: i64,
}

fn default_upcoming_days() -> i64 {
    30
}

/// 确认收入请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecognizeRequestDto {
    #[validate(range(min = 1))]
    pub amount: i64,
    pub recognized_on: Option<NaiveDate>,
}

/// 工时请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TimeEntryRequestDto {
    pub account_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub work_date: NaiveDate,
    #[validate(range(min = 1, max = 1440))]
    pub minutes: i32,
    #[serde(default)]
    pub billable: bool,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub bill_rate: i64,
    #[validate(range(min = 0))]
    pub cost_rate: i64,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
}
