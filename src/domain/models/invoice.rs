// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{AppliedDiscount, LineItem, Totals};
use crate::domain::errors::DomainError;

/// 发票状态
///
/// Draft 与 Void 为显式状态，其余状态在每次收付款后由金额推导。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// 草稿，尚未开具
    #[default]
    Draft,
    /// 已开具，待付款
    Open,
    /// 部分付款
    PartiallyPaid,
    /// 已付清
    Paid,
    /// 已全额退款
    Refunded,
    /// 已作废
    Void,
}

string_enum!(InvoiceStatus {
    Draft => "draft",
    Open => "open",
    PartiallyPaid => "partially_paid",
    Paid => "paid",
    Refunded => "refunded",
    Void => "void",
});

/// 发票来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceSource {
    #[default]
    Manual,
    Quote,
    Renewal,
}

string_enum!(InvoiceSource {
    Manual => "manual",
    Quote => "quote",
    Renewal => "renewal",
});

/// 发票
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// 编号，格式 `INV-{year}-{00001}`
    pub number: String,
    pub account_id: Uuid,
    pub billing_email: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub currency: String,
    pub lines: Vec<LineItem>,
    pub discount: Option<AppliedDiscount>,
    pub tax_rate_bps: i32,
    #[serde(flatten)]
    pub totals: Totals,
    /// 累计收款（分）
    pub amount_paid: i64,
    /// 累计退款（分）
    pub amount_refunded: i64,
    pub source: InvoiceSource,
    pub quote_id: Option<Uuid>,
    pub renewal_id: Option<Uuid>,
    /// 开票凭证，作废时用于冲销
    pub issuance_entry_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 发票在数据库中的版本：状态与金额
///
/// 条件更新以此为 WHERE 条件，任一字段被其他请求修改时更新不生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceVersion {
    pub status: InvoiceStatus,
    pub amount_paid: i64,
    pub amount_refunded: i64,
}

impl Invoice {
    /// 当前版本，需在修改状态或金额之前获取
    pub fn version(&self) -> InvoiceVersion {
        InvoiceVersion {
            status: self.status,
            amount_paid: self.amount_paid,
            amount_refunded: self.amount_refunded,
        }
    }

    /// 净收款 = 收款 - 退款
    pub fn net_paid(&self) -> i64 {
        self.amount_paid - self.amount_refunded
    }

    /// 待付余额
    pub fn balance_due(&self) -> i64 {
        self.totals.total - self.net_paid()
    }

    /// 根据金额推导状态
    pub fn derive_status(&self) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Void => InvoiceStatus::Void,
            InvoiceStatus::Draft => InvoiceStatus::Draft,
            _ if self.amount_paid > 0 && self.amount_refunded >= self.amount_paid => {
                InvoiceStatus::Refunded
            }
            _ if self.balance_due() == 0 => InvoiceStatus::Paid,
            _ if self.net_paid() > 0 => InvoiceStatus::PartiallyPaid,
            _ => InvoiceStatus::Open,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Open | InvoiceStatus::PartiallyPaid
        ) && self.due_date < today
    }

    /// 开具发票：Draft → Open（零金额发票直接为 Paid）
    pub fn issue(&mut self, today: NaiveDate) -> Result<(), DomainError> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::transition(self.status, InvoiceStatus::Open));
        }
        self.status = InvoiceStatus::Open;
        self.issue_date = Some(today);
        self.status = self.derive_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 记入一笔收款
    pub fn apply_payment(&mut self, amount: i64) -> Result<(), DomainError> {
        if !matches!(
            self.status,
            InvoiceStatus::Open | InvoiceStatus::PartiallyPaid
        ) {
            return Err(DomainError::conflict(format!(
                "invoice {} is {} and cannot accept payments",
                self.number, self.status
            )));
        }
        if amount <= 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if amount > self.balance_due() {
            return Err(DomainError::validation(format!(
                "payment of {} exceeds balance due {}",
                amount,
                self.balance_due()
            )));
        }
        self.amount_paid += amount;
        self.status = self.derive_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 记入一笔退款
    pub fn apply_refund(&mut self, amount: i64) -> Result<(), DomainError> {
        if matches!(self.status, InvoiceStatus::Draft | InvoiceStatus::Void) {
            return Err(DomainError::conflict(format!(
                "invoice {} is {} and cannot be refunded",
                self.number, self.status
            )));
        }
        if amount <= 0 {
            return Err(DomainError::validation("refund amount must be positive"));
        }
        if amount > self.net_paid() {
            return Err(DomainError::validation(format!(
                "refund of {} exceeds refundable amount {}",
                amount,
                self.net_paid()
            )));
        }
        self.amount_refunded += amount;
        self.status = self.derive_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 作废发票，仅限无收款的草稿或待付发票
    pub fn void(&mut self) -> Result<(), DomainError> {
        if !matches!(self.status, InvoiceStatus::Draft | InvoiceStatus::Open) || self.amount_paid > 0
        {
            return Err(DomainError::transition(self.status, InvoiceStatus::Void));
        }
        self.status = InvoiceStatus::Void;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn view(self, today: NaiveDate) -> InvoiceView {
        InvoiceView {
            balance_due: self.balance_due(),
            is_overdue: self.is_overdue(today),
            invoice: self,
        }
    }
}

/// 对外输出的发票视图，附带读取时计算的字段
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub balance_due: i64,
    pub is_overdue: bool,
}

/// 收款记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Payment,
    Refund,
}

string_enum!(PaymentKind {
    Payment => "payment",
    Refund => "refund",
});

/// 收款或退款记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub kind: PaymentKind,
    pub amount: i64,
    /// 支付渠道手续费
    pub fee: i64,
    /// 支付方式，如 card、bank_transfer、check
    pub method: String,
    /// 渠道，如 stripe、paypal、manual
    pub provider: String,
    /// 渠道侧唯一标识，用于幂等
    pub external_id: String,
    /// 退款对应的原始收款
    pub payment_id: Option<Uuid>,
    pub journal_entry_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "invoice_test.rs"]
mod tests;
