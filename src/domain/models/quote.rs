// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{AppliedDiscount, LineItem, Totals};
use crate::domain::errors::DomainError;

/// 报价状态
///
/// 状态流转：Draft → Sent → Accepted / Declined / Expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// 草稿
    #[default]
    Draft,
    /// 已发送给客户
    Sent,
    /// 客户已接受
    Accepted,
    /// 客户已拒绝
    Declined,
    /// 已过期
    Expired,
}

string_enum!(QuoteStatus {
    Draft => "draft",
    Sent => "sent",
    Accepted => "accepted",
    Declined => "declined",
    Expired => "expired",
});

/// 报价单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// 编号，格式 `Q-{year}-{00001}`
    pub number: String,
    pub account_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub status: QuoteStatus,
    pub lines: Vec<LineItem>,
    pub discount: Option<AppliedDiscount>,
    pub tax_rate_bps: i32,
    #[serde(flatten)]
    pub totals: Totals,
    pub valid_until: NaiveDate,
    /// 转换后的发票
    pub invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 客户对报价的答复
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteDecision {
    Accept,
    Decline,
}

impl Quote {
    pub fn send(&mut self) -> Result<(), DomainError> {
        match self.status {
            QuoteStatus::Draft => {
                self.status = QuoteStatus::Sent;
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(DomainError::transition(other, QuoteStatus::Sent)),
        }
    }

    /// 接受或拒绝报价
    ///
    /// 报价已过有效期时，状态被置为 Expired 并返回错误，
    /// 调用方需要持久化过期状态。
    pub fn decide(&mut self, decision: QuoteDecision, today: NaiveDate) -> Result<(), DomainError> {
        let target = match decision {
            QuoteDecision::Accept => QuoteStatus::Accepted,
            QuoteDecision::Decline => QuoteStatus::Declined,
        };
        if self.status != QuoteStatus::Sent {
            return Err(DomainError::transition(self.status, target));
        }
        self.updated_at = Utc::now();
        if today > self.valid_until {
            self.status = QuoteStatus::Expired;
            return Err(DomainError::transition(QuoteStatus::Expired, target));
        }
        self.status = target;
        Ok(())
    }

    pub fn expire(&mut self) -> Result<(), DomainError> {
        match self.status {
            QuoteStatus::Sent => {
                self.status = QuoteStatus::Expired;
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(DomainError::transition(other, QuoteStatus::Expired)),
        }
    }

    /// 只有已接受且未转换的报价可以生成发票
    pub fn ensure_convertible(&self) -> Result<(), DomainError> {
        if self.status != QuoteStatus::Accepted {
            return Err(DomainError::conflict(format!(
                "quote {} is {}, only accepted quotes can be invoiced",
                self.number, self.status
            )));
        }
        if self.invoice_id.is_some() {
            return Err(DomainError::conflict(format!(
                "quote {} has already been invoiced",
                self.number
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(status: QuoteStatus) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            number: "Q-2026-00001".into(),
            account_id: Uuid::new_v4(),
            contact_id: None,
            status,
            lines: vec![],
            discount: None,
            tax_rate_bps: 0,
            totals: Totals::default(),
            valid_until: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            invoice_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_send_then_accept() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let mut q = quote(QuoteStatus::Draft);
        q.send().unwrap();
        q.decide(QuoteDecision::Accept, today).unwrap();
        assert_eq!(q.status, QuoteStatus::Accepted);
        assert!(q.ensure_convertible().is_ok());

        q.invoice_id = Some(Uuid::new_v4());
        assert!(q.ensure_convertible().is_err());
    }

    #[test]
    fn test_decision_after_validity_expires_quote() {
        let late = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let mut q = quote(QuoteStatus::Sent);
        assert!(q.decide(QuoteDecision::Decline, late).is_err());
        assert_eq!(q.status, QuoteStatus::Expired);
    }

    #[test]
    fn test_draft_cannot_be_accepted() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut q = quote(QuoteStatus::Draft);
        assert!(q.decide(QuoteDecision::Accept, today).is_err());
        assert_eq!(q.status, QuoteStatus::Draft);
        assert!(q.ensure_convertible().is_err());
    }
}
