// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::ledger::{codes, EntrySource, JournalLineDraft};
use crate::utils::money::mul_div_round;

/// 触发自动过账的业务事件
///
/// 每个事件对应一个固定的分录模板，金额为零的借贷对会被丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingEvent {
    /// 开具发票：借应收，贷收入与销项税
    InvoiceIssued {
        invoice_id: Uuid,
        number: String,
        total: i64,
        tax: i64,
    },
    /// 开具续约发票：收入计入递延收入
    RenewalInvoiced {
        invoice_id: Uuid,
        number: String,
        total: i64,
        tax: i64,
    },
    /// 收款：借现金与手续费，贷应收
    PaymentReceived {
        payment_id: Uuid,
        invoice_number: String,
        amount: i64,
        fee: i64,
    },
    /// 退款：借销售退回，贷现金
    RefundIssued {
        refund_id: Uuid,
        invoice_number: String,
        amount: i64,
    },
    /// 工时：成本计提，可计费工时同时确认未开票收入
    TimeEntryLogged {
        time_entry_id: Uuid,
        minutes: i64,
        cost_rate: i64,
        bill_rate: i64,
        billable: bool,
    },
    /// 递延收入转为订阅收入，同一续约同一日期只确认一次
    RevenueRecognized {
        renewal_id: Uuid,
        recognized_on: NaiveDate,
        amount: i64,
    },
}

impl PostingEvent {
    /// 幂等键
    pub fn source(&self) -> EntrySource {
        match self {
            PostingEvent::InvoiceIssued { invoice_id, .. } => {
                EntrySource::new("invoice", *invoice_id, "invoice_issued")
            }
            PostingEvent::RenewalInvoiced { invoice_id, .. } => {
                EntrySource::new("invoice", *invoice_id, "renewal_invoiced")
            }
            PostingEvent::PaymentReceived { payment_id, .. } => {
                EntrySource::new("payment", *payment_id, "payment_received")
            }
            PostingEvent::RefundIssued { refund_id, .. } => {
                EntrySource::new("payment", *refund_id, "refund_issued")
            }
            PostingEvent::TimeEntryLogged { time_entry_id, .. } => {
                EntrySource::new("time_entry", *time_entry_id, "time_entry_logged")
            }
            PostingEvent::RevenueRecognized {
                renewal_id,
                recognized_on,
                ..
            } => EntrySource::new(
                "renewal",
                *renewal_id,
                &format!("revenue_recognized:{}", recognized_on),
            ),
        }
    }

    pub fn memo(&self) -> String {
        match self {
            PostingEvent::InvoiceIssued { number, .. } => format!("Invoice {} issued", number),
            PostingEvent::RenewalInvoiced { number, .. } => {
                format!("Renewal invoice {} issued", number)
            }
            PostingEvent::PaymentReceived { invoice_number, .. } => {
                format!("Payment received for invoice {}", invoice_number)
            }
            PostingEvent::RefundIssued { invoice_number, .. } => {
                format!("Refund issued for invoice {}", invoice_number)
            }
            PostingEvent::TimeEntryLogged { minutes, .. } => {
                format!("Time entry logged ({} min)", minutes)
            }
            PostingEvent::RevenueRecognized { recognized_on, .. } => {
                format!("Subscription revenue recognized on {}", recognized_on)
            }
        }
    }

    /// 按模板生成分录行
    pub fn lines(&self) -> Result<Vec<JournalLineDraft>, DomainError> {
        let pairs: Vec<JournalLineDraft> = match self {
            PostingEvent::InvoiceIssued { total, tax, .. } => {
                check_tax(*total, *tax)?;
                vec![
                    JournalLineDraft::debit(codes::ACCOUNTS_RECEIVABLE, *total),
                    JournalLineDraft::credit(codes::REVENUE, total - tax),
                    JournalLineDraft::credit(codes::SALES_TAX_PAYABLE, *tax),
                ]
            }
            PostingEvent::RenewalInvoiced { total, tax, .. } => {
                check_tax(*total, *tax)?;
                vec![
                    JournalLineDraft::debit(codes::ACCOUNTS_RECEIVABLE, *total),
                    JournalLineDraft::credit(codes::DEFERRED_REVENUE, total - tax),
                    JournalLineDraft::credit(codes::SALES_TAX_PAYABLE, *tax),
                ]
            }
            PostingEvent::PaymentReceived { amount, fee, .. } => {
                if *amount < 0 || *fee < 0 || fee > amount {
                    return Err(DomainError::validation(
                        "payment fee must be between zero and the payment amount",
                    ));
                }
                vec![
                    JournalLineDraft::debit(codes::CASH, amount - fee),
                    JournalLineDraft::debit(codes::PROCESSING_FEES, *fee),
                    JournalLineDraft::credit(codes::ACCOUNTS_RECEIVABLE, *amount),
                ]
            }
            PostingEvent::RefundIssued { amount, .. } => {
                non_negative(*amount)?;
                vec![
                    JournalLineDraft::debit(codes::SALES_RETURNS, *amount),
                    JournalLineDraft::credit(codes::CASH, *amount),
                ]
            }
            PostingEvent::TimeEntryLogged {
                minutes,
                cost_rate,
                bill_rate,
                billable,
                ..
            } => {
                non_negative(*minutes)?;
                non_negative(*cost_rate)?;
                non_negative(*bill_rate)?;
                let cost = mul_div_round(*minutes, *cost_rate, 60);
                let mut lines = vec![
                    JournalLineDraft::debit(codes::COST_OF_SERVICES, cost),
                    JournalLineDraft::credit(codes::ACCRUED_PAYROLL, cost),
                ];
                if *billable {
                    let billed = mul_div_round(*minutes, *bill_rate, 60);
                    lines.push(JournalLineDraft::debit(codes::UNBILLED_RECEIVABLES, billed));
                    lines.push(JournalLineDraft::credit(codes::SERVICE_REVENUE, billed));
                }
                lines
            }
            PostingEvent::RevenueRecognized { amount, .. } => {
                non_negative(*amount)?;
                vec![
                    JournalLineDraft::debit(codes::DEFERRED_REVENUE, *amount),
                    JournalLineDraft::credit(codes::SUBSCRIPTION_REVENUE, *amount),
                ]
            }
        };

        let lines: Vec<JournalLineDraft> = pairs
            .into_iter()
            .filter(|line| line.debit != 0 || line.credit != 0)
            .collect();
        if lines.is_empty() {
            return Err(DomainError::validation("event produces no journal lines"));
        }
        Ok(lines)
    }
}

fn non_negative(value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation("posting amounts must not be negative"));
    }
    Ok(())
}

fn check_tax(total: i64, tax: i64) -> Result<(), DomainError> {
    if total < 0 || tax < 0 || tax > total {
        return Err(DomainError::validation("tax must be between zero and the invoice total"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ledger::validate_lines;

    fn amounts(lines: &[JournalLineDraft]) -> Vec<(&str, i64, i64)> {
        lines
            .iter()
            .map(|l| (l.account_code.as_str(), l.debit, l.credit))
            .collect()
    }

    #[test]
    fn test_invoice_issued_template() {
        let event = PostingEvent::InvoiceIssued {
            invoice_id: Uuid::new_v4(),
            number: "INV-2026-00001".into(),
            total: 10_825,
            tax: 825,
        };
        let lines = event.lines().unwrap();
        assert_eq!(
            amounts(&lines),
            vec![("1100", 10_825, 0), ("4000", 0, 10_000), ("2200", 0, 825)]
        );
        assert_eq!(validate_lines(&lines).unwrap(), 10_825);
        assert_eq!(event.source().event, "invoice_issued");
    }

    #[test]
    fn test_untaxed_invoice_drops_zero_tax_line() {
        let event = PostingEvent::RenewalInvoiced {
            invoice_id: Uuid::new_v4(),
            number: "INV-2026-00002".into(),
            total: 5_000,
            tax: 0,
        };
        let lines = event.lines().unwrap();
        assert_eq!(amounts(&lines), vec![("1100", 5_000, 0), ("2300", 0, 5_000)]);
    }

    #[test]
    fn test_payment_with_fee() {
        let event = PostingEvent::PaymentReceived {
            payment_id: Uuid::new_v4(),
            invoice_number: "INV-2026-00001".into(),
            amount: 10_000,
            fee: 320,
        };
        let lines = event.lines().unwrap();
        assert_eq!(
            amounts(&lines),
            vec![("1000", 9_680, 0), ("6100", 320, 0), ("1100", 0, 10_000)]
        );
        assert!(validate_lines(&lines).is_ok());

        let bad_fee = PostingEvent::PaymentReceived {
            payment_id: Uuid::new_v4(),
            invoice_number: "x".into(),
            amount: 100,
            fee: 101,
        };
        assert!(bad_fee.lines().is_err());
    }

    #[test]
    fn test_time_entry_rounding_and_billable_pair() {
        let event = PostingEvent::TimeEntryLogged {
            time_entry_id: Uuid::new_v4(),
            minutes: 45,
            cost_rate: 5_000,
            bill_rate: 12_500,
            billable: true,
        };
        let lines = event.lines().unwrap();
        // 45 * 5000 / 60 = 3750, 45 * 12500 / 60 = 9375
        assert_eq!(
            amounts(&lines),
            vec![
                ("5000", 3_750, 0),
                ("2100", 0, 3_750),
                ("1150", 9_375, 0),
                ("4100", 0, 9_375)
            ]
        );

        let non_billable = PostingEvent::TimeEntryLogged {
            time_entry_id: Uuid::new_v4(),
            minutes: 7,
            cost_rate: 1_001,
            bill_rate: 9_999,
            billable: false,
        };
        // 7 * 1001 / 60 = 116.78
        assert_eq!(
            amounts(&non_billable.lines().unwrap()),
            vec![("5000", 117, 0), ("2100", 0, 117)]
        );
    }

    #[test]
    fn test_zero_time_entry_is_rejected() {
        let event = PostingEvent::TimeEntryLogged {
            time_entry_id: Uuid::new_v4(),
            minutes: 30,
            cost_rate: 0,
            bill_rate: 0,
            billable: true,
        };
        assert!(matches!(event.lines(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_refund_and_recognition_templates() {
        let refund = PostingEvent::RefundIssued {
            refund_id: Uuid::new_v4(),
            invoice_number: "INV".into(),
            amount: 2_500,
        };
        assert_eq!(
            amounts(&refund.lines().unwrap()),
            vec![("4900", 2_500, 0), ("1000", 0, 2_500)]
        );

        let recognized_on = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        let recognition = PostingEvent::RevenueRecognized {
            renewal_id: Uuid::new_v4(),
            recognized_on,
            amount: 1_000,
        };
        assert_eq!(
            amounts(&recognition.lines().unwrap()),
            vec![("2300", 1_000, 0), ("4200", 0, 1_000)]
        );
        assert_eq!(
            recognition.source().event,
            "revenue_recognized:2026-04-30"
        );
    }
}
