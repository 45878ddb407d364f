// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;

fn invoice(total: i64) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        number: "INV-2026-00001".into(),
        account_id: Uuid::new_v4(),
        billing_email: None,
        status: InvoiceStatus::Draft,
        issue_date: None,
        due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        currency: "USD".into(),
        lines: vec![],
        discount: None,
        tax_rate_bps: 0,
        totals: Totals {
            subtotal: total,
            discount_total: 0,
            tax_total: 0,
            total,
        },
        amount_paid: 0,
        amount_refunded: 0,
        source: InvoiceSource::Manual,
        quote_id: None,
        renewal_id: None,
        issuance_entry_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_draft_rejects_payments() {
    let mut inv = invoice(10_000);
    assert!(matches!(
        inv.apply_payment(100),
        Err(DomainError::Conflict(_))
    ));
}

#[test]
fn test_payment_lifecycle_and_status_derivation() {
    let mut inv = invoice(10_000);
    inv.issue(day(2026, 1, 1)).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Open);
    assert_eq!(inv.issue_date, Some(day(2026, 1, 1)));

    inv.apply_payment(4_000).unwrap();
    assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(inv.balance_due(), 6_000);

    // 超额付款被拒绝，余额不变
    assert!(inv.apply_payment(6_001).is_err());
    assert_eq!(inv.balance_due(), 6_000);

    inv.apply_payment(6_000).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Paid);
    assert_eq!(inv.balance_due(), 0);
    assert!(inv.apply_payment(1).is_err());

    inv.apply_refund(2_500).unwrap();
    assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(inv.balance_due(), 2_500);

    assert!(inv.apply_refund(7_501).is_err());
    inv.apply_refund(7_500).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Refunded);
    assert_eq!(inv.balance_due(), 10_000);
}

#[test]
fn test_refund_after_partial_payment_reopens() {
    let mut inv = invoice(5_000);
    inv.issue(day(2026, 1, 1)).unwrap();
    inv.apply_payment(2_000).unwrap();
    inv.apply_refund(2_000).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Refunded);
    assert!(inv.apply_payment(1_000).is_err());
}

#[test]
fn test_overdue_is_computed_on_read() {
    let mut inv = invoice(1_000);
    assert!(!inv.is_overdue(day(2026, 3, 1)));
    inv.issue(day(2026, 1, 1)).unwrap();
    assert!(!inv.is_overdue(day(2026, 2, 1)));
    assert!(inv.is_overdue(day(2026, 2, 2)));

    let view = inv.clone().view(day(2026, 2, 2));
    assert!(view.is_overdue);
    assert_eq!(view.balance_due, 1_000);

    inv.apply_payment(1_000).unwrap();
    assert!(!inv.is_overdue(day(2026, 2, 2)));
}

#[test]
fn test_void_rules() {
    let mut draft = invoice(1_000);
    assert!(draft.void().is_ok());
    assert_eq!(draft.status, InvoiceStatus::Void);
    assert!(draft.issue(day(2026, 1, 1)).is_err());

    let mut paid = invoice(1_000);
    paid.issue(day(2026, 1, 1)).unwrap();
    paid.apply_payment(500).unwrap();
    assert!(paid.void().is_err());
}

#[test]
fn test_zero_total_invoice_is_paid_on_issue() {
    let mut inv = invoice(0);
    inv.issue(day(2026, 1, 1)).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Paid);
}

#[test]
fn test_version_tracks_status_and_amounts() {
    let mut inv = invoice(10_000);
    inv.issue(day(2026, 1, 5)).unwrap();
    let issued = inv.version();
    assert_eq!(issued.status, InvoiceStatus::Open);

    inv.apply_payment(4_000).unwrap();
    let paid = inv.version();
    assert_ne!(paid, issued);
    assert_eq!(paid.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(paid.amount_paid, 4_000);

    inv.apply_refund(4_000).unwrap();
    assert_eq!(inv.version().amount_refunded, 4_000);
    assert_ne!(inv.version(), paid);
}
