// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::utils::tokens::hmac_sha256_hex;
use serde_json::json;

const SECRET: &str = "whsec_test";

fn stripe_header(body: &[u8], t: i64) -> String {
    let mut signed = format!("{}.", t).into_bytes();
    signed.extend_from_slice(body);
    format!("t={},v1={}", t, hmac_sha256_hex(SECRET.as_bytes(), &signed))
}

#[test]
fn test_stripe_signature_accepts_valid_header() {
    let body = br#"{"id":"evt_1"}"#;
    let header = stripe_header(body, 1_700_000_000);
    assert!(verify_stripe_signature(&header, body, SECRET, 300, 1_700_000_100).is_ok());
}

#[test]
fn test_stripe_signature_accepts_any_matching_v1() {
    let body = br#"{"id":"evt_1"}"#;
    let valid = stripe_header(body, 1_700_000_000);
    let header = format!("{},v1=deadbeef", valid.replace(",v1=", ",v1=00ff,v1="));
    assert!(verify_stripe_signature(&header, body, SECRET, 300, 1_700_000_000).is_ok());
}

#[test]
fn test_stripe_signature_rejects_tampering_and_stale_timestamps() {
    let body = br#"{"id":"evt_1"}"#;
    let header = stripe_header(body, 1_700_000_000);

    let tampered = verify_stripe_signature(&header, br#"{"id":"evt_2"}"#, SECRET, 300, 1_700_000_000);
    assert!(matches!(tampered, Err(DomainError::InvalidSignature(_))));

    let stale = verify_stripe_signature(&header, body, SECRET, 300, 1_700_000_301);
    assert!(matches!(stale, Err(DomainError::InvalidSignature(_))));

    let missing = verify_stripe_signature("t=1700000000", body, SECRET, 300, 1_700_000_000);
    assert!(matches!(missing, Err(DomainError::InvalidSignature(_))));
}

#[test]
fn test_parse_stripe_payment_intent() {
    let tenant = Uuid::new_v4();
    let invoice = Uuid::new_v4();
    let event = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_123",
            "amount_received": 10825,
            "payment_method_types": ["card"],
            "metadata": { "tenant_id": tenant.to_string(), "invoice_id": invoice.to_string() }
        }}
    });
    assert_eq!(
        parse_stripe_event(&event).unwrap(),
        PaymentAction::Payment {
            tenant_id: tenant,
            invoice_id: invoice,
            amount: 10825,
            fee: 0,
            method: "card".into(),
            external_id: "pi_123".into(),
        }
    );
}

#[test]
fn test_parse_stripe_refund_is_cumulative() {
    let tenant = Uuid::new_v4();
    let invoice = Uuid::new_v4();
    let event = json!({
        "id": "evt_2",
        "type": "charge.refunded",
        "data": { "object": {
            "id": "ch_1",
            "payment_intent": "pi_123",
            "amount_refunded": 2500,
            "metadata": { "tenant_id": tenant.to_string(), "invoice_id": invoice.to_string() }
        }}
    });
    assert_eq!(
        parse_stripe_event(&event).unwrap(),
        PaymentAction::CumulativeRefund {
            tenant_id: tenant,
            invoice_id: invoice,
            payment_external_id: "pi_123".into(),
            cumulative: 2500,
        }
    );
}

#[test]
fn test_parse_stripe_unknown_type_is_ignored_and_missing_metadata_fails() {
    let unknown = json!({ "id": "evt_3", "type": "customer.created", "data": { "object": {} } });
    assert_eq!(parse_stripe_event(&unknown).unwrap(), PaymentAction::Ignore);

    let missing = json!({
        "id": "evt_4",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_1", "amount_received": 100, "metadata": {} } }
    });
    assert!(matches!(parse_stripe_event(&missing), Err(DomainError::Validation(_))));
}

#[test]
fn test_parse_paypal_capture_converts_decimal_amounts() {
    let tenant = Uuid::new_v4();
    let invoice = Uuid::new_v4();
    let event = json!({
        "id": "WH-1",
        "event_type": "PAYMENT.CAPTURE.COMPLETED",
        "resource": {
            "id": "CAP-1",
            "custom_id": format!("{}:{}", tenant, invoice),
            "amount": { "currency_code": "USD", "value": "108.25" },
            "seller_receivable_breakdown": { "paypal_fee": { "value": "3.44" } }
        }
    });
    assert_eq!(
        parse_paypal_event(&event).unwrap(),
        PaymentAction::Payment {
            tenant_id: tenant,
            invoice_id: invoice,
            amount: 10825,
            fee: 344,
            method: "paypal".into(),
            external_id: "CAP-1".into(),
        }
    );
}

#[test]
fn test_parse_paypal_refund_links_original_capture() {
    let tenant = Uuid::new_v4();
    let invoice = Uuid::new_v4();
    let event = json!({
        "id": "WH-2",
        "event_type": "PAYMENT.CAPTURE.REFUNDED",
        "resource": {
            "id": "REF-1",
            "custom_id": format!("{}:{}", tenant, invoice),
            "amount": { "value": "10" },
            "links": [
                { "rel": "self", "href": "https://api.paypal.com/v2/payments/refunds/REF-1" },
                { "rel": "up", "href": "https://api.paypal.com/v2/payments/captures/CAP-1" }
            ]
        }
    });
    assert_eq!(
        parse_paypal_event(&event).unwrap(),
        PaymentAction::Refund {
            tenant_id: tenant,
            invoice_id: invoice,
            amount: 1000,
            payment_external_id: Some("CAP-1".into()),
            external_id: "REF-1".into(),
        }
    );
}

#[test]
fn test_custom_id_format() {
    assert!(parse_custom_id("not-a-pair").is_err());
    assert!(parse_custom_id("abc:def").is_err());
    let (t, i) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(parse_custom_id(&format!("{}:{}", t, i)).unwrap(), (t, i));
}

#[test]
fn test_paypal_sub_cent_amount_is_rejected() {
    let event = json!({
        "id": "WH-3",
        "event_type": "PAYMENT.CAPTURE.COMPLETED",
        "resource": {
            "id": "CAP-2",
            "custom_id": format!("{}:{}", Uuid::new_v4(), Uuid::new_v4()),
            "amount": { "value": "1.005" }
        }
    });
    assert!(matches!(parse_paypal_event(&event), Err(DomainError::Validation(_))));
}
