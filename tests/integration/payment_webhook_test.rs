// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestResponse;
use boaz_os::domain::services::email_service::ProviderError;
use boaz_os::domain::services::payment_webhook_service::{PaypalHeaders, PaypalVerifier};
use boaz_os::utils::tokens::hmac_sha256_hex;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::helpers::{data, id_of, spawn_app, spawn_app_with_paypal, TestApp, STRIPE_SECRET};

fn stripe_signature(body: &str, timestamp: i64, secret: &str) -> String {
    let signed = format!("{}.{}", timestamp, body);
    format!(
        "t={},v1={}",
        timestamp,
        hmac_sha256_hex(secret.as_bytes(), signed.as_bytes())
    )
}

async fn send_stripe(app: &TestApp, event: &Value) -> TestResponse {
    let body = event.to_string();
    let signature = stripe_signature(&body, Utc::now().timestamp(), STRIPE_SECRET);
    app.server
        .post("/webhooks/stripe")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&signature).unwrap(),
        )
        .bytes(body.into())
        .await
}

fn payment_intent_event(event_id: &str, app: &TestApp, invoice_id: Uuid, amount: i64) -> Value {
    json!({
        "id": event_id,
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": "pi_123",
                "object": "payment_intent",
                "amount_received": amount,
                "payment_method_types": ["card"],
                "metadata": {
                    "tenant_id": app.tenant_id.to_string(),
                    "invoice_id": invoice_id.to_string()
                }
            }
        }
    })
}

async fn invoice_view(app: &TestApp, invoice_id: Uuid) -> Value {
    data(&app.get(&format!("/api/invoices/{}", invoice_id)).await)
}

#[tokio::test]
async fn test_stripe_payment_is_applied_once() {
    let app = spawn_app().await;
    let account_id = app.create_account("Acme Rockets").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);

    let event = payment_intent_event("evt_1", &app, invoice_id, 11_000);
    let response = send_stripe(&app, &event).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["outcome"], "processed");
    assert_eq!(invoice_view(&app, invoice_id).await["status"], "paid");

    let response = send_stripe(&app, &event).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["outcome"], "duplicate");

    // checkout 事件与 payment intent 共用同一个 pi ID
    let checkout = json!({
        "id": "evt_2",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_123",
                "payment_intent": "pi_123",
                "amount_total": 11_000,
                "metadata": {
                    "tenant_id": app.tenant_id.to_string(),
                    "invoice_id": invoice_id.to_string()
                }
            }
        }
    });
    send_stripe(&app, &checkout).await.assert_status_ok();

    let payments = data(&app.get(&format!("/api/invoices/{}/payments", invoice_id)).await);
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["provider"], "stripe");
    assert_eq!(app.balance_of("1000").await, 11_000);
}

#[tokio::test]
async fn test_stripe_cumulative_refunds() {
    let app = spawn_app().await;
    let account_id = app.create_account("Cyberdyne").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);
    send_stripe(&app, &payment_intent_event("evt_pay", &app, invoice_id, 11_000))
        .await
        .assert_status_ok();

    let refund = |event_id: &str, cumulative: i64| {
        json!({
            "id": event_id,
            "type": "charge.refunded",
            "data": {
                "object": {
                    "id": "ch_1",
                    "payment_intent": "pi_123",
                    "amount_refunded": cumulative,
                    "metadata": {
                        "tenant_id": app.tenant_id.to_string(),
                        "invoice_id": invoice_id.to_string()
                    }
                }
            }
        })
    };

    send_stripe(&app, &refund("evt_r1", 3_000)).await.assert_status_ok();
    send_stripe(&app, &refund("evt_r2", 5_000)).await.assert_status_ok();
    // 累计金额未变化的事件不再记账
    send_stripe(&app, &refund("evt_r3", 5_000)).await.assert_status_ok();

    let invoice = invoice_view(&app, invoice_id).await;
    assert_eq!(invoice["amount_refunded"], 5_000);
    assert_eq!(invoice["status"], "partially_paid");
    assert_eq!(app.balance_of("4900").await, 5_000);
}

#[tokio::test]
async fn test_stripe_signature_is_required() {
    let app = spawn_app().await;
    let body = json!({ "id": "evt_x", "type": "payment_intent.succeeded" }).to_string();

    app.server
        .post("/webhooks/stripe")
        .bytes(body.clone().into())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let forged = stripe_signature(&body, Utc::now().timestamp(), "whsec_wrong");
    app.server
        .post("/webhooks/stripe")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&forged).unwrap(),
        )
        .bytes(body.clone().into())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let stale = stripe_signature(&body, Utc::now().timestamp() - 3_600, STRIPE_SECRET);
    app.server
        .post("/webhooks/stripe")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&stale).unwrap(),
        )
        .bytes(body.into())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_event_is_retried_on_redelivery() {
    let app = spawn_app().await;
    let account_id = app.create_account("Soylent").await;

    let response = app
        .post(
            "/api/invoices",
            json!({
                "account_id": account_id,
                "due_date": "2030-06-30",
                "lines": [{ "description": "Retainer", "quantity": 1, "unit_price": 4_000 }],
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let invoice_id = id_of(&data(&response));

    // 草稿发票不能收款
    let event = payment_intent_event("evt_retry", &app, invoice_id, 4_000);
    send_stripe(&app, &event).await.assert_status(StatusCode::CONFLICT);

    app.post(&format!("/api/invoices/{}/issue", invoice_id), json!({}))
        .await
        .assert_status_ok();
    let response = send_stripe(&app, &event).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["outcome"], "processed");
    assert_eq!(invoice_view(&app, invoice_id).await["status"], "paid");
}

#[tokio::test]
async fn test_unhandled_stripe_event_is_ignored() {
    let app = spawn_app().await;
    let event = json!({ "id": "evt_customer", "type": "customer.created", "data": { "object": {} } });
    let response = send_stripe(&app, &event).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["outcome"], "ignored");
}

/// 只接受签名为 "valid" 的回调
struct StubPaypalVerifier;

#[async_trait]
impl PaypalVerifier for StubPaypalVerifier {
    async fn verify(&self, headers: &PaypalHeaders, _event: &Value) -> Result<bool, ProviderError> {
        Ok(headers.transmission_sig == "valid")
    }
}

async fn send_paypal(app: &TestApp, event: &Value, signature: &'static str) -> TestResponse {
    app.server
        .post("/webhooks/paypal")
        .add_header(
            HeaderName::from_static("paypal-transmission-sig"),
            HeaderValue::from_static(signature),
        )
        .add_header(
            HeaderName::from_static("paypal-transmission-id"),
            HeaderValue::from_static("tx-1"),
        )
        .bytes(event.to_string().into())
        .await
}

#[tokio::test]
async fn test_paypal_capture_and_refund() {
    let app = spawn_app_with_paypal(Some(Arc::new(StubPaypalVerifier))).await;
    let account_id = app.create_account("Tyrell").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);
    let custom_id = format!("{}:{}", app.tenant_id, invoice_id);

    let capture = json!({
        "id": "WH-1",
        "event_type": "PAYMENT.CAPTURE.COMPLETED",
        "resource": {
            "id": "CAP-1",
            "custom_id": custom_id,
            "amount": { "currency_code": "USD", "value": "110.00" },
            "seller_receivable_breakdown": { "paypal_fee": { "value": "3.49" } }
        }
    });
    send_paypal(&app, &capture, "forged")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = send_paypal(&app, &capture, "valid").await;
    response.assert_status_ok();
    assert_eq!(data(&response)["outcome"], "processed");
    assert_eq!(app.balance_of("6100").await, 349);
    assert_eq!(app.balance_of("1000").await, 10_651);

    let refund = json!({
        "id": "WH-2",
        "event_type": "PAYMENT.CAPTURE.REFUNDED",
        "resource": {
            "id": "REF-1",
            "custom_id": custom_id,
            "amount": { "value": "110.00" },
            "links": [
                { "rel": "self", "href": "https://api.paypal.com/v2/payments/refunds/REF-1" },
                { "rel": "up", "href": "https://api.paypal.com/v2/payments/captures/CAP-1" }
            ]
        }
    });
    send_paypal(&app, &refund, "valid").await.assert_status_ok();

    let invoice = invoice_view(&app, invoice_id).await;
    assert_eq!(invoice["status"], "refunded");
    let payments = data(&app.get(&format!("/api/invoices/{}/payments", invoice_id)).await);
    let refund_row = payments
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["kind"] == "refund")
        .cloned()
        .unwrap();
    assert!(!refund_row["payment_id"].is_null());
}

#[tokio::test]
async fn test_paypal_rejected_when_not_configured() {
    let app = spawn_app().await;
    let event = json!({ "id": "WH-9", "event_type": "PAYMENT.CAPTURE.COMPLETED", "resource": {} });
    send_paypal(&app, &event, "valid")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
