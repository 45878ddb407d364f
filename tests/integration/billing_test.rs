// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use boaz_os::domain::models::invoice::{Payment, PaymentKind};
use boaz_os::domain::models::quote::{QuoteDecision, QuoteStatus};
use boaz_os::domain::repositories::invoice_repository::InvoiceRepository;
use boaz_os::domain::repositories::quote_repository::QuoteRepository;
use boaz_os::domain::repositories::RepositoryError;
use boaz_os::infrastructure::repositories::invoice_repo_impl::InvoiceRepoImpl;
use boaz_os::infrastructure::repositories::quote_repo_impl::QuoteRepoImpl;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::helpers::{data, id_of, spawn_app};

#[tokio::test]
async fn test_invoice_issue_pay_and_refund() {
    let app = spawn_app().await;
    let account_id = app.create_account("Initech").await;

    let invoice = app.issued_invoice(account_id).await;
    let invoice_id = id_of(&invoice);
    assert_eq!(invoice["status"], "open");
    assert_eq!(invoice["subtotal"], 10_000);
    assert_eq!(invoice["tax_total"], 1_000);
    assert_eq!(invoice["total"], 11_000);
    assert!(invoice["number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(app.balance_of("1100").await, 11_000);
    assert_eq!(app.balance_of("4000").await, 10_000);
    assert_eq!(app.balance_of("2200").await, 1_000);

    let payments = format!("/api/invoices/{}/payments", invoice_id);
    let first = json!({
        "amount": 5_000,
        "fee": 300,
        "method": "card",
        "provider": "manual",
        "external_id": "chk-1001",
    });
    let response = app.post(&payments, first.clone()).await;
    response.assert_status(StatusCode::CREATED);
    let recorded = data(&response);
    assert_eq!(recorded["created"], true);
    assert_eq!(recorded["invoice"]["status"], "partially_paid");
    let payment_id = id_of(&recorded["payment"]);

    // 相同渠道ID重复提交返回原记录
    let response = app.post(&payments, first).await;
    response.assert_status_ok();
    let replay = data(&response);
    assert_eq!(replay["created"], false);
    assert_eq!(replay["payment"]["id"], recorded["payment"]["id"]);

    let over = app
        .post(
            &payments,
            json!({ "amount": 7_000, "method": "card", "provider": "manual", "external_id": "chk-1002" }),
        )
        .await;
    over.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &payments,
            json!({ "amount": 6_000, "method": "card", "provider": "manual", "external_id": "chk-1003" }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["invoice"]["status"], "paid");
    assert_eq!(app.balance_of("1100").await, 0);
    assert_eq!(app.balance_of("1000").await, 10_700);
    assert_eq!(app.balance_of("6100").await, 300);

    let response = app
        .post(
            &format!("/api/invoices/{}/refunds", invoice_id),
            json!({
                "amount": 2_000,
                "payment_id": payment_id,
                "provider": "manual",
                "external_id": "rf-1",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["invoice"]["status"], "partially_paid");
    assert_eq!(app.balance_of("4900").await, 2_000);
    assert_eq!(app.balance_of("1000").await, 8_700);

    let too_much = app
        .post(
            &format!("/api/invoices/{}/refunds", invoice_id),
            json!({
                "amount": 3_500,
                "payment_id": payment_id,
                "provider": "manual",
                "external_id": "rf-2",
            }),
        )
        .await;
    too_much.assert_status(StatusCode::BAD_REQUEST);

    let response = app.get(&payments).await;
    response.assert_status_ok();
    assert_eq!(data(&response).as_array().unwrap().len(), 3);

    let view = data(&app.get(&format!("/api/invoices/{}", invoice_id)).await);
    assert_eq!(view["amount_paid"], 11_000);
    assert_eq!(view["amount_refunded"], 2_000);
    assert_eq!(view["balance_due"], 2_000);

    // 收款确认发往账单邮箱
    assert!(!app.emails.sent_to("billing@client.test").is_empty());
}

#[tokio::test]
async fn test_void_reverses_issuance_entry() {
    let app = spawn_app().await;
    let account_id = app.create_account("Umbrella").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);

    let response = app
        .post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "void");
    assert_eq!(app.balance_of("1100").await, 0);
    assert_eq!(app.balance_of("4000").await, 0);

    app.post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post(
        &format!("/api/invoices/{}/payments", invoice_id),
        json!({ "amount": 100, "method": "card", "provider": "manual", "external_id": "late" }),
    )
    .await
    .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_paid_invoice_cannot_be_voided() {
    let app = spawn_app().await;
    let account_id = app.create_account("Hooli").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);

    app.post(
        &format!("/api/invoices/{}/payments", invoice_id),
        json!({ "amount": 11_000, "method": "wire", "provider": "manual", "external_id": "w-1" }),
    )
    .await
    .assert_status(StatusCode::CREATED);
    app.post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stale_void_loses_to_concurrent_payment() {
    let app = spawn_app().await;
    let account_id = app.create_account("Soylent").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);
    let repo = InvoiceRepoImpl::new(app.db.clone());

    // 作废请求读到的是收款前的发票
    let mut stale = repo
        .find_by_id(app.tenant_id, invoice_id)
        .await
        .unwrap()
        .unwrap();
    let expected = stale.version();

    app.post(
        &format!("/api/invoices/{}/payments", invoice_id),
        json!({ "amount": 5_000, "method": "card", "provider": "manual", "external_id": "race-1" }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    stale.void().unwrap();
    let result = repo.update(&stale, expected).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let view = data(&app.get(&format!("/api/invoices/{}", invoice_id)).await);
    assert_eq!(view["status"], "partially_paid");
    assert_eq!(view["amount_paid"], 5_000);
    // 开票凭证未被冲销
    assert_eq!(app.balance_of("4000").await, 10_000);
}

#[tokio::test]
async fn test_stale_payment_is_rejected_after_void() {
    let app = spawn_app().await;
    let account_id = app.create_account("Tyrell").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);
    let repo = InvoiceRepoImpl::new(app.db.clone());

    let mut stale = repo
        .find_by_id(app.tenant_id, invoice_id)
        .await
        .unwrap()
        .unwrap();
    let expected = stale.version();

    app.post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await
        .assert_status_ok();

    stale.apply_payment(2_000).unwrap();
    let payment = Payment {
        id: Uuid::new_v4(),
        tenant_id: app.tenant_id,
        invoice_id,
        kind: PaymentKind::Payment,
        amount: 2_000,
        fee: 0,
        method: "card".to_string(),
        provider: "manual".to_string(),
        external_id: "after-void".to_string(),
        payment_id: None,
        journal_entry_id: None,
        received_at: Utc::now(),
    };
    let result = repo.apply_payment(&stale, expected, &payment).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    // 事务回滚，收款记录未写入
    assert!(repo
        .list_payments(app.tenant_id, invoice_id)
        .await
        .unwrap()
        .is_empty());
    let view = data(&app.get(&format!("/api/invoices/{}", invoice_id)).await);
    assert_eq!(view["status"], "void");
    assert_eq!(view["amount_paid"], 0);
}

#[tokio::test]
async fn test_failed_reversal_keeps_invoice_open() {
    let app = spawn_app().await;
    let account_id = app.create_account("Cyberdyne").await;
    let invoice_id = id_of(&app.issued_invoice(account_id).await);

    let today = Utc::now().date_naive().to_string();
    let periods = data(&app.get("/api/ledger/periods").await);
    let period_id = periods
        .as_array()
        .unwrap()
        .iter()
        .find(|p| {
            p["start_date"].as_str().unwrap() <= today.as_str()
                && p["end_date"].as_str().unwrap() >= today.as_str()
        })
        .map(id_of)
        .expect("current period");
    let status = format!("/api/ledger/periods/{}/status", period_id);
    app.put(&status, json!({ "status": "closed" }))
        .await
        .assert_status_ok();

    app.post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    let view = data(&app.get(&format!("/api/invoices/{}", invoice_id)).await);
    assert_eq!(view["status"], "open");

    app.put(&status, json!({ "status": "open" }))
        .await
        .assert_status_ok();
    let response = app
        .post(&format!("/api/invoices/{}/void", invoice_id), json!({}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "void");
    assert_eq!(app.balance_of("1100").await, 0);
}

#[tokio::test]
async fn test_quote_with_bundle_and_discount_converts_once() {
    let app = spawn_app().await;
    let account_id = app.create_account("Stark Industries").await;

    let mut product_ids = Vec::new();
    for (sku, price) in [("AUDIT", 10_000), ("TRAIN", 5_000)] {
        let response = app
            .post(
                "/api/products",
                json!({ "sku": sku, "name": sku.to_lowercase(), "unit_price": price }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        product_ids.push(id_of(&data(&response)));
    }
    app.post(
        "/api/products",
        json!({ "sku": "AUDIT", "name": "duplicate", "unit_price": 1 }),
    )
    .await
    .assert_status(StatusCode::CONFLICT);

    let response = app
        .post(
            "/api/bundles",
            json!({
                "name": "Starter",
                "price": 12_000,
                "items": [
                    { "product_id": product_ids[0], "quantity": 1 },
                    { "product_id": product_ids[1], "quantity": 1 }
                ]
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let bundle_id = id_of(&data(&response));

    let lines = data(&app.get(&format!("/api/bundles/{}/lines", bundle_id)).await);
    let allocated: i64 = lines
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["unit_price"].as_i64().unwrap())
        .sum();
    assert_eq!(allocated, 12_000);

    app.post(
        "/api/discounts",
        json!({ "code": "launch10", "kind": "percent", "value": 1_000 }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let response = app
        .post(
            "/api/quotes",
            json!({
                "account_id": account_id,
                "bundle_ids": [bundle_id],
                "discount_code": "LAUNCH10",
                "valid_until": "2099-12-31",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let quote = data(&response);
    let quote_id = id_of(&quote);
    assert_eq!(quote["status"], "draft");
    assert_eq!(quote["subtotal"], 12_000);
    assert_eq!(quote["discount_total"], 1_200);
    assert_eq!(quote["total"], 10_800);

    app.post(&format!("/api/quotes/{}/accept", quote_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post(&format!("/api/quotes/{}/send", quote_id), json!({}))
        .await
        .assert_status_ok();
    let response = app
        .post(&format!("/api/quotes/{}/accept", quote_id), json!({}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "accepted");

    let response = app
        .post(&format!("/api/quotes/{}/convert", quote_id), json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let invoice = data(&response);
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["source"], "quote");
    assert_eq!(invoice["total"], 10_800);
    assert_eq!(invoice["quote_id"], quote["id"]);

    app.post(&format!("/api/quotes/{}/convert", quote_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_account_history_records_billing_events() {
    let app = spawn_app().await;
    let account_id = app.create_account("Wayne Enterprises").await;
    app.issued_invoice(account_id).await;

    let response = app
        .get(&format!("/api/accounts/{}/history", account_id))
        .await;
    response.assert_status_ok();
    let kinds: Vec<String> = data(&response)
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(kinds.iter().any(|k| k == "invoice.issued"), "history: {:?}", kinds);
}

#[tokio::test]
async fn test_stale_quote_decision_does_not_overwrite() {
    let app = spawn_app().await;
    let account_id = app.create_account("Wayne Enterprises").await;
    let response = app
        .post(
            "/api/quotes",
            json!({
                "account_id": account_id,
                "lines": [{ "description": "Audit", "quantity": 1, "unit_price": 20_000 }],
                "valid_until": "2099-12-31",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let quote_id = id_of(&data(&response));
    app.post(&format!("/api/quotes/{}/send", quote_id), json!({}))
        .await
        .assert_status_ok();

    let repo = QuoteRepoImpl::new(app.db.clone());
    let mut stale = repo.find_by_id(app.tenant_id, quote_id).await.unwrap().unwrap();
    assert_eq!(stale.status, QuoteStatus::Sent);

    app.post(&format!("/api/quotes/{}/accept", quote_id), json!({}))
        .await
        .assert_status_ok();

    stale
        .decide(QuoteDecision::Decline, Utc::now().date_naive())
        .unwrap();
    let result = repo.update(&stale, QuoteStatus::Sent).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let quote = data(&app.get(&format!("/api/quotes/{}", quote_id)).await);
    assert_eq!(quote["status"], "accepted");

    // 已关联发票的报价不能被改写为关联另一张发票
    let response = app
        .post(&format!("/api/quotes/{}/convert", quote_id), json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let mut accepted = repo.find_by_id(app.tenant_id, quote_id).await.unwrap().unwrap();
    let linked = accepted.invoice_id;
    accepted.invoice_id = Some(Uuid::new_v4());
    let result = repo.update(&accepted, QuoteStatus::Accepted).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    let reloaded = repo.find_by_id(app.tenant_id, quote_id).await.unwrap().unwrap();
    assert_eq!(reloaded.invoice_id, linked);
}
