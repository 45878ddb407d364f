// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::helpers::{data, id_of, spawn_app, TestApp};

fn today() -> String {
    Utc::now().date_naive().to_string()
}

async fn create_renewal(app: &TestApp, account_id: Uuid, extra: Value) -> Value {
    let mut body = json!({
        "account_id": account_id,
        "name": "Support plan",
        "amount": 10_000,
        "term_months": 1,
        "start_date": "2026-01-31",
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let response = app.post("/api/renewals", body).await;
    response.assert_status(StatusCode::CREATED);
    data(&response)
}

async fn invoices_of(app: &TestApp, account_id: Uuid) -> Vec<Value> {
    let response = app
        .get(&format!("/api/invoices?account_id={}", account_id))
        .await;
    response.assert_status_ok();
    data(&response).as_array().unwrap().clone()
}

#[tokio::test]
async fn test_renewal_date_clamps_to_month_end() {
    let app = spawn_app().await;
    let account_id = app.create_account("Vandelay").await;

    let renewal = create_renewal(&app, account_id, json!({})).await;
    assert_eq!(renewal["renewal_date"], "2026-02-28");
    assert_eq!(renewal["status"], "active");

    let leap = create_renewal(&app, account_id, json!({ "renewal_date": "2028-01-31" })).await;
    let response = app
        .post(&format!("/api/renewals/{}/renew", id_of(&leap)), json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["renewal"]["renewal_date"], "2028-02-29");
}

#[tokio::test]
async fn test_renew_posts_to_deferred_revenue() {
    let app = spawn_app().await;
    let account_id = app.create_account("Kramerica").await;
    let renewal = create_renewal(
        &app,
        account_id,
        json!({ "renewal_date": "2099-01-31", "billing_email": "ap@kramerica.test" }),
    )
    .await;
    let renewal_id = id_of(&renewal);

    let response = app
        .post(&format!("/api/renewals/{}/renew", renewal_id), json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body = data(&response);
    assert_eq!(body["renewal"]["renewal_date"], "2099-02-28");
    assert_eq!(body["invoice"]["status"], "open");
    assert_eq!(body["invoice"]["source"], "renewal");
    assert_eq!(body["invoice"]["renewal_id"], renewal["id"]);
    assert_eq!(body["invoice"]["total"], 10_000);

    // 续约收入先计入递延收入
    assert_eq!(app.balance_of("1100").await, 10_000);
    assert_eq!(app.balance_of("2300").await, 10_000);
    assert_eq!(app.balance_of("4000").await, 0);

    let upcoming = data(&app.get("/api/renewals/upcoming?days=30").await);
    assert!(upcoming.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recognize_is_idempotent_per_date() {
    let app = spawn_app().await;
    let account_id = app.create_account("Pendant Publishing").await;
    let renewal_id = id_of(&create_renewal(&app, account_id, json!({})).await);
    app.post(&format!("/api/renewals/{}/renew", renewal_id), json!({}))
        .await
        .assert_status(StatusCode::CREATED);

    let recognize = format!("/api/renewals/{}/recognize", renewal_id);
    let body = json!({ "amount": 2_500, "recognized_on": today() });
    let first = app.post(&recognize, body.clone()).await;
    first.assert_status(StatusCode::CREATED);
    let second = app.post(&recognize, body).await;
    second.assert_status(StatusCode::CREATED);
    assert_eq!(id_of(&data(&first)), id_of(&data(&second)));

    assert_eq!(app.balance_of("2300").await, 7_500);
    assert_eq!(app.balance_of("4200").await, 2_500);

    app.post(&recognize, json!({ "amount": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancelled_renewal_cannot_renew() {
    let app = spawn_app().await;
    let account_id = app.create_account("Monk's Cafe").await;
    let renewal_id = id_of(&create_renewal(&app, account_id, json!({})).await);

    let upcoming = data(&app.get("/api/renewals/upcoming?days=30").await);
    assert_eq!(upcoming.as_array().unwrap().len(), 1);

    let response = app
        .post(&format!("/api/renewals/{}/cancel", renewal_id), json!({}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "cancelled");

    app.post(&format!("/api/renewals/{}/renew", renewal_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post(&format!("/api/renewals/{}/cancel", renewal_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    assert!(invoices_of(&app, account_id).await.is_empty());

    let upcoming = data(&app.get("/api/renewals/upcoming?days=30").await);
    assert!(upcoming.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_renew_reuses_its_draft() {
    let app = spawn_app().await;
    // 先开一张发票，自动创建本月会计期间
    let other = app.create_account("Sidra Holdings").await;
    app.issued_invoice(other).await;

    let account_id = app.create_account("Del Boca Vista").await;
    let renewal_id = id_of(&create_renewal(&app, account_id, json!({})).await);

    let periods = data(&app.get("/api/ledger/periods").await);
    let today = today();
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

    let renew = format!("/api/renewals/{}/renew", renewal_id);
    app.post(&renew, json!({})).await.assert_status(StatusCode::CONFLICT);
    app.post(&renew, json!({})).await.assert_status(StatusCode::CONFLICT);

    let drafts = invoices_of(&app, account_id).await;
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0]["status"], "draft");
    let renewal = data(&app.get(&format!("/api/renewals/{}", renewal_id)).await);
    assert_eq!(renewal["renewal_date"], "2026-02-28");

    app.put(&status, json!({ "status": "open" }))
        .await
        .assert_status_ok();
    let response = app.post(&renew, json!({})).await;
    response.assert_status(StatusCode::CREATED);
    let body = data(&response);
    assert_eq!(body["invoice"]["id"], drafts[0]["id"]);
    assert_eq!(body["invoice"]["status"], "open");
    assert_eq!(body["renewal"]["renewal_date"], "2026-03-28");

    let invoices = invoices_of(&app, account_id).await;
    assert_eq!(invoices.len(), 1);
}

#[tokio::test]
async fn test_time_entry_posts_cost_and_unbilled_revenue() {
    let app = spawn_app().await;
    let account_id = app.create_account("Pennypacker").await;

    let response = app
        .post(
            "/api/time-entries",
            json!({
                "account_id": account_id,
                "work_date": today(),
                "minutes": 90,
                "billable": true,
                "bill_rate": 12_000,
                "cost_rate": 4_000,
                "description": "Migration workshop",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let entry = data(&response);
    assert!(entry["journal_entry_id"].is_string());

    assert_eq!(app.balance_of("5000").await, 6_000);
    assert_eq!(app.balance_of("2100").await, 6_000);
    assert_eq!(app.balance_of("1150").await, 18_000);
    assert_eq!(app.balance_of("4100").await, 18_000);

    // 非计费工时只记成本
    app.post(
        "/api/time-entries",
        json!({
            "account_id": account_id,
            "work_date": today(),
            "minutes": 30,
            "cost_rate": 4_000,
        }),
    )
    .await
    .assert_status(StatusCode::CREATED);
    assert_eq!(app.balance_of("5000").await, 8_000);
    assert_eq!(app.balance_of("4100").await, 18_000);

    app.post(
        "/api/time-entries",
        json!({ "account_id": account_id, "work_date": today(), "minutes": 0, "cost_rate": 1 }),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let listed = data(
        &app.get(&format!("/api/time-entries?account_id={}", account_id))
            .await,
    );
    assert_eq!(listed.as_array().unwrap().len(), 2);
}
