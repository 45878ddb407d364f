// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};

use super::helpers::{data, id_of, spawn_app, TestApp};

fn today() -> String {
    Utc::now().date_naive().to_string()
}

async fn post_rent(app: &TestApp, date: &str, amount: i64) -> axum_test::TestResponse {
    app.post(
        "/api/ledger/entries",
        json!({
            "entry_date": date,
            "memo": "Office rent",
            "lines": [
                { "account_code": "5000", "debit": amount },
                { "account_code": "1000", "credit": amount }
            ]
        }),
    )
    .await
}

#[tokio::test]
async fn test_seeded_chart_of_accounts() {
    let app = spawn_app().await;
    let response = app.get("/api/ledger/accounts").await;
    response.assert_status_ok();
    let codes: Vec<String> = data(&response)
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["code"].as_str().unwrap().to_string())
        .collect();
    for code in ["1000", "1100", "2200", "2300", "4000", "4900", "6100"] {
        assert!(codes.contains(&code.to_string()), "missing account {}", code);
    }
}

#[tokio::test]
async fn test_manual_entry_updates_trial_balance() {
    let app = spawn_app().await;

    let response = post_rent(&app, &today(), 120_000).await;
    response.assert_status(StatusCode::CREATED);
    let entry = data(&response);
    assert!(entry["number"].as_str().unwrap().starts_with("JE-"));
    assert_eq!(entry["total"], 120_000);
    assert_eq!(entry["lines"].as_array().unwrap().len(), 2);

    let response = app.get("/api/ledger/reports/trial-balance").await;
    response.assert_status_ok();
    let report = data(&response);
    assert_eq!(report["total_debits"], report["total_credits"]);
    assert_eq!(app.balance_of("5000").await, 120_000);
    assert_eq!(app.balance_of("1000").await, -120_000);
}

#[tokio::test]
async fn test_rejects_invalid_entries() {
    let app = spawn_app().await;

    let unbalanced = app
        .post(
            "/api/ledger/entries",
            json!({
                "entry_date": today(),
                "memo": "Broken",
                "lines": [
                    { "account_code": "5000", "debit": 100 },
                    { "account_code": "1000", "credit": 90 }
                ]
            }),
        )
        .await;
    unbalanced.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_account = app
        .post(
            "/api/ledger/entries",
            json!({
                "entry_date": today(),
                "memo": "Unknown",
                "lines": [
                    { "account_code": "9999", "debit": 100 },
                    { "account_code": "1000", "credit": 100 }
                ]
            }),
        )
        .await;
    unknown_account.assert_status(StatusCode::BAD_REQUEST);

    let both_sides = app
        .post(
            "/api/ledger/entries",
            json!({
                "entry_date": today(),
                "memo": "Both sides",
                "lines": [
                    { "account_code": "5000", "debit": 100, "credit": 100 },
                    { "account_code": "1000", "credit": 0, "debit": 0 }
                ]
            }),
        )
        .await;
    assert!(both_sides.status_code().is_client_error());

    let entries = app.get("/api/ledger/entries").await;
    assert_eq!(data(&entries).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_closed_period_blocks_posting() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/ledger/periods",
            json!({ "name": "2020-01", "start_date": "2020-01-01", "end_date": "2020-01-31" }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let period_id = id_of(&data(&response));

    let overlapping = app
        .post(
            "/api/ledger/periods",
            json!({ "name": "Jan half", "start_date": "2020-01-10", "end_date": "2020-01-20" }),
        )
        .await;
    overlapping.assert_status(StatusCode::CONFLICT);

    app.put(
        &format!("/api/ledger/periods/{}/status", period_id),
        json!({ "status": "closed" }),
    )
    .await
    .assert_status_ok();
    post_rent(&app, "2020-01-15", 500).await.assert_status(StatusCode::CONFLICT);

    // 重新开放后可以过账
    app.put(
        &format!("/api/ledger/periods/{}/status", period_id),
        json!({ "status": "open" }),
    )
    .await
    .assert_status_ok();
    post_rent(&app, "2020-01-15", 500).await.assert_status(StatusCode::CREATED);

    app.put(
        &format!("/api/ledger/periods/{}/status", period_id),
        json!({ "status": "locked" }),
    )
    .await
    .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reversal_offsets_original_once() {
    let app = spawn_app().await;
    let entry = data(&post_rent(&app, &today(), 7_500).await);
    let entry_id = id_of(&entry);

    let response = app
        .post(&format!("/api/ledger/entries/{}/reverse", entry_id), json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let reversal: Value = data(&response);
    assert_eq!(reversal["reversal_of"], entry["id"]);
    assert_eq!(app.balance_of("5000").await, 0);
    assert_eq!(app.balance_of("1000").await, 0);

    let original = data(&app.get(&format!("/api/ledger/entries/{}", entry_id)).await);
    assert_eq!(original["reversed_by"], reversal["id"]);

    app.post(&format!("/api/ledger/entries/{}/reverse", entry_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post(
        &format!("/api/ledger/entries/{}/reverse", id_of(&reversal)),
        json!({}),
    )
    .await
    .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_account_activity_and_inactive_accounts() {
    let app = spawn_app().await;
    post_rent(&app, &today(), 1_000).await.assert_status(StatusCode::CREATED);
    post_rent(&app, &today(), 2_000).await.assert_status(StatusCode::CREATED);

    let response = app.get("/api/ledger/accounts/5000/activity").await;
    response.assert_status_ok();
    let activity = data(&response);
    assert_eq!(activity["debit_total"], 3_000);
    assert_eq!(activity["balance"], 3_000);
    assert_eq!(activity["lines"].as_array().unwrap().len(), 2);

    app.put("/api/ledger/accounts/5000/active", json!({ "active": false }))
        .await
        .assert_status_ok();
    post_rent(&app, &today(), 1_000).await.assert_status(StatusCode::BAD_REQUEST);
}
