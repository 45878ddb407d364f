// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use super::helpers::{data, id_of, spawn_app, TestApp};

const PORTAL_PASSWORD: &str = "portal-password-1";

/// 为客户创建门户账号并登录
async fn portal_login(app: &TestApp, account_id: Uuid, email: &str) -> String {
    app.post(
        "/api/portal-users",
        json!({ "account_id": account_id, "email": email, "password": PORTAL_PASSWORD }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/portal/auth/login")
        .json(&json!({ "tenant_id": app.tenant_id, "email": email, "password": PORTAL_PASSWORD }))
        .await;
    response.assert_status_ok();
    data(&response)["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_portal_tokens_and_staff_tokens_do_not_mix() {
    let app = spawn_app().await;
    let account_id = app.create_account("Portal Co").await;
    let portal = portal_login(&app, account_id, "client@portal.test").await;

    let response = app.server.get("/portal/me").authorization_bearer(&portal).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["account_id"], account_id.to_string());

    app.server
        .get("/api/accounts")
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/portal/invoices")
        .authorization_bearer(&app.token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // 门户登录不接受员工账号
    app.server
        .post("/portal/auth/login")
        .json(&json!({
            "tenant_id": app.tenant_id,
            "email": super::helpers::ADMIN_EMAIL,
            "password": super::helpers::ADMIN_PASSWORD,
        }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_portal_sees_only_own_invoices() {
    let app = spawn_app().await;
    let mine = app.create_account("Mine Ltd").await;
    let theirs = app.create_account("Theirs Ltd").await;
    let my_invoice = id_of(&app.issued_invoice(mine).await);
    let their_invoice = id_of(&app.issued_invoice(theirs).await);

    // 草稿发票不在门户中显示
    app.post(
        "/api/invoices",
        json!({
            "account_id": mine,
            "due_date": "2030-03-31",
            "lines": [{ "description": "Draft work", "quantity": 1, "unit_price": 100 }],
        }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let portal = portal_login(&app, mine, "ap@mine.test").await;
    let response = app.server.get("/portal/invoices").authorization_bearer(&portal).await;
    response.assert_status_ok();
    let invoices = data(&response);
    assert_eq!(invoices.as_array().unwrap().len(), 1);
    assert_eq!(invoices[0]["id"], my_invoice.to_string());
    assert_eq!(invoices[0]["balance_due"], 11_000);

    app.server
        .get(&format!("/portal/invoices/{}", my_invoice))
        .authorization_bearer(&portal)
        .await
        .assert_status_ok();
    app.server
        .get(&format!("/portal/invoices/{}", their_invoice))
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_portal_quote_decisions() {
    let app = spawn_app().await;
    let account_id = app.create_account("Decider Inc").await;
    let portal = portal_login(&app, account_id, "buyer@decider.test").await;

    let mut quote_ids = Vec::new();
    for _ in 0..2 {
        let response = app
            .post(
                "/api/quotes",
                json!({
                    "account_id": account_id,
                    "lines": [{ "description": "Implementation", "quantity": 1, "unit_price": 90_000 }],
                    "valid_until": "2099-01-01",
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        quote_ids.push(id_of(&data(&response)));
    }

    // 未发送的报价对门户不可见
    app.server
        .post(&format!("/portal/quotes/{}/accept", quote_ids[0]))
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    for id in &quote_ids {
        app.post(&format!("/api/quotes/{}/send", id), json!({}))
            .await
            .assert_status_ok();
    }
    let response = app
        .server
        .post(&format!("/portal/quotes/{}/accept", quote_ids[0]))
        .authorization_bearer(&portal)
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "accepted");

    let response = app
        .server
        .post(&format!("/portal/quotes/{}/decline", quote_ids[1]))
        .authorization_bearer(&portal)
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "declined");

    app.server
        .post(&format!("/portal/quotes/{}/accept", quote_ids[1]))
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_portal_tickets_hide_internal_comments() {
    let app = spawn_app().await;
    let account_id = app.create_account("Helpdesk Client").await;
    let other_account = app.create_account("Someone Else").await;
    let portal = portal_login(&app, account_id, "user@helpdesk.test").await;

    let response = app
        .server
        .post("/portal/tickets")
        .authorization_bearer(&portal)
        .json(&json!({ "subject": "Cannot log in", "description": "Password reset loops", "priority": "high" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let ticket = data(&response);
    let ticket_id = id_of(&ticket);
    assert_eq!(ticket["status"], "new");
    assert_eq!(ticket["channel"], "portal");
    assert_eq!(ticket["contact_email"], "user@helpdesk.test");
    assert_eq!(ticket["account_id"], account_id.to_string());

    let comments = format!("/api/tickets/{}/comments", ticket_id);
    app.post(&comments, json!({ "body": "Check SSO config", "internal": true }))
        .await
        .assert_status(StatusCode::CREATED);
    app.post(&comments, json!({ "body": "We are looking into it" }))
        .await
        .assert_status(StatusCode::CREATED);

    let staff_view = data(&app.get(&format!("/api/tickets/{}", ticket_id)).await);
    assert_eq!(staff_view["status"], "open");
    assert!(!staff_view["first_response_at"].is_null());

    let response = app
        .server
        .get(&format!("/portal/tickets/{}/comments", ticket_id))
        .authorization_bearer(&portal)
        .await;
    response.assert_status_ok();
    let visible = data(&response);
    assert_eq!(visible.as_array().unwrap().len(), 1);
    assert_eq!(visible[0]["body"], "We are looking into it");

    app.server
        .post(&format!("/portal/tickets/{}/comments", ticket_id))
        .authorization_bearer(&portal)
        .json(&json!({ "body": "Thanks!", "internal": true }))
        .await
        .assert_status(StatusCode::CREATED);
    let all = data(&app.get(&comments).await);
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[2]["internal"], false);

    // 其他客户的工单
    let response = app
        .post(
            "/api/tickets",
            json!({
                "account_id": other_account,
                "contact_email": "x@else.test",
                "subject": "Invoice question",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let foreign = id_of(&data(&response));
    app.server
        .get(&format!("/portal/tickets/{}", foreign))
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/portal/tickets/{}/comments", foreign))
        .authorization_bearer(&portal)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get("/portal/tickets").authorization_bearer(&portal).await;
    assert_eq!(data(&response).as_array().unwrap().len(), 1);
}
