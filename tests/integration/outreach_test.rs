// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use boaz_os::domain::services::email_service::OutgoingEmail;
use boaz_os::utils::tokens::hmac_sha256_hex;
use boaz_os::workers::OutreachWorker;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use super::helpers::{data, id_of, spawn_app, TestApp, MAILGUN_SIGNING_KEY, SENDGRID_TOKEN};

static OPEN_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"/t/o/([A-Za-z0-9_\-.]+)").unwrap());
static CLICK_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"/t/c/([A-Za-z0-9_\-.]+)").unwrap());
static UNSUBSCRIBE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/unsubscribe/([A-Za-z0-9_\-.]+)").unwrap());

fn link(pattern: &Regex, email: &OutgoingEmail) -> String {
    pattern
        .captures(&email.html)
        .map(|c| c[0].to_string())
        .unwrap_or_else(|| panic!("no link matching {} in {}", pattern.as_str(), email.html))
}

async fn create_campaign(app: &TestApp, name: &str) -> Uuid {
    let response = app
        .post(
            "/api/campaigns",
            json!({
                "name": name,
                "subject": "Hello {{first_name}}",
                "html_body": "<html><body><p>Hi {{first_name}} at {{company}},</p>\
                    <a href=\"https://boaz.test/pricing\">See pricing</a></body></html>",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["status"], "draft");
    id_of(&data(&response))
}

#[tokio::test]
async fn test_campaign_tracking_and_unsubscribe() {
    let app = spawn_app().await;
    let account = app.create_account("Globex").await;
    app.create_contact(account, "Ann", "ann@globex.test").await;
    app.create_contact(account, "Bob", "bob@globex.test").await;

    let campaign = create_campaign(&app, "Spring launch").await;
    let response = app
        .post(&format!("/api/campaigns/{}/send", campaign), json!({}))
        .await;
    response.assert_status_ok();
    let report = data(&response);
    assert_eq!(report["sent"], 2);
    assert_eq!(report["suppressed"], 0);

    // 活动只能发送一次
    app.post(&format!("/api/campaigns/{}/send", campaign), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);

    let ann = app.emails.sent_to("ann@globex.test");
    assert_eq!(ann.len(), 1);
    let ann = &ann[0];
    assert_eq!(ann.subject, "Hello Ann");
    assert!(ann.html.contains("Hi Ann at Globex"));
    assert!(!ann.html.contains("https://boaz.test/pricing\""));

    let response = app.server.get(&link(&OPEN_LINK, ann)).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/gif");
    // 无效令牌仍返回像素
    app.server.get("/t/o/not-a-token").await.assert_status_ok();

    let response = app.server.get(&link(&CLICK_LINK, ann)).await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "https://boaz.test/pricing");
    app.server
        .get("/t/c/forged.deadbeef")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get(&link(&UNSUBSCRIBE_LINK, ann)).await;
    response.assert_status_ok();
    assert!(response.text().contains("ann@globex.test"));

    let stats = data(&app.get(&format!("/api/campaigns/{}/stats", campaign)).await);
    assert_eq!(stats["sent"], 2);
    assert_eq!(stats["opened"], 1);
    assert_eq!(stats["clicked"], 1);
    assert_eq!(stats["unsubscribed"], 1);

    // 退订后的地址在下一次活动中被跳过
    let second = create_campaign(&app, "Summer promo").await;
    let report = data(&app.post(&format!("/api/campaigns/{}/send", second), json!({})).await);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["suppressed"], 1);
    assert_eq!(app.emails.sent_to("ann@globex.test").len(), 1);
    assert_eq!(app.emails.sent_to("bob@globex.test").len(), 2);
}

#[tokio::test]
async fn test_provider_event_webhooks() {
    let app = spawn_app().await;
    let account = app.create_account("Initech").await;
    app.create_contact(account, "Peter", "peter@initech.test").await;
    app.create_contact(account, "Milton", "milton@initech.test").await;
    let campaign = create_campaign(&app, "Quarterly update").await;
    app.post(&format!("/api/campaigns/{}/send", campaign), json!({}))
        .await
        .assert_status_ok();

    let peter = &app.emails.sent_to("peter@initech.test")[0];
    let milton = &app.emails.sent_to("milton@initech.test")[0];

    let events = json!([
        {
            "event": "delivered",
            "email": "peter@initech.test",
            "tenant_id": peter.metadata["tenant_id"],
            "message_id": peter.metadata["message_id"],
        },
        { "event": "processed", "email": "peter@initech.test" }
    ]);
    app.server
        .post("/webhooks/sendgrid?token=wrong")
        .json(&events)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let response = app
        .server
        .post(&format!("/webhooks/sendgrid?token={}", SENDGRID_TOKEN))
        .json(&events)
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["applied"], 1);

    let timestamp = Utc::now().timestamp().to_string();
    let token = "5d0a7c3e9b";
    let signature = hmac_sha256_hex(
        MAILGUN_SIGNING_KEY.as_bytes(),
        format!("{}{}", timestamp, token).as_bytes(),
    );
    let bounce = |signature: &str| {
        json!({
            "signature": { "timestamp": timestamp, "token": token, "signature": signature },
            "event-data": {
                "event": "failed",
                "severity": "permanent",
                "recipient": "milton@initech.test",
                "user-variables": {
                    "tenant_id": milton.metadata["tenant_id"],
                    "message_id": milton.metadata["message_id"],
                },
            },
        })
    };
    app.server
        .post("/webhooks/mailgun")
        .json(&bounce("00ff"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let response = app.server.post("/webhooks/mailgun").json(&bounce(&signature)).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["applied"], 1);

    let stats = data(&app.get(&format!("/api/campaigns/{}/stats", campaign)).await);
    assert_eq!(stats["delivered"], 1);
    assert_eq!(stats["bounced"], 1);
    assert_eq!(stats["unsubscribed"], 0);
}

#[tokio::test]
async fn test_sequence_steps_are_sent_by_worker() {
    let app = spawn_app().await;
    let account = app.create_account("Hooli").await;
    let gavin = app.create_contact(account, "Gavin", "gavin@hooli.test").await;
    let jared = app.create_contact(account, "Jared", "jared@hooli.test").await;

    let response = app
        .post(
            "/api/outreach/templates",
            json!({
                "name": "Intro",
                "subject": "Quick question, {{first_name}}",
                "html_body": "<p>Does {{company}} need help?</p>",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let template = id_of(&data(&response));

    // 短信步骤缺少正文
    app.post(
        "/api/outreach/sequences",
        json!({ "name": "Broken", "steps": [{ "channel": "sms", "delay_days": 0 }] }),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/outreach/sequences",
            json!({
                "name": "Cold outreach",
                "steps": [
                    { "channel": "email", "delay_days": 0, "template_id": template },
                    { "channel": "email", "delay_days": 3, "template_id": template },
                ],
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let sequence = id_of(&data(&response));

    let enrollments = format!("/api/outreach/sequences/{}/enrollments", sequence);
    let response = app.post(&enrollments, json!({ "contact_id": gavin })).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["status"], "active");
    app.post(&enrollments, json!({ "contact_id": gavin }))
        .await
        .assert_status(StatusCode::CONFLICT);
    let response = app.post(&enrollments, json!({ "contact_id": jared })).await;
    let jared_enrollment = id_of(&data(&response));

    let worker = OutreachWorker::new(app.state.outreach.clone(), &app.state.settings.outreach);
    let report = worker.tick().await.unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.completed, 0);
    let first = &app.emails.sent_to("gavin@hooli.test")[0];
    assert_eq!(first.subject, "Quick question, Gavin");
    assert!(first.html.contains("Does Hooli need help?"));

    // 第二步尚未到期
    assert_eq!(worker.tick().await.unwrap().sent, 0);

    app.post(&format!("/api/outreach/enrollments/{}/cancel", jared_enrollment), json!({}))
        .await
        .assert_status_ok();

    let later = Utc::now() + Duration::days(4);
    let report = app.state.outreach.process_due(later, 50).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(app.emails.sent_to("gavin@hooli.test").len(), 2);
    assert_eq!(app.emails.sent_to("jared@hooli.test").len(), 1);

    let list = data(&app.get(&enrollments).await);
    let status_of = |contact: Uuid| {
        list.as_array()
            .unwrap()
            .iter()
            .find(|e| e["contact_id"] == contact.to_string())
            .map(|e| e["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of(gavin), "completed");
    assert_eq!(status_of(jared), "cancelled");
}

#[tokio::test]
async fn test_unsubscribed_contact_stops_sequence() {
    let app = spawn_app().await;
    let account = app.create_account("Pied Piper").await;
    let richard = app.create_contact(account, "Richard", "richard@piper.test").await;

    let template = id_of(&data(
        &app.post(
            "/api/outreach/templates",
            json!({ "name": "Nudge", "subject": "Hi", "html_body": "<p>Ping</p>" }),
        )
        .await,
    ));
    let sequence = id_of(&data(
        &app.post(
            "/api/outreach/sequences",
            json!({
                "name": "Nurture",
                "steps": [
                    { "channel": "email", "delay_days": 0, "template_id": template },
                    { "channel": "email", "delay_days": 1, "template_id": template },
                ],
            }),
        )
        .await,
    ));
    app.post(
        &format!("/api/outreach/sequences/{}/enrollments", sequence),
        json!({ "contact_id": richard }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    app.state.outreach.process_due(Utc::now(), 10).await.unwrap();
    let sent = &app.emails.sent_to("richard@piper.test")[0];
    app.server
        .get(&link(&UNSUBSCRIBE_LINK, sent))
        .await
        .assert_status_ok();

    let report = app
        .state
        .outreach
        .process_due(Utc::now() + Duration::days(2), 10)
        .await
        .unwrap();
    assert_eq!(report.stopped, 1);
    assert_eq!(app.emails.sent_to("richard@piper.test").len(), 1);
}

#[tokio::test]
async fn test_failing_recipients_do_not_block_the_queue() {
    let app = spawn_app().await;
    let account = app.create_account("Aviato").await;
    let mut bounced = Vec::new();
    for i in 0..3 {
        let email = format!("gone{}@aviato.test", i);
        app.emails.reject(&email);
        bounced.push(app.create_contact(account, "Gone", &email).await);
    }
    let erlich = app.create_contact(account, "Erlich", "erlich@aviato.test").await;

    let template = id_of(&data(
        &app.post(
            "/api/outreach/templates",
            json!({ "name": "Pitch", "subject": "Hi {{first_name}}", "html_body": "<p>Pitch</p>" }),
        )
        .await,
    ));
    let sequence = id_of(&data(
        &app.post(
            "/api/outreach/sequences",
            json!({
                "name": "Launch",
                "steps": [{ "channel": "email", "delay_days": 0, "template_id": template }],
            }),
        )
        .await,
    ));
    let enrollments = format!("/api/outreach/sequences/{}/enrollments", sequence);
    for contact in bounced.iter().chain(std::iter::once(&erlich)) {
        app.post(&enrollments, json!({ "contact_id": contact }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    // 批次小于失败入组数，失败的入组推迟后不再占用后续批次
    let now = Utc::now();
    let first = app.state.outreach.process_due(now, 2).await.unwrap();
    assert_eq!(first.failed, 2);
    let second = app.state.outreach.process_due(now, 2).await.unwrap();
    assert_eq!(second.failed, 1);
    assert_eq!(second.sent, 1);
    assert_eq!(app.emails.sent_to("erlich@aviato.test").len(), 1);
    assert_eq!(app.state.outreach.process_due(now, 2).await.unwrap(), Default::default());

    let list = data(&app.get(&enrollments).await);
    for enrollment in list.as_array().unwrap() {
        if enrollment["contact_id"] == erlich.to_string() {
            assert_eq!(enrollment["status"], "completed");
            continue;
        }
        assert_eq!(enrollment["status"], "active");
        assert!(enrollment["last_error"].as_str().unwrap().contains("550"));
        let next: chrono::DateTime<Utc> =
            serde_json::from_value(enrollment["next_send_at"].clone()).unwrap();
        assert!(next > now);
    }

    // 重试间隔之后再次尝试
    let retry = app
        .state
        .outreach
        .process_due(now + Duration::hours(1), 10)
        .await
        .unwrap();
    assert_eq!(retry.failed, 3);
}
