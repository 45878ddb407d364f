// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use boaz_os::config::settings::Settings;
use boaz_os::domain::services::email_service::{
    EmailProvider, OutgoingEmail, ProviderError, SendReceipt,
};
use boaz_os::domain::services::payment_webhook_service::PaypalVerifier;
use boaz_os::infrastructure::database::connection;
use boaz_os::presentation::routes;
use boaz_os::presentation::state::{AppState, Providers};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use uuid::Uuid;

pub const STRIPE_SECRET: &str = "whsec_test_secret";
pub const MAILGUN_SIGNING_KEY: &str = "mailgun-signing-key";
pub const SENDGRID_TOKEN: &str = "sendgrid-hook-token";
pub const ADMIN_EMAIL: &str = "owner@acme.test";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// 记录所有外发邮件的渠道，可指定始终投递失败的收件人
#[derive(Default)]
pub struct RecordingEmailProvider {
    sent: Mutex<Vec<OutgoingEmail>>,
    rejected: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingEmailProvider {
    pub fn reject(&self, email: &str) {
        self.rejected.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, email: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|m| m.to == email).collect()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        if self.rejected.lock().unwrap().contains(&email.to) {
            return Err(ProviderError::Rejected {
                status: 550,
                body: "mailbox unavailable".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(SendReceipt {
            provider_message_id: Some(format!("rec-{}", sent.len())),
        })
    }
}

/// 测试结束时删除的 SQLite 数据库文件
pub struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("boaz-test-{}.db", Uuid::new_v4())))
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.0.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

pub fn test_settings(db_url: &str) -> Settings {
    Settings::builder()
        .unwrap()
        .set_override("database.url", db_url)
        .unwrap()
        .set_override("database.max_connections", 5)
        .unwrap()
        .set_override("auth.jwt_secret", "integration-jwt-secret")
        .unwrap()
        .set_override("auth.bcrypt_cost", 4)
        .unwrap()
        .set_override("email.tracking_secret", "integration-tracking-secret")
        .unwrap()
        .set_override("stripe.webhook_secret", STRIPE_SECRET)
        .unwrap()
        .set_override("mailgun.signing_key", MAILGUN_SIGNING_KEY)
        .unwrap()
        .set_override("sendgrid.webhook_token", SENDGRID_TOKEN)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub emails: Arc<RecordingEmailProvider>,
    pub tenant_id: Uuid,
    pub token: String,
    pub db: Arc<DatabaseConnection>,
    _db: TempDb,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_paypal(None).await
}

/// 创建测试应用并注册一个租户
pub async fn spawn_app_with_paypal(paypal: Option<Arc<dyn PaypalVerifier>>) -> TestApp {
    let db_file = TempDb::new();
    let settings = Arc::new(test_settings(&db_file.url()));
    let db = Arc::new(
        connection::connect_and_migrate(&settings.database)
            .await
            .expect("Failed to prepare test database"),
    );

    let emails = Arc::new(RecordingEmailProvider::default());
    let providers = Providers {
        email: emails.clone(),
        sms: None,
        paypal,
    };
    let state = AppState::new(db.clone(), settings, providers);
    let server = TestServer::new(routes::routes(state.clone())).expect("Failed to start test server");

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "tenant_name": "Acme Consulting",
            "admin_email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    let tenant_id = Uuid::parse_str(body["data"]["tenant_id"].as_str().unwrap()).unwrap();
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    TestApp {
        server,
        state,
        emails,
        tenant_id,
        token,
        db,
        _db: db_file,
    }
}

/// 取出响应中的 `data`
pub fn data(response: &TestResponse) -> Value {
    let body: Value = response.json();
    body["data"].clone()
}

pub fn id_of(value: &Value) -> Uuid {
    Uuid::parse_str(value["id"].as_str().expect("id field")).unwrap()
}

#[allow(dead_code)]
impl TestApp {
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .authorization_bearer(&self.token)
            .json(&body)
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .put(path)
            .authorization_bearer(&self.token)
            .json(&body)
            .await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(path).authorization_bearer(&self.token).await
    }

    /// 以指定角色创建员工并登录，返回令牌
    pub async fn staff_token(&self, role: &str) -> String {
        let email = format!("{}-{}@acme.test", role, Uuid::new_v4().simple());
        self.post(
            "/api/users",
            json!({ "email": email, "password": "staff-password-1", "role": role }),
        )
        .await
        .assert_status(axum::http::StatusCode::CREATED);

        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({
                "tenant_id": self.tenant_id,
                "email": email,
                "password": "staff-password-1",
            }))
            .await;
        response.assert_status_ok();
        data(&response)["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_account(&self, name: &str) -> Uuid {
        let response = self.post("/api/accounts", json!({ "name": name })).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        id_of(&data(&response))
    }

    pub async fn create_contact(&self, account_id: Uuid, first_name: &str, email: &str) -> Uuid {
        let response = self
            .post(
                "/api/contacts",
                json!({
                    "account_id": account_id,
                    "first_name": first_name,
                    "last_name": "Tester",
                    "email": email,
                }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        id_of(&data(&response))
    }

    /// 创建并开具发票：2 × 50.00，税率 10%，合计 110.00
    pub async fn issued_invoice(&self, account_id: Uuid) -> Value {
        let response = self
            .post(
                "/api/invoices",
                json!({
                    "account_id": account_id,
                    "billing_email": "billing@client.test",
                    "due_date": "2030-01-31",
                    "lines": [
                        { "description": "Consulting day", "quantity": 2, "unit_price": 5000 }
                    ],
                    "tax_rate_bps": 1000,
                }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let invoice_id = id_of(&data(&response));

        let response = self
            .post(&format!("/api/invoices/{}/issue", invoice_id), json!({}))
            .await;
        response.assert_status_ok();
        data(&response)
    }

    /// 试算平衡表中某科目的余额
    pub async fn balance_of(&self, code: &str) -> i64 {
        let response = self.get("/api/ledger/reports/trial-balance").await;
        response.assert_status_ok();
        data(&response)["rows"]
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["code"] == code)
            .map(|row| row["balance"].as_i64().unwrap())
            .unwrap_or(0)
    }
}
