// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::http_client;
use crate::domain::models::outreach::EmailEventKind;
use crate::domain::services::email_service::{EmailProvider, OutgoingEmail, ProviderError, SendReceipt};
use crate::domain::services::tracking_service::ProviderEvent;
use crate::utils::tokens::verify_hmac_sha256_hex;

const DEFAULT_API_BASE: &str = "https://api.mailgun.net";

/// Mailgun 邮件渠道
pub struct MailgunProvider {
    client: reqwest::Client,
    api_key: String,
    domain: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

impl MailgunProvider {
    pub fn new(api_key: String, domain: String, api_base: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            domain,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn form(email: &OutgoingEmail) -> Vec<(String, String)> {
        let address = |name: &Option<String>, email: &str| match name {
            Some(name) => format!("{} <{}>", name, email),
            None => email.to_string(),
        };
        let mut form = vec![
            ("from".to_string(), address(&email.from_name, &email.from)),
            ("to".to_string(), address(&email.to_name, &email.to)),
            ("subject".to_string(), email.subject.clone()),
            ("html".to_string(), email.html.clone()),
        ];
        // 自定义变量在事件回调的 user-variables 中回传
        for (key, value) in &email.metadata {
            form.push((format!("v:{}", key), value.clone()));
        }
        form
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    fn name(&self) -> &'static str {
        "mailgun"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v3/{}/messages", self.api_base, self.domain))
            .basic_auth("api", Some(&self.api_key))
            .form(&Self::form(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let body: SendResponse = response.json().await?;
        let provider_message_id = body.id.map(|id| normalize_message_id(&id));
        debug!(to = %email.to, message_id = ?provider_message_id, "Mailgun accepted message");
        Ok(SendReceipt { provider_message_id })
    }
}

/// Mailgun 的消息ID在发送响应中带尖括号，在事件中不带
fn normalize_message_id(id: &str) -> String {
    id.trim().trim_start_matches('<').trim_end_matches('>').to_string()
}

/// 校验 Mailgun 回调签名：HMAC-SHA256(signing_key, timestamp + token)
pub fn verify_mailgun_signature(signing_key: &str, timestamp: &str, token: &str, signature: &str) -> bool {
    let message = format!("{}{}", timestamp, token);
    verify_hmac_sha256_hex(signing_key.as_bytes(), message.as_bytes(), signature)
}

#[derive(Debug, Deserialize)]
pub struct MailgunSignature {
    pub timestamp: String,
    pub token: String,
    pub signature: String,
}

/// Mailgun 事件回调
#[derive(Debug, Deserialize)]
pub struct MailgunWebhook {
    pub signature: MailgunSignature,
    #[serde(rename = "event-data")]
    pub event_data: Value,
}

impl MailgunWebhook {
    /// 转换为投递事件；未识别或临时失败的事件返回 `None`
    pub fn to_event(&self) -> Option<ProviderEvent> {
        let data = &self.event_data;
        let kind = match data.get("event")?.as_str()? {
            "delivered" => EmailEventKind::Delivered,
            "opened" => EmailEventKind::Opened,
            "clicked" => EmailEventKind::Clicked,
            "unsubscribed" | "complained" => EmailEventKind::Unsubscribed,
            "failed" => match data.get("severity").and_then(Value::as_str) {
                Some("temporary") => return None,
                _ => EmailEventKind::Bounced,
            },
            "rejected" => EmailEventKind::Failed,
            _ => return None,
        };
        let variables = data.get("user-variables");
        let variable = |key: &str| {
            variables
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
        };
        Some(ProviderEvent {
            tenant_id: variable("tenant_id"),
            message_id: variable("message_id"),
            provider_message_id: data
                .pointer("/message/headers/message-id")
                .and_then(Value::as_str)
                .map(normalize_message_id),
            kind,
            url: data.get("url").and_then(Value::as_str).map(str::to_string),
            email: data.get("recipient").and_then(Value::as_str).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tokens::hmac_sha256_hex;
    use serde_json::json;

    #[test]
    fn test_signature_verification() {
        let signature = hmac_sha256_hex(b"key-123", b"1700000000abcdef");
        assert!(verify_mailgun_signature("key-123", "1700000000", "abcdef", &signature));
        assert!(!verify_mailgun_signature("key-123", "1700000001", "abcdef", &signature));
        assert!(!verify_mailgun_signature("other", "1700000000", "abcdef", &signature));
    }

    #[test]
    fn test_form_includes_user_variables() {
        let mut email = OutgoingEmail {
            to: "ann@example.com".into(),
            to_name: Some("Ann".into()),
            from: "news@example.com".into(),
            from_name: None,
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            metadata: Default::default(),
        };
        email.metadata.insert("tenant_id".into(), "t-1".into());
        let form = MailgunProvider::form(&email);
        assert!(form.contains(&("to".into(), "Ann <ann@example.com>".into())));
        assert!(form.contains(&("from".into(), "news@example.com".into())));
        assert!(form.contains(&("v:tenant_id".into(), "t-1".into())));
    }

    #[test]
    fn test_event_mapping() {
        let message = Uuid::new_v4();
        let webhook: MailgunWebhook = serde_json::from_value(json!({
            "signature": { "timestamp": "1", "token": "t", "signature": "s" },
            "event-data": {
                "event": "failed",
                "severity": "permanent",
                "recipient": "ann@example.com",
                "user-variables": { "message_id": message.to_string() },
                "message": { "headers": { "message-id": "<20260101.1@mg.example.com>" } }
            }
        }))
        .unwrap();
        let event = webhook.to_event().unwrap();
        assert_eq!(event.kind, EmailEventKind::Bounced);
        assert_eq!(event.message_id, Some(message));
        assert_eq!(event.provider_message_id.as_deref(), Some("20260101.1@mg.example.com"));

        let temporary: MailgunWebhook = serde_json::from_value(json!({
            "signature": { "timestamp": "1", "token": "t", "signature": "s" },
            "event-data": { "event": "failed", "severity": "temporary" }
        }))
        .unwrap();
        assert!(temporary.to_event().is_none());
    }
}
