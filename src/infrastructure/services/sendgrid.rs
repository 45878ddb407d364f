// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::http_client;
use crate::domain::models::outreach::EmailEventKind;
use crate::domain::services::email_service::{EmailProvider, OutgoingEmail, ProviderError, SendReceipt};
use crate::domain::services::tracking_service::ProviderEvent;

const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";

/// SendGrid v3 邮件渠道
pub struct SendgridProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl SendgridProvider {
    pub fn new(api_key: String, api_base: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn payload(email: &OutgoingEmail) -> Value {
        let mut to = json!({ "email": email.to });
        if let Some(name) = &email.to_name {
            to["name"] = json!(name);
        }
        let mut from = json!({ "email": email.from });
        if let Some(name) = &email.from_name {
            from["name"] = json!(name);
        }
        json!({
            "personalizations": [{
                "to": [to],
                "custom_args": email.metadata,
            }],
            "from": from,
            "subject": email.subject,
            "content": [{ "type": "text/html", "value": email.html }],
        })
    }
}

#[async_trait]
impl EmailProvider for SendgridProvider {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&Self::payload(email))
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
        let provider_message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(to = %email.to, message_id = ?provider_message_id, "SendGrid accepted message");
        Ok(SendReceipt { provider_message_id })
    }
}

/// SendGrid 事件回调中的单条事件
#[derive(Debug, Deserialize)]
struct SendgridEvent {
    event: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    sg_message_id: Option<String>,
    /// 发送时的 custom_args 以顶层字段回传
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

fn event_kind(event: &str) -> Option<EmailEventKind> {
    match event {
        "delivered" => Some(EmailEventKind::Delivered),
        "open" => Some(EmailEventKind::Opened),
        "click" => Some(EmailEventKind::Clicked),
        "bounce" => Some(EmailEventKind::Bounced),
        "dropped" => Some(EmailEventKind::Failed),
        "unsubscribe" | "group_unsubscribe" | "spamreport" => Some(EmailEventKind::Unsubscribed),
        _ => None,
    }
}

/// 解析 SendGrid 事件回调（JSON 数组），忽略未识别的事件类型
pub fn parse_sendgrid_events(body: &[u8]) -> Result<Vec<ProviderEvent>, serde_json::Error> {
    let events: Vec<SendgridEvent> = serde_json::from_slice(body)?;
    Ok(events
        .into_iter()
        .filter_map(|e| {
            let kind = event_kind(&e.event)?;
            Some(ProviderEvent {
                tenant_id: e.tenant_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
                message_id: e.message_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
                // sg_message_id 形如 "{X-Message-Id}.filter..."
                provider_message_id: e
                    .sg_message_id
                    .as_deref()
                    .and_then(|id| id.split(".filter").next())
                    .map(str::to_string),
                kind,
                url: e.url,
                email: e.email,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_payload_carries_custom_args() {
        let mut metadata = BTreeMap::new();
        metadata.insert("message_id".to_string(), "m-1".to_string());
        let email = OutgoingEmail {
            to: "ann@example.com".into(),
            to_name: None,
            from: "news@example.com".into(),
            from_name: Some("News".into()),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            metadata,
        };
        let payload = SendgridProvider::payload(&email);
        assert_eq!(payload["personalizations"][0]["custom_args"]["message_id"], "m-1");
        assert_eq!(payload["from"]["name"], "News");
        assert!(payload["personalizations"][0]["to"][0].get("name").is_none());
    }

    #[test]
    fn test_parse_events_maps_kinds_and_ids() {
        let tenant = Uuid::new_v4();
        let message = Uuid::new_v4();
        let body = json!([
            {
                "event": "delivered",
                "email": "ann@example.com",
                "sg_message_id": "abc123.filter0001.16648.5515E0B88.0",
                "tenant_id": tenant.to_string(),
                "message_id": message.to_string()
            },
            { "event": "click", "url": "https://example.com", "sg_message_id": "abc123.filter0002" },
            { "event": "processed", "sg_message_id": "abc123.filter0003" }
        ]);
        let events = parse_sendgrid_events(body.to_string().as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EmailEventKind::Delivered);
        assert_eq!(events[0].tenant_id, Some(tenant));
        assert_eq!(events[0].message_id, Some(message));
        assert_eq!(events[0].provider_message_id.as_deref(), Some("abc123"));
        assert_eq!(events[1].kind, EmailEventKind::Clicked);
        assert_eq!(events[1].url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_parse_events_rejects_non_array() {
        assert!(parse_sendgrid_events(br#"{"event":"open"}"#).is_err());
    }
}
