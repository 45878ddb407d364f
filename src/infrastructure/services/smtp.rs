// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use uuid::Uuid;

use crate::config::settings::SmtpSettings;
use crate::domain::services::email_service::{EmailProvider, OutgoingEmail, ProviderError, SendReceipt};

/// SMTP 邮件渠道
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailProvider {
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self> {
        let host = settings
            .host
            .as_deref()
            .ok_or_else(|| anyhow!("smtp.host is required"))?;
        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        if let Some(port) = settings.port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, ProviderError> {
    let address: Address = address
        .trim()
        .parse()
        .map_err(|e| ProviderError::InvalidMessage(format!("invalid address '{}': {}", address, e)))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

/// 组装 MIME 邮件，返回邮件与 Message-ID
pub fn build_message(email: &OutgoingEmail) -> Result<(Message, String), ProviderError> {
    let message_id = format!("<{}@boaz-os>", Uuid::new_v4());
    let message = Message::builder()
        .from(mailbox(email.from_name.as_deref(), &email.from)?)
        .to(mailbox(email.to_name.as_deref(), &email.to)?)
        .subject(email.subject.clone())
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())
        .map_err(|e| ProviderError::InvalidMessage(e.to_string()))?;
    Ok((message, message_id))
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        let (message, message_id) = build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        debug!(code = %response.code(), to = %email.to, "SMTP message accepted");
        Ok(SendReceipt {
            provider_message_id: Some(message_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.into(),
            to_name: Some("Ann Lee".into()),
            from: "billing@example.com".into(),
            from_name: Some("Billing".into()),
            subject: "Invoice INV-2026-00001".into(),
            html: "<p>Hello</p>".into(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_build_message_sets_html_and_message_id() {
        let (message, id) = build_message(&email("ann@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains(&id));
        assert!(raw.contains("Subject: Invoice INV-2026-00001"));
    }

    #[test]
    fn test_build_message_rejects_invalid_address() {
        assert!(matches!(
            build_message(&email("not an address")),
            Err(ProviderError::InvalidMessage(_))
        ));
    }
}
