// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client;
use crate::domain::services::email_service::{OutgoingSms, ProviderError, SendReceipt, SmsProvider};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Twilio 短信渠道
pub struct TwilioSmsProvider {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: Option<String>,
}

impl TwilioSmsProvider {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client: http_client(),
            account_sid,
            auth_token,
            from_number,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsProvider {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, sms: &OutgoingSms) -> Result<SendReceipt, ProviderError> {
        if sms.to.trim().is_empty() {
            return Err(ProviderError::InvalidMessage("recipient is empty".to_string()));
        }
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", sms.to.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", sms.body.as_str()),
            ])
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
        let body: MessageResponse = response.json().await?;
        debug!(to = %sms.to, sid = ?body.sid, "Twilio accepted message");
        Ok(SendReceipt {
            provider_message_id: body.sid,
        })
    }
}
