// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::http_client;
use crate::domain::services::email_service::ProviderError;
use crate::domain::services::payment_webhook_service::{PaypalHeaders, PaypalVerifier};

const DEFAULT_API_BASE: &str = "https://api-m.paypal.com";

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verification_status: String,
}

/// 通过 PayPal `verify-webhook-signature` 接口校验回调
pub struct PaypalApiVerifier {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    webhook_id: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalApiVerifier {
    pub fn new(
        client_id: String,
        client_secret: String,
        webhook_id: String,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client: http_client(),
            client_id,
            client_secret,
            webhook_id,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: Mutex::new(None),
        }
    }

    /// 获取 OAuth2 访问令牌，过期前复用
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
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
        let body: TokenResponse = response.json().await?;
        // 提前一分钟刷新
        let ttl = Duration::from_secs(body.expires_in.saturating_sub(60));
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at: Instant::now() + ttl,
        });
        debug!("Obtained PayPal access token");
        Ok(body.access_token)
    }
}

#[async_trait]
impl PaypalVerifier for PaypalApiVerifier {
    async fn verify(&self, headers: &PaypalHeaders, event: &Value) -> Result<bool, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!(
                "{}/v1/notifications/verify-webhook-signature",
                self.api_base
            ))
            .bearer_auth(token)
            .json(&json!({
                "auth_algo": headers.auth_algo,
                "cert_url": headers.cert_url,
                "transmission_id": headers.transmission_id,
                "transmission_sig": headers.transmission_sig,
                "transmission_time": headers.transmission_time,
                "webhook_id": self.webhook_id,
                "webhook_event": event,
            }))
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
        let body: VerifyResponse = response.json().await?;
        let verified = body.verification_status == "SUCCESS";
        if !verified {
            warn!(
                transmission_id = %headers.transmission_id,
                status = %body.verification_status,
                "PayPal webhook signature rejected"
            );
        }
        Ok(verified)
    }
}
