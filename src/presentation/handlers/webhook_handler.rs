// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::payment_event::WebhookOutcome;
use crate::domain::services::payment_webhook_service::PaypalHeaders;
use crate::infrastructure::services::mailgun::{verify_mailgun_signature, MailgunWebhook};
use crate::infrastructure::services::sendgrid::parse_sendgrid_events;
use crate::presentation::response::{ApiResponse, ApiResult};
use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub outcome: WebhookOutcome,
}

#[derive(Debug, Serialize)]
pub struct EventsAck {
    /// 匹配到消息并写入的事件数
    pub applied: usize,
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Stripe 回调，签名基于原始请求体
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());
    let outcome = state.payments.handle_stripe(signature, &body).await?;
    Ok(ApiResponse::ok(WebhookAck { outcome }))
}

/// PayPal 回调，签名由 PayPal 接口校验
pub async fn paypal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let paypal_headers = PaypalHeaders {
        transmission_id: header_value(&headers, "paypal-transmission-id"),
        transmission_time: header_value(&headers, "paypal-transmission-time"),
        transmission_sig: header_value(&headers, "paypal-transmission-sig"),
        cert_url: header_value(&headers, "paypal-cert-url"),
        auth_algo: header_value(&headers, "paypal-auth-algo"),
    };
    let outcome = state.payments.handle_paypal(&paypal_headers, &body).await?;
    Ok(ApiResponse::ok(WebhookAck { outcome }))
}

#[derive(Debug, Deserialize)]
pub struct SendgridQuery {
    pub token: Option<String>,
}

/// SendGrid 事件回调；配置了共享令牌时要求 `?token=` 匹配
pub async fn sendgrid(
    State(state): State<AppState>,
    Query(query): Query<SendgridQuery>,
    body: Bytes,
) -> ApiResult<EventsAck> {
    if let Some(expected) = state.settings.sendgrid.webhook_token.as_deref() {
        if query.token.as_deref() != Some(expected) {
            warn!("Rejected SendGrid webhook with invalid token");
            return Err(DomainError::InvalidSignature("invalid sendgrid token".into()).into());
        }
    }
    let events = parse_sendgrid_events(&body)
        .map_err(|e| DomainError::validation(format!("invalid SendGrid payload: {}", e)))?;
    debug!(count = events.len(), "Received SendGrid events");
    let applied = state.tracking.apply_provider_events(events).await?;
    Ok(ApiResponse::ok(EventsAck { applied }))
}

/// Mailgun 事件回调，HMAC 签名覆盖 timestamp + token
pub async fn mailgun(
    State(state): State<AppState>,
    Json(payload): Json<MailgunWebhook>,
) -> ApiResult<EventsAck> {
    let signing_key = state
        .settings
        .mailgun
        .signing_key
        .as_deref()
        .ok_or_else(|| DomainError::InvalidSignature("mailgun webhooks are not configured".into()))?;
    let signature = &payload.signature;
    if !verify_mailgun_signature(
        signing_key,
        &signature.timestamp,
        &signature.token,
        &signature.signature,
    ) {
        warn!("Rejected Mailgun webhook with invalid signature");
        return Err(DomainError::InvalidSignature("invalid mailgun signature".into()).into());
    }
    let events: Vec<_> = payload.to_event().into_iter().collect();
    let applied = state.tracking.apply_provider_events(events).await?;
    Ok(ApiResponse::ok(EventsAck { applied }))
}
