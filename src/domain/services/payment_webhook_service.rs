// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 支付回调对账
//!
//! 校验渠道签名，按 (provider, event_id) 去重，再通过发票服务记录收款或退款。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::email_service::ProviderError;
use super::invoice_service::{InvoiceService, NewPayment, NewRefund};
use crate::domain::errors::DomainError;
use crate::domain::models::invoice::PaymentKind;
use crate::domain::models::payment_event::{
    PaymentAction, PaymentProvider, PaymentWebhookEvent, WebhookEventStatus, WebhookOutcome,
};
use crate::domain::repositories::payment_event_repository::PaymentEventRepository;
use crate::domain::repositories::RepositoryError;
use crate::utils::money::parse_decimal_to_cents;
use crate::utils::tokens::verify_hmac_sha256_hex;

/// PayPal 回调的传输头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaypalHeaders {
    pub transmission_id: String,
    pub transmission_time: String,
    pub transmission_sig: String,
    pub cert_url: String,
    pub auth_algo: String,
}

/// PayPal 回调签名校验（由 PayPal API 完成）
#[async_trait]
pub trait PaypalVerifier: Send + Sync {
    async fn verify(&self, headers: &PaypalHeaders, event: &Value) -> Result<bool, ProviderError>;
}

/// 校验 `Stripe-Signature` 头
///
/// 签名为 `HMAC-SHA256(secret, "{t}.{body}")` 的十六进制，任一 `v1` 匹配即通过；
/// 时间戳与当前时间相差超过 `tolerance_secs` 时拒绝。
pub fn verify_stripe_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), DomainError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| DomainError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(DomainError::InvalidSignature("missing v1 signature".into()));
    }

    let mut signed = format!("{}.", timestamp).into_bytes();
    signed.extend_from_slice(body);
    if !signatures
        .iter()
        .any(|sig| verify_hmac_sha256_hex(secret.as_bytes(), &signed, sig))
    {
        return Err(DomainError::InvalidSignature("no matching signature".into()));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(DomainError::InvalidSignature(
            "timestamp outside tolerance".into(),
        ));
    }
    Ok(())
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn required_uuid(value: &Value, pointer: &str) -> Result<Uuid, DomainError> {
    str_field(value, pointer)
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| DomainError::validation(format!("missing or invalid {}", pointer)))
}

fn required_i64(value: &Value, pointer: &str) -> Result<i64, DomainError> {
    value
        .pointer(pointer)
        .and_then(Value::as_i64)
        .ok_or_else(|| DomainError::validation(format!("missing {}", pointer)))
}

/// Stripe 事件头：(event_id, event_type)
pub fn stripe_event_header(event: &Value) -> Result<(String, String), DomainError> {
    let id = str_field(event, "/id").ok_or_else(|| DomainError::validation("missing event id"))?;
    let kind = str_field(event, "/type").unwrap_or_default();
    Ok((id.to_string(), kind.to_string()))
}

/// 解析 Stripe 事件为支付动作
pub fn parse_stripe_event(event: &Value) -> Result<PaymentAction, DomainError> {
    let kind = str_field(event, "/type").unwrap_or_default();
    let object = event
        .pointer("/data/object")
        .ok_or_else(|| DomainError::validation("missing data.object"))?;

    match kind {
        "payment_intent.succeeded" => Ok(PaymentAction::Payment {
            tenant_id: required_uuid(object, "/metadata/tenant_id")?,
            invoice_id: required_uuid(object, "/metadata/invoice_id")?,
            amount: required_i64(object, "/amount_received")?,
            fee: 0,
            method: str_field(object, "/payment_method_types/0")
                .unwrap_or("card")
                .to_string(),
            external_id: str_field(object, "/id")
                .ok_or_else(|| DomainError::validation("missing payment intent id"))?
                .to_string(),
        }),
        "checkout.session.completed" => {
            // 与 payment_intent.succeeded 共用 payment intent ID，保证同一笔付款只记一次
            let external_id = str_field(object, "/payment_intent")
                .or_else(|| str_field(object, "/id"))
                .ok_or_else(|| DomainError::validation("missing checkout session id"))?;
            Ok(PaymentAction::Payment {
                tenant_id: required_uuid(object, "/metadata/tenant_id")?,
                invoice_id: required_uuid(object, "/metadata/invoice_id")?,
                amount: required_i64(object, "/amount_total")?,
                fee: 0,
                method: "card".to_string(),
                external_id: external_id.to_string(),
            })
        }
        "charge.refunded" => {
            let payment_external_id = str_field(object, "/payment_intent")
                .or_else(|| str_field(object, "/id"))
                .ok_or_else(|| DomainError::validation("missing charge id"))?;
            Ok(PaymentAction::CumulativeRefund {
                tenant_id: required_uuid(object, "/metadata/tenant_id")?,
                invoice_id: required_uuid(object, "/metadata/invoice_id")?,
                payment_external_id: payment_external_id.to_string(),
                cumulative: required_i64(object, "/amount_refunded")?,
            })
        }
        _ => Ok(PaymentAction::Ignore),
    }
}

fn paypal_amount(resource: &Value, pointer: &str) -> Result<i64, DomainError> {
    let raw = str_field(resource, pointer)
        .ok_or_else(|| DomainError::validation(format!("missing {}", pointer)))?;
    parse_decimal_to_cents(raw).map_err(|e| DomainError::validation(e.to_string()))
}

/// 解析 `custom_id`，格式为 `{tenant_id}:{invoice_id}`
pub fn parse_custom_id(custom_id: &str) -> Result<(Uuid, Uuid), DomainError> {
    let (tenant, invoice) = custom_id
        .split_once(':')
        .ok_or_else(|| DomainError::validation("custom_id must be tenant_id:invoice_id"))?;
    let tenant = Uuid::parse_str(tenant.trim())
        .map_err(|_| DomainError::validation("invalid tenant id in custom_id"))?;
    let invoice = Uuid::parse_str(invoice.trim())
        .map_err(|_| DomainError::validation("invalid invoice id in custom_id"))?;
    Ok((tenant, invoice))
}

/// PayPal 事件头：(event_id, event_type)
pub fn paypal_event_header(event: &Value) -> Result<(String, String), DomainError> {
    let id = str_field(event, "/id").ok_or_else(|| DomainError::validation("missing event id"))?;
    let kind = str_field(event, "/event_type").unwrap_or_default();
    Ok((id.to_string(), kind.to_string()))
}

/// 解析 PayPal 事件为支付动作
pub fn parse_paypal_event(event: &Value) -> Result<PaymentAction, DomainError> {
    let kind = str_field(event, "/event_type").unwrap_or_default();
    let resource = event
        .pointer("/resource")
        .ok_or_else(|| DomainError::validation("missing resource"))?;

    match kind {
        "PAYMENT.CAPTURE.COMPLETED" => {
            let custom_id = str_field(resource, "/custom_id")
                .ok_or_else(|| DomainError::validation("missing custom_id"))?;
            let (tenant_id, invoice_id) = parse_custom_id(custom_id)?;
            let fee = match str_field(resource, "/seller_receivable_breakdown/paypal_fee/value") {
                Some(_) => paypal_amount(resource, "/seller_receivable_breakdown/paypal_fee/value")?,
                None => 0,
            };
            Ok(PaymentAction::Payment {
                tenant_id,
                invoice_id,
                amount: paypal_amount(resource, "/amount/value")?,
                fee,
                method: "paypal".to_string(),
                external_id: str_field(resource, "/id")
                    .ok_or_else(|| DomainError::validation("missing capture id"))?
                    .to_string(),
            })
        }
        "PAYMENT.CAPTURE.REFUNDED" => {
            let custom_id = str_field(resource, "/custom_id")
                .ok_or_else(|| DomainError::validation("missing custom_id"))?;
            let (tenant_id, invoice_id) = parse_custom_id(custom_id)?;
            // 原始 capture 通过 rel=up 链接给出
            let payment_external_id = resource
                .pointer("/links")
                .and_then(Value::as_array)
                .and_then(|links| {
                    links
                        .iter()
                        .find(|l| str_field(l, "/rel") == Some("up"))
                        .and_then(|l| str_field(l, "/href"))
                })
                .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
                .map(str::to_string);
            Ok(PaymentAction::Refund {
                tenant_id,
                invoice_id,
                amount: paypal_amount(resource, "/amount/value")?,
                payment_external_id,
                external_id: str_field(resource, "/id")
                    .ok_or_else(|| DomainError::validation("missing refund id"))?
                    .to_string(),
            })
        }
        _ => Ok(PaymentAction::Ignore),
    }
}

fn action_tenant(action: &PaymentAction) -> Option<Uuid> {
    match action {
        PaymentAction::Payment { tenant_id, .. }
        | PaymentAction::Refund { tenant_id, .. }
        | PaymentAction::CumulativeRefund { tenant_id, .. } => Some(*tenant_id),
        PaymentAction::Ignore => None,
    }
}

/// 支付回调服务
pub struct PaymentWebhookService {
    events: Arc<dyn PaymentEventRepository>,
    invoices: Arc<InvoiceService>,
    stripe_secret: Option<String>,
    stripe_tolerance_secs: i64,
    paypal: Option<Arc<dyn PaypalVerifier>>,
}

impl PaymentWebhookService {
    pub fn new(
        events: Arc<dyn PaymentEventRepository>,
        invoices: Arc<InvoiceService>,
        stripe_secret: Option<String>,
        stripe_tolerance_secs: i64,
        paypal: Option<Arc<dyn PaypalVerifier>>,
    ) -> Self {
        Self {
            events,
            invoices,
            stripe_secret: stripe_secret.filter(|s| !s.is_empty()),
            stripe_tolerance_secs,
            paypal,
        }
    }

    pub async fn handle_stripe(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, DomainError> {
        let secret = self
            .stripe_secret
            .as_deref()
            .ok_or_else(|| DomainError::InvalidSignature("stripe webhooks are not configured".into()))?;
        let signature =
            signature.ok_or_else(|| DomainError::InvalidSignature("missing Stripe-Signature".into()))?;
        verify_stripe_signature(
            signature,
            body,
            secret,
            self.stripe_tolerance_secs,
            Utc::now().timestamp(),
        )?;

        let event: Value = serde_json::from_slice(body)
            .map_err(|e| DomainError::validation(format!("invalid JSON payload: {}", e)))?;
        let (event_id, event_type) = stripe_event_header(&event)?;
        let action = parse_stripe_event(&event);
        self.process(PaymentProvider::Stripe, event_id, event_type, event, action)
            .await
    }

    pub async fn handle_paypal(
        &self,
        headers: &PaypalHeaders,
        body: &[u8],
    ) -> Result<WebhookOutcome, DomainError> {
        let verifier = self
            .paypal
            .as_ref()
            .ok_or_else(|| DomainError::InvalidSignature("paypal webhooks are not configured".into()))?;
        let event: Value = serde_json::from_slice(body)
            .map_err(|e| DomainError::validation(format!("invalid JSON payload: {}", e)))?;

        match verifier.verify(headers, &event).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(DomainError::InvalidSignature(
                    "paypal verification failed".into(),
                ))
            }
            Err(e) => return Err(DomainError::External(e.to_string())),
        }

        let (event_id, event_type) = paypal_event_header(&event)?;
        let action = parse_paypal_event(&event);
        self.process(PaymentProvider::Paypal, event_id, event_type, event, action)
            .await
    }

    /// 去重后执行支付动作
    async fn process(
        &self,
        provider: PaymentProvider,
        event_id: String,
        event_type: String,
        payload: Value,
        action: Result<PaymentAction, DomainError>,
    ) -> Result<WebhookOutcome, DomainError> {
        counter!("payment_webhooks_received_total", "provider" => provider.as_str()).increment(1);

        let tenant_id = action.as_ref().ok().and_then(action_tenant);
        let record = PaymentWebhookEvent::new(provider, event_id.clone(), event_type.clone(), tenant_id, payload);
        match self.events.insert(&record).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                let existing = self.events.find(provider, &event_id).await?;
                let retry = match existing.map(|e| e.status) {
                    Some(WebhookEventStatus::Failed) => {
                        self.events.claim_failed(provider, &event_id).await?
                    }
                    _ => false,
                };
                if !retry {
                    info!(provider = %provider, event_id = %event_id, "Duplicate payment webhook");
                    return Ok(WebhookOutcome::Duplicate);
                }
            }
            Err(e) => return Err(e.into()),
        }

        let result = match action {
            Ok(PaymentAction::Ignore) => {
                self.events
                    .mark(provider, &event_id, WebhookEventStatus::Ignored, None)
                    .await?;
                return Ok(WebhookOutcome::Ignored);
            }
            Ok(action) => self.apply(provider, action).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.events
                    .mark(provider, &event_id, WebhookEventStatus::Processed, None)
                    .await?;
                info!(provider = %provider, event_id = %event_id, event_type = %event_type, "Payment webhook processed");
                Ok(WebhookOutcome::Processed)
            }
            Err(e) => {
                error!(provider = %provider, event_id = %event_id, error = %e, "Payment webhook failed");
                if let Err(mark_err) = self
                    .events
                    .mark(provider, &event_id, WebhookEventStatus::Failed, Some(e.to_string()))
                    .await
                {
                    warn!(event_id = %event_id, error = %mark_err, "Failed to mark webhook event as failed");
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, provider: PaymentProvider, action: PaymentAction) -> Result<(), DomainError> {
        let today = Utc::now().date_naive();
        match action {
            PaymentAction::Payment {
                tenant_id,
                invoice_id,
                amount,
                fee,
                method,
                external_id,
            } => {
                self.invoices
                    .record_payment(
                        tenant_id,
                        invoice_id,
                        NewPayment {
                            amount,
                            fee,
                            method,
                            provider: provider.to_string(),
                            external_id,
                            received_on: today,
                        },
                        None,
                    )
                    .await?;
            }
            PaymentAction::Refund {
                tenant_id,
                invoice_id,
                amount,
                payment_external_id,
                external_id,
            } => {
                let payment_id = match payment_external_id {
                    Some(ext) => self
                        .invoices
                        .find_payment_by_external_id(tenant_id, provider.as_str(), &ext)
                        .await?
                        .filter(|p| p.invoice_id == invoice_id && p.kind == PaymentKind::Payment)
                        .map(|p| p.id),
                    None => None,
                };
                self.invoices
                    .record_refund(
                        tenant_id,
                        invoice_id,
                        NewRefund {
                            amount,
                            payment_id,
                            provider: provider.to_string(),
                            external_id,
                            refunded_on: today,
                        },
                        None,
                    )
                    .await?;
            }
            PaymentAction::CumulativeRefund {
                tenant_id,
                invoice_id,
                payment_external_id,
                cumulative,
            } => {
                let payment = self
                    .invoices
                    .find_payment_by_external_id(tenant_id, provider.as_str(), &payment_external_id)
                    .await?
                    .filter(|p| p.invoice_id == invoice_id && p.kind == PaymentKind::Payment)
                    .ok_or(DomainError::NotFound("payment"))?;
                let already: i64 = self
                    .invoices
                    .list_payments(tenant_id, invoice_id)
                    .await?
                    .iter()
                    .filter(|p| p.kind == PaymentKind::Refund && p.payment_id == Some(payment.id))
                    .map(|p| p.amount)
                    .sum();
                let delta = cumulative - already;
                if delta <= 0 {
                    info!(
                        tenant_id = %tenant_id,
                        payment = %payment_external_id,
                        cumulative,
                        "Refund already recorded"
                    );
                    return Ok(());
                }
                self.invoices
                    .record_refund(
                        tenant_id,
                        invoice_id,
                        NewRefund {
                            amount: delta,
                            payment_id: Some(payment.id),
                            provider: provider.to_string(),
                            external_id: format!("{}:{}", payment_external_id, cumulative),
                            refunded_on: today,
                        },
                        None,
                    )
                    .await?;
            }
            PaymentAction::Ignore => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "payment_webhook_service_test.rs"]
mod tests;
