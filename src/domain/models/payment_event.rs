// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 支付渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}

string_enum!(PaymentProvider {
    Stripe => "stripe",
    Paypal => "paypal",
});

/// 回调事件处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventStatus {
    /// 处理中
    #[default]
    Processing,
    /// 已处理
    Processed,
    /// 处理失败，可重试
    Failed,
    /// 未识别的事件类型
    Ignored,
}

string_enum!(WebhookEventStatus {
    Processing => "processing",
    Processed => "processed",
    Failed => "failed",
    Ignored => "ignored",
});

/// 支付回调事件记录，按 (provider, event_id) 去重
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    pub id: Uuid,
    pub provider: PaymentProvider,
    pub event_id: String,
    pub event_type: String,
    pub tenant_id: Option<Uuid>,
    pub status: WebhookEventStatus,
    pub error: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl PaymentWebhookEvent {
    pub fn new(
        provider: PaymentProvider,
        event_id: String,
        event_type: String,
        tenant_id: Option<Uuid>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            event_id,
            event_type,
            tenant_id,
            status: WebhookEventStatus::Processing,
            error: None,
            payload,
            received_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// 从回调中解析出的支付动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentAction {
    /// 收款
    Payment {
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: i64,
        fee: i64,
        method: String,
        external_id: String,
    },
    /// 退款；`payment_external_id` 指向原始收款
    Refund {
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: i64,
        payment_external_id: Option<String>,
        external_id: String,
    },
    /// Stripe 累计退款，需要与已记录的退款求差
    CumulativeRefund {
        tenant_id: Uuid,
        invoice_id: Uuid,
        payment_external_id: String,
        cumulative: i64,
    },
    /// 不处理的事件
    Ignore,
}

/// 回调事件处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    Ignored,
}
