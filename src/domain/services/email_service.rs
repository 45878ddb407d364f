// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// 渠道发送错误
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

/// 待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub from: String,
    pub from_name: Option<String>,
    pub subject: String,
    pub html: String,
    /// 透传给渠道的自定义参数，渠道回调时原样带回
    pub metadata: BTreeMap<String, String>,
}

/// 待发送的短信
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingSms {
    pub to: String,
    pub body: String,
}

/// 发送回执
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// 渠道侧消息ID，用于关联投递回调
    pub provider_message_id: Option<String>,
}

/// 邮件渠道
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// 渠道名称，写入消息记录
    fn name(&self) -> &'static str;
    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError>;
}

/// 短信渠道
#[async_trait]
pub trait SmsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, sms: &OutgoingSms) -> Result<SendReceipt, ProviderError>;
}

/// 带固定发件人的邮件发送器
#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    from_address: String,
    from_name: Option<String>,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, from_address: String, from_name: Option<String>) -> Self {
        Self {
            provider,
            from_address,
            from_name,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// 以默认发件人组装邮件
    pub fn envelope(&self, to: &str, to_name: Option<String>, subject: String, html: String) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            to_name,
            from: self.from_address.clone(),
            from_name: self.from_name.clone(),
            subject,
            html,
            metadata: BTreeMap::new(),
        }
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        if email.to.trim().is_empty() {
            return Err(ProviderError::InvalidMessage("recipient is empty".to_string()));
        }
        let receipt = self.provider.send(email).await;
        let outcome = if receipt.is_ok() { "sent" } else { "failed" };
        metrics::counter!("emails_sent_total", "provider" => self.provider.name(), "outcome" => outcome)
            .increment(1);
        receipt
    }
}
