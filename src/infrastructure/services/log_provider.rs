// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::services::email_service::{EmailProvider, OutgoingEmail, ProviderError, SendReceipt};

/// 只写日志的邮件渠道，用于开发与测试环境
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailProvider;

#[async_trait]
impl EmailProvider for LogEmailProvider {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ProviderError> {
        let id = format!("log-{}", Uuid::new_v4());
        info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            provider_message_id = %id,
            "Email logged instead of sent"
        );
        Ok(SendReceipt {
            provider_message_id: Some(id),
        })
    }
}
