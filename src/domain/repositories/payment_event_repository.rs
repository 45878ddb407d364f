// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::models::payment_event::{PaymentProvider, PaymentWebhookEvent, WebhookEventStatus};

/// 支付回调事件仓库
#[async_trait]
pub trait PaymentEventRepository: Send + Sync {
    /// 写入新事件，(provider, event_id) 重复时返回 Conflict
    async fn insert(&self, event: &PaymentWebhookEvent) -> Result<(), RepositoryError>;
    async fn find(
        &self,
        provider: PaymentProvider,
        event_id: &str,
    ) -> Result<Option<PaymentWebhookEvent>, RepositoryError>;
    /// 将失败事件重新置为处理中，返回是否成功抢占
    async fn claim_failed(
        &self,
        provider: PaymentProvider,
        event_id: &str,
    ) -> Result<bool, RepositoryError>;
    async fn mark(
        &self,
        provider: PaymentProvider,
        event_id: &str,
        status: WebhookEventStatus,
        error: Option<String>,
    ) -> Result<(), RepositoryError>;
}
