// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::outreach::{
    Campaign, EmailEvent, EmailMessage, EmailTemplate, Enrollment, MessageStatus, OutreachSequence,
};

/// 营销外呼仓库
#[async_trait]
pub trait OutreachRepository: Send + Sync {
    async fn create_template(&self, template: &EmailTemplate) -> Result<EmailTemplate, RepositoryError>;
    async fn find_template(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<EmailTemplate>, RepositoryError>;
    async fn list_templates(&self, tenant_id: Uuid) -> Result<Vec<EmailTemplate>, RepositoryError>;

    async fn create_sequence(
        &self,
        sequence: &OutreachSequence,
    ) -> Result<OutreachSequence, RepositoryError>;
    async fn find_sequence(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<OutreachSequence>, RepositoryError>;
    async fn list_sequences(&self, tenant_id: Uuid) -> Result<Vec<OutreachSequence>, RepositoryError>;

    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment, RepositoryError>;
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment, RepositoryError>;
    async fn find_enrollment(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Enrollment>, RepositoryError>;
    /// 查找联系人在序列中的有效入组
    async fn find_active_enrollment(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Enrollment>, RepositoryError>;
    async fn list_enrollments(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
    ) -> Result<Vec<Enrollment>, RepositoryError>;
    /// 跨租户查找到期的有效入组
    async fn due_enrollments(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Enrollment>, RepositoryError>;

    async fn create_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    async fn find_campaign(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Campaign>, RepositoryError>;
    async fn list_campaigns(&self, tenant_id: Uuid) -> Result<Vec<Campaign>, RepositoryError>;

    async fn create_message(&self, message: &EmailMessage) -> Result<EmailMessage, RepositoryError>;
    async fn find_message(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<EmailMessage>, RepositoryError>;
    /// 按渠道消息ID查找（渠道回调不携带租户）
    async fn find_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailMessage>, RepositoryError>;
    async fn update_message_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<(), RepositoryError>;
    async fn list_campaign_messages(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<Vec<EmailMessage>, RepositoryError>;

    async fn record_event(&self, event: &EmailEvent) -> Result<(), RepositoryError>;
    async fn list_events_for_messages(
        &self,
        tenant_id: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<EmailEvent>, RepositoryError>;

    /// 记录退订，已存在时忽略
    async fn add_unsubscribe(
        &self,
        tenant_id: Uuid,
        email: &str,
        reason: Option<&str>,
    ) -> Result<(), RepositoryError>;
    async fn is_unsubscribed(&self, tenant_id: Uuid, email: &str) -> Result<bool, RepositoryError>;
}
