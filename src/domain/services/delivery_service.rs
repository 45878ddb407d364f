// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::email_composer::{compose, render_merge_tags, LinkTracker, MergeContext};
use super::email_service::{Mailer, OutgoingSms, ProviderError, SmsProvider};
use crate::domain::errors::DomainError;
use crate::domain::models::crm::Contact;
use crate::domain::models::outreach::{
    Channel, EmailMessage, MessageStatus, TrackingClaims, UnsubscribeClaims,
};
use crate::domain::models::tenant::normalize_email;
use crate::domain::repositories::outreach_repository::OutreachRepository;
use crate::utils::tokens::TokenSigner;

/// 基于签名令牌的追踪地址
pub struct SignedTracker<'a> {
    signer: &'a TokenSigner,
    base_url: &'a str,
    tenant_id: Uuid,
    message_id: Uuid,
    open_url: String,
    unsubscribe_url: String,
}

impl<'a> SignedTracker<'a> {
    pub fn new(
        signer: &'a TokenSigner,
        base_url: &'a str,
        tenant_id: Uuid,
        message_id: Uuid,
        email: &str,
    ) -> Result<Self, DomainError> {
        let open = signer
            .sign(&TrackingClaims {
                t: tenant_id,
                m: message_id,
                u: None,
            })
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let unsubscribe = signer
            .sign(&UnsubscribeClaims {
                t: tenant_id,
                e: normalize_email(email),
                m: Some(message_id),
            })
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Self {
            signer,
            base_url,
            tenant_id,
            message_id,
            open_url: format!("{}/t/o/{}", base_url, open),
            unsubscribe_url: format!("{}/unsubscribe/{}", base_url, unsubscribe),
        })
    }
}

impl LinkTracker for SignedTracker<'_> {
    fn click_url(&self, target: &str) -> Option<String> {
        let claims = TrackingClaims {
            t: self.tenant_id,
            m: self.message_id,
            u: Some(target.to_string()),
        };
        self.signer
            .sign(&claims)
            .ok()
            .map(|token| format!("{}/t/c/{}", self.base_url, token))
    }

    fn open_url(&self) -> Option<String> {
        Some(self.open_url.clone())
    }

    fn unsubscribe_url(&self) -> String {
        self.unsubscribe_url.clone()
    }
}

/// 单个联系人的投递结果
#[derive(Debug)]
pub enum Delivery {
    /// 已交给渠道
    Sent(EmailMessage),
    /// 收件人已退订
    Suppressed,
    /// 联系人缺少邮箱或手机号
    Skipped(&'static str),
    /// 渠道发送失败，消息以 failed 状态记录
    Failed(EmailMessage, String),
}

/// 营销投递服务
///
/// 合成带追踪的邮件、检查退订名单、调用渠道并记录消息。
pub struct DeliveryService {
    repo: Arc<dyn OutreachRepository>,
    mailer: Mailer,
    sms: Option<Arc<dyn SmsProvider>>,
    signer: TokenSigner,
    base_url: String,
}

impl DeliveryService {
    pub fn new(
        repo: Arc<dyn OutreachRepository>,
        mailer: Mailer,
        sms: Option<Arc<dyn SmsProvider>>,
        signer: TokenSigner,
        base_url: &str,
    ) -> Self {
        Self {
            repo,
            mailer,
            sms,
            signer,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    fn merge_context(contact: &Contact, company: &str) -> MergeContext {
        MergeContext {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone().unwrap_or_default(),
            company: company.to_string(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn message(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        contact: &Contact,
        recipient: String,
        channel: Channel,
        subject: Option<String>,
        provider: &str,
        campaign_id: Option<Uuid>,
        enrollment_id: Option<Uuid>,
    ) -> EmailMessage {
        EmailMessage {
            id,
            tenant_id,
            contact_id: Some(contact.id),
            recipient,
            channel,
            subject,
            campaign_id,
            enrollment_id,
            provider: provider.to_string(),
            provider_message_id: None,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        }
    }

    async fn record(
        &self,
        mut message: EmailMessage,
        result: Result<Option<String>, ProviderError>,
    ) -> Result<Delivery, DomainError> {
        match result {
            Ok(provider_message_id) => {
                message.provider_message_id = provider_message_id;
                let message = self.repo.create_message(&message).await?;
                debug!(
                    tenant_id = %message.tenant_id,
                    message_id = %message.id,
                    channel = %message.channel,
                    "Message sent"
                );
                Ok(Delivery::Sent(message))
            }
            Err(e) => {
                message.status = MessageStatus::Failed;
                let message = self.repo.create_message(&message).await?;
                warn!(
                    tenant_id = %message.tenant_id,
                    message_id = %message.id,
                    recipient = %message.recipient,
                    error = %e,
                    "Message delivery failed"
                );
                Ok(Delivery::Failed(message, e.to_string()))
            }
        }
    }

    /// 发送营销邮件
    pub async fn deliver_email(
        &self,
        tenant_id: Uuid,
        contact: &Contact,
        company: &str,
        subject: &str,
        html_body: &str,
        campaign_id: Option<Uuid>,
        enrollment_id: Option<Uuid>,
    ) -> Result<Delivery, DomainError> {
        let recipient = match contact.email.as_deref().map(normalize_email) {
            Some(email) if !email.is_empty() => email,
            _ => return Ok(Delivery::Skipped("contact has no email address")),
        };
        if self.repo.is_unsubscribed(tenant_id, &recipient).await? {
            return Ok(Delivery::Suppressed);
        }

        let message_id = Uuid::new_v4();
        let tracker = SignedTracker::new(&self.signer, &self.base_url, tenant_id, message_id, &recipient)?;
        let composed = compose(
            subject,
            html_body,
            &Self::merge_context(contact, company),
            &tracker,
        );

        let mut email = self.mailer.envelope(
            &recipient,
            Some(contact.full_name()).filter(|n| !n.is_empty()),
            composed.subject.clone(),
            composed.html,
        );
        email.metadata.insert("tenant_id".into(), tenant_id.to_string());
        email.metadata.insert("message_id".into(), message_id.to_string());

        let result = self
            .mailer
            .send(&email)
            .await
            .map(|receipt| receipt.provider_message_id);
        let message = self.message(
            message_id,
            tenant_id,
            contact,
            recipient,
            Channel::Email,
            Some(composed.subject),
            self.mailer.provider_name(),
            campaign_id,
            enrollment_id,
        );
        self.record(message, result).await
    }

    /// 发送序列短信
    pub async fn deliver_sms(
        &self,
        tenant_id: Uuid,
        contact: &Contact,
        company: &str,
        body: &str,
        enrollment_id: Option<Uuid>,
    ) -> Result<Delivery, DomainError> {
        let phone = match contact.phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => phone.to_string(),
            _ => return Ok(Delivery::Skipped("contact has no phone number")),
        };
        if let Some(email) = contact.email.as_deref() {
            if self
                .repo
                .is_unsubscribed(tenant_id, &normalize_email(email))
                .await?
            {
                return Ok(Delivery::Suppressed);
            }
        }

        let text = render_merge_tags(body, &Self::merge_context(contact, company), "", false);
        let (provider, result) = match &self.sms {
            Some(sms) => (
                sms.name(),
                sms.send(&OutgoingSms {
                    to: phone.clone(),
                    body: text,
                })
                .await
                .map(|receipt| receipt.provider_message_id),
            ),
            None => ("none", Err(ProviderError::NotConfigured("sms"))),
        };
        let message = self.message(
            Uuid::new_v4(),
            tenant_id,
            contact,
            phone,
            Channel::Sms,
            None,
            provider,
            None,
            enrollment_id,
        );
        self.record(message, result).await
    }
}
