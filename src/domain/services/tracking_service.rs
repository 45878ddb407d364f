// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::outreach::{
    EmailEvent, EmailEventKind, EmailMessage, MessageStatus, TrackingClaims, UnsubscribeClaims,
};
use crate::domain::models::tenant::normalize_email;
use crate::domain::repositories::outreach_repository::OutreachRepository;
use crate::utils::tokens::TokenSigner;

/// 渠道投递回调解析后的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    /// 发送时透传的租户与消息ID
    pub tenant_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
    /// 渠道侧消息ID
    pub provider_message_id: Option<String>,
    pub kind: EmailEventKind,
    pub url: Option<String>,
    pub email: Option<String>,
}

/// 邮件追踪服务：打开、点击、退订与渠道回调
pub struct TrackingService {
    repo: Arc<dyn OutreachRepository>,
    signer: TokenSigner,
}

impl TrackingService {
    pub fn new(repo: Arc<dyn OutreachRepository>, signer: TokenSigner) -> Self {
        Self { repo, signer }
    }

    async fn message(&self, tenant_id: Uuid, message_id: Uuid) -> Result<Option<EmailMessage>, DomainError> {
        Ok(self.repo.find_message(tenant_id, message_id).await?)
    }

    /// 记录打开，令牌无效时静默忽略
    pub async fn record_open(&self, token: &str) -> Result<(), DomainError> {
        let Some(claims) = self.signer.verify::<TrackingClaims>(token) else {
            debug!("Ignoring open with invalid token");
            return Ok(());
        };
        if self.message(claims.t, claims.m).await?.is_some() {
            self.repo
                .record_event(&EmailEvent::new(claims.t, claims.m, EmailEventKind::Opened, None))
                .await?;
        }
        Ok(())
    }

    /// 记录点击并返回跳转地址
    pub async fn record_click(&self, token: &str) -> Result<String, DomainError> {
        let claims = self
            .signer
            .verify::<TrackingClaims>(token)
            .ok_or(DomainError::NotFound("tracking link"))?;
        let url = claims.u.ok_or(DomainError::NotFound("tracking link"))?;
        if self.message(claims.t, claims.m).await?.is_some() {
            self.repo
                .record_event(&EmailEvent::new(
                    claims.t,
                    claims.m,
                    EmailEventKind::Clicked,
                    Some(url.clone()),
                ))
                .await?;
        }
        Ok(url)
    }

    /// 退订，返回被退订的邮箱
    pub async fn unsubscribe(&self, token: &str) -> Result<String, DomainError> {
        let claims = self
            .signer
            .verify::<UnsubscribeClaims>(token)
            .ok_or(DomainError::NotFound("unsubscribe link"))?;
        let email = normalize_email(&claims.e);
        self.repo
            .add_unsubscribe(claims.t, &email, Some("link"))
            .await?;
        if let Some(message_id) = claims.m {
            if self.message(claims.t, message_id).await?.is_some() {
                self.repo
                    .record_event(&EmailEvent::new(
                        claims.t,
                        message_id,
                        EmailEventKind::Unsubscribed,
                        None,
                    ))
                    .await?;
            }
        }
        info!(tenant_id = %claims.t, "Recipient unsubscribed");
        Ok(email)
    }

    /// 应用渠道投递回调，返回匹配到消息的事件数
    pub async fn apply_provider_events(&self, events: Vec<ProviderEvent>) -> Result<usize, DomainError> {
        let mut applied = 0;
        for event in events {
            let message = match (event.tenant_id, event.message_id) {
                (Some(tenant_id), Some(message_id)) => self.message(tenant_id, message_id).await?,
                _ => None,
            };
            let message = match (message, event.provider_message_id.as_deref()) {
                (Some(message), _) => Some(message),
                (None, Some(provider_id)) => self.repo.find_message_by_provider_id(provider_id).await?,
                (None, None) => None,
            };
            let Some(message) = message else {
                debug!(kind = %event.kind, "Provider event does not match a known message");
                continue;
            };

            self.repo
                .record_event(&EmailEvent::new(
                    message.tenant_id,
                    message.id,
                    event.kind,
                    event.url.clone(),
                ))
                .await?;

            let status = match event.kind {
                EmailEventKind::Delivered if message.status == MessageStatus::Sent => {
                    Some(MessageStatus::Delivered)
                }
                EmailEventKind::Bounced => Some(MessageStatus::Bounced),
                EmailEventKind::Failed => Some(MessageStatus::Failed),
                _ => None,
            };
            if let Some(status) = status {
                self.repo
                    .update_message_status(message.tenant_id, message.id, status)
                    .await?;
            }
            if event.kind == EmailEventKind::Unsubscribed {
                let email = event
                    .email
                    .as_deref()
                    .map(normalize_email)
                    .unwrap_or_else(|| message.recipient.clone());
                self.repo
                    .add_unsubscribe(message.tenant_id, &email, Some("provider"))
                    .await?;
            }
            applied += 1;
        }
        Ok(applied)
    }
}
