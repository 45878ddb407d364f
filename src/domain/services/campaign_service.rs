// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::crm_service::CrmService;
use super::delivery_service::{Delivery, DeliveryService};
use crate::application::dto::outreach::CampaignRequestDto;
use crate::domain::errors::DomainError;
use crate::domain::models::outreach::{
    Campaign, CampaignStats, CampaignStatus, EmailEventKind, MessageStatus,
};
use crate::domain::repositories::outreach_repository::OutreachRepository;

/// 营销活动发送结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignSendReport {
    pub sent: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// 营销活动服务
pub struct CampaignService {
    repo: Arc<dyn OutreachRepository>,
    crm: Arc<CrmService>,
    delivery: Arc<DeliveryService>,
}

impl CampaignService {
    pub fn new(
        repo: Arc<dyn OutreachRepository>,
        crm: Arc<CrmService>,
        delivery: Arc<DeliveryService>,
    ) -> Self {
        Self {
            repo,
            crm,
            delivery,
        }
    }

    pub async fn create(&self, tenant_id: Uuid, req: CampaignRequestDto) -> Result<Campaign, DomainError> {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            tenant_id,
            name: req.name.trim().to_string(),
            subject: req.subject,
            html_body: req.html_body,
            status: CampaignStatus::Draft,
            recipient_ids: req.recipient_ids,
            sent_at: None,
            created_at: Utc::now(),
        };
        Ok(self.repo.create_campaign(&campaign).await?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Campaign, DomainError> {
        self.repo
            .find_campaign(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("campaign"))
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Campaign>, DomainError> {
        Ok(self.repo.list_campaigns(tenant_id).await?)
    }

    /// 发送营销活动
    ///
    /// 活动先被标记为已发送，保证只发送一次；退订地址跳过。
    pub async fn send(&self, tenant_id: Uuid, id: Uuid) -> Result<CampaignSendReport, DomainError> {
        let mut campaign = self.get(tenant_id, id).await?;
        if campaign.status != CampaignStatus::Draft {
            return Err(DomainError::transition(campaign.status, CampaignStatus::Sent));
        }
        campaign.status = CampaignStatus::Sent;
        campaign.sent_at = Some(Utc::now());
        let campaign = self.repo.update_campaign(&campaign).await?;

        let contacts = match &campaign.recipient_ids {
            Some(ids) => self.crm.find_contacts(tenant_id, ids).await?,
            None => self.crm.list_contacts(tenant_id, None).await?,
        };
        let companies: HashMap<Uuid, String> = self
            .crm
            .list_accounts(tenant_id)
            .await?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();

        let mut report = CampaignSendReport::default();
        let mut seen = HashSet::new();
        for contact in contacts {
            // 同一邮箱只发一次
            if let Some(email) = contact.email.as_deref() {
                if !seen.insert(email.trim().to_lowercase()) {
                    continue;
                }
            }
            let company = contact
                .account_id
                .and_then(|id| companies.get(&id))
                .map(String::as_str)
                .unwrap_or_default();
            match self
                .delivery
                .deliver_email(
                    tenant_id,
                    &contact,
                    company,
                    &campaign.subject,
                    &campaign.html_body,
                    Some(campaign.id),
                    None,
                )
                .await?
            {
                Delivery::Sent(_) => report.sent += 1,
                Delivery::Suppressed => report.suppressed += 1,
                Delivery::Skipped(_) => report.skipped += 1,
                Delivery::Failed(_, _) => report.failed += 1,
            }
        }

        info!(
            tenant_id = %tenant_id,
            campaign_id = %campaign.id,
            sent = report.sent,
            suppressed = report.suppressed,
            skipped = report.skipped,
            failed = report.failed,
            "Campaign sent"
        );
        Ok(report)
    }

    /// 活动统计，各项按唯一消息计数
    pub async fn stats(&self, tenant_id: Uuid, id: Uuid) -> Result<CampaignStats, DomainError> {
        let campaign = self.get(tenant_id, id).await?;
        let messages = self
            .repo
            .list_campaign_messages(tenant_id, campaign.id)
            .await?;
        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let events = if ids.is_empty() {
            Vec::new()
        } else {
            self.repo.list_events_for_messages(tenant_id, &ids).await?
        };

        let mut unique: HashMap<EmailEventKind, HashSet<Uuid>> = HashMap::new();
        for event in &events {
            unique.entry(event.kind).or_default().insert(event.message_id);
        }
        let count = |kind: EmailEventKind| unique.get(&kind).map_or(0, |s| s.len() as u64);

        Ok(CampaignStats {
            sent: messages
                .iter()
                .filter(|m| m.status != MessageStatus::Failed)
                .count() as u64,
            delivered: count(EmailEventKind::Delivered),
            opened: count(EmailEventKind::Opened),
            clicked: count(EmailEventKind::Clicked),
            bounced: count(EmailEventKind::Bounced),
            unsubscribed: count(EmailEventKind::Unsubscribed),
        })
    }
}
