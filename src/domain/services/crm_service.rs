// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::application::dto::crm::{AccountRequestDto, ContactRequestDto, DealRequestDto};
use crate::domain::errors::DomainError;
use crate::domain::models::crm::{Account, Contact, CrmEvent, Deal, DealStage};
use crate::domain::repositories::crm_repository::CrmRepository;

/// 客户关系服务
pub struct CrmService {
    repo: Arc<dyn CrmRepository>,
}

impl CrmService {
    pub fn new(repo: Arc<dyn CrmRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_account(
        &self,
        tenant_id: Uuid,
        req: AccountRequestDto,
    ) -> Result<Account, DomainError> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            tenant_id,
            name: req.name.trim().to_string(),
            domain: req.domain.map(|d| d.trim().to_lowercase()),
            industry: req.industry,
            owner_id: req.owner_id,
            status: req.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.create_account(&account).await?)
    }

    pub async fn update_account(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: AccountRequestDto,
    ) -> Result<Account, DomainError> {
        let mut account = self.get_account(tenant_id, id).await?;
        account.name = req.name.trim().to_string();
        account.domain = req.domain.map(|d| d.trim().to_lowercase());
        account.industry = req.industry;
        account.owner_id = req.owner_id;
        if let Some(status) = req.status {
            account.status = status;
        }
        account.updated_at = Utc::now();
        Ok(self.repo.update_account(&account).await?)
    }

    pub async fn get_account(&self, tenant_id: Uuid, id: Uuid) -> Result<Account, DomainError> {
        self.repo
            .find_account(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("account"))
    }

    pub async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<Account>, DomainError> {
        Ok(self.repo.list_accounts(tenant_id).await?)
    }

    pub async fn create_contact(
        &self,
        tenant_id: Uuid,
        req: ContactRequestDto,
    ) -> Result<Contact, DomainError> {
        if let Some(account_id) = req.account_id {
            self.get_account(tenant_id, account_id).await?;
        }
        let contact = Contact {
            id: Uuid::new_v4(),
            tenant_id,
            account_id: req.account_id,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.map(|e| e.trim().to_lowercase()),
            phone: req.phone,
            title: req.title,
            created_at: Utc::now(),
        };
        Ok(self.repo.create_contact(&contact).await?)
    }

    pub async fn update_contact(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: ContactRequestDto,
    ) -> Result<Contact, DomainError> {
        let mut contact = self.get_contact(tenant_id, id).await?;
        if let Some(account_id) = req.account_id {
            self.get_account(tenant_id, account_id).await?;
        }
        contact.account_id = req.account_id;
        contact.first_name = req.first_name.trim().to_string();
        contact.last_name = req.last_name.trim().to_string();
        contact.email = req.email.map(|e| e.trim().to_lowercase());
        contact.phone = req.phone;
        contact.title = req.title;
        Ok(self.repo.update_contact(&contact).await?)
    }

    pub async fn get_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<Contact, DomainError> {
        self.repo
            .find_contact(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("contact"))
    }

    pub async fn list_contacts(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Contact>, DomainError> {
        Ok(self.repo.list_contacts(tenant_id, account_id).await?)
    }

    pub async fn find_contacts(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Contact>, DomainError> {
        Ok(self.repo.find_contacts(tenant_id, ids).await?)
    }

    pub async fn create_deal(&self, tenant_id: Uuid, req: DealRequestDto) -> Result<Deal, DomainError> {
        self.get_account(tenant_id, req.account_id).await?;
        let now = Utc::now();
        let deal = Deal {
            id: Uuid::new_v4(),
            tenant_id,
            account_id: req.account_id,
            name: req.name.trim().to_string(),
            amount: req.amount,
            stage: req.stage.unwrap_or_default(),
            expected_close: req.expected_close,
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.create_deal(&deal).await?)
    }

    pub async fn get_deal(&self, tenant_id: Uuid, id: Uuid) -> Result<Deal, DomainError> {
        self.repo
            .find_deal(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("deal"))
    }

    pub async fn list_deals(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Deal>, DomainError> {
        Ok(self.repo.list_deals(tenant_id, account_id).await?)
    }

    /// 变更商机阶段并记录历史
    pub async fn move_deal(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        stage: DealStage,
    ) -> Result<Deal, DomainError> {
        let mut deal = self.get_deal(tenant_id, id).await?;
        let from = deal.stage;
        deal.move_to(stage)?;
        let deal = self.repo.update_deal(&deal).await?;
        self.log(
            tenant_id,
            Some(deal.account_id),
            "deal",
            deal.id,
            "deal.stage_changed",
            serde_json::json!({ "from": from, "to": stage, "probability": stage.probability() }),
        )
        .await;
        Ok(deal)
    }

    /// 写入历史记录，失败只记录日志
    pub async fn log(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        entity_type: &str,
        entity_id: Uuid,
        kind: &str,
        data: Value,
    ) {
        let event = CrmEvent::new(tenant_id, account_id, entity_type, entity_id, kind, data);
        if let Err(e) = self.repo.record_event(&event).await {
            warn!(
                tenant_id = %tenant_id,
                kind,
                entity_id = %entity_id,
                error = %e,
                "Failed to record CRM history event"
            );
        }
    }

    pub async fn history(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        limit: u64,
    ) -> Result<Vec<CrmEvent>, DomainError> {
        self.get_account(tenant_id, account_id).await?;
        Ok(self.repo.list_events(tenant_id, account_id, limit).await?)
    }
}
