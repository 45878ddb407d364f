// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::*;
use uuid::Uuid;

use super::{parse_column, tz, utc, write_err};
use crate::domain::models::crm::{Account, Contact, CrmEvent, Deal};
use crate::domain::repositories::crm_repository::CrmRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{account, contact, crm_event, deal};

/// 客户关系仓库实现
#[derive(Clone)]
pub struct CrmRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl CrmRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn account_active_model(account: &Account) -> account::ActiveModel {
    account::ActiveModel {
        id: Set(account.id),
        tenant_id: Set(account.tenant_id),
        name: Set(account.name.clone()),
        domain: Set(account.domain.clone()),
        industry: Set(account.industry.clone()),
        owner_id: Set(account.owner_id),
        status: Set(account.status.as_str().to_string()),
        created_at: Set(tz(account.created_at)),
        updated_at: Set(tz(account.updated_at)),
    }
}

impl TryFrom<account::Model> for Account {
    type Error = RepositoryError;

    fn try_from(model: account::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            domain: model.domain,
            industry: model.industry,
            owner_id: model.owner_id,
            status: parse_column(&model.status, "account status")?,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

fn contact_active_model(contact: &Contact) -> contact::ActiveModel {
    contact::ActiveModel {
        id: Set(contact.id),
        tenant_id: Set(contact.tenant_id),
        account_id: Set(contact.account_id),
        first_name: Set(contact.first_name.clone()),
        last_name: Set(contact.last_name.clone()),
        email: Set(contact.email.clone()),
        phone: Set(contact.phone.clone()),
        title: Set(contact.title.clone()),
        created_at: Set(tz(contact.created_at)),
    }
}

impl From<contact::Model> for Contact {
    fn from(model: contact::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            account_id: model.account_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            title: model.title,
            created_at: utc(model.created_at),
        }
    }
}

fn deal_active_model(deal: &Deal) -> deal::ActiveModel {
    deal::ActiveModel {
        id: Set(deal.id),
        tenant_id: Set(deal.tenant_id),
        account_id: Set(deal.account_id),
        name: Set(deal.name.clone()),
        amount: Set(deal.amount),
        stage: Set(deal.stage.as_str().to_string()),
        expected_close: Set(deal.expected_close),
        created_at: Set(tz(deal.created_at)),
        updated_at: Set(tz(deal.updated_at)),
    }
}

impl TryFrom<deal::Model> for Deal {
    type Error = RepositoryError;

    fn try_from(model: deal::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            account_id: model.account_id,
            name: model.name,
            amount: model.amount,
            stage: parse_column(&model.stage, "deal stage")?,
            expected_close: model.expected_close,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl From<crm_event::Model> for CrmEvent {
    fn from(model: crm_event::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            account_id: model.account_id,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            kind: model.kind,
            data: model.data,
            created_at: utc(model.created_at),
        }
    }
}

#[async_trait]
impl CrmRepository for CrmRepoImpl {
    async fn create_account(&self, account: &Account) -> Result<Account, RepositoryError> {
        account::Entity::insert(account_active_model(account))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(account.clone())
    }

    async fn update_account(&self, account: &Account) -> Result<Account, RepositoryError> {
        let model = account::Entity::update(account_active_model(account))
            .filter(account::Column::TenantId.eq(account.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?;
        model.try_into()
    }

    async fn find_account(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        account::Entity::find_by_id(id)
            .filter(account::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<Account>, RepositoryError> {
        account::Entity::find()
            .filter(account::Column::TenantId.eq(tenant_id))
            .order_by_asc(account::Column::Name)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn create_contact(&self, contact: &Contact) -> Result<Contact, RepositoryError> {
        contact::Entity::insert(contact_active_model(contact))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(contact.clone())
    }

    async fn update_contact(&self, contact: &Contact) -> Result<Contact, RepositoryError> {
        let model = contact::Entity::update(contact_active_model(contact))
            .filter(contact::Column::TenantId.eq(contact.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(model.into())
    }

    async fn find_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Contact>, RepositoryError> {
        let model = contact::Entity::find_by_id(id)
            .filter(contact::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_contacts(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Contact>, RepositoryError> {
        let mut query = contact::Entity::find().filter(contact::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = account_id {
            query = query.filter(contact::Column::AccountId.eq(account_id));
        }
        let models = query
            .order_by_asc(contact::Column::LastName)
            .order_by_asc(contact::Column::FirstName)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_contacts(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<Vec<Contact>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = contact::Entity::find()
            .filter(contact::Column::TenantId.eq(tenant_id))
            .filter(contact::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_deal(&self, deal: &Deal) -> Result<Deal, RepositoryError> {
        deal::Entity::insert(deal_active_model(deal))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(deal.clone())
    }

    async fn update_deal(&self, deal: &Deal) -> Result<Deal, RepositoryError> {
        let model = deal::Entity::update(deal_active_model(deal))
            .filter(deal::Column::TenantId.eq(deal.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?;
        model.try_into()
    }

    async fn find_deal(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Deal>, RepositoryError> {
        deal::Entity::find_by_id(id)
            .filter(deal::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Deal::try_from)
            .transpose()
    }

    async fn list_deals(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Deal>, RepositoryError> {
        let mut query = deal::Entity::find().filter(deal::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = account_id {
            query = query.filter(deal::Column::AccountId.eq(account_id));
        }
        query
            .order_by_desc(deal::Column::UpdatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Deal::try_from)
            .collect()
    }

    async fn record_event(&self, event: &CrmEvent) -> Result<(), RepositoryError> {
        let active_model = crm_event::ActiveModel {
            id: Set(event.id),
            tenant_id: Set(event.tenant_id),
            account_id: Set(event.account_id),
            entity_type: Set(event.entity_type.clone()),
            entity_id: Set(event.entity_id),
            kind: Set(event.kind.clone()),
            data: Set(event.data.clone()),
            created_at: Set(tz(event.created_at)),
        };
        crm_event::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn list_events(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        limit: u64,
    ) -> Result<Vec<CrmEvent>, RepositoryError> {
        let models = crm_event::Entity::find()
            .filter(crm_event::Column::TenantId.eq(tenant_id))
            .filter(crm_event::Column::AccountId.eq(account_id))
            .order_by_desc(crm_event::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
