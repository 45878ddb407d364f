// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::{parse_column, tz, utc, write_err};
use crate::domain::models::renewal::{Renewal, RenewalStatus, TimeEntry};
use crate::domain::repositories::renewal_repository::{RenewalRepository, TimeEntryRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{renewal, time_entry};

/// 续约仓库实现
#[derive(Clone)]
pub struct RenewalRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl RenewalRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn renewal_active_model(renewal: &Renewal) -> renewal::ActiveModel {
    renewal::ActiveModel {
        id: Set(renewal.id),
        tenant_id: Set(renewal.tenant_id),
        account_id: Set(renewal.account_id),
        product_id: Set(renewal.product_id),
        name: Set(renewal.name.clone()),
        amount: Set(renewal.amount),
        tax_rate_bps: Set(renewal.tax_rate_bps),
        term_months: Set(renewal.term_months),
        start_date: Set(renewal.start_date),
        renewal_date: Set(renewal.renewal_date),
        auto_renew: Set(renewal.auto_renew),
        status: Set(renewal.status.as_str().to_string()),
        billing_email: Set(renewal.billing_email.clone()),
        created_at: Set(tz(renewal.created_at)),
        updated_at: Set(tz(renewal.updated_at)),
    }
}

impl TryFrom<renewal::Model> for Renewal {
    type Error = RepositoryError;

    fn try_from(model: renewal::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            account_id: model.account_id,
            product_id: model.product_id,
            name: model.name,
            amount: model.amount,
            tax_rate_bps: model.tax_rate_bps,
            term_months: model.term_months,
            start_date: model.start_date,
            renewal_date: model.renewal_date,
            auto_renew: model.auto_renew,
            status: parse_column(&model.status, "renewal status")?,
            billing_email: model.billing_email,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

#[async_trait]
impl RenewalRepository for RenewalRepoImpl {
    async fn create(&self, renewal: &Renewal) -> Result<Renewal, RepositoryError> {
        renewal::Entity::insert(renewal_active_model(renewal))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(renewal.clone())
    }

    async fn update(&self, renewal: &Renewal) -> Result<Renewal, RepositoryError> {
        renewal::Entity::update(renewal_active_model(renewal))
            .filter(renewal::Column::TenantId.eq(renewal.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Renewal>, RepositoryError> {
        renewal::Entity::find_by_id(id)
            .filter(renewal::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Renewal::try_from)
            .transpose()
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Renewal>, RepositoryError> {
        let mut select = renewal::Entity::find().filter(renewal::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = account_id {
            select = select.filter(renewal::Column::AccountId.eq(account_id));
        }
        select
            .order_by_asc(renewal::Column::RenewalDate)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Renewal::try_from)
            .collect()
    }

    async fn list_due(&self, tenant_id: Uuid, until: NaiveDate) -> Result<Vec<Renewal>, RepositoryError> {
        renewal::Entity::find()
            .filter(renewal::Column::TenantId.eq(tenant_id))
            .filter(renewal::Column::Status.eq(RenewalStatus::Active.as_str()))
            .filter(renewal::Column::RenewalDate.lte(until))
            .order_by_asc(renewal::Column::RenewalDate)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Renewal::try_from)
            .collect()
    }
}

/// 工时仓库实现
#[derive(Clone)]
pub struct TimeEntryRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl TimeEntryRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<time_entry::Model> for TimeEntry {
    fn from(model: time_entry::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            user_id: model.user_id,
            account_id: model.account_id,
            ticket_id: model.ticket_id,
            work_date: model.work_date,
            minutes: model.minutes,
            billable: model.billable,
            bill_rate: model.bill_rate,
            cost_rate: model.cost_rate,
            description: model.description,
            journal_entry_id: model.journal_entry_id,
            created_at: utc(model.created_at),
        }
    }
}

#[async_trait]
impl TimeEntryRepository for TimeEntryRepoImpl {
    async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry, RepositoryError> {
        let active_model = time_entry::ActiveModel {
            id: Set(entry.id),
            tenant_id: Set(entry.tenant_id),
            user_id: Set(entry.user_id),
            account_id: Set(entry.account_id),
            ticket_id: Set(entry.ticket_id),
            work_date: Set(entry.work_date),
            minutes: Set(entry.minutes),
            billable: Set(entry.billable),
            bill_rate: Set(entry.bill_rate),
            cost_rate: Set(entry.cost_rate),
            description: Set(entry.description.clone()),
            journal_entry_id: Set(entry.journal_entry_id),
            created_at: Set(tz(entry.created_at)),
        };
        time_entry::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(entry.clone())
    }

    async fn set_journal_entry(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let result = time_entry::Entity::update_many()
            .col_expr(time_entry::Column::JournalEntryId, Expr::value(Some(entry_id)))
            .filter(time_entry::Column::TenantId.eq(tenant_id))
            .filter(time_entry::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let mut select = time_entry::Entity::find().filter(time_entry::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = account_id {
            select = select.filter(time_entry::Column::AccountId.eq(account_id));
        }
        if let Some(user_id) = user_id {
            select = select.filter(time_entry::Column::UserId.eq(user_id));
        }
        let models = select
            .order_by_desc(time_entry::Column::WorkDate)
            .order_by_desc(time_entry::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
