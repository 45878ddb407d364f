// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::renewal::{Renewal, TimeEntry};

/// 续约仓库
#[async_trait]
pub trait RenewalRepository: Send + Sync {
    async fn create(&self, renewal: &Renewal) -> Result<Renewal, RepositoryError>;
    async fn update(&self, renewal: &Renewal) -> Result<Renewal, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Renewal>, RepositoryError>;
    async fn list(&self, tenant_id: Uuid, account_id: Option<Uuid>)
        -> Result<Vec<Renewal>, RepositoryError>;
    /// 续约日期不晚于 `until` 的有效续约
    async fn list_due(&self, tenant_id: Uuid, until: NaiveDate)
        -> Result<Vec<Renewal>, RepositoryError>;
}

/// 工时仓库
#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry, RepositoryError>;
    async fn set_journal_entry(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), RepositoryError>;
    async fn list(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>, RepositoryError>;
}
