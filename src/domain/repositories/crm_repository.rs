// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::crm::{Account, Contact, CrmEvent, Deal};

/// 客户关系仓库
#[async_trait]
pub trait CrmRepository: Send + Sync {
    async fn create_account(&self, account: &Account) -> Result<Account, RepositoryError>;
    async fn update_account(&self, account: &Account) -> Result<Account, RepositoryError>;
    async fn find_account(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Account>, RepositoryError>;
    async fn list_accounts(&self, tenant_id: Uuid) -> Result<Vec<Account>, RepositoryError>;

    async fn create_contact(&self, contact: &Contact) -> Result<Contact, RepositoryError>;
    async fn update_contact(&self, contact: &Contact) -> Result<Contact, RepositoryError>;
    async fn find_contact(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Contact>, RepositoryError>;
    /// 列出联系人，可按客户过滤
    async fn list_contacts(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Contact>, RepositoryError>;
    /// 按ID批量查找联系人
    async fn find_contacts(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Contact>, RepositoryError>;

    async fn create_deal(&self, deal: &Deal) -> Result<Deal, RepositoryError>;
    async fn update_deal(&self, deal: &Deal) -> Result<Deal, RepositoryError>;
    async fn find_deal(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Deal>, RepositoryError>;
    async fn list_deals(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Deal>, RepositoryError>;

    /// 写入历史记录
    async fn record_event(&self, event: &CrmEvent) -> Result<(), RepositoryError>;
    /// 按时间倒序列出客户历史
    async fn list_events(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        limit: u64,
    ) -> Result<Vec<CrmEvent>, RepositoryError>;
}
