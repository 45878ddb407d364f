// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::tenant::{PortalUser, Tenant, User};

/// 租户仓库
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// 在同一事务中创建租户及其管理员
    async fn create_with_admin(&self, tenant: &Tenant, admin: &User) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError>;
}

/// 员工账号仓库
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，邮箱重复时返回 Conflict
    async fn create(&self, user: &User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, tenant_id: Uuid, email: &str)
        -> Result<Option<User>, RepositoryError>;
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<User>, RepositoryError>;
    /// 更新登录失败计数与锁定时间
    async fn update_login_state(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        failed_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
}

/// 门户账号仓库
#[async_trait]
pub trait PortalUserRepository: Send + Sync {
    async fn create(&self, user: &PortalUser) -> Result<PortalUser, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<PortalUser>, RepositoryError>;
    async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<PortalUser>, RepositoryError>;
}
