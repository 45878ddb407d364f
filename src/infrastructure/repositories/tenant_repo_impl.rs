// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::{parse_column, tz, utc, write_err};
use crate::domain::models::tenant::{PortalUser, Tenant, User};
use crate::domain::repositories::tenant_repository::{
    PortalUserRepository, TenantRepository, UserRepository,
};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{portal_user, tenant, user};

/// 租户仓库实现
#[derive(Clone)]
pub struct TenantRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl TenantRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn user_active_model(user: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(user.id),
        tenant_id: Set(user.tenant_id),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_string()),
        active: Set(user.active),
        failed_attempts: Set(user.failed_attempts),
        locked_until: Set(user.locked_until.map(tz)),
        created_at: Set(tz(user.created_at)),
        updated_at: Set(tz(user.updated_at)),
    }
}

impl TryFrom<user::Model> for User {
    type Error = RepositoryError;

    fn try_from(model: user::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            email: model.email,
            password_hash: model.password_hash,
            role: parse_column(&model.role, "role")?,
            active: model.active,
            failed_attempts: model.failed_attempts,
            locked_until: model.locked_until.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl From<portal_user::Model> for PortalUser {
    fn from(model: portal_user::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            account_id: model.account_id,
            email: model.email,
            password_hash: model.password_hash,
            active: model.active,
            created_at: utc(model.created_at),
        }
    }
}

#[async_trait]
impl TenantRepository for TenantRepoImpl {
    async fn create_with_admin(&self, tenant: &Tenant, admin: &User) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        tenant::Entity::insert(tenant::ActiveModel {
            id: Set(tenant.id),
            name: Set(tenant.name.clone()),
            created_at: Set(tz(tenant.created_at)),
        })
        .exec_without_returning(&txn)
        .await
        .map_err(write_err)?;
        user::Entity::insert(user_active_model(admin))
            .exec_without_returning(&txn)
            .await
            .map_err(write_err)?;
        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        let model = tenant::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(|m| Tenant {
            id: m.id,
            name: m.name,
            created_at: utc(m.created_at),
        }))
    }
}

/// 员工账号仓库实现
#[derive(Clone)]
pub struct UserRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl UserRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserRepoImpl {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        user::Entity::insert(user_active_model(user))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(user.clone())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<User>, RepositoryError> {
        user::Entity::find_by_id(id)
            .filter(user::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        user::Entity::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        user::Entity::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .order_by_asc(user::Column::Email)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_login_state(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        failed_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::FailedAttempts, Expr::value(failed_attempts))
            .col_expr(user::Column::LockedUntil, Expr::value(locked_until.map(tz)))
            .col_expr(user::Column::UpdatedAt, Expr::value(tz(Utc::now())))
            .filter(user::Column::TenantId.eq(tenant_id))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// 门户账号仓库实现
#[derive(Clone)]
pub struct PortalUserRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl PortalUserRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PortalUserRepository for PortalUserRepoImpl {
    async fn create(&self, user: &PortalUser) -> Result<PortalUser, RepositoryError> {
        let active_model = portal_user::ActiveModel {
            id: Set(user.id),
            tenant_id: Set(user.tenant_id),
            account_id: Set(user.account_id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            active: Set(user.active),
            created_at: Set(tz(user.created_at)),
        };
        portal_user::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(user.clone())
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PortalUser>, RepositoryError> {
        let model = portal_user::Entity::find_by_id(id)
            .filter(portal_user::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<PortalUser>, RepositoryError> {
        let model = portal_user::Entity::find()
            .filter(portal_user::Column::TenantId.eq(tenant_id))
            .filter(portal_user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
