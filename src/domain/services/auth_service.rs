// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::crm_service::CrmService;
use super::ledger_service::LedgerService;
use crate::application::dto::auth::{
    CreatePortalUserRequestDto, CreateUserRequestDto, LoginRequestDto, RegisterTenantRequestDto,
    RegisterTenantResponseDto, TokenResponseDto,
};
use crate::domain::errors::DomainError;
use crate::domain::models::tenant::{normalize_email, PortalUser, Role, Tenant, User};
use crate::domain::repositories::tenant_repository::{
    PortalUserRepository, TenantRepository, UserRepository,
};
use crate::domain::repositories::RepositoryError;

/// 令牌类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Staff,
    Portal,
}

/// JWT 载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 用户ID
    pub sub: Uuid,
    pub tenant: Uuid,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// 门户用户绑定的客户
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// 认证策略
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub portal_token_ttl_minutes: i64,
    pub max_failed_logins: i32,
    pub lockout_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_minutes: 60,
            portal_token_ttl_minutes: 240,
            max_failed_logins: 5,
            lockout_minutes: 15,
            bcrypt_cost: 12,
        }
    }
}

/// 认证服务：租户注册、员工与门户登录、令牌签发与校验
pub struct AuthService {
    tenants: Arc<dyn TenantRepository>,
    users: Arc<dyn UserRepository>,
    portal_users: Arc<dyn PortalUserRepository>,
    ledger: Arc<LedgerService>,
    crm: Arc<CrmService>,
    policy: AuthPolicy,
}

impl AuthService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
        portal_users: Arc<dyn PortalUserRepository>,
        ledger: Arc<LedgerService>,
        crm: Arc<CrmService>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            tenants,
            users,
            portal_users,
            ledger,
            crm,
            policy,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let cost = self.policy.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, DomainError> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    fn sign(&self, claims: &Claims) -> Result<String, DomainError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.policy.jwt_secret.as_bytes()),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }

    fn staff_token(&self, user: &User) -> Result<TokenResponseDto, DomainError> {
        let now = Utc::now();
        let ttl = Duration::minutes(self.policy.access_token_ttl_minutes);
        let claims = Claims {
            sub: user.id,
            tenant: user.tenant_id,
            kind: TokenKind::Staff,
            role: Some(user.role),
            account: None,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(TokenResponseDto {
            access_token: self.sign(&claims)?,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    /// 校验令牌签名与有效期
    pub fn verify_token(&self, token: &str) -> Result<Claims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.policy.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| DomainError::Unauthorized)
    }

    /// 注册租户：创建租户与管理员，并写入默认科目表
    pub async fn register_tenant(
        &self,
        req: RegisterTenantRequestDto,
    ) -> Result<RegisterTenantResponseDto, DomainError> {
        let hash = self.hash_password(req.password).await?;
        let tenant = Tenant::new(req.tenant_name.trim().to_string());
        let admin = User::new(tenant.id, &req.admin_email, hash, Role::Admin);
        self.tenants.create_with_admin(&tenant, &admin).await?;
        self.ledger.seed_chart(tenant.id).await?;

        info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant registered");
        let token = self.staff_token(&admin)?;
        Ok(RegisterTenantResponseDto {
            tenant_id: tenant.id,
            user_id: admin.id,
            access_token: token.access_token,
        })
    }

    /// 员工登录
    ///
    /// 未知邮箱、停用账号与错误密码返回相同的错误；
    /// 连续失败达到上限后锁定账号。
    pub async fn login(&self, req: LoginRequestDto) -> Result<TokenResponseDto, DomainError> {
        let email = normalize_email(&req.email);
        let user = match self.users.find_by_email(req.tenant_id, &email).await? {
            Some(user) if user.active => user,
            _ => return Err(DomainError::Unauthorized),
        };
        let now = Utc::now();
        if let Some(until) = user.locked_until.filter(|until| *until > now) {
            return Err(DomainError::Locked(until));
        }

        if !self
            .verify_password(req.password, user.password_hash.clone())
            .await?
        {
            let attempts = user.failed_attempts + 1;
            if attempts >= self.policy.max_failed_logins {
                let until = now + Duration::minutes(self.policy.lockout_minutes);
                self.users
                    .update_login_state(user.tenant_id, user.id, 0, Some(until))
                    .await?;
                warn!(tenant_id = %user.tenant_id, user_id = %user.id, %until, "User locked out");
            } else {
                self.users
                    .update_login_state(user.tenant_id, user.id, attempts, None)
                    .await?;
            }
            return Err(DomainError::Unauthorized);
        }

        if user.failed_attempts != 0 || user.locked_until.is_some() {
            self.users
                .update_login_state(user.tenant_id, user.id, 0, None)
                .await?;
        }
        self.staff_token(&user)
    }

    pub async fn create_user(
        &self,
        tenant_id: Uuid,
        req: CreateUserRequestDto,
    ) -> Result<User, DomainError> {
        let hash = self.hash_password(req.password).await?;
        let user = User::new(tenant_id, &req.email, hash, req.role);
        match self.users.create(&user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "user {} already exists",
                user.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn me(&self, tenant_id: Uuid, user_id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(tenant_id, user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))
    }

    pub async fn list_users(&self, tenant_id: Uuid) -> Result<Vec<User>, DomainError> {
        Ok(self.users.list(tenant_id).await?)
    }

    pub async fn create_portal_user(
        &self,
        tenant_id: Uuid,
        req: CreatePortalUserRequestDto,
    ) -> Result<PortalUser, DomainError> {
        self.crm.get_account(tenant_id, req.account_id).await?;
        let hash = self.hash_password(req.password).await?;
        let user = PortalUser::new(tenant_id, req.account_id, &req.email, hash);
        match self.portal_users.create(&user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "portal user {} already exists",
                user.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// 门户登录，令牌携带客户ID
    pub async fn portal_login(&self, req: LoginRequestDto) -> Result<TokenResponseDto, DomainError> {
        let email = normalize_email(&req.email);
        let user = match self.portal_users.find_by_email(req.tenant_id, &email).await? {
            Some(user) if user.active => user,
            _ => return Err(DomainError::Unauthorized),
        };
        if !self
            .verify_password(req.password, user.password_hash.clone())
            .await?
        {
            return Err(DomainError::Unauthorized);
        }

        let now = Utc::now();
        let ttl = Duration::minutes(self.policy.portal_token_ttl_minutes);
        let claims = Claims {
            sub: user.id,
            tenant: user.tenant_id,
            kind: TokenKind::Portal,
            role: None,
            account: Some(user.account_id),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(TokenResponseDto {
            access_token: self.sign(&claims)?,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    pub async fn portal_user(&self, tenant_id: Uuid, id: Uuid) -> Result<PortalUser, DomainError> {
        self.portal_users
            .find_by_id(tenant_id, id)
            .await?
            .filter(|u| u.active)
            .ok_or(DomainError::Unauthorized)
    }
}
