// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::tenant::{Permission, Role};
use crate::domain::services::auth_service::{Claims, TokenKind};
use crate::presentation::errors::AppError;

/// 当前员工
#[derive(Debug, Clone, Copy)]
pub struct StaffUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}

impl StaffUser {
    /// 校验角色是否具备权限
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(permission.to_string()).into())
        }
    }

    /// 具备任一权限即可
    pub fn require_any(&self, permissions: &[Permission]) -> Result<(), AppError> {
        match permissions.iter().find(|p| self.role.allows(**p)) {
            Some(_) => Ok(()),
            None => {
                let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
                Err(DomainError::Forbidden(names.join("|")).into())
            }
        }
    }
}

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Claims>() {
            Some(Claims {
                sub,
                tenant,
                kind: TokenKind::Staff,
                role: Some(role),
                ..
            }) => Ok(StaffUser {
                user_id: *sub,
                tenant_id: *tenant,
                role: *role,
            }),
            _ => Err(DomainError::Unauthorized.into()),
        }
    }
}

/// 当前门户用户，所有访问都限定在其绑定的客户内
#[derive(Debug, Clone, Copy)]
pub struct PortalUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
}

impl<S> FromRequestParts<S> for PortalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Claims>() {
            Some(Claims {
                sub,
                tenant,
                kind: TokenKind::Portal,
                account: Some(account),
                ..
            }) => Ok(PortalUser {
                user_id: *sub,
                tenant_id: *tenant,
                account_id: *account,
            }),
            _ => Err(DomainError::Unauthorized.into()),
        }
    }
}
