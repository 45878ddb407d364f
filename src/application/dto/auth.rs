// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::tenant::Role;

/// 注册租户请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterTenantRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub tenant_name: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// 登录请求DTO，员工与门户共用
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequestDto {
    pub tenant_id: Uuid,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// 创建员工请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateUserRequestDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
}

/// 创建门户账号请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreatePortalUserRequestDto {
    pub account_id: Uuid,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// 令牌响应DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponseDto {
    pub access_token: String,
    pub token_type: String,
    /// 有效期（秒）
    pub expires_in: i64,
}

/// 注册租户响应DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterTenantResponseDto {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
}
