// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, State};

use crate::application::dto::auth::{
    CreatePortalUserRequestDto, CreateUserRequestDto, LoginRequestDto, RegisterTenantRequestDto,
    RegisterTenantResponseDto, TokenResponseDto,
};
use crate::domain::models::tenant::{Permission, PortalUser, User};
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

/// 注册租户及其管理员
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterTenantRequestDto>,
) -> ApiResult<RegisterTenantResponseDto> {
    let registered = state.auth.register_tenant(validated(payload)?).await?;
    Ok(ApiResponse::created(registered))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequestDto>,
) -> ApiResult<TokenResponseDto> {
    Ok(ApiResponse::ok(state.auth.login(validated(payload)?).await?))
}

pub async fn portal_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequestDto>,
) -> ApiResult<TokenResponseDto> {
    Ok(ApiResponse::ok(
        state.auth.portal_login(validated(payload)?).await?,
    ))
}

pub async fn me(State(state): State<AppState>, user: StaffUser) -> ApiResult<User> {
    Ok(ApiResponse::ok(
        state.auth.me(user.tenant_id, user.user_id).await?,
    ))
}

pub async fn list_users(State(state): State<AppState>, user: StaffUser) -> ApiResult<Vec<User>> {
    user.require(Permission::UsersAdmin)?;
    Ok(ApiResponse::ok(state.auth.list_users(user.tenant_id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<CreateUserRequestDto>,
) -> ApiResult<User> {
    user.require(Permission::UsersAdmin)?;
    let created = state
        .auth
        .create_user(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(created))
}

/// 为客户开通门户账号
pub async fn create_portal_user(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<CreatePortalUserRequestDto>,
) -> ApiResult<PortalUser> {
    user.require(Permission::CrmWrite)?;
    let created = state
        .auth
        .create_portal_user(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(created))
}
