// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::dto::crm::{
    AccountFilterDto, AccountRequestDto, ContactRequestDto, DealRequestDto, DealStageRequestDto,
};
use crate::domain::models::crm::{Account, Contact, CrmEvent, Deal};
use crate::domain::models::tenant::Permission;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

pub async fn create_account(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<AccountRequestDto>,
) -> ApiResult<Account> {
    user.require(Permission::CrmWrite)?;
    let account = state
        .crm
        .create_account(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountRequestDto>,
) -> ApiResult<Account> {
    user.require(Permission::CrmWrite)?;
    let account = state
        .crm
        .update_account(user.tenant_id, id, validated(payload)?)
        .await?;
    Ok(ApiResponse::ok(account))
}

pub async fn get_account(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Account> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.crm.get_account(user.tenant_id, id).await?))
}

pub async fn list_accounts(State(state): State<AppState>, user: StaffUser) -> ApiResult<Vec<Account>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.crm.list_accounts(user.tenant_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u64,
}

fn default_history_limit() -> u64 {
    100
}

/// 客户的业务历史（开票、收款、报价、工单等）
pub async fn account_history(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<CrmEvent>> {
    user.require(Permission::CrmRead)?;
    state.crm.get_account(user.tenant_id, id).await?;
    let events = state
        .crm
        .history(user.tenant_id, id, query.limit.clamp(1, 500))
        .await?;
    Ok(ApiResponse::ok(events))
}

pub async fn create_contact(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<ContactRequestDto>,
) -> ApiResult<Contact> {
    user.require(Permission::CrmWrite)?;
    let contact = state
        .crm
        .create_contact(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(contact))
}

pub async fn update_contact(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactRequestDto>,
) -> ApiResult<Contact> {
    user.require(Permission::CrmWrite)?;
    let contact = state
        .crm
        .update_contact(user.tenant_id, id, validated(payload)?)
        .await?;
    Ok(ApiResponse::ok(contact))
}

pub async fn get_contact(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Contact> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.crm.get_contact(user.tenant_id, id).await?))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<AccountFilterDto>,
) -> ApiResult<Vec<Contact>> {
    user.require(Permission::CrmRead)?;
    let contacts = state
        .crm
        .list_contacts(user.tenant_id, filter.account_id)
        .await?;
    Ok(ApiResponse::ok(contacts))
}

pub async fn create_deal(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<DealRequestDto>,
) -> ApiResult<Deal> {
    user.require(Permission::CrmWrite)?;
    let deal = state
        .crm
        .create_deal(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(deal))
}

pub async fn get_deal(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deal> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.crm.get_deal(user.tenant_id, id).await?))
}

pub async fn list_deals(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<AccountFilterDto>,
) -> ApiResult<Vec<Deal>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(
        state.crm.list_deals(user.tenant_id, filter.account_id).await?,
    ))
}

/// 推进商机阶段，已关闭的商机不可再变更
pub async fn move_deal(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DealStageRequestDto>,
) -> ApiResult<Deal> {
    user.require(Permission::CrmWrite)?;
    let deal = state
        .crm
        .move_deal(user.tenant_id, id, payload.stage)
        .await?;
    Ok(ApiResponse::ok(deal))
}
