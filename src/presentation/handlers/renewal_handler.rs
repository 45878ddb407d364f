// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::dto::billing::{
    RecognizeRequestDto, RenewalRequestDto, TimeEntryRequestDto, UpcomingQueryDto,
};
use crate::application::dto::crm::AccountFilterDto;
use crate::domain::models::invoice::Invoice;
use crate::domain::models::ledger::JournalEntry;
use crate::domain::models::renewal::{Renewal, TimeEntry};
use crate::domain::models::tenant::Permission;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
pub struct RenewResponse {
    pub renewal: Renewal,
    pub invoice: Invoice,
}

pub async fn create_renewal(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<RenewalRequestDto>,
) -> ApiResult<Renewal> {
    user.require(Permission::BillingWrite)?;
    let renewal = state
        .renewals
        .create(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(renewal))
}

pub async fn get_renewal(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Renewal> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(state.renewals.get(user.tenant_id, id).await?))
}

pub async fn list_renewals(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<AccountFilterDto>,
) -> ApiResult<Vec<Renewal>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.renewals.list(user.tenant_id, filter.account_id).await?,
    ))
}

/// 指定天数内到期的有效续约
pub async fn upcoming_renewals(
    State(state): State<AppState>,
    user: StaffUser,
    Query(query): Query<UpcomingQueryDto>,
) -> ApiResult<Vec<Renewal>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.renewals.upcoming(user.tenant_id, query.days).await?,
    ))
}

/// 续约：开具并签发续约发票，顺延续约日期
pub async fn renew(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<RenewResponse> {
    user.require(Permission::BillingWrite)?;
    let (renewal, invoice) = state
        .renewals
        .renew(user.tenant_id, id, Some(user.user_id))
        .await?;
    Ok(ApiResponse::created(RenewResponse { renewal, invoice }))
}

pub async fn recognize_revenue(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecognizeRequestDto>,
) -> ApiResult<JournalEntry> {
    user.require(Permission::LedgerPost)?;
    let entry = state
        .renewals
        .recognize(user.tenant_id, id, validated(payload)?, Some(user.user_id))
        .await?;
    Ok(ApiResponse::created(entry))
}

pub async fn cancel_renewal(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Renewal> {
    user.require(Permission::BillingWrite)?;
    Ok(ApiResponse::ok(state.renewals.cancel(user.tenant_id, id).await?))
}

// ---- time entries ----

#[derive(Debug, Default, Deserialize)]
pub struct TimeEntryQuery {
    pub account_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// 登记工时，记在当前员工名下并自动过账
pub async fn log_time(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<TimeEntryRequestDto>,
) -> ApiResult<TimeEntry> {
    user.require_any(&[Permission::CrmWrite, Permission::SupportWrite])?;
    let entry = state
        .time_entries
        .log(user.tenant_id, user.user_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(entry))
}

pub async fn list_time(
    State(state): State<AppState>,
    user: StaffUser,
    Query(query): Query<TimeEntryQuery>,
) -> ApiResult<Vec<TimeEntry>> {
    user.require(Permission::CrmRead)?;
    let entries = state
        .time_entries
        .list(user.tenant_id, query.account_id, query.user_id)
        .await?;
    Ok(ApiResponse::ok(entries))
}
