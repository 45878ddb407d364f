// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, Query, State};
use chrono::Utc;
use uuid::Uuid;

use crate::application::dto::ledger::{
    AccountActiveRequestDto, EntryQueryDto, LedgerAccountRequestDto, ManualEntryRequestDto,
    PeriodRequestDto, PeriodStatusRequestDto, ReportQueryDto, ReverseRequestDto,
};
use crate::domain::models::ledger::{
    AccountActivity, AccountingPeriod, JournalEntry, LedgerAccount, TrialBalance,
};
use crate::domain::models::tenant::Permission;
use crate::domain::repositories::ledger_repository::EntryQuery;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

// ---- chart of accounts ----

pub async fn list_accounts(
    State(state): State<AppState>,
    user: StaffUser,
) -> ApiResult<Vec<LedgerAccount>> {
    user.require(Permission::LedgerRead)?;
    Ok(ApiResponse::ok(state.ledger.list_accounts(user.tenant_id).await?))
}

pub async fn create_account(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<LedgerAccountRequestDto>,
) -> ApiResult<LedgerAccount> {
    user.require(Permission::LedgerAdmin)?;
    let payload = validated(payload)?;
    let account = state
        .ledger
        .create_account(
            user.tenant_id,
            payload.code,
            payload.name,
            payload.kind,
            payload.normal_balance,
        )
        .await?;
    Ok(ApiResponse::created(account))
}

/// 启用或停用科目；停用的科目不能再过账
pub async fn set_account_active(
    State(state): State<AppState>,
    user: StaffUser,
    Path(code): Path<String>,
    Json(payload): Json<AccountActiveRequestDto>,
) -> ApiResult<()> {
    user.require(Permission::LedgerAdmin)?;
    state
        .ledger
        .set_account_active(user.tenant_id, &code, payload.active)
        .await?;
    Ok(ApiResponse::ok(()))
}

// ---- periods ----

pub async fn list_periods(
    State(state): State<AppState>,
    user: StaffUser,
) -> ApiResult<Vec<AccountingPeriod>> {
    user.require(Permission::LedgerRead)?;
    Ok(ApiResponse::ok(state.ledger.list_periods(user.tenant_id).await?))
}

pub async fn create_period(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<PeriodRequestDto>,
) -> ApiResult<AccountingPeriod> {
    user.require(Permission::LedgerAdmin)?;
    let payload = validated(payload)?;
    let period = state
        .ledger
        .create_period(
            user.tenant_id,
            payload.name,
            payload.start_date,
            payload.end_date,
        )
        .await?;
    Ok(ApiResponse::created(period))
}

/// 关闭、重新打开或锁定期间
pub async fn transition_period(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PeriodStatusRequestDto>,
) -> ApiResult<AccountingPeriod> {
    user.require(Permission::LedgerAdmin)?;
    let period = state
        .ledger
        .transition_period(user.tenant_id, id, payload.status)
        .await?;
    Ok(ApiResponse::ok(period))
}

// ---- journal entries ----

pub async fn list_entries(
    State(state): State<AppState>,
    user: StaffUser,
    Query(query): Query<EntryQueryDto>,
) -> ApiResult<Vec<JournalEntry>> {
    user.require(Permission::LedgerRead)?;
    let query = validated(query)?;
    let entries = state
        .ledger
        .list_entries(
            user.tenant_id,
            EntryQuery {
                from: query.from,
                to: query.to,
                source_type: query.source_type,
                source_id: query.source_id,
                limit: query.limit,
            },
        )
        .await?;
    Ok(ApiResponse::ok(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<JournalEntry> {
    user.require(Permission::LedgerRead)?;
    Ok(ApiResponse::ok(state.ledger.get_entry(user.tenant_id, id).await?))
}

/// 手工凭证，与自动过账走同一套校验
pub async fn post_manual(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<ManualEntryRequestDto>,
) -> ApiResult<JournalEntry> {
    user.require(Permission::LedgerPost)?;
    let payload = validated(payload)?;
    let entry = state
        .ledger
        .post_manual(
            user.tenant_id,
            payload.entry_date,
            payload.memo,
            payload.lines,
            Some(user.user_id),
        )
        .await?;
    Ok(ApiResponse::created(entry))
}

pub async fn reverse_entry(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ReverseRequestDto>>,
) -> ApiResult<JournalEntry> {
    user.require(Permission::LedgerPost)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let entry_date = payload
        .entry_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let entry = state
        .ledger
        .reverse(user.tenant_id, id, entry_date, payload.memo, Some(user.user_id))
        .await?;
    Ok(ApiResponse::created(entry))
}

// ---- reports ----

pub async fn trial_balance(
    State(state): State<AppState>,
    user: StaffUser,
    Query(query): Query<ReportQueryDto>,
) -> ApiResult<TrialBalance> {
    user.require(Permission::LedgerRead)?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(ApiResponse::ok(
        state.ledger.trial_balance(user.tenant_id, as_of).await?,
    ))
}

pub async fn account_activity(
    State(state): State<AppState>,
    user: StaffUser,
    Path(code): Path<String>,
    Query(query): Query<ReportQueryDto>,
) -> ApiResult<AccountActivity> {
    user.require(Permission::LedgerRead)?;
    let activity = state
        .ledger
        .account_activity(user.tenant_id, &code, query.from, query.to)
        .await?;
    Ok(ApiResponse::ok(activity))
}
