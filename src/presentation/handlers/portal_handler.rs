// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 客户门户
//!
//! 所有查询都限定在门户用户绑定的客户内，访问其他客户的单据一律返回 404。

use axum::extract::{Json, Path, State};
use uuid::Uuid;

use crate::application::dto::support::{CommentRequestDto, TicketRequestDto};
use crate::domain::models::invoice::InvoiceView;
use crate::domain::models::quote::{Quote, QuoteDecision};
use crate::domain::models::tenant;
use crate::domain::models::ticket::{Ticket, TicketComment};
use crate::presentation::extractors::auth_user::PortalUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

pub async fn me(State(state): State<AppState>, user: PortalUser) -> ApiResult<tenant::PortalUser> {
    Ok(ApiResponse::ok(
        state.auth.portal_user(user.tenant_id, user.user_id).await?,
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: PortalUser,
) -> ApiResult<Vec<InvoiceView>> {
    let invoices = state
        .invoices
        .list_for_account(user.tenant_id, user.account_id)
        .await?;
    Ok(ApiResponse::ok(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceView> {
    let invoice = state
        .invoices
        .get_for_account(user.tenant_id, user.account_id, id)
        .await?;
    Ok(ApiResponse::ok(invoice))
}

pub async fn list_quotes(State(state): State<AppState>, user: PortalUser) -> ApiResult<Vec<Quote>> {
    let quotes = state
        .quotes
        .list_for_account(user.tenant_id, user.account_id)
        .await?;
    Ok(ApiResponse::ok(quotes))
}

pub async fn accept_quote(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    let quote = state
        .quotes
        .decide_for_account(user.tenant_id, user.account_id, id, QuoteDecision::Accept)
        .await?;
    Ok(ApiResponse::ok(quote))
}

pub async fn decline_quote(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    let quote = state
        .quotes
        .decide_for_account(user.tenant_id, user.account_id, id, QuoteDecision::Decline)
        .await?;
    Ok(ApiResponse::ok(quote))
}

pub async fn list_tickets(State(state): State<AppState>, user: PortalUser) -> ApiResult<Vec<Ticket>> {
    let tickets = state
        .tickets
        .list_for_account(user.tenant_id, user.account_id)
        .await?;
    Ok(ApiResponse::ok(tickets))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Ticket> {
    let ticket = state
        .tickets
        .get_for_account(user.tenant_id, user.account_id, id)
        .await?;
    Ok(ApiResponse::ok(ticket))
}

/// 门户工单，联系人邮箱取自门户账号
pub async fn create_ticket(
    State(state): State<AppState>,
    user: PortalUser,
    Json(payload): Json<TicketRequestDto>,
) -> ApiResult<Ticket> {
    let portal_user = state.auth.portal_user(user.tenant_id, user.user_id).await?;
    let ticket = state
        .tickets
        .create_for_portal(
            user.tenant_id,
            user.account_id,
            &portal_user.email,
            validated(payload)?,
        )
        .await?;
    Ok(ApiResponse::created(ticket))
}

/// 门户只能看到公开评论
pub async fn list_comments(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TicketComment>> {
    state
        .tickets
        .get_for_account(user.tenant_id, user.account_id, id)
        .await?;
    Ok(ApiResponse::ok(
        state.tickets.comments(user.tenant_id, id, false).await?,
    ))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: PortalUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequestDto>,
) -> ApiResult<TicketComment> {
    let comment = state
        .tickets
        .add_portal_comment(
            user.tenant_id,
            user.account_id,
            user.user_id,
            id,
            validated(payload)?,
        )
        .await?;
    Ok(ApiResponse::created(comment))
}
