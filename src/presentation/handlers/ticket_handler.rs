// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, Query, State};
use uuid::Uuid;

use crate::application::dto::support::{
    CommentRequestDto, TicketFilterDto, TicketRequestDto, TicketUpdateRequestDto,
};
use crate::domain::models::tenant::Permission;
use crate::domain::models::ticket::{Ticket, TicketComment};
use crate::domain::services::ticket_service::Author;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

pub async fn create_ticket(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<TicketRequestDto>,
) -> ApiResult<Ticket> {
    user.require(Permission::SupportWrite)?;
    let ticket = state
        .tickets
        .create(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(ticket))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Ticket> {
    user.require(Permission::SupportRead)?;
    Ok(ApiResponse::ok(state.tickets.get(user.tenant_id, id).await?))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<TicketFilterDto>,
) -> ApiResult<Vec<Ticket>> {
    user.require(Permission::SupportRead)?;
    Ok(ApiResponse::ok(state.tickets.list(user.tenant_id, filter).await?))
}

/// 更新状态、优先级或处理人；状态变更按工单状态机校验
pub async fn update_ticket(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TicketUpdateRequestDto>,
) -> ApiResult<Ticket> {
    user.require(Permission::SupportWrite)?;
    Ok(ApiResponse::ok(
        state.tickets.update(user.tenant_id, id, payload).await?,
    ))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequestDto>,
) -> ApiResult<TicketComment> {
    user.require(Permission::SupportWrite)?;
    let comment = state
        .tickets
        .add_comment(
            user.tenant_id,
            id,
            Author::Staff(user.user_id),
            validated(payload)?,
        )
        .await?;
    Ok(ApiResponse::created(comment))
}

/// 员工可见全部评论，包括内部备注
pub async fn list_comments(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TicketComment>> {
    user.require(Permission::SupportRead)?;
    Ok(ApiResponse::ok(
        state.tickets.comments(user.tenant_id, id, true).await?,
    ))
}
