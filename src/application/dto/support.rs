// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::ticket::{TicketPriority, TicketStatus};

/// 工单创建请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TicketRequestDto {
    pub account_id: Option<Uuid>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub subject: String,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

/// 工单更新请求DTO
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TicketUpdateRequestDto {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<Uuid>,
}

/// 工单评论请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CommentRequestDto {
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
    #[serde(default)]
    pub internal: bool,
}

/// 工单过滤参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TicketFilterDto {
    pub account_id: Option<Uuid>,
    pub status: Option<TicketStatus>,
    pub assignee_id: Option<Uuid>,
}
