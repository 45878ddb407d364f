// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::ticket::{Ticket, TicketComment, TicketStatus};

/// 工单查询参数
#[derive(Debug, Default, Clone)]
pub struct TicketQuery {
    pub account_id: Option<Uuid>,
    pub status: Option<TicketStatus>,
    pub assignee_id: Option<Uuid>,
}

/// 工单仓库
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError>;
    async fn update(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Ticket>, RepositoryError>;
    async fn list(&self, tenant_id: Uuid, query: TicketQuery) -> Result<Vec<Ticket>, RepositoryError>;

    async fn add_comment(&self, comment: &TicketComment) -> Result<TicketComment, RepositoryError>;
    /// 按时间顺序列出评论，`include_internal` 为 false 时排除内部备注
    async fn list_comments(
        &self,
        tenant_id: Uuid,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>, RepositoryError>;
}
