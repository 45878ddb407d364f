// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::crm_service::CrmService;
use crate::application::dto::support::{
    CommentRequestDto, TicketFilterDto, TicketRequestDto, TicketUpdateRequestDto,
};
use crate::domain::errors::DomainError;
use crate::domain::models::tenant::normalize_email;
use crate::domain::models::ticket::{
    ticket_number, AuthorType, Ticket, TicketChannel, TicketComment, TicketStatus,
};
use crate::domain::repositories::sequence_repository::SequenceRepository;
use crate::domain::repositories::tenant_repository::UserRepository;
use crate::domain::repositories::ticket_repository::{TicketQuery, TicketRepository};

/// 评论作者
#[derive(Debug, Clone, Copy)]
pub enum Author {
    Staff(Uuid),
    Portal(Uuid),
}

/// 工单服务
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    sequences: Arc<dyn SequenceRepository>,
    users: Arc<dyn UserRepository>,
    crm: Arc<CrmService>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        sequences: Arc<dyn SequenceRepository>,
        users: Arc<dyn UserRepository>,
        crm: Arc<CrmService>,
    ) -> Self {
        Self {
            tickets,
            sequences,
            users,
            crm,
        }
    }

    async fn open(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        contact_email: String,
        req: TicketRequestDto,
        channel: TicketChannel,
    ) -> Result<Ticket, DomainError> {
        let seq = self.sequences.next_value(tenant_id, "ticket").await?;
        let ticket = Ticket::new(
            tenant_id,
            ticket_number(seq),
            account_id,
            normalize_email(&contact_email),
            req.subject.trim().to_string(),
            req.description,
            req.priority,
            channel,
        );
        let ticket = self.tickets.create(&ticket).await?;
        info!(
            tenant_id = %tenant_id,
            ticket = %ticket.number,
            priority = %ticket.priority,
            channel = %ticket.channel,
            "Ticket created"
        );
        self.history(&ticket, "ticket.created", json!({ "subject": ticket.subject }))
            .await;
        Ok(ticket)
    }

    /// 员工创建工单
    pub async fn create(&self, tenant_id: Uuid, req: TicketRequestDto) -> Result<Ticket, DomainError> {
        if let Some(account_id) = req.account_id {
            self.crm.get_account(tenant_id, account_id).await?;
        }
        let email = req
            .contact_email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| DomainError::validation("contact_email is required"))?;
        self.open(tenant_id, req.account_id, email, req, TicketChannel::Staff)
            .await
    }

    /// 门户创建工单，客户与联系人邮箱来自门户用户
    pub async fn create_for_portal(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        portal_email: &str,
        req: TicketRequestDto,
    ) -> Result<Ticket, DomainError> {
        self.open(
            tenant_id,
            Some(account_id),
            portal_email.to_string(),
            req,
            TicketChannel::Portal,
        )
        .await
    }

    async fn load(&self, tenant_id: Uuid, id: Uuid) -> Result<Ticket, DomainError> {
        self.tickets
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("ticket"))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Ticket, DomainError> {
        self.load(tenant_id, id).await
    }

    /// 门户只能访问本客户的工单
    pub async fn get_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        id: Uuid,
    ) -> Result<Ticket, DomainError> {
        let ticket = self.load(tenant_id, id).await?;
        if ticket.account_id != Some(account_id) {
            return Err(DomainError::NotFound("ticket"));
        }
        Ok(ticket)
    }

    pub async fn list(&self, tenant_id: Uuid, filter: TicketFilterDto) -> Result<Vec<Ticket>, DomainError> {
        let query = TicketQuery {
            account_id: filter.account_id,
            status: filter.status,
            assignee_id: filter.assignee_id,
        };
        Ok(self.tickets.list(tenant_id, query).await?)
    }

    pub async fn list_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Ticket>, DomainError> {
        let query = TicketQuery {
            account_id: Some(account_id),
            ..Default::default()
        };
        Ok(self.tickets.list(tenant_id, query).await?)
    }

    /// 更新状态、优先级或处理人
    ///
    /// 修改优先级会按创建时间重新计算 SLA 截止时间。
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: TicketUpdateRequestDto,
    ) -> Result<Ticket, DomainError> {
        let mut ticket = self.load(tenant_id, id).await?;
        let previous = ticket.status;

        if let Some(assignee_id) = req.assignee_id {
            let assignee = self
                .users
                .find_by_id(tenant_id, assignee_id)
                .await?
                .ok_or_else(|| DomainError::validation("assignee is not a user of this tenant"))?;
            ticket.assignee_id = Some(assignee.id);
        }
        if let Some(priority) = req.priority {
            ticket.priority = priority;
            ticket.sla_due_at = ticket.created_at + priority.sla();
        }
        if let Some(status) = req.status {
            if status != ticket.status {
                ticket.transition(status)?;
            }
        }
        ticket.updated_at = Utc::now();

        let ticket = self.tickets.update(&ticket).await?;
        if ticket.status != previous {
            self.history(
                &ticket,
                "ticket.status_changed",
                json!({ "from": previous, "to": ticket.status }),
            )
            .await;
        }
        Ok(ticket)
    }

    /// 添加评论
    ///
    /// 员工的首条公开评论记为首次响应；门户用户的评论总是公开，
    /// 并会把已解决或待处理的工单重新打开。
    pub async fn add_comment(
        &self,
        tenant_id: Uuid,
        ticket_id: Uuid,
        author: Author,
        req: CommentRequestDto,
    ) -> Result<TicketComment, DomainError> {
        let mut ticket = self.load(tenant_id, ticket_id).await?;
        let (author_type, author_id, internal) = match author {
            Author::Staff(id) => (AuthorType::Staff, id, req.internal),
            Author::Portal(id) => (AuthorType::Portal, id, false),
        };
        let body = req.body.trim().to_string();
        if body.is_empty() {
            return Err(DomainError::validation("comment body must not be empty"));
        }

        let comment = TicketComment {
            id: Uuid::new_v4(),
            tenant_id,
            ticket_id,
            author_type,
            author_id: Some(author_id),
            body,
            internal,
            created_at: Utc::now(),
        };
        let comment = self.tickets.add_comment(&comment).await?;

        let mut changed = false;
        if author_type == AuthorType::Staff && !internal && ticket.first_response_at.is_none() {
            ticket.first_response_at = Some(comment.created_at);
            if ticket.status == TicketStatus::New {
                ticket.transition(TicketStatus::Open)?;
            }
            changed = true;
        }
        if author_type == AuthorType::Portal
            && matches!(ticket.status, TicketStatus::Pending | TicketStatus::Resolved)
        {
            ticket.transition(TicketStatus::Open)?;
            changed = true;
        }
        if changed {
            ticket.updated_at = Utc::now();
            self.tickets.update(&ticket).await?;
        }
        Ok(comment)
    }

    /// 门户评论：校验工单归属后以门户用户身份添加公开评论
    pub async fn add_portal_comment(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        portal_user_id: Uuid,
        ticket_id: Uuid,
        req: CommentRequestDto,
    ) -> Result<TicketComment, DomainError> {
        self.get_for_account(tenant_id, account_id, ticket_id).await?;
        self.add_comment(tenant_id, ticket_id, Author::Portal(portal_user_id), req)
            .await
    }

    pub async fn comments(
        &self,
        tenant_id: Uuid,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>, DomainError> {
        self.load(tenant_id, ticket_id).await?;
        Ok(self
            .tickets
            .list_comments(tenant_id, ticket_id, include_internal)
            .await?)
    }

    async fn history(&self, ticket: &Ticket, kind: &str, data: serde_json::Value) {
        if let Some(account_id) = ticket.account_id {
            self.crm
                .log(ticket.tenant_id, Some(account_id), "ticket", ticket.id, kind, data)
                .await;
        }
    }
}
