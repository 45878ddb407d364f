// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::*;
use uuid::Uuid;

use super::{parse_column, tz, utc, write_err};
use crate::domain::models::ticket::{Ticket, TicketComment};
use crate::domain::repositories::ticket_repository::{TicketQuery, TicketRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{ticket, ticket_comment};

/// 工单仓库实现
#[derive(Clone)]
pub struct TicketRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl TicketRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn ticket_active_model(ticket: &Ticket) -> ticket::ActiveModel {
    ticket::ActiveModel {
        id: Set(ticket.id),
        tenant_id: Set(ticket.tenant_id),
        number: Set(ticket.number.clone()),
        account_id: Set(ticket.account_id),
        contact_email: Set(ticket.contact_email.clone()),
        subject: Set(ticket.subject.clone()),
        description: Set(ticket.description.clone()),
        status: Set(ticket.status.as_str().to_string()),
        priority: Set(ticket.priority.as_str().to_string()),
        assignee_id: Set(ticket.assignee_id),
        channel: Set(ticket.channel.as_str().to_string()),
        sla_due_at: Set(tz(ticket.sla_due_at)),
        first_response_at: Set(ticket.first_response_at.map(tz)),
        created_at: Set(tz(ticket.created_at)),
        updated_at: Set(tz(ticket.updated_at)),
    }
}

impl TryFrom<ticket::Model> for Ticket {
    type Error = RepositoryError;

    fn try_from(model: ticket::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            number: model.number,
            account_id: model.account_id,
            contact_email: model.contact_email,
            subject: model.subject,
            description: model.description,
            status: parse_column(&model.status, "ticket status")?,
            priority: parse_column(&model.priority, "ticket priority")?,
            assignee_id: model.assignee_id,
            channel: parse_column(&model.channel, "ticket channel")?,
            sla_due_at: utc(model.sla_due_at),
            first_response_at: model.first_response_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl TryFrom<ticket_comment::Model> for TicketComment {
    type Error = RepositoryError;

    fn try_from(model: ticket_comment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            ticket_id: model.ticket_id,
            author_type: parse_column(&model.author_type, "author type")?,
            author_id: model.author_id,
            body: model.body,
            internal: model.internal,
            created_at: utc(model.created_at),
        })
    }
}

#[async_trait]
impl TicketRepository for TicketRepoImpl {
    async fn create(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError> {
        ticket::Entity::insert(ticket_active_model(ticket))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(ticket.clone())
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket, RepositoryError> {
        ticket::Entity::update(ticket_active_model(ticket))
            .filter(ticket::Column::TenantId.eq(ticket.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Ticket>, RepositoryError> {
        ticket::Entity::find_by_id(id)
            .filter(ticket::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn list(&self, tenant_id: Uuid, query: TicketQuery) -> Result<Vec<Ticket>, RepositoryError> {
        let mut select = ticket::Entity::find().filter(ticket::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = query.account_id {
            select = select.filter(ticket::Column::AccountId.eq(account_id));
        }
        if let Some(status) = query.status {
            select = select.filter(ticket::Column::Status.eq(status.as_str()));
        }
        if let Some(assignee_id) = query.assignee_id {
            select = select.filter(ticket::Column::AssigneeId.eq(assignee_id));
        }
        select
            .order_by_desc(ticket::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    async fn add_comment(&self, comment: &TicketComment) -> Result<TicketComment, RepositoryError> {
        let active_model = ticket_comment::ActiveModel {
            id: Set(comment.id),
            tenant_id: Set(comment.tenant_id),
            ticket_id: Set(comment.ticket_id),
            author_type: Set(comment.author_type.as_str().to_string()),
            author_id: Set(comment.author_id),
            body: Set(comment.body.clone()),
            internal: Set(comment.internal),
            created_at: Set(tz(comment.created_at)),
        };
        ticket_comment::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(comment.clone())
    }

    async fn list_comments(
        &self,
        tenant_id: Uuid,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>, RepositoryError> {
        let mut select = ticket_comment::Entity::find()
            .filter(ticket_comment::Column::TenantId.eq(tenant_id))
            .filter(ticket_comment::Column::TicketId.eq(ticket_id));
        if !include_internal {
            select = select.filter(ticket_comment::Column::Internal.eq(false));
        }
        select
            .order_by_asc(ticket_comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(TicketComment::try_from)
            .collect()
    }
}
