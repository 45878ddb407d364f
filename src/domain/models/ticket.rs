// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// 工单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// 新建
    #[default]
    New,
    /// 处理中
    Open,
    /// 等待客户
    Pending,
    /// 已解决
    Resolved,
    /// 已关闭
    Closed,
}

string_enum!(TicketStatus {
    New => "new",
    Open => "open",
    Pending => "pending",
    Resolved => "resolved",
    Closed => "closed",
});

impl TicketStatus {
    pub fn can_transition_to(&self, target: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, target),
            (New, Open | Pending | Resolved | Closed)
                | (Open, Pending | Resolved | Closed)
                | (Pending, Open | Resolved | Closed)
                | (Resolved, Closed | Open)
                | (Closed, Open)
        )
    }
}

/// 工单优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

string_enum!(TicketPriority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

impl TicketPriority {
    /// 首次响应时限
    pub fn sla(&self) -> Duration {
        match self {
            TicketPriority::Urgent => Duration::hours(4),
            TicketPriority::High => Duration::hours(8),
            TicketPriority::Normal => Duration::hours(24),
            TicketPriority::Low => Duration::hours(72),
        }
    }
}

/// 工单来源渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketChannel {
    #[default]
    Staff,
    Portal,
}

string_enum!(TicketChannel {
    Staff => "staff",
    Portal => "portal",
});

/// 工单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// 编号，格式 `TKT-{000001}`
    pub number: String,
    pub account_id: Option<Uuid>,
    pub contact_email: String,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assignee_id: Option<Uuid>,
    pub channel: TicketChannel,
    pub sla_due_at: DateTime<Utc>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: Uuid,
        number: String,
        account_id: Option<Uuid>,
        contact_email: String,
        subject: String,
        description: String,
        priority: TicketPriority,
        channel: TicketChannel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            number,
            account_id,
            contact_email,
            subject,
            description,
            status: TicketStatus::New,
            priority,
            assignee_id: None,
            channel,
            sla_due_at: now + priority.sla(),
            first_response_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, target: TicketStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::transition(self.status, target));
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// SLA 是否已违约
    pub fn sla_breached(&self, now: DateTime<Utc>) -> bool {
        match self.first_response_at {
            Some(responded) => responded > self.sla_due_at,
            None => now > self.sla_due_at,
        }
    }
}

pub fn ticket_number(sequence: i64) -> String {
    format!("TKT-{:06}", sequence)
}

/// 评论作者类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorType {
    Staff,
    Portal,
}

string_enum!(AuthorType {
    Staff => "staff",
    Portal => "portal",
});

/// 工单评论
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub ticket_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Option<Uuid>,
    pub body: String,
    /// 内部备注，门户用户不可见
    pub internal: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use TicketStatus::*;
        assert!(New.can_transition_to(Resolved));
        assert!(Pending.can_transition_to(Open));
        assert!(Resolved.can_transition_to(Open));
        assert!(Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Resolved));
        assert!(!Open.can_transition_to(New));
        assert!(!Resolved.can_transition_to(Pending));
    }

    #[test]
    fn test_sla_by_priority() {
        let ticket = Ticket::new(
            Uuid::new_v4(),
            ticket_number(7),
            None,
            "c@example.com".into(),
            "Down".into(),
            "Site is down".into(),
            TicketPriority::Urgent,
            TicketChannel::Staff,
        );
        assert_eq!(ticket.number, "TKT-000007");
        assert_eq!(ticket.sla_due_at - ticket.created_at, Duration::hours(4));
        assert!(!ticket.sla_breached(ticket.created_at + Duration::hours(3)));
        assert!(ticket.sla_breached(ticket.created_at + Duration::hours(5)));
        assert_eq!(TicketPriority::Low.sla(), Duration::hours(72));
    }
}
