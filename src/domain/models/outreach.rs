// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// 邮件模板
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub subject: String,
    /// HTML 正文，支持 `{{first_name}}` 等合并标签
    pub html_body: String,
    pub created_at: DateTime<Utc>,
}

/// 触达渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Email,
    Sms,
}

string_enum!(Channel {
    Email => "email",
    Sms => "sms",
});

/// 序列中的一个步骤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub channel: Channel,
    /// 距上一步（或入组）的延迟天数
    pub delay_days: i64,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub sms_body: Option<String>,
}

impl SequenceStep {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.delay_days < 0 {
            return Err(DomainError::validation("delay_days must not be negative"));
        }
        match self.channel {
            Channel::Email if self.template_id.is_none() => Err(DomainError::validation(
                "email steps require a template_id",
            )),
            Channel::Sms if self.sms_body.as_deref().map_or(true, |b| b.trim().is_empty()) => {
                Err(DomainError::validation("sms steps require an sms_body"))
            }
            _ => Ok(()),
        }
    }
}

/// 外呼序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachSequence {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub steps: Vec<SequenceStep>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// 入组状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    /// 联系人已退订
    Stopped,
    Cancelled,
}

string_enum!(EnrollmentStatus {
    Active => "active",
    Completed => "completed",
    Stopped => "stopped",
    Cancelled => "cancelled",
});

/// 联系人在序列中的进度
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub sequence_id: Uuid,
    pub contact_id: Uuid,
    /// 下一个待发送步骤的下标
    pub current_step: i32,
    pub status: EnrollmentStatus,
    pub next_send_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(
        tenant_id: Uuid,
        sequence: &OutreachSequence,
        contact_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let first = sequence
            .steps
            .first()
            .ok_or_else(|| DomainError::validation("sequence has no steps"))?;
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            sequence_id: sequence.id,
            contact_id,
            current_step: 0,
            status: EnrollmentStatus::Active,
            next_send_at: Some(now + Duration::days(first.delay_days)),
            last_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// 当前步骤发送成功后推进到下一步，没有后续步骤时完成
    pub fn advance(&mut self, steps: &[SequenceStep], now: DateTime<Utc>) {
        let next = self.current_step as usize + 1;
        self.current_step = next as i32;
        self.last_error = None;
        self.updated_at = now;
        match steps.get(next) {
            Some(step) => self.next_send_at = Some(now + Duration::days(step.delay_days)),
            None => {
                self.status = EnrollmentStatus::Completed;
                self.next_send_at = None;
            }
        }
    }

    /// 本步骤发送失败，记录原因并推迟到 `now + delay` 再试
    pub fn defer(&mut self, error: impl Into<String>, now: DateTime<Utc>, delay: Duration) {
        self.last_error = Some(error.into());
        self.next_send_at = Some(now + delay);
        self.updated_at = now;
    }

    pub fn stop(&mut self, status: EnrollmentStatus, now: DateTime<Utc>) {
        self.status = status;
        self.next_send_at = None;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Sent,
}

string_enum!(CampaignStatus {
    Draft => "draft",
    Sent => "sent",
});

/// 营销活动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub subject: String,
    pub html_body: String,
    pub status: CampaignStatus,
    /// 指定的收件联系人，为空时发送给所有有邮箱的联系人
    pub recipient_ids: Option<Vec<Uuid>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 已发送消息状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Bounced,
    Failed,
}

string_enum!(MessageStatus {
    Sent => "sent",
    Delivered => "delivered",
    Bounced => "bounced",
    Failed => "failed",
});

/// 已发送的邮件或短信
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub recipient: String,
    pub channel: Channel,
    pub subject: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub enrollment_id: Option<Uuid>,
    pub provider: String,
    pub provider_message_id: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

/// 邮件事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailEventKind {
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Unsubscribed,
    Failed,
}

string_enum!(EmailEventKind {
    Delivered => "delivered",
    Opened => "opened",
    Clicked => "clicked",
    Bounced => "bounced",
    Unsubscribed => "unsubscribed",
    Failed => "failed",
});

/// 邮件事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub message_id: Uuid,
    pub kind: EmailEventKind,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailEvent {
    pub fn new(tenant_id: Uuid, message_id: Uuid, kind: EmailEventKind, url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            message_id,
            kind,
            url,
            created_at: Utc::now(),
        }
    }
}

/// 营销活动统计，按唯一消息计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub sent: u64,
    pub delivered: u64,
    pub opened: u64,
    pub clicked: u64,
    pub bounced: u64,
    pub unsubscribed: u64,
}

/// 追踪令牌负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingClaims {
    /// 租户
    pub t: Uuid,
    /// 消息
    pub m: Uuid,
    /// 点击目标地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u: Option<String>,
}

/// 退订令牌负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeClaims {
    pub t: Uuid,
    pub e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(delays: &[i64]) -> OutreachSequence {
        OutreachSequence {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Onboarding".into(),
            steps: delays
                .iter()
                .map(|d| SequenceStep {
                    channel: Channel::Email,
                    delay_days: *d,
                    template_id: Some(Uuid::new_v4()),
                    sms_body: None,
                })
                .collect(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_enrollment_schedule() {
        let seq = sequence(&[0, 3]);
        let now = Utc::now();
        let mut enrollment = Enrollment::new(seq.tenant_id, &seq, Uuid::new_v4(), now).unwrap();
        assert_eq!(enrollment.next_send_at, Some(now));

        let later = now + Duration::hours(1);
        enrollment.advance(&seq.steps, later);
        assert_eq!(enrollment.current_step, 1);
        assert_eq!(enrollment.next_send_at, Some(later + Duration::days(3)));

        enrollment.advance(&seq.steps, later);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert_eq!(enrollment.next_send_at, None);
    }

    #[test]
    fn test_failed_step_is_deferred() {
        let seq = sequence(&[0, 3]);
        let now = Utc::now();
        let mut enrollment = Enrollment::new(seq.tenant_id, &seq, Uuid::new_v4(), now).unwrap();

        enrollment.defer("mailbox unavailable", now, Duration::minutes(15));
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert_eq!(enrollment.current_step, 0);
        assert_eq!(enrollment.next_send_at, Some(now + Duration::minutes(15)));
        assert_eq!(enrollment.last_error.as_deref(), Some("mailbox unavailable"));

        // 成功发送后清除错误
        enrollment.advance(&seq.steps, now + Duration::minutes(15));
        assert_eq!(enrollment.last_error, None);
    }

    #[test]
    fn test_empty_sequence_cannot_enroll() {
        let seq = sequence(&[]);
        assert!(Enrollment::new(seq.tenant_id, &seq, Uuid::new_v4(), Utc::now()).is_err());
    }

    #[test]
    fn test_step_validation() {
        let sms = SequenceStep {
            channel: Channel::Sms,
            delay_days: 1,
            template_id: None,
            sms_body: Some(" ".into()),
        };
        assert!(sms.validate().is_err());
        let email = SequenceStep {
            channel: Channel::Email,
            delay_days: 1,
            template_id: None,
            sms_body: None,
        };
        assert!(email.validate().is_err());
    }
}
