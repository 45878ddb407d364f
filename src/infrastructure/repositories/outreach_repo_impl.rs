// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use uuid::Uuid;

use super::{from_json, parse_column, to_json, tz, utc, write_err};
use crate::domain::models::outreach::{
    Campaign, EmailEvent, EmailMessage, EmailTemplate, Enrollment, EnrollmentStatus,
    MessageStatus, OutreachSequence,
};
use crate::domain::repositories::outreach_repository::OutreachRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{
    campaign, email_event, email_message, email_template, enrollment, outreach_sequence,
    unsubscribe,
};

/// 营销外呼仓库实现
#[derive(Clone)]
pub struct OutreachRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl OutreachRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<email_template::Model> for EmailTemplate {
    fn from(model: email_template::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            subject: model.subject,
            html_body: model.html_body,
            created_at: utc(model.created_at),
        }
    }
}

impl TryFrom<outreach_sequence::Model> for OutreachSequence {
    type Error = RepositoryError;

    fn try_from(model: outreach_sequence::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            steps: from_json(model.steps, "sequence steps")?,
            active: model.active,
            created_at: utc(model.created_at),
        })
    }
}

fn enrollment_active_model(enrollment: &Enrollment) -> enrollment::ActiveModel {
    enrollment::ActiveModel {
        id: Set(enrollment.id),
        tenant_id: Set(enrollment.tenant_id),
        sequence_id: Set(enrollment.sequence_id),
        contact_id: Set(enrollment.contact_id),
        current_step: Set(enrollment.current_step),
        status: Set(enrollment.status.as_str().to_string()),
        next_send_at: Set(enrollment.next_send_at.map(tz)),
        last_error: Set(enrollment.last_error.clone()),
        created_at: Set(tz(enrollment.created_at)),
        updated_at: Set(tz(enrollment.updated_at)),
    }
}

impl TryFrom<enrollment::Model> for Enrollment {
    type Error = RepositoryError;

    fn try_from(model: enrollment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            sequence_id: model.sequence_id,
            contact_id: model.contact_id,
            current_step: model.current_step,
            status: parse_column(&model.status, "enrollment status")?,
            next_send_at: model.next_send_at.map(utc),
            last_error: model.last_error,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

fn campaign_active_model(campaign: &Campaign) -> Result<campaign::ActiveModel, RepositoryError> {
    Ok(campaign::ActiveModel {
        id: Set(campaign.id),
        tenant_id: Set(campaign.tenant_id),
        name: Set(campaign.name.clone()),
        subject: Set(campaign.subject.clone()),
        html_body: Set(campaign.html_body.clone()),
        status: Set(campaign.status.as_str().to_string()),
        recipient_ids: Set(campaign.recipient_ids.as_ref().map(to_json).transpose()?),
        sent_at: Set(campaign.sent_at.map(tz)),
        created_at: Set(tz(campaign.created_at)),
    })
}

impl TryFrom<campaign::Model> for Campaign {
    type Error = RepositoryError;

    fn try_from(model: campaign::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            subject: model.subject,
            html_body: model.html_body,
            status: parse_column(&model.status, "campaign status")?,
            recipient_ids: model
                .recipient_ids
                .map(|ids| from_json(ids, "campaign recipients"))
                .transpose()?,
            sent_at: model.sent_at.map(utc),
            created_at: utc(model.created_at),
        })
    }
}

impl TryFrom<email_message::Model> for EmailMessage {
    type Error = RepositoryError;

    fn try_from(model: email_message::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            contact_id: model.contact_id,
            recipient: model.recipient,
            channel: parse_column(&model.channel, "message channel")?,
            subject: model.subject,
            campaign_id: model.campaign_id,
            enrollment_id: model.enrollment_id,
            provider: model.provider,
            provider_message_id: model.provider_message_id,
            status: parse_column(&model.status, "message status")?,
            created_at: utc(model.created_at),
        })
    }
}

impl TryFrom<email_event::Model> for EmailEvent {
    type Error = RepositoryError;

    fn try_from(model: email_event::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            message_id: model.message_id,
            kind: parse_column(&model.kind, "event kind")?,
            url: model.url,
            created_at: utc(model.created_at),
        })
    }
}

#[async_trait]
impl OutreachRepository for OutreachRepoImpl {
    async fn create_template(&self, template: &EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        let active_model = email_template::ActiveModel {
            id: Set(template.id),
            tenant_id: Set(template.tenant_id),
            name: Set(template.name.clone()),
            subject: Set(template.subject.clone()),
            html_body: Set(template.html_body.clone()),
            created_at: Set(tz(template.created_at)),
        };
        email_template::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(template.clone())
    }

    async fn find_template(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<EmailTemplate>, RepositoryError> {
        let model = email_template::Entity::find_by_id(id)
            .filter(email_template::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_templates(&self, tenant_id: Uuid) -> Result<Vec<EmailTemplate>, RepositoryError> {
        let models = email_template::Entity::find()
            .filter(email_template::Column::TenantId.eq(tenant_id))
            .order_by_asc(email_template::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_sequence(
        &self,
        sequence: &OutreachSequence,
    ) -> Result<OutreachSequence, RepositoryError> {
        let active_model = outreach_sequence::ActiveModel {
            id: Set(sequence.id),
            tenant_id: Set(sequence.tenant_id),
            name: Set(sequence.name.clone()),
            steps: Set(to_json(&sequence.steps)?),
            active: Set(sequence.active),
            created_at: Set(tz(sequence.created_at)),
        };
        outreach_sequence::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(sequence.clone())
    }

    async fn find_sequence(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<OutreachSequence>, RepositoryError> {
        outreach_sequence::Entity::find_by_id(id)
            .filter(outreach_sequence::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(OutreachSequence::try_from)
            .transpose()
    }

    async fn list_sequences(&self, tenant_id: Uuid) -> Result<Vec<OutreachSequence>, RepositoryError> {
        outreach_sequence::Entity::find()
            .filter(outreach_sequence::Column::TenantId.eq(tenant_id))
            .order_by_asc(outreach_sequence::Column::Name)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(OutreachSequence::try_from)
            .collect()
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment, RepositoryError> {
        enrollment::Entity::insert(enrollment_active_model(enrollment))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(enrollment.clone())
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment, RepositoryError> {
        enrollment::Entity::update(enrollment_active_model(enrollment))
            .filter(enrollment::Column::TenantId.eq(enrollment.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_enrollment(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        enrollment::Entity::find_by_id(id)
            .filter(enrollment::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Enrollment::try_from)
            .transpose()
    }

    async fn find_active_enrollment(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        enrollment::Entity::find()
            .filter(enrollment::Column::TenantId.eq(tenant_id))
            .filter(enrollment::Column::SequenceId.eq(sequence_id))
            .filter(enrollment::Column::ContactId.eq(contact_id))
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active.as_str()))
            .one(self.db.as_ref())
            .await?
            .map(Enrollment::try_from)
            .transpose()
    }

    async fn list_enrollments(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        enrollment::Entity::find()
            .filter(enrollment::Column::TenantId.eq(tenant_id))
            .filter(enrollment::Column::SequenceId.eq(sequence_id))
            .order_by_asc(enrollment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Enrollment::try_from)
            .collect()
    }

    async fn due_enrollments(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        enrollment::Entity::find()
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active.as_str()))
            .filter(enrollment::Column::NextSendAt.lte(tz(now)))
            .order_by_asc(enrollment::Column::NextSendAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Enrollment::try_from)
            .collect()
    }

    async fn create_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        campaign::Entity::insert(campaign_active_model(campaign)?)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(campaign.clone())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        campaign::Entity::update(campaign_active_model(campaign)?)
            .filter(campaign::Column::TenantId.eq(campaign.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_campaign(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Campaign>, RepositoryError> {
        campaign::Entity::find_by_id(id)
            .filter(campaign::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Campaign::try_from)
            .transpose()
    }

    async fn list_campaigns(&self, tenant_id: Uuid) -> Result<Vec<Campaign>, RepositoryError> {
        campaign::Entity::find()
            .filter(campaign::Column::TenantId.eq(tenant_id))
            .order_by_desc(campaign::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Campaign::try_from)
            .collect()
    }

    async fn create_message(&self, message: &EmailMessage) -> Result<EmailMessage, RepositoryError> {
        let active_model = email_message::ActiveModel {
            id: Set(message.id),
            tenant_id: Set(message.tenant_id),
            contact_id: Set(message.contact_id),
            recipient: Set(message.recipient.clone()),
            channel: Set(message.channel.as_str().to_string()),
            subject: Set(message.subject.clone()),
            campaign_id: Set(message.campaign_id),
            enrollment_id: Set(message.enrollment_id),
            provider: Set(message.provider.clone()),
            provider_message_id: Set(message.provider_message_id.clone()),
            status: Set(message.status.as_str().to_string()),
            created_at: Set(tz(message.created_at)),
        };
        email_message::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(message.clone())
    }

    async fn find_message(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<EmailMessage>, RepositoryError> {
        email_message::Entity::find_by_id(id)
            .filter(email_message::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(EmailMessage::try_from)
            .transpose()
    }

    async fn find_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailMessage>, RepositoryError> {
        email_message::Entity::find()
            .filter(email_message::Column::ProviderMessageId.eq(provider_message_id))
            .one(self.db.as_ref())
            .await?
            .map(EmailMessage::try_from)
            .transpose()
    }

    async fn update_message_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<(), RepositoryError> {
        let result = email_message::Entity::update_many()
            .col_expr(email_message::Column::Status, Expr::value(status.as_str()))
            .filter(email_message::Column::TenantId.eq(tenant_id))
            .filter(email_message::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_campaign_messages(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<Vec<EmailMessage>, RepositoryError> {
        email_message::Entity::find()
            .filter(email_message::Column::TenantId.eq(tenant_id))
            .filter(email_message::Column::CampaignId.eq(campaign_id))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(EmailMessage::try_from)
            .collect()
    }

    async fn record_event(&self, event: &EmailEvent) -> Result<(), RepositoryError> {
        let active_model = email_event::ActiveModel {
            id: Set(event.id),
            tenant_id: Set(event.tenant_id),
            message_id: Set(event.message_id),
            kind: Set(event.kind.as_str().to_string()),
            url: Set(event.url.clone()),
            created_at: Set(tz(event.created_at)),
        };
        email_event::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn list_events_for_messages(
        &self,
        tenant_id: Uuid,
        message_ids: &[Uuid],
    ) -> Result<Vec<EmailEvent>, RepositoryError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }
        email_event::Entity::find()
            .filter(email_event::Column::TenantId.eq(tenant_id))
            .filter(email_event::Column::MessageId.is_in(message_ids.iter().copied()))
            .order_by_asc(email_event::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(EmailEvent::try_from)
            .collect()
    }

    async fn add_unsubscribe(
        &self,
        tenant_id: Uuid,
        email: &str,
        reason: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let active_model = unsubscribe::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            email: Set(email.to_string()),
            reason: Set(reason.map(str::to_string)),
            created_at: Set(tz(Utc::now())),
        };
        unsubscribe::Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([unsubscribe::Column::TenantId, unsubscribe::Column::Email])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn is_unsubscribed(&self, tenant_id: Uuid, email: &str) -> Result<bool, RepositoryError> {
        let count = unsubscribe::Entity::find()
            .filter(unsubscribe::Column::TenantId.eq(tenant_id))
            .filter(unsubscribe::Column::Email.eq(email))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}
