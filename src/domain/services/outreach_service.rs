// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::crm_service::CrmService;
use super::delivery_service::{Delivery, DeliveryService};
use crate::application::dto::outreach::{SequenceRequestDto, TemplateRequestDto};
use crate::domain::errors::DomainError;
use crate::domain::models::outreach::{
    Channel, EmailTemplate, Enrollment, EnrollmentStatus, OutreachSequence,
};
use crate::domain::repositories::outreach_repository::OutreachRepository;

/// 一轮序列处理的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub sent: usize,
    pub completed: usize,
    pub stopped: usize,
    pub failed: usize,
}

/// 发送失败后的默认重试间隔（秒）
const DEFAULT_RETRY_DELAY_SECS: u64 = 900;
/// 重试间隔上限（秒）
const MAX_RETRY_DELAY_SECS: u64 = 7 * 24 * 3600;

/// 外呼序列服务
pub struct OutreachService {
    repo: Arc<dyn OutreachRepository>,
    crm: Arc<CrmService>,
    delivery: Arc<DeliveryService>,
    retry_delay: Duration,
}

impl OutreachService {
    pub fn new(
        repo: Arc<dyn OutreachRepository>,
        crm: Arc<CrmService>,
        delivery: Arc<DeliveryService>,
    ) -> Self {
        Self {
            repo,
            crm,
            delivery,
            retry_delay: Duration::seconds(DEFAULT_RETRY_DELAY_SECS as i64),
        }
    }

    /// 设置发送失败后的重试间隔
    pub fn with_retry_delay(mut self, secs: u64) -> Self {
        self.retry_delay = Duration::seconds(secs.clamp(1, MAX_RETRY_DELAY_SECS) as i64);
        self
    }

    pub async fn create_template(
        &self,
        tenant_id: Uuid,
        req: TemplateRequestDto,
    ) -> Result<EmailTemplate, DomainError> {
        let template = EmailTemplate {
            id: Uuid::new_v4(),
            tenant_id,
            name: req.name.trim().to_string(),
            subject: req.subject,
            html_body: req.html_body,
            created_at: Utc::now(),
        };
        Ok(self.repo.create_template(&template).await?)
    }

    pub async fn list_templates(&self, tenant_id: Uuid) -> Result<Vec<EmailTemplate>, DomainError> {
        Ok(self.repo.list_templates(tenant_id).await?)
    }

    pub async fn create_sequence(
        &self,
        tenant_id: Uuid,
        req: SequenceRequestDto,
    ) -> Result<OutreachSequence, DomainError> {
        if req.steps.is_empty() {
            return Err(DomainError::validation("sequence requires at least one step"));
        }
        for step in &req.steps {
            step.validate()?;
            if let Some(template_id) = step.template_id {
                self.repo
                    .find_template(tenant_id, template_id)
                    .await?
                    .ok_or_else(|| DomainError::validation(format!("unknown template {}", template_id)))?;
            }
        }
        let sequence = OutreachSequence {
            id: Uuid::new_v4(),
            tenant_id,
            name: req.name.trim().to_string(),
            steps: req.steps,
            active: true,
            created_at: Utc::now(),
        };
        Ok(self.repo.create_sequence(&sequence).await?)
    }

    pub async fn list_sequences(&self, tenant_id: Uuid) -> Result<Vec<OutreachSequence>, DomainError> {
        Ok(self.repo.list_sequences(tenant_id).await?)
    }

    async fn sequence(&self, tenant_id: Uuid, id: Uuid) -> Result<OutreachSequence, DomainError> {
        self.repo
            .find_sequence(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("sequence"))
    }

    /// 联系人入组，同一序列中同时只能有一个有效入组
    pub async fn enroll(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Enrollment, DomainError> {
        let sequence = self.sequence(tenant_id, sequence_id).await?;
        if !sequence.active {
            return Err(DomainError::conflict("sequence is inactive"));
        }
        self.crm.get_contact(tenant_id, contact_id).await?;
        if self
            .repo
            .find_active_enrollment(tenant_id, sequence_id, contact_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(
                "contact is already enrolled in this sequence",
            ));
        }
        let enrollment = Enrollment::new(tenant_id, &sequence, contact_id, Utc::now())?;
        let enrollment = self.repo.create_enrollment(&enrollment).await?;
        info!(
            tenant_id = %tenant_id,
            sequence_id = %sequence_id,
            contact_id = %contact_id,
            "Contact enrolled"
        );
        Ok(enrollment)
    }

    pub async fn list_enrollments(
        &self,
        tenant_id: Uuid,
        sequence_id: Uuid,
    ) -> Result<Vec<Enrollment>, DomainError> {
        self.sequence(tenant_id, sequence_id).await?;
        Ok(self.repo.list_enrollments(tenant_id, sequence_id).await?)
    }

    pub async fn cancel_enrollment(&self, tenant_id: Uuid, id: Uuid) -> Result<Enrollment, DomainError> {
        let mut enrollment = self
            .repo
            .find_enrollment(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("enrollment"))?;
        if enrollment.status != EnrollmentStatus::Active {
            return Err(DomainError::transition(
                enrollment.status,
                EnrollmentStatus::Cancelled,
            ));
        }
        enrollment.stop(EnrollmentStatus::Cancelled, Utc::now());
        Ok(self.repo.update_enrollment(&enrollment).await?)
    }

    /// 处理到期入组，返回本轮统计
    ///
    /// 发送失败的入组推迟一个重试间隔，不会占满后续批次；
    /// 序列配置错误（步骤缺少模板、模板已删除）的入组直接取消。
    pub async fn process_due(&self, now: DateTime<Utc>, batch_size: u64) -> Result<ProcessReport, DomainError> {
        let due = self.repo.due_enrollments(now, batch_size).await?;
        let mut report = ProcessReport::default();
        let mut sequences: HashMap<Uuid, Option<OutreachSequence>> = HashMap::new();

        for enrollment in due {
            if !sequences.contains_key(&enrollment.sequence_id) {
                let sequence = self
                    .repo
                    .find_sequence(enrollment.tenant_id, enrollment.sequence_id)
                    .await?;
                sequences.insert(enrollment.sequence_id, sequence);
            }
            let sequence = sequences.get(&enrollment.sequence_id).cloned().flatten();
            let pending = enrollment.clone();
            match self.process_one(enrollment, sequence, now).await {
                Ok(Some(EnrollmentStatus::Completed)) => {
                    report.sent += 1;
                    report.completed += 1;
                }
                Ok(Some(EnrollmentStatus::Active)) => report.sent += 1,
                Ok(Some(_)) => report.stopped += 1,
                Ok(None) => report.failed += 1,
                Err(e) => {
                    warn!(enrollment_id = %pending.id, error = %e, "Failed to process enrollment");
                    match self.record_failure(pending, &e, now).await {
                        Ok(EnrollmentStatus::Active) => report.failed += 1,
                        Ok(_) => report.stopped += 1,
                        Err(update_err) => {
                            report.failed += 1;
                            warn!(error = %update_err, "Failed to record enrollment failure");
                        }
                    }
                }
            }
        }
        if report != ProcessReport::default() {
            info!(
                sent = report.sent,
                completed = report.completed,
                stopped = report.stopped,
                failed = report.failed,
                "Outreach batch processed"
            );
        }
        Ok(report)
    }

    /// 处理出错的入组：配置错误取消，其余推迟重试
    async fn record_failure(
        &self,
        mut enrollment: Enrollment,
        error: &DomainError,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentStatus, DomainError> {
        match error {
            DomainError::Validation(_) | DomainError::NotFound(_) => {
                enrollment.last_error = Some(error.to_string());
                enrollment.stop(EnrollmentStatus::Cancelled, now);
            }
            _ => enrollment.defer(error.to_string(), now, self.retry_delay),
        }
        self.repo.update_enrollment(&enrollment).await?;
        Ok(enrollment.status)
    }

    /// 处理单个入组，返回处理后的状态；渠道失败时返回 `None`
    async fn process_one(
        &self,
        mut enrollment: Enrollment,
        sequence: Option<OutreachSequence>,
        now: DateTime<Utc>,
    ) -> Result<Option<EnrollmentStatus>, DomainError> {
        let tenant_id = enrollment.tenant_id;
        let Some(sequence) = sequence.filter(|s| s.active) else {
            enrollment.stop(EnrollmentStatus::Cancelled, now);
            self.repo.update_enrollment(&enrollment).await?;
            return Ok(Some(EnrollmentStatus::Cancelled));
        };
        let Some(step) = sequence.steps.get(enrollment.current_step as usize) else {
            enrollment.stop(EnrollmentStatus::Completed, now);
            self.repo.update_enrollment(&enrollment).await?;
            return Ok(Some(EnrollmentStatus::Completed));
        };

        let contact = match self.crm.get_contact(tenant_id, enrollment.contact_id).await {
            Ok(contact) => contact,
            Err(DomainError::NotFound(_)) => {
                enrollment.last_error = Some("contact no longer exists".to_string());
                enrollment.stop(EnrollmentStatus::Cancelled, now);
                self.repo.update_enrollment(&enrollment).await?;
                return Ok(Some(EnrollmentStatus::Cancelled));
            }
            Err(e) => return Err(e),
        };
        let company = match contact.account_id {
            Some(account_id) => self
                .crm
                .get_account(tenant_id, account_id)
                .await
                .map(|a| a.name)
                .unwrap_or_default(),
            None => String::new(),
        };

        let delivery = match step.channel {
            Channel::Email => {
                let template_id = step
                    .template_id
                    .ok_or_else(|| DomainError::validation("email step without template"))?;
                let template = self
                    .repo
                    .find_template(tenant_id, template_id)
                    .await?
                    .ok_or(DomainError::NotFound("template"))?;
                self.delivery
                    .deliver_email(
                        tenant_id,
                        &contact,
                        &company,
                        &template.subject,
                        &template.html_body,
                        None,
                        Some(enrollment.id),
                    )
                    .await?
            }
            Channel::Sms => {
                let body = step.sms_body.as_deref().unwrap_or_default();
                self.delivery
                    .deliver_sms(tenant_id, &contact, &company, body, Some(enrollment.id))
                    .await?
            }
        };

        let outcome = match delivery {
            Delivery::Sent(_) => {
                enrollment.advance(&sequence.steps, now);
                Some(enrollment.status)
            }
            Delivery::Suppressed => {
                enrollment.stop(EnrollmentStatus::Stopped, now);
                Some(EnrollmentStatus::Stopped)
            }
            Delivery::Skipped(reason) => {
                enrollment.last_error = Some(reason.to_string());
                enrollment.stop(EnrollmentStatus::Cancelled, now);
                Some(EnrollmentStatus::Cancelled)
            }
            Delivery::Failed(_, error) => {
                enrollment.defer(error, now, self.retry_delay);
                None
            }
        };
        self.repo.update_enrollment(&enrollment).await?;
        debug!(
            enrollment_id = %enrollment.id,
            step = enrollment.current_step,
            status = %enrollment.status,
            "Enrollment processed"
        );
        Ok(outcome)
    }
}
