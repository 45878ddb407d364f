// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::auto_posting::PostingEvent;
use super::crm_service::CrmService;
use super::ledger_service::LedgerService;
use crate::application::dto::billing::TimeEntryRequestDto;
use crate::domain::errors::DomainError;
use crate::domain::models::renewal::TimeEntry;
use crate::domain::repositories::renewal_repository::TimeEntryRepository;

/// 工时服务，每条工时自动过账成本与未开票收入
pub struct TimeEntryService {
    entries: Arc<dyn TimeEntryRepository>,
    ledger: Arc<LedgerService>,
    crm: Arc<CrmService>,
}

impl TimeEntryService {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        ledger: Arc<LedgerService>,
        crm: Arc<CrmService>,
    ) -> Self {
        Self { entries, ledger, crm }
    }

    pub async fn log(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        req: TimeEntryRequestDto,
    ) -> Result<TimeEntry, DomainError> {
        if req.minutes <= 0 {
            return Err(DomainError::validation("minutes must be positive"));
        }
        if req.cost_rate < 0 || req.bill_rate < 0 {
            return Err(DomainError::validation("rates must not be negative"));
        }
        self.crm.get_account(tenant_id, req.account_id).await?;

        let mut entry = TimeEntry {
            id: Uuid::new_v4(),
            tenant_id,
            user_id,
            account_id: req.account_id,
            ticket_id: req.ticket_id,
            work_date: req.work_date,
            minutes: req.minutes,
            billable: req.billable,
            bill_rate: req.bill_rate,
            cost_rate: req.cost_rate,
            description: req.description,
            journal_entry_id: None,
            created_at: Utc::now(),
        };
        let event = PostingEvent::TimeEntryLogged {
            time_entry_id: entry.id,
            minutes: entry.minutes as i64,
            cost_rate: entry.cost_rate,
            bill_rate: entry.bill_rate,
            billable: entry.billable,
        };
        // 先校验模板与期间，避免写入无法过账的工时
        event.lines()?;
        self.ledger.ensure_postable(tenant_id, entry.work_date).await?;

        self.entries.create(&entry).await?;
        let journal = self
            .ledger
            .post_event(tenant_id, entry.work_date, &event, Some(user_id))
            .await?;
        self.entries
            .set_journal_entry(tenant_id, entry.id, journal.id)
            .await?;
        entry.journal_entry_id = Some(journal.id);

        debug!(
            tenant_id = %tenant_id,
            time_entry_id = %entry.id,
            minutes = entry.minutes,
            entry = %journal.number,
            "Time entry logged"
        );
        Ok(entry)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>, DomainError> {
        Ok(self.entries.list(tenant_id, account_id, user_id).await?)
    }
}
