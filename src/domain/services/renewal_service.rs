// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::auto_posting::PostingEvent;
use super::crm_service::CrmService;
use super::invoice_service::{DraftInvoice, InvoiceService};
use super::ledger_service::LedgerService;
use crate::application::dto::billing::{RecognizeRequestDto, RenewalRequestDto};
use crate::domain::errors::DomainError;
use crate::domain::models::invoice::{Invoice, InvoiceSource, InvoiceStatus};
use crate::domain::models::ledger::JournalEntry;
use crate::domain::models::pricing::LineItem;
use crate::domain::models::renewal::{add_months, Renewal, RenewalStatus};
use crate::domain::repositories::renewal_repository::RenewalRepository;

/// 续约服务
///
/// 续约时生成并开具续约发票（收入计入递延收入），
/// 之后按期确认订阅收入。
pub struct RenewalService {
    renewals: Arc<dyn RenewalRepository>,
    invoices: Arc<InvoiceService>,
    ledger: Arc<LedgerService>,
    crm: Arc<CrmService>,
}

impl RenewalService {
    pub fn new(
        renewals: Arc<dyn RenewalRepository>,
        invoices: Arc<InvoiceService>,
        ledger: Arc<LedgerService>,
        crm: Arc<CrmService>,
    ) -> Self {
        Self {
            renewals,
            invoices,
            ledger,
            crm,
        }
    }

    pub async fn create(&self, tenant_id: Uuid, req: RenewalRequestDto) -> Result<Renewal, DomainError> {
        Renewal::validate_term(req.term_months)?;
        if req.amount < 0 {
            return Err(DomainError::validation("amount must not be negative"));
        }
        self.crm.get_account(tenant_id, req.account_id).await?;

        let renewal_date = match req.renewal_date {
            Some(date) => date,
            None => add_months(req.start_date, req.term_months as u32)
                .ok_or_else(|| DomainError::validation("renewal date out of range"))?,
        };
        let now = Utc::now();
        let renewal = Renewal {
            id: Uuid::new_v4(),
            tenant_id,
            account_id: req.account_id,
            product_id: req.product_id,
            name: req.name.trim().to_string(),
            amount: req.amount,
            tax_rate_bps: req.tax_rate_bps,
            term_months: req.term_months,
            start_date: req.start_date,
            renewal_date,
            auto_renew: req.auto_renew,
            status: RenewalStatus::Active,
            billing_email: req.billing_email.map(|e| e.trim().to_lowercase()),
            created_at: now,
            updated_at: now,
        };
        let renewal = self.renewals.create(&renewal).await?;
        self.history(&renewal, "renewal.created", json!({ "renewal_date": renewal.renewal_date }))
            .await;
        Ok(renewal)
    }

    async fn load(&self, tenant_id: Uuid, id: Uuid) -> Result<Renewal, DomainError> {
        self.renewals
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("renewal"))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Renewal, DomainError> {
        self.load(tenant_id, id).await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Renewal>, DomainError> {
        Ok(self.renewals.list(tenant_id, account_id).await?)
    }

    /// 未来 `days` 天内到期的有效续约（含已逾期）
    pub async fn upcoming(&self, tenant_id: Uuid, days: i64) -> Result<Vec<Renewal>, DomainError> {
        if days < 0 {
            return Err(DomainError::validation("days must not be negative"));
        }
        let until = Utc::now().date_naive() + Duration::days(days);
        Ok(self.renewals.list_due(tenant_id, until).await?)
    }

    /// 续约：生成并开具续约发票，续约日期顺延一期
    pub async fn renew(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<(Renewal, Invoice), DomainError> {
        let mut renewal = self.load(tenant_id, id).await?;
        renewal.ensure_active()?;

        let period_start = renewal.renewal_date;
        let period_end = add_months(period_start, renewal.term_months as u32)
            .ok_or_else(|| DomainError::validation("renewal date out of range"))?;
        let today = Utc::now().date_naive();
        let description = format!("{} ({} to {})", renewal.name, period_start, period_end);

        // 上次续约中途失败时复用本期已生成的发票
        let existing = self
            .invoices
            .list_for_renewal(tenant_id, renewal.id)
            .await?
            .into_iter()
            .find(|inv| inv.lines.first().map(|l| l.description.as_str()) == Some(description.as_str()));
        let invoice = match existing {
            Some(inv) if inv.status == InvoiceStatus::Draft => {
                info!(renewal_id = %renewal.id, invoice = %inv.number, "Reusing draft renewal invoice");
                self.invoices.issue(tenant_id, inv.id, actor).await?
            }
            Some(inv) => inv,
            None => {
                let draft = self
                    .invoices
                    .create_draft(
                        tenant_id,
                        DraftInvoice {
                            account_id: renewal.account_id,
                            billing_email: renewal.billing_email.clone(),
                            due_date: period_start.max(today),
                            currency: None,
                            lines: vec![LineItem {
                                product_id: renewal.product_id,
                                description,
                                quantity: 1,
                                unit_price: renewal.amount,
                            }],
                            discount: None,
                            tax_rate_bps: renewal.tax_rate_bps,
                            source: InvoiceSource::Renewal,
                            quote_id: None,
                            renewal_id: Some(renewal.id),
                        },
                    )
                    .await?;
                self.invoices.issue(tenant_id, draft.id, actor).await?
            }
        };

        renewal.advance()?;
        let renewal = self.renewals.update(&renewal).await?;
        info!(
            tenant_id = %tenant_id,
            renewal_id = %renewal.id,
            invoice = %invoice.number,
            next_renewal = %renewal.renewal_date,
            "Renewal invoiced"
        );
        self.history(
            &renewal,
            "renewal.renewed",
            json!({
                "invoice_id": invoice.id,
                "invoice_number": invoice.number,
                "period_start": period_start,
                "period_end": period_end,
                "next_renewal_date": renewal.renewal_date,
            }),
        )
        .await;
        Ok((renewal, invoice))
    }

    /// 确认订阅收入，同一续约同一日期只确认一次
    pub async fn recognize(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: RecognizeRequestDto,
        actor: Option<Uuid>,
    ) -> Result<JournalEntry, DomainError> {
        let renewal = self.load(tenant_id, id).await?;
        if req.amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        let recognized_on = req.recognized_on.unwrap_or_else(|| Utc::now().date_naive());
        let event = PostingEvent::RevenueRecognized {
            renewal_id: renewal.id,
            recognized_on,
            amount: req.amount,
        };
        let entry = self
            .ledger
            .post_event(tenant_id, recognized_on, &event, actor)
            .await?;
        self.history(
            &renewal,
            "renewal.revenue_recognized",
            json!({ "amount": req.amount, "recognized_on": recognized_on, "entry": entry.number }),
        )
        .await;
        Ok(entry)
    }

    pub async fn cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<Renewal, DomainError> {
        let mut renewal = self.load(tenant_id, id).await?;
        renewal.cancel()?;
        let renewal = self.renewals.update(&renewal).await?;
        self.history(&renewal, "renewal.cancelled", json!({})).await;
        Ok(renewal)
    }

    async fn history(&self, renewal: &Renewal, kind: &str, data: serde_json::Value) {
        self.crm
            .log(
                renewal.tenant_id,
                Some(renewal.account_id),
                "renewal",
                renewal.id,
                kind,
                data,
            )
            .await;
    }
}
