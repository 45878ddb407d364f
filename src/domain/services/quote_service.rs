// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::catalog_service::CatalogService;
use super::crm_service::CrmService;
use super::invoice_service::{DraftInvoice, InvoiceService};
use crate::application::dto::billing::{QuoteFilterDto, QuoteRequestDto};
use crate::domain::errors::DomainError;
use crate::domain::models::invoice::{Invoice, InvoiceSource};
use crate::domain::models::pricing::compute_totals;
use crate::domain::models::quote::{Quote, QuoteDecision, QuoteStatus};
use crate::domain::repositories::quote_repository::{QuoteQuery, QuoteRepository};
use crate::domain::repositories::sequence_repository::SequenceRepository;
use crate::domain::repositories::RepositoryError;

/// 报价转发票的默认账期（天）
const INVOICE_TERMS_DAYS: i64 = 30;

/// 报价服务
pub struct QuoteService {
    quotes: Arc<dyn QuoteRepository>,
    sequences: Arc<dyn SequenceRepository>,
    catalog: Arc<CatalogService>,
    crm: Arc<CrmService>,
    invoices: Arc<InvoiceService>,
}

impl QuoteService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        sequences: Arc<dyn SequenceRepository>,
        catalog: Arc<CatalogService>,
        crm: Arc<CrmService>,
        invoices: Arc<InvoiceService>,
    ) -> Self {
        Self {
            quotes,
            sequences,
            catalog,
            crm,
            invoices,
        }
    }

    pub async fn create(&self, tenant_id: Uuid, req: QuoteRequestDto) -> Result<Quote, DomainError> {
        let today = Utc::now().date_naive();
        if req.valid_until < today {
            return Err(DomainError::validation("valid_until must not be in the past"));
        }
        self.crm.get_account(tenant_id, req.account_id).await?;
        if let Some(contact_id) = req.contact_id {
            let contact = self.crm.get_contact(tenant_id, contact_id).await?;
            if contact.account_id != Some(req.account_id) {
                return Err(DomainError::validation("contact does not belong to the account"));
            }
        }

        let (lines, discount) = self.catalog.build_lines(tenant_id, &req.pricing, today).await?;
        let totals = compute_totals(&lines, discount.as_ref(), req.pricing.tax_rate_bps)?;

        let now = Utc::now();
        let seq = self
            .sequences
            .next_value(tenant_id, &format!("quote:{}", now.year()))
            .await?;
        let quote = Quote {
            id: Uuid::new_v4(),
            tenant_id,
            number: format!("Q-{}-{:05}", now.year(), seq),
            account_id: req.account_id,
            contact_id: req.contact_id,
            status: QuoteStatus::Draft,
            lines,
            discount,
            tax_rate_bps: req.pricing.tax_rate_bps,
            totals,
            valid_until: req.valid_until,
            invoice_id: None,
            created_at: now,
            updated_at: now,
        };
        let quote = self.quotes.create(&quote).await?;
        self.history(&quote, "quote.created").await;
        Ok(quote)
    }

    async fn load(&self, tenant_id: Uuid, id: Uuid) -> Result<Quote, DomainError> {
        self.quotes
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("quote"))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Quote, DomainError> {
        self.load(tenant_id, id).await
    }

    pub async fn list(&self, tenant_id: Uuid, filter: QuoteFilterDto) -> Result<Vec<Quote>, DomainError> {
        let query = QuoteQuery {
            account_id: filter.account_id,
            statuses: filter.status.map(|s| vec![s]),
        };
        Ok(self.quotes.list(tenant_id, query).await?)
    }

    /// 门户可见的报价：已发送及已答复
    pub async fn list_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<Quote>, DomainError> {
        let query = QuoteQuery {
            account_id: Some(account_id),
            statuses: Some(vec![
                QuoteStatus::Sent,
                QuoteStatus::Accepted,
                QuoteStatus::Declined,
            ]),
        };
        Ok(self.quotes.list(tenant_id, query).await?)
    }

    pub async fn send(&self, tenant_id: Uuid, id: Uuid) -> Result<Quote, DomainError> {
        let mut quote = self.load(tenant_id, id).await?;
        let expected = quote.status;
        quote.send()?;
        let quote = self.save(&quote, expected).await?;
        self.history(&quote, "quote.sent").await;
        Ok(quote)
    }

    /// 接受或拒绝报价，过期报价会先持久化为 Expired 再返回错误
    pub async fn decide(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decision: QuoteDecision,
    ) -> Result<Quote, DomainError> {
        let quote = self.load(tenant_id, id).await?;
        self.apply_decision(quote, decision).await
    }

    /// 门户答复：只能答复本客户的报价
    pub async fn decide_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        id: Uuid,
        decision: QuoteDecision,
    ) -> Result<Quote, DomainError> {
        let quote = self.load(tenant_id, id).await?;
        if quote.account_id != account_id || quote.status == QuoteStatus::Draft {
            return Err(DomainError::NotFound("quote"));
        }
        self.apply_decision(quote, decision).await
    }

    async fn apply_decision(
        &self,
        mut quote: Quote,
        decision: QuoteDecision,
    ) -> Result<Quote, DomainError> {
        let today = Utc::now().date_naive();
        let expected = quote.status;
        match quote.decide(decision, today) {
            Ok(()) => {
                let quote = self.save(&quote, expected).await?;
                let kind = match decision {
                    QuoteDecision::Accept => "quote.accepted",
                    QuoteDecision::Decline => "quote.declined",
                };
                self.history(&quote, kind).await;
                Ok(quote)
            }
            Err(e) => {
                if quote.status == QuoteStatus::Expired && expected != QuoteStatus::Expired {
                    let quote = self.save(&quote, expected).await?;
                    self.history(&quote, "quote.expired").await;
                }
                Err(e)
            }
        }
    }

    /// 已接受的报价生成草稿发票，每张报价只能转换一次
    pub async fn convert_to_invoice(&self, tenant_id: Uuid, id: Uuid) -> Result<Invoice, DomainError> {
        let mut quote = self.load(tenant_id, id).await?;
        quote.ensure_convertible()?;

        let billing_email = match quote.contact_id {
            Some(contact_id) => self.crm.get_contact(tenant_id, contact_id).await?.email,
            None => None,
        };
        let invoice = self
            .invoices
            .create_draft(
                tenant_id,
                DraftInvoice {
                    account_id: quote.account_id,
                    billing_email,
                    due_date: Utc::now().date_naive() + Duration::days(INVOICE_TERMS_DAYS),
                    currency: None,
                    lines: quote.lines.clone(),
                    discount: quote.discount.clone(),
                    tax_rate_bps: quote.tax_rate_bps,
                    source: InvoiceSource::Quote,
                    quote_id: Some(quote.id),
                    renewal_id: None,
                },
            )
            .await?;

        quote.invoice_id = Some(invoice.id);
        quote.updated_at = Utc::now();
        let quote = match self.save(&quote, QuoteStatus::Accepted).await {
            Ok(quote) => quote,
            Err(e) => {
                // 并发转换已关联其他发票，作废本次生成的草稿
                if let Err(void_err) = self.invoices.void(tenant_id, invoice.id, None).await {
                    warn!(
                        quote = %quote.number,
                        invoice = %invoice.number,
                        error = %void_err,
                        "Failed to void draft invoice of a conflicting conversion"
                    );
                }
                return Err(e);
            }
        };
        info!(
            tenant_id = %tenant_id,
            quote = %quote.number,
            invoice = %invoice.number,
            "Quote converted to invoice"
        );
        self.history(&quote, "quote.converted").await;
        Ok(invoice)
    }

    /// 条件更新报价，状态已被其他请求修改时返回冲突
    async fn save(&self, quote: &Quote, expected: QuoteStatus) -> Result<Quote, DomainError> {
        match self.quotes.update(quote, expected).await {
            Ok(quote) => Ok(quote),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "quote {} was modified concurrently, please retry",
                quote.number
            ))),
            Err(RepositoryError::NotFound) => Err(DomainError::NotFound("quote")),
            Err(e) => Err(e.into()),
        }
    }

    async fn history(&self, quote: &Quote, kind: &str) {
        self.crm
            .log(
                quote.tenant_id,
                Some(quote.account_id),
                "quote",
                quote.id,
                kind,
                json!({
                    "number": quote.number,
                    "status": quote.status,
                    "total": quote.totals.total,
                    "invoice_id": quote.invoice_id,
                }),
            )
            .await;
    }
}
