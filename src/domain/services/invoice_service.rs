// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::auto_posting::PostingEvent;
use super::catalog_service::CatalogService;
use super::crm_service::CrmService;
use super::email_service::Mailer;
use super::ledger_service::LedgerService;
use crate::application::dto::billing::{
    InvoiceFilterDto, InvoiceRequestDto, PaymentRequestDto, RefundRequestDto,
};
use crate::domain::errors::DomainError;
use crate::domain::models::invoice::{
    Invoice, InvoiceSource, InvoiceStatus, InvoiceVersion, InvoiceView, Payment, PaymentKind,
};
use crate::domain::models::pricing::{compute_totals, AppliedDiscount, LineItem};
use crate::domain::repositories::invoice_repository::{InvoiceQuery, InvoiceRepository};
use crate::domain::repositories::sequence_repository::SequenceRepository;
use crate::domain::repositories::RepositoryError;
use crate::utils::money::format_cents;

/// 未指定币种时的默认币种
pub const DEFAULT_CURRENCY: &str = "USD";

/// 待创建的草稿发票
#[derive(Debug, Clone)]
pub struct DraftInvoice {
    pub account_id: Uuid,
    pub billing_email: Option<String>,
    pub due_date: NaiveDate,
    pub currency: Option<String>,
    pub lines: Vec<LineItem>,
    pub discount: Option<AppliedDiscount>,
    pub tax_rate_bps: i32,
    pub source: InvoiceSource,
    pub quote_id: Option<Uuid>,
    pub renewal_id: Option<Uuid>,
}

/// 一笔收款
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: i64,
    pub fee: i64,
    pub method: String,
    pub provider: String,
    pub external_id: String,
    pub received_on: NaiveDate,
}

impl From<PaymentRequestDto> for NewPayment {
    fn from(req: PaymentRequestDto) -> Self {
        Self {
            amount: req.amount,
            fee: req.fee,
            method: req.method,
            provider: req.provider,
            external_id: req.external_id,
            received_on: req.received_on.unwrap_or_else(|| Utc::now().date_naive()),
        }
    }
}

/// 一笔退款
#[derive(Debug, Clone)]
pub struct NewRefund {
    pub amount: i64,
    /// 被退款的原始收款
    pub payment_id: Option<Uuid>,
    pub provider: String,
    pub external_id: String,
    pub refunded_on: NaiveDate,
}

impl From<RefundRequestDto> for NewRefund {
    fn from(req: RefundRequestDto) -> Self {
        Self {
            amount: req.amount,
            payment_id: req.payment_id,
            provider: req.provider,
            external_id: req.external_id,
            refunded_on: req.refunded_on.unwrap_or_else(|| Utc::now().date_naive()),
        }
    }
}

/// 收付款处理结果
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub invoice: Invoice,
    /// false 表示渠道ID重复，返回的是已有记录
    pub created: bool,
}

/// 发票服务
///
/// 负责编号、开票过账、收款退款的余额核对以及作废冲销。
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceRepository>,
    sequences: Arc<dyn SequenceRepository>,
    catalog: Arc<CatalogService>,
    ledger: Arc<LedgerService>,
    crm: Arc<CrmService>,
    mailer: Option<Mailer>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        sequences: Arc<dyn SequenceRepository>,
        catalog: Arc<CatalogService>,
        ledger: Arc<LedgerService>,
        crm: Arc<CrmService>,
    ) -> Self {
        Self {
            invoices,
            sequences,
            catalog,
            ledger,
            crm,
            mailer: None,
        }
    }

    /// 启用付款确认邮件
    pub fn with_mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    async fn next_number(&self, tenant_id: Uuid, year: i32) -> Result<String, DomainError> {
        let seq = self
            .sequences
            .next_value(tenant_id, &format!("invoice:{}", year))
            .await?;
        Ok(format!("INV-{}-{:05}", year, seq))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        req: InvoiceRequestDto,
    ) -> Result<Invoice, DomainError> {
        let today = Utc::now().date_naive();
        let (lines, discount) = self.catalog.build_lines(tenant_id, &req.pricing, today).await?;
        self.create_draft(
            tenant_id,
            DraftInvoice {
                account_id: req.account_id,
                billing_email: req.billing_email,
                due_date: req.due_date,
                currency: req.currency,
                lines,
                discount,
                tax_rate_bps: req.pricing.tax_rate_bps,
                source: InvoiceSource::Manual,
                quote_id: None,
                renewal_id: None,
            },
        )
        .await
    }

    /// 创建草稿发票，计算合计并分配编号
    pub async fn create_draft(
        &self,
        tenant_id: Uuid,
        draft: DraftInvoice,
    ) -> Result<Invoice, DomainError> {
        self.crm.get_account(tenant_id, draft.account_id).await?;
        let totals = compute_totals(&draft.lines, draft.discount.as_ref(), draft.tax_rate_bps)?;

        let now = Utc::now();
        let number = self.next_number(tenant_id, now.year()).await?;
        let invoice = Invoice {
            id: Uuid::new_v4(),
            tenant_id,
            number,
            account_id: draft.account_id,
            billing_email: draft.billing_email.map(|e| e.trim().to_lowercase()),
            status: InvoiceStatus::Draft,
            issue_date: None,
            due_date: draft.due_date,
            currency: draft
                .currency
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            lines: draft.lines,
            discount: draft.discount,
            tax_rate_bps: draft.tax_rate_bps,
            totals,
            amount_paid: 0,
            amount_refunded: 0,
            source: draft.source,
            quote_id: draft.quote_id,
            renewal_id: draft.renewal_id,
            issuance_entry_id: None,
            created_at: now,
            updated_at: now,
        };
        let invoice = self.invoices.create(&invoice).await?;

        self.crm
            .log(
                tenant_id,
                Some(invoice.account_id),
                "invoice",
                invoice.id,
                "invoice.created",
                json!({ "number": invoice.number, "total": invoice.totals.total, "source": invoice.source }),
            )
            .await;
        Ok(invoice)
    }

    async fn load(&self, tenant_id: Uuid, id: Uuid) -> Result<Invoice, DomainError> {
        self.invoices
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("invoice"))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<InvoiceView, DomainError> {
        Ok(self.load(tenant_id, id).await?.view(Utc::now().date_naive()))
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: InvoiceFilterDto,
    ) -> Result<Vec<InvoiceView>, DomainError> {
        let today = Utc::now().date_naive();
        let query = InvoiceQuery {
            account_id: filter.account_id,
            statuses: filter.status.map(|s| vec![s]),
            renewal_id: None,
            exclude_drafts: false,
        };
        Ok(self
            .invoices
            .list(tenant_id, query)
            .await?
            .into_iter()
            .map(|inv| inv.view(today))
            .collect())
    }

    /// 门户可见的发票：仅限本客户且非草稿
    pub async fn list_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<InvoiceView>, DomainError> {
        let today = Utc::now().date_naive();
        let query = InvoiceQuery {
            account_id: Some(account_id),
            statuses: None,
            renewal_id: None,
            exclude_drafts: true,
        };
        Ok(self
            .invoices
            .list(tenant_id, query)
            .await?
            .into_iter()
            .map(|inv| inv.view(today))
            .collect())
    }

    /// 续约生成的未作废发票
    pub async fn list_for_renewal(
        &self,
        tenant_id: Uuid,
        renewal_id: Uuid,
    ) -> Result<Vec<Invoice>, DomainError> {
        let query = InvoiceQuery {
            renewal_id: Some(renewal_id),
            ..Default::default()
        };
        Ok(self
            .invoices
            .list(tenant_id, query)
            .await?
            .into_iter()
            .filter(|inv| inv.status != InvoiceStatus::Void)
            .collect())
    }

    pub async fn get_for_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        id: Uuid,
    ) -> Result<InvoiceView, DomainError> {
        match self.invoices.find_by_id(tenant_id, id).await? {
            Some(inv) if inv.account_id == account_id && inv.status != InvoiceStatus::Draft => {
                Ok(inv.view(Utc::now().date_naive()))
            }
            _ => Err(DomainError::NotFound("invoice")),
        }
    }

    pub async fn list_payments(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<Payment>, DomainError> {
        self.load(tenant_id, invoice_id).await?;
        Ok(self.invoices.list_payments(tenant_id, invoice_id).await?)
    }

    pub async fn find_payment_by_external_id(
        &self,
        tenant_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .invoices
            .find_payment_by_external_id(tenant_id, provider, external_id)
            .await?)
    }

    /// 开具发票并过账
    ///
    /// 零金额发票不生成凭证。续约发票的收入计入递延收入。
    pub async fn issue(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = self.load(tenant_id, id).await?;
        let expected = invoice.version();
        let today = Utc::now().date_naive();
        invoice.issue(today)?;

        if invoice.totals.total > 0 {
            let event = match invoice.source {
                InvoiceSource::Renewal => PostingEvent::RenewalInvoiced {
                    invoice_id: invoice.id,
                    number: invoice.number.clone(),
                    total: invoice.totals.total,
                    tax: invoice.totals.tax_total,
                },
                _ => PostingEvent::InvoiceIssued {
                    invoice_id: invoice.id,
                    number: invoice.number.clone(),
                    total: invoice.totals.total,
                    tax: invoice.totals.tax_total,
                },
            };
            let entry = self.ledger.post_event(tenant_id, today, &event, actor).await?;
            invoice.issuance_entry_id = Some(entry.id);
        }

        let invoice = match self.save(&invoice, expected).await {
            Ok(invoice) => invoice,
            Err(e) => {
                if let Some(entry_id) = invoice.issuance_entry_id {
                    self.discard_issuance(&invoice, entry_id, actor).await;
                }
                return Err(e);
            }
        };
        info!(
            tenant_id = %tenant_id,
            invoice = %invoice.number,
            total = invoice.totals.total,
            "Invoice issued"
        );
        self.crm
            .log(
                tenant_id,
                Some(invoice.account_id),
                "invoice",
                invoice.id,
                "invoice.issued",
                json!({ "number": invoice.number, "total": invoice.totals.total }),
            )
            .await;
        Ok(invoice)
    }

    /// 作废发票，已开票的发票同时冲销开票凭证
    ///
    /// 先以条件更新落库作废状态，成功后再冲销；冲销失败时恢复原状态。
    /// 已作废但凭证未冲销的发票再次作废时只补做冲销。
    pub async fn void(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = self.load(tenant_id, id).await?;
        if invoice.status == InvoiceStatus::Void {
            if self.reverse_issuance(&invoice, actor).await? {
                warn!(invoice = %invoice.number, "Completed pending reversal of a voided invoice");
                return Ok(invoice);
            }
            return Err(DomainError::transition(invoice.status, InvoiceStatus::Void));
        }

        let expected = invoice.version();
        invoice.void()?;
        let invoice = self.save(&invoice, expected).await?;

        if let Err(e) = self.reverse_issuance(&invoice, actor).await {
            error!(
                tenant_id = %tenant_id,
                invoice = %invoice.number,
                error = %e,
                "Failed to reverse issuance entry, restoring invoice status"
            );
            let mut restored = invoice.clone();
            restored.status = expected.status;
            restored.updated_at = Utc::now();
            if let Err(restore_err) = self.save(&restored, invoice.version()).await {
                error!(
                    invoice = %invoice.number,
                    error = %restore_err,
                    "Failed to restore voided invoice"
                );
            }
            return Err(e);
        }

        info!(tenant_id = %tenant_id, invoice = %invoice.number, "Invoice voided");
        self.crm
            .log(
                tenant_id,
                Some(invoice.account_id),
                "invoice",
                invoice.id,
                "invoice.voided",
                json!({ "number": invoice.number }),
            )
            .await;
        Ok(invoice)
    }

    /// 冲销开票凭证，返回是否实际生成了冲销分录
    async fn reverse_issuance(
        &self,
        invoice: &Invoice,
        actor: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let Some(entry_id) = invoice.issuance_entry_id else {
            return Ok(false);
        };
        let entry = self.ledger.get_entry(invoice.tenant_id, entry_id).await?;
        if entry.reversed_by.is_some() {
            return Ok(false);
        }
        self.ledger
            .reverse(
                invoice.tenant_id,
                entry_id,
                Utc::now().date_naive(),
                Some(format!("Void invoice {}", invoice.number)),
                actor,
            )
            .await?;
        Ok(true)
    }

    /// 开票落库失败后，撤销不再被任何发票引用的开票凭证
    async fn discard_issuance(&self, invoice: &Invoice, entry_id: Uuid, actor: Option<Uuid>) {
        let current = match self.invoices.find_by_id(invoice.tenant_id, invoice.id).await {
            Ok(current) => current,
            Err(e) => {
                error!(invoice = %invoice.number, error = %e, "Failed to reload invoice");
                return;
            }
        };
        // 并发的开票请求已引用同一凭证
        if current.and_then(|c| c.issuance_entry_id) == Some(entry_id) {
            return;
        }
        if let Err(e) = self.reverse_issuance(invoice, actor).await {
            error!(
                invoice = %invoice.number,
                entry_id = %entry_id,
                error = %e,
                "Failed to reverse orphaned issuance entry"
            );
        }
    }

    /// 条件更新发票，版本不一致时返回冲突
    async fn save(&self, invoice: &Invoice, expected: InvoiceVersion) -> Result<Invoice, DomainError> {
        match self.invoices.update(invoice, expected).await {
            Ok(invoice) => Ok(invoice),
            Err(RepositoryError::Conflict(msg)) => {
                warn!(invoice = %invoice.number, reason = %msg, "Concurrent invoice update");
                Err(DomainError::conflict(
                    "invoice was modified concurrently, please retry",
                ))
            }
            Err(RepositoryError::NotFound) => Err(DomainError::NotFound("invoice")),
            Err(e) => Err(e.into()),
        }
    }

    /// 已存在的收付款记录：补做未完成的过账后原样返回
    async fn existing_payment(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        mut payment: Payment,
    ) -> Result<RecordedPayment, DomainError> {
        if payment.invoice_id != invoice_id {
            return Err(DomainError::conflict(format!(
                "external id {} is already used by another invoice",
                payment.external_id
            )));
        }
        let invoice = self.load(tenant_id, invoice_id).await?;
        if payment.journal_entry_id.is_none() {
            payment = self.post_payment(&invoice, payment, None).await?;
        }
        Ok(RecordedPayment {
            payment,
            invoice,
            created: false,
        })
    }

    async fn post_payment(
        &self,
        invoice: &Invoice,
        mut payment: Payment,
        actor: Option<Uuid>,
    ) -> Result<Payment, DomainError> {
        let event = match payment.kind {
            PaymentKind::Payment => PostingEvent::PaymentReceived {
                payment_id: payment.id,
                invoice_number: invoice.number.clone(),
                amount: payment.amount,
                fee: payment.fee,
            },
            PaymentKind::Refund => PostingEvent::RefundIssued {
                refund_id: payment.id,
                invoice_number: invoice.number.clone(),
                amount: payment.amount,
            },
        };
        let entry_date = payment.received_at.date_naive();
        let entry = match self
            .ledger
            .post_event(invoice.tenant_id, entry_date, &event, actor)
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                error!(
                    tenant_id = %invoice.tenant_id,
                    payment_id = %payment.id,
                    error = %e,
                    "Failed to post payment to the ledger"
                );
                return Err(e);
            }
        };
        self.invoices
            .set_payment_entry(invoice.tenant_id, payment.id, entry.id)
            .await?;
        payment.journal_entry_id = Some(entry.id);
        Ok(payment)
    }

    /// 在发票上持久化收付款，冲突时区分重复提交与并发修改
    async fn persist(
        &self,
        invoice: &Invoice,
        expected: InvoiceVersion,
        payment: &Payment,
    ) -> Result<Option<Payment>, DomainError> {
        match self.invoices.apply_payment(invoice, expected, payment).await {
            Ok(()) => Ok(None),
            Err(RepositoryError::Conflict(msg)) => {
                match self
                    .invoices
                    .find_payment_by_external_id(invoice.tenant_id, &payment.provider, &payment.external_id)
                    .await?
                {
                    Some(existing) => Ok(Some(existing)),
                    None => {
                        warn!(invoice = %invoice.number, reason = %msg, "Concurrent invoice update");
                        Err(DomainError::conflict(
                            "invoice was modified concurrently, please retry",
                        ))
                    }
                }
            }
            Err(RepositoryError::NotFound) => Err(DomainError::NotFound("invoice")),
            Err(e) => Err(e.into()),
        }
    }

    /// 记录收款
    ///
    /// 同一渠道的同一外部ID只处理一次，重复请求返回已有记录且不产生副作用。
    pub async fn record_payment(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        input: NewPayment,
        actor: Option<Uuid>,
    ) -> Result<RecordedPayment, DomainError> {
        if input.fee < 0 || input.fee > input.amount {
            return Err(DomainError::validation(
                "fee must be between zero and the payment amount",
            ));
        }
        if let Some(existing) = self
            .invoices
            .find_payment_by_external_id(tenant_id, &input.provider, &input.external_id)
            .await?
        {
            return self.existing_payment(tenant_id, invoice_id, existing).await;
        }

        let mut invoice = self.load(tenant_id, invoice_id).await?;
        let expected = invoice.version();
        invoice.apply_payment(input.amount)?;
        self.ledger.ensure_postable(tenant_id, input.received_on).await?;

        let payment = Payment {
            id: Uuid::new_v4(),
            tenant_id,
            invoice_id,
            kind: PaymentKind::Payment,
            amount: input.amount,
            fee: input.fee,
            method: input.method,
            provider: input.provider,
            external_id: input.external_id,
            payment_id: None,
            journal_entry_id: None,
            received_at: received_at(input.received_on),
        };
        if let Some(existing) = self.persist(&invoice, expected, &payment).await? {
            return self.existing_payment(tenant_id, invoice_id, existing).await;
        }
        let payment = self.post_payment(&invoice, payment, actor).await?;

        counter!("payments_recorded_total", "kind" => "payment", "provider" => payment.provider.clone())
            .increment(1);
        info!(
            tenant_id = %tenant_id,
            invoice = %invoice.number,
            amount = payment.amount,
            status = %invoice.status,
            "Payment recorded"
        );
        self.crm
            .log(
                tenant_id,
                Some(invoice.account_id),
                "invoice",
                invoice.id,
                "payment.recorded",
                json!({
                    "number": invoice.number,
                    "amount": payment.amount,
                    "provider": payment.provider,
                    "external_id": payment.external_id,
                    "balance_due": invoice.balance_due(),
                }),
            )
            .await;
        self.send_receipt(&invoice, &payment).await;

        Ok(RecordedPayment {
            payment,
            invoice,
            created: true,
        })
    }

    /// 记录退款
    pub async fn record_refund(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        input: NewRefund,
        actor: Option<Uuid>,
    ) -> Result<RecordedPayment, DomainError> {
        if let Some(existing) = self
            .invoices
            .find_payment_by_external_id(tenant_id, &input.provider, &input.external_id)
            .await?
        {
            return self.existing_payment(tenant_id, invoice_id, existing).await;
        }

        let mut invoice = self.load(tenant_id, invoice_id).await?;
        if let Some(payment_id) = input.payment_id {
            let payments = self.invoices.list_payments(tenant_id, invoice_id).await?;
            let original = payments
                .iter()
                .find(|p| p.id == payment_id && p.kind == PaymentKind::Payment)
                .ok_or(DomainError::NotFound("payment"))?;
            let already: i64 = payments
                .iter()
                .filter(|p| p.kind == PaymentKind::Refund && p.payment_id == Some(payment_id))
                .map(|p| p.amount)
                .sum();
            if already + input.amount > original.amount {
                return Err(DomainError::validation(format!(
                    "refund of {} exceeds refundable amount {} of the payment",
                    input.amount,
                    original.amount - already
                )));
            }
        }
        let expected = invoice.version();
        invoice.apply_refund(input.amount)?;
        self.ledger.ensure_postable(tenant_id, input.refunded_on).await?;

        let refund = Payment {
            id: Uuid::new_v4(),
            tenant_id,
            invoice_id,
            kind: PaymentKind::Refund,
            amount: input.amount,
            fee: 0,
            method: "refund".to_string(),
            provider: input.provider,
            external_id: input.external_id,
            payment_id: input.payment_id,
            journal_entry_id: None,
            received_at: received_at(input.refunded_on),
        };
        if let Some(existing) = self.persist(&invoice, expected, &refund).await? {
            return self.existing_payment(tenant_id, invoice_id, existing).await;
        }
        let refund = self.post_payment(&invoice, refund, actor).await?;

        counter!("payments_recorded_total", "kind" => "refund", "provider" => refund.provider.clone())
            .increment(1);
        info!(
            tenant_id = %tenant_id,
            invoice = %invoice.number,
            amount = refund.amount,
            status = %invoice.status,
            "Refund recorded"
        );
        self.crm
            .log(
                tenant_id,
                Some(invoice.account_id),
                "invoice",
                invoice.id,
                "refund.recorded",
                json!({
                    "number": invoice.number,
                    "amount": refund.amount,
                    "provider": refund.provider,
                    "external_id": refund.external_id,
                }),
            )
            .await;

        Ok(RecordedPayment {
            payment: refund,
            invoice,
            created: true,
        })
    }

    /// 付款确认邮件，失败只记录日志
    async fn send_receipt(&self, invoice: &Invoice, payment: &Payment) {
        let (Some(mailer), Some(to)) = (self.mailer.as_ref(), invoice.billing_email.as_deref()) else {
            return;
        };
        let html = receipt_html(invoice, payment);
        let email = mailer.envelope(
            to,
            None,
            format!("Payment received for invoice {}", invoice.number),
            html,
        );
        if let Err(e) = mailer.send(&email).await {
            warn!(invoice = %invoice.number, error = %e, "Failed to send payment confirmation");
        }
    }
}

fn received_at(date: NaiveDate) -> chrono::DateTime<Utc> {
    let today = Utc::now();
    if today.date_naive() == date {
        today
    } else {
        date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

fn receipt_html(invoice: &Invoice, payment: &Payment) -> String {
    format!(
        "<html><body><p>Thank you for your payment.</p>\
<p>We received {currency} {amount} for invoice {number}.</p>\
<p>Remaining balance: {currency} {balance}</p></body></html>",
        currency = html_escape::encode_text(&invoice.currency),
        amount = format_cents(payment.amount),
        number = html_escape::encode_text(&invoice.number),
        balance = format_cents(invoice.balance_due()),
    )
}

