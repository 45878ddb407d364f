// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::{from_json, parse_column, to_json, tz, utc, write_err};
use crate::domain::models::invoice::{Invoice, InvoiceStatus, InvoiceVersion, Payment};
use crate::domain::models::pricing::Totals;
use crate::domain::repositories::invoice_repository::{InvoiceQuery, InvoiceRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{invoice, payment};

/// 发票与收付款仓库实现
#[derive(Clone)]
pub struct InvoiceRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl InvoiceRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 条件更新未命中时区分发票不存在与版本冲突
    async fn stale_or_missing(&self, invoice: &Invoice) -> RepositoryError {
        match invoice::Entity::find_by_id(invoice.id)
            .filter(invoice::Column::TenantId.eq(invoice.tenant_id))
            .one(self.db.as_ref())
            .await
        {
            Ok(Some(_)) => RepositoryError::Conflict(format!(
                "invoice {} was modified concurrently",
                invoice.number
            )),
            Ok(None) => RepositoryError::NotFound,
            Err(e) => RepositoryError::Database(e),
        }
    }
}

fn matches_version(expected: InvoiceVersion) -> Condition {
    Condition::all()
        .add(invoice::Column::Status.eq(expected.status.as_str()))
        .add(invoice::Column::AmountPaid.eq(expected.amount_paid))
        .add(invoice::Column::AmountRefunded.eq(expected.amount_refunded))
}

fn invoice_active_model(invoice: &Invoice) -> Result<invoice::ActiveModel, RepositoryError> {
    Ok(invoice::ActiveModel {
        id: Set(invoice.id),
        tenant_id: Set(invoice.tenant_id),
        number: Set(invoice.number.clone()),
        account_id: Set(invoice.account_id),
        billing_email: Set(invoice.billing_email.clone()),
        status: Set(invoice.status.as_str().to_string()),
        issue_date: Set(invoice.issue_date),
        due_date: Set(invoice.due_date),
        currency: Set(invoice.currency.clone()),
        lines: Set(to_json(&invoice.lines)?),
        discount: Set(invoice.discount.as_ref().map(to_json).transpose()?),
        tax_rate_bps: Set(invoice.tax_rate_bps),
        subtotal: Set(invoice.totals.subtotal),
        discount_total: Set(invoice.totals.discount_total),
        tax_total: Set(invoice.totals.tax_total),
        total: Set(invoice.totals.total),
        amount_paid: Set(invoice.amount_paid),
        amount_refunded: Set(invoice.amount_refunded),
        source: Set(invoice.source.as_str().to_string()),
        quote_id: Set(invoice.quote_id),
        renewal_id: Set(invoice.renewal_id),
        issuance_entry_id: Set(invoice.issuance_entry_id),
        created_at: Set(tz(invoice.created_at)),
        updated_at: Set(tz(invoice.updated_at)),
    })
}

impl TryFrom<invoice::Model> for Invoice {
    type Error = RepositoryError;

    fn try_from(model: invoice::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            number: model.number,
            account_id: model.account_id,
            billing_email: model.billing_email,
            status: parse_column(&model.status, "invoice status")?,
            issue_date: model.issue_date,
            due_date: model.due_date,
            currency: model.currency,
            lines: from_json(model.lines, "invoice lines")?,
            discount: model
                .discount
                .map(|d| from_json(d, "invoice discount"))
                .transpose()?,
            tax_rate_bps: model.tax_rate_bps,
            totals: Totals {
                subtotal: model.subtotal,
                discount_total: model.discount_total,
                tax_total: model.tax_total,
                total: model.total,
            },
            amount_paid: model.amount_paid,
            amount_refunded: model.amount_refunded,
            source: parse_column(&model.source, "invoice source")?,
            quote_id: model.quote_id,
            renewal_id: model.renewal_id,
            issuance_entry_id: model.issuance_entry_id,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

fn payment_active_model(payment: &Payment) -> payment::ActiveModel {
    payment::ActiveModel {
        id: Set(payment.id),
        tenant_id: Set(payment.tenant_id),
        invoice_id: Set(payment.invoice_id),
        kind: Set(payment.kind.as_str().to_string()),
        amount: Set(payment.amount),
        fee: Set(payment.fee),
        method: Set(payment.method.clone()),
        provider: Set(payment.provider.clone()),
        external_id: Set(payment.external_id.clone()),
        payment_id: Set(payment.payment_id),
        journal_entry_id: Set(payment.journal_entry_id),
        received_at: Set(tz(payment.received_at)),
    }
}

impl TryFrom<payment::Model> for Payment {
    type Error = RepositoryError;

    fn try_from(model: payment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            invoice_id: model.invoice_id,
            kind: parse_column(&model.kind, "payment kind")?,
            amount: model.amount,
            fee: model.fee,
            method: model.method,
            provider: model.provider,
            external_id: model.external_id,
            payment_id: model.payment_id,
            journal_entry_id: model.journal_entry_id,
            received_at: utc(model.received_at),
        })
    }
}

#[async_trait]
impl InvoiceRepository for InvoiceRepoImpl {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice, RepositoryError> {
        invoice::Entity::insert(invoice_active_model(invoice)?)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(invoice.clone())
    }

    async fn update(
        &self,
        invoice: &Invoice,
        expected: InvoiceVersion,
    ) -> Result<Invoice, RepositoryError> {
        // 金额只通过 apply_payment 修改
        let result = invoice::Entity::update_many()
            .col_expr(invoice::Column::Status, Expr::value(invoice.status.as_str()))
            .col_expr(invoice::Column::BillingEmail, Expr::value(invoice.billing_email.clone()))
            .col_expr(invoice::Column::IssueDate, Expr::value(invoice.issue_date))
            .col_expr(invoice::Column::DueDate, Expr::value(invoice.due_date))
            .col_expr(invoice::Column::IssuanceEntryId, Expr::value(invoice.issuance_entry_id))
            .col_expr(invoice::Column::UpdatedAt, Expr::value(tz(invoice.updated_at)))
            .filter(invoice::Column::TenantId.eq(invoice.tenant_id))
            .filter(invoice::Column::Id.eq(invoice.id))
            .filter(matches_version(expected))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(self.stale_or_missing(invoice).await);
        }
        Ok(invoice.clone())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Invoice>, RepositoryError> {
        invoice::Entity::find_by_id(id)
            .filter(invoice::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    async fn list(&self, tenant_id: Uuid, query: InvoiceQuery) -> Result<Vec<Invoice>, RepositoryError> {
        let mut select = invoice::Entity::find().filter(invoice::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = query.account_id {
            select = select.filter(invoice::Column::AccountId.eq(account_id));
        }
        if let Some(statuses) = query.statuses {
            select = select.filter(invoice::Column::Status.is_in(statuses.iter().map(|s| s.as_str())));
        }
        if let Some(renewal_id) = query.renewal_id {
            select = select.filter(invoice::Column::RenewalId.eq(renewal_id));
        }
        if query.exclude_drafts {
            select = select.filter(invoice::Column::Status.ne(InvoiceStatus::Draft.as_str()));
        }
        select
            .order_by_desc(invoice::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }

    async fn apply_payment(
        &self,
        invoice: &Invoice,
        expected: InvoiceVersion,
        payment: &Payment,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        payment::Entity::insert(payment_active_model(payment))
            .exec_without_returning(&txn)
            .await
            .map_err(write_err)?;

        // 状态与金额未被其他请求修改时才更新
        let result = invoice::Entity::update_many()
            .col_expr(invoice::Column::AmountPaid, Expr::value(invoice.amount_paid))
            .col_expr(invoice::Column::AmountRefunded, Expr::value(invoice.amount_refunded))
            .col_expr(invoice::Column::Status, Expr::value(invoice.status.as_str()))
            .col_expr(invoice::Column::UpdatedAt, Expr::value(tz(invoice.updated_at)))
            .filter(invoice::Column::TenantId.eq(invoice.tenant_id))
            .filter(invoice::Column::Id.eq(invoice.id))
            .filter(matches_version(expected))
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            txn.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "invoice {} was modified concurrently",
                invoice.number
            )));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn find_payment_by_external_id(
        &self,
        tenant_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        payment::Entity::find()
            .filter(payment::Column::TenantId.eq(tenant_id))
            .filter(payment::Column::Provider.eq(provider))
            .filter(payment::Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn list_payments(&self, tenant_id: Uuid, invoice_id: Uuid) -> Result<Vec<Payment>, RepositoryError> {
        payment::Entity::find()
            .filter(payment::Column::TenantId.eq(tenant_id))
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(payment::Column::ReceivedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }

    async fn set_payment_entry(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let result = payment::Entity::update_many()
            .col_expr(payment::Column::JournalEntryId, Expr::value(Some(entry_id)))
            .filter(payment::Column::TenantId.eq(tenant_id))
            .filter(payment::Column::Id.eq(payment_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
