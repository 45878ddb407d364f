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
use crate::domain::models::pricing::Totals;
use crate::domain::models::quote::{Quote, QuoteStatus};
use crate::domain::repositories::quote_repository::{QuoteQuery, QuoteRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::quote;

/// 报价仓库实现
#[derive(Clone)]
pub struct QuoteRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl QuoteRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn active_model(quote: &Quote) -> Result<quote::ActiveModel, RepositoryError> {
    Ok(quote::ActiveModel {
        id: Set(quote.id),
        tenant_id: Set(quote.tenant_id),
        number: Set(quote.number.clone()),
        account_id: Set(quote.account_id),
        contact_id: Set(quote.contact_id),
        status: Set(quote.status.as_str().to_string()),
        lines: Set(to_json(&quote.lines)?),
        discount: Set(quote.discount.as_ref().map(to_json).transpose()?),
        tax_rate_bps: Set(quote.tax_rate_bps),
        subtotal: Set(quote.totals.subtotal),
        discount_total: Set(quote.totals.discount_total),
        tax_total: Set(quote.totals.tax_total),
        total: Set(quote.totals.total),
        valid_until: Set(quote.valid_until),
        invoice_id: Set(quote.invoice_id),
        created_at: Set(tz(quote.created_at)),
        updated_at: Set(tz(quote.updated_at)),
    })
}

impl TryFrom<quote::Model> for Quote {
    type Error = RepositoryError;

    fn try_from(model: quote::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            number: model.number,
            account_id: model.account_id,
            contact_id: model.contact_id,
            status: parse_column(&model.status, "quote status")?,
            lines: from_json(model.lines, "quote lines")?,
            discount: model
                .discount
                .map(|d| from_json(d, "quote discount"))
                .transpose()?,
            tax_rate_bps: model.tax_rate_bps,
            totals: Totals {
                subtotal: model.subtotal,
                discount_total: model.discount_total,
                tax_total: model.tax_total,
                total: model.total,
            },
            valid_until: model.valid_until,
            invoice_id: model.invoice_id,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

#[async_trait]
impl QuoteRepository for QuoteRepoImpl {
    async fn create(&self, quote: &Quote) -> Result<Quote, RepositoryError> {
        quote::Entity::insert(active_model(quote)?)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(quote.clone())
    }

    async fn update(&self, quote: &Quote, expected: QuoteStatus) -> Result<Quote, RepositoryError> {
        let mut linked = Condition::any().add(quote::Column::InvoiceId.is_null());
        if let Some(invoice_id) = quote.invoice_id {
            linked = linked.add(quote::Column::InvoiceId.eq(invoice_id));
        }
        let result = quote::Entity::update_many()
            .col_expr(quote::Column::Status, Expr::value(quote.status.as_str()))
            .col_expr(quote::Column::ContactId, Expr::value(quote.contact_id))
            .col_expr(quote::Column::Lines, Expr::value(to_json(&quote.lines)?))
            .col_expr(
                quote::Column::Discount,
                Expr::value(quote.discount.as_ref().map(to_json).transpose()?),
            )
            .col_expr(quote::Column::TaxRateBps, Expr::value(quote.tax_rate_bps))
            .col_expr(quote::Column::Subtotal, Expr::value(quote.totals.subtotal))
            .col_expr(quote::Column::DiscountTotal, Expr::value(quote.totals.discount_total))
            .col_expr(quote::Column::TaxTotal, Expr::value(quote.totals.tax_total))
            .col_expr(quote::Column::Total, Expr::value(quote.totals.total))
            .col_expr(quote::Column::ValidUntil, Expr::value(quote.valid_until))
            .col_expr(quote::Column::InvoiceId, Expr::value(quote.invoice_id))
            .col_expr(quote::Column::UpdatedAt, Expr::value(tz(quote.updated_at)))
            .filter(quote::Column::TenantId.eq(quote.tenant_id))
            .filter(quote::Column::Id.eq(quote.id))
            .filter(quote::Column::Status.eq(expected.as_str()))
            .filter(linked)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            let exists = quote::Entity::find_by_id(quote.id)
                .filter(quote::Column::TenantId.eq(quote.tenant_id))
                .one(self.db.as_ref())
                .await?
                .is_some();
            return Err(if exists {
                RepositoryError::Conflict(format!("quote {} was modified concurrently", quote.number))
            } else {
                RepositoryError::NotFound
            });
        }
        Ok(quote.clone())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Quote>, RepositoryError> {
        quote::Entity::find_by_id(id)
            .filter(quote::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Quote::try_from)
            .transpose()
    }

    async fn list(&self, tenant_id: Uuid, query: QuoteQuery) -> Result<Vec<Quote>, RepositoryError> {
        let mut select = quote::Entity::find().filter(quote::Column::TenantId.eq(tenant_id));
        if let Some(account_id) = query.account_id {
            select = select.filter(quote::Column::AccountId.eq(account_id));
        }
        if let Some(statuses) = query.statuses {
            select = select.filter(quote::Column::Status.is_in(statuses.iter().map(|s| s.as_str())));
        }
        select
            .order_by_desc(quote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Quote::try_from)
            .collect()
    }
}
