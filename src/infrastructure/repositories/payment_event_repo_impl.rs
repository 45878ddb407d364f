// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use super::{parse_column, tz, utc, write_err};
use crate::domain::models::payment_event::{
    PaymentProvider, PaymentWebhookEvent, WebhookEventStatus,
};
use crate::domain::repositories::payment_event_repository::PaymentEventRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::payment_webhook_event;

/// 支付回调事件仓库实现
#[derive(Clone)]
pub struct PaymentEventRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl PaymentEventRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<payment_webhook_event::Model> for PaymentWebhookEvent {
    type Error = RepositoryError;

    fn try_from(model: payment_webhook_event::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            provider: parse_column(&model.provider, "provider")?,
            event_id: model.event_id,
            event_type: model.event_type,
            tenant_id: model.tenant_id,
            status: parse_column(&model.status, "webhook status")?,
            error: model.error,
            payload: model.payload,
            received_at: utc(model.received_at),
            processed_at: model.processed_at.map(utc),
        })
    }
}

#[async_trait]
impl PaymentEventRepository for PaymentEventRepoImpl {
    async fn insert(&self, event: &PaymentWebhookEvent) -> Result<(), RepositoryError> {
        let active_model = payment_webhook_event::ActiveModel {
            id: Set(event.id),
            provider: Set(event.provider.as_str().to_string()),
            event_id: Set(event.event_id.clone()),
            event_type: Set(event.event_type.clone()),
            tenant_id: Set(event.tenant_id),
            status: Set(event.status.as_str().to_string()),
            error: Set(event.error.clone()),
            payload: Set(event.payload.clone()),
            received_at: Set(tz(event.received_at)),
            processed_at: Set(event.processed_at.map(tz)),
        };
        payment_webhook_event::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(())
    }

    async fn find(
        &self,
        provider: PaymentProvider,
        event_id: &str,
    ) -> Result<Option<PaymentWebhookEvent>, RepositoryError> {
        payment_webhook_event::Entity::find()
            .filter(payment_webhook_event::Column::Provider.eq(provider.as_str()))
            .filter(payment_webhook_event::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await?
            .map(PaymentWebhookEvent::try_from)
            .transpose()
    }

    async fn claim_failed(
        &self,
        provider: PaymentProvider,
        event_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = payment_webhook_event::Entity::update_many()
            .col_expr(
                payment_webhook_event::Column::Status,
                Expr::value(WebhookEventStatus::Processing.as_str()),
            )
            .filter(payment_webhook_event::Column::Provider.eq(provider.as_str()))
            .filter(payment_webhook_event::Column::EventId.eq(event_id))
            .filter(payment_webhook_event::Column::Status.eq(WebhookEventStatus::Failed.as_str()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn mark(
        &self,
        provider: PaymentProvider,
        event_id: &str,
        status: WebhookEventStatus,
        error: Option<String>,
    ) -> Result<(), RepositoryError> {
        let result = payment_webhook_event::Entity::update_many()
            .col_expr(payment_webhook_event::Column::Status, Expr::value(status.as_str()))
            .col_expr(payment_webhook_event::Column::Error, Expr::value(error))
            .col_expr(
                payment_webhook_event::Column::ProcessedAt,
                Expr::value(Some(tz(Utc::now()))),
            )
            .filter(payment_webhook_event::Column::Provider.eq(provider.as_str()))
            .filter(payment_webhook_event::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
