// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, Query, State};
use serde::Serialize;
use uuid::Uuid;

use crate::application::dto::billing::{
    InvoiceFilterDto, InvoiceRequestDto, PaymentRequestDto, QuoteFilterDto, QuoteRequestDto,
    RefundRequestDto,
};
use crate::domain::models::invoice::{Invoice, InvoiceView, Payment};
use crate::domain::models::quote::{Quote, QuoteDecision};
use crate::domain::models::tenant::Permission;
use crate::domain::services::invoice_service::RecordedPayment;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

/// 收付款结果；`created = false` 表示渠道ID重复，返回的是已有记录
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment: Payment,
    pub invoice: Invoice,
    pub created: bool,
}

impl From<RecordedPayment> for ApiResponse<PaymentResponse> {
    fn from(recorded: RecordedPayment) -> Self {
        let created = recorded.created;
        let body = PaymentResponse {
            payment: recorded.payment,
            invoice: recorded.invoice,
            created,
        };
        if created {
            ApiResponse::created(body)
        } else {
            ApiResponse::ok(body)
        }
    }
}

// ---- quotes ----

pub async fn create_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<QuoteRequestDto>,
) -> ApiResult<Quote> {
    user.require(Permission::BillingWrite)?;
    let quote = state
        .quotes
        .create(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(quote))
}

pub async fn get_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(state.quotes.get(user.tenant_id, id).await?))
}

pub async fn list_quotes(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<QuoteFilterDto>,
) -> ApiResult<Vec<Quote>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(state.quotes.list(user.tenant_id, filter).await?))
}

pub async fn send_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    user.require(Permission::BillingWrite)?;
    Ok(ApiResponse::ok(state.quotes.send(user.tenant_id, id).await?))
}

pub async fn accept_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    user.require(Permission::BillingWrite)?;
    let quote = state
        .quotes
        .decide(user.tenant_id, id, QuoteDecision::Accept)
        .await?;
    Ok(ApiResponse::ok(quote))
}

pub async fn decline_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Quote> {
    user.require(Permission::BillingWrite)?;
    let quote = state
        .quotes
        .decide(user.tenant_id, id, QuoteDecision::Decline)
        .await?;
    Ok(ApiResponse::ok(quote))
}

/// 已接受的报价转为草稿发票，每个报价只能转换一次
pub async fn convert_quote(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Invoice> {
    user.require(Permission::BillingWrite)?;
    let invoice = state
        .quotes
        .convert_to_invoice(user.tenant_id, id)
        .await?;
    Ok(ApiResponse::created(invoice))
}

// ---- invoices ----

pub async fn create_invoice(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<InvoiceRequestDto>,
) -> ApiResult<Invoice> {
    user.require(Permission::BillingWrite)?;
    let invoice = state
        .invoices
        .create(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(invoice))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceView> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(state.invoices.get(user.tenant_id, id).await?))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: StaffUser,
    Query(filter): Query<InvoiceFilterDto>,
) -> ApiResult<Vec<InvoiceView>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.invoices.list(user.tenant_id, filter).await?,
    ))
}

/// 开票：草稿转为待收款并自动过账
pub async fn issue_invoice(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Invoice> {
    user.require(Permission::BillingWrite)?;
    let invoice = state
        .invoices
        .issue(user.tenant_id, id, Some(user.user_id))
        .await?;
    Ok(ApiResponse::ok(invoice))
}

pub async fn void_invoice(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Invoice> {
    user.require(Permission::BillingWrite)?;
    let invoice = state
        .invoices
        .void(user.tenant_id, id, Some(user.user_id))
        .await?;
    Ok(ApiResponse::ok(invoice))
}

pub async fn list_payments(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Payment>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.invoices.list_payments(user.tenant_id, id).await?,
    ))
}

pub async fn record_payment(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentRequestDto>,
) -> ApiResult<PaymentResponse> {
    user.require(Permission::BillingWrite)?;
    let recorded = state
        .invoices
        .record_payment(user.tenant_id, id, validated(payload)?.into(), Some(user.user_id))
        .await?;
    Ok(recorded.into())
}

pub async fn record_refund(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequestDto>,
) -> ApiResult<PaymentResponse> {
    user.require(Permission::BillingWrite)?;
    let recorded = state
        .invoices
        .record_refund(user.tenant_id, id, validated(payload)?.into(), Some(user.user_id))
        .await?;
    Ok(recorded.into())
}
