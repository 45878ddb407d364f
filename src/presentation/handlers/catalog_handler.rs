// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::dto::catalog::{BundleRequestDto, DiscountRequestDto, ProductRequestDto};
use crate::domain::models::catalog::{Bundle, Discount, Product};
use crate::domain::models::pricing::LineItem;
use crate::domain::models::tenant::Permission;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivePayload {
    pub active: bool,
}

pub async fn create_product(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<ProductRequestDto>,
) -> ApiResult<Product> {
    user.require(Permission::BillingWrite)?;
    let product = state
        .catalog
        .create_product(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequestDto>,
) -> ApiResult<Product> {
    user.require(Permission::BillingWrite)?;
    let product = state
        .catalog
        .update_product(user.tenant_id, id, validated(payload)?)
        .await?;
    Ok(ApiResponse::ok(product))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.catalog.get_product(user.tenant_id, id).await?,
    ))
}

pub async fn list_products(State(state): State<AppState>, user: StaffUser) -> ApiResult<Vec<Product>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.catalog.list_products(user.tenant_id).await?,
    ))
}

pub async fn create_bundle(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<BundleRequestDto>,
) -> ApiResult<Bundle> {
    user.require(Permission::BillingWrite)?;
    let bundle = state
        .catalog
        .create_bundle(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(bundle))
}

pub async fn list_bundles(State(state): State<AppState>, user: StaffUser) -> ApiResult<Vec<Bundle>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(state.catalog.list_bundles(user.tenant_id).await?))
}

/// 预览套餐展开后的明细行
pub async fn expand_bundle(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LineItem>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.catalog.expand_bundle(user.tenant_id, id).await?,
    ))
}

pub async fn create_discount(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<DiscountRequestDto>,
) -> ApiResult<Discount> {
    user.require(Permission::BillingWrite)?;
    let discount = state
        .catalog
        .create_discount(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(discount))
}

pub async fn list_discounts(State(state): State<AppState>, user: StaffUser) -> ApiResult<Vec<Discount>> {
    user.require(Permission::BillingRead)?;
    Ok(ApiResponse::ok(
        state.catalog.list_discounts(user.tenant_id).await?,
    ))
}

pub async fn set_discount_active(
    State(state): State<AppState>,
    user: StaffUser,
    Path(code): Path<String>,
    Json(payload): Json<ActivePayload>,
) -> ApiResult<Discount> {
    user.require(Permission::BillingWrite)?;
    let discount = state
        .catalog
        .set_discount_active(user.tenant_id, &code, payload.active)
        .await?;
    Ok(ApiResponse::ok(discount))
}
