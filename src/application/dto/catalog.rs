// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::models::catalog::{BundleItem, ProductKind};
use crate::domain::models::pricing::DiscountKind;

/// 产品请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ProductRequestDto {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub unit_price: i64,
    #[serde(default)]
    pub kind: ProductKind,
    pub active: Option<bool>,
}

/// 套餐请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BundleRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub items: Vec<BundleItem>,
    #[validate(range(min = 0))]
    pub price: i64,
}

/// 折扣码请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DiscountRequestDto {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub kind: DiscountKind,
    #[validate(range(min = 0))]
    pub value: i64,
    pub expires_at: Option<NaiveDate>,
    pub active: Option<bool>,
}
