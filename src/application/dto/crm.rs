// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::crm::{AccountStatus, DealStage};

/// 客户请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AccountRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 253))]
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: Option<AccountStatus>,
}

/// 联系人请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ContactRequestDto {
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub title: Option<String>,
}

/// 商机请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DealRequestDto {
    pub account_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub amount: i64,
    pub stage: Option<DealStage>,
    pub expected_close: Option<NaiveDate>,
}

/// 商机阶段变更DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DealStageRequestDto {
    pub stage: DealStage,
}

/// 列表过滤参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountFilterDto {
    pub account_id: Option<Uuid>,
}
