// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::outreach::SequenceStep;

/// 邮件模板请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TemplateRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub html_body: String,
}

/// 外呼序列请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SequenceRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub steps: Vec<SequenceStep>,
}

/// 入组请求DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrollRequestDto {
    pub contact_id: Uuid,
}

/// 营销活动请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CampaignRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub html_body: String,
    pub recipient_ids: Option<Vec<Uuid>>,
}
