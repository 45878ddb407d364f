// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Json, Path, State};
use uuid::Uuid;

use crate::application::dto::outreach::{
    CampaignRequestDto, EnrollRequestDto, SequenceRequestDto, TemplateRequestDto,
};
use crate::domain::models::outreach::{
    Campaign, CampaignStats, EmailTemplate, Enrollment, OutreachSequence,
};
use crate::domain::models::tenant::Permission;
use crate::domain::services::campaign_service::CampaignSendReport;
use crate::presentation::extractors::auth_user::StaffUser;
use crate::presentation::response::{validated, ApiResponse, ApiResult};
use crate::presentation::state::AppState;

// ---- templates ----

pub async fn create_template(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<TemplateRequestDto>,
) -> ApiResult<EmailTemplate> {
    user.require(Permission::MarketingWrite)?;
    let template = state
        .outreach
        .create_template(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(template))
}

pub async fn list_templates(
    State(state): State<AppState>,
    user: StaffUser,
) -> ApiResult<Vec<EmailTemplate>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(
        state.outreach.list_templates(user.tenant_id).await?,
    ))
}

// ---- sequences ----

pub async fn create_sequence(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<SequenceRequestDto>,
) -> ApiResult<OutreachSequence> {
    user.require(Permission::MarketingWrite)?;
    let sequence = state
        .outreach
        .create_sequence(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(sequence))
}

pub async fn list_sequences(
    State(state): State<AppState>,
    user: StaffUser,
) -> ApiResult<Vec<OutreachSequence>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(
        state.outreach.list_sequences(user.tenant_id).await?,
    ))
}

/// 联系人加入序列，同一序列内只能有一个进行中的入组
pub async fn enroll(
    State(state): State<AppState>,
    user: StaffUser,
    Path(sequence_id): Path<Uuid>,
    Json(payload): Json<EnrollRequestDto>,
) -> ApiResult<Enrollment> {
    user.require(Permission::MarketingWrite)?;
    let enrollment = state
        .outreach
        .enroll(user.tenant_id, sequence_id, payload.contact_id)
        .await?;
    Ok(ApiResponse::created(enrollment))
}

pub async fn list_enrollments(
    State(state): State<AppState>,
    user: StaffUser,
    Path(sequence_id): Path<Uuid>,
) -> ApiResult<Vec<Enrollment>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(
        state
            .outreach
            .list_enrollments(user.tenant_id, sequence_id)
            .await?,
    ))
}

pub async fn cancel_enrollment(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Enrollment> {
    user.require(Permission::MarketingWrite)?;
    Ok(ApiResponse::ok(
        state.outreach.cancel_enrollment(user.tenant_id, id).await?,
    ))
}

// ---- campaigns ----

pub async fn create_campaign(
    State(state): State<AppState>,
    user: StaffUser,
    Json(payload): Json<CampaignRequestDto>,
) -> ApiResult<Campaign> {
    user.require(Permission::MarketingWrite)?;
    let campaign = state
        .campaigns
        .create(user.tenant_id, validated(payload)?)
        .await?;
    Ok(ApiResponse::created(campaign))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Campaign> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.campaigns.get(user.tenant_id, id).await?))
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    user: StaffUser,
) -> ApiResult<Vec<Campaign>> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.campaigns.list(user.tenant_id).await?))
}

/// 发送活动，每个活动只发送一次
pub async fn send_campaign(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CampaignSendReport> {
    user.require(Permission::MarketingWrite)?;
    Ok(ApiResponse::ok(state.campaigns.send(user.tenant_id, id).await?))
}

pub async fn campaign_stats(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CampaignStats> {
    user.require(Permission::CrmRead)?;
    Ok(ApiResponse::ok(state.campaigns.stats(user.tenant_id, id).await?))
}
