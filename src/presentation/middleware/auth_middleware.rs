// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::services::auth_service::TokenKind;
use crate::presentation::errors::AppError;
use crate::presentation::state::AppState;

/// 认证中间件
///
/// 校验 `Authorization: Bearer <jwt>`，通过后把 [`Claims`] 写入请求扩展，
/// 由 `StaffUser` / `PortalUser` 提取器进一步区分令牌类型。
/// 门户令牌额外确认门户用户仍处于启用状态。
///
/// [`Claims`]: crate::domain::services::auth_service::Claims
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(DomainError::Unauthorized)?;

    let claims = state.auth.verify_token(token.trim())?;
    if claims.kind == TokenKind::Portal {
        state.auth.portal_user(claims.tenant, claims.sub).await?;
    }

    debug!(
        path = %req.uri().path(),
        tenant_id = %claims.tenant,
        user_id = %claims.sub,
        "Request authenticated"
    );
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
