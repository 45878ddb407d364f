// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::presentation::errors::AppError;
use crate::presentation::state::AppState;

/// 1×1 透明 GIF
const PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// 打开追踪：无论令牌是否有效都返回像素
pub async fn open_pixel(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    if let Err(e) = state.tracking.record_open(&token).await {
        warn!(error = %e, "Failed to record email open");
    }
    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, max-age=0"),
        ],
        PIXEL_GIF,
    )
        .into_response()
}

/// 点击追踪：记录后 302 跳转到原始链接
pub async fn click(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let url = state.tracking.record_click(&token).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// 退订确认页
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Html<String>, AppError> {
    let email = state.tracking.unsubscribe(&token).await?;
    Ok(Html(format!(
        "<!DOCTYPE html><html><body><p>{} has been unsubscribed.</p></body></html>",
        html_escape::encode_text(&email)
    )))
}
