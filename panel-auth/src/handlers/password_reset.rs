use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use panel_core::error::AppError;
use std::net::SocketAddr;

use crate::{
    dtos::{
        admin::{PasswordResetConfirmRequest, PasswordResetRequest},
        OkResponse,
    },
    utils::{Password, ValidatedJson},
    AppState,
};

/// Request a password reset email
///
/// Always answers `{ok: true}` for a well-formed request, whether or not the
/// account exists.
#[utoipa::path(
    post,
    path = "/api/admin/password_reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Request accepted", body = OkResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Password reset"
)]
pub async fn request(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .password_resets
        .request(req.restaurant_id, &req.email, &addr.ip().to_string())
        .await?;

    Ok((StatusCode::OK, Json(OkResponse::ok())))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/admin/password_reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password updated", body = OkResponse),
        (status = 400, description = "Invalid, used or expired token, or account missing", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password reset"
)]
pub async fn confirm(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .password_resets
        .confirm(
            &req.token,
            &Password::new(req.password),
            &addr.ip().to_string(),
        )
        .await?;

    Ok((StatusCode::OK, Json(OkResponse::ok())))
}
