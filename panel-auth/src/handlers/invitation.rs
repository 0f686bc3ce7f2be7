use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use panel_core::error::AppError;
use std::net::SocketAddr;

use crate::{
    dtos::{
        admin::{AcceptInviteRequest, InviteRequest, InviteResponse},
        OkResponse,
    },
    middleware::AuthUser,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Invite an admin to a restaurant (owners only)
#[utoipa::path(
    post,
    path = "/api/admin/invite/{restaurant_id}",
    params(
        ("restaurant_id" = i64, Path, description = "Restaurant the invitee joins")
    ),
    request_body = InviteRequest,
    responses(
        (status = 200, description = "Invitation issued and emailed", body = InviteResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Requester is not an owner of this restaurant", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Invitations",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn invite(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(restaurant_id): Path<i64>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state
        .invitations
        .invite(
            &user.requester(),
            restaurant_id,
            &req.email,
            req.role,
            &addr.ip().to_string(),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(InviteResponse {
            ok: true,
            expires_at: issued.expires_at(),
        }),
    ))
}

/// Accept an invitation and set the account password
#[utoipa::path(
    post,
    path = "/api/admin/invite/accept",
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Account provisioned", body = OkResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Invitations"
)]
pub async fn accept(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ValidatedJson(req): ValidatedJson<AcceptInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .invitations
        .accept(
            &req.token,
            &Password::new(req.password),
            &addr.ip().to_string(),
        )
        .await?;

    Ok((StatusCode::OK, Json(OkResponse::ok())))
}
