use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use panel_core::error::AppError;
use std::net::SocketAddr;

use crate::{
    dtos::{
        admin::{RevokeAllResponse, RevokeSessionRequest},
        OkResponse,
    },
    middleware::AuthUser,
    models::Requester,
    utils::{cookie::refresh_cookie_value, ValidatedJson},
    AppState,
};

/// Id of the live session behind the request's refresh cookie, if it belongs
/// to the requester. A rotated, revoked or expired cookie marks nothing.
async fn current_session_id(state: &AppState, jar: &CookieJar, requester: &Requester) -> Option<i64> {
    let raw = refresh_cookie_value(jar)?;
    match state.sessions.resolve_live(&raw).await {
        Ok(session)
            if session.restaurant_id == requester.restaurant_id
                && session.admin_email == requester.email =>
        {
            Some(session.id)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Refresh cookie did not resolve to a session");
            None
        }
    }
}

/// List sessions of a restaurant
///
/// Owners see every admin's sessions, other roles only their own.
#[utoipa::path(
    get,
    path = "/api/admin/sessions/{restaurant_id}",
    params(
        ("restaurant_id" = i64, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Sessions, newest first", body = Vec<SessionInfo>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Requester belongs to another restaurant", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(restaurant_id): Path<i64>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let requester = user.requester();
    let current = current_session_id(&state, &jar, &requester).await;

    let sessions = state
        .session_admin
        .list_sessions(&requester, restaurant_id, current)
        .await?;

    Ok((StatusCode::OK, Json(sessions)))
}

/// Revoke one session
#[utoipa::path(
    post,
    path = "/api/admin/sessions/revoke",
    request_body = RevokeSessionRequest,
    responses(
        (status = 200, description = "Session revoked", body = OkResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Not allowed to revoke this session", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<RevokeSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .session_admin
        .revoke(&user.requester(), req.session_id, &addr.ip().to_string())
        .await?;

    Ok((StatusCode::OK, Json(OkResponse::ok())))
}

/// Revoke every other session of the signed-in admin
///
/// The session behind the request's refresh cookie, if any, is kept.
#[utoipa::path(
    post,
    path = "/api/admin/sessions/revoke_all",
    responses(
        (status = 200, description = "Other sessions revoked", body = RevokeAllResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let requester = user.requester();
    let current = current_session_id(&state, &jar, &requester).await;

    let revoked = state
        .session_admin
        .revoke_all_others(
            requester.restaurant_id,
            &requester.email,
            current,
            &addr.ip().to_string(),
        )
        .await?;

    Ok((StatusCode::OK, Json(RevokeAllResponse { ok: true, revoked })))
}
