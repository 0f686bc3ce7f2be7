use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use panel_core::error::AppError;
use secrecy::ExposeSecret;
use std::net::SocketAddr;

use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse, RefreshResponse, VerifyResponse},
        OkResponse,
    },
    handlers::client_context,
    middleware::AuthUser,
    services::ServiceError,
    utils::{
        cookie::{clear_refresh_cookie, refresh_cookie_value, set_refresh_cookie},
        Password, ValidatedJson,
    },
    AppState,
};

/// Login with restaurant, email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, refresh cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = client_context(&addr, &headers);
    let outcome = state
        .auth
        .login(
            req.restaurant_id,
            &req.email,
            &Password::new(req.password),
            &client,
        )
        .await?;

    let jar = set_refresh_cookie(
        jar,
        outcome.session.raw.expose_secret(),
        &state.config.session,
    );

    Ok((
        StatusCode::OK,
        jar,
        Json(LoginResponse {
            token: outcome.access_token,
            role: outcome.role,
            expires_in: outcome.expires_in,
            current_session_id: outcome.session.session.id,
        }),
    ))
}

/// Check an access token and return its claims
#[utoipa::path(
    get,
    path = "/api/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify(user: AuthUser) -> impl IntoResponse {
    let claims = user.0;
    Json(VerifyResponse {
        valid: true,
        role: claims.role,
        email: claims.email,
        restaurant_id: claims.restaurant_id,
    })
}

/// Rotate the refresh cookie and issue a new access token
#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "Session rotated, new refresh cookie set", body = RefreshResponse),
        (status = 401, description = "Missing, revoked, expired or already used refresh token", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let raw = refresh_cookie_value(&jar).ok_or(ServiceError::InvalidSession)?;
    let client = client_context(&addr, &headers);

    let outcome = state.auth.refresh(&raw, &client).await?;

    let jar = set_refresh_cookie(
        jar,
        outcome.session.raw.expose_secret(),
        &state.config.session,
    );

    Ok((
        StatusCode::OK,
        jar,
        Json(RefreshResponse {
            access_token: outcome.access_token,
            role: outcome.role,
            expires_in: outcome.expires_in,
            current_session_id: outcome.session.session.id,
        }),
    ))
}

/// Revoke the current refresh session and clear the cookie
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out", body = OkResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let raw = refresh_cookie_value(&jar);
    let client = client_context(&addr, &headers);

    state.auth.logout(raw.as_deref(), &client).await?;

    let jar = clear_refresh_cookie(jar, &state.config.session);
    Ok((StatusCode::OK, jar, Json(OkResponse::ok())))
}
