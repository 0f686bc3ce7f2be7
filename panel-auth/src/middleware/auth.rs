use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};

use crate::{dtos::ErrorResponse, models::Requester, services::AccessTokenClaims, AppState};

type Rejection = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: &str) -> Rejection {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid access token and stashes the claims
/// for `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let claims = {
        let token = bearer_token(req.headers()).ok_or_else(|| {
            reject(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header",
            )
        })?;

        state
            .auth
            .verify_access_token(token)
            .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Claims of the signed-in admin. Only valid behind `auth_middleware`.
pub struct AuthUser(pub AccessTokenClaims);

impl AuthUser {
    pub fn requester(&self) -> Requester {
        Requester::from(self.0.clone())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                reject(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Auth claims missing from request extensions",
                )
            })
    }
}
