pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use panel_core::error::AppError;
use panel_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AuthConfig, Environment};
use crate::middleware::metrics_middleware;
use crate::services::{
    AuditRecorder, AuditSink, AuthService, EmailProvider, InvitationService, JwtService,
    Notifier, PanelStore, PasswordResetService, SessionAdminService, SessionService,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::verify,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::invitation::invite,
        handlers::invitation::accept,
        handlers::password_reset::request,
        handlers::password_reset::confirm,
        handlers::sessions::list_sessions,
        handlers::sessions::revoke_session,
        handlers::sessions::revoke_all_sessions,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::OkResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::RefreshResponse,
            dtos::auth::VerifyResponse,
            dtos::admin::InviteRequest,
            dtos::admin::InviteResponse,
            dtos::admin::AcceptInviteRequest,
            dtos::admin::PasswordResetRequest,
            dtos::admin::PasswordResetConfirmRequest,
            dtos::admin::RevokeSessionRequest,
            dtos::admin::RevokeAllResponse,
            models::Role,
            models::SessionInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token verification and refresh session rotation"),
        (name = "Invitations", description = "Owner-issued onboarding of new admins"),
        (name = "Password reset", description = "Email-based password recovery"),
        (name = "Sessions", description = "Listing and revoking refresh sessions"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn PanelStore>,
    pub auth: AuthService,
    pub sessions: SessionService,
    pub invitations: InvitationService,
    pub password_resets: PasswordResetService,
    pub session_admin: SessionAdminService,
}

impl AppState {
    /// Wire every service over one store, which also receives the audit trail.
    pub fn new<S: PanelStore + 'static>(
        config: AuthConfig,
        store: Arc<S>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        let audit_sink: Arc<dyn AuditSink> = store.clone();
        Self::with_audit_sink(config, store, audit_sink, email)
    }

    pub fn with_audit_sink<S: PanelStore + 'static>(
        config: AuthConfig,
        store: Arc<S>,
        audit_sink: Arc<dyn AuditSink>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let audit = AuditRecorder::new(audit_sink);
        let notifier = Notifier::new(
            email,
            std::time::Duration::from_secs(config.notification.timeout_seconds),
        );
        let sessions = SessionService::new(store.clone());

        let auth = AuthService::new(
            store.clone(),
            jwt,
            sessions.clone(),
            audit.clone(),
            Duration::days(config.session.refresh_token_expiry_days),
        );
        let invitations = InvitationService::new(
            store.clone(),
            audit.clone(),
            notifier.clone(),
            config.notification.frontend_url.clone(),
            config.tokens.invitation_expiry_hours,
        );
        let password_resets = PasswordResetService::new(
            store.clone(),
            store.clone(),
            audit.clone(),
            notifier,
            config.notification.frontend_url.clone(),
            config.tokens.password_reset_expiry_minutes,
        );
        let session_admin = SessionAdminService::new(sessions.clone(), audit);

        Self {
            config,
            store,
            auth,
            sessions,
            invitations,
            password_resets,
            session_admin,
        }
    }
}

fn cors_layer(config: &AuthConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| {
            // Credentialed CORS cannot use a wildcard origin
            if o == "*" {
                tracing::warn!("Ignoring wildcard CORS origin, credentials require explicit origins");
                return None;
            }
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Routes behind a bearer access token
    let protected_routes = Router::new()
        .route("/api/verify", get(handlers::auth::verify))
        .route(
            "/api/admin/invite/:restaurant_id",
            post(handlers::invitation::invite),
        )
        .route(
            "/api/admin/sessions/:restaurant_id",
            get(handlers::sessions::list_sessions),
        )
        .route(
            "/api/admin/sessions/revoke",
            post(handlers::sessions::revoke_session),
        )
        .route(
            "/api/admin/sessions/revoke_all",
            post(handlers::sessions::revoke_all_sessions),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    if state.config.environment == Environment::Dev {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .route("/api/login", post(handlers::auth::login))
        .route(
            "/api/refresh",
            post(handlers::auth::refresh).get(handlers::auth::refresh),
        )
        .route("/api/logout", post(handlers::auth::logout))
        .route(
            "/api/admin/invite/accept",
            post(handlers::invitation::accept),
        )
        .route(
            "/api/admin/password_reset/request",
            post(handlers::password_reset::request),
        )
        .route(
            "/api/admin/password_reset/confirm",
            post(handlers::password_reset::confirm),
        )
        .merge(protected_routes)
        .with_state(state.clone())
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config));

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Store unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
