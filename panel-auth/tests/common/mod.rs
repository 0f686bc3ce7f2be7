//! Shared setup for panel-auth integration tests.
//!
//! Everything runs over `MemoryStore` and `MockEmailService`, so no database
//! or SMTP relay is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    Router,
};
use panel_auth::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, JwtConfig, NotificationConfig,
        OneTimeTokenConfig, SecurityConfig, SessionConfig,
    },
    models::{AdminIdentity, Role},
    services::{CredentialStore, MemoryStore, MockEmailService, SentEmail},
    utils::{hash_password, Password},
    AppState,
};
use secrecy::Secret;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: panel_core::config::Config {
            host: std::net::Ipv4Addr::LOCALHOST.into(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "panel-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            signing_secret: Secret::new("integration-test-signing-secret-0123456789".to_string()),
            access_token_expiry_minutes: 15,
        },
        session: SessionConfig {
            refresh_token_expiry_days: 30,
            retention_days: 30,
            cookie_secure: false,
        },
        tokens: OneTimeTokenConfig {
            invitation_expiry_hours: 72,
            password_reset_expiry_minutes: 60,
        },
        notification: NotificationConfig {
            frontend_url: "http://panel.test".to_string(),
            timeout_seconds: 2,
            smtp: None,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://panel.test".to_string()],
        },
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub email: MockEmailService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let email = MockEmailService::new();
        let state = AppState::new(test_config(), store.clone(), Arc::new(email.clone()));
        Self {
            state,
            store,
            email,
        }
    }

    pub async fn router(&self) -> Router {
        build_router(self.state.clone())
            .await
            .expect("Failed to build router")
    }

    pub async fn seed_admin(&self, restaurant_id: i64, email: &str, role: Role) -> AdminIdentity {
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("Failed to hash password");
        self.store
            .upsert_admin(restaurant_id, email, hash.as_str(), role)
            .await
            .expect("Failed to seed admin")
    }

    /// Waits for spawned notifications to land in the mock outbox.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..200 {
            let sent = self.email.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.email.sent()
    }
}

pub fn client_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40123))
}

/// Request builder with the peer address axum's `ConnectInfo` expects.
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "panel-tests/1.0")
        .extension(ConnectInfo(client_addr()))
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    request(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("Request failed")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Value of the `refresh_token` cookie set by a response, if any.
pub fn refresh_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| {
            let pair = v.split(';').next()?;
            let value = pair.strip_prefix("refresh_token=")?;
            (!value.is_empty()).then(|| value.to_string())
        })
}

/// Pulls `token=...` out of a link in a notification body.
pub fn token_from_link(body: &str) -> Option<String> {
    let start = body.find("token=")? + "token=".len();
    let rest = &body[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    Some(rest[..end].to_string())
}
