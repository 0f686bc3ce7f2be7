mod common;

use async_trait::async_trait;
use common::{test_config, TEST_PASSWORD};
use panel_auth::{
    models::{AuditEvent, Role},
    services::{AuditSink, ClientContext, CredentialStore, MemoryStore, MockEmailService, ServiceError},
    utils::{hash_password, Password},
    AppState,
};
use std::sync::Arc;

struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn append(&self, _event: &AuditEvent) -> Result<(), ServiceError> {
        Err(ServiceError::StoreUnavailable(anyhow::anyhow!(
            "audit_log unavailable"
        )))
    }
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_operation() {
    let store = Arc::new(MemoryStore::new());
    let hash = hash_password(&Password::new(TEST_PASSWORD.to_string())).unwrap();
    store
        .upsert_admin(1, "owner@bistro.test", hash.as_str(), Role::Owner)
        .await
        .unwrap();

    let state = AppState::with_audit_sink(
        test_config(),
        store.clone(),
        Arc::new(BrokenSink),
        Arc::new(MockEmailService::new()),
    );
    let client = ClientContext::new("10.0.0.1", "ua");

    let login = state
        .auth
        .login(1, "owner@bistro.test", &Password::new(TEST_PASSWORD.to_string()), &client)
        .await
        .unwrap();

    let raw = secrecy::ExposeSecret::expose_secret(&login.session.raw).clone();
    state.auth.refresh(&raw, &client).await.unwrap();

    assert_eq!(store.sessions.lock().unwrap().len(), 2);
    assert!(store.audit_log.lock().unwrap().is_empty());
}
