mod common;

use chrono::{Duration, Utc};
use common::{TestApp, TEST_PASSWORD};
use panel_auth::{
    models::Role,
    services::{secret::fingerprint, ClientContext, ServiceError},
    utils::Password,
};
use secrecy::ExposeSecret;

fn client() -> ClientContext {
    ClientContext::new("10.1.1.1", "Mozilla/5.0")
}

#[tokio::test]
async fn login_creates_exactly_one_live_session_for_the_fingerprint() {
    let app = TestApp::new();
    app.seed_admin(1, "owner@bistro.test", Role::Owner).await;

    let outcome = app
        .state
        .auth
        .login(1, "owner@bistro.test", &Password::new(TEST_PASSWORD.to_string()), &client())
        .await
        .unwrap();

    let raw = outcome.session.raw.expose_secret().clone();
    let sessions = app.store.sessions.lock().unwrap().clone();
    let live: Vec<_> = sessions
        .iter()
        .filter(|s| s.token_hash == fingerprint(&raw) && s.is_valid())
        .collect();

    assert_eq!(live.len(), 1);
    assert_eq!(live[0].restaurant_id, 1);
    assert_eq!(live[0].admin_email, "owner@bistro.test");
    assert_eq!(live[0].user_agent, "Mozilla/5.0");
    assert!(sessions.iter().all(|s| s.token_hash != raw));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.seed_admin(1, "owner@bistro.test", Role::Owner).await;

    let wrong_password = app
        .state
        .auth
        .login(1, "owner@bistro.test", &Password::new("nope-nope".to_string()), &client())
        .await
        .unwrap_err();
    let unknown_account = app
        .state
        .auth
        .login(1, "ghost@bistro.test", &Password::new(TEST_PASSWORD.to_string()), &client())
        .await
        .unwrap_err();
    let other_tenant = app
        .state
        .auth
        .login(2, "owner@bistro.test", &Password::new(TEST_PASSWORD.to_string()), &client())
        .await
        .unwrap_err();

    for err in [&wrong_password, &unknown_account, &other_tenant] {
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }
    assert_eq!(wrong_password.to_string(), unknown_account.to_string());
    assert!(app.store.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn login_normalizes_email() {
    let app = TestApp::new();
    app.seed_admin(1, "owner@bistro.test", Role::Owner).await;

    let outcome = app
        .state
        .auth
        .login(1, "  Owner@Bistro.TEST ", &Password::new(TEST_PASSWORD.to_string()), &client())
        .await
        .unwrap();
    assert_eq!(outcome.session.session.admin_email, "owner@bistro.test");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotations_of_one_secret_succeed_exactly_once() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "chef@bistro.test", &client(), Some(Duration::days(30)))
        .await
        .unwrap();
    let raw = issued.raw.expose_secret().clone();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let sessions = app.state.sessions.clone();
        let raw = raw.clone();
        handles.push(tokio::spawn(async move {
            sessions
                .rotate(&raw, &client(), Some(Duration::days(30)))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(ServiceError::InvalidSession) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    let sessions = app.store.sessions.lock().unwrap().clone();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().filter(|s| s.is_valid()).count(), 1);
}

#[tokio::test]
async fn revoked_secret_never_rotates() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "chef@bistro.test", &client(), Some(Duration::days(30)))
        .await
        .unwrap();
    let raw = issued.raw.expose_secret().clone();

    app.state.sessions.revoke(issued.session.id).await.unwrap();

    assert!(matches!(
        app.state.sessions.rotate(&raw, &client(), None).await,
        Err(ServiceError::InvalidSession)
    ));
    assert_eq!(app.store.sessions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn expired_secret_never_rotates() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "chef@bistro.test", &client(), Some(Duration::days(30)))
        .await
        .unwrap();
    let raw = issued.raw.expose_secret().clone();

    for session in app.store.sessions.lock().unwrap().iter_mut() {
        session.expires_at = Some(Utc::now() - Duration::seconds(1));
    }

    assert!(matches!(
        app.state.sessions.rotate(&raw, &client(), None).await,
        Err(ServiceError::InvalidSession)
    ));
    assert!(matches!(
        app.state.sessions.resolve_live(&raw).await,
        Err(ServiceError::InvalidSession)
    ));
}

#[tokio::test]
async fn session_without_expiry_stays_live() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "chef@bistro.test", &client(), None)
        .await
        .unwrap();

    let live = app
        .state
        .sessions
        .resolve_live(issued.raw.expose_secret())
        .await
        .unwrap();
    assert!(live.expires_at.is_none());
}

#[tokio::test]
async fn refresh_rotates_and_issues_token_for_same_identity() {
    let app = TestApp::new();
    app.seed_admin(3, "chef@bistro.test", Role::Chef).await;
    let login = app
        .state
        .auth
        .login(3, "chef@bistro.test", &Password::new(TEST_PASSWORD.to_string()), &client())
        .await
        .unwrap();
    let first_raw = login.session.raw.expose_secret().clone();

    let refreshed = app.state.auth.refresh(&first_raw, &client()).await.unwrap();
    let claims = app
        .state
        .auth
        .verify_access_token(&refreshed.access_token)
        .unwrap();

    assert_eq!(claims.restaurant_id, 3);
    assert_eq!(claims.email, "chef@bistro.test");
    assert_eq!(claims.role, Role::Chef);
    assert_ne!(refreshed.session.session.id, login.session.session.id);

    assert!(matches!(
        app.state.auth.refresh(&first_raw, &client()).await,
        Err(ServiceError::InvalidSession)
    ));
}

#[tokio::test]
async fn refresh_for_deleted_account_is_rejected() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "gone@bistro.test", &client(), Some(Duration::days(30)))
        .await
        .unwrap();

    let result = app
        .state
        .auth
        .refresh(issued.raw.expose_secret(), &client())
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidSession)));
    let sessions = app.store.sessions.lock().unwrap().clone();
    assert!(sessions.iter().all(|s| s.revoked));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = TestApp::new();
    let issued = app
        .state
        .sessions
        .create(1, "chef@bistro.test", &client(), None)
        .await
        .unwrap();
    let raw = issued.raw.expose_secret().clone();

    app.state.auth.logout(Some(&raw), &client()).await.unwrap();
    app.state.auth.logout(Some(&raw), &client()).await.unwrap();
    app.state.auth.logout(Some("unknown"), &client()).await.unwrap();
    app.state.auth.logout(None, &client()).await.unwrap();

    assert!(app.state.sessions.find(&raw).await.unwrap().revoked);
}

#[tokio::test]
async fn cleanup_removes_only_stale_revoked_and_expired_rows() {
    let app = TestApp::new();
    let sessions = &app.state.sessions;

    let old_revoked = sessions.create(1, "a@bistro.test", &client(), None).await.unwrap();
    let old_active = sessions.create(1, "a@bistro.test", &client(), None).await.unwrap();
    let old_expired = sessions
        .create(1, "a@bistro.test", &client(), Some(Duration::days(1)))
        .await
        .unwrap();
    let fresh_revoked = sessions.create(1, "a@bistro.test", &client(), None).await.unwrap();

    {
        let mut rows = app.store.sessions.lock().unwrap();
        for row in rows.iter_mut() {
            if row.id == old_revoked.session.id {
                row.created_at = Utc::now() - Duration::days(40);
                row.revoked = true;
            } else if row.id == old_active.session.id {
                row.created_at = Utc::now() - Duration::days(40);
            } else if row.id == old_expired.session.id {
                row.created_at = Utc::now() - Duration::days(41);
                row.expires_at = Some(Utc::now() - Duration::days(40));
            } else if row.id == fresh_revoked.session.id {
                row.revoked = true;
            }
        }
    }

    let deleted = sessions.cleanup(30).await.unwrap();
    assert_eq!(deleted, 2);

    let remaining: Vec<i64> = app
        .store
        .sessions
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert!(remaining.contains(&old_active.session.id));
    assert!(remaining.contains(&fresh_revoked.session.id));
    assert!(!remaining.contains(&old_revoked.session.id));
    assert!(!remaining.contains(&old_expired.session.id));
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new();
    let sessions = &app.state.sessions;
    let first = sessions.create(1, "a@bistro.test", &client(), None).await.unwrap();
    let second = sessions.create(1, "a@bistro.test", &client(), None).await.unwrap();
    sessions.create(2, "a@bistro.test", &client(), None).await.unwrap();

    let listed = sessions.list(1, Some("a@bistro.test"), -5).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.session.id);
    assert_eq!(listed[1].id, first.session.id);
}
