//! Best-effort audit trail.
//!
//! The primary operation has already committed when an entry is recorded, so
//! a sink failure is logged and never reaches the caller.

use std::sync::Arc;

use crate::models::{AuditAction, AuditEvent};

use super::store::AuditSink;

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn record(
        &self,
        restaurant_id: i64,
        actor_email: &str,
        action: AuditAction,
        payload: serde_json::Value,
        ip: &str,
    ) {
        let event = AuditEvent::admin_action(restaurant_id, actor_email, action, payload, ip);

        if let Err(e) = self.sink.append(&event).await {
            tracing::error!(
                error = %e,
                restaurant_id,
                action = event.action.as_str(),
                "Failed to append audit entry"
            );
        }
    }
}
