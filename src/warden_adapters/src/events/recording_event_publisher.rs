use std::sync::{Arc, Mutex};

use warden_core::{AuditEvent, EventPublisher, EventPublisherError, NotificationEvent};

/// Keeps every published event in memory. Used for local runs without a broker.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventPublisher {
    audits: Arc<Mutex<Vec<AuditEvent>>>,
    notifications: Arc<Mutex<Vec<NotificationEvent>>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audits(&self) -> Vec<AuditEvent> {
        self.audits
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.notifications
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish_audit(&self, event: &AuditEvent) -> Result<(), EventPublisherError> {
        tracing::debug!(action = %event.action, "Recording audit event");
        if let Ok(mut audits) = self.audits.lock() {
            audits.push(event.clone());
        }
        Ok(())
    }

    async fn publish_notification(
        &self,
        event: &NotificationEvent,
    ) -> Result<(), EventPublisherError> {
        tracing::debug!(kind = ?event.kind, "Recording notification event");
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(event.clone());
        }
        Ok(())
    }
}
