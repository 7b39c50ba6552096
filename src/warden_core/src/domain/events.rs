use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::user::UserId;

/// Open key/value payload attached to outbound events.
pub type Metadata = serde_json::Map<String, Value>;

/// Audit trail entry published to the `audit-events` stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub action: String,
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        service: impl Into<String>,
        action: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            user_id: None,
            action: action.into(),
            entity: entity.into(),
            entity_id: None,
            metadata: Metadata::new(),
            correlation_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attributes the event to `user_id`, which is also the affected entity.
    pub fn for_user(self, user_id: &UserId) -> Self {
        let id = user_id.to_string();
        Self {
            user_id: Some(id.clone()),
            entity_id: Some(id),
            ..self
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    EmailVerification,
    PasswordReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
}

/// Delivery request published to the `notification-events` stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub metadata: Metadata,
}

impl NotificationEvent {
    pub fn email(kind: NotificationKind) -> Self {
        Self {
            kind,
            channel: NotificationChannel::Email,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
