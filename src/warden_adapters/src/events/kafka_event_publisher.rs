use std::time::Duration;

use rdkafka::{
    ClientConfig,
    error::KafkaError,
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use serde::Serialize;
use warden_core::{AuditEvent, EventPublisher, EventPublisherError, NotificationEvent};

use crate::config::constants::{DEFAULT_AUDIT_TOPIC, DEFAULT_NOTIFICATION_TOPIC};

#[derive(Debug, Clone)]
pub struct EventTopics {
    pub audit: String,
    pub notification: String,
}

impl Default for EventTopics {
    fn default() -> Self {
        Self {
            audit: DEFAULT_AUDIT_TOPIC.to_owned(),
            notification: DEFAULT_NOTIFICATION_TOPIC.to_owned(),
        }
    }
}

/// Publishes JSON encoded events to Kafka. Each send waits at most `timeout` for delivery.
#[derive(Clone)]
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topics: EventTopics,
    timeout: Duration,
}

impl KafkaEventPublisher {
    pub fn new(producer: FutureProducer, topics: EventTopics, timeout: Duration) -> Self {
        Self {
            producer,
            topics,
            timeout,
        }
    }

    pub fn from_brokers(
        brokers: &str,
        topics: EventTopics,
        timeout: Duration,
    ) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()?;

        Ok(Self::new(producer, topics, timeout))
    }

    #[tracing::instrument(name = "Publishing event to Kafka", skip(self, event))]
    async fn send<E: Serialize + Sync>(
        &self,
        topic: &str,
        key: Option<&str>,
        event: &E,
    ) -> Result<(), EventPublisherError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| EventPublisherError::Serialisation(e.to_string()))?;

        let mut record = FutureRecord::<str, [u8]>::to(topic).payload(&payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| ())
            .map_err(|(e, _)| EventPublisherError::Delivery {
                topic: topic.to_owned(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish_audit(&self, event: &AuditEvent) -> Result<(), EventPublisherError> {
        self.send(&self.topics.audit, event.user_id.as_deref(), event)
            .await
    }

    async fn publish_notification(
        &self,
        event: &NotificationEvent,
    ) -> Result<(), EventPublisherError> {
        self.send(&self.topics.notification, None, event).await
    }
}
