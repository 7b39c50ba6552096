pub mod kafka_event_publisher;
pub mod recording_event_publisher;

pub use kafka_event_publisher::{EventTopics, KafkaEventPublisher};
pub use recording_event_publisher::RecordingEventPublisher;
