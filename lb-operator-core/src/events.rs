use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::PrefixedId;

pub const METADATA_EVENT_TYPE: &str = "metadata";

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("Couldn't publish to '{}'! Reason: {}", .0, .1)]
    Transport(String, reqwest::Error),
    #[error("Publishing to '{}' was rejected with {}!", .0, .1)]
    Rejected(String, reqwest::StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "subjectID")]
    pub subject_id: PrefixedId,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl EventMessage {
    pub fn metadata(subject_id: PrefixedId, source: impl Into<String>) -> Self {
        Self {
            event_type: METADATA_EVENT_TYPE.to_owned(),
            subject_id,
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

/// `<prefix>.events.<event type>.<subject>`
pub fn compose_topic(prefix: &str, event_type: &str, subject: &str) -> String {
    format!("{prefix}.events.{event_type}.{subject}")
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_event(&self, subject: &str, message: &EventMessage) -> Result<(), EventsError>;
}

/// Publishes events by posting them to a publisher gateway,
/// one URL path per topic.
pub struct HttpEventPublisher {
    client: reqwest::Client,
    url: String,
    prefix: String,
}

impl HttpEventPublisher {
    pub fn new(client: reqwest::Client, url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            prefix: prefix.into(),
        }
    }

    pub fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{topic}", self.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish_event(&self, subject: &str, message: &EventMessage) -> Result<(), EventsError> {
        let topic = compose_topic(&self.prefix, &message.event_type, subject);

        debug!("Publishing {} event for '{}' to '{topic}'...", message.event_type, message.subject_id);

        let response = self
            .client
            .post(self.topic_url(&topic))
            .json(message)
            .send()
            .await
            .map_err(|err| EventsError::Transport(topic.clone(), err))?;

        if !response.status().is_success() {
            return Err(EventsError::Rejected(topic, response.status()));
        }

        Ok(())
    }
}
