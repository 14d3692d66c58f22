use std::sync::Arc;

use lb_operator_core::{
    events::{EventMessage, EventPublisher},
    identifier::PrefixedId,
    metadata::{MetadataApi, MetadataError, StatusUpdateInputBuilder, StatusUpdateInputBuilderError},
    status::LoadBalancerStatus,
};
use log::{debug, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishStatusError {
    #[error("Couldn't serialize the load balancer status! Reason: {}", .0)]
    Serialization(serde_json::Error),
    #[error("Couldn't prepare the status update! Reason: {}", .0)]
    Input(StatusUpdateInputBuilderError),
    #[error("{}", .0)]
    Metadata(MetadataError),
}

/// Metadata service destination of the status updates.
pub struct MetadataTarget {
    pub api: Arc<dyn MetadataApi>,
    pub status_namespace_id: PrefixedId,
}

/// Reports load balancer lifecycle changes.
///
/// The event bus gets a best-effort notification, the metadata service
/// (when configured) is the authoritative record.
pub struct StatusPublisher {
    events: Arc<dyn EventPublisher>,
    metadata: Option<MetadataTarget>,
    source: String,
}

impl StatusPublisher {
    pub fn new(
        events: Arc<dyn EventPublisher>,
        metadata: Option<MetadataTarget>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            events,
            metadata,
            source: source.into(),
        }
    }

    pub async fn publish_status(
        &self,
        id: &PrefixedId,
        status: &LoadBalancerStatus,
    ) -> Result<(), PublishStatusError> {
        self.publish_event(id, status).await;

        let Some(metadata) = &self.metadata else {
            debug!("Metadata endpoint not configured, skipping status update for '{id}'");
            return Ok(());
        };

        let data = serde_json::to_value(status).map_err(PublishStatusError::Serialization)?;
        let input = StatusUpdateInputBuilder::default()
            .node_id(id.as_str())
            .namespace_id(metadata.status_namespace_id.as_str())
            .source(self.source.as_str())
            .data(data)
            .build()
            .map_err(PublishStatusError::Input)?;

        metadata
            .api
            .status_update(&input)
            .await
            .map_err(PublishStatusError::Metadata)?;

        debug!("Status of '{id}' set to {}", status.state);

        Ok(())
    }

    async fn publish_event(&self, id: &PrefixedId, status: &LoadBalancerStatus) {
        let Some(subject) = status.state.event_subject() else {
            return;
        };

        let message = EventMessage::metadata(id.clone(), self.source.as_str());

        if let Err(err) = self.events.publish_event(&subject, &message).await {
            warn!("Couldn't publish {} event for '{id}'! Reason: {err}", status.state);
        }
    }
}
