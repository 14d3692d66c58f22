use async_trait::async_trait;
use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::graphql::{execute, GraphQlError};

const STATUS_UPDATE_MUTATION: &str = r#"
mutation StatusUpdate($input: StatusUpdateInput!) {
  statusUpdate(input: $input) {
    status { id }
  }
}"#;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Couldn't update the status in the metadata service! Reason: {}", .0)]
    Request(GraphQlError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
#[builder(setter(into))]
pub struct StatusUpdateInput {
    #[serde(rename = "nodeID")]
    pub node_id: String,
    #[serde(rename = "namespaceID")]
    pub namespace_id: String,
    pub source: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdateResponse {
    pub id: Option<String>,
}

/// Write access to the metadata service.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn status_update(
        &self,
        input: &StatusUpdateInput,
    ) -> Result<StatusUpdateResponse, MetadataError>;
}

pub struct MetadataClient {
    client: reqwest::Client,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MetadataApi for MetadataClient {
    async fn status_update(
        &self,
        input: &StatusUpdateInput,
    ) -> Result<StatusUpdateResponse, MetadataError> {
        debug!("Updating status of '{}' in the metadata service...", input.node_id);

        let response: MutationResponse = execute(
            &self.client,
            &self.endpoint,
            STATUS_UPDATE_MUTATION,
            json!({ "input": input }),
        )
        .await
        .map_err(MetadataError::Request)?;

        Ok(StatusUpdateResponse {
            id: response
                .status_update
                .and_then(|update| update.status)
                .map(|status| status.id),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    status_update: Option<StatusUpdatePayload>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdatePayload {
    status: Option<StatusNode>,
}

#[derive(Debug, Deserialize)]
struct StatusNode {
    id: String,
}
