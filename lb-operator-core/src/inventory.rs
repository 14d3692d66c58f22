use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    graphql::{execute, Connection, GraphQlError},
    identifier::PrefixedId,
    loadbalancer::{LoadBalancerData, LoadBalancerSummary, Origin, Pool, Port},
};

const LOAD_BALANCERS_BY_LOCATION_QUERY: &str = r#"
query GetLoadBalancersByLocation($id: ID!) {
  location(id: $id) {
    loadBalancers {
      edges { node { id name } }
    }
  }
}"#;

const LOAD_BALANCER_QUERY: &str = r#"
query GetLoadBalancer($id: ID!) {
  loadBalancer(id: $id) {
    id
    name
    owner { id }
    location { id }
    ports {
      edges {
        node {
          id
          name
          number
          pools {
            id
            name
            protocol
            origins {
              edges { node { id name target portNumber active } }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Load balancer '{}' was not found!", .0)]
    NotFound(String),
    #[error("Couldn't query the load balancer API! Reason: {}", .0)]
    Request(GraphQlError),
}

/// Read access to the load balancer inventory.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn get_load_balancers_by_location(
        &self,
        location: &str,
    ) -> Result<Vec<LoadBalancerSummary>, InventoryError>;

    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancerData, InventoryError>;
}

pub struct InventoryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl InventoryClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl LoadBalancerApi for InventoryClient {
    async fn get_load_balancers_by_location(
        &self,
        location: &str,
    ) -> Result<Vec<LoadBalancerSummary>, InventoryError> {
        debug!("Listing load balancers in '{location}'...");

        let response: LocationResponse = execute(
            &self.client,
            &self.endpoint,
            LOAD_BALANCERS_BY_LOCATION_QUERY,
            json!({ "id": location }),
        )
        .await
        .map_err(InventoryError::Request)?;

        Ok(response
            .location
            .map(|location| location.load_balancers.into_nodes())
            .unwrap_or_default())
    }

    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancerData, InventoryError> {
        let response: LoadBalancerResponse = execute(
            &self.client,
            &self.endpoint,
            LOAD_BALANCER_QUERY,
            json!({ "id": id }),
        )
        .await
        .map_err(|err| match err.is_not_found() {
            true => InventoryError::NotFound(id.to_owned()),
            false => InventoryError::Request(err),
        })?;

        response
            .load_balancer
            .map(Into::into)
            .ok_or_else(|| InventoryError::NotFound(id.to_owned()))
    }
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location: Option<LocationNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationNode {
    #[serde(default)]
    load_balancers: Connection<LoadBalancerSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerResponse {
    load_balancer: Option<LoadBalancerNode>,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LoadBalancerNode {
    id: PrefixedId,
    name: String,
    owner: Option<IdNode>,
    location: Option<IdNode>,
    #[serde(default)]
    ports: Connection<PortNode>,
}

#[derive(Debug, Deserialize)]
struct PortNode {
    id: String,
    name: String,
    number: u16,
    #[serde(default)]
    pools: Vec<PoolNode>,
}

#[derive(Debug, Deserialize)]
struct PoolNode {
    id: String,
    name: String,
    protocol: String,
    #[serde(default)]
    origins: Connection<Origin>,
}

impl From<LoadBalancerNode> for LoadBalancerData {
    fn from(value: LoadBalancerNode) -> Self {
        Self {
            id: value.id,
            name: value.name,
            owner_id: value.owner.map(|owner| owner.id),
            location_id: value.location.map(|location| location.id),
            ports: value
                .ports
                .into_nodes()
                .into_iter()
                .map(|port| Port {
                    id: port.id,
                    name: port.name,
                    number: port.number,
                    pools: port
                        .pools
                        .into_iter()
                        .map(|pool| Pool {
                            id: pool.id,
                            name: pool.name,
                            protocol: pool.protocol,
                            origins: pool.origins.into_nodes(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
