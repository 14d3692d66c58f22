use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{identifier::PrefixedId, relationship::LoadBalancerRelationship};

/// Lifecycle transition driven by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Create,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Delete => "delete",
        }
    }
}

impl Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed load balancer, built fresh for every reconciliation pass or
/// inbound event and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancer {
    pub id: PrefixedId,
    pub relationship: LoadBalancerRelationship,
    /// unset when only the identifier is needed (deletions)
    pub data: Option<LoadBalancerData>,
}

impl LoadBalancer {
    pub fn new(id: PrefixedId, relationship: LoadBalancerRelationship) -> Self {
        Self {
            id,
            relationship,
            data: None,
        }
    }

    pub fn with_data(mut self, data: LoadBalancerData) -> Self {
        self.data = Some(data);

        self
    }
}

/// Entry returned when listing the load balancers of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Full load balancer record as served by the load balancer API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerData {
    pub id: PrefixedId,
    pub name: String,
    pub owner_id: Option<String>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: String,
    pub name: String,
    pub number: u16,
    #[serde(default)]
    pub pools: Vec<Pool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub protocol: String,
    #[serde(default)]
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub id: String,
    pub name: String,
    pub target: String,
    pub port_number: u16,
    pub active: bool,
}
