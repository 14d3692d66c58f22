//! In-memory stand-ins for the downstream services.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use kube::core::ErrorResponse;
use lb_operator_core::{
    events::{EventMessage, EventPublisher, EventsError},
    graphql::GraphQlError,
    identifier::PrefixedId,
    inventory::{InventoryError, LoadBalancerApi},
    kubernetes::NamespaceStore,
    loadbalancer::{LoadBalancer, LoadBalancerData, LoadBalancerSummary},
    metadata::{MetadataApi, MetadataError, StatusUpdateInput, StatusUpdateResponse},
};
use reqwest::StatusCode;

#[derive(Default)]
pub struct FakeInventory {
    locations: HashMap<String, Vec<String>>,
    failing_locations: HashSet<String>,
    existing: HashSet<String>,
    failing: HashSet<String>,
    listing_delay: Option<Duration>,
    listed: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeInventory {
    pub fn with_location(mut self, location: &str, ids: &[&str]) -> Self {
        self.locations.insert(
            location.to_owned(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self.existing.extend(ids.iter().map(|id| id.to_string()));

        self
    }

    pub fn failing_location(mut self, location: &str) -> Self {
        self.failing_locations.insert(location.to_owned());

        self
    }

    pub fn with_load_balancer(mut self, id: &str) -> Self {
        self.existing.insert(id.to_owned());

        self
    }

    pub fn failing_fetch(mut self, id: &str) -> Self {
        self.failing.insert(id.to_owned());

        self
    }

    /// Every location listing takes this long.
    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);

        self
    }

    /// Locations passed to `get_load_balancers_by_location`, in call order.
    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    /// Identifiers passed to `get_load_balancer`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoadBalancerApi for FakeInventory {
    async fn get_load_balancers_by_location(
        &self,
        location: &str,
    ) -> Result<Vec<LoadBalancerSummary>, InventoryError> {
        self.listed.lock().unwrap().push(location.to_owned());

        if let Some(delay) = self.listing_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_locations.contains(location) {
            return Err(InventoryError::Request(GraphQlError::Status(
                StatusCode::SERVICE_UNAVAILABLE,
            )));
        }

        Ok(self
            .locations
            .get(location)
            .map(|ids| {
                ids.iter()
                    .map(|id| LoadBalancerSummary {
                        id: id.clone(),
                        name: format!("lb-{id}"),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancerData, InventoryError> {
        self.fetched.lock().unwrap().push(id.to_owned());

        if self.failing.contains(id) {
            return Err(InventoryError::Request(GraphQlError::Query(
                "internal error".to_owned(),
            )));
        }

        if !self.existing.contains(id) {
            return Err(InventoryError::NotFound(id.to_owned()));
        }

        Ok(LoadBalancerData {
            id: PrefixedId::parse(id).map_err(|err| {
                InventoryError::Request(GraphQlError::Query(err.to_string()))
            })?,
            name: format!("lb-{id}"),
            owner_id: None,
            location_id: None,
            ports: Vec::new(),
        })
    }
}

#[derive(Default)]
pub struct FakeNamespaces {
    names: Mutex<Vec<String>>,
    applied: Mutex<Vec<LoadBalancer>>,
    failing: bool,
}

impl FakeNamespaces {
    pub fn with_names(names: &[String]) -> Self {
        Self {
            names: Mutex::new(names.to_vec()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }

    /// Load balancers handed to `apply_managed`, in call order.
    pub fn applied(&self) -> Vec<LoadBalancer> {
        self.applied.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), kube::Error> {
        match self.failing {
            true => Err(kube::Error::Api(ErrorResponse {
                status: "Failure".to_owned(),
                message: "forbidden".to_owned(),
                reason: "Forbidden".to_owned(),
                code: 403,
            })),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl NamespaceStore for FakeNamespaces {
    async fn list_managed(&self) -> Result<Vec<String>, kube::Error> {
        self.check()?;

        Ok(self.names())
    }

    async fn apply_managed(
        &self,
        name: &str,
        load_balancer: &LoadBalancer,
    ) -> Result<(), kube::Error> {
        self.check()?;

        self.applied.lock().unwrap().push(load_balancer.clone());

        let mut names = self.names.lock().unwrap();
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_owned());
        }

        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), kube::Error> {
        self.check()?;

        self.names.lock().unwrap().retain(|existing| existing != name);

        Ok(())
    }
}

#[derive(Default)]
pub struct FakeEvents {
    published: Mutex<Vec<(String, EventMessage)>>,
    failing: bool,
}

impl FakeEvents {
    pub fn failing() -> Self {
        Self {
            published: Mutex::default(),
            failing: true,
        }
    }

    pub fn published(&self) -> Vec<(String, EventMessage)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for FakeEvents {
    async fn publish_event(&self, subject: &str, message: &EventMessage) -> Result<(), EventsError> {
        if self.failing {
            return Err(EventsError::Rejected(
                subject.to_owned(),
                StatusCode::SERVICE_UNAVAILABLE,
            ));
        }

        self.published
            .lock()
            .unwrap()
            .push((subject.to_owned(), message.clone()));

        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    updates: Mutex<Vec<StatusUpdateInput>>,
    failing: bool,
}

impl FakeMetadata {
    pub fn failing() -> Self {
        Self {
            updates: Mutex::default(),
            failing: true,
        }
    }

    pub fn updates(&self) -> Vec<StatusUpdateInput> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataApi for FakeMetadata {
    async fn status_update(
        &self,
        input: &StatusUpdateInput,
    ) -> Result<StatusUpdateResponse, MetadataError> {
        if self.failing {
            return Err(MetadataError::Request(GraphQlError::Status(
                StatusCode::BAD_GATEWAY,
            )));
        }

        self.updates.lock().unwrap().push(input.clone());

        Ok(StatusUpdateResponse { id: None })
    }
}
