use async_trait::async_trait;
use kube::{
    api::{DeleteParams, PatchParams},
    Client,
};

use crate::loadbalancer::LoadBalancer;

use self::operations::{apply_managed_namespace, list_managed_namespace_names, try_remove_namespace};

pub mod labels;
pub mod operations;

pub const OPERATOR_FIELD_MANAGER: &str = "lb-operator";

/// The managed-resource store: one namespace per load balancer.
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    /// Names of every namespace carrying the ownership label.
    async fn list_managed(&self) -> Result<Vec<String>, kube::Error>;

    /// Creates or updates the namespace backing `load_balancer`.
    async fn apply_managed(&self, name: &str, load_balancer: &LoadBalancer)
        -> Result<(), kube::Error>;

    /// Removing a namespace that doesn't exist succeeds.
    async fn remove(&self, name: &str) -> Result<(), kube::Error>;
}

pub struct KubeNamespaceStore {
    client: Client,
}

impl KubeNamespaceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NamespaceStore for KubeNamespaceStore {
    async fn list_managed(&self) -> Result<Vec<String>, kube::Error> {
        list_managed_namespace_names(&self.client).await
    }

    async fn apply_managed(
        &self,
        name: &str,
        load_balancer: &LoadBalancer,
    ) -> Result<(), kube::Error> {
        apply_managed_namespace(
            &self.client,
            &PatchParams::apply(OPERATOR_FIELD_MANAGER),
            name,
            load_balancer,
        )
        .await
    }

    async fn remove(&self, name: &str) -> Result<(), kube::Error> {
        try_remove_namespace(&self.client, &DeleteParams::background(), name).await
    }
}
