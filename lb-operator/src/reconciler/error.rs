use lb_operator_core::{inventory::InventoryError, naming::NamespaceNameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Reconciler interval must be greater than zero!")]
    MissingReconcilerInterval,
    #[error("No locations are configured!")]
    MissingLocation,
    #[error("Couldn't get the load balancers of location '{}'! Reason: {}", .0, .1)]
    Inventory(String, InventoryError),
    #[error("Couldn't list the managed namespaces! Reason: {}", .0)]
    KubeApi(kube::Error),
    #[error("Managed namespace name is invalid! Reason: {}", .0)]
    InvalidNamespaceName(NamespaceNameError),
}
