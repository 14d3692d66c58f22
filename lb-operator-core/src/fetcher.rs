use log::debug;
use thiserror::Error;

use crate::{
    identifier::{IdentifierError, PrefixedId},
    inventory::{InventoryError, LoadBalancerApi},
    loadbalancer::{ChangeType, LoadBalancer},
    relationship::{classify, LoadBalancerRelationship},
};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid load balancer identifier! Reason: {}", .0)]
    InvalidIdentifier(IdentifierError),
    #[error("Couldn't get the load balancer from the API! Reason: {}", .0)]
    Inventory(InventoryError),
}

/// Builds the load balancer record a task needs.
///
/// Deletions only need the identifier so the API isn't queried for them.
/// `Ok(None)` means the load balancer is already gone and there's nothing
/// left to do.
pub async fn resolve_load_balancer(
    api: &dyn LoadBalancerApi,
    id: &str,
    change_type: ChangeType,
) -> Result<Option<LoadBalancer>, ResolveError> {
    let id = PrefixedId::parse(id).map_err(ResolveError::InvalidIdentifier)?;
    let load_balancer = LoadBalancer::new(id, LoadBalancerRelationship::Direct);

    if change_type == ChangeType::Delete {
        return Ok(Some(load_balancer));
    }

    fetch_data(api, load_balancer).await
}

/// Builds the load balancer record for an inbound event about `subject`.
///
/// `Ok(None)` when the event doesn't concern a load balancer or the load
/// balancer no longer exists.
pub async fn load_balancer_from_event(
    api: &dyn LoadBalancerApi,
    subject: &PrefixedId,
    associated: &[PrefixedId],
) -> Result<Option<LoadBalancer>, ResolveError> {
    let load_balancer = match classify(subject, associated) {
        (LoadBalancerRelationship::None, _) | (_, None) => {
            debug!("'{subject}' is not related to any load balancer, skipping");
            return Ok(None);
        }
        (relationship, Some(id)) => LoadBalancer::new(id.clone(), relationship),
    };

    fetch_data(api, load_balancer).await
}

async fn fetch_data(
    api: &dyn LoadBalancerApi,
    load_balancer: LoadBalancer,
) -> Result<Option<LoadBalancer>, ResolveError> {
    match api.get_load_balancer(load_balancer.id.as_str()).await {
        Ok(data) => Ok(Some(load_balancer.with_data(data))),
        Err(InventoryError::NotFound(_)) => {
            debug!("Load balancer '{}' no longer exists, nothing to do", load_balancer.id);
            Ok(None)
        }
        Err(err) => Err(ResolveError::Inventory(err)),
    }
}
