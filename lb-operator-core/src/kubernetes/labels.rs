use std::collections::BTreeMap;

use kube::api::ListParams;

use crate::loadbalancer::LoadBalancer;

/// Marks namespaces owned by the operator, only its presence matters
/// when listing.
pub const OPERATOR_MANAGED_LABEL_KEY: &str = "com.infratographer.lb-operator/managed";
pub const LOAD_BALANCER_ID_ANNOTATION_KEY: &str = "com.infratographer.lb-operator/load-balancer-id";
pub const LOAD_BALANCER_NAME_ANNOTATION_KEY: &str = "com.infratographer.lb-operator/load-balancer-name";
pub const LOCATION_ID_ANNOTATION_KEY: &str = "com.infratographer.lb-operator/location-id";

pub fn get_managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (OPERATOR_MANAGED_LABEL_KEY.to_owned(), "true".to_owned()),
        ("app.kubernetes.io/managed-by".to_owned(), "lb-operator".to_owned()),
    ])
}

pub fn get_managed_annotations(load_balancer: &LoadBalancer) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::from([(
        LOAD_BALANCER_ID_ANNOTATION_KEY.to_owned(),
        load_balancer.id.to_string(),
    )]);

    if let Some(data) = &load_balancer.data {
        annotations.insert(LOAD_BALANCER_NAME_ANNOTATION_KEY.to_owned(), data.name.clone());

        if let Some(location_id) = &data.location_id {
            annotations.insert(LOCATION_ID_ANNOTATION_KEY.to_owned(), location_id.clone());
        }
    }

    annotations
}

pub fn get_managed_listparams() -> ListParams {
    ListParams::default().labels(OPERATOR_MANAGED_LABEL_KEY)
}
