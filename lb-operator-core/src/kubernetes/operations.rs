use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, Patch, PatchParams},
    core::ObjectMeta,
    Api, Client,
};
use log::{debug, info, warn};

use crate::loadbalancer::LoadBalancer;

use super::labels::{get_managed_annotations, get_managed_labels, get_managed_listparams};

pub async fn list_managed_namespace_names(client: &Client) -> Result<Vec<String>, kube::Error> {
    let namespace_api: Api<Namespace> = Api::all(client.clone());
    let namespaces = namespace_api
        .list_metadata(&get_managed_listparams())
        .await?;

    let mut names = Vec::with_capacity(namespaces.items.len());
    for namespace in namespaces.items {
        match namespace.metadata.name {
            Some(name) => names.push(name),
            None => warn!("Cluster returned a nameless namespace!"), // this shouldn't happen
        }
    }

    debug!("Found {} managed namespaces", names.len());

    Ok(names)
}

pub fn generate_managed_namespace(name: &str, load_balancer: &LoadBalancer) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            labels: Some(get_managed_labels()),
            annotations: Some(get_managed_annotations(load_balancer)),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn apply_managed_namespace(
    client: &Client,
    patch_params: &PatchParams,
    name: &str,
    load_balancer: &LoadBalancer,
) -> Result<(), kube::Error> {
    let namespace_api: Api<Namespace> = Api::all(client.clone());
    let namespace = generate_managed_namespace(name, load_balancer);

    info!("Ensuring namespace '{name}' for '{}' is created...", load_balancer.id);
    namespace_api
        .patch(name, patch_params, &Patch::Apply(namespace))
        .await?;

    Ok(())
}

pub async fn try_remove_namespace(
    client: &Client,
    delete_params: &DeleteParams,
    name: &str,
) -> Result<(), kube::Error> {
    let namespace_api: Api<Namespace> = Api::all(client.clone());

    info!("Removing namespace '{name}'...");
    match namespace_api.delete(name, delete_params).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(response)) if response.code == 404 => {
            debug!("Namespace '{name}' is already gone");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
