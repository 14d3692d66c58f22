use std::sync::Arc;

use lb_operator_core::{inventory::LoadBalancerApi, kubernetes::NamespaceStore};

use crate::task::TaskSender;

pub struct ReconcilerContext {
    pub locations: Vec<String>,
    pub inventory: Arc<dyn LoadBalancerApi>,
    pub namespaces: Arc<dyn NamespaceStore>,
    pub queue: TaskSender,
}
