use std::sync::Arc;

use async_trait::async_trait;
use lb_operator_core::{
    kubernetes::NamespaceStore,
    loadbalancer::ChangeType,
    naming::encode_namespace_name,
    status::{LoadBalancerState, LoadBalancerStatus},
};
use log::{debug, error, info};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    status::{PublishStatusError, StatusPublisher},
    task::{Task, TaskReceiver},
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Couldn't update the namespace '{}'! Reason: {}", .0, .1)]
    KubeApi(String, kube::Error),
    #[error("Couldn't report the status! Reason: {}", .0)]
    Status(PublishStatusError),
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> Result<(), TaskError>;
}

/// Keeps one namespace per load balancer and reports the outcome.
pub struct NamespaceTaskHandler {
    namespaces: Arc<dyn NamespaceStore>,
    publisher: Arc<StatusPublisher>,
}

impl NamespaceTaskHandler {
    pub fn new(namespaces: Arc<dyn NamespaceStore>, publisher: Arc<StatusPublisher>) -> Self {
        Self {
            namespaces,
            publisher,
        }
    }
}

#[async_trait]
impl TaskHandler for NamespaceTaskHandler {
    async fn handle(&self, task: Task) -> Result<(), TaskError> {
        let id = &task.load_balancer.id;
        let name = encode_namespace_name(id);

        let state = match task.change_type {
            ChangeType::Create => {
                self.namespaces
                    .apply_managed(&name, &task.load_balancer)
                    .await
                    .map_err(|err| TaskError::KubeApi(name.clone(), err))?;

                LoadBalancerState::Active
            }
            ChangeType::Delete => {
                self.namespaces
                    .remove(&name)
                    .await
                    .map_err(|err| TaskError::KubeApi(name.clone(), err))?;

                LoadBalancerState::Deleted
            }
        };

        self.publisher
            .publish_status(id, &LoadBalancerStatus::new(state))
            .await
            .map_err(TaskError::Status)
    }
}

pub struct TaskRunner;

impl TaskRunner {
    /// Spawns `workers` consumers of the queue. They finish once the queue
    /// is closed and drained.
    pub fn start(
        receiver: TaskReceiver,
        handler: Arc<dyn TaskHandler>,
        workers: usize,
    ) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|worker| {
                let receiver = receiver.clone();
                let handler = handler.clone();

                tokio::spawn(async move { run_worker(worker, receiver, handler).await })
            })
            .collect()
    }
}

async fn run_worker(worker: usize, receiver: TaskReceiver, handler: Arc<dyn TaskHandler>) {
    debug!("Worker {worker} started");

    while let Some(task) = receiver.next().await {
        let id = task.load_balancer.id.clone();
        let change_type = task.change_type;
        let pass = task.context.pass;

        match handler.handle(task).await {
            Ok(()) => info!("Load balancer '{id}' processed ({change_type}, pass {pass})"),
            Err(err) => error!("Couldn't {change_type} load balancer '{id}' (pass {pass})! {err}"),
        }
    }

    debug!("Worker {worker} exiting, the queue is closed");
}
