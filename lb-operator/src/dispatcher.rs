use std::{fmt::Display, sync::Arc};

use lb_operator_core::{
    fetcher::{resolve_load_balancer, ResolveError},
    inventory::LoadBalancerApi,
    loadbalancer::ChangeType,
};
use log::{debug, warn};
use thiserror::Error;

use crate::task::{Task, TaskContext, TaskSender};

#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error("{}", .0)]
    Resolve(ResolveError),
    #[error("Couldn't submit the task, the queue is closed!")]
    QueueClosed,
}

/// Every identifier of a batch that couldn't be turned into a task.
#[derive(Debug, Default)]
pub struct DispatchErrors {
    failures: Vec<(String, DispatchFailure)>,
    submitted: usize,
}

impl DispatchErrors {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Tasks the batch still managed to submit.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, DispatchFailure)> {
        self.failures.iter()
    }

    fn push(&mut self, id: &str, failure: DispatchFailure) {
        self.failures.push((id.to_owned(), failure));
    }
}

impl IntoIterator for DispatchErrors {
    type Item = (String, DispatchFailure);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl Display for DispatchErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} load balancer(s) couldn't be dispatched", self.failures.len())?;

        for (id, failure) in &self.failures {
            write!(f, "; '{id}': {failure}")?;
        }

        Ok(())
    }
}

impl std::error::Error for DispatchErrors {}

pub struct TaskDispatcher {
    inventory: Arc<dyn LoadBalancerApi>,
    queue: TaskSender,
}

impl TaskDispatcher {
    pub fn new(inventory: Arc<dyn LoadBalancerApi>, queue: TaskSender) -> Self {
        Self { inventory, queue }
    }

    /// Resolves every identifier and submits a task for each one that
    /// still needs work. A failing identifier never stops the rest of the
    /// batch, its error is collected and returned once the batch is done.
    ///
    /// Returns the number of submitted tasks.
    pub async fn dispatch(
        &self,
        ids: &[String],
        change_type: ChangeType,
        context: TaskContext,
    ) -> Result<usize, DispatchErrors> {
        let mut errors = DispatchErrors::default();

        for id in ids {
            let load_balancer =
                match resolve_load_balancer(self.inventory.as_ref(), id, change_type).await {
                    Ok(Some(load_balancer)) => load_balancer,
                    Ok(None) => {
                        debug!("No {change_type} task needed for '{id}'");
                        continue;
                    }
                    Err(err) => {
                        warn!("Couldn't resolve '{id}' for {change_type}! Reason: {err}");
                        errors.push(id, DispatchFailure::Resolve(err));
                        continue;
                    }
                };

            let task = Task {
                load_balancer,
                change_type,
                context,
            };

            match self.queue.submit(task) {
                Ok(()) => errors.submitted += 1,
                Err(_) => errors.push(id, DispatchFailure::QueueClosed),
            }
        }

        match errors.is_empty() {
            true => Ok(errors.submitted),
            false => Err(errors),
        }
    }
}
