use std::sync::Arc;

use lb_operator_core::loadbalancer::{ChangeType, LoadBalancer};
use tokio::sync::{
    mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender},
    Mutex,
};

/// Where a task came from, carried along for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    /// reconciliation pass that produced the task
    pub pass: u64,
}

/// A unit of work, exclusively owned by whichever consumer receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub load_balancer: LoadBalancer,
    pub change_type: ChangeType,
    pub context: TaskContext,
}

/// Producer side of the task queue.
///
/// The queue is unbounded: submitting never waits on slow consumers,
/// the backlog grows in memory instead.
#[derive(Debug, Clone)]
pub struct TaskSender(UnboundedSender<Task>);

/// Consumer side of the task queue, cloned into every worker. Each task
/// is delivered to exactly one of them.
#[derive(Debug, Clone)]
pub struct TaskReceiver(Arc<Mutex<UnboundedReceiver<Task>>>);

pub fn task_queue() -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();

    (TaskSender(tx), TaskReceiver(Arc::new(Mutex::new(rx))))
}

impl TaskSender {
    pub fn submit(&self, task: Task) -> Result<(), SendError<Task>> {
        self.0.send(task)
    }
}

impl TaskReceiver {
    /// Waits for the next task, `None` once every sender is gone and the
    /// backlog is drained.
    pub async fn next(&self) -> Option<Task> {
        self.0.lock().await.recv().await
    }
}
