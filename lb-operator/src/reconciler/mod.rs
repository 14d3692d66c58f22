use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use lb_operator_core::{
    diff::{difference, unique},
    loadbalancer::ChangeType,
    naming::decode_namespace_name,
};
use log::{debug, error, info, warn};
use tokio::{
    sync::watch::Receiver,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::{
    dispatcher::TaskDispatcher,
    task::TaskContext,
};

use self::{context::ReconcilerContext, error::ReconcilerError};

pub mod context;
pub mod error;

/// Outcome of a single reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: u64,
    pub desired: usize,
    pub actual: usize,
    pub created: usize,
    pub deleted: usize,
    /// identifiers that couldn't be dispatched
    pub failed: usize,
}

/// Periodically converges the managed namespaces towards the load
/// balancers the inventory knows about.
pub struct Reconciler {
    context: ReconcilerContext,
    dispatcher: TaskDispatcher,
    passes: AtomicU64,
}

impl Reconciler {
    pub fn new(mut context: ReconcilerContext) -> Self {
        context.locations = unique(context.locations);

        Self {
            dispatcher: TaskDispatcher::new(context.inventory.clone(), context.queue.clone()),
            context,
            passes: AtomicU64::new(0),
        }
    }

    /// Number of passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Runs a pass every `interval` until `shutdown` flips to `true`. The
    /// first pass starts one interval after the call.
    ///
    /// A failed pass is logged and retried on the next tick, a running pass
    /// is never interrupted. Losing the shutdown sender doesn't stop the
    /// loop.
    pub async fn reconcile_timer(
        &self,
        interval: Duration,
        mut shutdown: Receiver<bool>,
    ) -> Result<(), ReconcilerError> {
        if interval.is_zero() {
            return Err(ReconcilerError::MissingReconcilerInterval);
        }

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting reconciliation every {interval:?}...");

        let mut watching_shutdown = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed(), if watching_shutdown => {
                    if changed.is_err() {
                        warn!("Shutdown signal is gone, reconciliation will run until the process is killed!");
                        watching_shutdown = false;
                    }
                }
                _ = ticker.tick() => {
                    match self.reconcile().await {
                        Ok(summary) => info!(
                            "Pass {} finished: {} desired, {} managed, {} to create, {} to delete, {} failed",
                            summary.pass,
                            summary.desired,
                            summary.actual,
                            summary.created,
                            summary.deleted,
                            summary.failed
                        ),
                        Err(err) => error!("Reconciliation failed! {err}"),
                    }
                }
            }
        }

        info!("Exiting reconciliation loop...");

        Ok(())
    }

    /// Compares the load balancers of every configured location with the
    /// managed namespaces and queues the difference: creations first, then
    /// deletions.
    pub async fn reconcile(&self) -> Result<PassSummary, ReconcilerError> {
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;

        if self.context.locations.is_empty() {
            return Err(ReconcilerError::MissingLocation);
        }

        debug!("Starting reconciliation pass {pass}...");

        let desired = self.desired_load_balancers().await?;
        let actual = self.actual_load_balancers().await?;

        let to_add = difference(&desired, &actual);
        let to_remove = difference(&actual, &desired);

        debug!(
            "Pass {pass}: {} load balancer(s) to create, {} to delete",
            to_add.len(),
            to_remove.len()
        );

        let context = TaskContext { pass };
        let (created, failed_creations) = self.dispatch(&to_add, ChangeType::Create, context).await;
        let (deleted, failed_deletions) = self.dispatch(&to_remove, ChangeType::Delete, context).await;

        Ok(PassSummary {
            pass,
            desired: desired.len(),
            actual: actual.len(),
            created,
            deleted,
            failed: failed_creations + failed_deletions,
        })
    }

    async fn desired_load_balancers(&self) -> Result<Vec<String>, ReconcilerError> {
        let mut ids = Vec::new();

        for location in &self.context.locations {
            let load_balancers = self
                .context
                .inventory
                .get_load_balancers_by_location(location)
                .await
                .map_err(|err| ReconcilerError::Inventory(location.clone(), err))?;

            debug!("Location '{location}' has {} load balancer(s)", load_balancers.len());

            ids.extend(load_balancers.into_iter().map(|load_balancer| load_balancer.id));
        }

        Ok(unique(ids))
    }

    async fn actual_load_balancers(&self) -> Result<Vec<String>, ReconcilerError> {
        self.context
            .namespaces
            .list_managed()
            .await
            .map_err(ReconcilerError::KubeApi)?
            .iter()
            .map(|name| {
                decode_namespace_name(name)
                    .map(String::from)
                    .map_err(ReconcilerError::InvalidNamespaceName)
            })
            .collect()
    }

    async fn dispatch(
        &self,
        ids: &[String],
        change_type: ChangeType,
        context: TaskContext,
    ) -> (usize, usize) {
        if ids.is_empty() {
            return (0, 0);
        }

        match self.dispatcher.dispatch(ids, change_type, context).await {
            Ok(submitted) => (submitted, 0),
            Err(errors) => {
                for (id, failure) in errors.iter() {
                    warn!("Pass {}: couldn't {change_type} '{id}'! {failure}", context.pass);
                }

                (errors.submitted(), errors.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use lb_operator_core::{
        identifier::PrefixedId, loadbalancer::ChangeType, naming::encode_namespace_name,
    };
    use tokio::sync::watch;

    use crate::{
        task::{task_queue, Task, TaskReceiver},
        testing::{FakeInventory, FakeNamespaces},
    };

    use super::{context::ReconcilerContext, error::ReconcilerError, PassSummary, Reconciler};

    const A: &str = "loadbal-aaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "loadbal-bbbbbbbbbbbbbbbbbbbbb";
    const C: &str = "loadbal-ccccccccccccccccccccc";
    const D: &str = "loadbal-ddddddddddddddddddddd";
    const LOCATION_1: &str = "lctnloc-111111111111111111111";
    const LOCATION_2: &str = "lctnloc-222222222222222222222";

    fn name(raw: &str) -> String {
        encode_namespace_name(&PrefixedId::parse(raw).unwrap())
    }

    fn reconciler(
        locations: &[&str],
        inventory: &Arc<FakeInventory>,
        namespaces: FakeNamespaces,
    ) -> (Reconciler, TaskReceiver) {
        let (queue, receiver) = task_queue();
        let reconciler = Reconciler::new(ReconcilerContext {
            locations: locations.iter().map(|location| location.to_string()).collect(),
            inventory: inventory.clone(),
            namespaces: Arc::new(namespaces),
            queue,
        });

        (reconciler, receiver)
    }

    async fn drain(reconciler: Reconciler, receiver: TaskReceiver) -> Vec<Task> {
        drop(reconciler);

        let mut tasks = Vec::new();
        while let Some(task) = receiver.next().await {
            tasks.push(task);
        }

        tasks
    }

    #[tokio::test]
    async fn queues_creations_before_deletions() {
        let inventory = Arc::new(
            FakeInventory::default()
                .with_location(LOCATION_1, &[A, B])
                .with_location(LOCATION_2, &[C]),
        );
        let (reconciler, receiver) = reconciler(
            &[LOCATION_1, LOCATION_2],
            &inventory,
            FakeNamespaces::with_names(&[name(B), name(D)]),
        );

        let summary = reconciler.reconcile().await.unwrap();

        assert_eq!(
            summary,
            PassSummary {
                pass: 1,
                desired: 3,
                actual: 2,
                created: 2,
                deleted: 1,
                failed: 0,
            }
        );

        let tasks = drain(reconciler, receiver).await;
        let queued: Vec<_> = tasks
            .iter()
            .map(|task| (task.load_balancer.id.as_str(), task.change_type))
            .collect();

        assert_eq!(
            queued,
            vec![
                (A, ChangeType::Create),
                (C, ChangeType::Create),
                (D, ChangeType::Delete)
            ]
        );
        assert!(tasks[0].load_balancer.data.is_some());
        assert!(tasks[1].load_balancer.data.is_some());
        assert!(tasks[2].load_balancer.data.is_none());
        assert_eq!(inventory.fetched(), vec![A, C]);
    }

    #[tokio::test]
    async fn load_balancers_in_several_locations_are_queued_once() {
        let inventory = Arc::new(
            FakeInventory::default()
                .with_location(LOCATION_1, &[A, B])
                .with_location(LOCATION_2, &[B]),
        );
        let (reconciler, receiver) = reconciler(
            &[LOCATION_1, LOCATION_2],
            &inventory,
            FakeNamespaces::default(),
        );

        let summary = reconciler.reconcile().await.unwrap();

        assert_eq!(summary.desired, 2);
        assert_eq!(drain(reconciler, receiver).await.len(), 2);
    }

    #[tokio::test]
    async fn converged_state_queues_nothing() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, receiver) = reconciler(
            &[LOCATION_1],
            &inventory,
            FakeNamespaces::with_names(&[name(A)]),
        );

        let summary = reconciler.reconcile().await.unwrap();

        assert_eq!(summary.created + summary.deleted, 0);
        assert!(drain(reconciler, receiver).await.is_empty());
    }

    #[tokio::test]
    async fn missing_locations_fail_the_pass() {
        let inventory = Arc::new(FakeInventory::default());
        let (reconciler, _receiver) = reconciler(&[], &inventory, FakeNamespaces::default());

        assert!(matches!(
            reconciler.reconcile().await,
            Err(ReconcilerError::MissingLocation)
        ));
    }

    #[tokio::test]
    async fn failing_location_aborts_the_pass() {
        let inventory = Arc::new(
            FakeInventory::default()
                .with_location(LOCATION_1, &[A])
                .failing_location(LOCATION_2),
        );
        let (reconciler, receiver) = reconciler(
            &[LOCATION_1, LOCATION_2],
            &inventory,
            FakeNamespaces::with_names(&[name(D)]),
        );

        let result = reconciler.reconcile().await;

        assert!(matches!(result, Err(ReconcilerError::Inventory(location, _)) if location == LOCATION_2));
        assert!(drain(reconciler, receiver).await.is_empty());
    }

    #[tokio::test]
    async fn undecodable_namespace_aborts_the_pass() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, receiver) = reconciler(
            &[LOCATION_1],
            &inventory,
            FakeNamespaces::with_names(&[name(B), "not-hex".to_owned()]),
        );

        assert!(matches!(
            reconciler.reconcile().await,
            Err(ReconcilerError::InvalidNamespaceName(_))
        ));
        assert!(drain(reconciler, receiver).await.is_empty());
    }

    #[tokio::test]
    async fn kube_failure_aborts_the_pass() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, _receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::failing());

        assert!(matches!(
            reconciler.reconcile().await,
            Err(ReconcilerError::KubeApi(_))
        ));
    }

    #[tokio::test]
    async fn failed_items_are_counted_not_fatal() {
        let inventory = Arc::new(
            FakeInventory::default()
                .with_location(LOCATION_1, &[A, B])
                .failing_fetch(A),
        );
        let (reconciler, receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());

        let summary = reconciler.reconcile().await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(drain(reconciler, receiver).await.len(), 1);
    }

    #[tokio::test]
    async fn zero_interval_never_starts() {
        let inventory = Arc::new(FakeInventory::default());
        let (reconciler, _receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(
            reconciler.reconcile_timer(Duration::ZERO, rx).await,
            Err(ReconcilerError::MissingReconcilerInterval)
        ));
        assert_eq!(reconciler.passes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_pass_every_interval_until_shutdown() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, _receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());
        let reconciler = Arc::new(reconciler);
        let (tx, rx) = watch::channel(false);

        let timer = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile_timer(Duration::from_secs(10), rx).await })
        };

        tokio::time::sleep(Duration::from_secs(25)).await;
        tx.send(true).unwrap();

        timer.await.unwrap().unwrap();
        assert_eq!(reconciler.passes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_passes_keep_the_loop_running() {
        let inventory = Arc::new(FakeInventory::default());
        let (reconciler, _receiver) = reconciler(&[], &inventory, FakeNamespaces::default());
        let reconciler = Arc::new(reconciler);
        let (tx, rx) = watch::channel(false);

        let timer = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile_timer(Duration::from_secs(10), rx).await })
        };

        tokio::time::sleep(Duration::from_secs(35)).await;
        tx.send(true).unwrap();

        timer.await.unwrap().unwrap();
        assert_eq!(reconciler.passes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_wait() {
        let inventory = Arc::new(FakeInventory::default());
        let (reconciler, _receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());
        let reconciler = Arc::new(reconciler);
        let (tx, rx) = watch::channel(false);

        let timer = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile_timer(Duration::from_secs(3600), rx).await })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(true).unwrap();

        timer.await.unwrap().unwrap();
        assert_eq!(reconciler.passes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_lets_the_running_pass_finish() {
        let inventory = Arc::new(
            FakeInventory::default()
                .with_location(LOCATION_1, &[A])
                .with_listing_delay(Duration::from_secs(5)),
        );
        let (reconciler, receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());
        let reconciler = Arc::new(reconciler);
        let (tx, rx) = watch::channel(false);

        let timer = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile_timer(Duration::from_secs(10), rx).await })
        };

        // the first pass starts at 10s and is still listing at 12s
        tokio::time::sleep(Duration::from_secs(12)).await;
        tx.send(true).unwrap();

        timer.await.unwrap().unwrap();
        assert_eq!(reconciler.passes(), 1);

        drop(reconciler);

        let mut queued = Vec::new();
        while let Some(task) = receiver.next().await {
            queued.push((task.load_balancer.id.to_string(), task.change_type));
        }
        assert_eq!(queued, vec![(A.to_owned(), ChangeType::Create)]);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_shutdown_sender_keeps_reconciling() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, _receiver) =
            reconciler(&[LOCATION_1], &inventory, FakeNamespaces::default());
        let reconciler = Arc::new(reconciler);
        let (tx, rx) = watch::channel(false);

        let timer = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.reconcile_timer(Duration::from_secs(10), rx).await })
        };

        drop(tx);
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert!(!timer.is_finished());
        assert_eq!(reconciler.passes(), 2);

        timer.abort();
    }

    #[tokio::test]
    async fn duplicate_locations_are_listed_once() {
        let inventory = Arc::new(FakeInventory::default().with_location(LOCATION_1, &[A]));
        let (reconciler, _receiver) = reconciler(
            &[LOCATION_1, LOCATION_2, LOCATION_1],
            &inventory,
            FakeNamespaces::default(),
        );

        reconciler.reconcile().await.unwrap();

        assert_eq!(inventory.listed(), vec![LOCATION_1, LOCATION_2]);
    }
}
