use std::{process::exit, sync::Arc};

use anyhow::Context;
use clap::Parser;
use kube::Client;
use lb_operator_core::{
    events::HttpEventPublisher,
    inventory::{InventoryClient, LoadBalancerApi},
    kubernetes::{KubeNamespaceStore, NamespaceStore},
    metadata::MetadataClient,
};
use log::{error, info, warn, LevelFilter};
use tokio::{
    signal::unix::{signal, Signal, SignalKind},
    sync::watch,
};

use crate::{
    config::{Cli, OperatorConfig},
    reconciler::{context::ReconcilerContext, Reconciler},
    runner::{NamespaceTaskHandler, TaskRunner},
    status::{MetadataTarget, StatusPublisher},
    task::task_queue,
};

mod config;
mod dispatcher;
mod reconciler;
mod runner;
mod status;
mod task;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    configure_logger(cli.verbose_logging);

    let config = get_config(cli);
    let client = create_client().await;
    let http = reqwest::Client::new();

    if config.locations.is_empty() {
        warn!("No locations configured, every reconciliation pass will fail!");
    }

    let inventory: Arc<dyn LoadBalancerApi> =
        Arc::new(InventoryClient::new(http.clone(), &config.api_endpoint));
    let namespaces: Arc<dyn NamespaceStore> = Arc::new(KubeNamespaceStore::new(client));
    let publisher = Arc::new(create_status_publisher(&config, &http));

    let (queue, receiver) = task_queue();
    let workers = TaskRunner::start(
        receiver,
        Arc::new(NamespaceTaskHandler::new(namespaces.clone(), publisher)),
        config.workers,
    );

    let reconciler = Reconciler::new(ReconcilerContext {
        locations: config.locations.clone(),
        inventory,
        namespaces,
        queue,
    });

    let terminate = create_terminate_listener();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(wait_for_shutdown(terminate, shutdown_tx));

    let result = reconciler
        .reconcile_timer(config.reconciler_interval, shutdown_rx)
        .await;

    info!("Reconciliation stopped after {} pass(es)", reconciler.passes());

    // closes the queue, workers finish what's left and exit
    drop(reconciler);

    if let Err(err) = result {
        error!("Couldn't start reconciliation! {err}");
        exit(8)
    }

    info!("Waiting for {} worker(s) to finish...", workers.len());

    for result in futures::future::join_all(workers).await {
        result.context("Worker terminated abnormally")?;
    }

    info!("Bye!");

    Ok(())
}

fn create_status_publisher(config: &OperatorConfig, http: &reqwest::Client) -> StatusPublisher {
    let events = Arc::new(HttpEventPublisher::new(
        http.clone(),
        &config.events.publisher_url,
        &config.events.topic_prefix,
    ));
    let metadata = config.metadata.as_ref().map(|metadata| MetadataTarget {
        api: Arc::new(MetadataClient::new(http.clone(), &metadata.endpoint)),
        status_namespace_id: metadata.status_namespace_id.clone(),
    });

    if metadata.is_none() {
        info!("Metadata endpoint not configured, statuses will only be published as events");
    }

    StatusPublisher::new(events, metadata, &config.source)
}

async fn wait_for_shutdown(mut terminate: Signal, shutdown: watch::Sender<bool>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!("Couldn't listen for Ctrl+C, only SIGTERM will stop the operator! {err}");
                terminate.recv().await;
            }
        }
        _ = terminate.recv() => {},
    }

    info!("Shutdown signal received...");
    shutdown.send_replace(true);
}

fn create_terminate_listener() -> Signal {
    match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(error) => {
            error!("Couldn't listen for SIGTERM! {error:?}");
            exit(9)
        }
    }
}

async fn create_client() -> Client {
    match Client::try_default().await {
        Ok(client) => client,
        Err(error) => {
            error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

fn get_config(cli: Cli) -> OperatorConfig {
    match OperatorConfig::try_from(cli) {
        Ok(config) => config,
        Err(error) => {
            error!("Invalid configuration! {error}");
            exit(7)
        }
    }
}

fn configure_logger(verbose: bool) {
    env_logger::builder()
        .default_format()
        .format_module_path(false)
        .filter_level(match verbose {
            true => LevelFilter::Debug,
            false => LevelFilter::Info,
        })
        .parse_default_env()
        .init()
}
