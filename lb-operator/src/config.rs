use std::time::Duration;

use clap::{Args, Parser};
use lb_operator_core::identifier::{IdentifierError, PrefixedId};
use thiserror::Error;

pub const DEFAULT_RECONCILER_INTERVAL: &str = "5m";
pub const DEFAULT_METADATA_SOURCE: &str = "lb-operator";
pub const DEFAULT_EVENTS_TOPIC_PREFIX: &str = "com.infratographer";
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// how often the managed namespaces are reconciled (e.g. 90s, 5m, 1h)
    #[arg(long, env = "LB_OPERATOR_RECONCILER_INTERVAL", default_value = DEFAULT_RECONCILER_INTERVAL, value_parser = parse_duration)]
    pub reconciler_interval: Duration,
    /// locations whose load balancers are managed by this operator
    #[arg(long = "location", env = "LB_OPERATOR_LOCATIONS", value_delimiter = ',')]
    pub locations: Vec<String>,
    /// load balancer API GraphQL endpoint
    #[arg(long, env = "LB_OPERATOR_API_ENDPOINT")]
    pub api_endpoint: String,
    /// number of concurrent task consumers
    #[arg(long, env = "LB_OPERATOR_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
    #[command(flatten)]
    pub metadata: MetadataArgs,
    #[command(flatten)]
    pub events: EventsArgs,
    /// enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose_logging: bool,
}

#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// metadata service GraphQL endpoint, status reporting is disabled when unset
    #[arg(long = "metadata-endpoint", env = "LB_OPERATOR_METADATA_ENDPOINT")]
    pub endpoint: Option<String>,
    /// metadata namespace the load balancer statuses are written to
    #[arg(long = "metadata-status-namespace-id", env = "LB_OPERATOR_METADATA_STATUS_NAMESPACE_ID")]
    pub status_namespace_id: Option<String>,
    /// source reported with statuses and events
    #[arg(long = "metadata-source", env = "LB_OPERATOR_METADATA_SOURCE", default_value = DEFAULT_METADATA_SOURCE)]
    pub source: String,
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// URL of the event publisher
    #[arg(long = "events-publisher-url", env = "LB_OPERATOR_EVENTS_PUBLISHER_URL")]
    pub publisher_url: String,
    /// prefix of every published topic
    #[arg(long = "events-topic-prefix", env = "LB_OPERATOR_EVENTS_TOPIC_PREFIX", default_value = DEFAULT_EVENTS_TOPIC_PREFIX)]
    pub topic_prefix: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Metadata status namespace id must be set when the metadata endpoint is configured!")]
    MissingStatusNamespace,
    #[error("Metadata status namespace id is invalid! Reason: {}", .0)]
    InvalidStatusNamespace(IdentifierError),
    #[error("At least one worker is required!")]
    NoWorkers,
    #[error("'{}' is not a valid duration!", .0)]
    InvalidDuration(String),
}

/// Operator configuration, built once at startup and handed to the
/// components that need it.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub reconciler_interval: Duration,
    pub locations: Vec<String>,
    pub api_endpoint: String,
    pub workers: usize,
    pub metadata: Option<MetadataConfig>,
    pub source: String,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    pub endpoint: String,
    pub status_namespace_id: PrefixedId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsConfig {
    pub publisher_url: String,
    pub topic_prefix: String,
}

impl TryFrom<Cli> for OperatorConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let metadata = match cli.metadata.endpoint.filter(|endpoint| !endpoint.is_empty()) {
            Some(endpoint) => Some(MetadataConfig {
                endpoint,
                status_namespace_id: cli
                    .metadata
                    .status_namespace_id
                    .as_deref()
                    .ok_or(ConfigError::MissingStatusNamespace)?
                    .parse()
                    .map_err(ConfigError::InvalidStatusNamespace)?,
            }),
            None => None,
        };

        Ok(Self {
            reconciler_interval: cli.reconciler_interval,
            locations: cli
                .locations
                .into_iter()
                .map(|location| location.trim().to_owned())
                .filter(|location| !location.is_empty())
                .collect(),
            api_endpoint: cli.api_endpoint,
            workers: cli.workers,
            metadata,
            source: cli.metadata.source,
            events: EventsConfig {
                publisher_url: cli.events.publisher_url,
                topic_prefix: cli.events.topic_prefix,
            },
        })
    }
}

/// Accepts bare seconds or a number followed by `ms`, `s`, `m` or `h`.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::InvalidDuration(raw.to_owned());
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (value, unit) = raw.split_at(split);
    let value: u64 = value.parse().map_err(|_| invalid())?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(invalid),
        "h" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
