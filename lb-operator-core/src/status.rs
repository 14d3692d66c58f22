use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const LOAD_BALANCER_SUBJECT: &str = "load-balancer";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerState {
    #[default]
    Creating,
    Updating,
    Active,
    Deleting,
    Deleted,
    Failed,
}

impl LoadBalancerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancerState::Creating => "creating",
            LoadBalancerState::Updating => "updating",
            LoadBalancerState::Active => "active",
            LoadBalancerState::Deleting => "deleting",
            LoadBalancerState::Deleted => "deleted",
            LoadBalancerState::Failed => "failed",
        }
    }

    /// Suffix appended to the event subject, `None` for states that
    /// aren't announced on the event bus.
    pub fn subject_suffix(&self) -> Option<&'static str> {
        match self {
            LoadBalancerState::Active => Some(".active"),
            LoadBalancerState::Deleted => Some(".deleted"),
            _ => None,
        }
    }

    pub fn event_subject(&self) -> Option<String> {
        self.subject_suffix()
            .map(|suffix| format!("{LOAD_BALANCER_SUBJECT}{suffix}"))
    }
}

impl Display for LoadBalancerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadBalancerStatus {
    pub state: LoadBalancerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoadBalancerStatus {
    pub fn new(state: LoadBalancerState) -> Self {
        Self {
            state,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());

        self
    }
}
