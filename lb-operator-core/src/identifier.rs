use std::{fmt::Display, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PREFIX_LENGTH: usize = 7;
pub const SUFFIX_LENGTH: usize = 21;

/// prefix carried by every load balancer identifier
pub const LOAD_BALANCER_PREFIX: &str = "loadbal";

const PREFIXED_ID_PATTERN: &str = "^[a-z0-9]{7}-[a-zA-Z0-9]{21}$";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("'{}' is not a valid prefixed identifier!", .0)]
    InvalidFormat(String),
}

/// A globally unique identifier in the `<prefix>-<suffix>` form, e.g.
/// `loadbal-7p3rGcVw4ZKcmWtxn33Hv`.
///
/// Equality is the exact string value, the prefix can be inspected
/// without parsing anything again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefixedId(String);

impl PrefixedId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if !prefixed_id_regex().is_match(raw) {
            return Err(IdentifierError::InvalidFormat(raw.to_owned()));
        }

        Ok(Self(raw.to_owned()))
    }

    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LENGTH]
    }

    pub fn suffix(&self) -> &str {
        &self.0[PREFIX_LENGTH + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_load_balancer(&self) -> bool {
        self.prefix() == LOAD_BALANCER_PREFIX
    }
}

fn prefixed_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();

    REGEX.get_or_init(|| Regex::new(PREFIXED_ID_PATTERN).expect("invalid identifier pattern"))
}

impl FromStr for PrefixedId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PrefixedId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PrefixedId> for String {
    fn from(value: PrefixedId) -> Self {
        value.0
    }
}

impl AsRef<str> for PrefixedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PrefixedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
