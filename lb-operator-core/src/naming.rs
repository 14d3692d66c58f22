use data_encoding::HEXLOWER;
use thiserror::Error;

use crate::identifier::{IdentifierError, PrefixedId};

#[derive(Debug, Error)]
pub enum NamespaceNameError {
    #[error("'{}' is not a hex encoded name! Reason: {}", .0, .1)]
    Decode(String, data_encoding::DecodeError),
    #[error("'{}' doesn't decode to a valid UTF-8 string!", .0)]
    NotUtf8(String),
    #[error("'{}' doesn't decode to a valid identifier! Reason: {}", .0, .1)]
    InvalidIdentifier(String, IdentifierError),
}

/// Encodes a load balancer identifier into a name that's safe to use
/// for a namespace (lowercase hex of the identifier's bytes).
pub fn encode_namespace_name(id: &PrefixedId) -> String {
    HEXLOWER.encode(id.as_str().as_bytes())
}

/// Reverses [`encode_namespace_name`].
///
/// Any failure means the namespace isn't one this operator understands,
/// callers must not silently skip it.
pub fn decode_namespace_name(name: &str) -> Result<PrefixedId, NamespaceNameError> {
    let bytes = HEXLOWER
        .decode(name.as_bytes())
        .map_err(|err| NamespaceNameError::Decode(name.to_owned(), err))?;
    let raw = String::from_utf8(bytes).map_err(|_| NamespaceNameError::NotUtf8(name.to_owned()))?;

    PrefixedId::parse(&raw).map_err(|err| NamespaceNameError::InvalidIdentifier(name.to_owned(), err))
}
