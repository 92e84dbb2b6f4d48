//! Error types.
//!
//! Every failure is a deterministic function of bad input state and is
//! reported before any mutation of the tree or the leaf index.

use crate::location::{EndpointId, LocationKey, Tier};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalityError {
    /// No endpoints are registered under this key.
    #[error("no endpoints registered at {0}")]
    UnknownLocationKey(LocationKey),

    /// The endpoint is not registered at the key it claims, or at all.
    #[error("endpoint {0} is not registered")]
    UnknownEndpoint(EndpointId),

    /// A serialized array yielded no live candidate (or an invalid code) at
    /// some tier. Points at a flatten or transport bug, or a stale snapshot.
    #[error("malformed array: no valid {tier} entry reachable from index {index}")]
    MalformedArray { tier: Tier, index: usize },

    #[error("endpoint {0} is already registered")]
    DuplicateEndpointId(EndpointId),
}

pub type Result<T> = std::result::Result<T, LocalityError>;
