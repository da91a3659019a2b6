//! Error type for the operation engine.
//!
//! Every failure inside the engine surfaces as one `EngineError` carrying
//! enough context to log and drop the offending operation. None of these
//! errors corrupt engine state: transforms work on owned copies, so a
//! caller can always retry at a higher level (for example by re-requesting
//! history from the server).

use thiserror::Error;

/// Errors raised while constructing, filing, or transforming operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// A serialized operation state was truncated, mistyped, or otherwise
    /// unreadable.
    #[error("malformed operation state: {0}")]
    MalformedState(String),

    /// The wire tag did not name a known operation kind.
    #[error("unknown operation kind: {0:?}")]
    UnknownKind(String),

    /// A remote operation reached the history buffer before the server
    /// assigned it a place in the total order.
    #[error("remote operation {0} is missing its total order")]
    MissingOrder(String),

    /// The same (site, seq) operation arrived twice with two different
    /// already-assigned total orders.
    #[error("duplicate total order for {key}: existing={existing} incoming={incoming}")]
    DuplicateOrder {
        key: String,
        existing: u64,
        incoming: u64,
    },

    /// A state difference named an operation the history buffer does not
    /// hold. The engine fell behind or history was discarded too early.
    #[error("history buffer is missing operation {0}")]
    MissingHistory(String),

    /// A recursive transform step produced an empty state difference where
    /// a non-trivial one was expected. Indicates corrupted history or a
    /// corrupted transform cache.
    #[error("transform produced an empty state difference")]
    EmptyDifference,

    /// Causal states failed to converge after recursive resolution.
    #[error("causal states failed to converge during transform")]
    StateMismatch,
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> EngineError {
        return EngineError::MalformedState(e.to_string());
    }
}
