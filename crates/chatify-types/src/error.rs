use thiserror::Error;

/// Errors from repository operations (used by trait definitions in chatify-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Why an inbound text frame could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("envelope is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("envelope has no string 'type' field")]
    MissingType,

    #[error("unknown envelope type '{0}'")]
    UnknownType(String),

    #[error("malformed '{kind}' envelope: {reason}")]
    Malformed { kind: String, reason: String },
}

/// Why a push to a connected user did not go out.
///
/// Pushes are fire-and-forget: callers log these at debug and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("user has no live connection")]
    NotConnected,

    #[error("connection transport is closed")]
    Closed,
}

/// Failure while handling a single inbound envelope.
///
/// Never tears down the connection: the dispatcher logs it and keeps serving.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("rejected '{kind}': {reason}")]
    Rejected { kind: &'static str, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
