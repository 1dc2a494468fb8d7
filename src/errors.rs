//! Error taxonomy for the Bolt core. A flat, closed enum rather than
//! `anyhow`: callers match on the variant to decide recoverability.

use thiserror::Error;

/// Severity hint derived from a server-reported `FAILURE` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Transient,
    Recoverable,
    Fatal,
}

/// Classifies a Neo4j-style error code (`Neo.ClientError.Statement.SyntaxError`,
/// `Neo.TransientError.Transaction.LockClientStopped`, ...) into a severity
/// hint. `Neo.ClientError.Security.*` is fatal (the connection's credentials
/// are bad and retrying won't help); `Neo.TransientError.*` is transient;
/// everything else, including codes we don't recognize, is recoverable via
/// `RESET`.
pub fn classify_server_code(code: &str) -> Severity {
    if code.starts_with("Neo.ClientError.Security.") {
        Severity::Fatal
    } else if code.starts_with("Neo.TransientError.") {
        Severity::Transient
    } else {
        Severity::Recoverable
    }
}

#[derive(Debug, Error)]
pub enum BoltError {
    #[error("network error: {0}")]
    NetworkError(#[from] std::io::Error),

    #[error("handshake failed: no matching protocol version")]
    HandshakeFailed,

    #[error("unsupported protocol version: {0}.{1}")]
    UnsupportedProtocolVersion(u8, u8),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("recursion depth exceeded (cap = {0})")]
    RecursionDepthExceeded(usize),

    #[error("message too large: {size} bytes exceeds cap of {cap} bytes")]
    MessageTooLarge { size: u64, cap: u64 },

    #[error("out of memory")]
    OutOfMemory,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown error: {0}")]
    UnknownError(String),
}

pub type Result<T> = std::result::Result<T, BoltError>;

pub fn missing_field(name: &'static str) -> BoltError {
    BoltError::InvalidMessageFormat(format!("missing field '{name}'"))
}

pub fn duplicate_field(name: &str) -> BoltError {
    BoltError::InvalidMessageFormat(format!("duplicate key '{name}' in map"))
}
