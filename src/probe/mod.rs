//! Endpoint reachability probing
//!
//! This module answers one question: does a URL respond? A probe performs
//! a single blocking round trip - connect, optionally handshake through a
//! shared `TlsContext`, send one request, and wait for any HTTP status
//! line - under bounded timeouts.
//!
//! # Architecture
//!
//! Probe I/O uses a session operations abstraction so the exchange is
//! transparent to the underlying transport:
//!
//! - `SessionOps` defines the operations (poll, read, write, close)
//! - `TcpSession` implements them over plain TCP
//! - `trust::TlsSession` implements them over TLS
//! - `ProbeSession` wraps either with a per-operation deadline
//!
//! Network-negative outcomes (DNS failure, refusal, handshake rejection,
//! deadline expiry) are expected results, not errors: `is_reachable`
//! folds them into `false` so reachability checks compose into health
//! checks without exception-style control flow. Only configuration-level
//! misuse - a malformed URL, an unsupported scheme - is a reported error.

pub mod http;
pub mod session;
pub mod validator;

pub use http::StatusLine;
pub use session::{PollEvents, ProbeSession, SessionOps, TcpSession};
pub use validator::{EndpointValidator, ProbeFailure, ProbeOutcome};

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Probe operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timeout")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
}
