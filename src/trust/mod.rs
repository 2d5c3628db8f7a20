//! TLS trust establishment
//!
//! This module turns externally supplied trust material into ready-to-use
//! TLS contexts for outbound connections.
//!
//! # Architecture
//!
//! Context construction is a straight pipeline:
//!
//! 1. `Keystore` loads certificate entries from a trust resource
//!    (PEM bundle, PKCS#12 bag, or a single DER certificate)
//! 2. `TrustAnchors` wraps the entries (or a disabled / system-default
//!    marker) into a verification policy
//! 3. `TlsContext` composes trust anchors with a hostname-verification
//!    policy and mints per-connection TLS state on demand
//!
//! A built context never re-reads trust material and is safe to share
//! across threads; every connection attempt gets its own `Ssl` handle.
//!
//! Loader and builder failures are configuration problems. They propagate
//! unchanged so startup stops instead of degrading into an insecure
//! default - a missing truststore or a wrong password must never silently
//! become an empty (or accept-all) trust set.
//!
//! # Examples
//!
//! ```no_run
//! use trustprobe::trust::{KeystoreFormat, TlsContext, TrustResource};
//!
//! let context = TlsContext::from_keystore(
//!     &TrustResource::file("/etc/cas/truststore.p12"),
//!     "changeit",
//!     KeystoreFormat::Pkcs12,
//! ).unwrap();
//!
//! let stream = std::net::TcpStream::connect("idp.example.org:443").unwrap();
//! let session = context.connect("idp.example.org", stream).unwrap();
//! ```

pub mod anchors;
pub mod cert;
pub mod context;
pub mod hostname;
pub mod keystore;
pub mod session;

pub use anchors::TrustAnchors;
pub use cert::{fetch_peer_certificates, CertInfo};
pub use context::TlsContext;
pub use hostname::HostnameVerification;
pub use keystore::{Keystore, KeystoreFormat, TrustResource};
pub use session::TlsSession;

/// Result type for trust operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Trust establishment errors
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("trust resource {name} not found: {source}")]
    ResourceNotFound {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("trust material {name} rejected: {reason}")]
    Integrity { name: String, reason: String },

    #[error("unsupported keystore format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid trust configuration: {0}")]
    Configuration(String),

    #[error("peer certificate rejected: {0}")]
    Untrusted(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error("TLS handshake timed out")]
    HandshakeTimeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}
