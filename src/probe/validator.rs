//! Endpoint validator
//!
//! A single blocking round trip per call: resolve, connect, handshake
//! when the scheme asks for it, send one request, wait for any status
//! line. Every network-negative outcome folds into an unreachable
//! result; only malformed input is an error.

use super::http::{read_status_line, write_request};
use super::session::{ProbeSession, TcpSession};
use super::{Error, Result};
use crate::trust::{TlsContext, TrustError};
use std::time::Duration;
use url::Url;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Why an endpoint probe came back negative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// DNS failure, refusal, reset, or a non-HTTP peer
    Transport(String),
    /// TLS negotiation failed, including trust rejection
    Handshake(String),
    /// The bounded timeout expired
    Timeout,
}

/// Result of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// An HTTP response arrived
    Reachable { status: u16 },
    /// No usable response; the failure category is kept for diagnostics
    Unreachable(ProbeFailure),
}

impl ProbeOutcome {
    /// Whether the endpoint responded at all
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }
}

/// Endpoint reachability validator
///
/// Holds the probe timeouts and the optional status filter. One
/// validator can be shared and invoked concurrently against the same
/// `TlsContext`; each call is an independent blocking round trip.
#[derive(Debug, Clone)]
pub struct EndpointValidator {
    connect_timeout: Duration,
    read_timeout: Duration,
    acceptable_status: Option<Vec<u16>>,
}

impl Default for EndpointValidator {
    fn default() -> Self {
        EndpointValidator {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            acceptable_status: None,
        }
    }
}

impl EndpointValidator {
    /// Create a validator with default timeouts and no status filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Restrict which response statuses count as reachable
    ///
    /// Without a filter any status does, per the reachability contract.
    pub fn acceptable_status(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.acceptable_status = Some(statuses.into());
        self
    }

    /// Check whether a URL responds
    ///
    /// `https` URLs handshake through the given context; `http` URLs
    /// ignore it entirely. Network-negative outcomes are `Ok(false)`,
    /// never errors.
    pub fn is_reachable(&self, url: &str, context: &TlsContext) -> Result<bool> {
        match self.probe(url, context)? {
            ProbeOutcome::Reachable { status } => Ok(self.accepts(status)),
            ProbeOutcome::Unreachable(_) => Ok(false),
        }
    }

    /// Probe a URL, exposing the response status or failure category
    pub fn probe(&self, url: &str, context: &TlsContext) -> Result<ProbeOutcome> {
        let url = Url::parse(url)?;

        let encrypted = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(Error::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::MissingHost(url.to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .unwrap_or(if encrypted { 443 } else { 80 });

        let outcome = self.exchange(&url, &host, port, encrypted, context);

        match &outcome {
            Ok(ProbeOutcome::Reachable { status }) => {
                tracing::debug!(url = %url, status = *status, "endpoint responded");
            }
            Ok(ProbeOutcome::Unreachable(failure)) => {
                tracing::warn!(url = %url, failure = ?failure, "endpoint unreachable");
            }
            Err(_) => {}
        }

        outcome
    }

    fn exchange(
        &self,
        url: &Url,
        host: &str,
        port: u16,
        encrypted: bool,
        context: &TlsContext,
    ) -> Result<ProbeOutcome> {
        let tcp = match TcpSession::connect(host, port, self.connect_timeout) {
            Ok(tcp) => tcp,
            Err(e) => return Ok(ProbeOutcome::Unreachable(connect_failure(e))),
        };

        let host_header = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        if encrypted {
            let stream = tcp.into_stream();
            // Bound the handshake; the probe session bounds everything after
            stream.set_read_timeout(Some(self.read_timeout))?;
            stream.set_write_timeout(Some(self.read_timeout))?;

            let tls = match context.connect(host, stream) {
                Ok(tls) => tls,
                Err(e) => return Ok(ProbeOutcome::Unreachable(handshake_failure(e))),
            };

            self.roundtrip(ProbeSession::new(tls, self.read_timeout), &host_header, &path)
        } else {
            self.roundtrip(ProbeSession::new(tcp, self.read_timeout), &host_header, &path)
        }
    }

    fn roundtrip<S: super::SessionOps>(
        &self,
        mut session: ProbeSession<S>,
        host_header: &str,
        path: &str,
    ) -> Result<ProbeOutcome> {
        let result = write_request(&mut session, host_header, path)
            .and_then(|_| read_status_line(&mut session));
        let _ = session.close();

        match result {
            Ok(line) => Ok(ProbeOutcome::Reachable {
                status: line.status,
            }),
            Err(Error::Timeout) => Ok(ProbeOutcome::Unreachable(ProbeFailure::Timeout)),
            Err(Error::Io(e)) => Ok(ProbeOutcome::Unreachable(ProbeFailure::Transport(
                e.to_string(),
            ))),
            Err(Error::ConnectionClosed) => Ok(ProbeOutcome::Unreachable(
                ProbeFailure::Transport("connection closed before response".to_string()),
            )),
            Err(Error::MalformedResponse(detail)) => {
                Ok(ProbeOutcome::Unreachable(ProbeFailure::Transport(detail)))
            }
            Err(e) => Err(e),
        }
    }

    fn accepts(&self, status: u16) -> bool {
        match &self.acceptable_status {
            Some(codes) => codes.contains(&status),
            None => true,
        }
    }
}

fn connect_failure(err: std::io::Error) -> ProbeFailure {
    match err.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => ProbeFailure::Timeout,
        _ => ProbeFailure::Transport(err.to_string()),
    }
}

fn handshake_failure(err: TrustError) -> ProbeFailure {
    match err {
        TrustError::HandshakeTimeout => ProbeFailure::Timeout,
        other => ProbeFailure::Handshake(other.to_string()),
    }
}
