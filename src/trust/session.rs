//! TLS session operations
//!
//! This module implements the probe's `SessionOps` trait for TLS
//! connections, so endpoint probing is transparent to whether the
//! transport is plain TCP or TLS.

use super::cert::{peer_chain, CertInfo};
use super::TrustError;
use crate::probe::session::{PollEvents, SessionOps};
use crate::probe::{Error, Result as ProbeResult};
use openssl::ssl::{ErrorCode, HandshakeError, Ssl, SslStream};
use openssl::x509::X509VerifyResult;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::time::Duration;

/// TLS session over an established TCP stream
///
/// Wraps an OpenSSL `SslStream` and provides poll/read/write/close
/// operations for the probe layer.
pub struct TlsSession {
    stream: SslStream<TcpStream>,
    failed: bool,
}

impl TlsSession {
    /// Perform a blocking client handshake
    ///
    /// Trust rejection is reported as `TrustError::Untrusted` (carrying
    /// the verification result), deadline expiry as `HandshakeTimeout`,
    /// anything else as `Handshake`.
    pub(crate) fn connect(ssl: Ssl, stream: TcpStream) -> Result<Self, TrustError> {
        let stream = match ssl.connect(stream) {
            Ok(stream) => stream,
            Err(err) => return Err(classify_handshake_error(err)),
        };

        if let Some(peer) = stream.ssl().peer_certificate() {
            let info = CertInfo::from_x509(&peer);
            tracing::debug!(
                subject = %info.subject,
                issuer = %info.issuer,
                "TLS handshake complete"
            );
        }

        Ok(TlsSession {
            stream,
            failed: false,
        })
    }

    /// Certificate chain presented by the peer (leaf first)
    pub fn peer_certificates(&self) -> Vec<CertInfo> {
        peer_chain(self.stream.ssl())
            .iter()
            .map(CertInfo::from_x509)
            .collect()
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Get mutable reference to underlying TCP stream
    pub fn get_mut(&mut self) -> &mut TcpStream {
        self.stream.get_mut()
    }

    pub(crate) fn ssl_stream(&self) -> &SslStream<TcpStream> {
        &self.stream
    }
}

impl SessionOps for TlsSession {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> ProbeResult<bool> {
        use libc::{poll, pollfd, POLLIN, POLLOUT};

        // TLS-layer buffered bytes are readable without touching the fd
        if events == PollEvents::Read || events == PollEvents::Both {
            if self.stream.ssl().pending() > 0 {
                return Ok(true);
            }
        }

        let mut pfd = pollfd {
            fd: self.stream.get_ref().as_raw_fd(),
            events: match events {
                PollEvents::Read => POLLIN,
                PollEvents::Write => POLLOUT,
                PollEvents::Both => POLLIN | POLLOUT,
            },
            revents: 0,
        };

        let timeout_ms = timeout.map(|d| d.as_millis() as i32).unwrap_or(-1);

        let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

        if result < 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }

        Ok(result > 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> ProbeResult<usize> {
        match self.stream.read(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.failed = true;
                Err(Error::Io(e))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> ProbeResult<usize> {
        match self.stream.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.failed = true;
                Err(Error::Io(e))
            }
        }
    }

    fn close(&mut self) -> ProbeResult<()> {
        if !self.failed {
            let _ = self.stream.shutdown();
        }

        use std::net::Shutdown;
        self.stream
            .get_mut()
            .shutdown(Shutdown::Both)
            .map_err(Error::from)
    }
}

fn classify_handshake_error(err: HandshakeError<TcpStream>) -> TrustError {
    match err {
        HandshakeError::SetupFailure(stack) => TrustError::OpenSsl(stack),
        HandshakeError::Failure(mid) => {
            let verify = mid.ssl().verify_result();
            if verify != X509VerifyResult::OK {
                return TrustError::Untrusted(verify.error_string().to_string());
            }

            let error = mid.error();
            let timed_out = error.code() == ErrorCode::WANT_READ
                || error.code() == ErrorCode::WANT_WRITE
                || error
                    .io_error()
                    .map(|e| {
                        matches!(
                            e.kind(),
                            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                        )
                    })
                    .unwrap_or(false);

            if timed_out {
                TrustError::HandshakeTimeout
            } else {
                TrustError::Handshake(error.to_string())
            }
        }
        // Streams here are blocking with read timeouts, so an interrupted
        // handshake means the deadline expired
        HandshakeError::WouldBlock(_) => TrustError::HandshakeTimeout,
    }
}
