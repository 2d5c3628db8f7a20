//! Session operations abstraction
//!
//! The session operations pattern keeps probe I/O transparent to the
//! underlying transport: plain TCP and TLS sessions implement the same
//! trait, and `ProbeSession` adds the per-operation deadline on top.

use super::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Session operations trait
///
/// Operations that can be performed on a probe transport, abstracting
/// over plain TCP and TLS connections.
pub trait SessionOps {
    /// Poll the session for events
    ///
    /// Returns true if the session is ready for the requested operation
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool>;

    /// Read data from the session
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the session
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Close the session
    fn close(&mut self) -> Result<()>;
}

/// Poll events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvents {
    Read,
    Write,
    Both,
}

/// Probe session wrapping a transport with a per-operation deadline
///
/// Every read and write polls first; an operation that is not ready
/// within the deadline reports `Error::Timeout` instead of hanging.
pub struct ProbeSession<S: SessionOps> {
    session: S,
    timeout: Option<Duration>,
}

impl<S: SessionOps> ProbeSession<S> {
    /// Wrap a transport with a deadline
    pub fn new(session: S, timeout: Duration) -> Self {
        ProbeSession {
            session,
            timeout: Some(timeout),
        }
    }

    /// Set the per-operation deadline
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Read data within the deadline
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.session.poll(PollEvents::Read, self.timeout)? {
            return Err(Error::Timeout);
        }

        self.session.read(buf)
    }

    /// Write data within the deadline
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.session.poll(PollEvents::Write, self.timeout)? {
            return Err(Error::Timeout);
        }

        self.session.write(buf)
    }

    /// Close the session
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    /// Get a reference to the underlying transport
    pub fn get_ref(&self) -> &S {
        &self.session
    }
}

/// Plain TCP session operations
pub struct TcpSession {
    stream: TcpStream,
}

impl TcpSession {
    /// Wrap an established TCP stream
    pub fn new(stream: TcpStream) -> Self {
        TcpSession { stream }
    }

    /// Resolve a host and connect with a bounded timeout
    ///
    /// Tries every resolved address in order; the timeout applies per
    /// connection attempt.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;

        for addr in (host, port).to_socket_addrs()? {
            match connect_stream(&addr, timeout) {
                Ok(stream) => return Ok(TcpSession::new(stream)),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} resolved no addresses", host))
        }))
    }

    /// Get a reference to the underlying stream
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Take the underlying stream
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

impl SessionOps for TcpSession {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
        use libc::{poll, pollfd, POLLIN, POLLOUT};

        let mut pfd = pollfd {
            fd: self.stream.as_raw_fd(),
            events: match events {
                PollEvents::Read => POLLIN,
                PollEvents::Write => POLLOUT,
                PollEvents::Both => POLLIN | POLLOUT,
            },
            revents: 0,
        };

        let timeout_ms = timeout
            .map(|d| d.as_millis() as i32)
            .unwrap_or(-1); // -1 = infinite

        let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

        if result < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(result > 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        use std::net::Shutdown;
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }
}

/// Connect to a single address with a timeout
fn connect_stream(addr: &SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nodelay(true)?;
    socket.connect_timeout(&(*addr).into(), timeout)?;
    socket.set_nonblocking(false)?;
    Ok(socket.into())
}
