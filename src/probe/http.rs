//! Minimal HTTP exchange for reachability probing
//!
//! One request out, one status line in. The probe deliberately parses
//! nothing past the status line: any syntactically valid HTTP response,
//! whatever its status, proves the endpoint is reachable.

use super::session::{ProbeSession, SessionOps};
use super::{Error, Result};
use bytes::BytesMut;

/// Upper bound on bytes scanned for a status line
const MAX_STATUS_LINE: usize = 8192;

/// Parsed HTTP response status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol version as sent (e.g. "HTTP/1.1")
    pub version: String,
    /// Status code
    pub status: u16,
    /// Reason phrase, possibly empty
    pub reason: String,
}

/// Find the next CRLF in a buffer
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parse an HTTP response status line
///
/// Format: VERSION STATUS REASON
/// Example: HTTP/1.1 200 OK
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let mut parts = line.splitn(3, ' ');

    let version = parts
        .next()
        .filter(|v| v.starts_with("HTTP/"))
        .ok_or_else(|| Error::MalformedResponse(format!("bad status line: {:?}", line)))?;

    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .filter(|code| (100..=599).contains(code))
        .ok_or_else(|| Error::MalformedResponse(format!("bad status code in {:?}", line)))?;

    let reason = parts.next().unwrap_or("").to_string();

    Ok(StatusLine {
        version: version.to_string(),
        status,
        reason,
    })
}

/// Send a single GET request for the given path
pub(crate) fn write_request<S: SessionOps>(
    session: &mut ProbeSession<S>,
    host_header: &str,
    path: &str,
) -> Result<()> {
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        path, host_header
    );
    let wire = request.as_bytes();
    let mut written = 0;

    while written < wire.len() {
        let n = session.write(&wire[written..])?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        written += n;
    }

    Ok(())
}

/// Read until a status line arrives (or the deadline/scan bound trips)
pub(crate) fn read_status_line<S: SessionOps>(
    session: &mut ProbeSession<S>,
) -> Result<StatusLine> {
    let mut buffer = BytesMut::with_capacity(1024);
    let mut temp = [0u8; 1024];

    loop {
        let n = session.read(&mut temp)?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        buffer.extend_from_slice(&temp[..n]);

        if let Some(crlf_pos) = find_crlf(&buffer) {
            let line = String::from_utf8_lossy(&buffer[..crlf_pos]).to_string();
            return parse_status_line(&line);
        }

        if buffer.len() > MAX_STATUS_LINE {
            return Err(Error::MalformedResponse(
                "no status line within scan bound".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_line() {
        let line = parse_status_line("HTTP/1.1 200 OK").unwrap();
        assert_eq!(line.version, "HTTP/1.1");
        assert_eq!(line.status, 200);
        assert_eq!(line.reason, "OK");

        // Reason phrase is optional
        let line = parse_status_line("HTTP/1.0 404").unwrap();
        assert_eq!(line.status, 404);
        assert_eq!(line.reason, "");

        // Multi-word reason survives intact
        let line = parse_status_line("HTTP/1.1 503 Service Unavailable").unwrap();
        assert_eq!(line.reason, "Service Unavailable");
    }

    #[test]
    fn test_parse_rejects_non_http() {
        assert!(parse_status_line("SSH-2.0-OpenSSH_9.5").is_err());
        assert!(parse_status_line("HTTP/1.1 banana OK").is_err());
        assert!(parse_status_line("HTTP/1.1 9000 Over").is_err());
        assert!(parse_status_line("").is_err());
    }

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"Hello\r\nWorld"), Some(5));
        assert_eq!(find_crlf(b"NoEOL"), None);
        assert_eq!(find_crlf(b"\r\n"), Some(0));
    }
}
