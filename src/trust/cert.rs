//! Certificate introspection
//!
//! Parsing and extraction of identity information from X.509
//! certificates, plus the opt-in peer-certificate capture used by
//! deployment tooling to seed a truststore.

use super::context::TlsContext;
use super::{Result, TrustError};
use crate::probe::session::TcpSession;
use openssl::nid::Nid;
use openssl::ssl::SslRef;
use openssl::x509::{X509Ref, X509};
use std::time::Duration;

/// Certificate identity summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: String,
    /// Certificate issuer (Common Name)
    pub issuer: String,
    /// Subject Alternative Names (DNS names and IP addresses)
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    /// Extract identity information from an X.509 certificate
    pub fn from_x509<T: AsRef<X509Ref>>(cert: &T) -> Self {
        let cert = cert.as_ref();
        CertInfo {
            subject: get_cn(cert.subject_name()),
            issuer: get_cn(cert.issuer_name()),
            subject_alt_names: get_subject_alt_names(cert),
        }
    }
}

/// Get Common Name from an X.509 name
fn get_cn(name: &openssl::x509::X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "<undef>".to_string())
}

/// Get Subject Alternative Names
fn get_subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(san_ext) = cert.subject_alt_names() {
        for name in san_ext {
            if let Some(dns) = name.dnsname() {
                names.push(format!("DNS:{}", dns));
            } else if let Some(ip) = name.ipaddress() {
                if ip.len() == 4 {
                    names.push(format!("IP:{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]));
                } else if ip.len() == 16 {
                    let groups: Vec<String> = ip
                        .chunks(2)
                        .map(|pair| format!("{:02x}{:02x}", pair[0], pair[1]))
                        .collect();
                    names.push(format!("IP:{}", groups.join(":")));
                }
            }
        }
    }

    names
}

/// Certificate chain presented by the peer (leaf first)
pub(crate) fn peer_chain(ssl: &SslRef) -> Vec<X509> {
    if let Some(chain) = ssl.peer_cert_chain() {
        if !chain.is_empty() {
            return chain.iter().map(|cert| cert.to_owned()).collect();
        }
    }

    ssl.peer_certificate().into_iter().collect()
}

/// Capture the certificate chain a server presents
///
/// Connects with an accept-all context and returns the presented chain so
/// test or deployment tooling can decide which certificates to store as
/// trust anchors. This is an explicit setup step invoked once by tooling,
/// never an implicit side effect of building a context.
pub fn fetch_peer_certificates(host: &str, port: u16, timeout: Duration) -> Result<Vec<X509>> {
    let context = TlsContext::disabled()?;

    let tcp = TcpSession::connect(host, port, timeout)?;
    let stream = tcp.into_stream();
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let session = context.connect(host, stream)?;
    let chain = peer_chain(session.ssl_stream().ssl());

    if chain.is_empty() {
        return Err(TrustError::Handshake(format!(
            "{}:{} presented no certificate",
            host, port
        )));
    }

    Ok(chain)
}
