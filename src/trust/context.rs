//! TLS context factory
//!
//! A `TlsContext` composes one trust anchor set with one hostname
//! verification policy over a built OpenSSL context. It is constructed
//! once per configuration and then shared read-only: minting per-connection
//! TLS state never re-reads trust material, and the underlying context is
//! reference-counted and immutable, so concurrent connection attempts need
//! no locking.

use super::anchors::TrustAnchors;
use super::hostname::HostnameVerification;
use super::keystore::{Keystore, KeystoreFormat, TrustResource};
use super::session::TlsSession;
use super::{Result, TrustError};
use openssl::ssl::{Ssl, SslContext, SslContextBuilder, SslMethod};
use std::net::{IpAddr, TcpStream};

/// TLS context for outbound connections (immutable after building)
#[derive(Clone, Debug)]
pub struct TlsContext {
    ctx: SslContext,
    hostname: HostnameVerification,
    trust_disabled: bool,
}

impl TlsContext {
    /// Compose trust anchors and a hostname policy into a context
    ///
    /// This is the factory primitive behind every named variant. Keystore
    /// and anchor errors propagate unchanged, so callers can distinguish a
    /// missing resource from a bad password from a format mismatch. The
    /// contradictory accept-all-trust plus strict-hostnames combination is
    /// rejected here, the single choke point every variant passes through.
    pub fn build(anchors: TrustAnchors, hostname: HostnameVerification) -> Result<Self> {
        if anchors.is_disabled() && hostname.is_strict() {
            return Err(TrustError::Configuration(
                "strict hostname verification requires peer chain verification; \
                 disable both or neither"
                    .to_string(),
            ));
        }

        let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;
        anchors.apply(&mut builder)?;

        tracing::debug!(
            trust_disabled = anchors.is_disabled(),
            hostname = hostname.as_str(),
            "built TLS context"
        );

        Ok(TlsContext {
            ctx: builder.build(),
            hostname,
            trust_disabled: anchors.is_disabled(),
        })
    }

    /// Accept-all context: no chain verification, no hostname checks
    ///
    /// For testing and controlled environments only; must be gated behind
    /// explicit configuration.
    pub fn disabled() -> Result<Self> {
        Self::build(TrustAnchors::disabled(), HostnameVerification::Disabled)
    }

    /// Platform default trust anchors with strict hostname checks
    pub fn system_default() -> Result<Self> {
        Self::build(TrustAnchors::system(), HostnameVerification::Strict)
    }

    /// Keystore-backed context with strict hostname checks
    ///
    /// The store's entries are merged with the platform CA bundle, so the
    /// context validates peers anchored in the custom store as well as
    /// peers chaining to public roots.
    pub fn from_keystore(
        resource: &TrustResource,
        password: &str,
        format: KeystoreFormat,
    ) -> Result<Self> {
        let store = Keystore::load(resource, password, format)?;
        Self::build(
            TrustAnchors::store_backed(&store),
            HostnameVerification::Strict,
        )
    }

    /// The hostname verification policy of this context
    pub fn hostname_verification(&self) -> HostnameVerification {
        self.hostname
    }

    /// Whether chain verification is disabled
    pub fn is_trust_disabled(&self) -> bool {
        self.trust_disabled
    }

    /// Mint per-connection TLS state for a target server
    ///
    /// Sets SNI for DNS names and, under strict hostname verification,
    /// installs the host (or IP) into the verification parameters so the
    /// chain check also matches the peer identity.
    pub fn ssl(&self, servername: &str) -> Result<Ssl> {
        let mut ssl = Ssl::new(&self.ctx)?;

        match servername.parse::<IpAddr>() {
            Ok(ip) => {
                // IP literals don't participate in SNI
                if self.hostname.is_strict() {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(servername)?;
                if self.hostname.is_strict() {
                    ssl.param_mut().set_host(servername)?;
                }
            }
        }

        Ok(ssl)
    }

    /// Perform a blocking TLS handshake over an established TCP stream
    pub fn connect(&self, servername: &str, stream: TcpStream) -> Result<TlsSession> {
        TlsSession::connect(self.ssl(servername)?, stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::cert::testdata::TEST_CERT;

    #[test]
    fn test_disabled_context() {
        let context = TlsContext::disabled().unwrap();
        assert!(context.is_trust_disabled());
        assert!(!context.hostname_verification().is_strict());
    }

    #[test]
    fn test_system_default_context() {
        let context = TlsContext::system_default().unwrap();
        assert!(!context.is_trust_disabled());
        assert!(context.hostname_verification().is_strict());
    }

    #[test]
    fn test_keystore_backed_context() {
        let resource = TrustResource::from_bytes("test.pem", TEST_CERT);
        let context =
            TlsContext::from_keystore(&resource, "", KeystoreFormat::Pem).unwrap();
        assert!(!context.is_trust_disabled());
    }

    #[test]
    fn test_keystore_errors_propagate_unchanged() {
        let missing = TrustResource::file("/nonexistent/truststore.pem");
        let err = TlsContext::from_keystore(&missing, "", KeystoreFormat::Pem).unwrap_err();
        assert!(matches!(err, TrustError::ResourceNotFound { .. }));

        let garbage = TrustResource::from_bytes("bad.p12", &b"\x00"[..]);
        let err =
            TlsContext::from_keystore(&garbage, "changeit", KeystoreFormat::Pkcs12).unwrap_err();
        assert!(matches!(err, TrustError::Integrity { .. }));
    }

    #[test]
    fn test_disabled_trust_with_strict_hostnames_is_rejected() {
        let err = TlsContext::build(TrustAnchors::disabled(), HostnameVerification::Strict)
            .unwrap_err();
        assert!(matches!(err, TrustError::Configuration(_)));
    }

    #[test]
    fn test_ssl_minting_does_not_reload_material() {
        let context = TlsContext::disabled().unwrap();
        // Several handles from the same context, including IP literals
        context.ssl("example.com").unwrap();
        context.ssl("example.com").unwrap();
        context.ssl("127.0.0.1").unwrap();
    }

    #[test]
    fn test_context_is_share_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TlsContext>();
    }
}
