//! Trust anchor selection
//!
//! This module wraps a credential store (or a disabled / system-default
//! marker) into the verification policy applied to peer certificate
//! chains during a TLS handshake.

use super::keystore::Keystore;
use super::Result;
use openssl::ssl::{SslContextBuilder, SslVerifyMode};
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509;

/// Trust anchor set used to validate peer certificate chains
#[derive(Debug, Clone)]
pub enum TrustAnchors {
    /// Accept every chain unconditionally
    ///
    /// For testing and controlled environments only. Callers must reach
    /// this through explicit configuration, never a default.
    Disabled,

    /// The platform CA bundle, unmodified
    System,

    /// Exactly the entries of a credential store
    ///
    /// With `include_system_roots` the platform CA bundle is merged in,
    /// so chains anchored in either set validate. Without it the store
    /// entries are the only anchors. An empty store rejects everything
    /// (plus whatever the merge admits) - it never degrades to accept-all.
    Store {
        anchors: Vec<X509>,
        include_system_roots: bool,
    },
}

impl TrustAnchors {
    /// Accept-all trust, for explicit opt-in use
    pub fn disabled() -> Self {
        TrustAnchors::Disabled
    }

    /// Platform default trust anchors
    pub fn system() -> Self {
        TrustAnchors::System
    }

    /// Store entries merged with the platform CA bundle
    pub fn store_backed(store: &Keystore) -> Self {
        TrustAnchors::Store {
            anchors: store.certificates().cloned().collect(),
            include_system_roots: true,
        }
    }

    /// Store entries only, no platform roots
    pub fn pinned(store: &Keystore) -> Self {
        TrustAnchors::Store {
            anchors: store.certificates().cloned().collect(),
            include_system_roots: false,
        }
    }

    /// Whether chain verification is disabled entirely
    pub fn is_disabled(&self) -> bool {
        matches!(self, TrustAnchors::Disabled)
    }

    /// Configure verification on a TLS context under construction
    pub(crate) fn apply(&self, builder: &mut SslContextBuilder) -> Result<()> {
        match self {
            TrustAnchors::Disabled => {
                builder.set_verify(SslVerifyMode::NONE);
            }
            TrustAnchors::System => {
                builder.set_default_verify_paths()?;
                builder.set_verify(SslVerifyMode::PEER);
            }
            TrustAnchors::Store {
                anchors,
                include_system_roots,
            } => {
                let mut store = X509StoreBuilder::new()?;
                for cert in anchors {
                    store.add_cert(cert.clone())?;
                }
                if *include_system_roots {
                    store.set_default_paths()?;
                }
                builder.set_cert_store(store.build());
                builder.set_verify(SslVerifyMode::PEER);

                tracing::debug!(
                    anchors = anchors.len(),
                    system_roots = *include_system_roots,
                    "configured store-backed trust anchors"
                );
            }
        }
        Ok(())
    }
}
