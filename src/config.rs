//! Configuration binding
//!
//! The interface boundary to the embedding platform's configuration
//! machinery. Settings arrive as plain data (deserializable from
//! whatever binding layer the platform uses) and resolve into a
//! `TlsContext` and an `EndpointValidator`. Contradictory settings stop
//! resolution with a configuration error instead of degrading into an
//! insecure default.

use crate::probe::EndpointValidator;
use crate::trust::{
    HostnameVerification, Keystore, KeystoreFormat, TlsContext, TrustAnchors, TrustError,
    TrustResource,
};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Trust mode selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustMode {
    /// Accept every peer; testing/controlled environments only
    Disabled,
    /// Platform CA bundle
    SystemDefault,
    /// Custom truststore merged with the platform CA bundle
    Keystore,
}

/// A secret string whose debug output is redacted
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Create a password from a plain string
    pub fn new(value: impl Into<String>) -> Self {
        Password(value.into())
    }

    /// The secret value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Password::new(value)
    }
}

/// Truststore settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TrustStoreSettings {
    /// Trust mode: disabled, system-default, or keystore
    pub mode: TrustMode,
    /// Truststore path, required in keystore mode
    pub store: Option<PathBuf>,
    /// Truststore password, used by password-protected formats
    pub password: Password,
    /// Container format tag (PEM, PKCS12, DER)
    pub format: String,
}

impl Default for TrustStoreSettings {
    fn default() -> Self {
        TrustStoreSettings {
            mode: TrustMode::SystemDefault,
            store: None,
            password: Password::default(),
            format: "PEM".to_string(),
        }
    }
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpClientSettings {
    /// Trust establishment settings
    pub trust: TrustStoreSettings,
    /// Hostname verification policy
    pub hostname_verification: HostnameVerification,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Response statuses accepted by reachability checks (any when unset)
    pub acceptable_status: Option<Vec<u16>>,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        HttpClientSettings {
            trust: TrustStoreSettings::default(),
            hostname_verification: HostnameVerification::Strict,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            acceptable_status: None,
        }
    }
}

impl HttpClientSettings {
    /// Resolve the settings into a TLS context
    ///
    /// Keystore loading and trust building errors propagate unchanged;
    /// contradictory settings are `TrustError::Configuration`.
    pub fn build_context(&self) -> Result<TlsContext, TrustError> {
        let anchors = match self.trust.mode {
            TrustMode::Disabled => TrustAnchors::disabled(),
            TrustMode::SystemDefault => TrustAnchors::system(),
            TrustMode::Keystore => {
                let path = self.trust.store.as_ref().ok_or_else(|| {
                    TrustError::Configuration(
                        "trust mode 'keystore' requires a store path".to_string(),
                    )
                })?;
                let format = KeystoreFormat::from_str(&self.trust.format)?;
                let store = Keystore::load(
                    &TrustResource::file(path),
                    self.trust.password.as_str(),
                    format,
                )?;
                TrustAnchors::store_backed(&store)
            }
        };

        TlsContext::build(anchors, self.hostname_verification)
    }

    /// Build the endpoint validator these settings describe
    pub fn validator(&self) -> EndpointValidator {
        let mut validator = EndpointValidator::new()
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .read_timeout(Duration::from_millis(self.read_timeout_ms));

        if let Some(codes) = &self.acceptable_status {
            validator = validator.acceptable_status(codes.clone());
        }

        validator
    }
}
