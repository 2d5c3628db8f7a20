//! Trust material loading
//!
//! This module reads certificate trust material from a resource (file or
//! in-memory bytes) into an in-memory credential store. The container
//! format is a caller-supplied hint, never sniffed from content.

use super::{Result, TrustError};
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::x509::X509;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keystore container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoreFormat {
    /// Concatenated PEM certificates (no password)
    Pem,
    /// PKCS#12 bag, protected by a password
    Pkcs12,
    /// A single DER-encoded certificate
    Der,
}

impl KeystoreFormat {
    /// Parse a format tag from a configuration string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "PEM" => Ok(KeystoreFormat::Pem),
            "PKCS12" | "P12" => Ok(KeystoreFormat::Pkcs12),
            "DER" => Ok(KeystoreFormat::Der),
            _ => Err(TrustError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Get the format tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            KeystoreFormat::Pem => "PEM",
            KeystoreFormat::Pkcs12 => "PKCS12",
            KeystoreFormat::Der => "DER",
        }
    }
}

/// A trust material resource: a byte source plus a display name for errors
///
/// Loading never mutates the source.
#[derive(Debug, Clone)]
pub enum TrustResource {
    /// Read from the filesystem
    File(PathBuf),
    /// Caller-supplied bytes, e.g. from `include_bytes!`
    Memory { name: String, data: Vec<u8> },
}

impl TrustResource {
    /// Create a filesystem resource
    pub fn file(path: impl Into<PathBuf>) -> Self {
        TrustResource::File(path.into())
    }

    /// Create an in-memory resource with a name used in error reporting
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        TrustResource::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Display name of the resource
    pub fn name(&self) -> String {
        match self {
            TrustResource::File(path) => path.display().to_string(),
            TrustResource::Memory { name, .. } => name.clone(),
        }
    }

    fn read(&self) -> Result<Vec<u8>> {
        match self {
            TrustResource::File(path) => {
                std::fs::read(path).map_err(|source| TrustError::ResourceNotFound {
                    name: path.display().to_string(),
                    source,
                })
            }
            TrustResource::Memory { data, .. } => Ok(data.clone()),
        }
    }
}

/// In-memory credential store: trusted certificate entries keyed by alias
///
/// Aliases are unique within the store. Inserting under an existing alias
/// replaces the prior entry.
#[derive(Debug, Clone, Default)]
pub struct Keystore {
    entries: BTreeMap<String, X509>,
}

impl Keystore {
    /// Create an empty store
    pub fn new() -> Self {
        Keystore {
            entries: BTreeMap::new(),
        }
    }

    /// Load a store from a trust resource
    ///
    /// The password only applies to password-protected formats (PKCS#12);
    /// other formats ignore it. A missing or unreadable resource is
    /// `ResourceNotFound`; a wrong password or undecodable material is
    /// `Integrity` - neither ever yields an empty store.
    pub fn load(resource: &TrustResource, password: &str, format: KeystoreFormat) -> Result<Self> {
        let name = resource.name();
        let data = resource.read()?;

        let certs = match format {
            KeystoreFormat::Pem => {
                X509::stack_from_pem(&data).map_err(|e| integrity(&name, e))?
            }
            KeystoreFormat::Der => {
                vec![X509::from_der(&data).map_err(|e| integrity(&name, e))?]
            }
            KeystoreFormat::Pkcs12 => {
                let bag = Pkcs12::from_der(&data).map_err(|e| integrity(&name, e))?;
                let parsed = bag.parse2(password).map_err(|e| integrity(&name, e))?;

                let mut certs = Vec::new();
                if let Some(cert) = parsed.cert {
                    certs.push(cert);
                }
                if let Some(ca) = parsed.ca {
                    certs.extend(ca);
                }
                certs
            }
        };

        let mut store = Keystore::new();
        for cert in certs {
            let alias = store.unique_alias(&alias_for(&cert));
            store.entries.insert(alias, cert);
        }

        tracing::debug!(
            resource = %name,
            format = format.as_str(),
            entries = store.len(),
            "loaded trust material"
        );

        Ok(store)
    }

    /// Insert a certificate entry, replacing any prior entry under the alias
    pub fn insert(&mut self, alias: impl Into<String>, cert: X509) -> Option<X509> {
        self.entries.insert(alias.into(), cert)
    }

    /// Remove an entry by alias
    pub fn remove(&mut self, alias: &str) -> Option<X509> {
        self.entries.remove(alias)
    }

    /// Look up an entry by alias
    pub fn get(&self, alias: &str) -> Option<&X509> {
        self.entries.get(alias)
    }

    /// Check whether an alias is present
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Iterate over aliases
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over certificate entries
    pub fn certificates(&self) -> impl Iterator<Item = &X509> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive an alias not yet present in the store
    fn unique_alias(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn integrity(name: &str, err: openssl::error::ErrorStack) -> TrustError {
    TrustError::Integrity {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

/// Default alias for a loaded certificate: the subject CN, lowercased
fn alias_for(cert: &X509) -> String {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|cn| cn.to_lowercase())
        .unwrap_or_else(|| "anchor".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::cert::testdata::TEST_CERT;

    #[test]
    fn test_format_parsing() {
        assert_eq!(KeystoreFormat::from_str("pem").unwrap(), KeystoreFormat::Pem);
        assert_eq!(
            KeystoreFormat::from_str("PKCS12").unwrap(),
            KeystoreFormat::Pkcs12
        );
        assert_eq!(KeystoreFormat::from_str("p12").unwrap(), KeystoreFormat::Pkcs12);
        assert_eq!(KeystoreFormat::from_str("der").unwrap(), KeystoreFormat::Der);

        let err = KeystoreFormat::from_str("jceks").unwrap_err();
        assert!(matches!(err, TrustError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_pem_from_memory() {
        let resource = TrustResource::from_bytes("test.pem", TEST_CERT);
        let store = Keystore::load(&resource, "", KeystoreFormat::Pem).unwrap();

        assert_eq!(store.len(), 1);
        let alias = store.aliases().next().unwrap();
        assert!(store.get(alias).is_some());
    }

    #[test]
    fn test_load_garbage_is_integrity_error() {
        let resource = TrustResource::from_bytes("garbage.pem", &b"not a certificate"[..]);
        let err = Keystore::load(&resource, "", KeystoreFormat::Pem).unwrap_err();
        assert!(matches!(err, TrustError::Integrity { .. }));

        let resource = TrustResource::from_bytes("garbage.p12", &b"\x00\x01\x02"[..]);
        let err = Keystore::load(&resource, "changeit", KeystoreFormat::Pkcs12).unwrap_err();
        assert!(matches!(err, TrustError::Integrity { .. }));
    }

    #[test]
    fn test_missing_file_is_resource_not_found() {
        let resource = TrustResource::file("/nonexistent/truststore.pem");
        let err = Keystore::load(&resource, "", KeystoreFormat::Pem).unwrap_err();
        assert!(matches!(err, TrustError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_insert_replaces_same_alias() {
        let cert = X509::from_pem(TEST_CERT).unwrap();
        let mut store = Keystore::new();

        assert!(store.insert("anchor", cert.clone()).is_none());
        assert!(store.insert("anchor", cert).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_subjects_get_distinct_aliases() {
        // A bundle with the same certificate twice must keep both entries
        let mut bundle = Vec::new();
        bundle.extend_from_slice(TEST_CERT);
        bundle.extend_from_slice(TEST_CERT);

        let resource = TrustResource::from_bytes("doubled.pem", bundle);
        let store = Keystore::load(&resource, "", KeystoreFormat::Pem).unwrap();

        assert_eq!(store.len(), 2);
    }
}
