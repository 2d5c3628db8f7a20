//! Hostname verification policy

use super::{Result, TrustError};
use serde::Deserialize;

/// Hostname verification policy applied to peer certificates
///
/// Orthogonal to trust anchor selection, with one exception enforced at
/// context build time: disabled trust cannot be combined with strict
/// hostname checking, because a chain that is never verified cannot have
/// its identity checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostnameVerification {
    /// Reject peers whose certificate subject/SAN does not match the
    /// connection hostname
    Strict,
    /// Accept any peer identity
    Disabled,
}

impl HostnameVerification {
    /// Parse a policy from a configuration string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(HostnameVerification::Strict),
            "disabled" | "none" => Ok(HostnameVerification::Disabled),
            _ => Err(TrustError::Configuration(format!(
                "unknown hostname verification policy: {}",
                s
            ))),
        }
    }

    /// Get the policy as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            HostnameVerification::Strict => "strict",
            HostnameVerification::Disabled => "disabled",
        }
    }

    /// Whether hostname matching is enforced
    pub fn is_strict(&self) -> bool {
        matches!(self, HostnameVerification::Strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            HostnameVerification::from_str("strict").unwrap(),
            HostnameVerification::Strict
        );
        assert_eq!(
            HostnameVerification::from_str("DISABLED").unwrap(),
            HostnameVerification::Disabled
        );
        assert_eq!(
            HostnameVerification::from_str("none").unwrap(),
            HostnameVerification::Disabled
        );
        assert!(HostnameVerification::from_str("lenient").is_err());
    }

    #[test]
    fn test_is_strict() {
        assert!(HostnameVerification::Strict.is_strict());
        assert!(!HostnameVerification::Disabled.is_strict());
    }
}
