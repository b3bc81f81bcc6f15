//! Configuration for the orchestrator and its collaborators.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CertflowError;

/// Configuration for certflow.
///
/// Every field has a default, so a JSON override file only needs the keys
/// it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertflowConfig {
    /// Network name handed to the verification engine.
    pub network: String,
    /// Email dispatch endpoint.
    pub email_api_url: String,
    /// Share-link storage endpoint.
    pub share_link_api_url: String,
    /// Lifetime requested for share links (milliseconds on the wire).
    #[serde(with = "millis")]
    pub share_link_ttl: Duration,
    /// Captcha site key shown to the user before sending.
    pub captcha_site_key: String,
    /// Remote verification engine endpoint.
    pub verifier_api_url: String,
    /// Transport request timeout (seconds in config files).
    #[serde(with = "secs")]
    pub timeout: Duration,
    /// Report issuer-identity failures with their own analytics code
    /// instead of the unissued-certificate code.
    pub distinct_identity_code: bool,
}

impl Default for CertflowConfig {
    fn default() -> Self {
        Self {
            network: "homestead".into(),
            email_api_url: "https://api.certflow.io/email".into(),
            share_link_api_url: "https://api.certflow.io/storage".into(),
            share_link_ttl: Duration::from_secs(14 * 24 * 60 * 60), // 14 days
            captcha_site_key: String::new(),
            verifier_api_url: "https://api.certflow.io/verify".into(),
            timeout: Duration::from_secs(30),
            distinct_identity_code: false,
        }
    }
}

impl CertflowConfig {
    /// Load a configuration file, falling back to defaults for missing keys.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CertflowError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| CertflowError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| CertflowError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that required endpoints are present and the share TTL is set.
    pub fn validate(&self) -> Result<(), CertflowError> {
        let required = [
            ("network", &self.network),
            ("email_api_url", &self.email_api_url),
            ("share_link_api_url", &self.share_link_api_url),
            ("verifier_api_url", &self.verifier_api_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CertflowError::Config {
                    message: format!("{} must not be empty", name),
                });
            }
        }
        if self.share_link_ttl.is_zero() {
            return Err(CertflowError::Config {
                message: "share_link_ttl must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::saturating_millis(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
