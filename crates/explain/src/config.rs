//! Configuration and error types for trace explanation.
//!
//! Free of I/O so that a trace is a pure function of
//! `(molecule, toolkit, config)`. Loading from files lives in the umbrella
//! crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fingerprint length used when the caller does not pick one.
pub const DEFAULT_FINGERPRINT_SIZE: usize = 2048;

/// Maximum environment radius used when the caller does not pick one.
pub const DEFAULT_RADIUS: u32 = 2;

/// Largest accepted fingerprint length (1 MiB of 0/1 bytes).
pub const MAX_FINGERPRINT_SIZE: usize = 1 << 20;

/// Settings for one explanation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraceConfig {
    /// Configuration schema version.
    ///
    /// Bump when a change can alter rendered traces or fingerprints.
    pub version: u32,
    /// Maximum environment radius (inclusive).
    pub radius: u32,
    /// Distinguish isotopes and stereo markers in tokens and fingerprint bits.
    pub isomeric: bool,
    /// Kekulize a working copy before extracting environments.
    pub kekulize: bool,
    /// Append the `# per-center chains` section.
    pub include_per_center: bool,
    /// Prefix each token with `r<radius>:`.
    pub include_radius_tag: bool,
    /// Mark the environment center in serialized tokens.
    pub mark_root: bool,
    /// Fingerprint length in bits.
    pub fingerprint_size: usize,
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum radius. Typical values: 1-3.
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_isomeric(mut self, isomeric: bool) -> Self {
        self.isomeric = isomeric;
        self
    }

    pub fn with_kekulize(mut self, kekulize: bool) -> Self {
        self.kekulize = kekulize;
        self
    }

    pub fn with_per_center(mut self, include_per_center: bool) -> Self {
        self.include_per_center = include_per_center;
        self
    }

    /// Without the tag, tokens from different radii that serialize alike
    /// collapse into one string and share metrics.
    pub fn with_radius_tag(mut self, include_radius_tag: bool) -> Self {
        self.include_radius_tag = include_radius_tag;
        self
    }

    pub fn with_mark_root(mut self, mark_root: bool) -> Self {
        self.mark_root = mark_root;
        self
    }

    /// Set the fingerprint length in bits. Common values: 512, 1024, 2048.
    pub fn with_fingerprint_size(mut self, fingerprint_size: usize) -> Self {
        self.fingerprint_size = fingerprint_size;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version < 1 {
            return Err(ConfigError::InvalidVersion {
                version: self.version,
            });
        }
        if !(1..=MAX_FINGERPRINT_SIZE).contains(&self.fingerprint_size) {
            return Err(ConfigError::InvalidFingerprintSize {
                size: self.fingerprint_size,
            });
        }
        Ok(())
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            radius: DEFAULT_RADIUS,
            isomeric: true,
            kekulize: false,
            include_per_center: true,
            include_radius_tag: true,
            mark_root: true,
            fingerprint_size: DEFAULT_FINGERPRINT_SIZE,
        }
    }
}

/// Errors raised by [`TraceConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config version {version}; expected >= 1")]
    InvalidVersion { version: u32 },

    #[error(
        "invalid config: fingerprint_size must be >= 1 and <= {} (got {size})",
        MAX_FINGERPRINT_SIZE
    )]
    InvalidFingerprintSize { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = TraceConfig::default();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.radius, 2);
        assert!(cfg.isomeric);
        assert!(!cfg.kekulize);
        assert!(cfg.include_per_center);
        assert!(cfg.include_radius_tag);
        assert!(cfg.mark_root);
        assert_eq!(cfg.fingerprint_size, 2048);
        assert_eq!(TraceConfig::new(), cfg);
    }

    #[test]
    fn config_builder_chain() {
        let cfg = TraceConfig::new()
            .with_radius(3)
            .with_isomeric(false)
            .with_kekulize(true)
            .with_per_center(false)
            .with_radius_tag(false)
            .with_mark_root(false)
            .with_fingerprint_size(512);
        assert_eq!(cfg.radius, 3);
        assert!(!cfg.isomeric);
        assert!(cfg.kekulize);
        assert!(!cfg.include_per_center);
        assert!(!cfg.include_radius_tag);
        assert!(!cfg.mark_root);
        assert_eq!(cfg.fingerprint_size, 512);
    }

    #[test]
    fn validate_rejects_zero_length_fingerprint() {
        let cfg = TraceConfig::new().with_fingerprint_size(0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidFingerprintSize { size: 0 })
        );
    }

    #[test]
    fn validate_caps_fingerprint_length() {
        let at_cap = TraceConfig::new().with_fingerprint_size(MAX_FINGERPRINT_SIZE);
        assert_eq!(at_cap.validate(), Ok(()));
        let huge = TraceConfig::new().with_fingerprint_size(usize::MAX / 2);
        assert_eq!(
            huge.validate(),
            Err(ConfigError::InvalidFingerprintSize {
                size: usize::MAX / 2
            })
        );
    }

    #[test]
    fn validate_rejects_version_zero() {
        let cfg = TraceConfig {
            version: 0,
            ..TraceConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidVersion { version: 0 })
        );
        assert!(TraceConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: TraceConfig = serde_json::from_str(r#"{"radius": 1}"#).unwrap();
        assert_eq!(cfg.radius, 1);
        assert_eq!(cfg.fingerprint_size, DEFAULT_FINGERPRINT_SIZE);
    }
}
