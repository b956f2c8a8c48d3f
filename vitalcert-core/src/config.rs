//! Certification configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::privacy::PrivacyConfig;
use crate::quality::QualityConfig;
use crate::{Result, VitalCertError};

/// Combined configuration for a certification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationConfig {
    /// Distribution comparison settings
    pub quality: QualityConfig,
    /// Privacy risk assessment settings
    pub privacy: PrivacyConfig,
    /// Minimum aggregate quality score for certification
    pub min_quality_score: f64,
}

impl Default for CertificationConfig {
    fn default() -> Self {
        Self {
            quality: QualityConfig::default(),
            privacy: PrivacyConfig::default(),
            min_quality_score: 0.8,
        }
    }
}

impl CertificationConfig {
    /// Creates a new certification config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the quality settings.
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Builder method to set the privacy settings.
    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    /// Builder method to set the minimum quality score.
    ///
    /// Values are clamped to `[0.0, 1.0]`.
    pub fn with_min_quality_score(mut self, score: f64) -> Self {
        if !(0.0..=1.0).contains(&score) {
            tracing::warn!("min_quality_score {} clamped to [0.0, 1.0]", score);
        }
        self.min_quality_score = score.clamp(0.0, 1.0);
        self
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    /// Returns a serialization error for malformed JSON and a configuration
    /// error for invalid settings.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VitalCertError::serialization("parsing certification config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VitalCertError::Io {
            context: format!("reading config file {}", path.display()),
            source: e,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::debug!("Loaded certification config from {}", path.display());
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    /// Returns a configuration error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.quality.validate()?;
        self.privacy.validate()?;
        if !(0.0..=1.0).contains(&self.min_quality_score) {
            return Err(VitalCertError::configuration(format!(
                "min_quality_score must be within [0.0, 1.0], got {}",
                self.min_quality_score
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::DistanceMetric;

    #[test]
    fn test_default_config_is_valid() {
        let config = CertificationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_quality_score, 0.8);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CertificationConfig::from_json_str(
            r#"{
                "quality": {"bin_count": 30, "distance_metric": "wasserstein"},
                "privacy": {"quasi_identifiers": ["arm", "visit", "age_group"], "k_threshold": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(config.quality.bin_count, 30);
        assert_eq!(config.quality.distance_metric, DistanceMetric::Wasserstein);
        assert_eq!(config.privacy.k_threshold, 3);
        assert_eq!(config.privacy.l_threshold, 2);
        assert_eq!(config.min_quality_score, 0.8);
    }

    #[test]
    fn test_from_json_rejects_invalid_settings() {
        let result = CertificationConfig::from_json_str(r#"{"quality": {"weights": {"speed": 1.0}}}"#);
        assert!(matches!(result, Err(VitalCertError::Configuration { .. })));

        let result = CertificationConfig::from_json_str(r#"{"min_quality_score": 1.5}"#);
        assert!(matches!(result, Err(VitalCertError::Configuration { .. })));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = CertificationConfig::from_json_str("{quality:");
        assert!(matches!(result, Err(VitalCertError::Serialization { .. })));
    }

    #[test]
    fn test_builder_clamps_min_quality() {
        let config = CertificationConfig::new().with_min_quality_score(-0.5);
        assert_eq!(config.min_quality_score, 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = CertificationConfig::load(Path::new("/nonexistent/vitalcert.json"));
        assert!(matches!(result, Err(VitalCertError::Io { .. })));
    }
}
