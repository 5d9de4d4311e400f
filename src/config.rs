//! Configuration types.

use crate::error::ConfigError;
use crate::pipeline::escalation::CriteriaMode;

/// Triage workflow configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// How the text and dollar escalation criteria combine.
    pub criteria_mode: CriteriaMode,
    /// Max tokens for the extraction call (runs on every notice).
    pub extract_max_tokens: u32,
    /// Temperature for extraction (deterministic-ish).
    pub extract_temperature: f32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            criteria_mode: CriteriaMode::Any,
            extract_max_tokens: 1024,
            extract_temperature: 0.0,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("NOTICE_CRITERIA_MODE") {
            config.criteria_mode = raw.parse()?;
        }

        if let Ok(raw) = std::env::var("NOTICE_EXTRACT_MAX_TOKENS") {
            config.extract_max_tokens =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "NOTICE_EXTRACT_MAX_TOKENS".to_string(),
                    message: format!("not a number: '{raw}'"),
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = TriageConfig::default();
        assert_eq!(config.criteria_mode, CriteriaMode::Any);
        assert_eq!(config.extract_max_tokens, 1024);
        assert_eq!(config.extract_temperature, 0.0);
    }
}
