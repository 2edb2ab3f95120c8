use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub source: SourceSettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub word_fidelity: f64,
    pub grammar: f64,
    pub header: f64,
    /// Word fidelity needed before grammar/formatting results are worth acting on.
    pub foundation: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            word_fidelity: 90.0,
            grammar: 80.0,
            header: 85.0,
            foundation: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// A provider result is accepted once its trimmed text is longer than this.
    pub min_chars: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { min_chars: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub diff_preview_lines: usize,
    pub word_sample: usize,
    pub header_sample: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            diff_preview_lines: 20,
            word_sample: 15,
            header_sample: 3,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| EvalError::io(format!("reading config {}", path.display()), e))?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self, EvalError> {
        let config: Self = toml::from_str(data).map_err(|e| EvalError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("word_fidelity", t.word_fidelity),
            ("grammar", t.grammar),
            ("header", t.header),
            ("foundation", t.foundation),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EvalError::config(format!(
                    "thresholds.{name} must be within 0..=100, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.source.min_chars, 100);
        assert_eq!(config.report.diff_preview_lines, 20);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::from_toml(
            "[thresholds]\nword_fidelity = 75.0\n\n[report]\nword_sample = 5\n",
        )
        .unwrap();
        assert_eq!(config.thresholds.word_fidelity, 75.0);
        assert_eq!(config.thresholds.grammar, 80.0);
        assert_eq!(config.report.word_sample, 5);
        assert_eq!(config.report.header_sample, 3);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = EngineConfig::from_toml("[thresholds]\ngrammar = 140.0\n").unwrap_err();
        assert!(matches!(err, EvalError::Config { .. }));
        assert!(err.to_string().contains("thresholds.grammar"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = EngineConfig::from_toml("[thresholds\n").unwrap_err();
        assert!(matches!(err, EvalError::Config { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docfidelity.toml");
        std::fs::write(&path, "[source]\nmin_chars = 10\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.source.min_chars, 10);

        let missing = EngineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, EvalError::Io { .. }));
    }
}
