use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::patterns::PatternConfig;

pub const DEFAULT_MAX_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    /// Extract every table; unresolved layouts go through the fallback strategy.
    #[default]
    BestEffort,
    /// Drop tables whose layout stays unresolved, with a warning.
    SkipUnresolved,
}

impl FromStr for QualityMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "skip_unresolved" => Ok(Self::SkipUnresolved),
            other => Err(format!(
                "unknown quality mode '{other}', expected best-effort or skip-unresolved"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutThresholds {
    /// Minimum non-empty data cells in column 0 before a table may be read as transposed.
    pub transposed_min_rows: usize,
    /// Column-0 metric fraction that must be strictly exceeded.
    pub transposed_metric_ratio: f64,
    /// Row-header metric fraction that must be strictly exceeded for the relaxed multi-header rule.
    pub relaxed_row_metric_ratio: f64,
    /// Column-0 rows required before orientation may rescue an unresolved table.
    pub rescue_min_rows: usize,
}

impl Default for LayoutThresholds {
    fn default() -> Self {
        Self {
            transposed_min_rows: 3,
            transposed_metric_ratio: 0.5,
            relaxed_row_metric_ratio: 0.5,
            rescue_min_rows: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationThresholds {
    pub unit_metric_ratio: f64,
    pub unit_column_ratio: f64,
    pub unit_confidence_cap: f64,
    pub junk_numeric_ratio: f64,
    pub junk_entity_ratio: f64,
    pub tall_aspect_ratio: f64,
    pub junk_confidence: f64,
    pub normal_metric_ratio: f64,
    pub normal_numeric_ratio: f64,
    pub normal_confidence: f64,
    pub header_metric_ratio: f64,
    pub header_confidence: f64,
    pub wide_aspect_ratio: f64,
    pub wide_confidence: f64,
    pub unknown_confidence: f64,
}

impl Default for OrientationThresholds {
    fn default() -> Self {
        Self {
            unit_metric_ratio: 0.4,
            unit_column_ratio: 0.5,
            unit_confidence_cap: 0.95,
            junk_numeric_ratio: 0.7,
            junk_entity_ratio: 0.5,
            tall_aspect_ratio: 1.5,
            junk_confidence: 0.90,
            normal_metric_ratio: 0.3,
            normal_numeric_ratio: 0.5,
            normal_confidence: 0.85,
            header_metric_ratio: 0.5,
            header_confidence: 0.85,
            wide_aspect_ratio: 0.7,
            wide_confidence: 0.70,
            unknown_confidence: 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitThresholds {
    pub threshold: f64,
    pub min_samples: usize,
    pub middle_first_row: usize,
    pub middle_last_row: usize,
    pub middle_min_samples: usize,
    pub middle_ratio: f64,
    pub extended_ratio: f64,
    /// Share of a header-area row's cells that must be unit tokens, strictly
    /// exceeded. Unit columns go through the tiered check instead.
    pub unit_line_ratio: f64,
    /// Rows (or columns) scanned from the top (or left) for a unit line.
    pub unit_line_scan: usize,
}

impl Default for UnitThresholds {
    fn default() -> Self {
        Self {
            threshold: 0.60,
            min_samples: 3,
            middle_first_row: 3,
            middle_last_row: 10,
            middle_min_samples: 3,
            middle_ratio: 0.70,
            extended_ratio: 0.50,
            unit_line_ratio: 0.60,
            unit_line_scan: 3,
        }
    }
}

/// Calibratable configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub patterns: PatternConfig,
    pub layout: LayoutThresholds,
    pub orientation: OrientationThresholds,
    pub unit: UnitThresholds,
    pub max_snippet_chars: usize,
    pub quality_mode: QualityMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            patterns: PatternConfig::default(),
            layout: LayoutThresholds::default(),
            orientation: OrientationThresholds::default(),
            unit: UnitThresholds::default(),
            max_snippet_chars: DEFAULT_MAX_SNIPPET_CHARS,
            quality_mode: QualityMode::default(),
        }
    }
}

fn check_ratio(name: &str, value: f64) -> Result<(), ExtractError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ExtractError::InvalidOption(format!(
            "{name} must be within 0..=1, got {value}"
        )))
    }
}

impl PipelineConfig {
    /// Parses a calibration file body; missing sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or on values rejected by [`Self::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a calibration file from disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidOption`] for ratios outside `0..=1`,
    /// zero sample minimums, or an inverted middle-row window.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let layout = &self.layout;
        check_ratio("layout.transposed_metric_ratio", layout.transposed_metric_ratio)?;
        check_ratio("layout.relaxed_row_metric_ratio", layout.relaxed_row_metric_ratio)?;
        if layout.transposed_min_rows == 0 || layout.rescue_min_rows == 0 {
            return Err(ExtractError::InvalidOption(
                "layout row minimums must be at least 1".to_string(),
            ));
        }

        let orientation = &self.orientation;
        for (name, value) in [
            ("orientation.unit_metric_ratio", orientation.unit_metric_ratio),
            ("orientation.unit_column_ratio", orientation.unit_column_ratio),
            ("orientation.unit_confidence_cap", orientation.unit_confidence_cap),
            ("orientation.junk_numeric_ratio", orientation.junk_numeric_ratio),
            ("orientation.junk_entity_ratio", orientation.junk_entity_ratio),
            ("orientation.junk_confidence", orientation.junk_confidence),
            ("orientation.normal_metric_ratio", orientation.normal_metric_ratio),
            ("orientation.normal_numeric_ratio", orientation.normal_numeric_ratio),
            ("orientation.normal_confidence", orientation.normal_confidence),
            ("orientation.header_metric_ratio", orientation.header_metric_ratio),
            ("orientation.header_confidence", orientation.header_confidence),
            ("orientation.wide_confidence", orientation.wide_confidence),
            ("orientation.unknown_confidence", orientation.unknown_confidence),
        ] {
            check_ratio(name, value)?;
        }
        if orientation.tall_aspect_ratio <= 0.0 || orientation.wide_aspect_ratio <= 0.0 {
            return Err(ExtractError::InvalidOption(
                "orientation aspect ratios must be positive".to_string(),
            ));
        }

        let unit = &self.unit;
        for (name, value) in [
            ("unit.threshold", unit.threshold),
            ("unit.middle_ratio", unit.middle_ratio),
            ("unit.extended_ratio", unit.extended_ratio),
            ("unit.unit_line_ratio", unit.unit_line_ratio),
        ] {
            check_ratio(name, value)?;
        }
        if unit.min_samples == 0 || unit.middle_min_samples == 0 {
            return Err(ExtractError::InvalidOption(
                "unit sample minimums must be at least 1".to_string(),
            ));
        }
        if unit.middle_last_row < unit.middle_first_row {
            return Err(ExtractError::InvalidOption(
                "unit.middle_last_row is smaller than unit.middle_first_row".to_string(),
            ));
        }

        Ok(())
    }
}
