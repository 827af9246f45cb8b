//! Secondary classifier for tables whose header flags do not settle where the
//! row labels, units and values live.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::header::{HeaderClassifier, HeaderType, ratio};
use crate::model::CellGrid;
use crate::options::OrientationThresholds;
use crate::patterns::Patterns;
use crate::value::is_numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationType {
    /// Metric labels in column 0, units or values to the right, entities across the top.
    TransposedMetric,
    /// Numeric junk (row numbers, codes) in column 0 and entity labels in column 1.
    EntityColumnJunk,
    /// Metric labels in column 0 directly followed by values.
    NormalMetric,
    Unknown,
}

impl Display for OrientationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TransposedMetric => "transposed_metric",
            Self::EntityColumnJunk => "entity_column_junk",
            Self::NormalMetric => "normal_metric",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Content ratios over the non-empty data cells of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub samples: usize,
    pub metric_ratio: f64,
    pub entity_ratio: f64,
    pub unit_ratio: f64,
    pub numeric_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientationDecision {
    pub orientation: OrientationType,
    pub confidence: f64,
    pub col0: ColumnProfile,
    pub col1: ColumnProfile,
    pub aspect_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct OrientationDetector {
    patterns: Arc<Patterns>,
    classifier: HeaderClassifier,
    thresholds: OrientationThresholds,
}

impl OrientationDetector {
    #[must_use]
    pub fn new(patterns: Arc<Patterns>, thresholds: OrientationThresholds) -> Self {
        Self {
            classifier: HeaderClassifier::new(Arc::clone(&patterns)),
            patterns,
            thresholds,
        }
    }

    #[must_use]
    pub fn profile(&self, grid: &CellGrid, col: usize) -> ColumnProfile {
        let cells = grid.data_column(col);
        let count = |matches: &dyn Fn(&str) -> bool| {
            ratio(cells.iter().filter(|cell| matches(cell.text())).count(), cells.len())
        };

        ColumnProfile {
            samples: cells.len(),
            metric_ratio: count(&|text: &str| self.patterns.metric.is_match(text)),
            entity_ratio: count(&|text: &str| self.patterns.entity.is_match(text)),
            unit_ratio: count(&|text: &str| self.patterns.is_unit_token(text)),
            numeric_ratio: count(&is_numeric),
        }
    }

    /// Decision tree, first matching rule wins:
    /// 1. metric labels beside a unit column → `TransposedMetric`;
    /// 2. numeric column 0, entity column 1, tall table → `EntityColumnJunk`;
    /// 3. metric labels beside numbers → `NormalMetric`;
    /// 4. mostly metric labels under entity/temporal headers → `TransposedMetric`;
    /// 5. wide table with entity headers → `TransposedMetric`;
    /// 6. `Unknown`.
    #[must_use]
    pub fn detect(&self, grid: &CellGrid) -> OrientationDecision {
        let t = &self.thresholds;
        let col0 = self.profile(grid, 0);
        let col1 = self.profile(grid, 1);
        let aspect_ratio = if grid.num_cols == 0 {
            0.0
        } else {
            ratio(grid.num_rows, grid.num_cols)
        };

        let header_types = grid
            .column_headers()
            .map(|cell| self.classifier.classify(cell.text()))
            .collect::<Vec<_>>();
        let entity_header = header_types.contains(&HeaderType::Entity);
        let temporal_header = header_types.contains(&HeaderType::Temporal);

        let (orientation, confidence) = if col0.metric_ratio > t.unit_metric_ratio
            && col1.unit_ratio > t.unit_column_ratio
        {
            (
                OrientationType::TransposedMetric,
                (col0.metric_ratio + col1.unit_ratio).min(t.unit_confidence_cap),
            )
        } else if col0.numeric_ratio > t.junk_numeric_ratio
            && col1.entity_ratio > t.junk_entity_ratio
            && aspect_ratio > t.tall_aspect_ratio
        {
            (OrientationType::EntityColumnJunk, t.junk_confidence)
        } else if col0.metric_ratio > t.normal_metric_ratio
            && col1.numeric_ratio > t.normal_numeric_ratio
        {
            (OrientationType::NormalMetric, t.normal_confidence)
        } else if col0.metric_ratio > t.header_metric_ratio && (entity_header || temporal_header) {
            (OrientationType::TransposedMetric, t.header_confidence)
        } else if aspect_ratio < t.wide_aspect_ratio && entity_header {
            (OrientationType::TransposedMetric, t.wide_confidence)
        } else {
            (OrientationType::Unknown, t.unknown_confidence)
        };

        debug!(%orientation, confidence, aspect_ratio, "orientation detected");
        OrientationDecision {
            orientation,
            confidence,
            col0,
            col1,
            aspect_ratio,
        }
    }
}
