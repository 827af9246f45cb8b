use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::header::ratio;
use crate::model::{Cell, CellGrid};
use crate::options::UnitThresholds;
use crate::patterns::Patterns;
use crate::value::is_numeric;

/// Columns with a larger share of numeric cells hold values, even when the
/// values carry verbal units such as `1.2 million`.
const VALUE_COLUMN_NUMERIC_SHARE: f64 = 0.5;

static LABEL_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<label>.*?)\s*[(\[](?P<unit>[^()\[\]]+)[)\]]\s*$")
        .expect("hardcoded label unit regex is valid")
});

/// Which tier of [`UnitInferenceEngine::detect_unit_bearing`] accepted a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitTier {
    Statistical,
    MiddleSection,
    ExtendedWords,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitEvidence {
    pub bearing: bool,
    pub confidence: f64,
    pub tier: Option<UnitTier>,
}

impl UnitEvidence {
    fn accepted(tier: UnitTier, confidence: f64) -> Self {
        Self {
            bearing: true,
            confidence,
            tier: Some(tier),
        }
    }

    fn rejected(confidence: f64) -> Self {
        Self {
            bearing: false,
            confidence,
            tier: None,
        }
    }

    #[must_use]
    pub fn as_pair(self) -> (bool, f64) {
        (self.bearing, self.confidence)
    }
}

/// A row or column holding one unit per perpendicular index.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitLine {
    pub index: usize,
    pub units: BTreeMap<usize, String>,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct UnitInferenceEngine {
    patterns: Arc<Patterns>,
    thresholds: UnitThresholds,
}

impl UnitInferenceEngine {
    #[must_use]
    pub fn new(patterns: Arc<Patterns>, thresholds: UnitThresholds) -> Self {
        Self {
            patterns,
            thresholds,
        }
    }

    /// Tiered check with the configured threshold and sample minimum.
    #[must_use]
    pub fn detect_unit_bearing(&self, cells: &[&Cell]) -> UnitEvidence {
        self.detect_unit_bearing_with(cells, self.thresholds.threshold, self.thresholds.min_samples)
    }

    /// Decides whether `cells` form a unit-bearing line.
    ///
    /// Tiers, first success wins:
    /// 1. share of unit tokens reaches `threshold`;
    /// 2. rows in the middle window hold enough samples and mostly unit tokens;
    /// 3. verbal unit words ("million", "FTE") cover the extended ratio.
    #[must_use]
    pub fn detect_unit_bearing_with(
        &self,
        cells: &[&Cell],
        threshold: f64,
        min_samples: usize,
    ) -> UnitEvidence {
        let non_empty = cells.iter().filter(|cell| !cell.is_blank()).collect::<Vec<_>>();
        if non_empty.len() < min_samples {
            return UnitEvidence::rejected(0.0);
        }

        let hits = non_empty
            .iter()
            .filter(|cell| self.patterns.is_unit_token(cell.text()))
            .count();
        let observed = ratio(hits, non_empty.len());
        if observed >= threshold {
            return UnitEvidence::accepted(UnitTier::Statistical, observed);
        }

        let window = self.thresholds.middle_first_row..=self.thresholds.middle_last_row;
        let middle = non_empty
            .iter()
            .filter(|cell| window.contains(&cell.row_start))
            .collect::<Vec<_>>();
        if middle.len() >= self.thresholds.middle_min_samples {
            let middle_hits = middle
                .iter()
                .filter(|cell| self.patterns.is_unit_token(cell.text()))
                .count();
            let middle_ratio = ratio(middle_hits, middle.len());
            if middle_ratio >= self.thresholds.middle_ratio {
                return UnitEvidence::accepted(
                    UnitTier::MiddleSection,
                    0.50 + 0.30 * middle_ratio,
                );
            }
        }

        let verbal_hits = non_empty
            .iter()
            .filter(|cell| self.patterns.extended_unit.is_match(cell.text()))
            .count();
        let verbal_ratio = ratio(verbal_hits, non_empty.len());
        if verbal_ratio >= self.thresholds.extended_ratio {
            return UnitEvidence::accepted(UnitTier::ExtendedWords, 0.30 + 0.30 * verbal_ratio);
        }

        UnitEvidence::rejected(observed)
    }

    /// First of the top rows whose non-empty cells are mostly unit tokens,
    /// mapping each column to its unit.
    #[must_use]
    pub fn find_unit_row(&self, grid: &CellGrid) -> Option<UnitLine> {
        (0..self.thresholds.unit_line_scan.min(grid.num_rows)).find_map(|row| {
            let cells = grid
                .cells
                .iter()
                .filter(|cell| cell.row_start == row && !cell.is_blank())
                .collect::<Vec<_>>();
            if cells.is_empty() {
                return None;
            }
            let hits = cells
                .iter()
                .filter(|cell| self.patterns.is_unit_token(cell.text()))
                .count();
            let share = ratio(hits, cells.len());
            (share > self.thresholds.unit_line_ratio)
                .then(|| self.unit_line(row, &cells, share, |cell| cell.col_span().collect()))
        })
    }

    /// Column counterpart of [`Self::find_unit_row`] for transposed tables.
    /// Each data column after the label column 0 is judged by
    /// [`Self::detect_unit_bearing`], so verbal unit columns count too.
    #[must_use]
    pub fn find_unit_column(&self, grid: &CellGrid) -> Option<UnitLine> {
        (1..self.thresholds.unit_line_scan.min(grid.num_cols)).find_map(|col| {
            let cells = grid.data_column(col);
            let numeric = cells.iter().filter(|cell| is_numeric(cell.text())).count();
            if ratio(numeric, cells.len()) > VALUE_COLUMN_NUMERIC_SHARE {
                return None;
            }
            let evidence = self.detect_unit_bearing(&cells);
            evidence.bearing.then(|| {
                self.unit_line(col, &cells, evidence.confidence, |cell| cell.row_span().collect())
            })
        })
    }

    fn reads_as_unit(&self, text: &str) -> bool {
        self.patterns.is_unit_token(text) || self.patterns.extended_unit.is_match(text)
    }

    fn unit_line(
        &self,
        index: usize,
        cells: &[&Cell],
        confidence: f64,
        covered: impl Fn(&Cell) -> Vec<usize>,
    ) -> UnitLine {
        let units = cells
            .iter()
            .filter(|cell| self.reads_as_unit(cell.text()))
            .flat_map(|cell| {
                let unit = strip_brackets(cell.text()).to_string();
                covered(*cell).into_iter().map(move |position| (position, unit.clone()))
            })
            .collect::<BTreeMap<_, _>>();

        debug!(index, confidence, "unit line detected");
        UnitLine {
            index,
            units,
            confidence,
        }
    }

    /// Splits `"Metric (Unit)"` into the bare label and the unit when the
    /// bracketed part reads as a unit.
    #[must_use]
    pub fn split_label_unit(&self, label: &str) -> (String, Option<String>) {
        let trimmed = label.trim();
        let Some(captures) = LABEL_UNIT_RE.captures(trimmed) else {
            return (trimmed.to_string(), None);
        };
        let (Some(bare), Some(unit)) = (captures.name("label"), captures.name("unit")) else {
            return (trimmed.to_string(), None);
        };

        let unit = unit.as_str().trim();
        let bare = bare.as_str().trim();
        if bare.is_empty() {
            return (trimmed.to_string(), None);
        }
        if self.patterns.is_unit_token(unit) || self.patterns.extended_unit.is_match(unit) {
            (bare.to_string(), Some(unit.to_string()))
        } else {
            (trimmed.to_string(), None)
        }
    }
}

fn strip_brackets(text: &str) -> &str {
    text.trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']'])
        .trim()
}
