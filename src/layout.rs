use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::debug;

use crate::header::{HeaderClassifier, HeaderType};
use crate::model::{Cell, CellGrid, Confidence};
use crate::options::LayoutThresholds;
use crate::orientation::{OrientationDecision, OrientationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableLayout {
    MultiHeaderMetricEntity,
    MultiHeaderGeneric,
    TemporalColsMetricRows,
    EntityColsMetricRows,
    MetricColsEntityRows,
    TransposedEntityColsMetricRowLabels,
    Unknown,
}

impl TableLayout {
    /// Tag written to `FactRow::extraction_method`.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::MultiHeaderMetricEntity => "multi_header_metric_entity",
            Self::MultiHeaderGeneric => "multi_header_generic",
            Self::TemporalColsMetricRows => "temporal_cols_metric_rows",
            Self::EntityColsMetricRows => "entity_cols_metric_rows",
            Self::MetricColsEntityRows => "metric_cols_entity_rows",
            Self::TransposedEntityColsMetricRowLabels => "transposed_entity_cols_metric_row_labels",
            Self::Unknown => "fallback_unknown",
        }
    }
}

impl Display for TableLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Where one dimension's labels live in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Column-header row whose `row_start` is the carried index.
    RowLevel(usize),
    RowHeaders,
    ColumnHeaders,
    FirstColumn,
    /// Row labels in column 1, behind a junk column 0 of row numbers.
    SecondColumn,
    /// Spread over several column-header rows, resolved per level by type.
    MultiHeader,
    Unresolved,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowLevel(row) => write!(f, "row_level_{row}"),
            Self::RowHeaders => f.write_str("row_headers"),
            Self::ColumnHeaders => f.write_str("cols"),
            Self::FirstColumn => f.write_str("first_column"),
            Self::SecondColumn => f.write_str("second_column"),
            Self::MultiHeader => f.write_str("multi_header"),
            Self::Unresolved => f.write_str("unresolved"),
        }
    }
}

/// One column-header row and its majority type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderLevel {
    pub row: usize,
    pub dominant: HeaderType,
}

/// The numbered layout rules. Evaluation follows [`LayoutRule::ORDER`]; the
/// transposed check must precede the relaxed multi-header rule or tables with
/// metric row labels under two header rows are misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRule {
    MultiHeaderMetricEntity,
    Transposed,
    RelaxedMultiHeader,
    SinglePivot,
    OrientationRescue,
}

impl LayoutRule {
    pub const ORDER: [Self; 4] = [
        Self::MultiHeaderMetricEntity,
        Self::Transposed,
        Self::RelaxedMultiHeader,
        Self::SinglePivot,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutMetadata {
    pub entity_location: Location,
    pub metric_location: Location,
    pub period_location: Location,
    pub header_levels: Vec<HeaderLevel>,
    pub row_header_type: HeaderType,
    pub confidence: Confidence,
    pub rule: Option<LayoutRule>,
}

impl LayoutMetadata {
    pub(crate) fn unresolved(header_levels: Vec<HeaderLevel>, row_header_type: HeaderType) -> Self {
        Self {
            entity_location: Location::Unresolved,
            metric_location: Location::Unresolved,
            period_location: Location::Unresolved,
            header_levels,
            row_header_type,
            confidence: Confidence::Low,
            rule: None,
        }
    }
}

/// Column-0 evidence used by the transposed check and the orientation rescue.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FirstColumnSignal {
    rows: usize,
    metric_ratio: f64,
    entity_or_temporal_header: bool,
}

struct Evidence<'g> {
    levels: Vec<HeaderLevel>,
    row_header_texts: Vec<&'g str>,
    row_header_type: HeaderType,
    first_column: FirstColumnSignal,
}

#[derive(Debug, Clone)]
pub struct LayoutDetector {
    classifier: HeaderClassifier,
    thresholds: LayoutThresholds,
}

impl LayoutDetector {
    #[must_use]
    pub fn new(classifier: HeaderClassifier, thresholds: LayoutThresholds) -> Self {
        Self {
            classifier,
            thresholds,
        }
    }

    /// Column headers grouped by `row_start`, top to bottom.
    #[must_use]
    pub fn header_rows<'g>(grid: &'g CellGrid) -> BTreeMap<usize, Vec<&'g Cell>> {
        let mut rows: BTreeMap<usize, Vec<&Cell>> = BTreeMap::new();
        for cell in grid.column_headers() {
            rows.entry(cell.row_start).or_default().push(cell);
        }
        rows
    }

    #[must_use]
    pub fn header_levels(&self, grid: &CellGrid) -> Vec<HeaderLevel> {
        Self::header_rows(grid)
            .into_iter()
            .map(|(row, cells)| HeaderLevel {
                row,
                dominant: self.classifier.dominant(cells.iter().map(|cell| cell.text())),
            })
            .collect()
    }

    fn first_column_signal(&self, grid: &CellGrid) -> FirstColumnSignal {
        let column = grid.data_column(0);
        let entity_or_temporal_header = grid.column_headers().any(|cell| {
            matches!(
                self.classifier.classify(cell.text()),
                HeaderType::Entity | HeaderType::Temporal
            )
        });
        FirstColumnSignal {
            rows: column.len(),
            metric_ratio: self
                .classifier
                .fraction(column.iter().map(|cell| cell.text()), HeaderType::Metric),
            entity_or_temporal_header,
        }
    }

    fn evidence<'g>(&self, grid: &'g CellGrid) -> Evidence<'g> {
        let row_header_texts = grid.row_headers().map(Cell::text).collect::<Vec<_>>();
        Evidence {
            levels: self.header_levels(grid),
            row_header_type: self.classifier.dominant(row_header_texts.iter().copied()),
            row_header_texts,
            first_column: self.first_column_signal(grid),
        }
    }

    /// Selects the layout of `grid`. Never fails; tables that match no rule
    /// come back as [`TableLayout::Unknown`] with unresolved locations.
    #[must_use]
    pub fn detect(&self, grid: &CellGrid) -> (TableLayout, LayoutMetadata) {
        let evidence = self.evidence(grid);
        for rule in LayoutRule::ORDER {
            if let Some(found) = self.apply(rule, &evidence) {
                debug!(layout = %found.0, ?rule, "layout detected");
                return found;
            }
        }

        debug!(levels = evidence.levels.len(), "layout unresolved");
        (
            TableLayout::Unknown,
            LayoutMetadata::unresolved(evidence.levels, evidence.row_header_type),
        )
    }

    fn apply(&self, rule: LayoutRule, evidence: &Evidence<'_>) -> Option<(TableLayout, LayoutMetadata)> {
        let levels = &evidence.levels;
        let metadata = |entity, metric, period, confidence| LayoutMetadata {
            entity_location: entity,
            metric_location: metric,
            period_location: period,
            header_levels: levels.clone(),
            row_header_type: evidence.row_header_type,
            confidence,
            rule: Some(rule),
        };

        match rule {
            LayoutRule::MultiHeaderMetricEntity => {
                let [first, second, ..] = levels.as_slice() else {
                    return None;
                };
                (first.dominant == HeaderType::Metric && second.dominant == HeaderType::Entity)
                    .then(|| {
                        (
                            TableLayout::MultiHeaderMetricEntity,
                            metadata(
                                Location::RowLevel(second.row),
                                Location::RowLevel(first.row),
                                Location::RowHeaders,
                                Confidence::High,
                            ),
                        )
                    })
            }
            LayoutRule::Transposed => {
                let signal = evidence.first_column;
                let matched = signal.rows >= self.thresholds.transposed_min_rows
                    && signal.metric_ratio > self.thresholds.transposed_metric_ratio
                    && signal.entity_or_temporal_header;
                matched.then(|| {
                    let period = if levels.len() >= 2 {
                        Location::MultiHeader
                    } else {
                        Location::ColumnHeaders
                    };
                    (
                        TableLayout::TransposedEntityColsMetricRowLabels,
                        metadata(
                            Location::ColumnHeaders,
                            Location::FirstColumn,
                            period,
                            Confidence::High,
                        ),
                    )
                })
            }
            LayoutRule::RelaxedMultiHeader => {
                if levels.len() < 2 {
                    return None;
                }
                let row_metric = self
                    .classifier
                    .fraction(evidence.row_header_texts.iter().copied(), HeaderType::Metric);
                if row_metric <= self.thresholds.relaxed_row_metric_ratio {
                    return None;
                }
                let (entity, period) = assign_generic_levels(levels);
                Some((
                    TableLayout::MultiHeaderGeneric,
                    metadata(entity, Location::RowHeaders, period, Confidence::Medium),
                ))
            }
            LayoutRule::SinglePivot => {
                let [level] = levels.as_slice() else {
                    return None;
                };
                let (layout, entity, metric, period) = match (level.dominant, evidence.row_header_type) {
                    (HeaderType::Temporal, HeaderType::Metric) => (
                        TableLayout::TemporalColsMetricRows,
                        Location::Unresolved,
                        Location::RowHeaders,
                        Location::ColumnHeaders,
                    ),
                    (HeaderType::Entity, HeaderType::Metric) => (
                        TableLayout::EntityColsMetricRows,
                        Location::ColumnHeaders,
                        Location::RowHeaders,
                        Location::Unresolved,
                    ),
                    (HeaderType::Metric, HeaderType::Entity) => (
                        TableLayout::MetricColsEntityRows,
                        Location::RowHeaders,
                        Location::ColumnHeaders,
                        Location::Unresolved,
                    ),
                    _ => return None,
                };
                Some((layout, metadata(entity, metric, period, Confidence::High)))
            }
            LayoutRule::OrientationRescue => None,
        }
    }

    /// Second chance for an unresolved table, read as transposed with medium
    /// confidence when the orientation detector backs it:
    /// - metric or transposed orientation: metric row labels under
    ///   entity/temporal headers, even below the row minimum of the primary
    ///   rule;
    /// - junk first column: column 0 holds row numbers, column 1 names the
    ///   entities and the headers past it name the metrics.
    #[must_use]
    pub fn rescue(
        &self,
        grid: &CellGrid,
        orientation: &OrientationDecision,
    ) -> Option<(TableLayout, LayoutMetadata)> {
        let evidence = self.evidence(grid);
        let (entity, metric) = match orientation.orientation {
            OrientationType::TransposedMetric | OrientationType::NormalMetric => {
                let signal = evidence.first_column;
                let eligible = signal.rows >= self.thresholds.rescue_min_rows
                    && signal.metric_ratio > self.thresholds.transposed_metric_ratio
                    && signal.entity_or_temporal_header;
                if !eligible {
                    return None;
                }
                (Location::ColumnHeaders, Location::FirstColumn)
            }
            OrientationType::EntityColumnJunk => {
                let has_value_columns = grid.num_cols > 2
                    && grid
                        .column_headers()
                        .any(|cell| cell.col_start >= 2 && !cell.is_blank());
                if grid.data_column(1).len() < self.thresholds.rescue_min_rows || !has_value_columns {
                    return None;
                }
                (Location::SecondColumn, Location::ColumnHeaders)
            }
            OrientationType::Unknown => return None,
        };

        let period = if evidence.levels.len() >= 2 {
            Location::MultiHeader
        } else {
            Location::ColumnHeaders
        };
        Some((
            TableLayout::TransposedEntityColsMetricRowLabels,
            LayoutMetadata {
                entity_location: entity,
                metric_location: metric,
                period_location: period,
                header_levels: evidence.levels,
                row_header_type: evidence.row_header_type,
                confidence: Confidence::Medium,
                rule: Some(LayoutRule::OrientationRescue),
            },
        ))
    }
}

/// Entity and period locations for the relaxed multi-header rule: levels are
/// claimed by their dominant type first, then Unknown levels fill whatever
/// is still free, entity before period.
fn assign_generic_levels(levels: &[HeaderLevel]) -> (Location, Location) {
    let by_type = |wanted: HeaderType| {
        levels
            .iter()
            .find(|level| level.dominant == wanted)
            .map(|level| Location::RowLevel(level.row))
    };
    let mut entity = by_type(HeaderType::Entity);
    let mut period = by_type(HeaderType::Temporal);

    let mut spare = levels
        .iter()
        .filter(|level| level.dominant == HeaderType::Unknown)
        .map(|level| Location::RowLevel(level.row));
    if entity.is_none() {
        entity = spare.next();
    }
    if period.is_none() {
        period = spare.next();
    }

    (
        entity.unwrap_or(Location::Unresolved),
        period.unwrap_or(Location::Unresolved),
    )
}
