//! One extraction strategy per [`TableLayout`], selected through
//! [`TableLayout::strategy`].
//!
//! Strategies only decide which labels describe a data cell. Everything
//! after that (value parsing, unit precedence, context fill, confidence,
//! provenance) happens once in [`FactSink::push`] so every layout emits rows
//! the same way.

mod fallback;
mod located;
pub(crate) mod maps;
mod transposed;

use crate::context::{ContextHints, Dimensions};
use crate::header::HeaderClassifier;
use crate::layout::{LayoutMetadata, TableLayout};
use crate::model::{Cell, CellGrid, Confidence, FactRow, Provenance};
use crate::orientation::{OrientationDecision, OrientationDetector};
use crate::unit::{UnitInferenceEngine, UnitLine};
use crate::value::{extract_fiscal_year, parse_value};

pub(crate) type StrategyFn = fn(&StrategyContext<'_>, &mut FactSink);

impl TableLayout {
    pub(crate) fn strategy(self) -> StrategyFn {
        match self {
            Self::MultiHeaderMetricEntity
            | Self::MultiHeaderGeneric
            | Self::TemporalColsMetricRows
            | Self::EntityColsMetricRows
            | Self::MetricColsEntityRows => located::extract,
            Self::TransposedEntityColsMetricRowLabels => transposed::extract,
            Self::Unknown => fallback::extract,
        }
    }
}

/// Everything a strategy may read about one table.
pub(crate) struct StrategyContext<'a> {
    pub grid: &'a CellGrid,
    pub layout: TableLayout,
    pub metadata: &'a LayoutMetadata,
    pub provenance: Provenance,
    pub hints: &'a ContextHints,
    /// Decision already taken by the pipeline, reused instead of re-run.
    pub orientation_decision: Option<OrientationDecision>,
    pub orientation: &'a OrientationDetector,
    pub units: &'a UnitInferenceEngine,
    pub classifier: &'a HeaderClassifier,
    pub max_snippet_chars: usize,
}

impl StrategyContext<'_> {
    pub(crate) fn orientation(&self) -> OrientationDecision {
        self.orientation_decision
            .unwrap_or_else(|| self.orientation.detect(self.grid))
    }

    /// Unit row under the column headers, when one exists in data rows.
    pub(crate) fn unit_row(&self) -> Option<UnitLine> {
        self.units.find_unit_row(self.grid)
    }
}

/// Labels chosen for one data cell, before it becomes a [`FactRow`].
#[derive(Debug, Clone)]
pub(crate) struct FactDraft<'c> {
    cell: &'c Cell,
    dimensions: Dimensions,
    row_label: Option<String>,
    column_name: Option<String>,
    line_unit: Option<String>,
    row_label_unit: Option<String>,
    column_label_unit: Option<String>,
    confidence: Confidence,
    raise_on_context: bool,
}

impl<'c> FactDraft<'c> {
    pub(crate) fn new(cell: &'c Cell, confidence: Confidence) -> Self {
        Self {
            cell,
            dimensions: Dimensions::default(),
            row_label: None,
            column_name: None,
            line_unit: None,
            row_label_unit: None,
            column_label_unit: None,
            confidence,
            raise_on_context: false,
        }
    }

    pub(crate) fn entity(mut self, entity: Option<String>) -> Self {
        self.dimensions.entity = entity.filter(|text| !text.is_empty());
        self
    }

    pub(crate) fn metric(mut self, metric: Option<String>) -> Self {
        self.dimensions.metric = metric.filter(|text| !text.is_empty());
        self
    }

    pub(crate) fn period(mut self, period: Option<String>) -> Self {
        self.dimensions.period = period.filter(|text| !text.is_empty());
        self
    }

    pub(crate) fn row_label(mut self, label: Option<&str>) -> Self {
        self.row_label = label.map(str::to_string);
        self
    }

    pub(crate) fn column_name(mut self, name: Option<String>) -> Self {
        self.column_name = name;
        self
    }

    /// Unit read from a unit row or unit column.
    pub(crate) fn line_unit(mut self, unit: Option<&str>) -> Self {
        self.line_unit = unit.map(str::to_string);
        self
    }

    pub(crate) fn row_label_unit(mut self, unit: Option<String>) -> Self {
        self.row_label_unit = unit;
        self
    }

    pub(crate) fn column_label_unit(mut self, unit: Option<String>) -> Self {
        self.column_label_unit = unit;
        self
    }

    /// Low-confidence rows become medium when context fills a gap. Decided
    /// here, before the row exists.
    pub(crate) fn raise_on_context(mut self) -> Self {
        self.raise_on_context = true;
        self
    }
}

/// Collects rows for one table along with counters the pipeline turns into
/// warnings.
#[derive(Debug, Default)]
pub(crate) struct FactSink {
    pub rows: Vec<FactRow>,
    pub context_fills: usize,
    pub line_units: usize,
}

impl FactSink {
    pub(crate) fn push(&mut self, ctx: &StrategyContext<'_>, draft: FactDraft<'_>) {
        let text = draft.cell.text();
        if text.is_empty() {
            return;
        }

        let (value, trailing_unit) = parse_value(text);
        let unit = match trailing_unit {
            Some(unit) => Some(unit),
            None if draft.line_unit.is_some() => {
                self.line_units += 1;
                draft.line_unit
            }
            None => draft.row_label_unit.or(draft.column_label_unit),
        };

        let mut dimensions = draft.dimensions;
        let mut confidence = draft.confidence;
        if !dimensions.is_complete() && ctx.hints.fill(&mut dimensions) > 0 {
            self.context_fills += 1;
            confidence = if draft.raise_on_context && confidence == Confidence::Low {
                Confidence::Medium
            } else {
                confidence.cap(Confidence::Medium)
            };
        }

        let fiscal_year = dimensions.period.as_deref().and_then(extract_fiscal_year);
        let source_snippet = snippet(
            [draft.row_label.as_deref(), draft.column_name.as_deref(), Some(text)],
            ctx.max_snippet_chars,
        );

        self.rows.push(FactRow {
            entity: dimensions.entity,
            metric: dimensions.metric,
            period: dimensions.period,
            fiscal_year,
            value,
            unit,
            page_number: ctx.provenance.page_number,
            table_index: ctx.provenance.table_index,
            row_index: draft.cell.row_start,
            column_name: draft.column_name,
            extraction_method: ctx.layout.method_name().to_string(),
            confidence,
            source_snippet,
        });
    }
}

fn snippet<'t>(parts: impl IntoIterator<Item = Option<&'t str>>, max_chars: usize) -> String {
    let joined = parts
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.chars().count() <= max_chars {
        joined
    } else {
        joined.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::{FactSink, StrategyContext};
    use crate::context::ContextHints;
    use crate::header::HeaderClassifier;
    use crate::layout::{LayoutDetector, LayoutMetadata, TableLayout};
    use crate::model::{CellGrid, FactRow, Provenance};
    use crate::options::PipelineConfig;
    use crate::orientation::OrientationDetector;
    use crate::patterns::Patterns;
    use crate::unit::UnitInferenceEngine;

    pub(crate) struct Harness {
        pub classifier: HeaderClassifier,
        pub layout: LayoutDetector,
        pub orientation: OrientationDetector,
        pub units: UnitInferenceEngine,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            let config = PipelineConfig::default();
            let patterns =
                Arc::new(Patterns::compile(&config.patterns).expect("default patterns compile"));
            let classifier = HeaderClassifier::new(Arc::clone(&patterns));
            Self {
                layout: LayoutDetector::new(classifier.clone(), config.layout),
                orientation: OrientationDetector::new(Arc::clone(&patterns), config.orientation),
                units: UnitInferenceEngine::new(patterns, config.unit),
                classifier,
            }
        }

        /// Runs the strategy for an explicit layout.
        pub(crate) fn run_as(
            &self,
            grid: &CellGrid,
            layout: TableLayout,
            metadata: &LayoutMetadata,
            hints: &ContextHints,
        ) -> FactSink {
            let ctx = StrategyContext {
                grid,
                layout,
                metadata,
                provenance: Provenance {
                    page_number: 7,
                    table_index: 0,
                },
                hints,
                orientation_decision: None,
                orientation: &self.orientation,
                units: &self.units,
                classifier: &self.classifier,
                max_snippet_chars: 200,
            };
            let mut sink = FactSink::default();
            (layout.strategy())(&ctx, &mut sink);
            sink
        }

        /// Detects the layout and runs its strategy.
        pub(crate) fn run(&self, grid: &CellGrid, hints: &ContextHints) -> (TableLayout, Vec<FactRow>) {
            let (layout, metadata) = self.layout.detect(grid);
            let sink = self.run_as(grid, layout, &metadata, hints);
            (layout, sink.rows)
        }
    }
}
