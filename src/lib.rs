mod context;
mod csv_out;
mod error;
mod header;
mod layout;
mod model;
mod options;
mod orientation;
mod patterns;
mod strategy;
mod unit;
mod value;
mod warning;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::strategy::{FactSink, StrategyContext};
use crate::warning::WarningCode;

pub use context::{ContextHints, ContextualInferenceFallback, Dimensions, MAX_NEARBY_TEXTS};
pub use csv_out::{FACT_COLUMNS, write_facts_csv, write_facts_csv_to_string};
pub use error::ExtractError;
pub use header::{CategoryCounts, HeaderClassifier, HeaderType};
pub use layout::{HeaderLevel, LayoutDetector, LayoutMetadata, LayoutRule, Location, TableLayout};
pub use model::{Cell, CellGrid, Confidence, FactRow, PageContext, Provenance, TableInput};
pub use options::{
    DEFAULT_MAX_SNIPPET_CHARS, LayoutThresholds, OrientationThresholds, PipelineConfig,
    QualityMode, UnitThresholds,
};
pub use orientation::{ColumnProfile, OrientationDecision, OrientationDetector, OrientationType};
pub use patterns::{CategoryPatterns, PatternConfig, Patterns};
pub use unit::{UnitEvidence, UnitInferenceEngine, UnitLine, UnitTier};
pub use value::{extract_fiscal_year, is_numeric, parse_value};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

/// Everything the pipeline decided about one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableExtraction {
    pub layout: TableLayout,
    pub metadata: LayoutMetadata,
    /// Present when the orientation detector ran for an unresolved layout.
    pub orientation: Option<OrientationDecision>,
    pub rows: Vec<FactRow>,
    pub warnings: Vec<ExtractWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub row_count: usize,
    /// Tables that contributed at least one row.
    pub table_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

/// The extraction pipeline. Immutable once built and safe to share between
/// threads; every table is processed independently.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: PipelineConfig,
    classifier: HeaderClassifier,
    layout: LayoutDetector,
    orientation: OrientationDetector,
    units: UnitInferenceEngine,
    context: ContextualInferenceFallback,
}

impl Extractor {
    /// Validates `config` and compiles its patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidOption`] for out-of-range thresholds and
    /// [`ExtractError::Pattern`] for an invalid pattern override.
    pub fn new(config: PipelineConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let patterns = Arc::new(Patterns::compile(&config.patterns)?);
        let classifier = HeaderClassifier::new(Arc::clone(&patterns));

        Ok(Self {
            layout: LayoutDetector::new(classifier.clone(), config.layout.clone()),
            orientation: OrientationDetector::new(Arc::clone(&patterns), config.orientation.clone()),
            units: UnitInferenceEngine::new(Arc::clone(&patterns), config.unit.clone()),
            context: ContextualInferenceFallback::new(patterns),
            classifier,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn classifier(&self) -> &HeaderClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn layout_detector(&self) -> &LayoutDetector {
        &self.layout
    }

    #[must_use]
    pub fn extract_table(&self, input: &TableInput) -> TableExtraction {
        self.extract(
            &input.grid,
            Provenance {
                page_number: input.page_number,
                table_index: input.table_index,
            },
            input.caption.as_deref(),
            input.context.as_ref(),
        )
    }

    /// Runs the whole pipeline on one grid. Never fails: problems surface as
    /// warnings and as lower-confidence rows.
    #[must_use]
    pub fn extract(
        &self,
        grid: &CellGrid,
        provenance: Provenance,
        caption: Option<&str>,
        page_context: Option<&PageContext>,
    ) -> TableExtraction {
        let Provenance {
            page_number,
            table_index,
        } = provenance;
        let notice = |code: WarningCode, message: String| {
            ExtractWarning::new(code, message)
                .with_page(page_number)
                .with_table_index(table_index)
        };

        if grid.is_empty() {
            debug!(page_number, table_index, "skipping empty grid");
            return TableExtraction {
                layout: TableLayout::Unknown,
                metadata: LayoutMetadata::unresolved(Vec::new(), HeaderType::Unknown),
                orientation: None,
                rows: Vec::new(),
                warnings: vec![notice(
                    WarningCode::EmptyGrid,
                    "table grid has no text".to_string(),
                )],
            };
        }

        if !grid.has_header_text() {
            debug!(page_number, table_index, "skipping grid without header cells");
            return TableExtraction {
                layout: TableLayout::Unknown,
                metadata: LayoutMetadata::unresolved(Vec::new(), HeaderType::Unknown),
                orientation: None,
                rows: Vec::new(),
                warnings: vec![notice(
                    WarningCode::NoHeaders,
                    "table grid has no header cells".to_string(),
                )],
            };
        }

        let mut warnings = Vec::new();
        let (mut layout, mut metadata) = self.layout.detect(grid);
        let mut orientation = None;

        if layout == TableLayout::Unknown {
            let decision = self.orientation.detect(grid);
            orientation = Some(decision);
            if let Some((rescued, rescued_metadata)) = self.layout.rescue(grid, &decision) {
                warn!(
                    page_number,
                    table_index,
                    orientation = %decision.orientation,
                    "unresolved layout read as transposed"
                );
                warnings.push(
                    notice(
                        WarningCode::LayoutRescued,
                        format!(
                            "layout unresolved; {} orientation reads it as {rescued}",
                            decision.orientation
                        ),
                    )
                    .with_confidence(decision.confidence),
                );
                layout = rescued;
                metadata = rescued_metadata;
            } else {
                warn!(page_number, table_index, "layout unresolved");
                if self.config.quality_mode == QualityMode::SkipUnresolved {
                    warnings.push(
                        notice(
                            WarningCode::SkippedUnresolved,
                            "skipping table with unresolved layout".to_string(),
                        )
                        .with_confidence(decision.confidence),
                    );
                    return TableExtraction {
                        layout,
                        metadata,
                        orientation,
                        rows: Vec::new(),
                        warnings,
                    };
                }
                warnings.push(
                    notice(
                        WarningCode::UnresolvedLayout,
                        "layout unresolved; rows extracted with low confidence".to_string(),
                    )
                    .with_confidence(decision.confidence),
                );
            }
        }

        let hints = self.context.hints(caption, page_context);
        let ctx = StrategyContext {
            grid,
            layout,
            metadata: &metadata,
            provenance,
            hints: &hints,
            orientation_decision: orientation,
            orientation: &self.orientation,
            units: &self.units,
            classifier: &self.classifier,
            max_snippet_chars: self.config.max_snippet_chars,
        };
        let mut sink = FactSink::default();
        (layout.strategy())(&ctx, &mut sink);

        if sink.context_fills > 0 {
            warnings.push(notice(
                WarningCode::ContextInferred,
                format!(
                    "{} row(s) took dimensions from the caption or page context",
                    sink.context_fills
                ),
            ));
        }
        if sink.line_units > 0 {
            warnings.push(notice(
                WarningCode::UnitInferred,
                format!(
                    "{} row(s) took their unit from a unit row or column",
                    sink.line_units
                ),
            ));
        }

        debug!(page_number, table_index, %layout, rows = sink.rows.len(), "table extracted");
        TableExtraction {
            layout,
            metadata,
            orientation,
            rows: sink.rows,
            warnings,
        }
    }

    /// Extracts every table in input order.
    #[must_use]
    pub fn extract_tables(&self, inputs: &[TableInput]) -> (Vec<FactRow>, ExtractionReport) {
        summarize(inputs.iter().map(|input| self.extract_table(input)))
    }

    /// Parallel [`Self::extract_tables`]; output order matches input order.
    #[cfg(feature = "parallel")]
    #[must_use]
    pub fn extract_tables_par(&self, inputs: &[TableInput]) -> (Vec<FactRow>, ExtractionReport) {
        use rayon::prelude::*;

        let extractions = inputs
            .par_iter()
            .map(|input| self.extract_table(input))
            .collect::<Vec<_>>();
        summarize(extractions)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(PipelineConfig::default()).expect("built-in configuration is valid")
    }
}

fn summarize(extractions: impl IntoIterator<Item = TableExtraction>) -> (Vec<FactRow>, ExtractionReport) {
    let mut rows = Vec::new();
    let mut report = ExtractionReport::default();
    for extraction in extractions {
        if !extraction.rows.is_empty() {
            report.table_count += 1;
        }
        rows.extend(extraction.rows);
        report.warnings.extend(extraction.warnings);
    }
    report.row_count = rows.len();
    (rows, report)
}
