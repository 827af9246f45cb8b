use std::fmt::{Display, Formatter};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    EmptyGrid,
    NoHeaders,
    UnresolvedLayout,
    LayoutRescued,
    ContextInferred,
    UnitInferred,
    SkippedUnresolved,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyGrid => "empty_grid",
            Self::NoHeaders => "no_headers",
            Self::UnresolvedLayout => "unresolved_layout",
            Self::LayoutRescued => "layout_rescued",
            Self::ContextInferred => "context_inferred",
            Self::UnitInferred => "unit_inferred",
            Self::SkippedUnresolved => "skipped_unresolved",
        }
    }
}

impl Display for WarningCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal issue met while extracting one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub table_index: Option<usize>,
    pub confidence: Option<f64>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table_index: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_table_index(mut self, table_index: usize) -> Self {
        self.table_index = Some(table_index);
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
