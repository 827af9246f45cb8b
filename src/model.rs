use std::fmt::{Display, Formatter};
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One cell of an extracted table, with its span bounds and header flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub text: Option<String>,
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
    #[serde(default)]
    pub is_column_header: bool,
    #[serde(default)]
    pub is_row_header: bool,
}

impl Cell {
    #[must_use]
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: Some(text.into()),
            row_start: row,
            row_end: row + 1,
            col_start: col,
            col_end: col + 1,
            is_column_header: false,
            is_row_header: false,
        }
    }

    #[must_use]
    pub fn column_header(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            is_column_header: true,
            ..Self::new(text, row, col)
        }
    }

    #[must_use]
    pub fn row_header(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            is_row_header: true,
            ..Self::new(text, row, col)
        }
    }

    #[must_use]
    pub fn with_col_span(mut self, span: usize) -> Self {
        self.col_end = self.col_start + span.max(1);
        self
    }

    #[must_use]
    pub fn with_row_span(mut self, span: usize) -> Self {
        self.row_end = self.row_start + span.max(1);
        self
    }

    /// Trimmed cell text; missing text reads as empty.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().map_or("", str::trim)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text().is_empty()
    }

    #[must_use]
    pub fn is_header(&self) -> bool {
        self.is_column_header || self.is_row_header
    }

    /// Column indices covered by this cell. Malformed spans read as 1 wide.
    #[must_use]
    pub fn col_span(&self) -> Range<usize> {
        self.col_start..self.col_end.max(self.col_start + 1)
    }

    /// Row indices covered by this cell. Malformed spans read as 1 tall.
    #[must_use]
    pub fn row_span(&self) -> Range<usize> {
        self.row_start..self.row_end.max(self.row_start + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    pub cells: Vec<Cell>,
    pub num_rows: usize,
    pub num_cols: usize,
}

impl CellGrid {
    /// Builds a grid whose dimensions cover every cell span.
    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let num_rows = cells.iter().map(|cell| cell.row_span().end).max().unwrap_or(0);
        let num_cols = cells.iter().map(|cell| cell.col_span().end).max().unwrap_or(0);
        Self {
            cells,
            num_rows,
            num_cols,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// Whether any column or row header carries text.
    #[must_use]
    pub fn has_header_text(&self) -> bool {
        self.cells.iter().any(|cell| cell.is_header() && !cell.is_blank())
    }

    pub fn column_headers(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.is_column_header)
    }

    pub fn row_headers(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|cell| cell.is_row_header && !cell.is_column_header)
    }

    pub fn data_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| !cell.is_header())
    }

    /// Non-empty data cells whose span starts in `col`, in row order.
    #[must_use]
    pub fn data_column(&self, col: usize) -> Vec<&Cell> {
        let mut column = self
            .data_cells()
            .filter(|cell| cell.col_start == col && !cell.is_blank())
            .collect::<Vec<_>>();
        column.sort_by_key(|cell| cell.row_start);
        column
    }
}

/// Surrounding page text supplied by the section/heading collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    #[serde(default)]
    pub section_heading: Option<String>,
    #[serde(default)]
    pub nearby_text: Vec<String>,
    #[serde(default)]
    pub page_title: Option<String>,
}

/// One table handed to the extractor, already resolved by upstream collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInput {
    pub page_number: u32,
    pub table_index: usize,
    pub grid: CellGrid,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub context: Option<PageContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    pub page_number: u32,
    pub table_index: usize,
}

/// Confidence tier of a fact row. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Lowers the tier to `ceiling` when it sits above it; never raises it.
    #[must_use]
    pub fn cap(self, ceiling: Self) -> Self {
        self.min(ceiling)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized fact reconstructed from one data cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub entity: Option<String>,
    pub metric: Option<String>,
    pub period: Option<String>,
    pub fiscal_year: Option<i32>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub page_number: u32,
    pub table_index: usize,
    pub row_index: usize,
    pub column_name: Option<String>,
    pub extraction_method: String,
    pub confidence: Confidence,
    pub source_snippet: String,
}
