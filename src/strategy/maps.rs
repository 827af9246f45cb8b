//! Index-to-label maps. Spanned header cells label every index they cover.

use std::collections::BTreeMap;

use crate::layout::Location;
use crate::model::{Cell, CellGrid};
use crate::value::is_numeric;

/// Row labels of a table, either flagged row headers or, when the table
/// flags none, the non-numeric text in column 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RowLabels {
    labels: BTreeMap<usize, String>,
    implicit: bool,
}

impl RowLabels {
    pub(crate) fn build(grid: &CellGrid) -> Self {
        let mut flagged = grid.row_headers().filter(|cell| !cell.is_blank()).collect::<Vec<_>>();
        if !flagged.is_empty() {
            flagged.sort_by_key(|cell| (cell.row_start, cell.col_start));
            return Self {
                labels: row_filled(flagged),
                implicit: false,
            };
        }

        let implicit = grid
            .data_column(0)
            .into_iter()
            .filter(|cell| is_implicit_label(cell))
            .collect::<Vec<_>>();
        Self {
            labels: row_filled(implicit),
            implicit: true,
        }
    }

    /// Labels read from one column's data cells, as transposed tables carry them.
    pub(crate) fn from_column(grid: &CellGrid, col: usize) -> Self {
        let mut cells = grid
            .cells
            .iter()
            .filter(|cell| !cell.is_column_header && cell.col_start == col && !cell.is_blank())
            .collect::<Vec<_>>();
        cells.sort_by_key(|cell| cell.row_start);
        Self {
            labels: row_filled(cells),
            implicit: true,
        }
    }

    pub(crate) fn get(&self, row: usize) -> Option<&str> {
        self.labels.get(&row).map(String::as_str)
    }

    /// Whether `cell` is one of the implicit labels rather than a fact.
    pub(crate) fn is_label_cell(&self, cell: &Cell) -> bool {
        self.implicit && cell.col_start == 0 && is_implicit_label(cell)
    }
}

fn is_implicit_label(cell: &Cell) -> bool {
    !cell.is_header() && !cell.is_blank() && !is_numeric(cell.text())
}

/// Row index to label; several labels on one row join left to right.
fn row_filled(cells: Vec<&Cell>) -> BTreeMap<usize, String> {
    let mut labels: BTreeMap<usize, String> = BTreeMap::new();
    for cell in cells {
        for row in cell.row_span() {
            labels
                .entry(row)
                .and_modify(|label| {
                    label.push_str(" / ");
                    label.push_str(cell.text());
                })
                .or_insert_with(|| cell.text().to_string());
        }
    }
    labels
}

/// Column header labels per header row, span-filled across columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ColumnLabels {
    levels: BTreeMap<usize, BTreeMap<usize, String>>,
}

impl ColumnLabels {
    pub(crate) fn build(grid: &CellGrid) -> Self {
        let mut levels: BTreeMap<usize, BTreeMap<usize, String>> = BTreeMap::new();
        for cell in grid.column_headers().filter(|cell| !cell.is_blank()) {
            let level = levels.entry(cell.row_start).or_default();
            for col in cell.col_span() {
                level.entry(col).or_insert_with(|| cell.text().to_string());
            }
        }
        Self { levels }
    }

    pub(crate) fn at_level(&self, row: usize, col: usize) -> Option<&str> {
        self.levels.get(&row)?.get(&col).map(String::as_str)
    }

    /// Lowest header row's label for `col`, the one closest to the data.
    pub(crate) fn nearest(&self, col: usize) -> Option<&str> {
        self.levels
            .values()
            .rev()
            .find_map(|level| level.get(&col))
            .map(String::as_str)
    }

    /// Every level's label for `col`, top to bottom.
    pub(crate) fn stack(&self, col: usize) -> Vec<&str> {
        self.levels
            .values()
            .filter_map(|level| level.get(&col).map(String::as_str))
            .collect()
    }

    /// `" / "`-joined stack for `FactRow::column_name`.
    pub(crate) fn column_name(&self, col: usize) -> Option<String> {
        let stack = self.stack(col);
        (!stack.is_empty()).then(|| stack.join(" / "))
    }
}

/// Both label maps of a table plus location lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LabelMaps {
    pub columns: ColumnLabels,
    pub rows: RowLabels,
}

impl LabelMaps {
    pub(crate) fn build(grid: &CellGrid) -> Self {
        Self {
            columns: ColumnLabels::build(grid),
            rows: RowLabels::build(grid),
        }
    }

    /// Label found at `location` for a data cell. [`Location::MultiHeader`],
    /// [`Location::SecondColumn`] and unresolved locations are left to the
    /// strategies that read them and yield `None`.
    pub(crate) fn resolve(&self, location: Location, cell: &Cell) -> Option<&str> {
        match location {
            Location::RowLevel(row) => self.columns.at_level(row, cell.col_start),
            Location::ColumnHeaders => self.columns.nearest(cell.col_start),
            Location::RowHeaders | Location::FirstColumn => self.rows.get(cell.row_start),
            Location::SecondColumn | Location::MultiHeader | Location::Unresolved => None,
        }
    }
}

/// Non-empty data cells in reading order.
pub(crate) fn data_cells_in_order(grid: &CellGrid) -> Vec<&Cell> {
    let mut cells = grid
        .data_cells()
        .filter(|cell| !cell.is_blank())
        .collect::<Vec<_>>();
    cells.sort_by_key(|cell| (cell.row_start, cell.col_start));
    cells
}

#[cfg(test)]
mod tests {
    use super::{ColumnLabels, LabelMaps, RowLabels, data_cells_in_order};
    use crate::layout::Location;
    use crate::model::{Cell, CellGrid};

    #[test]
    fn spanned_header_labels_every_covered_column() {
        let grid = CellGrid::from_cells(vec![
            Cell::column_header("Revenue", 0, 1).with_col_span(3),
            Cell::column_header("Spain", 1, 1),
            Cell::column_header("Portugal", 1, 2),
            Cell::column_header("Tunisia", 1, 3),
        ]);
        let columns = ColumnLabels::build(&grid);

        for col in 1..4 {
            assert_eq!(columns.at_level(0, col), Some("Revenue"));
        }
        assert_eq!(columns.at_level(0, 4), None);
        assert_eq!(columns.nearest(2), Some("Portugal"));
        assert_eq!(columns.column_name(3).as_deref(), Some("Revenue / Tunisia"));
        assert_eq!(columns.column_name(0), None);
    }

    #[test]
    fn row_spanned_labels_fill_rows_and_join_per_row() {
        let grid = CellGrid::from_cells(vec![
            Cell::row_header("Portugal", 1, 0).with_row_span(2),
            Cell::row_header("Revenue", 1, 1),
            Cell::row_header("EBITDA", 2, 1),
        ]);
        let rows = RowLabels::build(&grid);
        assert_eq!(rows.get(1), Some("Portugal / Revenue"));
        assert_eq!(rows.get(2), Some("Portugal / EBITDA"));
        assert_eq!(rows.get(3), None);
    }

    #[test]
    fn implicit_labels_come_from_non_numeric_first_column() {
        let grid = CellGrid::from_cells(vec![
            Cell::column_header("2024", 0, 1),
            Cell::new("Revenue", 1, 0),
            Cell::new("10", 1, 1),
            Cell::new("7", 2, 0),
            Cell::new("11", 2, 1),
        ]);
        let maps = LabelMaps::build(&grid);

        assert_eq!(maps.rows.get(1), Some("Revenue"));
        assert_eq!(maps.rows.get(2), None);
        let labels = data_cells_in_order(&grid)
            .into_iter()
            .filter(|cell| maps.rows.is_label_cell(cell))
            .map(Cell::text)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["Revenue"]);
    }

    #[test]
    fn resolve_follows_locations() {
        let grid = CellGrid::from_cells(vec![
            Cell::column_header("Spain", 0, 1),
            Cell::column_header("2024", 1, 1),
            Cell::row_header("Revenue", 2, 0),
            Cell::new("10", 2, 1),
        ]);
        let maps = LabelMaps::build(&grid);
        let cell = Cell::new("10", 2, 1);

        assert_eq!(maps.resolve(Location::RowLevel(0), &cell), Some("Spain"));
        assert_eq!(maps.resolve(Location::ColumnHeaders, &cell), Some("2024"));
        assert_eq!(maps.resolve(Location::RowHeaders, &cell), Some("Revenue"));
        assert_eq!(maps.resolve(Location::Unresolved, &cell), None);
    }
}
