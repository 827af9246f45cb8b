use std::path::Path;

use table_facts::{Cell, CellGrid, TableInput};

/// Grid with one column-header row on top of plain data rows.
pub fn grid(headers: &[&str], rows: &[&[&str]]) -> CellGrid {
    let mut cells = headers
        .iter()
        .enumerate()
        .map(|(col, text)| Cell::column_header(*text, 0, col))
        .collect::<Vec<_>>();
    for (index, texts) in rows.iter().enumerate() {
        cells.extend(
            texts
                .iter()
                .enumerate()
                .map(|(col, text)| Cell::new(*text, index + 1, col)),
        );
    }
    CellGrid::from_cells(cells)
}

pub fn table(page_number: u32, table_index: usize, grid: CellGrid) -> TableInput {
    TableInput {
        page_number,
        table_index,
        grid,
        ..TableInput::default()
    }
}

/// The two-row transposed energy table used across the pipeline tests.
pub fn energy_table() -> CellGrid {
    grid(
        &["", "Portugal", "Tunisia"],
        &[
            &["Variable Cost", "-23.4", "-29.1"],
            &["Thermal Energy", "-5.9", "-11.1"],
        ],
    )
}

pub fn write_tables_json(path: &Path, tables: &[TableInput]) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string_pretty(tables)?)?;
    Ok(())
}
