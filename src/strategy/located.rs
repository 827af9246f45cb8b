use super::maps::{LabelMaps, data_cells_in_order};
use super::{FactDraft, FactSink, StrategyContext};
use crate::layout::Location;

/// Multi-header and single-pivot layouts. Every dimension is read from the
/// place the layout metadata names for it; header rows not assigned to a
/// dimension only contribute to `column_name`. A unit row below the headers
/// supplies per-column units and is not emitted.
pub(super) fn extract(ctx: &StrategyContext<'_>, sink: &mut FactSink) {
    let maps = LabelMaps::build(ctx.grid);
    let meta = ctx.metadata;
    let unit_row = ctx.unit_row();
    let skip_row = unit_row
        .as_ref()
        .map(|line| line.index)
        .filter(|row| !meta.header_levels.iter().any(|level| level.row == *row));

    for cell in data_cells_in_order(ctx.grid) {
        if Some(cell.row_start) == skip_row || maps.rows.is_label_cell(cell) {
            continue;
        }

        let row_label = maps.rows.get(cell.row_start);
        let metric_label = maps.resolve(meta.metric_location, cell);
        let (metric, metric_unit) = match metric_label {
            Some(label) => {
                let (bare, unit) = ctx.units.split_label_unit(label);
                (Some(bare), unit)
            }
            None => (None, None),
        };
        let (row_unit, column_unit) = if meta.metric_location == Location::RowHeaders {
            (metric_unit, None)
        } else {
            (None, metric_unit)
        };

        let draft = FactDraft::new(cell, meta.confidence)
            .entity(maps.resolve(meta.entity_location, cell).map(str::to_string))
            .metric(metric)
            .period(maps.resolve(meta.period_location, cell).map(str::to_string))
            .row_label(row_label)
            .column_name(maps.columns.column_name(cell.col_start))
            .line_unit(
                unit_row
                    .as_ref()
                    .and_then(|line| line.units.get(&cell.col_start))
                    .map(String::as_str),
            )
            .row_label_unit(row_unit)
            .column_label_unit(column_unit);
        sink.push(ctx, draft);
    }
}
