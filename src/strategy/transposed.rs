use super::maps::{ColumnLabels, RowLabels, data_cells_in_order};
use super::{FactDraft, FactSink, StrategyContext};
use crate::header::HeaderType;
use crate::layout::Location;
use crate::orientation::OrientationType;

/// Header labels of one column split into the period and the other dimension.
fn split_header_stack<'l>(ctx: &StrategyContext<'_>, stack: &[&'l str]) -> (Option<&'l str>, Option<&'l str>) {
    let mut period = None;
    let mut other = None;
    for label in stack {
        if ctx.classifier.classify(label) == HeaderType::Temporal {
            period = period.or(Some(*label));
        } else {
            other = other.or(Some(*label));
        }
    }
    (period, other)
}

/// Metric labels down the first column, entities (and periods) across the
/// top. With a junk first column the row labels sit in column 1 and name
/// entities instead, leaving the headers to name metrics.
pub(super) fn extract(ctx: &StrategyContext<'_>, sink: &mut FactSink) {
    let junk = ctx.metadata.entity_location == Location::SecondColumn
        || ctx.orientation().orientation == OrientationType::EntityColumnJunk;
    let label_col = usize::from(junk);

    let labels = RowLabels::from_column(ctx.grid, label_col);
    let columns = ColumnLabels::build(ctx.grid);
    let unit_column = ctx
        .units
        .find_unit_column(ctx.grid)
        .filter(|line| line.index > label_col);
    let unit_row = if unit_column.is_none() {
        ctx.unit_row()
    } else {
        None
    };
    let header_rows = ctx.metadata.header_levels.iter().map(|level| level.row).collect::<Vec<_>>();
    let skip_row = unit_row
        .as_ref()
        .map(|line| line.index)
        .filter(|row| !header_rows.contains(row));
    let skip_col = unit_column.as_ref().map(|line| line.index);

    for cell in data_cells_in_order(ctx.grid) {
        if cell.col_start <= label_col
            || Some(cell.col_start) == skip_col
            || Some(cell.row_start) == skip_row
        {
            continue;
        }

        let row_label = labels.get(cell.row_start);
        let stack = columns.stack(cell.col_start);
        let (period, header_label) = split_header_stack(ctx, &stack);

        let (entity, metric_label) = if junk {
            (row_label, header_label)
        } else {
            (header_label, row_label)
        };
        let (metric, metric_unit) = match metric_label {
            Some(label) => {
                let (bare, unit) = ctx.units.split_label_unit(label);
                (Some(bare), unit)
            }
            None => (None, None),
        };
        let (row_unit, column_unit) = if junk {
            (None, metric_unit)
        } else {
            (metric_unit, None)
        };

        let line_unit = unit_column
            .as_ref()
            .and_then(|line| line.units.get(&cell.row_start))
            .or_else(|| unit_row.as_ref().and_then(|line| line.units.get(&cell.col_start)))
            .map(String::as_str);

        let draft = FactDraft::new(cell, ctx.metadata.confidence)
            .entity(entity.map(str::to_string))
            .metric(metric)
            .period(period.map(str::to_string))
            .row_label(row_label)
            .column_name(columns.column_name(cell.col_start))
            .line_unit(line_unit)
            .row_label_unit(row_unit)
            .column_label_unit(column_unit);
        sink.push(ctx, draft);
    }
}
