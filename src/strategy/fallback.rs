use super::maps::{LabelMaps, data_cells_in_order};
use super::{FactDraft, FactSink, StrategyContext};
use crate::context::Dimensions;
use crate::header::HeaderType;
use crate::model::Confidence;

/// Assigns each label to the first free dimension of its type.
fn assign(ctx: &StrategyContext<'_>, dimensions: &mut Dimensions, label: &str) -> HeaderType {
    let header_type = ctx.classifier.classify(label);
    let slot = match header_type {
        HeaderType::Temporal => &mut dimensions.period,
        HeaderType::Entity => &mut dimensions.entity,
        HeaderType::Metric => &mut dimensions.metric,
        HeaderType::Unknown => return header_type,
    };
    if slot.is_none() {
        *slot = Some(label.to_string());
    }
    header_type
}

/// Unresolved layouts: column and row labels are classified independently
/// and each fills the dimension its type names. An unclassified row label
/// still stands in for the metric. Rows start low and only reach medium
/// when context fills a gap.
pub(super) fn extract(ctx: &StrategyContext<'_>, sink: &mut FactSink) {
    let maps = LabelMaps::build(ctx.grid);
    let unit_row = ctx.unit_row();
    let skip_row = unit_row.as_ref().map(|line| line.index).filter(|row| {
        !ctx.metadata
            .header_levels
            .iter()
            .any(|level| level.row == *row)
    });

    for cell in data_cells_in_order(ctx.grid) {
        if Some(cell.row_start) == skip_row || maps.rows.is_label_cell(cell) {
            continue;
        }

        let mut dimensions = Dimensions::default();
        let mut column_unit = None;
        for label in maps.columns.stack(cell.col_start) {
            let (bare, unit) = ctx.units.split_label_unit(label);
            assign(ctx, &mut dimensions, &bare);
            column_unit = column_unit.or(unit);
        }

        let row_label = maps.rows.get(cell.row_start);
        let mut row_unit = None;
        if let Some(label) = row_label {
            let (bare, unit) = ctx.units.split_label_unit(label);
            row_unit = unit;
            if assign(ctx, &mut dimensions, &bare) == HeaderType::Unknown && dimensions.metric.is_none() {
                dimensions.metric = Some(bare);
            }
        }

        let draft = FactDraft::new(cell, Confidence::Low)
            .entity(dimensions.entity)
            .metric(dimensions.metric)
            .period(dimensions.period)
            .row_label(row_label)
            .column_name(maps.columns.column_name(cell.col_start))
            .line_unit(
                unit_row
                    .as_ref()
                    .and_then(|line| line.units.get(&cell.col_start))
                    .map(String::as_str),
            )
            .row_label_unit(row_unit)
            .column_label_unit(column_unit)
            .raise_on_context();
        sink.push(ctx, draft);
    }
}
