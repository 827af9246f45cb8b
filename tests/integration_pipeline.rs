mod common;

use std::process::Command;

use pretty_assertions::assert_eq;
use table_facts::{
    Cell, CellGrid, Confidence, ExtractWarningCode, Extractor, FactRow, PipelineConfig,
    Provenance, TableInput, TableLayout, write_facts_csv_to_string,
};
use tempfile::tempdir;

fn summary(rows: &[FactRow]) -> Vec<(Option<&str>, Option<&str>, Option<f64>)> {
    rows.iter()
        .map(|row| (row.entity.as_deref(), row.metric.as_deref(), row.value))
        .collect()
}

#[test]
fn transposed_energy_table_yields_one_row_per_value() {
    let extraction = Extractor::default().extract_table(&common::table(12, 0, common::energy_table()));

    assert_eq!(extraction.layout, TableLayout::TransposedEntityColsMetricRowLabels);
    assert_eq!(
        summary(&extraction.rows),
        vec![
            (Some("Portugal"), Some("Variable Cost"), Some(-23.4)),
            (Some("Tunisia"), Some("Variable Cost"), Some(-29.1)),
            (Some("Portugal"), Some("Thermal Energy"), Some(-5.9)),
            (Some("Tunisia"), Some("Thermal Energy"), Some(-11.1)),
        ]
    );
    assert!(extraction.rows.iter().all(|row| row.page_number == 12));
    assert!(
        extraction
            .rows
            .iter()
            .all(|row| row.extraction_method == "transposed_entity_cols_metric_row_labels")
    );
}

#[test]
fn verbal_unit_column_supplies_units_and_is_not_emitted() {
    let grid = common::grid(
        &["", "Unit", "Portugal", "Tunisia"],
        &[
            &["Net debt", "EUR million", "120", "80"],
            &["Clinker Production", "thousand tonnes", "1,200", "900"],
            &["Gross margin", "percentage", "31.5", "28.0"],
            &["Revenue", "EUR million", "410", "250"],
        ],
    );

    let extraction = Extractor::default().extract_table(&common::table(4, 0, grid));
    assert_eq!(extraction.layout, TableLayout::TransposedEntityColsMetricRowLabels);
    assert_eq!(extraction.rows.len(), 8);
    assert!(extraction.rows.iter().all(|row| row.entity.as_deref() != Some("Unit")));
    assert!(extraction.rows.iter().all(|row| row.value.is_some()));

    let units = extraction
        .rows
        .iter()
        .map(|row| (row.metric.as_deref(), row.unit.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(units[0], (Some("Net debt"), Some("EUR million")));
    assert_eq!(units[3], (Some("Clinker Production"), Some("thousand tonnes")));
    assert_eq!(units[5], (Some("Gross margin"), Some("percentage")));
    assert!(
        extraction
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::UnitInferred)
    );
}

#[test]
fn numbered_rows_read_entities_from_the_second_column() {
    let grid = common::grid(
        &["#", "Country", "Sales"],
        &[
            &["1", "Portugal", "10"],
            &["2", "Tunisia", "11"],
            &["3", "Spain", "12"],
            &["4", "France", "13"],
            &["5", "Brazil", "14"],
        ],
    );

    let extraction = Extractor::default().extract_table(&common::table(6, 0, grid));
    assert_eq!(extraction.layout, TableLayout::TransposedEntityColsMetricRowLabels);
    assert_eq!(
        summary(&extraction.rows),
        vec![
            (Some("Portugal"), Some("Sales"), Some(10.0)),
            (Some("Tunisia"), Some("Sales"), Some(11.0)),
            (Some("Spain"), Some("Sales"), Some(12.0)),
            (Some("France"), Some("Sales"), Some(13.0)),
            (Some("Brazil"), Some("Sales"), Some(14.0)),
        ]
    );
    assert!(extraction.rows.iter().all(|row| row.confidence == Confidence::Medium));
    assert!(
        extraction
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::LayoutRescued)
    );
}

#[test]
fn grids_without_headers_produce_nothing() {
    let grid = CellGrid::from_cells(vec![
        Cell::new("Revenue", 0, 0),
        Cell::new("10", 0, 1),
        Cell::new("EBITDA", 1, 0),
        Cell::new("3", 1, 1),
    ]);

    let (rows, report) = Extractor::default().extract_tables(&[common::table(2, 0, grid)]);
    assert!(rows.is_empty());
    assert_eq!(report.table_count, 0);
    assert_eq!(report.warnings[0].code, ExtractWarningCode::NoHeaders);
}

#[test]
fn repeated_runs_are_identical() {
    let extractor = Extractor::default();
    let inputs = vec![
        common::table(1, 0, common::energy_table()),
        common::table(
            1,
            1,
            common::grid(&["", "2023", "2024"], &[&["Revenue", "10", "12"], &["EBITDA", "3", "4"]]),
        ),
    ];

    let first = extractor.extract_tables(&inputs);
    let second = extractor.extract_tables(&inputs);
    assert_eq!(first, second);
}

#[test]
fn calibration_can_lower_the_transposed_row_minimum() {
    let config = PipelineConfig::from_json_str(r#"{ "layout": { "transposed_min_rows": 2 } }"#)
        .expect("calibration should parse");
    let extractor = Extractor::new(config).expect("calibration is valid");

    let extraction = extractor.extract_table(&common::table(1, 0, common::energy_table()));
    assert_eq!(extraction.layout, TableLayout::TransposedEntityColsMetricRowLabels);
    assert!(extraction.orientation.is_none());
    assert!(extraction.rows.iter().all(|row| row.confidence == Confidence::High));
}

#[test]
fn multi_header_spans_label_every_column() {
    let grid = CellGrid::from_cells(vec![
        Cell::column_header("Sales", 0, 1).with_col_span(3),
        Cell::column_header("Spain", 1, 1),
        Cell::column_header("Portugal", 1, 2),
        Cell::column_header("Tunisia", 1, 3),
        Cell::row_header("FY2024", 2, 0),
        Cell::new("1,234.5 kt", 2, 1),
        Cell::new("987", 2, 2),
        Cell::new("12,5", 2, 3),
    ]);

    let extraction = Extractor::default().extract(
        &grid,
        Provenance {
            page_number: 5,
            table_index: 2,
        },
        None,
        None,
    );

    assert_eq!(extraction.layout, TableLayout::MultiHeaderMetricEntity);
    assert_eq!(
        summary(&extraction.rows),
        vec![
            (Some("Spain"), Some("Sales"), Some(1234.5)),
            (Some("Portugal"), Some("Sales"), Some(987.0)),
            (Some("Tunisia"), Some("Sales"), Some(12.5)),
        ]
    );
    assert_eq!(extraction.rows[0].unit.as_deref(), Some("kt"));
    assert!(extraction.rows.iter().all(|row| row.fiscal_year == Some(2024)));
    assert_eq!(extraction.rows[2].column_name.as_deref(), Some("Sales / Tunisia"));
}

#[test]
fn caption_supplies_the_missing_entity() {
    let input = TableInput {
        caption: Some("Portugal plant".to_string()),
        ..common::table(
            3,
            0,
            common::grid(&["", "2023", "2024"], &[&["Revenue", "10", "12"]]),
        )
    };

    let extraction = Extractor::default().extract_table(&input);
    assert_eq!(extraction.rows.len(), 2);
    assert!(
        extraction
            .rows
            .iter()
            .all(|row| row.entity.as_deref() == Some("Portugal"))
    );
    assert!(extraction.rows.iter().all(|row| row.confidence <= Confidence::Medium));
    assert!(
        extraction
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::ContextInferred)
    );
}

#[test]
fn unresolved_tables_fall_back_to_low_confidence() {
    let extraction = Extractor::default().extract_table(&common::table(
        9,
        0,
        common::grid(&["A", "B"], &[&["alpha", "1"], &["beta", "N/A"]]),
    ));

    assert_eq!(extraction.layout, TableLayout::Unknown);
    assert_eq!(extraction.rows.len(), 2);
    assert!(extraction.rows.iter().all(|row| row.confidence == Confidence::Low));
    assert_eq!(extraction.rows[1].value, None);
    assert_eq!(extraction.warnings[0].code, ExtractWarningCode::UnresolvedLayout);
}

#[test]
fn tables_deserialize_with_default_header_flags() {
    let json = r#"[{
        "page_number": 2,
        "table_index": 0,
        "grid": {
            "num_rows": 2,
            "num_cols": 2,
            "cells": [
                { "text": "2024", "row_start": 0, "row_end": 1, "col_start": 1, "col_end": 2, "is_column_header": true },
                { "text": "Revenue", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1, "is_row_header": true },
                { "text": "42", "row_start": 1, "row_end": 2, "col_start": 1, "col_end": 2 },
                { "text": null, "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1 }
            ]
        }
    }]"#;
    let tables: Vec<TableInput> = serde_json::from_str(json).expect("tables should parse");

    let (rows, report) = Extractor::default().extract_tables(&tables);
    assert_eq!(report.row_count, 1);
    assert_eq!(rows[0].metric.as_deref(), Some("Revenue"));
    assert_eq!(rows[0].period.as_deref(), Some("2024"));
    assert_eq!(rows[0].value, Some(42.0));
    assert_eq!(rows[0].extraction_method, "temporal_cols_metric_rows");
}

#[test]
fn csv_output_carries_every_fact_column() {
    let (rows, _) = Extractor::default().extract_tables(&[common::table(1, 0, common::energy_table())]);
    let csv = write_facts_csv_to_string(&rows).expect("csv should render");

    assert!(csv.starts_with("entity,metric,period,fiscal_year,value,unit,"));
    assert!(csv.contains("Portugal,Variable Cost,,,-23.4,"), "unexpected CSV output: {csv:?}");
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn cli_writes_csv_for_extracted_rows() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tables.json");
    let output = dir.path().join("facts.csv");
    common::write_tables_json(&input, &[common::table(1, 0, common::energy_table())])
        .expect("JSON fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_grid2facts"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert!(csv.contains("Tunisia,Thermal Energy"), "unexpected CSV output: {csv:?}");
}

#[test]
fn cli_writes_json_when_asked() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tables.json");
    let output = dir.path().join("facts.json");
    common::write_tables_json(&input, &[common::table(1, 0, common::energy_table())])
        .expect("JSON fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_grid2facts"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--format",
            "json",
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    let body = std::fs::read_to_string(&output).expect("JSON should be readable");
    let rows: Vec<FactRow> = serde_json::from_str(&body).expect("output should be fact rows");
    assert_eq!(rows.len(), 4);
}

#[test]
fn cli_exits_with_code_2_when_no_rows() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("empty.json");
    let output = dir.path().join("empty.csv");
    common::write_tables_json(
        &input,
        &[common::table(1, 0, common::grid(&["A", "B"], &[&["x", "1"]]))],
    )
    .expect("JSON fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_grid2facts"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--skip-unresolved",
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_exits_with_code_1_on_invalid_calibration() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tables.json");
    let output = dir.path().join("facts.csv");
    let config = dir.path().join("calibration.json");
    common::write_tables_json(&input, &[common::table(1, 0, common::energy_table())])
        .expect("JSON fixture should be written");
    std::fs::write(&config, r#"{ "patterns": { "metric": ["(unclosed"] } }"#)
        .expect("calibration fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_grid2facts"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--config",
            &config.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(1));
}
