//! Output formatting and persistence for report rows.
//!
//! Supports a text table, a JSON document, and a CSV file.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::analyzers::report::ReportQuery;
use crate::analyzers::types::{REPORT_COLUMNS, ReportRow, SortKey, Subject};

/// Placeholder for metrics that could not be computed.
const MISSING: &str = "-";

/// A report with the query that produced it, as written to JSON.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub city: &'a str,
    pub subject: Subject,
    pub order: SortKey,
    pub target_year: i32,
    pub rows: &'a [ReportRow],
}

impl<'a> ReportDocument<'a> {
    pub fn new(query: &'a ReportQuery, target_year: i32, rows: &'a [ReportRow]) -> Self {
        Self {
            generated_at: Utc::now(),
            city: &query.city,
            subject: query.subject,
            order: query.sort,
            target_year,
            rows,
        }
    }
}

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}"))
}

fn cells(row: &ReportRow) -> Vec<Cell> {
    let metrics = [
        row.polish_average,
        row.polish_trend,
        row.english_average,
        row.english_trend,
        row.math_average,
        row.math_trend,
        row.all_average,
        row.all_trend,
    ];

    std::iter::once(Cell::new(&row.school))
        .chain(metrics.into_iter().map(|v| Cell::new(format_metric(v))))
        .collect()
}

/// Renders rows as a text table. The column the rows are sorted by is
/// marked with `*`; metric columns are right aligned.
pub fn render_table(rows: &[ReportRow], query: &ReportQuery) -> String {
    let sort_column = query.sort_column();
    let headers: Vec<String> = REPORT_COLUMNS
        .iter()
        .map(|name| {
            if *name == sort_column {
                format!("{name}*")
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(headers);

    for row in rows {
        table.add_row(cells(row));
    }

    for index in 1..REPORT_COLUMNS.len() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    format!("{table}\n")
}

/// Serializes a report document as pretty-printed JSON.
pub fn to_json(document: &ReportDocument<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Writes rows to a CSV file, replacing any existing file.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV report");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn row(school: &str, polish: Option<f64>) -> ReportRow {
        ReportRow {
            school: school.to_string(),
            polish_average: polish,
            polish_trend: polish,
            english_average: Some(50.0),
            english_trend: Some(50.0),
            math_average: Some(50.0),
            math_trend: Some(50.0),
            all_average: Some(50.0),
            all_trend: Some(50.0),
        }
    }

    #[test]
    fn test_render_table_marks_sort_column() {
        let query = ReportQuery::new("Gdansk", Subject::Polish, SortKey::Trend);
        let table = render_table(&[row("Lincoln", Some(65.0))], &query);

        let header = table.lines().find(|l| l.contains("school")).unwrap();
        assert!(header.contains("polish_trend*"));
        assert!(!header.contains("polish_average*"));
        assert!(table.contains("65.00"));
    }

    #[test]
    fn test_render_table_missing_metric() {
        let query = ReportQuery::new("Gdansk", Subject::All, SortKey::Average);
        let table = render_table(&[row("Lincoln", None)], &query);

        let data_line = table.lines().find(|l| l.contains("Lincoln")).unwrap();
        assert!(data_line.contains(" - "));
        assert!(data_line.contains("50.00"));
    }

    #[test]
    fn test_render_table_keeps_row_order() {
        let query = ReportQuery::new("Gdansk", Subject::All, SortKey::Average);
        let rows = vec![row("Zeta", Some(1.0)), row("Alpha", Some(2.0))];
        let table = render_table(&rows, &query);

        let zeta = table.find("Zeta").unwrap();
        let alpha = table.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_to_json_contains_rows() {
        let query = ReportQuery::new("Gdansk", Subject::Math, SortKey::Average);
        let rows = vec![row("Lincoln", None)];
        let json = to_json(&ReportDocument::new(&query, 2025, &rows)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["city"], "Gdansk");
        assert_eq!(value["subject"], "math");
        assert_eq!(value["order"], "average");
        assert_eq!(value["target_year"], 2025);
        assert_eq!(value["rows"][0]["school"], "Lincoln");
        assert!(value["rows"][0]["polish_average"].is_null());
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let path = temp_path("exam_trends_test_report.csv");
        let _ = fs::remove_file(&path);

        write_csv(&path, &[row("A", Some(1.5)), row("B", None)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], REPORT_COLUMNS.join(","));
        assert!(lines[1].starts_with("A,1.5,1.5,"));
        assert!(lines[2].starts_with("B,,,"));

        fs::remove_file(&path).unwrap();
    }
}
