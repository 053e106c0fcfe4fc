//! Report to view transformation.
//!
//! `DashboardView::build` is the whole pipeline: it guards against a missing
//! report, pulls the fields each panel needs and decides per panel whether it
//! is shown. The result is a plain tree that the terminal ui and the text dump
//! both draw from. It holds no state and is rebuilt on every draw.

use std::fmt;

use tracing::trace;

use crate::report::Report;
use crate::series::FeatureSeries;

pub const EMPTY_STATE_MESSAGE: &str = "No report loaded. Upload a dataset to see its analysis.";
pub const NO_DROPPED_MESSAGE: &str = "No columns were dropped.";
pub const COLUMN_TABLE_HEADERS: [&str; 3] = ["Column", "Type", "Missing"];
pub const DEFAULT_TEXT_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Empty,
    Report(ReportView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub summary: SummaryPanel,
    pub column_table: ColumnTable,
    pub dropped: DroppedPanel,
    pub chart: Option<ChartPanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPanel {
    pub rows: Option<u64>,
    pub columns: Option<u64>,
    pub detected_target: String,
    pub cleaned_path: Option<String>,
    pub model_path: Option<String>,
    pub datetime_columns: Vec<String>,
    pub model_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    pub name: String,
    pub dtype: String,
    pub missing: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTable {
    pub rows: Vec<ColumnRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedPanel {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub series: FeatureSeries,
}

impl DashboardView {
    pub fn build(report: Option<&Report>) -> Self {
        match report {
            None => {
                trace!("No report, building empty state");
                DashboardView::Empty
            }
            Some(report) => DashboardView::Report(ReportView::build(report)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DashboardView::Empty)
    }

    pub fn to_text(&self, width: usize) -> String {
        match self {
            DashboardView::Empty => format!("{EMPTY_STATE_MESSAGE}\n"),
            DashboardView::Report(view) => view.to_text(width),
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(f.width().unwrap_or(DEFAULT_TEXT_WIDTH)))
    }
}

impl ReportView {
    pub fn build(report: &Report) -> Self {
        let series = FeatureSeries::from_report(report);
        let chart = if series.is_empty() {
            None
        } else {
            Some(ChartPanel { series })
        };
        trace!(
            "Built report view: {} table rows, {} dropped, chart: {}",
            report.column_types.len(),
            report.dropped_columns.len(),
            chart.is_some()
        );
        ReportView {
            summary: SummaryPanel::build(report),
            column_table: ColumnTable::build(report),
            dropped: DroppedPanel {
                columns: report.dropped_columns.clone(),
            },
            chart,
        }
    }

    fn to_text(&self, width: usize) -> String {
        let mut out = String::new();

        out.push_str("== Summary ==\n");
        for (label, value) in self.summary.entries() {
            out.push_str(&format!("{label}: {value}\n"));
        }

        out.push_str("== Column Types ==\n");
        let cells = self.column_table.cells();
        let mut widths = COLUMN_TABLE_HEADERS.map(str::len);
        for row in cells.iter() {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let header = COLUMN_TABLE_HEADERS.map(String::from);
        for row in std::iter::once(&header).chain(cells.iter()) {
            let line = row
                .iter()
                .zip(widths.iter())
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect::<Vec<String>>()
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }

        out.push_str("== Dropped Columns ==\n");
        if self.dropped.is_empty() {
            out.push_str(NO_DROPPED_MESSAGE);
            out.push('\n');
        } else {
            for item in self.dropped.numbered() {
                out.push_str(&item);
                out.push('\n');
            }
        }

        if let Some(chart) = &self.chart {
            out.push_str("== Feature Importances ==\n");
            let series = &chart.series;
            let name_width = series
                .points()
                .iter()
                .map(|p| p.name.chars().count())
                .max()
                .unwrap_or(0);
            let max = series.max_importance();
            for p in series.points() {
                let len = scaled_length(p.importance, max, width);
                let bar = "█".repeat(len);
                out.push_str(&format!("{:<name_width$} │{bar} {}\n", p.name, p.importance));
            }
        }

        out
    }
}

/// Number of cells a bar of `value` occupies when `max` fills `width`.
pub fn scaled_length(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return 0;
    }
    ((value / max) * width as f64).round() as usize
}

impl SummaryPanel {
    fn build(report: &Report) -> Self {
        SummaryPanel {
            rows: report.rows,
            columns: report.columns,
            detected_target: report.target_label().to_string(),
            cleaned_path: report.cleaned_path.clone(),
            model_path: report.model_path.clone(),
            datetime_columns: report.datetime_columns.clone(),
            model_error: report.model_error.clone(),
        }
    }

    /// Label / value pairs in display order. Absent values show as empty text.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let opt = |v: &Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        let mut entries = vec![
            ("Rows", opt(&self.rows)),
            ("Columns", opt(&self.columns)),
            ("Detected Target", self.detected_target.clone()),
            ("Cleaned Path", self.cleaned_path.clone().unwrap_or_default()),
            ("Model Path", self.model_path.clone().unwrap_or_default()),
        ];
        if !self.datetime_columns.is_empty() {
            entries.push(("Datetime Columns", self.datetime_columns.join(", ")));
        }
        if let Some(err) = &self.model_error {
            entries.push(("Model Error", err.clone()));
        }
        entries
    }
}

impl ColumnTable {
    fn build(report: &Report) -> Self {
        let rows = report
            .column_types
            .iter()
            .map(|(name, dtype)| ColumnRow {
                name: name.clone(),
                dtype: dtype.clone(),
                missing: report.missing_count(name),
            })
            .collect();
        ColumnTable { rows }
    }

    /// Rows as display strings, a missing count that was never reported is blank.
    pub fn cells(&self) -> Vec<[String; 3]> {
        self.rows
            .iter()
            .map(|r| {
                [
                    r.name.clone(),
                    r.dtype.clone(),
                    r.missing.map(|m| m.to_string()).unwrap_or_default(),
                ]
            })
            .collect()
    }
}

impl DroppedPanel {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn numbered(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("{}. {name}", idx + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> Report {
        Report::from_value(value).unwrap()
    }

    #[test]
    fn absent_report_is_empty_state() {
        let view = DashboardView::build(None);
        assert!(view.is_empty());
        assert_eq!(view.to_string(), format!("{EMPTY_STATE_MESSAGE}\n"));
    }

    #[test]
    fn zero_shape_still_renders_table_header() {
        let view = ReportView::build(&report(json!({"rows": 0, "columns": 0})));
        assert!(view.column_table.rows.is_empty());
        let text = view.to_text(DEFAULT_TEXT_WIDTH);
        assert!(text.contains("Column  Type  Missing"));
    }

    #[test]
    fn chart_omitted_for_empty_importances() {
        let view = ReportView::build(&report(json!({
            "model_metrics": {"feature_importances": []}
        })));
        assert!(view.chart.is_none());
        assert!(!view.to_text(20).contains("Feature Importances"));
    }

    #[test]
    fn summary_entries_show_blank_for_absent_values() {
        let view = ReportView::build(&report(json!({"rows": 3})));
        let entries = view.summary.entries();
        assert_eq!(entries[0], ("Rows", "3".to_string()));
        assert_eq!(entries[1], ("Columns", String::new()));
        assert_eq!(entries[2], ("Detected Target", "None".to_string()));
        assert_eq!(entries[3], ("Cleaned Path", String::new()));
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn summary_lists_extras_when_present() {
        let view = ReportView::build(&report(json!({
            "datetime_columns": ["created", "updated"],
            "model_error": "could not convert string to float"
        })));
        let entries = view.summary.entries();
        assert!(entries.contains(&("Datetime Columns", "created, updated".to_string())));
        assert!(entries.contains(&("Model Error", "could not convert string to float".to_string())));
    }

    #[test]
    fn dropped_items_are_numbered_in_order() {
        let view = ReportView::build(&report(json!({"dropped_columns": ["id", "notes"]})));
        assert_eq!(view.dropped.numbered(), vec!["1. id", "2. notes"]);
    }

    #[test]
    fn bars_scale_to_width() {
        assert_eq!(scaled_length(0.8, 0.8, 40), 40);
        assert_eq!(scaled_length(0.4, 0.8, 40), 20);
        assert_eq!(scaled_length(0.0, 0.8, 40), 0);
        assert_eq!(scaled_length(0.5, 0.0, 40), 0);
        assert_eq!(scaled_length(-1.0, 0.8, 40), 0);
    }

    #[test]
    fn width_flag_controls_text_bars() {
        let view = DashboardView::build(Some(&report(json!({
            "model_metrics": {"feature_importances": [{"feature": "age", "importance": 0.8}]}
        }))));
        let text = format!("{view:10}");
        assert!(text.contains(&format!("age │{} 0.8", "█".repeat(10))));
    }
}
