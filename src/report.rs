//! The report produced by the upstream dataset analysis.
//!
//! Every field is either defaulted or wrapped in `Option`, so a report that
//! leaves fields out still deserializes. Only a report with the wrong *shape*
//! (e.g. `column_types` not being an object) is rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::domain::RVError;

/// Label shown when no target column was detected.
pub const NO_TARGET_LABEL: &str = "None";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub columns: Option<u64>,
    #[serde(default)]
    pub detected_target: Option<String>,
    #[serde(default)]
    pub cleaned_path: Option<String>,
    #[serde(default)]
    pub model_path: Option<String>,
    // Insertion order from upstream is kept, it defines the table order.
    #[serde(default)]
    pub column_types: IndexMap<String, String>,
    #[serde(default)]
    pub missing_counts: IndexMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dropped_columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub datetime_columns: Vec<String>,
    #[serde(default)]
    pub model_metrics: Option<ModelMetrics>,
    #[serde(default)]
    pub model_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default)]
    pub feature_importances: Option<Vec<FeatureImportance>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Report {
    pub fn from_value(value: Value) -> Result<Self, RVError> {
        let report: Report = serde_json::from_value(value)?;
        report.log_inconsistencies();
        Ok(report)
    }

    pub fn from_json(json: &str) -> Result<Self, RVError> {
        let report: Report = serde_json::from_str(json)?;
        report.log_inconsistencies();
        Ok(report)
    }

    /// Detected target column, or the fallback label when absent or empty.
    pub fn target_label(&self) -> &str {
        match self.detected_target.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => NO_TARGET_LABEL,
        }
    }

    /// Missing value count for a column. `None` when upstream did not report one.
    pub fn missing_count(&self, column: &str) -> Option<u64> {
        self.missing_counts.get(column).copied()
    }

    pub fn feature_importances(&self) -> Option<&[FeatureImportance]> {
        self.model_metrics
            .as_ref()
            .and_then(|m| m.feature_importances.as_deref())
    }

    fn log_inconsistencies(&self) {
        for name in self.column_types.keys() {
            if !self.missing_counts.contains_key(name) {
                debug!("Column \"{name}\" has a type but no missing count");
            }
        }
        trace!(
            "Report: rows {:?}, columns {:?}, {} typed columns, {} dropped",
            self.rows,
            self.columns,
            self.column_types.len(),
            self.dropped_columns.len()
        );
    }
}

/// Parse a report document. JSON `null` means "no analysis yet" and maps to `None`.
pub fn parse_report(json: &str) -> Result<Option<Report>, RVError> {
    let value: Value = serde_json::from_str(json)?;
    if value.is_null() {
        debug!("Report document is null");
        return Ok(None);
    }
    Report::from_value(value).map(Some)
}
