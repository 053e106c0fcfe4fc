use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;

pub const HELP_TEXT: &str = "\
q      quit
r      reload report from its source
x      reset (clear the report)
← →    select feature bar
↑ ↓    scroll column table
PgUp   scroll column table one page up
PgDn   scroll column table one page down
?      show this help
Esc    close popup";

#[derive(Debug)]
pub enum RVError {
    IoError(Error),
    MalformedReport(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for RVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RVError::IoError(err) => write!(f, "IO error: {err}"),
            RVError::MalformedReport(err) => write!(f, "Malformed report: {err}"),
            RVError::LoadingFailed(msg) => write!(f, "Loading failed: {msg}"),
            RVError::FileNotFound => write!(f, "File not found"),
            RVError::PermissionDenied => write!(f, "Permission denied"),
            RVError::UnknownFileType => write!(f, "Unknown file type, expected a .json report"),
        }
    }
}

impl std::error::Error for RVError {}

impl From<Error> for RVError {
    fn from(err: Error) -> Self {
        RVError::IoError(err)
    }
}

impl From<serde_json::Error> for RVError {
    fn from(err: serde_json::Error) -> Self {
        RVError::MalformedReport(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Reload,
    Reset,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveLeft,
    MoveRight,
    Resize(usize, usize),
    Help,
    Exit,
}

/// Where a report is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSource {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct RVConfig {
    pub event_poll_time: u64,
    pub report_source: Option<ReportSource>,
    pub log_file: PathBuf,
    pub dump_width: usize,
}

impl Default for RVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            report_source: None,
            log_file: std::env::temp_dir().join("rv.log"),
            dump_width: 40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_override_defaults() {
        let cfg = RVConfig::default()
            .with_event_poll_time(250)
            .with_report_source(Some(ReportSource::Stdin));
        assert_eq!(cfg.event_poll_time, 250);
        assert_eq!(cfg.report_source, Some(ReportSource::Stdin));
        assert_eq!(cfg.dump_width, 40);
    }

    #[test]
    fn io_errors_convert() {
        let err: RVError = Error::other("boom").into();
        assert!(matches!(err, RVError::IoError(_)));
        assert!(err.to_string().contains("boom"));
    }
}
