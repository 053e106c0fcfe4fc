use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{HELP_TEXT, Message, RVConfig, RVError, ReportSource};
use crate::report::{Report, parse_report};
use crate::ui::table_rows_visible;
use crate::view::DashboardView;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    DASHBOARD,
    POPUP,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// Everything the ui needs for one frame. The dashboard is rebuilt from the
/// current report every time this is requested.
pub struct UIData {
    pub dashboard: DashboardView,
    pub source_name: String,
    pub selected_feature: usize,
    pub table_offset: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

pub struct Model {
    config: RVConfig,
    pub status: Status,
    modus: Modus,
    report: Option<Report>,
    selected_feature: usize,
    table_offset: usize,
    uilayout: UILayout,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &RVConfig, ui_width: usize, ui_height: usize) -> Self {
        Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::DASHBOARD,
            report: None,
            selected_feature: 0,
            table_offset: 0,
            uilayout: UILayout::from_values(ui_width, ui_height),
            popup_message: String::new(),
            status_message: "Started rv!".to_string(),
            last_status_message_update: Instant::now(),
        }
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Replace the current report. `None` moves the dashboard back to its empty state.
    pub fn set_report(&mut self, report: Option<Report>) {
        self.report = report;
        self.selected_feature = 0;
        self.table_offset = 0;
    }

    /// Read the report from the configured source.
    pub fn load_report(&mut self) -> Result<(), RVError> {
        let Some(source) = self.config.report_source.clone() else {
            self.set_status_message("No report source given");
            return Ok(());
        };
        let start_time = Instant::now();
        let report = Model::read_report(&source)?;
        let duration = start_time.elapsed().as_millis();
        info!(
            "Loading report from {:?} took {duration}ms, present: {}",
            source,
            report.is_some()
        );
        let message = match &report {
            Some(_) => format!("Loaded report in {duration}ms ..."),
            None => "Report is empty".to_string(),
        };
        self.set_report(report);
        self.set_status_message(message);
        Ok(())
    }

    pub fn read_report(source: &ReportSource) -> Result<Option<Report>, RVError> {
        match source {
            ReportSource::File(path) => Model::load_report_file(path),
            ReportSource::Stdin => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                parse_report(&buffer)
            }
        }
    }

    pub fn load_report_file(path: &Path) -> Result<Option<Report>, RVError> {
        let file_info = Model::get_file_info(path)?;
        debug!(
            "Reading report {:?} ({} bytes)",
            file_info.path, file_info.file_size
        );
        let content = fs::read_to_string(&file_info.path)?;
        parse_report(&content)
    }

    fn get_file_info(path: &Path) -> Result<FileInfo, RVError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RVError::FileNotFound,
            ErrorKind::PermissionDenied => RVError::PermissionDenied,
            _ => RVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(RVError::LoadingFailed("Not a file!".into()));
        }
        Model::check_file_type(path)?;

        Ok(FileInfo {
            path: path.to_path_buf(),
            file_size: metadata.len(),
        })
    }

    fn check_file_type(path: &Path) -> Result<(), RVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("JSON") => Ok(()),
            _ => Err(RVError::UnknownFileType),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    pub fn get_uidata(&self) -> UIData {
        UIData {
            dashboard: DashboardView::build(self.report.as_ref()),
            source_name: self.source_name(),
            selected_feature: self.selected_feature,
            table_offset: self.table_offset,
            show_popup: self.modus == Modus::POPUP,
            popup_message: self.popup_message.clone(),
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        }
    }

    fn source_name(&self) -> String {
        match &self.config.report_source {
            Some(ReportSource::File(path)) => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string(),
            Some(ReportSource::Stdin) => "<stdin>".to_string(),
            None => String::new(),
        }
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.clamp_table_offset();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), RVError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::DASHBOARD => match msg {
                    Message::Quit => self.quit(),
                    Message::Reload => self.reload(),
                    Message::Reset => self.reset(),
                    Message::MoveUp => self.scroll_table_up(1),
                    Message::MoveDown => self.scroll_table_down(1),
                    Message::MovePageUp => self.scroll_table_up(self.table_page()),
                    Message::MovePageDown => self.scroll_table_down(self.table_page()),
                    Message::MoveLeft => self.select_previous_feature(),
                    Message::MoveRight => self.select_next_feature(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::Help => self.exit_popup(),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn reload(&mut self) {
        match &self.config.report_source {
            None => self.set_status_message("Nothing to reload, no report source given"),
            Some(ReportSource::Stdin) => {
                self.set_status_message("Cannot reload a report read from stdin")
            }
            Some(ReportSource::File(_)) => {
                if let Err(e) = self.load_report() {
                    // Keep showing whatever was loaded before.
                    error!("Reloading report failed: {e:?}");
                    self.set_status_message(format!("Reload failed: {e}"));
                }
            }
        }
    }

    fn reset(&mut self) {
        info!("Resetting dashboard");
        self.set_report(None);
        self.set_status_message("Report cleared");
    }

    fn show_help(&mut self) {
        self.popup_message = HELP_TEXT.to_string();
        self.modus = Modus::POPUP;
    }

    fn exit_popup(&mut self) {
        self.popup_message.clear();
        self.modus = Modus::DASHBOARD;
    }

    fn feature_count(&self) -> usize {
        self.report
            .as_ref()
            .and_then(|r| r.feature_importances())
            .map_or(0, |f| f.len())
    }

    fn column_count(&self) -> usize {
        self.report.as_ref().map_or(0, |r| r.column_types.len())
    }

    fn select_previous_feature(&mut self) {
        self.selected_feature = self.selected_feature.saturating_sub(1);
    }

    fn select_next_feature(&mut self) {
        let count = self.feature_count();
        if count == 0 {
            warn!("No feature importances to select");
            return;
        }
        self.selected_feature = std::cmp::min(self.selected_feature + 1, count - 1);
    }

    fn scroll_table_up(&mut self, size: usize) {
        self.table_offset = self.table_offset.saturating_sub(size);
    }

    fn scroll_table_down(&mut self, size: usize) {
        self.table_offset += size;
        self.clamp_table_offset();
    }

    /// Column table rows visible with the current report and terminal size.
    pub fn table_page(&self) -> usize {
        match DashboardView::build(self.report.as_ref()) {
            DashboardView::Report(view) => {
                let width = self.uilayout.width.min(u16::MAX as usize) as u16;
                let height = self.uilayout.height.min(u16::MAX as usize) as u16;
                table_rows_visible(&view, width, height).max(1)
            }
            DashboardView::Empty => 1,
        }
    }

    fn clamp_table_offset(&mut self) {
        let max_offset = self.column_count().saturating_sub(self.table_page());
        self.table_offset = std::cmp::min(self.table_offset, max_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model_with(value: serde_json::Value) -> Model {
        let mut model = Model::init(&RVConfig::default(), 80, 40);
        model.set_report(Some(Report::from_value(value).unwrap()));
        model
    }

    fn temp_report(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rv_{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn starts_without_report() {
        let model = Model::init(&RVConfig::default(), 80, 24);
        assert!(model.report().is_none());
        assert!(model.get_uidata().dashboard.is_empty());
    }

    #[test]
    fn reset_returns_to_empty_state() {
        let mut model = model_with(json!({"rows": 1}));
        assert!(!model.get_uidata().dashboard.is_empty());
        model.update(Some(Message::Reset)).unwrap();
        assert!(model.get_uidata().dashboard.is_empty());
    }

    #[test]
    fn feature_selection_is_clamped() {
        let mut model = model_with(json!({
            "model_metrics": {"feature_importances": [
                {"feature": "a", "importance": 0.1},
                {"feature": "b", "importance": 0.2}
            ]}
        }));
        for _ in 0..5 {
            model.update(Some(Message::MoveRight)).unwrap();
        }
        assert_eq!(model.get_uidata().selected_feature, 1);
        model.update(Some(Message::MoveLeft)).unwrap();
        model.update(Some(Message::MoveLeft)).unwrap();
        assert_eq!(model.get_uidata().selected_feature, 0);
    }

    #[test]
    fn table_scroll_stops_at_last_page() {
        let columns: serde_json::Map<String, serde_json::Value> = (0..100)
            .map(|i| (format!("c{i}"), json!("int64")))
            .collect();
        let mut model = model_with(json!({"column_types": columns}));
        let page = model.table_page();
        model.update(Some(Message::MovePageDown)).unwrap();
        assert_eq!(model.get_uidata().table_offset, page);
        for _ in 0..200 {
            model.update(Some(Message::MoveDown)).unwrap();
        }
        assert_eq!(model.get_uidata().table_offset, 100 - page);
        model.update(Some(Message::MovePageUp)).unwrap();
        assert_eq!(model.get_uidata().table_offset, 100 - 2 * page);
    }

    #[test]
    fn table_that_fits_does_not_scroll() {
        let columns: serde_json::Map<String, serde_json::Value> = (0..20)
            .map(|i| (format!("c{i}"), json!("int64")))
            .collect();
        // 80x40 without a chart leaves room for 27 rows.
        let mut model = model_with(json!({"column_types": columns}));
        assert_eq!(model.table_page(), 27);
        model.update(Some(Message::MovePageDown)).unwrap();
        model.update(Some(Message::MoveDown)).unwrap();
        assert_eq!(model.get_uidata().table_offset, 0);
    }

    #[test]
    fn chart_shrinks_table_page() {
        let columns: serde_json::Map<String, serde_json::Value> = (0..20)
            .map(|i| (format!("c{i}"), json!("int64")))
            .collect();
        let mut model = model_with(json!({
            "column_types": columns,
            "model_metrics": {"feature_importances": [{"feature": "c0", "importance": 0.4}]}
        }));
        let page = model.table_page();
        assert!(page < 27);
        model.update(Some(Message::MovePageDown)).unwrap();
        assert_eq!(model.get_uidata().table_offset, 20 - page);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = Model::init(&RVConfig::default(), 80, 24);
        model.update(Some(Message::Help)).unwrap();
        assert!(model.get_uidata().show_popup);
        model.update(Some(Message::Reset)).unwrap();
        assert!(model.get_uidata().show_popup);
        model.update(Some(Message::Exit)).unwrap();
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn loads_and_reloads_from_file() {
        let path = temp_report("reload.json", r#"{"rows": 10, "column_types": {"a": "int64"}}"#);
        let cfg = RVConfig::default().with_report_source(Some(ReportSource::File(path.clone())));
        let mut model = Model::init(&cfg, 80, 24);
        model.load_report().unwrap();
        assert_eq!(model.report().unwrap().rows, Some(10));

        fs::write(&path, "null").unwrap();
        model.update(Some(Message::Reload)).unwrap();
        assert!(model.report().is_none());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_reload_keeps_report() {
        let path = temp_report("broken.json", r#"{"rows": 7}"#);
        let cfg = RVConfig::default().with_report_source(Some(ReportSource::File(path.clone())));
        let mut model = Model::init(&cfg, 80, 24);
        model.load_report().unwrap();

        fs::write(&path, r#"{"column_types": 5}"#).unwrap();
        model.update(Some(Message::Reload)).unwrap();
        assert_eq!(model.report().unwrap().rows, Some(7));
        assert!(model.get_uidata().status_message.starts_with("Reload failed"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_non_json_files() {
        let path = temp_report("report.csv", "a,b\n1,2\n");
        assert!(matches!(
            Model::load_report_file(&path),
            Err(RVError::UnknownFileType)
        ));
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            Model::load_report_file(&path),
            Err(RVError::FileNotFound)
        ));
    }
}
