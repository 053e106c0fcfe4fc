use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Clear, List, ListItem, Paragraph, Row, Table},
};
use tracing::trace;

use crate::model::{Model, UIData};
use crate::series::FeatureSeries;
use crate::view::{
    COLUMN_TABLE_HEADERS, ChartPanel, ColumnTable, DashboardView, DroppedPanel,
    EMPTY_STATE_MESSAGE, NO_DROPPED_MESSAGE, ReportView, SummaryPanel,
};

pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const CHART_HEIGHT: usize = 14;

const STATUS_MESSAGE_FADE: Duration = Duration::from_secs(5);
// Bars take integer values, importances are scaled before drawing.
const BAR_VALUE_SCALE: f64 = 1_000_000.0;
const BAR_GAP: u16 = 1;
const LEGEND_SPACING: usize = 2;

#[derive(Debug, Default)]
pub struct ReportUI {
    frames: u64,
}

impl ReportUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        self.frames += 1;
        let uidata = model.get_uidata();
        let area = frame.area();

        let title = if uidata.source_name.is_empty() {
            Line::from(" Report viewer ".bold())
        } else {
            Line::from(format!(" Report viewer: {} ", uidata.source_name).bold())
        };
        let instructions = Line::from(vec![
            " Reload ".into(),
            "<R>".blue().bold(),
            " Reset ".into(),
            "<X>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let [body, statusline] = frame_areas(area);
        frame.render_widget(block, area);

        match &uidata.dashboard {
            DashboardView::Empty => Self::draw_empty_state(frame, body),
            DashboardView::Report(view) => Self::draw_report(frame, body, view, &uidata),
        }
        Self::draw_statusline(frame, statusline, &uidata);

        if uidata.show_popup {
            Self::draw_popup(frame, area, &uidata.popup_message);
        }
        trace!("Drew frame {}", self.frames);
    }

    fn draw_empty_state(frame: &mut Frame, area: Rect) {
        let [center] = Layout::vertical([Constraint::Length(1)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(EMPTY_STATE_MESSAGE.italic()).centered(), center);
    }

    fn draw_report(frame: &mut Frame, area: Rect, view: &ReportView, uidata: &UIData) {
        let [summary, table, dropped, chart] = report_areas(area, view);
        Self::draw_summary(frame, summary, &view.summary);
        Self::draw_column_table(frame, table, &view.column_table, uidata.table_offset);
        Self::draw_dropped(frame, dropped, &view.dropped);
        if let Some(panel) = &view.chart {
            Self::draw_chart(frame, chart, panel, uidata.selected_feature);
        }
    }

    fn draw_summary(frame: &mut Frame, area: Rect, summary: &SummaryPanel) {
        let lines: Vec<Line> = summary
            .entries()
            .into_iter()
            .map(|(label, value)| {
                let value = if label == "Model Error" {
                    value.red()
                } else {
                    value.yellow()
                };
                Line::from(vec![format!("{label}: ").bold(), value])
            })
            .collect();
        let block = Block::bordered().title(" Summary ");
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_column_table(frame: &mut Frame, area: Rect, table: &ColumnTable, offset: usize) {
        let header = Row::new(COLUMN_TABLE_HEADERS).bold();
        let rows: Vec<Row> = table
            .cells()
            .into_iter()
            .skip(offset)
            .map(Row::new)
            .collect();
        let widths = [
            Constraint::Percentage(50),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ];
        let title = format!(" Column Types ({}) ", table.rows.len());
        let widget = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::bordered().title(title));
        frame.render_widget(widget, area);
    }

    fn draw_dropped(frame: &mut Frame, area: Rect, dropped: &DroppedPanel) {
        let block = Block::bordered().title(" Dropped Columns ");
        if dropped.is_empty() {
            frame.render_widget(
                Paragraph::new(NO_DROPPED_MESSAGE.green()).block(block),
                area,
            );
        } else {
            let items: Vec<ListItem> = dropped.numbered().into_iter().map(ListItem::new).collect();
            frame.render_widget(List::new(items).block(block), area);
        }
    }

    fn draw_chart(frame: &mut Frame, area: Rect, panel: &ChartPanel, selected: usize) {
        let series = &panel.series;
        let layout = ChartLayout::new(series, area.width);
        let block = Block::bordered().title(" Feature Importances ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [tooltip, plot, legend] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(layout.legend.len() as u16),
        ])
        .areas(inner);
        let selected = selected.min(series.len().saturating_sub(1));
        frame.render_widget(Paragraph::new(tooltip_line(series, selected)), tooltip);

        let max = series.max_importance();
        let scale = scale_labels(max);
        let [gutter, bars_area] =
            Layout::horizontal([Constraint::Length(layout.gutter_width), Constraint::Min(0)])
                .areas(plot);

        // Reference rules first, the bars are drawn over them.
        for (row, label) in grid_rows(bars_area).into_iter().zip(scale.iter()) {
            let Some(y) = row else { continue };
            let rule = Rect::new(bars_area.x, y, bars_area.width, 1);
            frame.render_widget(
                Paragraph::new("┈".repeat(bars_area.width as usize)).fg(Color::DarkGray),
                rule,
            );
            let tick = Rect::new(gutter.x, y, gutter.width, 1);
            frame.render_widget(Paragraph::new(label.as_str()).right_aligned(), tick);
        }

        let bars: Vec<Bar> = series
            .points()
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let style = if idx == selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                Bar::default()
                    .value(scaled_bar_value(p.importance))
                    .text_value(format!("{}", p.importance))
                    .label(Line::from(layout.label(idx, &p.name)))
                    .style(style)
            })
            .collect();
        let chart = BarChart::default()
            .bar_width(layout.bar_width)
            .bar_gap(layout.bar_gap)
            .max(scaled_bar_value(max).max(1))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(BarGroup::default().bars(&bars));
        let offset = layout.offset.min(bars_area.width);
        let bars_area = Rect {
            x: bars_area.x + offset,
            width: bars_area.width - offset,
            ..bars_area
        };
        frame.render_widget(chart, bars_area);

        if !layout.legend.is_empty() {
            let lines: Vec<Line> = layout.legend.iter().map(|l| Line::from(l.as_str())).collect();
            frame.render_widget(Paragraph::new(Text::from(lines)).dark_gray(), legend);
        }
    }

    fn draw_statusline(frame: &mut Frame, area: Rect, uidata: &UIData) {
        let message: Span = if uidata.last_status_message_update.elapsed() > STATUS_MESSAGE_FADE {
            uidata.status_message.clone().dark_gray()
        } else {
            uidata.status_message.clone().into()
        };
        frame.render_widget(Paragraph::new(Line::from(message)), area);
    }

    fn draw_popup(frame: &mut Frame, area: Rect, message: &str) {
        let popup = popup_area(area, 60, 50);
        frame.render_widget(Clear, popup);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(" <Esc> close ").centered())
            .border_set(border::ROUNDED);
        frame.render_widget(Paragraph::new(message).block(block), popup);
    }
}

/// Body and status line inside the outer frame.
fn frame_areas(area: Rect) -> [Rect; 2] {
    Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(STATUSLINE_HEIGHT as u16),
    ])
    .areas(Block::bordered().inner(area))
}

/// Summary, column table, dropped list and chart areas of the report body.
fn report_areas(area: Rect, view: &ReportView) -> [Rect; 4] {
    let summary_height = view.summary.entries().len() as u16 + 2;
    let chart_height = view
        .chart
        .as_ref()
        .map_or(0, |c| ChartLayout::new(&c.series, area.width).height());
    let [summary, middle, chart] = Layout::vertical([
        Constraint::Length(summary_height),
        Constraint::Min(TABLE_HEADER_HEIGHT as u16 + 2),
        Constraint::Length(chart_height),
    ])
    .areas(area);
    let [table, dropped] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(middle);
    [summary, table, dropped, chart]
}

/// Column table rows that fit on a screen of the given size.
pub fn table_rows_visible(view: &ReportView, width: u16, height: u16) -> usize {
    let [body, _] = frame_areas(Rect::new(0, 0, width, height));
    let [_, table, _, _] = report_areas(body, view);
    (table.height as usize).saturating_sub(2 + TABLE_HEADER_HEIGHT)
}

/// Placement of the bars of a series inside a chart panel of a given width.
#[derive(Debug, Clone, PartialEq)]
struct ChartLayout {
    gutter_width: u16,
    bar_width: u16,
    bar_gap: u16,
    offset: u16,
    // Empty when every name fits under its bar.
    legend: Vec<String>,
}

impl ChartLayout {
    fn new(series: &FeatureSeries, panel_width: u16) -> Self {
        let scale = scale_labels(series.max_importance());
        let gutter_width = scale.iter().map(|s| s.len()).max().unwrap_or(0) as u16 + 1;
        let inner_width = panel_width.saturating_sub(2);
        let (bar_width, bar_gap, offset) =
            bar_spacing(inner_width.saturating_sub(gutter_width), series.len());
        let longest = series
            .points()
            .iter()
            .map(|p| p.name.chars().count())
            .max()
            .unwrap_or(0);
        let legend = if longest > bar_width as usize {
            legend_rows(series, inner_width as usize)
        } else {
            Vec::new()
        };
        ChartLayout {
            gutter_width,
            bar_width,
            bar_gap,
            offset,
            legend,
        }
    }

    fn height(&self) -> u16 {
        CHART_HEIGHT as u16 + self.legend.len() as u16
    }

    /// Category label of a bar, its position when names go to the legend.
    fn label(&self, idx: usize, name: &str) -> String {
        if self.legend.is_empty() {
            name.to_string()
        } else {
            (idx + 1).to_string()
        }
    }
}

/// Legend lines mapping bar positions to full feature names, packed into columns.
fn legend_rows(series: &FeatureSeries, width: usize) -> Vec<String> {
    let digits = series.len().to_string().len();
    let entries: Vec<String> = series
        .points()
        .iter()
        .enumerate()
        .map(|(idx, p)| format!("{:>digits$} {}", idx + 1, p.name))
        .collect();
    let column_width = entries
        .iter()
        .map(|e| e.chars().count())
        .max()
        .unwrap_or(0)
        + LEGEND_SPACING;
    let columns = (width / column_width).max(1);
    entries
        .chunks(columns)
        .map(|chunk| {
            chunk
                .iter()
                .map(|e| format!("{e:<column_width$}"))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

fn tooltip_line(series: &FeatureSeries, selected: usize) -> Line<'static> {
    match series.points().get(selected) {
        Some(p) => Line::from(vec![
            "▶ ".into(),
            p.name.clone().bold(),
            ": ".into(),
            format!("{}", p.importance).yellow(),
            format!("  ({}/{})", selected + 1, series.len()).dark_gray(),
        ]),
        None => Line::default(),
    }
}

/// Labels for the top, middle and bottom reference rules.
fn scale_labels(max: f64) -> [String; 3] {
    [
        format!("{max:.3}"),
        format!("{:.3}", max / 2.0),
        format!("{:.3}", 0.0),
    ]
}

/// Rows of the top, middle and bottom reference rules. The last row of the
/// area holds the bar labels and gets no rule.
fn grid_rows(area: Rect) -> [Option<u16>; 3] {
    if area.height < 2 {
        return [None, None, None];
    }
    let plot_height = area.height - 1;
    let top = area.y;
    let bottom = area.y + plot_height - 1;
    let middle = area.y + (plot_height - 1) / 2;
    if plot_height < 3 {
        [Some(top), None, Some(bottom)]
    } else {
        [Some(top), Some(middle), Some(bottom)]
    }
}

fn scaled_bar_value(importance: f64) -> u64 {
    if importance.is_finite() && importance > 0.0 {
        (importance * BAR_VALUE_SCALE).round() as u64
    } else {
        0
    }
}

/// Bar width, gap and left offset spreading `count` bars over `width`.
/// Bars get the widest size that fits, leftover cells widen the gaps and
/// whatever still remains centres the group.
fn bar_spacing(width: u16, count: usize) -> (u16, u16, u16) {
    if count == 0 {
        return (1, BAR_GAP, 0);
    }
    let width = width as usize;
    let gap = BAR_GAP as usize;
    let bar = ((width + gap) / count).saturating_sub(gap).max(1);
    let used = count * bar + (count - 1) * gap;
    let leftover = width.saturating_sub(used);
    let (gap, rest) = if count > 1 {
        (gap + leftover / (count - 1), leftover % (count - 1))
    } else {
        (gap, leftover)
    };
    (bar as u16, gap as u16, (rest / 2) as u16)
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}
