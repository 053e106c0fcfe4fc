use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};

use rv::controller::Controller;
use rv::domain::{Message, RVConfig, RVError, ReportSource};
use rv::logging::init_logging;
use rv::model::{Model, Status};
use rv::ui::ReportUI;
use rv::view::DashboardView;

/// A tui based viewer for dataset analysis reports.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Report JSON file, `-` reads it from stdin
    report: Option<String>,

    /// Print the dashboard as text and exit
    #[arg(long)]
    dump: bool,

    /// Width of the feature bars in the text dump
    #[arg(long, default_value_t = 40)]
    width: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Log file, defaults to rv.log in the temp directory
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("rv failed: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(path).map_or_else(|_| path.into(), |p| p.into_owned()))
}

fn build_config(args: &Args) -> RVConfig {
    let source = args.report.as_deref().map(|r| match r {
        "-" => ReportSource::Stdin,
        path => ReportSource::File(expand(path)),
    });
    let mut cfg = RVConfig::default()
        .with_event_poll_time(args.poll_ms)
        .with_report_source(source)
        .with_dump_width(args.width);
    if let Some(log_file) = &args.log_file {
        cfg = cfg.with_log_file(expand(log_file));
    }
    cfg
}

fn run(args: Args) -> Result<(), RVError> {
    let cfg = build_config(&args);
    init_logging(&cfg)?;
    info!("Starting rv with {cfg:?}");

    if args.dump {
        let report = match &cfg.report_source {
            Some(source) => Model::read_report(source)?,
            None => None,
        };
        let view = DashboardView::build(report.as_ref());
        print!("{:width$}", view, width = cfg.dump_width);
        return Ok(());
    }

    // Read the report before the terminal is taken over, it may come from stdin.
    let mut model = Model::init(&cfg, 0, 0);
    model.load_report()?;

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &cfg);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    cfg: &RVConfig,
) -> Result<(), RVError> {
    let size = terminal.size()?;
    model.update(Some(Message::Resize(size.width as usize, size.height as usize)))?;

    let mut ui = ReportUI::new();
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        model.update(controller.handle_event()?)?;
    }
    info!("Quitting rv");
    Ok(())
}
