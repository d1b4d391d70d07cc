use clap::Parser;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod dataset;
mod domain;
mod inputter;
mod model;
mod report;
mod sections;
mod table;
mod ui;

use controller::Controller;
use dataset::Dataset;
use domain::{DashboardConfig, DashboardError};
use model::{Model, Status};
use report::ReportConfig;
use sections::Section;
use ui::DashboardUI;

#[derive(Parser, Debug)]
#[command(version, about = "Terminal dashboard for retail outlet sales data")]
struct Args {
    /// CSV file with product, outlet and sales columns
    #[arg(default_value = "Products.csv")]
    path: String,

    /// Establishment year inspected by the best outlet section
    #[arg(long, default_value_t = 1985)]
    year: i64,

    /// Number of categories shown in ranked charts
    #[arg(long, default_value_t = 12)]
    top_n: usize,

    /// Number of categories listed in the per year table
    #[arg(long, default_value_t = 16)]
    table_limit: usize,

    /// Number of rows shown in table previews
    #[arg(long, default_value_t = 15)]
    preview_rows: usize,

    /// Label for outlets with unknown size
    #[arg(long, default_value = "Medium")]
    size_fill: String,

    /// Print one section as text and exit instead of starting the dashboard
    #[arg(long, value_enum)]
    print: Option<Section>,

    /// Log file, the terminal is used by the dashboard
    #[arg(long, default_value = "outlet-dash.log")]
    log_file: PathBuf,
}

impl Args {
    fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            report: ReportConfig::default()
                .with_year(self.year)
                .with_top_n(self.top_n)
                .with_table_limit(self.table_limit)
                .with_preview_rows(self.preview_rows)
                .with_size_fill(self.size_fill.as_str()),
            ..DashboardConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: could not open log file: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(args: &Args) -> Result<(), DashboardError> {
    let file = File::create(&args.log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), DashboardError> {
    info!("Starting outlet-dash!");
    let cfg = args.dashboard_config();

    let path = shellexpand::full(&args.path)
        .map_err(|e| DashboardError::LoadingFailed(e.to_string()))?;
    let dataset = Dataset::load(PathBuf::from(path.as_ref()), &cfg.report.size_fill)?;

    if let Some(section) = args.print {
        let view = sections::build(section, &dataset, &cfg.report)?;
        print!("{}", view.to_plain_text());
        return Ok(());
    }

    let mut model = Model::init(&cfg, dataset);
    let mut ui = DashboardUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();

    info!("Quitting outlet-dash");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut DashboardUI,
    controller: &Controller,
) -> Result<(), DashboardError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    Ok(())
}
