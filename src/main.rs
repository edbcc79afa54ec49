use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

mod controller;
mod data;
mod domain;
mod filter;
mod inputter;
mod model;
mod sort;
mod ui;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use controller::Controller;
use data::Dataset;
use domain::{CtvConfig, CtvError};
use model::{Model, Status};
use ui::TableUI;

/// A tui based browser for covid-19 time series data.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Wide csv/parquet/arrow file with the confirmed counts
    confirmed: String,
    /// Deaths counts, same layout and locations
    deaths: String,
    /// Recovered counts, same layout and locations
    recovered: String,
    /// Write tracing output to this file (filtered by RUST_LOG)
    #[arg(long)]
    log: Option<PathBuf>,
    /// Event poll time in milliseconds
    #[arg(long, default_value_t = 100)]
    poll: u64,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), CtvError> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref())?;

    // Everything is loaded up front; a broken dataset never shows a table.
    let dataset = Dataset::load(
        &expand_path(&cli.confirmed)?,
        &expand_path(&cli.deaths)?,
        &expand_path(&cli.recovered)?,
    )?;

    let cfg = CtvConfig::default().with_event_poll_time(cli.poll);
    let ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model =
        Model::init(&cfg, dataset, size.width as usize, size.height as usize)?;

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}

fn expand_path(path: &str) -> Result<PathBuf, CtvError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| CtvError::LoadingFailed(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn init_tracing(log: Option<&Path>) -> Result<(), CtvError> {
    if let Some(path) = log {
        let file = File::create(path)?;
        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
            .with(ErrorLayer::default())
            .init();
    }
    Ok(())
}
