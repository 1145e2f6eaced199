use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use touchline::calibrator::{self, OutcomeCalibrator};
use touchline::config::Config;
use touchline::display::DisplayPercent;
use touchline::domain::{OutcomeEstimate, RealizedOutcome};
use touchline::file::ReadJsonFile;
use touchline::print;
use touchline::store::{BiasFactorStore, JsonFileStore};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file containing the estimate, the realized outcome and the team names
    file: PathBuf,

    /// config file; defaults apply when omitted
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// bias factor store, overriding the configured path
    #[clap(short = 's', long)]
    store: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettledMatch {
    home_team: String,
    away_team: String,
    estimate: OutcomeEstimate,
    realized: RealizedOutcome,
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settled = SettledMatch::read_json_file(&args.file)?;
    let store = JsonFileStore::open(args.store.unwrap_or(config.calibration.store_path.clone()))?;
    let threshold = config.calibration.winner_threshold;
    let mut calibrator = OutcomeCalibrator::new(config.calibration, store);
    let report = calibrator.process_result(
        &settled.estimate,
        &settled.realized,
        &settled.home_team,
        &settled.away_team,
    )?;
    info!("\n{report}");

    let rows = calibrator::generate_comparison_report(&settled.estimate, &settled.realized, threshold);
    info!("\n{}", Console::default().render(&print::tabulate_comparison(&rows)));

    let stats = calibrator.store().stats();
    info!(
        "{} results processed, {} hits, {} misses, hit rate {}",
        stats.total,
        stats.hits,
        stats.misses,
        DisplayPercent(stats.hit_rate())
    );
    Ok(())
}
