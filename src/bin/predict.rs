use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use touchline::config::Config;
use touchline::domain::{MatchContext, Team};
use touchline::estimator::{Bpa, GoalExpectationEstimator};
use touchline::file::ReadJsonFile;
use touchline::lineup;
use touchline::predictor::Predictor;
use touchline::print;
use touchline::scoregrid::{ScoreGrid, DISPLAY_MAX_GOALS};
use touchline::store::{BiasFactorStore, JsonFileStore};
use touchline::value::ValueAnalyzer;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// match file containing the fixture, its BPA and optionally the confirmed lineups
    file: PathBuf,

    /// config file; defaults apply when omitted
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// bias factor store, overriding the configured path
    #[clap(short = 's', long)]
    store: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PredictionRequest {
    fixture: MatchContext,
    #[serde(default)]
    bpa: Bpa,
    #[serde(default)]
    confirmed_lineups: Option<ConfirmedLineups>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfirmedLineups {
    home: Vec<String>,
    away: Vec<String>,
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
    let request = PredictionRequest::read_json_file(&args.file)?;
    let store = JsonFileStore::open(args.store.unwrap_or(config.calibration.store_path))?;
    let biases = store.biases(&request.fixture.home.name, &request.fixture.away.name);
    debug!("biases: {biases:?}");

    if let Some(confirmed) = &request.confirmed_lineups {
        check_lineup(&request.fixture.home, &confirmed.home);
        check_lineup(&request.fixture.away, &confirmed.away);
    }

    let predictor = Predictor::new(GoalExpectationEstimator::new(config.estimator));
    let estimate = predictor.predict(&request.fixture, &request.bpa, &biases)?;
    info!("\n{}", Console::default().render(&print::tabulate_estimate(&estimate)));

    let grid = ScoreGrid::poisson(estimate.home_lambda, estimate.away_lambda, DISPLAY_MAX_GOALS);
    info!("\n{}", Console::default().render(&print::tabulate_scoregrid(&grid)));

    if request.fixture.market_odds.is_empty() {
        info!("no market odds quoted; skipping value analysis");
    } else {
        let analyzer = ValueAnalyzer::new(config.value);
        let opportunities = analyzer.find_opportunities(&estimate, &request.fixture.market_odds);
        info!("\n{}", Console::default().render(&print::tabulate_opportunities(&opportunities)));
    }
    Ok(())
}

fn check_lineup(team: &Team, confirmed: &[String]) {
    for missing in lineup::validate(team, confirmed) {
        match lineup::suggest_replacement(team, &missing.name) {
            Some(replacement) => warn!(
                "{}: consider {} ({:.1}) in place of {}",
                team.name, replacement.name, replacement.rating, missing.name
            ),
            None => warn!("{}: no bench replacement for {}", team.name, missing.name),
        }
    }
}
