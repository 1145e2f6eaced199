use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use touchline::backtest::{HistoricalPair, Strategy, StrategySimulator};
use touchline::config::Config;
use touchline::file::ReadJsonFile;
use touchline::print;
use touchline::value::ValueAnalyzer;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file containing the (estimate, realized) pairs to replay
    file: PathBuf,

    /// staking strategy
    #[clap(short = 'x', long, default_value_t = Strategy::FixedStake)]
    strategy: Strategy,

    /// starting bankroll
    #[clap(short = 'b', long, default_value_t = 100.0)]
    bankroll: f64,

    /// config file; defaults apply when omitted
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.bankroll < 0.0 {
            return Err(anyhow!("bankroll cannot be negative"));
        }
        Ok(())
    }
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
    args.validate()?;
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let pairs = Vec::<HistoricalPair>::read_json_file(&args.file)?;
    let simulator = StrategySimulator::new(ValueAnalyzer::new(config.value), config.simulation);
    let summary = simulator.run(&pairs, args.strategy, args.bankroll);
    info!("\n{}", Console::default().render(&print::tabulate_simulation(&summary)));
    Ok(())
}
