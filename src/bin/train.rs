use std::env;
use std::error::Error;
use std::time::Instant;

use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use touchline::ensemble::{self, Classifier, ClassifierKind, EnsembleClassifier, EnsembleConfig, DEFAULT_SEED};
use touchline::print;
use touchline::training::{self, FEATURE_NAMES};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// number of synthetic matches to generate
    #[clap(short = 'n', long, default_value_t = 500)]
    matches: usize,

    /// seed for both the synthetic history and the learner
    #[clap(short = 's', long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// classifier to train
    #[clap(short = 'k', long, default_value_t = ClassifierKind::Ensemble)]
    kind: ClassifierKind,
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

    let start_time = Instant::now();
    let history = training::synthetic_history(args.matches, args.seed);
    match args.kind {
        ClassifierKind::Ensemble => {
            let mut classifier = EnsembleClassifier::new(EnsembleConfig {
                seed: args.seed,
                ..EnsembleConfig::default()
            });
            let report = training::run_cycle(&mut classifier, &history)?;
            let importances = classifier.feature_importances();
            info!(
                "\n{}",
                Console::default().render(&print::tabulate_training(&report, &importances))
            );
        }
        kind => {
            let mut classifier = ensemble::build(kind);
            let dataset = training::prepare_features(&history)?;
            let metrics = classifier.train(&dataset)?;
            info!("{kind} classifier over {} samples: {metrics:?}", dataset.len());
        }
    }
    let elapsed = start_time.elapsed();
    info!("trained over {:?} features in {}s", FEATURE_NAMES, elapsed.as_millis() as f64 / 1_000.);
    Ok(())
}
