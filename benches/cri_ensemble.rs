use criterion::{criterion_group, criterion_main, Criterion};

use touchline::ensemble::{BoostConfig, Classifier, EnsembleClassifier, EnsembleConfig, ForestConfig};
use touchline::training;

fn criterion_benchmark(c: &mut Criterion) {
    let history = training::synthetic_history(200, 74);
    let dataset = training::prepare_features(&history).unwrap();
    let config = EnsembleConfig {
        forest: ForestConfig {
            trees: 20,
            ..ForestConfig::default()
        },
        boost: BoostConfig {
            rounds: 20,
            ..BoostConfig::default()
        },
        ..EnsembleConfig::default()
    };

    // sanity check
    let mut classifier = EnsembleClassifier::new(config.clone());
    classifier.train(&dataset).unwrap();
    assert!(classifier.is_trained());

    c.bench_function("cri_ensemble_train_200", |b| {
        b.iter(|| {
            let mut classifier = EnsembleClassifier::new(config.clone());
            classifier.train(&dataset).unwrap()
        });
    });

    let features = history[0].features();
    c.bench_function("cri_ensemble_predict", |b| {
        b.iter(|| classifier.predict_probabilities(&features));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
