use criterion::{criterion_group, criterion_main, Criterion};

use touchline::scoregrid::{self, Outcome, ScoreGrid, AGGREGATION_MAX_GOALS};

fn criterion_benchmark(c: &mut Criterion) {
    // sanity check
    let three_way = scoregrid::outcome_probabilities(1.6, 1.1);
    assert!((three_way.sum() - 1.0).abs() < 0.01);

    c.bench_function("cri_scoregrid_outcome_probabilities", |b| {
        b.iter(|| scoregrid::outcome_probabilities(1.6, 1.1));
    });

    fn bench(c: &mut Criterion, max_goals: u8) {
        c.bench_function(&format!("cri_scoregrid_poisson_{max_goals}g"), |b| {
            b.iter(|| {
                let grid = ScoreGrid::poisson(2.56, 0.67, max_goals);
                grid.gather(&Outcome::BothTeamsToScore) + grid.gather(&Outcome::GoalsOver(2))
            });
        });
    }
    bench(c, 5);
    bench(c, AGGREGATION_MAX_GOALS);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
