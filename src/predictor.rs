//! Full-match estimates: goal expectation, outcome probabilities and the stat markets.

use tracing::{debug, info};

use crate::aux_markets;
use crate::domain::{InvalidInput, MatchContext, OutcomeEstimate};
use crate::estimator::{Bpa, GoalExpectationEstimator, SiteBiases};
use crate::poisson;
use crate::probs;
use crate::scoregrid::{self, ScoreGrid, DISPLAY_MAX_GOALS};

#[derive(Debug, Clone, Default)]
pub struct Predictor {
    estimator: GoalExpectationEstimator,
}
impl Predictor {
    pub fn new(estimator: GoalExpectationEstimator) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &GoalExpectationEstimator {
        &self.estimator
    }

    pub fn predict(
        &self,
        fixture: &MatchContext,
        bpa: &Bpa,
        biases: &SiteBiases,
    ) -> Result<OutcomeEstimate, InvalidInput> {
        fixture.validate()?;
        let lambdas = self.estimator.estimate(&fixture.home, &fixture.away, bpa, biases);
        let three_way = scoregrid::outcome_probabilities(lambdas.home, lambdas.away);
        let grid = ScoreGrid::poisson(lambdas.home, lambdas.away, DISPLAY_MAX_GOALS);
        let both_teams_to_score =
            (1.0 - poisson::pmf(lambdas.home, 0)) * (1.0 - poisson::pmf(lambdas.away, 0));
        debug!("{} score grid:\n{}", fixture.id, grid.matrix().verbose());
        let markets = aux_markets::predict(bpa, fixture.strictness());
        let confidence = [three_way.home, three_way.draw, three_way.away]
            .into_iter()
            .fold(0.0, f64::max);

        let estimate = OutcomeEstimate {
            match_id: fixture.id.clone(),
            home_lambda: lambdas.home,
            away_lambda: lambdas.away,
            home_win: three_way.home,
            draw: three_way.draw,
            away_win: three_way.away,
            expected_total_goals: probs::round(lambdas.home + lambdas.away, 2),
            both_teams_to_score: probs::round(both_teams_to_score, 4),
            most_likely_score: grid.most_likely(),
            corners: markets.corners,
            cards: markets.cards,
            shots: markets.shots,
            shots_on_target: markets.shots_on_target,
            confidence,
        };
        info!(
            "{} ({} v {}): λ {:.2}/{:.2}, 1X2 {:.4}/{:.4}/{:.4}, most likely {}",
            fixture.id,
            fixture.home.name,
            fixture.away.name,
            estimate.home_lambda,
            estimate.away_lambda,
            estimate.home_win,
            estimate.draw,
            estimate.away_win,
            estimate.most_likely_score
        );
        Ok(estimate)
    }
}
