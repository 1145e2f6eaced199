//! Expected-goals (λ) estimation from season aggregates, squad form and dominance signals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EstimatorConfig;
use crate::domain::{Team, BASELINE_RATING};
use crate::probs;

/// League scoring rate assumed when the configured one is implausible.
pub const DEFAULT_LEAGUE_AVG_GOALS: f64 = 1.35;

/// League scoring rates at or below this are treated as corrupt.
const MIN_LEAGUE_AVG_GOALS: f64 = 0.5;

/// Season aggregates at or below this are treated as absent.
const ABSENT_XG: f64 = 0.1;

const RATING_ATTACK_SLOPE: f64 = 0.6;
const RATING_DEFENCE_SLOPE: f64 = 0.3;
const MIN_FALLBACK_XG_AGAINST: f64 = 0.5;

/// Expected goals for each side of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lambdas {
    pub home: f64,
    pub away: f64,
}

/// Advanced pressure balance: an externally computed dominance score per side, nominally in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bpa {
    pub home: f64,
    pub away: f64,
}
impl Bpa {
    pub fn new(home: f64, away: f64) -> Self {
        Self { home, away }
    }

    pub fn dominance(&self) -> f64 {
        self.home - self.away
    }
}

impl Default for Bpa {
    fn default() -> Self {
        Self { home: 0.5, away: 0.5 }
    }
}

/// Learned multiplicative corrections: the home team's factor at home and the away team's factor
/// away. Zero leaves the estimate untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteBiases {
    pub home: f64,
    pub away: f64,
}

/// Season expected goals for and against, falling back to a form-rating derivation for any
/// aggregate that is absent.
pub fn season_xg(team: &Team) -> (f64, f64) {
    let needs_fallback = team.avg_xg_for <= ABSENT_XG || team.avg_xg_against <= ABSENT_XG;
    let rating = if needs_fallback { team.average_rating() } else { BASELINE_RATING };
    let xg_for = if team.avg_xg_for <= ABSENT_XG {
        DEFAULT_LEAGUE_AVG_GOALS + (rating - BASELINE_RATING) * RATING_ATTACK_SLOPE
    } else {
        team.avg_xg_for
    };
    let xg_against = if team.avg_xg_against <= ABSENT_XG {
        f64::max(
            MIN_FALLBACK_XG_AGAINST,
            DEFAULT_LEAGUE_AVG_GOALS - (rating - BASELINE_RATING) * RATING_DEFENCE_SLOPE,
        )
    } else {
        team.avg_xg_against
    };
    (xg_for, xg_against)
}

#[derive(Debug, Clone, Default)]
pub struct GoalExpectationEstimator {
    config: EstimatorConfig,
}
impl GoalExpectationEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates both λs against the configured league scoring rate.
    pub fn estimate(&self, home: &Team, away: &Team, bpa: &Bpa, biases: &SiteBiases) -> Lambdas {
        self.estimate_in_league(home, away, self.config.league_avg_goals, bpa, biases)
    }

    pub fn estimate_in_league(
        &self,
        home: &Team,
        away: &Team,
        league_avg_goals: f64,
        bpa: &Bpa,
        biases: &SiteBiases,
    ) -> Lambdas {
        let league_avg_goals = if league_avg_goals <= MIN_LEAGUE_AVG_GOALS {
            DEFAULT_LEAGUE_AVG_GOALS
        } else {
            league_avg_goals
        };

        let (home_xg_for, home_xg_against) = season_xg(home);
        let (away_xg_for, away_xg_against) = season_xg(away);
        let (home_attack, home_defence) = (home_xg_for / league_avg_goals, home_xg_against / league_avg_goals);
        let (away_attack, away_defence) = (away_xg_for / league_avg_goals, away_xg_against / league_avg_goals);

        let mut home_lambda = home_attack * away_defence * league_avg_goals * self.config.home_advantage;
        let mut away_lambda = away_attack * home_defence * league_avg_goals * self.config.away_penalty;

        let dominance = bpa.dominance();
        home_lambda *= 1.0 + dominance * self.config.bpa_home_weight;
        away_lambda *= 1.0 - dominance * self.config.bpa_away_weight;

        home_lambda *= 1.0 + biases.home;
        away_lambda *= 1.0 + biases.away;

        let lambdas = Lambdas {
            home: probs::round(clamp(home_lambda, &self.config.home_lambda_bounds), 2),
            away: probs::round(clamp(away_lambda, &self.config.away_lambda_bounds), 2),
        };
        debug!(
            "{} vs {}: raw λ ({home_lambda:.4}, {away_lambda:.4}), clamped {lambdas:?}",
            home.name, away.name
        );
        lambdas
    }
}

#[inline]
fn clamp(value: f64, bounds: &std::ops::RangeInclusive<f64>) -> f64 {
    value.clamp(*bounds.start(), *bounds.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormMetrics, LineupStatus, Player, Position};
    use assert_float_eq::*;

    fn team(name: &str, xg_for: f64, xg_against: f64) -> Team {
        Team {
            name: name.into(),
            league: "Test".into(),
            players: vec![],
            avg_xg_for: xg_for,
            avg_xg_against: xg_against,
        }
    }

    fn rated_team(name: &str, rating: f64) -> Team {
        let players = (0..11)
            .map(|i| Player {
                id: format!("{name}_{i}"),
                name: format!("{name} {i}"),
                position: Position::Midfielder,
                status: LineupStatus::Starter,
                rating,
                key_role: None,
                form: FormMetrics::default(),
            })
            .collect();
        Team { players, ..team(name, 0.0, 0.0) }
    }

    #[test]
    fn home_advantaged_scenario() {
        let estimator = GoalExpectationEstimator::default();
        let lambdas = estimator.estimate(
            &team("Home", 2.0, 1.0),
            &team("Away", 1.0, 1.5),
            &Bpa::default(),
            &SiteBiases::default(),
        );
        assert!((0.4..=5.0).contains(&lambdas.home));
        assert!((0.3..=4.5).contains(&lambdas.away));
        assert!(lambdas.home > lambdas.away);
        assert_eq!(2.56, lambdas.home);
        assert_eq!(0.67, lambdas.away);
    }

    #[test]
    fn fallback_from_form_rating() {
        let (xg_for, xg_against) = season_xg(&rated_team("Strong", 8.0));
        assert_float_absolute_eq!(1.95, xg_for, 1e-12);
        assert_float_absolute_eq!(1.05, xg_against, 1e-12);

        let (xg_for, xg_against) = season_xg(&rated_team("Weak", 1.0));
        assert_float_absolute_eq!(-2.25, xg_for, 1e-12);
        assert_float_absolute_eq!(3.15, xg_against, 1e-12);

        let (xg_for, xg_against) = season_xg(&rated_team("Superb", 10.0));
        assert_float_absolute_eq!(3.15, xg_for, 1e-12);
        assert_float_absolute_eq!(MIN_FALLBACK_XG_AGAINST, xg_against, 1e-12);
    }

    #[test]
    fn fallback_only_replaces_absent_aggregates() {
        let mut partial = rated_team("Partial", 8.0);
        partial.avg_xg_for = 1.7;
        let (xg_for, xg_against) = season_xg(&partial);
        assert_eq!(1.7, xg_for);
        assert_float_absolute_eq!(1.05, xg_against, 1e-12);
    }

    #[test]
    fn unrated_squad_uses_baseline() {
        assert_eq!((1.35, 1.35), season_xg(&team("Nobody", 0.0, 0.0)));
    }

    #[test]
    fn corrupt_league_average_is_reset() {
        let estimator = GoalExpectationEstimator::default();
        let (home, away) = (team("Home", 1.6, 1.2), team("Away", 1.3, 1.4));
        let expected = estimator.estimate_in_league(&home, &away, 1.35, &Bpa::default(), &SiteBiases::default());
        for corrupt in [0.5, 0.0, -3.0] {
            let actual = estimator.estimate_in_league(&home, &away, corrupt, &Bpa::default(), &SiteBiases::default());
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn dominance_shifts_goals() {
        let estimator = GoalExpectationEstimator::default();
        let (home, away) = (team("Home", 1.4, 1.3), team("Away", 1.4, 1.3));
        let neutral = estimator.estimate(&home, &away, &Bpa::default(), &SiteBiases::default());
        let dominant = estimator.estimate(&home, &away, &Bpa::new(0.6, 0.4), &SiteBiases::default());
        assert!(dominant.home > neutral.home);
        assert!(dominant.away < neutral.away);
        // home ×(1 + 0.2·1.5), away ×(1 − 0.2·1.0)
        let raw_home = 1.4 * 1.3 / 1.35 * 1.15;
        let raw_away = 1.4 * 1.3 / 1.35 * 0.90;
        assert_eq!(probs::round(raw_home * 1.3, 2), dominant.home);
        assert_eq!(probs::round(raw_away * 0.8, 2), dominant.away);
    }

    #[test]
    fn lambdas_are_clamped() {
        let estimator = GoalExpectationEstimator::default();
        let lambdas = estimator.estimate(
            &team("Goliath", 4.0, 0.2),
            &team("David", 0.2, 4.0),
            &Bpa::new(1.0, 0.0),
            &SiteBiases::default(),
        );
        assert_eq!(5.0, lambdas.home);
        assert_eq!(0.3, lambdas.away);

        let lambdas = estimator.estimate(
            &team("David", 0.2, 4.0),
            &team("Goliath", 4.0, 0.2),
            &Bpa::new(0.0, 1.0),
            &SiteBiases::default(),
        );
        assert_eq!(0.4, lambdas.home);
        assert_eq!(4.5, lambdas.away);
    }

    #[test]
    fn biases_scale_lambdas() {
        let estimator = GoalExpectationEstimator::default();
        let (home, away) = (team("Home", 1.5, 1.2), team("Away", 1.2, 1.5));
        let plain = estimator.estimate(&home, &away, &Bpa::default(), &SiteBiases::default());
        let biased = estimator.estimate(&home, &away, &Bpa::default(), &SiteBiases { home: 0.1, away: -0.1 });
        assert!(biased.home > plain.home);
        assert!(biased.away < plain.away);
    }

    #[test]
    fn rounded_to_two_places() {
        let estimator = GoalExpectationEstimator::default();
        let lambdas = estimator.estimate(
            &team("Home", 1.234567, 1.111111),
            &team("Away", 1.3333, 1.98765),
            &Bpa::new(0.537, 0.512),
            &SiteBiases::default(),
        );
        assert_eq!(probs::round(lambdas.home, 2), lambdas.home);
        assert_eq!(probs::round(lambdas.away, 2), lambdas.away);
    }
}
