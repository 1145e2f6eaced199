//! Score distributions under the independent Poisson model, and the outcome markets gathered
//! from them.

use rustc_hash::FxHashMap;

use crate::domain::{Score, Site};
use crate::linear::Matrix;
use crate::market::ThreeWay;
use crate::poisson;
use crate::probs::{self, SliceExt};

/// Goals per side shown in tables.
pub const DISPLAY_MAX_GOALS: u8 = 5;

/// Goals per side summed when aggregating outcome probabilities.
pub const AGGREGATION_MAX_GOALS: u8 = 8;

/// Populates `scoregrid` with the joint probabilities of two independent Poisson processes. Mass
/// beyond the last row and column is not represented, so the grid sums to slightly less than 1.
pub fn from_univariate_poisson(home_rate: f64, away_rate: f64, scoregrid: &mut Matrix<f64>) {
    let home_probs: Vec<_> = (0..scoregrid.rows()).map(|goals| poisson::pmf(home_rate, goals as u32)).collect();
    let away_probs: Vec<_> = (0..scoregrid.cols()).map(|goals| poisson::pmf(away_rate, goals as u32)).collect();
    for (home_goals, home_prob) in home_probs.iter().enumerate() {
        for (away_goals, away_prob) in away_probs.iter().enumerate() {
            scoregrid[(home_goals, away_goals)] = home_prob * away_prob;
        }
    }
}

/// A square grid of exact-score probabilities, with home goals on the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrid {
    cells: Matrix<f64>,
}
impl ScoreGrid {
    pub fn poisson(home_lambda: f64, away_lambda: f64, max_goals: u8) -> Self {
        let dim = max_goals as usize + 1;
        let mut cells = Matrix::allocate(dim, dim);
        from_univariate_poisson(home_lambda, away_lambda, &mut cells);
        Self { cells }
    }

    pub fn max_goals(&self) -> u8 {
        (self.cells.rows() - 1) as u8
    }

    pub fn matrix(&self) -> &Matrix<f64> {
        &self.cells
    }

    /// Probability of the exact score; zero for scores beyond the grid.
    pub fn prob(&self, score: &Score) -> f64 {
        let (home, away) = (score.home as usize, score.away as usize);
        if home < self.cells.rows() && away < self.cells.cols() {
            self.cells[(home, away)]
        } else {
            0.0
        }
    }

    pub fn gather(&self, outcome: &Outcome) -> f64 {
        outcome.gather(&self.cells)
    }

    /// Probabilities keyed by `"h-a"`.
    pub fn labelled(&self) -> FxHashMap<String, f64> {
        self.cells
            .cells()
            .map(|(home, away, &prob)| (format!("{home}-{away}"), prob))
            .collect()
    }

    /// The exact score with the highest probability. Ties go to the score reached first in
    /// row-major order.
    pub fn most_likely(&self) -> Score {
        let mut best = (Score::nil_all(), f64::NEG_INFINITY);
        for (home, away, &prob) in self.cells.cells() {
            if prob > best.1 {
                best = (Score::new(home as u8, away as u8), prob);
            }
        }
        best.0
    }

    pub fn expected_total_goals(&self) -> f64 {
        self.cells
            .cells()
            .map(|(home, away, &prob)| (home + away) as f64 * prob)
            .sum()
    }

    /// Unrounded home, draw and away probabilities.
    pub fn three_way(&self) -> ThreeWay {
        ThreeWay::new(
            self.gather(&Outcome::Win(Site::Home)),
            self.gather(&Outcome::Draw),
            self.gather(&Outcome::Win(Site::Away)),
        )
    }
}

/// Home, draw and away probabilities aggregated over a 0–8 grid, conditioned on the grid (divided
/// by its mass) and rounded to four places. Conditioning keeps the home probability increasing in
/// the home rate when the truncated tail is large.
pub fn outcome_probabilities(home_lambda: f64, away_lambda: f64) -> ThreeWay {
    let grid = ScoreGrid::poisson(home_lambda, away_lambda, AGGREGATION_MAX_GOALS);
    let three_way = grid.three_way();
    let mut outcomes = [three_way.home, three_way.draw, three_way.away];
    outcomes.normalise(1.0);
    let [home, draw, away] = outcomes.map(|prob| probs::round(prob, 4));
    ThreeWay::new(home, draw, away)
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Outcome {
    Win(Site),
    Draw,
    GoalsUnder(u8),
    GoalsOver(u8),
    CorrectScore(Score),
    BothTeamsToScore,
}
impl Outcome {
    pub fn gather(&self, scoregrid: &Matrix<f64>) -> f64 {
        match self {
            Outcome::Win(side) => Self::gather_win(side, scoregrid),
            Outcome::Draw => Self::gather_draw(scoregrid),
            Outcome::GoalsUnder(goals) => Self::gather_goals_under(*goals, scoregrid),
            Outcome::GoalsOver(goals) => Self::gather_goals_over(*goals, scoregrid),
            Outcome::CorrectScore(score) => Self::gather_correct_score(score, scoregrid),
            Outcome::BothTeamsToScore => Self::gather_both_score(scoregrid),
        }
    }

    fn gather_win(side: &Site, scoregrid: &Matrix<f64>) -> f64 {
        scoregrid
            .cells()
            .filter(|(home, away, _)| match side {
                Site::Home => home > away,
                Site::Away => away > home,
            })
            .map(|(_, _, prob)| prob)
            .sum()
    }

    fn gather_draw(scoregrid: &Matrix<f64>) -> f64 {
        let diagonal = usize::min(scoregrid.rows(), scoregrid.cols());
        (0..diagonal).map(|index| scoregrid[(index, index)]).sum()
    }

    fn gather_goals_over(goals: u8, scoregrid: &Matrix<f64>) -> f64 {
        let goals = goals as usize;
        scoregrid
            .cells()
            .filter(|(home, away, _)| home + away > goals)
            .map(|(_, _, prob)| prob)
            .sum()
    }

    fn gather_goals_under(goals: u8, scoregrid: &Matrix<f64>) -> f64 {
        let goals = goals as usize;
        scoregrid
            .cells()
            .filter(|(home, away, _)| home + away < goals)
            .map(|(_, _, prob)| prob)
            .sum()
    }

    fn gather_correct_score(score: &Score, scoregrid: &Matrix<f64>) -> f64 {
        scoregrid[(score.home as usize, score.away as usize)]
    }

    fn gather_both_score(scoregrid: &Matrix<f64>) -> f64 {
        scoregrid
            .cells()
            .filter(|&(home, away, _)| home > 0 && away > 0)
            .map(|(_, _, prob)| prob)
            .sum()
    }
}
