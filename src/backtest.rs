//! Replays historical estimates against realised results under a staking policy.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::domain::{OutcomeEstimate, RealizedOutcome};
use crate::market::{MarketLabel, MarketOdds};
use crate::probs;
use crate::value::ValueAnalyzer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// A fixed fraction of the initial bankroll on every bet.
    #[default]
    FixedStake,
    /// The suggested Kelly percentage of the running balance.
    Proportional,
}

/// An estimate and what actually happened. Odds are synthesised from the estimate when none were
/// recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPair {
    pub estimate: OutcomeEstimate,
    pub realized: RealizedOutcome,
    #[serde(default)]
    pub market_odds: MarketOdds,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub match_id: String,
    pub label: MarketLabel,
    pub odds: f64,
    pub stake: f64,
    pub won: bool,
    pub balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub final_balance: f64,
    /// Return on the initial bankroll, as a percentage.
    pub roi: f64,
    pub total_bets: usize,
    /// Percentage of bets won.
    pub win_rate: f64,
    /// Balance after each settled bet.
    pub equity_curve: Vec<f64>,
    pub settlements: Vec<Settlement>,
}

#[derive(Debug, Clone, Default)]
pub struct StrategySimulator {
    analyzer: ValueAnalyzer,
    config: SimulationConfig,
}
impl StrategySimulator {
    pub fn new(analyzer: ValueAnalyzer, config: SimulationConfig) -> Self {
        Self { analyzer, config }
    }

    /// Odds a bookmaker would quote for the estimate at the configured margin.
    pub fn synthetic_odds(&self, estimate: &OutcomeEstimate) -> MarketOdds {
        MarketOdds::frame_multiplicative(estimate, self.config.synthetic_overround)
    }

    /// Bets the single best-value market of each fixture, if any.
    pub fn run(&self, pairs: &[HistoricalPair], strategy: Strategy, initial_bankroll: f64) -> SimulationSummary {
        let fixed_stake = initial_bankroll * self.config.fixed_stake_fraction;
        let mut balance = initial_bankroll;
        let mut settlements = Vec::new();

        for pair in pairs {
            let synthetic;
            let odds = if pair.market_odds.is_empty() {
                synthetic = self.synthetic_odds(&pair.estimate);
                &synthetic
            } else {
                &pair.market_odds
            };

            let opportunities = self.analyzer.find_opportunities(&pair.estimate, odds);
            let Some(best) = opportunities.first() else {
                debug!("{}: no value", pair.realized.match_id);
                continue;
            };

            let stake = match strategy {
                Strategy::FixedStake => fixed_stake,
                Strategy::Proportional => balance * best.suggested_stake_pct / 100.0,
            };
            let won = best.label.winner() == pair.realized.winner;
            if won {
                balance += stake * (best.odds - 1.0);
            } else {
                balance -= stake;
            }
            debug!(
                "{}: staked {stake:.2} on {} @ {}, {}; balance {balance:.2}",
                pair.realized.match_id,
                best.label,
                best.odds,
                if won { "won" } else { "lost" }
            );
            settlements.push(Settlement {
                match_id: pair.realized.match_id.clone(),
                label: best.label,
                odds: best.odds,
                stake,
                won,
                balance,
            });
        }

        let roi = (balance - initial_bankroll) / f64::max(initial_bankroll, 1.0) * 100.0;
        let wins = settlements.iter().filter(|settlement| settlement.won).count();
        let win_rate = if settlements.is_empty() {
            0.0
        } else {
            wins as f64 / settlements.len() as f64 * 100.0
        };
        let summary = SimulationSummary {
            final_balance: probs::round(balance, 2),
            roi: probs::round(roi, 2),
            total_bets: settlements.len(),
            win_rate: probs::round(win_rate, 2),
            equity_curve: settlements.iter().map(|settlement| settlement.balance).collect(),
            settlements,
        };
        info!(
            "{strategy} over {} fixtures: {} bets, win rate {}%, ROI {}%, final balance {}",
            pairs.len(),
            summary.total_bets,
            summary.win_rate,
            summary.roi,
            summary.final_balance
        );
        summary
    }
}
