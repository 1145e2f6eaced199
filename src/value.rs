//! Expected value of market prices against model probabilities, and fractional Kelly staking.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ValueConfig;
use crate::domain::OutcomeEstimate;
use crate::market::{LabelledProbs, MarketLabel, MarketOdds};
use crate::probs;

/// Edge of a bet as a fraction of the stake, `prob·odds − 1`. Odds of 1 or less are meaningless
/// and carry no value.
pub fn value(prob: f64, decimal_odds: f64) -> f64 {
    if decimal_odds <= 1.0 {
        0.0
    } else {
        prob * decimal_odds - 1.0
    }
}

/// Fraction of the bankroll to stake: the Kelly optimum `(p·(b+1) − 1)/b`, where `b = odds − 1`,
/// damped by `fraction` and floored at zero.
pub fn kelly_stake(prob: f64, decimal_odds: f64, fraction: f64) -> f64 {
    if decimal_odds <= 1.0 || prob <= 0.0 {
        return 0.0;
    }
    let b = decimal_odds - 1.0;
    let optimal = (prob * (b + 1.0) - 1.0) / b;
    f64::max(0.0, optimal * fraction)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOpportunity {
    pub label: MarketLabel,
    pub prob: f64,
    pub odds: f64,
    /// Value as a percentage, rounded to two places.
    pub value_pct: f64,
    /// Suggested stake as a percentage of the bankroll, rounded to two places.
    pub suggested_stake_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ValueAnalyzer {
    config: ValueConfig,
}
impl ValueAnalyzer {
    pub fn new(config: ValueConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValueConfig {
        &self.config
    }

    /// Scans the quoted labels in market order, keeping those whose rounded value percentage
    /// exceeds the configured minimum. The result is ordered by descending value; equal values
    /// keep market order.
    pub fn find_opportunities(&self, estimate: &impl LabelledProbs, odds: &MarketOdds) -> Vec<ValueOpportunity> {
        let min_value_pct = probs::round(self.config.min_value * 100.0, 2);
        let mut opportunities: Vec<_> = odds
            .iter()
            .filter_map(|(label, odds)| {
                let prob = estimate.prob(label);
                let value_pct = probs::round(value(prob, odds) * 100.0, 2);
                if value_pct > min_value_pct {
                    let stake = kelly_stake(prob, odds, self.config.kelly_fraction);
                    Some(ValueOpportunity {
                        label,
                        prob,
                        odds,
                        value_pct,
                        suggested_stake_pct: probs::round(stake * 100.0, 2),
                    })
                } else {
                    None
                }
            })
            .collect();
        opportunities.sort_by(|a, b| b.value_pct.total_cmp(&a.value_pct));
        debug!("found {} opportunities in {} markets", opportunities.len(), odds.len());
        opportunities
    }
}

impl LabelledProbs for OutcomeEstimate {
    fn prob(&self, label: MarketLabel) -> f64 {
        match label {
            MarketLabel::Home => self.home_win,
            MarketLabel::Draw => self.draw,
            MarketLabel::Away => self.away_win,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::ThreeWay;
    use assert_float_eq::*;

    #[test]
    fn value_of_prices() {
        assert_float_absolute_eq!(0.365, value(0.65, 2.1));
        assert_float_absolute_eq!(-0.32, value(0.2, 3.4));
        assert_eq!(0.0, value(0.9, 1.0));
        assert_eq!(0.0, value(0.9, 0.5));
    }

    #[test]
    fn kelly_stake_sizing() {
        // (0.65·2.1 − 1)/1.1 = 0.331818...
        assert_float_absolute_eq!(0.331818, kelly_stake(0.65, 2.1, 1.0), 1e-6);
        assert_float_absolute_eq!(0.082955, kelly_stake(0.65, 2.1, 0.25), 1e-6);
        assert_eq!(0.0, kelly_stake(0.5, 2.0, 0.25));
        assert_eq!(0.0, kelly_stake(0.2, 3.4, 0.25));
        assert_eq!(0.0, kelly_stake(0.0, 3.4, 0.25));
        assert_eq!(0.0, kelly_stake(0.7, 1.0, 0.25));
    }

    #[test]
    fn kelly_stake_never_negative() {
        for prob in [0.01, 0.1, 0.3, 0.5, 0.7, 0.99] {
            for odds in [0.5, 1.0, 1.01, 1.5, 2.0, 4.0, 10.0] {
                let stake = kelly_stake(prob, odds, 0.25);
                assert!(stake >= 0.0);
                if prob * odds <= 1.0 {
                    assert_eq!(0.0, stake, "prob: {prob}, odds: {odds}");
                }
            }
        }
    }

    #[test]
    fn favourite_with_value() {
        let analyzer = ValueAnalyzer::default();
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.65, 0.20, 0.15),
            &MarketOdds::new(2.10, 3.40, 4.50),
        );
        assert_eq!(1, opportunities.len());
        let opportunity = &opportunities[0];
        assert_eq!(MarketLabel::Home, opportunity.label);
        assert_eq!(36.5, opportunity.value_pct);
        assert_eq!(8.3, opportunity.suggested_stake_pct);
        assert_eq!(2.1, opportunity.odds);
    }

    #[test]
    fn threshold_is_exclusive() {
        let analyzer = ValueAnalyzer::default();
        // evens on 0.5 and 4.0 on 0.25 carry no value; 4.4 on 0.25 is worth 10%
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.5, 0.25, 0.25),
            &MarketOdds::new(2.0, 4.4, 4.0),
        );
        assert_eq!(1, opportunities.len());
        assert_eq!(MarketLabel::Draw, opportunities[0].label);
        for opportunity in &opportunities {
            assert!(opportunity.value_pct > 5.0);
        }
    }

    #[test]
    fn value_just_above_threshold_is_rejected_after_rounding() {
        let analyzer = ValueAnalyzer::default();
        // 0.525·2.0 − 1 lands a hair above 0.05 in floating point
        assert!(value(0.525, 2.0) > 0.05);
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.525, 0.2, 0.275),
            &MarketOdds::new(2.0, 1.5, 1.5),
        );
        assert!(opportunities.is_empty(), "{opportunities:?}");
    }

    #[test]
    fn sorted_by_descending_value() {
        let analyzer = ValueAnalyzer::default();
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.40, 0.30, 0.30),
            &MarketOdds::new(2.8, 4.0, 3.6),
        );
        let labels: Vec<_> = opportunities.iter().map(|opportunity| opportunity.label).collect();
        assert_eq!(vec![MarketLabel::Draw, MarketLabel::Home, MarketLabel::Away], labels);
        for pair in opportunities.windows(2) {
            assert!(pair[0].value_pct >= pair[1].value_pct);
        }
    }

    #[test]
    fn ties_keep_market_order() {
        let analyzer = ValueAnalyzer::default();
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.4, 0.2, 0.4),
            &MarketOdds::new(3.0, 2.0, 3.0),
        );
        let labels: Vec<_> = opportunities.iter().map(|opportunity| opportunity.label).collect();
        assert_eq!(vec![MarketLabel::Home, MarketLabel::Away], labels);
    }

    #[test]
    fn unquoted_labels_are_skipped() {
        let analyzer = ValueAnalyzer::default();
        let odds = MarketOdds::from_iter([(MarketLabel::Away, 9.0)]);
        let opportunities = analyzer.find_opportunities(&ThreeWay::new(0.5, 0.2, 0.3), &odds);
        assert_eq!(1, opportunities.len());
        assert_eq!(MarketLabel::Away, opportunities[0].label);
        assert!(analyzer.find_opportunities(&ThreeWay::new(0.5, 0.2, 0.3), &MarketOdds::default()).is_empty());
    }

    #[test]
    fn degenerate_odds_carry_no_value() {
        let analyzer = ValueAnalyzer::default();
        let opportunities = analyzer.find_opportunities(
            &ThreeWay::new(0.9, 0.05, 0.05),
            &MarketOdds::new(1.0, 0.8, -2.0),
        );
        assert!(opportunities.is_empty());
    }
}
