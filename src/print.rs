//! Console tables for estimates, opportunities and reports.

use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::backtest::SimulationSummary;
use crate::calibrator::ComparisonRow;
use crate::display::DisplayPercent;
use crate::domain::OutcomeEstimate;
use crate::ensemble::FeatureImportance;
use crate::scoregrid::ScoreGrid;
use crate::training::TrainingReport;
use crate::value::ValueOpportunity;

fn key_value_table(title: &str, rows: Vec<(String, String)>) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)).with(Separator(true)),
            vec![title.into(), "".into()],
        ));
    for (key, value) in rows {
        table.push_row(Row::new(Styles::default(), vec![key.into(), value.into()]));
    }
    table
}

pub fn tabulate_estimate(estimate: &OutcomeEstimate) -> Table {
    key_value_table(
        &format!("Match {}", estimate.match_id),
        vec![
            ("λ home".into(), format!("{:.2}", estimate.home_lambda)),
            ("λ away".into(), format!("{:.2}", estimate.away_lambda)),
            ("Home win".into(), DisplayPercent(estimate.home_win).to_string()),
            ("Draw".into(), DisplayPercent(estimate.draw).to_string()),
            ("Away win".into(), DisplayPercent(estimate.away_win).to_string()),
            ("Expected goals".into(), format!("{:.2}", estimate.expected_total_goals)),
            ("Both teams to score".into(), DisplayPercent(estimate.both_teams_to_score).to_string()),
            ("Most likely score".into(), estimate.most_likely_score.to_string()),
            ("Corners".into(), estimate.corners.to_string()),
            ("Cards".into(), estimate.cards.to_string()),
            ("Shots".into(), estimate.shots.to_string()),
            ("Shots on target".into(), estimate.shots_on_target.to_string()),
            ("Confidence".into(), DisplayPercent(estimate.confidence).to_string()),
        ],
    )
}

/// Home goals down the rows, away goals across the columns.
pub fn tabulate_scoregrid(grid: &ScoreGrid) -> Table {
    let matrix = grid.matrix();
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![Col::new(
                Styles::default().with(Separator(true)).with(MinWidth(6)).with(HAlign::Centred),
            )];
            for _ in 0..matrix.cols() {
                cols.push(Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)));
            }
            cols
        })
        .with_row({
            let mut header_cells = vec!["H \\ A".into()];
            for away in 0..matrix.cols() {
                header_cells.push(format!("{away}").into());
            }
            Row::new(Styles::default().with(Header(true)).with(Separator(true)), header_cells)
        });

    for home in 0..matrix.rows() {
        let mut row_cells = vec![format!("{home}").into()];
        for away in 0..matrix.cols() {
            row_cells.push(format!("{:.4}", matrix[(home, away)]).into());
        }
        table.push_row(Row::new(Styles::default(), row_cells));
    }
    table
}

pub fn tabulate_opportunities(opportunities: &[ValueOpportunity]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)).with(Separator(true)),
            vec!["Market".into(), "Probability".into(), "Odds".into(), "Value %".into(), "Stake %".into()],
        ));
    for opportunity in opportunities {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                opportunity.label.to_string().into(),
                format!("{:.4}", opportunity.prob).into(),
                format!("{:.2}", opportunity.odds).into(),
                format!("{:.2}", opportunity.value_pct).into(),
                format!("{:.2}", opportunity.suggested_stake_pct).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_comparison(rows: &[ComparisonRow]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(12)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Left)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)).with(Separator(true)),
            vec!["Market".into(), "Predicted".into(), "Actual".into(), "Status".into()],
        ));
    for row in rows {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                row.market.to_string().into(),
                row.predicted.clone().into(),
                row.actual.clone().into(),
                row.status.to_string().into(),
            ],
        ));
    }
    table
}

pub fn tabulate_training(report: &TrainingReport, importances: &[FeatureImportance]) -> Table {
    let mut rows = vec![
        ("Samples".into(), report.samples.to_string()),
        ("Accuracy".into(), format!("{:.4}", report.metrics.accuracy)),
        ("F1 (weighted)".into(), format!("{:.4}", report.metrics.f1)),
        ("AUC-ROC".into(), format!("{:.4}", report.metrics.auc_roc)),
        (
            "CV accuracy".into(),
            format!("{:.4} ± {:.4}", report.cross_validation.mean, report.cross_validation.std),
        ),
    ];
    rows.extend(
        importances
            .iter()
            .map(|importance| (format!("↳ {}", importance.name), format!("{:.4}", importance.importance))),
    );
    key_value_table("Training", rows)
}

pub fn tabulate_simulation(summary: &SimulationSummary) -> Table {
    key_value_table(
        "Simulation",
        vec![
            ("Final balance".into(), format!("{:.2}", summary.final_balance)),
            ("ROI %".into(), format!("{:.2}", summary.roi)),
            ("Bets".into(), summary.total_bets.to_string()),
            ("Win rate %".into(), format!("{:.2}", summary.win_rate)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use stanza::renderer::console::Console;
    use stanza::renderer::Renderer;

    use super::*;
    use crate::market::MarketLabel;

    #[test]
    fn scoregrid_has_header_and_rows() {
        let grid = ScoreGrid::poisson(1.2, 0.9, 3);
        let table = tabulate_scoregrid(&grid);
        assert_eq!(5, table.num_rows());
        assert_eq!(5, table.num_cols());
    }

    #[test]
    fn opportunities_render_labels() {
        let opportunities = vec![ValueOpportunity {
            label: MarketLabel::Draw,
            prob: 0.4,
            odds: 2.8,
            value_pct: 12.0,
            suggested_stake_pct: 6.67,
        }];
        let rendered = Console::default().render(&tabulate_opportunities(&opportunities)).to_string();
        assert!(rendered.contains("Value %"), "{rendered}");
        assert!(rendered.contains("12.00"), "{rendered}");
    }
}
