//! Teams, matches and the estimates produced for them.

use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

use crate::display::DisplayRangeInclusive;
use crate::market::MarketOdds;

/// Rating assumed for a squad with no rated players.
pub const BASELINE_RATING: f64 = 7.0;

#[derive(Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("team name must not be empty")]
    MissingTeamName,

    #[error("match id must not be empty")]
    MissingMatchId,

    #[error("player {player} of {team} has rating {rating} outside 0..=10")]
    RatingOutOfRange { team: String, player: String, rating: f64 },
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, EnumString)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineupStatus {
    #[default]
    Starter,
    Substitute,
    Unavailable,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
pub enum KeyRole {
    Finisher,
    Creator,
    Anchor,
    Keeper,
    Tactician,
}

/// Offensive and defensive output over the recent form window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMetrics {
    pub expected_goals: f64,
    pub expected_assists: f64,
    /// Passes allowed per defensive action; lower means more intense pressing.
    pub pressing_intensity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub status: LineupStatus,
    /// Rolling form on a 0–10 scale; 0 means unrated.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub key_role: Option<KeyRole>,
    #[serde(default)]
    pub form: FormMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub players: Vec<Player>,
    /// Season average expected goals for; values ≤ 0.1 are treated as absent.
    #[serde(default)]
    pub avg_xg_for: f64,
    /// Season average expected goals against; values ≤ 0.1 are treated as absent.
    #[serde(default)]
    pub avg_xg_against: f64,
}
impl Team {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.name.trim().is_empty() {
            return Err(InvalidInput::MissingTeamName);
        }
        for player in &self.players {
            if !(0.0..=10.0).contains(&player.rating) {
                return Err(InvalidInput::RatingOutOfRange {
                    team: self.name.clone(),
                    player: player.name.clone(),
                    rating: player.rating,
                });
            }
        }
        Ok(())
    }

    /// Mean form rating over rated players, or [`BASELINE_RATING`] if nobody is rated.
    pub fn average_rating(&self) -> f64 {
        let (sum, count) = self
            .players
            .iter()
            .filter(|player| player.rating > 0.0)
            .fold((0.0, 0usize), |(sum, count), player| (sum + player.rating, count + 1));
        if count == 0 {
            BASELINE_RATING
        } else {
            sum / count as f64
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub temperature: f64,
    pub precipitation_mm: f64,
    pub wind_kmh: f64,
    pub humidity_pct: f64,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Strictness {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Referee {
    pub name: String,
    pub strictness: Strictness,
}

/// Which end of the fixture a team plays at.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, StrumDisplay, EnumString)]
pub enum Site {
    #[serde(rename = "LOCAL")]
    #[strum(serialize = "LOCAL")]
    Home,
    #[serde(rename = "VISITANTE")]
    #[strum(serialize = "VISITANTE")]
    Away,
}

/// Match result from the perspective of the fixture. The ordinal doubles as the class label fed
/// to the classifiers: 0 draw, 1 home, 2 away.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Ordinal, StrumDisplay, EnumString, EnumIter)]
pub enum Winner {
    #[serde(rename = "EMPATE")]
    #[strum(serialize = "EMPATE")]
    Draw,
    #[serde(rename = "LOCAL")]
    #[strum(serialize = "LOCAL")]
    Home,
    #[serde(rename = "VISITANTE")]
    #[strum(serialize = "VISITANTE")]
    Away,
}
impl Winner {
    pub const CLASSES: usize = 3;

    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(Winner::Draw),
            1 => Some(Winner::Home),
            2 => Some(Winner::Away),
            _ => None,
        }
    }

    pub fn from_score(score: &Score) -> Self {
        use std::cmp::Ordering;
        match score.home.cmp(&score.away) {
            Ordering::Greater => Winner::Home,
            Ordering::Equal => Winner::Draw,
            Ordering::Less => Winner::Away,
        }
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}
impl Score {
    pub fn new(home: u8, away: u8) -> Self {
        Self { home, away }
    }

    pub fn nil_all() -> Self {
        Self { home: 0, away: 0 }
    }

    pub fn total(&self) -> u16 {
        self.home as u16 + self.away as u16
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub id: String,
    pub home: Team,
    pub away: Team,
    #[serde(default)]
    pub conditions: Option<Conditions>,
    #[serde(default)]
    pub referee: Option<Referee>,
    #[serde(default)]
    pub market_odds: MarketOdds,
}
impl MatchContext {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.id.trim().is_empty() {
            return Err(InvalidInput::MissingMatchId);
        }
        self.home.validate()?;
        self.away.validate()
    }

    pub fn strictness(&self) -> Option<Strictness> {
        self.referee.as_ref().map(|referee| referee.strictness)
    }
}

/// A predicted band for a countable statistic, either for the match as a whole or split by side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePrediction {
    Total(RangeInclusive<u16>),
    Split {
        home: RangeInclusive<u16>,
        away: RangeInclusive<u16>,
    },
}
impl RangePrediction {
    /// The band for the match total; split bands are summed end-wise, saturating at `u16::MAX`.
    pub fn total(&self) -> RangeInclusive<u16> {
        match self {
            RangePrediction::Total(range) => range.clone(),
            RangePrediction::Split { home, away } => {
                home.start().saturating_add(*away.start())..=home.end().saturating_add(*away.end())
            }
        }
    }

    /// Recovers a prediction from free text such as `"8-10"` or `"🏠 4-6 | ✈️ 3-5"`. Four or more
    /// numbers are read as home and away bands, exactly two as a total band and any other positive
    /// count as a single-value band on the first number.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let numbers = extract_numbers(text);
        match numbers.len() {
            0 => None,
            2 => Some(RangePrediction::Total(numbers[0]..=numbers[1])),
            len if len >= 4 => Some(RangePrediction::Split {
                home: numbers[0]..=numbers[1],
                away: numbers[2]..=numbers[3],
            }),
            _ => Some(RangePrediction::Total(numbers[0]..=numbers[0])),
        }
    }
}

fn extract_numbers(text: &str) -> Vec<u16> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<u16>().unwrap_or(u16::MAX))
        .collect()
}

impl Display for RangePrediction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RangePrediction::Total(range) => write!(f, "{}", DisplayRangeInclusive::from(range)),
            RangePrediction::Split { home, away } => write!(
                f,
                "🏠 {} | ✈️ {}",
                DisplayRangeInclusive::from(home),
                DisplayRangeInclusive::from(away)
            ),
        }
    }
}

/// Home/away pair of a countable statistic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide {
    pub home: u16,
    pub away: u16,
}
impl PerSide {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }

    pub fn total(&self) -> u16 {
        self.home.saturating_add(self.away)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEstimate {
    pub match_id: String,
    pub home_lambda: f64,
    pub away_lambda: f64,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub expected_total_goals: f64,
    pub both_teams_to_score: f64,
    pub most_likely_score: Score,
    pub corners: RangePrediction,
    pub cards: RangePrediction,
    pub shots: RangePrediction,
    pub shots_on_target: RangePrediction,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealizedOutcome {
    pub match_id: String,
    pub score: Score,
    #[serde(default)]
    pub corners: PerSide,
    #[serde(default)]
    pub cards: PerSide,
    #[serde(default)]
    pub shots: PerSide,
    pub winner: Winner,
}
impl RealizedOutcome {
    /// An outcome whose winner is read off the final score.
    pub fn from_score(match_id: impl Into<String>, score: Score) -> Self {
        let winner = Winner::from_score(&score);
        Self {
            match_id: match_id.into(),
            score,
            corners: PerSide::default(),
            cards: PerSide::default(),
            shots: PerSide::default(),
            winner,
        }
    }
}
