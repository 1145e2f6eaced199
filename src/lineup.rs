//! Checks a confirmed lineup against the squad the estimate was built on.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{KeyRole, LineupStatus, Player, Team};

/// A predicted starter with a key role who is absent from the confirmed lineup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingKeyPlayer {
    pub name: String,
    pub role: KeyRole,
}

/// Starters holding a key role whose names (compared case-insensitively) are not in `confirmed`.
pub fn validate(team: &Team, confirmed: &[impl AsRef<str>]) -> Vec<MissingKeyPlayer> {
    let confirmed: FxHashSet<_> = confirmed.iter().map(|name| name.as_ref().to_lowercase()).collect();
    team.players
        .iter()
        .filter(|player| player.status == LineupStatus::Starter)
        .filter_map(|player| player.key_role.map(|role| (player, role)))
        .filter(|(player, _)| !confirmed.contains(&player.name.to_lowercase()))
        .map(|(player, role)| {
            warn!("{}: key player {} ({role}) missing from the confirmed lineup", team.name, player.name);
            MissingKeyPlayer {
                name: player.name.clone(),
                role,
            }
        })
        .collect()
}

/// The highest-rated substitute playing the missing player's position. `None` if the player is not
/// in the squad or nobody on the bench fits.
pub fn suggest_replacement<'a>(team: &'a Team, missing: &str) -> Option<&'a Player> {
    let missing = team.players.iter().find(|player| player.name == missing)?;
    team.players
        .iter()
        .filter(|player| player.status == LineupStatus::Substitute && player.position == missing.position)
        .fold(None, |best: Option<&Player>, candidate| match best {
            Some(best) if best.rating >= candidate.rating => Some(best),
            _ => Some(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormMetrics, Position};

    fn player(name: &str, position: Position, status: LineupStatus, rating: f64, key_role: Option<KeyRole>) -> Player {
        Player {
            id: name.to_lowercase(),
            name: name.into(),
            position,
            status,
            rating,
            key_role,
            form: FormMetrics::default(),
        }
    }

    fn squad() -> Team {
        Team {
            name: "Rovers".into(),
            league: "Test".into(),
            players: vec![
                player("Keeper", Position::Goalkeeper, LineupStatus::Starter, 7.0, Some(KeyRole::Keeper)),
                player("Striker", Position::Forward, LineupStatus::Starter, 8.1, Some(KeyRole::Finisher)),
                player("Playmaker", Position::Midfielder, LineupStatus::Starter, 7.6, Some(KeyRole::Creator)),
                player("Workhorse", Position::Midfielder, LineupStatus::Starter, 6.5, None),
                player("Injured", Position::Forward, LineupStatus::Unavailable, 7.9, Some(KeyRole::Finisher)),
                player("Bench Forward", Position::Forward, LineupStatus::Substitute, 6.8, None),
                player("Better Bench Forward", Position::Forward, LineupStatus::Substitute, 7.2, None),
                player("Bench Mid", Position::Midfielder, LineupStatus::Substitute, 6.9, None),
            ],
            avg_xg_for: 1.5,
            avg_xg_against: 1.1,
        }
    }

    #[test]
    fn flags_missing_key_starters() {
        let missing = validate(&squad(), &["keeper", "PLAYMAKER", "Workhorse"]);
        assert_eq!(
            vec![MissingKeyPlayer {
                name: "Striker".into(),
                role: KeyRole::Finisher
            }],
            missing
        );
    }

    #[test]
    fn complete_lineup_passes() {
        let confirmed = vec!["Keeper".to_owned(), "Striker".to_owned(), "Playmaker".to_owned()];
        assert!(validate(&squad(), &confirmed).is_empty());
    }

    #[test]
    fn replacement_by_position_and_rating() {
        let team = squad();
        assert_eq!("Better Bench Forward", suggest_replacement(&team, "Striker").unwrap().name);
        assert_eq!("Bench Mid", suggest_replacement(&team, "Playmaker").unwrap().name);
        assert!(suggest_replacement(&team, "Keeper").is_none());
        assert!(suggest_replacement(&team, "Nobody").is_none());
    }
}
