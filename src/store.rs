//! Persistent per-team bias factors and the calibration history.
//!
//! Stores are single-writer: every mutation rewrites the whole state, so two processes calibrating
//! against the same file will race and the last writer wins. Callers serialise access.

use std::collections::BTreeMap;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::Site;
use crate::estimator::SiteBiases;
use crate::file::{ReadJsonFile, WriteJsonFile};
use crate::probs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamFactors {
    pub home_bias: f64,
    pub away_bias: f64,
}
impl TeamFactors {
    pub fn get(&self, site: Site) -> f64 {
        match site {
            Site::Home => self.home_bias,
            Site::Away => self.away_bias,
        }
    }

    fn get_mut(&mut self, site: Site) -> &mut f64 {
        match site {
            Site::Home => &mut self.home_bias,
            Site::Away => &mut self.away_bias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub match_id: String,
    pub success: bool,
    pub detail: String,
}
impl HistoryEntry {
    pub fn now(match_id: impl Into<String>, success: bool, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            match_id: match_id.into(),
            success,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub hits: u64,
    pub misses: u64,
}
impl Stats {
    /// Fraction of processed results that were hits, or zero before any result.
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

/// Everything a store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    #[serde(default)]
    pub team_factors: BTreeMap<String, TeamFactors>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub stats: Stats,
}
impl CalibrationState {
    pub fn set(&mut self, team: &str, site: Site, value: f64) {
        *self.team_factors.entry(team.to_owned()).or_default().get_mut(site) = value;
    }

    /// Adds `delta` to the team's factor, rounding to four places. Returns the new factor.
    pub fn adjust(&mut self, team: &str, site: Site, delta: f64) -> f64 {
        let current = self.team_factors.get(team).map(|factors| factors.get(site)).unwrap_or_default();
        let value = probs::round(current + delta, 4);
        self.set(team, site, value);
        value
    }

    pub fn append_log(&mut self, entry: HistoryEntry) {
        self.stats.total += 1;
        if entry.success {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        self.history.push(entry);
    }
}

/// Keyed bias factors with an append-only history. Implementors supply access to the state and a
/// way to make it durable; every mutating operation flushes the complete state.
pub trait BiasFactorStore {
    fn state(&self) -> &CalibrationState;

    fn state_mut(&mut self) -> &mut CalibrationState;

    fn flush(&mut self) -> Result<(), StoreError>;

    /// Bias for the team at the given site; zero for teams never adjusted.
    fn get(&self, team: &str, site: Site) -> f64 {
        self.state()
            .team_factors
            .get(team)
            .map(|factors| factors.get(site))
            .unwrap_or_default()
    }

    /// Applies `change` to the state and flushes once. If the flush fails, the prior state is
    /// restored.
    fn update<R>(&mut self, change: impl FnOnce(&mut CalibrationState) -> R) -> Result<R, StoreError> {
        let snapshot = self.state().clone();
        let result = change(self.state_mut());
        if let Err(err) = self.flush() {
            *self.state_mut() = snapshot;
            return Err(err);
        }
        Ok(result)
    }

    fn set(&mut self, team: &str, site: Site, value: f64) -> Result<(), StoreError> {
        self.update(|state| state.set(team, site, value))
    }

    /// Adds `delta` to the team's factor, rounding to four places. Returns the new factor.
    fn adjust(&mut self, team: &str, site: Site, delta: f64) -> Result<f64, StoreError> {
        self.update(|state| state.adjust(team, site, delta))
    }

    /// Appends to the history and updates the hit/miss counters.
    fn append_log(&mut self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.update(|state| state.append_log(entry))
    }

    fn stats(&self) -> Stats {
        self.state().stats
    }

    fn factors(&self) -> &BTreeMap<String, TeamFactors> {
        &self.state().team_factors
    }

    fn history(&self) -> &[HistoryEntry] {
        &self.state().history
    }

    /// The home team's home factor and the away team's away factor.
    fn biases(&self, home_team: &str, away_team: &str) -> SiteBiases {
        SiteBiases {
            home: self.get(home_team, Site::Home),
            away: self.get(away_team, Site::Away),
        }
    }
}

/// Keeps the state in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: CalibrationState,
}
impl MemoryStore {
    pub fn new(state: CalibrationState) -> Self {
        Self { state }
    }
}

impl BiasFactorStore for MemoryStore {
    fn state(&self) -> &CalibrationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CalibrationState {
        &mut self.state
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Mirrors the state to a pretty-printed JSON file, rewritten in full on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: CalibrationState,
}
impl JsonFileStore {
    /// Loads the store at `path`. A missing or unparseable file yields an empty state, which is
    /// written out on the first mutation. Any other I/O failure is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match CalibrationState::read_json_file(&path) {
            Ok(state) => {
                debug!("loaded bias factors from {}", path.display());
                state
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no bias factors at {}; starting afresh", path.display());
                CalibrationState::default()
            }
            Err(err) if matches!(err.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) => {
                warn!("discarding unreadable bias factors at {}: {err}", path.display());
                CalibrationState::default()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BiasFactorStore for JsonFileStore {
    fn state(&self) -> &CalibrationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CalibrationState {
        &mut self.state
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.state.write_json_file(&self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
