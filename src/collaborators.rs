//! Interfaces to the world outside the simulation: where comments come from
//! and where results are kept.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::achievements::{self, Achievement, Reward};
use crate::avatar::SKINS;
use crate::entities::{Comment, Difficulty, MatchOutcome};

// ── Comment sources ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CommentSourceError {
    #[error("failed to read comments from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed comment list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("comment source unavailable: {0}")]
    Unavailable(String),
}

pub trait CommentSource {
    fn fetch(&mut self) -> Result<Vec<Comment>, CommentSourceError>;
}

/// A fixed, in-memory comment list.
#[derive(Clone, Debug, Default)]
pub struct StaticComments(pub Vec<Comment>);

impl CommentSource for StaticComments {
    fn fetch(&mut self) -> Result<Vec<Comment>, CommentSourceError> {
        Ok(self.0.clone())
    }
}

/// A JSON array of comments on disk, read on every fetch.
#[derive(Clone, Debug)]
pub struct JsonFileComments {
    path: PathBuf,
}

impl JsonFileComments {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileComments { path: path.into() }
    }
}

impl CommentSource for JsonFileComments {
    fn fetch(&mut self) -> Result<Vec<Comment>, CommentSourceError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CommentSourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage record is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unknown record `{0}`")]
    UnknownRecord(String),
}

/// Lifetime statistics across matches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameStats {
    pub total_games: u64,
    pub total_score: u64,
    pub total_kills: u64,
    pub best_score: u64,
    pub consecutive_clears: u32,
    pub difficulty_clears: BTreeMap<Difficulty, u32>,
    pub no_damage_clears: u32,
}

impl GameStats {
    pub fn record(&mut self, score: u64, kills: u32, cleared: bool, difficulty: Difficulty, no_damage: bool) {
        self.total_games += 1;
        self.total_score += score;
        self.total_kills += u64::from(kills);
        self.best_score = self.best_score.max(score);
        if cleared {
            self.consecutive_clears += 1;
            *self.difficulty_clears.entry(difficulty).or_insert(0) += 1;
            if no_damage {
                self.no_damage_clears += 1;
            }
        } else {
            self.consecutive_clears = 0;
        }
    }
}

pub trait Persistence {
    fn get_high_score(&self) -> Result<u64, PersistenceError>;
    /// Returns true when `score` is a new record.
    fn set_high_score(&mut self, score: u64) -> Result<bool, PersistenceError>;
    fn get_coins(&self) -> Result<u64, PersistenceError>;
    /// Returns the new balance.
    fn add_coins(&mut self, amount: u64) -> Result<u64, PersistenceError>;
    /// Returns false, leaving the balance alone, if it is below `amount`.
    fn spend_coins(&mut self, amount: u64) -> Result<bool, PersistenceError>;
    fn get_unlocked_skins(&self) -> Result<Vec<String>, PersistenceError>;
    /// Returns false if it was already unlocked.
    fn unlock_skin(&mut self, id: &str) -> Result<bool, PersistenceError>;
    fn get_selected_skin(&self) -> Result<String, PersistenceError>;
    fn set_selected_skin(&mut self, id: &str) -> Result<(), PersistenceError>;
    fn get_achievements(&self) -> Result<Vec<String>, PersistenceError>;
    /// Returns false if it was already unlocked.
    fn unlock_achievement(&mut self, id: &str) -> Result<bool, PersistenceError>;
    fn get_game_stats(&self) -> Result<GameStats, PersistenceError>;
    fn update_game_stats(
        &mut self,
        score: u64,
        kills: u32,
        cleared: bool,
        difficulty: Difficulty,
        no_damage: bool,
    ) -> Result<GameStats, PersistenceError>;
}

/// Everything a [`Persistence`] implementation keeps, as one record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryStore {
    pub high_score: u64,
    pub coins: u64,
    pub unlocked_skins: BTreeSet<String>,
    pub selected_skin: String,
    pub achievements: BTreeSet<String>,
    pub stats: GameStats,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            high_score: 0,
            coins: 0,
            unlocked_skins: BTreeSet::from(["default".to_string()]),
            selected_skin: "default".to_string(),
            achievements: BTreeSet::new(),
            stats: GameStats::default(),
        }
    }
}

impl MemoryStore {
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MemoryStore::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Persistence for MemoryStore {
    fn get_high_score(&self) -> Result<u64, PersistenceError> {
        Ok(self.high_score)
    }

    fn set_high_score(&mut self, score: u64) -> Result<bool, PersistenceError> {
        if score > self.high_score {
            self.high_score = score;
            return Ok(true);
        }
        Ok(false)
    }

    fn get_coins(&self) -> Result<u64, PersistenceError> {
        Ok(self.coins)
    }

    fn add_coins(&mut self, amount: u64) -> Result<u64, PersistenceError> {
        self.coins = self.coins.saturating_add(amount);
        Ok(self.coins)
    }

    fn spend_coins(&mut self, amount: u64) -> Result<bool, PersistenceError> {
        if self.coins < amount {
            tracing::debug!(needed = amount, held = self.coins, "not enough coins");
            return Ok(false);
        }
        self.coins -= amount;
        Ok(true)
    }

    fn get_unlocked_skins(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.unlocked_skins.iter().cloned().collect())
    }

    fn unlock_skin(&mut self, id: &str) -> Result<bool, PersistenceError> {
        if id.is_empty() {
            return Err(PersistenceError::UnknownRecord(id.to_string()));
        }
        Ok(self.unlocked_skins.insert(id.to_string()))
    }

    fn get_selected_skin(&self) -> Result<String, PersistenceError> {
        Ok(self.selected_skin.clone())
    }

    fn set_selected_skin(&mut self, id: &str) -> Result<(), PersistenceError> {
        if id.is_empty() {
            return Err(PersistenceError::UnknownRecord(id.to_string()));
        }
        self.selected_skin = id.to_string();
        Ok(())
    }

    fn get_achievements(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.achievements.iter().cloned().collect())
    }

    fn unlock_achievement(&mut self, id: &str) -> Result<bool, PersistenceError> {
        if id.is_empty() {
            return Err(PersistenceError::UnknownRecord(id.to_string()));
        }
        Ok(self.achievements.insert(id.to_string()))
    }

    fn get_game_stats(&self) -> Result<GameStats, PersistenceError> {
        Ok(self.stats.clone())
    }

    fn update_game_stats(
        &mut self,
        score: u64,
        kills: u32,
        cleared: bool,
        difficulty: Difficulty,
        no_damage: bool,
    ) -> Result<GameStats, PersistenceError> {
        self.stats.record(score, kills, cleared, difficulty, no_damage);
        Ok(self.stats.clone())
    }
}

/// Push a finished match into the store and return the achievements it
/// unlocked. Failures are logged, never returned: the match has already
/// ended either way.
pub fn record_outcome(store: &mut dyn Persistence, outcome: &MatchOutcome) -> Vec<&'static Achievement> {
    let unlocked = unlock_achievements(store, outcome);
    match store.set_high_score(outcome.score) {
        Ok(true) => tracing::info!(score = outcome.score, "new high score"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "failed to store high score"),
    }
    match store.add_coins(outcome.coins_earned) {
        Ok(total) => tracing::debug!(earned = outcome.coins_earned, total, "coins added"),
        Err(e) => tracing::warn!(error = %e, "failed to add coins"),
    }
    if let Err(e) = store.update_game_stats(
        outcome.score,
        outcome.kills,
        outcome.cleared,
        outcome.difficulty,
        outcome.no_damage,
    ) {
        tracing::warn!(error = %e, "failed to update game stats");
    }
    unlocked
}

/// Runs before the match is added to the stats.
fn unlock_achievements(store: &mut dyn Persistence, outcome: &MatchOutcome) -> Vec<&'static Achievement> {
    let before = match store.get_game_stats() {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read game stats, skipping achievements");
            return Vec::new();
        }
    };
    let held = match store.get_achievements() {
        Ok(held) => held,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read achievements, skipping achievements");
            return Vec::new();
        }
    };

    let mut unlocked = Vec::new();
    for achievement in achievements::newly_earned(&before, outcome, &held) {
        if let Err(e) = store.unlock_achievement(achievement.id) {
            tracing::warn!(error = %e, achievement = achievement.id, "failed to unlock achievement");
            continue;
        }
        let granted = match achievement.reward {
            Reward::Coins(amount) => store.add_coins(amount).map(|_| ()),
            Reward::Skin(id) => store.unlock_skin(id).map(|_| ()),
        };
        if let Err(e) = granted {
            tracing::warn!(error = %e, achievement = achievement.id, "failed to grant reward");
        }
        tracing::info!(achievement = achievement.id, name = achievement.name, "achievement unlocked");
        unlocked.push(achievement);
    }
    unlocked
}

// ── Skins ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purchase {
    Bought { balance: u64 },
    AlreadyOwned,
    /// `short` more coins are needed.
    TooExpensive { short: u64 },
    UnknownSkin,
}

/// Bought, or earned through the skin's achievement.
pub fn owns_skin(store: &dyn Persistence, id: &str) -> Result<bool, PersistenceError> {
    let Some(skin) = SKINS.iter().find(|s| s.id == id) else {
        return Ok(false);
    };
    if skin.cost == 0 || store.get_unlocked_skins()?.iter().any(|s| s == id) {
        return Ok(true);
    }
    Ok(match skin.achievement {
        Some(achievement) => store.get_achievements()?.iter().any(|a| a == achievement),
        None => false,
    })
}

pub fn purchase_skin(store: &mut dyn Persistence, id: &str) -> Result<Purchase, PersistenceError> {
    let Some(skin) = SKINS.iter().find(|s| s.id == id) else {
        return Ok(Purchase::UnknownSkin);
    };
    if owns_skin(store, id)? {
        return Ok(Purchase::AlreadyOwned);
    }
    if !store.spend_coins(skin.cost)? {
        let short = skin.cost.saturating_sub(store.get_coins()?);
        return Ok(Purchase::TooExpensive { short });
    }
    store.unlock_skin(id)?;
    let balance = store.get_coins()?;
    tracing::info!(skin = id, cost = skin.cost, balance, "skin bought");
    Ok(Purchase::Bought { balance })
}

/// Select an owned skin. Returns false, keeping the old selection, if
/// the skin is not owned.
pub fn equip_skin(store: &mut dyn Persistence, id: &str) -> Result<bool, PersistenceError> {
    if !owns_skin(store, id)? {
        tracing::warn!(skin = id, "skin not owned, keeping current selection");
        return Ok(false);
    }
    store.set_selected_skin(id)?;
    Ok(true)
}
