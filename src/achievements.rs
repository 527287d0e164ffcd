//! Achievement table and the end-of-match unlock check.
//!
//! Every check runs against the lifetime stats as they were *before* the
//! finished match was added, plus the match itself.

use crate::collaborators::GameStats;
use crate::entities::{Difficulty, MatchOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Single-match score.
    Score(u64),
    /// Lifetime kills including this match.
    Kills(u64),
    /// Cleared this difficulty.
    Clear(Difficulty),
    /// Cleared without losing HP.
    NoDamageClear,
    /// Clear streak including this match.
    ConsecutiveClears(u32),
    /// Matches played including this one.
    Games(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reward {
    Coins(u64),
    Skin(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: Condition,
    pub reward: Reward,
}

/// How far lifetime stats are toward an achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub progress: u64,
    pub max: u64,
    pub percentage: u8,
}

// ── Table ─────────────────────────────────────────────────────────────────────

const fn ach(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    condition: Condition,
    reward: Reward,
) -> Achievement {
    Achievement { id, name, description, condition, reward }
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    ach("score_10000", "Score Master", "Reach 10,000 points in a single game", Condition::Score(10_000), Reward::Skin("red_triangle")),
    ach("score_50000", "Score Legend", "Reach 50,000 points in a single game", Condition::Score(50_000), Reward::Coins(1000)),
    ach("score_300000", "Golden Table Manners", "Reach 300,000 points in a single game", Condition::Score(300_000), Reward::Coins(5000)),
    ach("kills_1000", "Enemy Slayer", "Defeat 1,000 enemies (cumulative)", Condition::Kills(1000), Reward::Coins(500)),
    ach("kills_5000", "Enemy Destroyer", "Defeat 5,000 enemies (cumulative)", Condition::Kills(5000), Reward::Coins(2000)),
    ach("kills_10000", "A Lonely Night", "Defeat 10,000 enemies (cumulative)", Condition::Kills(10_000), Reward::Coins(3000)),
    ach("kills_500000", "Golden Praise for You", "Defeat 500,000 enemies (cumulative)", Condition::Kills(500_000), Reward::Coins(50_000)),
    ach("clear_easy", "Easy Conqueror", "Clear Easy difficulty", Condition::Clear(Difficulty::Easy), Reward::Coins(100)),
    ach("clear_normal", "Normal Conqueror", "Clear Normal difficulty", Condition::Clear(Difficulty::Normal), Reward::Coins(300)),
    ach("clear_hard", "Hard Conqueror", "Clear Hard difficulty", Condition::Clear(Difficulty::Hard), Reward::Coins(500)),
    ach("clear_hell", "Hell Conqueror", "Clear Hell difficulty", Condition::Clear(Difficulty::Hell), Reward::Skin("gold_star")),
    ach("clear_no_damage", "Supreme Being", "Clear a game without taking damage", Condition::NoDamageClear, Reward::Coins(2000)),
    ach("consecutive_3", "Consistency King", "Clear 3 games in a row", Condition::ConsecutiveClears(3), Reward::Coins(300)),
    ach("consecutive_5", "Consistency God", "Clear 5 games in a row", Condition::ConsecutiveClears(5), Reward::Coins(800)),
    ach("consecutive_49", "Golden Full Course", "Clear 49 games in a row", Condition::ConsecutiveClears(49), Reward::Coins(10_000)),
    ach("games_10", "A Simple Greeting", "Play 10 games", Condition::Games(10), Reward::Coins(100)),
    ach("games_100", "Familiar Routine", "Play 100 games", Condition::Games(100), Reward::Coins(500)),
    ach("games_500", "Videos Are Meant to Play", "Play 500 games", Condition::Games(500), Reward::Coins(2000)),
    ach("games_1000", "Golden Danmaku King", "Play 1,000 games", Condition::Games(1000), Reward::Coins(5000)),
];

pub fn achievement_by_id(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

// ── Checks ────────────────────────────────────────────────────────────────────

impl Achievement {
    /// Whether `outcome`, on top of the pre-match `before` stats, earns this.
    pub fn is_met(&self, before: &GameStats, outcome: &MatchOutcome) -> bool {
        match self.condition {
            Condition::Score(threshold) => outcome.score >= threshold,
            Condition::Kills(threshold) => {
                before.total_kills + u64::from(outcome.kills) >= threshold
            }
            Condition::Clear(difficulty) => outcome.cleared && outcome.difficulty == difficulty,
            Condition::NoDamageClear => outcome.cleared && outcome.no_damage,
            Condition::ConsecutiveClears(threshold) => {
                let streak = if outcome.cleared { before.consecutive_clears + 1 } else { 0 };
                streak >= threshold
            }
            Condition::Games(threshold) => before.total_games + 1 >= threshold,
        }
    }

    /// Progress from lifetime stats alone. Unlocked achievements are full.
    pub fn progress(&self, stats: &GameStats, unlocked: bool) -> Progress {
        let (progress, max) = match self.condition {
            Condition::Score(threshold) => (stats.best_score, threshold),
            Condition::Kills(threshold) => (stats.total_kills, threshold),
            Condition::Clear(difficulty) => {
                let cleared = stats.difficulty_clears.get(&difficulty).copied().unwrap_or(0);
                (u64::from(cleared > 0), 1)
            }
            Condition::NoDamageClear => (u64::from(stats.no_damage_clears), 1),
            Condition::ConsecutiveClears(threshold) => {
                (u64::from(stats.consecutive_clears), u64::from(threshold))
            }
            Condition::Games(threshold) => (stats.total_games, threshold),
        };
        if unlocked {
            return Progress { progress: max, max, percentage: 100 };
        }
        let percentage = (progress.saturating_mul(100) / max.max(1)).min(100) as u8;
        Progress { progress, max, percentage }
    }
}

/// Achievements earned by `outcome` that are not in `unlocked` yet, in table
/// order.
pub fn newly_earned(
    before: &GameStats,
    outcome: &MatchOutcome,
    unlocked: &[String],
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !unlocked.iter().any(|id| id == a.id))
        .filter(|a| a.is_met(before, outcome))
        .collect()
}
