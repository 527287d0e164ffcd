//! Tunable constants for a match, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Bounds, ColorFilterPolicy, Difficulty, DifficultyProfile};

/// Length of one nominal frame; per-frame velocities are scaled by
/// `dt / NOMINAL_FRAME_MS`.
pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    InvalidRange { field: &'static str, reason: String },
}

/// Clamping ranges applied to analyzer output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletLimits {
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_hp: u32,
    pub max_hp: u32,
    pub base_font_px: f32,
}

impl Default for BulletLimits {
    fn default() -> Self {
        BulletLimits {
            min_speed: 1.0,
            max_speed: 5.0,
            min_size: 0.5,
            max_size: 2.0,
            min_hp: 1,
            max_hp: 10,
            base_font_px: 16.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    pub easy: DifficultyProfile,
    pub normal: DifficultyProfile,
    pub hard: DifficultyProfile,
    pub hell: DifficultyProfile,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        let standard = |speed_multiplier, spawn_interval_ms, boss_threshold, score_multiplier| {
            DifficultyProfile {
                speed_multiplier,
                spawn_interval_ms,
                track_player: false,
                color_filter: ColorFilterPolicy::Standard,
                bottom_decile_only: false,
                boss_threshold,
                score_multiplier,
            }
        };
        DifficultyTable {
            easy: standard(0.7, 1200.0, 40, 1),
            normal: standard(1.0, 700.0, 60, 2),
            hard: standard(1.5, 450.0, 100, 3),
            hell: DifficultyProfile {
                speed_multiplier: 0.6,
                spawn_interval_ms: 450.0,
                track_player: true,
                color_filter: ColorFilterPolicy::AllRed,
                bottom_decile_only: true,
                boss_threshold: 100,
                score_multiplier: 3,
            },
        }
    }
}

impl DifficultyTable {
    pub fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
            Difficulty::Hell => self.hell,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub surface: Bounds,

    // ── Avatar ───────────────────────────────────────────────────────────────
    pub initial_lives: u32,
    pub max_lives: u32,
    pub avatar_speed: f32,
    pub avatar_size: f32,
    pub invincible_ms: f32,
    pub fire_interval_ms: f32,
    pub shot_speed: f32,
    pub shot_radius: f32,
    pub max_shots: u32,
    /// Every Nth kill adds one shot to the fan.
    pub power_up_every: u32,

    // ── Bullet field ─────────────────────────────────────────────────────────
    pub bullet_capacity: usize,
    /// Spawning pauses while this many bullets are on screen.
    pub spawn_ceiling: usize,
    pub spawn_probability: f64,
    pub hit_flash_ms: f32,
    pub out_of_bounds_margin: f32,
    pub limits: BulletLimits,

    // ── Scheduled events ─────────────────────────────────────────────────────
    pub boss_warning_ms: f32,
    pub boss_flood_interval_ms: f32,
    pub boss_flood_rows: usize,
    pub boss_shot_interval_ms: f32,
    pub mass_event_interval_ms: f32,
    pub mass_event_count: usize,

    // ── Comment pool ─────────────────────────────────────────────────────────
    /// Fewer real comments than this triggers synthesis.
    pub min_real_comments: usize,
    pub synthesized_count: usize,

    pub difficulties: DifficultyTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            surface: Bounds {
                width: 1280.0,
                height: 720.0,
            },
            initial_lives: 3,
            max_lives: 5,
            avatar_speed: 5.0,
            avatar_size: 20.0,
            invincible_ms: 2000.0,
            fire_interval_ms: 150.0,
            shot_speed: 10.0,
            shot_radius: 3.0,
            max_shots: 5,
            power_up_every: 10,
            bullet_capacity: 100,
            spawn_ceiling: 20,
            spawn_probability: 0.5,
            hit_flash_ms: 200.0,
            out_of_bounds_margin: 200.0,
            limits: BulletLimits::default(),
            boss_warning_ms: 3000.0,
            boss_flood_interval_ms: 5000.0,
            boss_flood_rows: 20,
            boss_shot_interval_ms: 1500.0,
            mass_event_interval_ms: 30_000.0,
            mass_event_count: 15,
            min_real_comments: 1,
            synthesized_count: 50,
            difficulties: DifficultyTable::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        self.difficulties.profile(difficulty)
    }

    /// Reject values the simulation cannot run with; warn on merely odd ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        if l.min_speed > l.max_speed {
            return Err(invalid("limits.min_speed", "exceeds limits.max_speed"));
        }
        if l.min_size > l.max_size {
            return Err(invalid("limits.min_size", "exceeds limits.max_size"));
        }
        if l.min_hp > l.max_hp {
            return Err(invalid("limits.min_hp", "exceeds limits.max_hp"));
        }
        if self.bullet_capacity == 0 {
            return Err(invalid("bullet_capacity", "must be at least 1"));
        }
        if self.initial_lives == 0 || self.initial_lives > self.max_lives {
            return Err(invalid("initial_lives", "must be in 1..=max_lives"));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(invalid("spawn_probability", "must be in 0..=1"));
        }
        if self.surface.width <= 0.0 || self.surface.height <= 0.0 {
            return Err(invalid("surface", "dimensions must be positive"));
        }
        for difficulty in Difficulty::ALL {
            if self.profile(difficulty).spawn_interval_ms <= 0.0 {
                return Err(invalid("difficulties", "spawn_interval_ms must be positive"));
            }
        }

        if self.bullet_capacity < 30 {
            tracing::warn!(
                capacity = self.bullet_capacity,
                "bullet_capacity is very small; boss floods will evict most of the field"
            );
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidRange {
        field,
        reason: reason.to_string(),
    }
}
