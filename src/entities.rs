//! Game entity types. Pure data, no logic.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ── Comments & derived parameters ─────────────────────────────────────────────

/// One raw comment as delivered by a comment source.
///
/// Missing, null or wrongly typed fields deserialize to empty strings / zero
/// likes, so one odd entry never rejects the whole list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub author: String,
    #[serde(deserialize_with = "lenient::count")]
    pub like_count: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub published_at: String,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Numbers are kept as their decimal text; anything else is empty.
    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Non-negative numbers (saturating, fractions truncated) and numeric
    /// strings; anything else is zero.
    pub fn count<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
        let count = match Value::deserialize(de)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|v| *v > 0.0).map(|v| v as u64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        };
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

impl Comment {
    pub fn new(id: impl Into<String>, text: impl Into<String>, like_count: u32) -> Self {
        Comment {
            id: id.into(),
            text: text.into(),
            like_count,
            ..Comment::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Aggressive,
    Positive,
    Negative,
    Neutral,
    /// Never produced by the analyzer; marks the parameters of the boss spawn.
    Boss,
}

/// Movement pattern identifier chosen by the analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Straight,
    Wave,
    Spiral,
    Random,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const GREEN: Rgb = Rgb(0x00, 0xff, 0x00);
    pub const PURPLE: Rgb = Rgb(0xff, 0x00, 0xff);
    pub const GRAY: Rgb = Rgb(0x80, 0x80, 0x80);
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const YELLOW: Rgb = Rgb(0xff, 0xff, 0x00);
    pub const GOLD: Rgb = Rgb(0xff, 0xd7, 0x00);
}

/// Bullet category; governs HP formula, score value and kill side-effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    White,
    Green,
    Purple,
    Gray,
    Red,
}

impl ColorTier {
    /// Classify a final bullet colour. Anything unrecognised is white.
    pub fn from_color(color: Rgb) -> ColorTier {
        match color {
            Rgb::PURPLE => ColorTier::Purple,
            Rgb::GREEN => ColorTier::Green,
            Rgb::RED => ColorTier::Red,
            Rgb::GRAY => ColorTier::Gray,
            _ => ColorTier::White,
        }
    }
}

/// Everything the analyzer derives from a single comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulletParameters {
    pub emotion: Emotion,
    pub speed: f32,
    pub density: f32,
    pub size: f32,
    pub color: Rgb,
    pub hp: u32,
    pub pattern: Pattern,
    pub excitement_level: f32,
}

// ── Difficulty ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    /// The hardest tier: tracking bullets, bottom-decile pool, all-red palette.
    Hell,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Hell,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Hell => "hell",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorFilterPolicy {
    /// Every tier may spawn with its own colour.
    Standard,
    /// Gray/green/purple are suppressed and the rest is recoloured red.
    AllRed,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub speed_multiplier: f32,
    pub spawn_interval_ms: f32,
    pub track_player: bool,
    pub color_filter: ColorFilterPolicy,
    /// Restrict the spawn pool to the least-liked decile of comments.
    pub bottom_decile_only: bool,
    pub boss_threshold: u32,
    pub score_multiplier: u32,
}

// ── Hostile bullets ───────────────────────────────────────────────────────────

/// Sinusoidal vertical offset parameters, fixed when the bullet spawns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    /// Pixels per nominal frame at the sine peak.
    pub amplitude: f32,
    /// Radians per millisecond of pattern clock.
    pub frequency: f32,
}

/// State carried only by the boss.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BossState {
    /// Set once the inbound drift has reached the target x-band.
    pub reached_band: bool,
    pub shoot_timer_ms: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BulletKind {
    Normal,
    /// 3× velocity, never jitters.
    HighSpeed,
    /// One oversized glyph with doubled HP and score.
    Giant,
    Boss(BossState),
    BossAttack(Wave),
    MassEvent,
}

impl BulletKind {
    pub fn is_boss(&self) -> bool {
        matches!(self, BulletKind::Boss(_))
    }
}

/// How a comment bullet travels when it is not tracking the avatar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Straight,
    Wave(Wave),
}

/// HP value stored on invincible bullets.
pub const INVINCIBLE_HP: u32 = u32::MAX;

#[derive(Clone, Debug)]
pub struct HostileBullet {
    pub id: u64,
    pub source_comment_id: String,
    /// Text block, one entry per rendered line.
    pub lines: Vec<String>,
    pub kind: BulletKind,
    /// Top-left corner of the text block.
    pub position: Vec2,
    /// Pixels per nominal frame.
    pub velocity: Vec2,
    /// Font scale relative to the base font size.
    pub size: f32,
    pub color: Rgb,
    pub color_tier: ColorTier,
    pub hp: u32,
    pub max_hp: u32,
    pub score_value: u32,
    pub invincible: bool,
    pub pattern: Pattern,
    pub motion: Motion,
    pub pattern_clock_ms: f32,
    pub hit_flash_ms: f32,
}

impl HostileBullet {
    pub fn is_alive(&self) -> bool {
        self.invincible || self.hp > 0
    }
}

// ── Player side ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerBullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinShape {
    Triangle,
    Star,
}

/// Cosmetic avatar selector. No gameplay effect.
///
/// A skin is owned once bought for `cost` coins or once `achievement` (if
/// any) is unlocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Skin {
    pub id: &'static str,
    pub name: &'static str,
    pub color: Rgb,
    pub shape: SkinShape,
    pub cost: u64,
    pub achievement: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputModality {
    Keyboard,
    #[default]
    Pointer,
}

/// Snapshot of the input source for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub pointer: Option<Vec2>,
    pub modality: InputModality,
}

/// Pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

// ── Match state ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    GameOver,
    Cleared,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::GameOver | Phase::Cleared)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    NotSpawned,
    Warning,
    Active,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchState {
    pub phase: Phase,
    pub score: u64,
    pub lives: u32,
    pub kill_count: u32,
    pub boss_phase: BossPhase,
    pub consecutive_clears: u32,
    /// True until the avatar loses a life this match.
    pub no_damage: bool,
    pub difficulty: Difficulty,
    pub profile: DifficultyProfile,
}

/// Delivered to `on_finish` listeners when a match reaches a terminal phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub score: u64,
    pub cleared: bool,
    pub coins_earned: u64,
    pub difficulty: Difficulty,
    pub kills: u32,
    pub no_damage: bool,
}
