//! Render-ready snapshots of a match.
//!
//! Nothing here draws; a front end turns a [`RenderFrame`] into pixels or
//! terminal cells.

use glam::Vec2;

use crate::avatar::Avatar;
use crate::entities::{BossPhase, Difficulty, HostileBullet, MatchState, Phase, Rgb, Skin};
use crate::field::BulletField;

const BULLET_ALPHA: f32 = 0.9;
/// Hit flash alternates every this many milliseconds.
const FLASH_SLOT_MS: f32 = 50.0;
/// Invincibility blink alternates every this many milliseconds.
const BLINK_SLOT_MS: f32 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct BulletSprite {
    pub id: u64,
    pub lines: Vec<String>,
    /// Top-left of the text block.
    pub position: Vec2,
    pub font_px: f32,
    pub color: Rgb,
    pub alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AvatarSprite {
    pub position: Vec2,
    pub size: f32,
    pub heading: f32,
    pub skin: Skin,
    /// False on the off-beat of the invincibility blink.
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HpBarKind {
    Rare,
    Boss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HpBar {
    pub kind: HpBarKind,
    pub hp: u32,
    pub max_hp: u32,
    pub ratio: f32,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    pub score: u64,
    pub lives: u32,
    pub kills: u32,
    pub difficulty: Difficulty,
    pub phase: Phase,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub bullets: Vec<BulletSprite>,
    pub avatar: Option<AvatarSprite>,
    pub shots: Vec<Vec2>,
    pub hp_bars: Vec<HpBar>,
    /// Milliseconds into the boss warning, while it is showing.
    pub boss_warning_ms: Option<f32>,
    pub hud: Hud,
}

pub fn bullet_sprite(bullet: &HostileBullet, base_font_px: f32) -> BulletSprite {
    let flashing =
        bullet.hit_flash_ms > 0.0 && (bullet.hit_flash_ms / FLASH_SLOT_MS).floor() as u32 % 2 == 0;
    BulletSprite {
        id: bullet.id,
        lines: bullet.lines.clone(),
        position: bullet.position,
        font_px: base_font_px * bullet.size,
        color: if flashing { Rgb::WHITE } else { bullet.color },
        alpha: if flashing { 1.0 } else { BULLET_ALPHA },
    }
}

pub fn avatar_sprite(avatar: &Avatar) -> AvatarSprite {
    let visible = !avatar.is_invincible()
        || (avatar.invincible_ms / BLINK_SLOT_MS).floor() as u32 % 2 == 1;
    AvatarSprite {
        position: avatar.position,
        size: avatar.size,
        heading: avatar.heading,
        skin: avatar.skin,
        visible,
    }
}

fn hp_bar(kind: HpBarKind, bullet: &HostileBullet) -> HpBar {
    let ratio = if bullet.max_hp == 0 {
        0.0
    } else {
        bullet.hp as f32 / bullet.max_hp as f32
    };
    let color = if ratio > 0.5 {
        Rgb::GREEN
    } else if ratio > 0.25 {
        Rgb::YELLOW
    } else {
        Rgb::RED
    };
    HpBar {
        kind,
        hp: bullet.hp,
        max_hp: bullet.max_hp,
        ratio,
        color,
    }
}

/// HP bars for the first rare bullet and the boss, in that order.
pub fn hp_bars(field: &BulletField) -> Vec<HpBar> {
    let rare = field.rare().map(|b| hp_bar(HpBarKind::Rare, b));
    let boss = field.boss().map(|b| hp_bar(HpBarKind::Boss, b));
    rare.into_iter().chain(boss).collect()
}

pub fn build_frame(
    state: &MatchState,
    field: &BulletField,
    avatar: Option<&Avatar>,
    boss_warning_ms: f32,
    base_font_px: f32,
) -> RenderFrame {
    RenderFrame {
        bullets: field
            .bullets()
            .iter()
            .map(|b| bullet_sprite(b, base_font_px))
            .collect(),
        avatar: avatar.map(avatar_sprite),
        shots: avatar
            .map(|a| a.bullets.iter().map(|s| s.position).collect())
            .unwrap_or_default(),
        hp_bars: hp_bars(field),
        boss_warning_ms: (state.boss_phase == BossPhase::Warning).then_some(boss_warning_ms),
        hud: Hud {
            score: state.score,
            lives: state.lives,
            kills: state.kill_count,
            difficulty: state.difficulty,
            phase: state.phase,
        },
    }
}
