//! The player-controlled avatar and its auto-firing shots.

use std::f32::consts::PI;

use glam::Vec2;

use crate::config::{GameConfig, NOMINAL_FRAME_MS};
use crate::entities::{Bounds, InputModality, InputState, PlayerBullet, Rgb, Skin, SkinShape};

/// Total angle of the shot fan.
const FAN_SPREAD: f32 = PI / 6.0;
/// Pointer seeking stops inside this radius.
const POINTER_DEADZONE: f32 = 5.0;
/// Shots are dropped this far past the surface edge.
const SHOT_MARGIN: f32 = 50.0;

// ── Skins ─────────────────────────────────────────────────────────────────────

pub const SKINS: &[Skin] = &[
    Skin {
        id: "default",
        name: "Classic Green",
        color: Rgb::GREEN,
        shape: SkinShape::Triangle,
        cost: 0,
        achievement: None,
    },
    Skin {
        id: "red_triangle",
        name: "Crimson Blade",
        color: Rgb::RED,
        shape: SkinShape::Triangle,
        cost: 500,
        achievement: Some("score_10000"),
    },
    Skin {
        id: "gold_star",
        name: "Golden Star",
        color: Rgb::GOLD,
        shape: SkinShape::Star,
        cost: 1000,
        achievement: Some("clear_hell"),
    },
];

/// Look up a skin by id, falling back to `default` for unknown ids.
pub fn skin_by_id(id: &str) -> Skin {
    match SKINS.iter().find(|s| s.id == id) {
        Some(skin) => *skin,
        None => {
            tracing::warn!(skin = id, "unknown skin, using default");
            SKINS[0]
        }
    }
}

// ── Avatar ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Avatar {
    /// Centre of the avatar.
    pub position: Vec2,
    pub size: f32,
    /// Pixels per nominal frame.
    pub speed: f32,
    /// Remaining invincibility; invincible while positive.
    pub invincible_ms: f32,
    pub max_shots: u32,
    pub bullets: Vec<PlayerBullet>,
    pub skin: Skin,
    /// Facing direction in radians, cosmetic.
    pub heading: f32,
    shoot_cooldown_ms: f32,
    fire_interval_ms: f32,
    invincible_duration_ms: f32,
    shot_speed: f32,
    shot_radius: f32,
    shot_cap: u32,
}

impl Avatar {
    pub fn new(position: Vec2, skin: Skin, config: &GameConfig) -> Self {
        Avatar {
            position,
            size: config.avatar_size,
            speed: config.avatar_speed,
            invincible_ms: 0.0,
            max_shots: 1,
            bullets: Vec::new(),
            skin,
            heading: 0.0,
            shoot_cooldown_ms: 0.0,
            fire_interval_ms: config.fire_interval_ms,
            invincible_duration_ms: config.invincible_ms,
            shot_speed: config.shot_speed,
            shot_radius: config.shot_radius,
            shot_cap: config.max_shots,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ms > 0.0
    }

    /// Advance one tick: invincibility, auto-fire, movement, then shots.
    pub fn update(&mut self, dt_ms: f32, input: &InputState, bounds: Bounds) {
        let frames = dt_ms / NOMINAL_FRAME_MS;

        if self.invincible_ms > 0.0 {
            self.invincible_ms = (self.invincible_ms - dt_ms).max(0.0);
        }

        self.shoot_cooldown_ms -= dt_ms;
        if self.shoot_cooldown_ms <= 0.0 {
            self.shoot();
            self.shoot_cooldown_ms = self.fire_interval_ms;
        }

        match input.modality {
            InputModality::Keyboard => self.steer(input, frames),
            InputModality::Pointer => {
                if let Some(target) = input.pointer {
                    self.seek(target, frames);
                }
            }
        }

        let half = self.size / 2.0;
        self.position.x = self.position.x.clamp(half, (bounds.width - half).max(half));
        self.position.y = self.position.y.clamp(half, (bounds.height - half).max(half));

        for shot in &mut self.bullets {
            shot.position += shot.velocity * frames;
        }
        self.bullets.retain(|b| {
            b.position.x >= -SHOT_MARGIN
                && b.position.x <= bounds.width + SHOT_MARGIN
                && b.position.y >= -SHOT_MARGIN
                && b.position.y <= bounds.height + SHOT_MARGIN
        });
    }

    /// Normalised eight-way movement.
    fn steer(&mut self, input: &InputState, frames: f32) {
        let mut dir = Vec2::ZERO;
        if input.up {
            dir.y -= 1.0;
        }
        if input.down {
            dir.y += 1.0;
        }
        if input.left {
            dir.x -= 1.0;
        }
        if input.right {
            dir.x += 1.0;
        }
        if dir != Vec2::ZERO {
            let dir = dir.normalize();
            self.position += dir * self.speed * frames;
            self.heading = dir.y.atan2(dir.x);
        }
    }

    /// Ease toward the pointer, slowing down as it gets close.
    fn seek(&mut self, target: Vec2, frames: f32) {
        let delta = target - self.position;
        let distance = delta.length();
        if distance > POINTER_DEADZONE {
            let step = self.speed.min(distance / 10.0) * frames;
            self.position += delta / distance * step.min(distance);
            self.heading = delta.y.atan2(delta.x);
        }
    }

    /// Fire `max_shots` shots in an evenly spaced fan to the right.
    pub fn shoot(&mut self) {
        let origin = Vec2::new(self.position.x + self.size / 2.0, self.position.y);
        for i in 0..self.max_shots {
            let angle = if self.max_shots > 1 {
                let step = FAN_SPREAD / (self.max_shots - 1) as f32;
                -FAN_SPREAD / 2.0 + step * i as f32
            } else {
                0.0
            };
            self.bullets.push(PlayerBullet {
                position: origin,
                velocity: Vec2::new(angle.cos(), angle.sin()) * self.shot_speed,
                radius: self.shot_radius,
                damage: 1,
            });
        }
    }

    /// Returns true when the hit landed; false while invincible.
    pub fn take_damage(&mut self) -> bool {
        if self.is_invincible() {
            return false;
        }
        self.invincible_ms = self.invincible_duration_ms;
        true
    }

    pub fn increase_bullets(&mut self) {
        self.max_shots = (self.max_shots + 1).min(self.shot_cap);
    }

    pub fn remove_bullet(&mut self, index: usize) {
        if index < self.bullets.len() {
            self.bullets.remove(index);
        }
    }
}
