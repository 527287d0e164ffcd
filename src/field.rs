//! The set of live hostile bullets: construction, movement and eviction.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::config::{GameConfig, NOMINAL_FRAME_MS};
use crate::entities::{
    BossState, Bounds, BulletKind, BulletParameters, ColorFilterPolicy, ColorTier, Comment,
    Difficulty, DifficultyProfile, Emotion, HostileBullet, Motion, Pattern, Rgb, Wave,
    INVINCIBLE_HP,
};

// ── Spawn tables ──────────────────────────────────────────────────────────────

const MAX_CHARS: usize = 50;
const MAX_BOSS_CHARS: usize = 100;
const LINE_CHARS: usize = 20;

const HIGH_SPEED_CHANCE: f32 = 0.05;
/// Cumulative with `HIGH_SPEED_CHANCE`: a 7% giant band follows it.
const GIANT_CHANCE: f32 = 0.12;
const GIANT_GLYPH: &str = "草";

const RARE_SCORE: u32 = 25_000;
const BOSS_SCORE: u32 = 250_000;
const BASE_SCORE: u32 = 50;

const COMMENT_WAVE: Wave = Wave {
    amplitude: 2.0,
    frequency: 0.004,
};

const MASS_EVENT_TEXTS: &[&str] = &["うおｗ", "やあ", "にょっす🐮✋"];
const BOSS_ATTACK_GLYPH: &str = "●";
const BOSS_VOLLEY: usize = 3;
/// Half of the ±30° volley spread.
const BOSS_AIM_JITTER: f32 = PI / 12.0;
/// Vertical offset of the boss muzzle per text line.
const BOSS_LINE_OFFSET: f32 = 20.0;

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum HitResult {
    /// Invincible bullet swallowed the shot.
    Absorbed,
    Damaged,
    Destroyed(HostileBullet),
}

#[derive(Debug)]
pub struct BulletField {
    bullets: VecDeque<HostileBullet>,
    bounds: Bounds,
    capacity: usize,
    margin: f32,
    boss_shot_interval_ms: f32,
    next_id: u64,
}

impl BulletField {
    pub fn new(config: &GameConfig) -> Self {
        BulletField {
            bullets: VecDeque::with_capacity(config.bullet_capacity),
            bounds: config.surface,
            capacity: config.bullet_capacity,
            margin: config.out_of_bounds_margin,
            boss_shot_interval_ms: config.boss_shot_interval_ms,
            next_id: 0,
        }
    }

    pub fn bullets(&self) -> &VecDeque<HostileBullet> {
        &self.bullets
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn clear(&mut self) {
        self.bullets.clear();
    }

    pub fn boss(&self) -> Option<&HostileBullet> {
        self.bullets.iter().find(|b| b.kind.is_boss())
    }

    /// First purple bullet on the field, the one whose HP bar is shown.
    pub fn rare(&self) -> Option<&HostileBullet> {
        self.bullets.iter().find(|b| b.color_tier == ColorTier::Purple)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Insert a bullet, evicting the oldest one once the field is full.
    pub fn add_bullet(&mut self, bullet: HostileBullet) -> Option<HostileBullet> {
        let evicted = if self.bullets.len() >= self.capacity {
            self.bullets.pop_front()
        } else {
            None
        };
        self.bullets.push_back(bullet);
        evicted
    }

    // ── Construction ─────────────────────────────────────────────────────────

    /// Build a bullet for `comment`. `None` when the difficulty's palette
    /// suppresses its colour tier.
    pub fn spawn(
        &mut self,
        comment: &Comment,
        params: &BulletParameters,
        difficulty: Difficulty,
        profile: &DifficultyProfile,
        rng: &mut impl Rng,
    ) -> Option<HostileBullet> {
        let is_boss = params.emotion == Emotion::Boss;
        let max_chars = if is_boss { MAX_BOSS_CHARS } else { MAX_CHARS };
        let text: String = comment.text.chars().take(max_chars).collect();
        let len = text.chars().count() as u32;
        let all_red = profile.color_filter == ColorFilterPolicy::AllRed;

        let tier = if is_boss {
            ColorTier::Red
        } else {
            ColorTier::from_color(params.color)
        };
        if is_suppressed(params, profile) {
            return None;
        }

        let mult = profile.score_multiplier;
        let mut color = params.color;
        let mut size = params.size;
        let mut invincible = false;
        let (mut hp, mut score_value) = if is_boss {
            color = Rgb::RED;
            size = params.size * 4.0;
            let hp = if difficulty == Difficulty::Hell {
                300 + len * 10
            } else {
                len * 10
            };
            (hp.max(1), BOSS_SCORE)
        } else {
            match tier {
                ColorTier::Gray => {
                    invincible = true;
                    (INVINCIBLE_HP, 0)
                }
                ColorTier::Purple => (len.max(1), RARE_SCORE),
                ColorTier::Green => (len.div_ceil(3).max(1), BASE_SCORE * mult),
                ColorTier::White | ColorTier::Red => (len.div_ceil(10).max(1), BASE_SCORE * mult),
            }
        };
        if all_red && !is_boss && !matches!(tier, ColorTier::Purple | ColorTier::Gray) {
            color = Rgb::RED;
        }

        let position = Vec2::new(
            self.bounds.width + 100.0,
            rng.gen_range(0.1_f32..0.9) * self.bounds.height,
        );
        let mut vx = -(params.speed * rng.gen_range(0.8_f32..1.2));
        let mut lines = wrap_lines(&text);
        let mut pattern = params.pattern;

        let kind = if is_boss {
            BulletKind::Boss(BossState::default())
        } else {
            let roll: f32 = rng.gen();
            if roll < HIGH_SPEED_CHANCE {
                vx *= 3.0;
                pattern = Pattern::Straight;
                tracing::debug!(comment = %comment.id, "high-speed bullet");
                BulletKind::HighSpeed
            } else if roll < GIANT_CHANCE {
                lines = vec![GIANT_GLYPH.to_string()];
                size *= 5.0;
                if !invincible {
                    hp = hp.saturating_mul(2);
                }
                score_value *= 2;
                tracing::debug!(comment = %comment.id, "giant bullet");
                BulletKind::Giant
            } else {
                BulletKind::Normal
            }
        };

        let motion = match pattern {
            Pattern::Wave => Motion::Wave(COMMENT_WAVE),
            Pattern::Straight | Pattern::Spiral | Pattern::Random => Motion::Straight,
        };

        Some(HostileBullet {
            id: self.next_id(),
            source_comment_id: comment.id.clone(),
            lines,
            kind,
            position,
            velocity: Vec2::new(vx, 0.0),
            size,
            color,
            color_tier: tier,
            hp,
            max_hp: hp,
            score_value,
            invincible,
            pattern,
            motion,
            pattern_clock_ms: 0.0,
            hit_flash_ms: 0.0,
        })
    }

    /// Emit the recurring wave of invincible filler bullets, evenly spread
    /// over the full height.
    pub fn spawn_mass_event(&mut self, count: usize, rng: &mut impl Rng) -> usize {
        let row = self.bounds.height / (count + 1) as f32;
        for i in 0..count {
            let text = MASS_EVENT_TEXTS[rng.gen_range(0..MASS_EVENT_TEXTS.len())];
            let bullet = HostileBullet {
                id: self.next_id(),
                source_comment_id: "mass_event".to_string(),
                lines: vec![text.to_string()],
                kind: BulletKind::MassEvent,
                position: Vec2::new(
                    self.bounds.width + 50.0 + rng.gen_range(0.0_f32..100.0),
                    row * (i + 1) as f32,
                ),
                velocity: Vec2::new(-rng.gen_range(3.0_f32..5.0), 0.0),
                size: 1.5,
                color: Rgb::GRAY,
                color_tier: ColorTier::Gray,
                hp: INVINCIBLE_HP,
                max_hp: INVINCIBLE_HP,
                score_value: 0,
                invincible: true,
                pattern: Pattern::Straight,
                motion: Motion::Straight,
                pattern_clock_ms: 0.0,
                hit_flash_ms: 0.0,
            };
            self.add_bullet(bullet);
        }
        tracing::debug!(count, "mass event");
        count
    }

    /// An invincible copy of the boss text entering at height `y`.
    pub fn spawn_boss_echo(
        &mut self,
        text: &str,
        y: f32,
        profile: &DifficultyProfile,
        rng: &mut impl Rng,
    ) {
        let color = match profile.color_filter {
            ColorFilterPolicy::AllRed => Rgb::RED,
            ColorFilterPolicy::Standard => Rgb::WHITE,
        };
        let bullet = HostileBullet {
            id: self.next_id(),
            source_comment_id: "boss_echo".to_string(),
            lines: wrap_lines(text),
            kind: BulletKind::Normal,
            position: Vec2::new(self.bounds.width + 100.0, y),
            velocity: Vec2::new(-rng.gen_range(2.0_f32..6.0), 0.0),
            size: 0.8,
            color,
            color_tier: ColorTier::White,
            hp: INVINCIBLE_HP,
            max_hp: INVINCIBLE_HP,
            score_value: 0,
            invincible: true,
            pattern: Pattern::Straight,
            motion: Motion::Straight,
            pattern_clock_ms: 0.0,
            hit_flash_ms: 0.0,
        };
        self.add_bullet(bullet);
    }

    fn boss_volley(&mut self, boss_at: Vec2, lines: usize, target: Vec2, rng: &mut impl Rng) {
        let origin = Vec2::new(boss_at.x, boss_at.y + lines as f32 * BOSS_LINE_OFFSET);
        let aim = target - origin;
        let base_angle = aim.y.atan2(aim.x);
        for _ in 0..BOSS_VOLLEY {
            let angle = base_angle + rng.gen_range(-BOSS_AIM_JITTER..BOSS_AIM_JITTER);
            let speed = rng.gen_range(3.0_f32..5.0);
            let wave = Wave {
                amplitude: rng.gen_range(3.0_f32..5.0),
                frequency: rng.gen_range(0.003_f32..0.005),
            };
            let bullet = HostileBullet {
                id: self.next_id(),
                source_comment_id: "boss_attack".to_string(),
                lines: vec![BOSS_ATTACK_GLYPH.to_string()],
                kind: BulletKind::BossAttack(wave),
                position: origin,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                size: 1.5,
                color: Rgb::RED,
                color_tier: ColorTier::Red,
                hp: 1,
                max_hp: 1,
                score_value: 0,
                invincible: false,
                pattern: Pattern::Wave,
                motion: Motion::Wave(wave),
                pattern_clock_ms: 0.0,
                hit_flash_ms: 0.0,
            };
            self.add_bullet(bullet);
        }
    }

    // ── Per-tick update ──────────────────────────────────────────────────────

    /// Move every bullet by its pattern rule, let the boss fire, then drop
    /// bullets that left the field or ran out of HP.
    ///
    /// `avatar` is the avatar's current centre; tracking and boss aim use it.
    pub fn update(
        &mut self,
        dt_ms: f32,
        profile: &DifficultyProfile,
        avatar: Option<Vec2>,
        rng: &mut impl Rng,
    ) {
        let step = Step {
            dt_ms,
            frames: dt_ms / NOMINAL_FRAME_MS,
            speed_multiplier: profile.speed_multiplier,
            track: if profile.track_player { avatar } else { None },
            bounds: self.bounds,
            boss_shot_interval_ms: self.boss_shot_interval_ms,
        };

        let mut volleys: Vec<(Vec2, usize)> = Vec::new();
        for bullet in self.bullets.iter_mut() {
            if advance(bullet, &step, rng) {
                volleys.push((bullet.position, bullet.lines.len()));
            }
        }
        if let Some(target) = avatar {
            for (at, lines) in volleys {
                self.boss_volley(at, lines, target, rng);
            }
        }

        let (bounds, margin) = (self.bounds, self.margin);
        self.bullets
            .retain(|b| b.is_alive() && !out_of_bounds(b.position, bounds, margin));
    }

    // ── Damage ───────────────────────────────────────────────────────────────

    /// Apply `damage` to the bullet at `index`, removing it when depleted.
    pub fn hit(&mut self, index: usize, damage: u32, flash_ms: f32) -> Option<HitResult> {
        let bullet = self.bullets.get_mut(index)?;
        if bullet.invincible {
            return Some(HitResult::Absorbed);
        }
        bullet.hp = bullet.hp.saturating_sub(damage);
        bullet.hit_flash_ms = flash_ms;
        if bullet.hp == 0 {
            return self.bullets.remove(index).map(HitResult::Destroyed);
        }
        Some(HitResult::Damaged)
    }
}

// ── Movement rules ────────────────────────────────────────────────────────────

struct Step {
    dt_ms: f32,
    frames: f32,
    speed_multiplier: f32,
    track: Option<Vec2>,
    bounds: Bounds,
    boss_shot_interval_ms: f32,
}

/// Whether `spawn` refuses these parameters under `profile`: an all-red
/// palette has no gray, green or purple bullets. Bosses are never refused.
pub fn is_suppressed(params: &BulletParameters, profile: &DifficultyProfile) -> bool {
    params.emotion != Emotion::Boss
        && profile.color_filter == ColorFilterPolicy::AllRed
        && matches!(
            ColorTier::from_color(params.color),
            ColorTier::Gray | ColorTier::Green | ColorTier::Purple
        )
}

/// Returns true when a boss is due to fire.
fn advance(bullet: &mut HostileBullet, step: &Step, rng: &mut impl Rng) -> bool {
    bullet.pattern_clock_ms += step.dt_ms;
    if bullet.hit_flash_ms > 0.0 {
        bullet.hit_flash_ms = (bullet.hit_flash_ms - step.dt_ms).max(0.0);
    }
    let clock = bullet.pattern_clock_ms;
    let frames = step.frames;
    let drift = bullet.velocity.x * step.speed_multiplier * frames;
    let kind = bullet.kind;

    match &mut bullet.kind {
        BulletKind::Boss(state) => {
            let band_x = step.bounds.width * 0.6;
            let target_y =
                step.bounds.height / 2.0 + (clock * 0.001).sin() * step.bounds.height * 0.3;
            bullet.position.y += (target_y - bullet.position.y) * (0.02 * frames).min(1.0);

            if state.reached_band {
                bullet.position.x = band_x + (clock * 0.002).sin() * 50.0;
            } else {
                bullet.position.x += drift;
                if bullet.position.x <= band_x {
                    state.reached_band = true;
                }
            }

            state.shoot_timer_ms += step.dt_ms;
            if state.shoot_timer_ms >= step.boss_shot_interval_ms {
                state.shoot_timer_ms = 0.0;
                return true;
            }
        }
        BulletKind::BossAttack(wave) => {
            bullet.position += bullet.velocity * step.speed_multiplier * frames;
            bullet.position.y += (clock * wave.frequency).sin() * wave.amplitude * frames;
        }
        BulletKind::MassEvent => {
            bullet.position.x += drift;
            bullet.position.y += (clock * 0.003).sin() * 0.5 * frames;
        }
        BulletKind::HighSpeed => {
            bullet.position.x += drift;
        }
        BulletKind::Normal | BulletKind::Giant => {
            match step.track {
                Some(target) if !bullet.invincible => {
                    let speed = bullet.velocity.length();
                    let dir = (target - bullet.position).normalize_or_zero();
                    if dir != Vec2::ZERO {
                        bullet.velocity = dir * speed;
                    }
                    bullet.position += bullet.velocity * step.speed_multiplier * frames;
                }
                _ => {
                    bullet.position.x += drift;
                    let wobble = match (kind, bullet.motion) {
                        (BulletKind::Giant, _) => (clock * 0.001).sin(),
                        (_, Motion::Wave(wave)) => (clock * wave.frequency).sin() * wave.amplitude,
                        (_, Motion::Straight) => (clock * 0.002).sin() * rng.gen_range(0.5_f32..2.0),
                    };
                    bullet.position.y += wobble * frames;
                }
            }
        }
    }
    false
}

fn out_of_bounds(p: Vec2, bounds: Bounds, margin: f32) -> bool {
    p.x < -margin || p.x > bounds.width + margin || p.y < -margin || p.y > bounds.height + margin
}

/// Split text into fixed-width rows of characters.
pub fn wrap_lines(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(LINE_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
