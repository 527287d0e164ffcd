//! The match state machine: phases, timers, spawning and collision outcomes.

use std::collections::VecDeque;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::analyzer::CommentAnalyzer;
use crate::avatar::{skin_by_id, Avatar};
use crate::collaborators::CommentSource;
use crate::collision::{avatar_collisions, bullet_hitbox, point_in_rect};
use crate::config::GameConfig;
use crate::entities::{
    BossPhase, Bounds, BulletKind, BulletParameters, ColorTier, Comment, Difficulty, Emotion,
    InputState, MatchOutcome, MatchState, Pattern, Phase, Rgb, Skin,
};
use crate::field::{is_suppressed, BulletField, HitResult};
use crate::render::{build_frame, RenderFrame};
use crate::timers::{TimerId, Timers};

const BOSS_FALLBACK_TEXT: &str = "ボス登場！これが最後の戦いだ！全ての力を使って倒せ！";
const BOSS_TEXT_CHARS: usize = 100;
const BOSS_SPEED: f32 = 2.0;
const FLOOD_JITTER_PX: f32 = 20.0;
const COINS_PER_POINT: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerEvent {
    BossSpawn,
    MassEvent,
    BossFlood,
}

type FinishListener = Box<dyn FnMut(&MatchOutcome)>;

pub struct MatchController {
    config: GameConfig,
    rng: StdRng,
    analyzer: CommentAnalyzer,
    source: Box<dyn CommentSource>,
    field: BulletField,
    avatar: Option<Avatar>,
    skin: Skin,
    state: MatchState,

    timers: Timers<TimerEvent>,
    boss_spawn_timer: Option<TimerId>,
    mass_timer: Option<TimerId>,
    flood_timer: Option<TimerId>,

    comments: Vec<Comment>,
    params: Vec<BulletParameters>,
    /// Indices into `comments` waiting to be spawned.
    queue: VecDeque<usize>,
    spawn_clock_ms: f32,
    boss_text: String,
    boss_warning_ms: f32,

    listeners: Vec<FinishListener>,
}

impl MatchController {
    pub fn new(config: GameConfig, source: Box<dyn CommentSource>, rng: StdRng) -> Self {
        let profile = config.profile(Difficulty::Normal);
        MatchController {
            analyzer: CommentAnalyzer::new(config.limits),
            field: BulletField::new(&config),
            avatar: None,
            skin: skin_by_id("default"),
            state: MatchState {
                phase: Phase::Idle,
                score: 0,
                lives: config.initial_lives,
                kill_count: 0,
                boss_phase: BossPhase::NotSpawned,
                consecutive_clears: 0,
                no_damage: true,
                difficulty: Difficulty::Normal,
                profile,
            },
            timers: Timers::new(),
            boss_spawn_timer: None,
            mass_timer: None,
            flood_timer: None,
            comments: Vec::new(),
            params: Vec::new(),
            queue: VecDeque::new(),
            spawn_clock_ms: 0.0,
            boss_text: BOSS_FALLBACK_TEXT.to_string(),
            boss_warning_ms: 0.0,
            listeners: Vec::new(),
            config,
            rng,
            source,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn get_state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn field(&self) -> &BulletField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut BulletField {
        &mut self.field
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn avatar_mut(&mut self) -> Option<&mut Avatar> {
        self.avatar.as_mut()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn boss_text(&self) -> &str {
        &self.boss_text
    }

    pub fn skin(&self) -> Skin {
        self.skin
    }

    /// Timers still waiting to fire. Zero whenever the match is not playing.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_boss_spawn_pending(&self) -> bool {
        self.boss_spawn_timer
            .is_some_and(|id| self.timers.is_pending(id))
    }

    /// Direct access to the counters, for scripted scenarios.
    #[doc(hidden)]
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    pub fn on_finish(&mut self, listener: impl FnMut(&MatchOutcome) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_skin(&mut self, id: &str) {
        self.skin = skin_by_id(id);
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.skin = self.skin;
        }
    }

    pub fn resize(&mut self, bounds: Bounds) {
        self.config.surface = bounds;
        self.field.resize(bounds);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Begin a fresh match. Allowed from any phase; a running match is
    /// torn down first.
    pub fn start(&mut self, difficulty: Difficulty) {
        self.cancel_timers();
        self.field.clear();

        let profile = self.config.profile(difficulty);
        let consecutive_clears = self.state.consecutive_clears;
        self.state = MatchState {
            phase: Phase::Playing,
            score: 0,
            lives: self.config.initial_lives,
            kill_count: 0,
            boss_phase: BossPhase::NotSpawned,
            consecutive_clears,
            no_damage: true,
            difficulty,
            profile,
        };

        self.load_comments();
        self.queue = self.eligible(false);
        self.spawn_clock_ms = 0.0;
        self.boss_warning_ms = 0.0;

        let surface = self.config.surface;
        let centre = Vec2::new(surface.width / 2.0, surface.height / 2.0);
        self.avatar = Some(Avatar::new(centre, self.skin, &self.config));

        self.mass_timer = Some(
            self.timers
                .schedule_repeating(self.config.mass_event_interval_ms, TimerEvent::MassEvent),
        );

        tracing::info!(
            difficulty = difficulty.label(),
            comments = self.comments.len(),
            queued = self.queue.len(),
            "match started"
        );
    }

    /// Returns false unless a match was playing.
    pub fn pause(&mut self) -> bool {
        if self.state.phase != Phase::Playing {
            return false;
        }
        self.state.phase = Phase::Paused;
        self.cancel_timers();
        tracing::info!("match paused");
        true
    }

    /// Returns false unless a match was paused.
    pub fn resume(&mut self) -> bool {
        if self.state.phase != Phase::Paused {
            return false;
        }
        self.state.phase = Phase::Playing;
        self.mass_timer = Some(
            self.timers
                .schedule_repeating(self.config.mass_event_interval_ms, TimerEvent::MassEvent),
        );
        match self.state.boss_phase {
            BossPhase::Warning => {
                self.boss_warning_ms = 0.0;
                self.boss_spawn_timer = Some(
                    self.timers
                        .schedule_once(self.config.boss_warning_ms, TimerEvent::BossSpawn),
                );
            }
            BossPhase::Active => {
                self.flood_timer = Some(self.timers.schedule_repeating(
                    self.config.boss_flood_interval_ms,
                    TimerEvent::BossFlood,
                ));
            }
            BossPhase::NotSpawned => {}
        }
        tracing::info!("match resumed");
        true
    }

    /// Abandon the match without an outcome.
    pub fn stop(&mut self) {
        self.cancel_timers();
        self.field.clear();
        self.queue.clear();
        self.avatar = None;
        if self.state.phase != Phase::Idle {
            tracing::info!(score = self.state.score, "match stopped");
        }
        self.state.phase = Phase::Idle;
    }

    fn cancel_timers(&mut self) {
        for id in [
            self.boss_spawn_timer.take(),
            self.mass_timer.take(),
            self.flood_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.timers.cancel(id);
        }
    }

    fn load_comments(&mut self) {
        let mut comments = match self.source.fetch() {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!(error = %e, "comment source failed");
                Vec::new()
            }
        };
        if comments.len() < self.config.min_real_comments {
            tracing::warn!(
                fetched = comments.len(),
                synthesized = self.config.synthesized_count,
                "too few comments, synthesizing a pool"
            );
            comments = self
                .analyzer
                .synthesize(self.config.synthesized_count, &mut self.rng);
        }
        self.analyzer.forget_pool();
        self.params = self.analyzer.analyze_batch(&comments, &mut self.rng);
        self.boss_text = comments
            .iter()
            .filter(|c| !c.text.is_empty())
            .max_by_key(|c| c.like_count)
            .map(|c| c.text.chars().take(BOSS_TEXT_CHARS).collect())
            .unwrap_or_else(|| BOSS_FALLBACK_TEXT.to_string());
        self.comments = comments;
    }

    /// Spawnable comment indices, in pool order or shuffled.
    fn eligible(&mut self, shuffle: bool) -> VecDeque<usize> {
        if self.comments.is_empty() {
            return VecDeque::new();
        }
        let mut indices: Vec<usize> = (0..self.comments.len()).collect();
        if shuffle {
            indices.shuffle(&mut self.rng);
        }
        if self.state.profile.bottom_decile_only {
            let profile = &self.state.profile;
            let spawnable = |i: usize| !is_suppressed(&self.params[i], profile);
            let decile: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| self.analyzer.is_bottom_decile(&self.comments[i], &self.comments))
                .collect();
            if decile.iter().any(|&i| spawnable(i)) {
                return decile.into();
            }
            // Every least-liked comment would be refused by the palette, so
            // the least-liked spawnable ones stand in for them.
            indices.retain(|&i| spawnable(i));
            let Some(floor) = indices.iter().map(|&i| self.comments[i].like_count).min() else {
                tracing::warn!(pool = self.comments.len(), "no comment can spawn on this palette");
                return decile.into();
            };
            tracing::warn!(
                pool = self.comments.len(),
                like_count = floor,
                "bottom decile cannot spawn, using least-liked spawnable comments"
            );
            indices.retain(|&i| self.comments[i].like_count == floor);
        }
        indices.into()
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Advance the match by `dt_ms`. Does nothing unless playing.
    pub fn tick(&mut self, dt_ms: f32, input: &InputState) {
        if self.state.phase != Phase::Playing {
            return;
        }

        for event in self.timers.advance(dt_ms) {
            self.handle_timer(event);
        }

        self.update_boss_phase(dt_ms);

        if self.queue.is_empty() && !self.comments.is_empty() {
            self.queue = self.eligible(true);
            tracing::debug!(queued = self.queue.len(), "spawn queue refilled");
        }

        self.spawn_clock_ms += dt_ms;
        if self.spawn_clock_ms >= self.state.profile.spawn_interval_ms && !self.queue.is_empty() {
            self.try_spawn();
            self.spawn_clock_ms = 0.0;
        }

        let Some(avatar) = self.avatar.as_mut() else {
            return;
        };
        avatar.update(dt_ms, input, self.field.bounds());
        let target = avatar.position;
        self.field
            .update(dt_ms, &self.state.profile, Some(target), &mut self.rng);

        self.resolve_collisions();
    }

    fn update_boss_phase(&mut self, dt_ms: f32) {
        match self.state.boss_phase {
            BossPhase::NotSpawned if self.state.kill_count >= self.state.profile.boss_threshold => {
                self.state.boss_phase = BossPhase::Warning;
                self.boss_warning_ms = 0.0;
                self.boss_spawn_timer = Some(
                    self.timers
                        .schedule_once(self.config.boss_warning_ms, TimerEvent::BossSpawn),
                );
                tracing::info!(kills = self.state.kill_count, "boss warning");
            }
            BossPhase::Warning => self.boss_warning_ms += dt_ms,
            BossPhase::NotSpawned | BossPhase::Active => {}
        }
    }

    fn try_spawn(&mut self) {
        if !self.rng.gen_bool(self.config.spawn_probability.clamp(0.0, 1.0))
            || self.field.len() >= self.config.spawn_ceiling
        {
            return;
        }
        let Some(index) = self.queue.pop_front() else {
            return;
        };
        let spawned = self.field.spawn(
            &self.comments[index],
            &self.params[index],
            self.state.difficulty,
            &self.state.profile,
            &mut self.rng,
        );
        if let Some(bullet) = spawned {
            self.field.add_bullet(bullet);
        }
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        if self.state.phase != Phase::Playing {
            return;
        }
        match event {
            TimerEvent::BossSpawn => {
                self.boss_spawn_timer = None;
                if self.state.boss_phase == BossPhase::Warning {
                    self.spawn_boss();
                }
            }
            TimerEvent::MassEvent => {
                self.field
                    .spawn_mass_event(self.config.mass_event_count, &mut self.rng);
            }
            TimerEvent::BossFlood => {
                if self.state.boss_phase == BossPhase::Active {
                    self.spawn_boss_flood();
                }
            }
        }
    }

    fn spawn_boss(&mut self) {
        self.state.boss_phase = BossPhase::Active;
        let comment = Comment {
            author: "BOSS".to_string(),
            ..Comment::new("boss", self.boss_text.clone(), 9999)
        };
        let params = BulletParameters {
            emotion: Emotion::Boss,
            speed: BOSS_SPEED,
            density: 1.0,
            size: 1.0,
            color: Rgb::RED,
            hp: self.config.limits.max_hp,
            pattern: Pattern::Straight,
            excitement_level: 0.0,
        };
        let boss = self.field.spawn(
            &comment,
            &params,
            self.state.difficulty,
            &self.state.profile,
            &mut self.rng,
        );
        if let Some(boss) = boss {
            tracing::info!(hp = boss.hp, text = %self.boss_text, "boss spawned");
            self.field.add_bullet(boss);
        }
        self.flood_timer = Some(self.timers.schedule_repeating(
            self.config.boss_flood_interval_ms,
            TimerEvent::BossFlood,
        ));
    }

    fn spawn_boss_flood(&mut self) {
        let rows = self.config.boss_flood_rows;
        let row_height = self.field.bounds().height / rows.max(1) as f32;
        for i in 0..rows {
            let y = row_height * i as f32 + self.rng.gen_range(0.0..FLOOD_JITTER_PX);
            self.field
                .spawn_boss_echo(&self.boss_text, y, &self.state.profile, &mut self.rng);
        }
        tracing::debug!(rows, "boss flood");
    }

    // ── Collisions ───────────────────────────────────────────────────────────

    fn resolve_collisions(&mut self) {
        let font_px = self.config.limits.base_font_px;
        let flash_ms = self.config.hit_flash_ms;
        let Some(avatar) = self.avatar.as_mut() else {
            return;
        };

        let mut boss_down = false;
        let mut shot = avatar.bullets.len();
        'shots: while shot > 0 {
            shot -= 1;
            let at = avatar.bullets[shot].position;
            let damage = avatar.bullets[shot].damage;
            let target = (0..self.field.len())
                .rev()
                .find(|&j| point_in_rect(at, &bullet_hitbox(&self.field.bullets()[j], font_px)));
            let Some(j) = target else {
                continue;
            };
            avatar.remove_bullet(shot);

            let Some(HitResult::Destroyed(bullet)) = self.field.hit(j, damage, flash_ms) else {
                continue;
            };
            self.state.score += u64::from(bullet.score_value);
            self.state.kill_count += 1;
            tracing::debug!(
                id = bullet.id,
                points = bullet.score_value,
                kills = self.state.kill_count,
                "bullet destroyed"
            );

            if matches!(bullet.kind, BulletKind::Boss(_)) {
                boss_down = true;
                break 'shots;
            }
            if self.config.power_up_every > 0 && self.state.kill_count % self.config.power_up_every == 0 {
                avatar.increase_bullets();
                tracing::debug!(shots = avatar.max_shots, "power up");
            }
            if bullet.color_tier == ColorTier::Green {
                self.state.lives = (self.state.lives + 1).min(self.config.max_lives);
                tracing::debug!(lives = self.state.lives, "healed");
            }
        }

        if boss_down {
            self.finish(true);
            return;
        }

        let hits = avatar_collisions(avatar, self.field.bullets(), font_px);
        if !hits.is_empty() && avatar.take_damage() {
            self.state.lives = self.state.lives.saturating_sub(1);
            self.state.no_damage = false;
            tracing::debug!(lives = self.state.lives, "avatar hit");
            if self.state.lives == 0 {
                self.finish(false);
            }
        }
    }

    // ── Outcome ──────────────────────────────────────────────────────────────

    fn finish(&mut self, cleared: bool) {
        self.cancel_timers();
        self.state.phase = if cleared { Phase::Cleared } else { Phase::GameOver };
        if cleared {
            self.state.consecutive_clears += 1;
        } else {
            self.state.consecutive_clears = 0;
        }
        self.field.clear();
        self.queue.clear();

        let outcome = MatchOutcome {
            score: self.state.score,
            cleared,
            coins_earned: self.state.score / COINS_PER_POINT,
            difficulty: self.state.difficulty,
            kills: self.state.kill_count,
            no_damage: self.state.no_damage,
        };
        if cleared {
            tracing::info!(score = outcome.score, kills = outcome.kills, "match cleared");
        } else {
            tracing::info!(score = outcome.score, kills = outcome.kills, "game over");
        }
        for listener in &mut self.listeners {
            listener(&outcome);
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    pub fn render(&self) -> RenderFrame {
        build_frame(
            &self.state,
            &self.field,
            self.avatar.as_ref(),
            self.boss_warning_ms,
            self.config.limits.base_font_px,
        )
    }
}
