//! Comment → bullet-parameter mapping.
//!
//! A keyword-based sentiment pass plus a few popularity heuristics. The only
//! randomness is the rare/invulnerable colour roll and comment synthesis, both
//! drawn from the caller's RNG.

use std::cell::Cell;

use rand::Rng;

use crate::config::BulletLimits;
use crate::entities::{BulletParameters, Comment, Emotion, Pattern, Rgb};

// ── Keyword tables ────────────────────────────────────────────────────────────

const AGGRESSIVE: &[&str] = &[
    "死ね", "kill", "爆発", "destroy", "壊す", "やばい", "ヤバい", "クソ", "くそ", "マジで",
    "うざい", "うるさい",
];

const POSITIVE: &[&str] = &[
    "すごい", "最高", "面白い", "かわいい", "素晴らしい", "good", "awesome", "great", "love",
    "nice", "cool", "神", "いいね", "ありがとう", "thank",
];

const NEGATIVE: &[&str] = &[
    "つまらない", "bad", "嫌い", "hate", "boring", "ひどい", "最悪", "worst", "terrible",
];

const EXCITED: &[&str] = &["!", "wwww", "www", "lol", "lmao", "草", "笑"];

/// Chance that a non-positive comment turns purple (rare).
const RARE_CHANCE: f64 = 0.05;
/// Additional chance that it turns gray (invulnerable) instead.
const INVULNERABLE_CHANCE: f64 = 0.05;

// ── Synthesis templates ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SynthStyle {
    Positive,
    Excited,
    Neutral,
    Negative,
}

impl SynthStyle {
    fn templates(self) -> &'static [&'static str] {
        match self {
            SynthStyle::Positive => &["これは素晴らしい!", "最高ですね", "いいね!", "すごい!", "かっこいい!"],
            SynthStyle::Excited => &["やばいwww", "すごすぎるwww", "これは神!!!", "まじか!!!", "えぐい!"],
            SynthStyle::Neutral => &["なるほど", "わかる", "ふむふむ", "見てます", "きた"],
            SynthStyle::Negative => &["うーん...", "これは微妙", "いまいち", "もっと頑張れ"],
        }
    }

    /// 40% positive, 20% excited, 20% neutral, 20% negative.
    fn roll(rng: &mut impl Rng) -> SynthStyle {
        let roll: f64 = rng.gen();
        if roll < 0.4 {
            SynthStyle::Positive
        } else if roll < 0.6 {
            SynthStyle::Excited
        } else if roll < 0.8 {
            SynthStyle::Neutral
        } else {
            SynthStyle::Negative
        }
    }
}

// ── Analyzer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CommentAnalyzer {
    limits: BulletLimits,
    /// `(pool size, like-count threshold)` of the last bottom-decile query.
    decile_cache: Cell<Option<(usize, u32)>>,
    synthesized: Cell<u64>,
}

impl CommentAnalyzer {
    pub fn new(limits: BulletLimits) -> Self {
        CommentAnalyzer {
            limits,
            ..CommentAnalyzer::default()
        }
    }

    pub fn analyze(&self, comment: &Comment, rng: &mut impl Rng) -> BulletParameters {
        let text = comment.text.to_lowercase();
        let emotion = classify(&text);
        let excitement_level = excitement(&text);
        let l = &self.limits;

        let base_speed = match emotion {
            Emotion::Aggressive => 3.5,
            Emotion::Positive => 2.5,
            Emotion::Negative => 1.8,
            Emotion::Neutral | Emotion::Boss => 2.0,
        };
        let speed = (base_speed * like_multiplier(comment.like_count) * (1.0 + excitement_level * 0.3))
            .clamp(l.min_speed, l.max_speed);

        let text_len = comment.text.chars().count() as f32;
        let size = (0.8 + text_len / 50.0).clamp(l.min_size, l.max_size);

        let hp = ((1.0 + comment.like_count as f32 / 10.0).ceil() as u32).clamp(l.min_hp, l.max_hp);

        let emotion_score = match emotion {
            Emotion::Aggressive => 1.0,
            Emotion::Positive => 0.7,
            Emotion::Negative => 0.5,
            Emotion::Neutral | Emotion::Boss => 0.0,
        };
        let density = (0.5 + emotion_score * 0.5_f32).min(1.0);

        BulletParameters {
            emotion,
            speed,
            density,
            size,
            color: pick_color(emotion, rng),
            hp,
            pattern: pick_pattern(emotion, excitement_level),
            excitement_level,
        }
    }

    pub fn analyze_batch(&self, comments: &[Comment], rng: &mut impl Rng) -> Vec<BulletParameters> {
        comments.iter().map(|c| self.analyze(c, rng)).collect()
    }

    /// Whether `comment` sits in the least-liked 10% of `all`.
    ///
    /// The threshold is the like count at index `floor(0.1·N)` of the
    /// ascending sort, memoized per distinct pool size.
    pub fn is_bottom_decile(&self, comment: &Comment, all: &[Comment]) -> bool {
        if all.is_empty() {
            return false;
        }
        let threshold = match self.decile_cache.get() {
            Some((len, threshold)) if len == all.len() => threshold,
            _ => {
                let mut likes: Vec<u32> = all.iter().map(|c| c.like_count).collect();
                likes.sort_unstable();
                let threshold = likes[likes.len() / 10];
                tracing::debug!(pool = all.len(), threshold, "bottom-decile threshold computed");
                self.decile_cache.set(Some((all.len(), threshold)));
                threshold
            }
        };
        comment.like_count <= threshold
    }

    /// Drop the memoized decile threshold; call when the pool is replaced.
    pub fn forget_pool(&self) {
        self.decile_cache.set(None);
    }

    /// Generate `count` placeholder comments from the style templates.
    pub fn synthesize(&self, count: usize, rng: &mut impl Rng) -> Vec<Comment> {
        (0..count)
            .map(|_| {
                let style = SynthStyle::roll(rng);
                let templates = style.templates();
                let text = templates[rng.gen_range(0..templates.len())];
                let serial = self.synthesized.get();
                self.synthesized.set(serial + 1);
                Comment {
                    id: format!("synth_{serial}"),
                    text: text.to_string(),
                    author: "Synthesized".to_string(),
                    like_count: rng.gen_range(0..20),
                    published_at: String::new(),
                }
            })
            .collect()
    }
}

/// `clamp(1 + likes/50, 1, 3)`
pub fn like_multiplier(like_count: u32) -> f32 {
    (1.0 + like_count as f32 / 50.0).clamp(1.0, 3.0)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Aggressive wins over positive, positive over negative.
fn classify(lowered: &str) -> Emotion {
    if contains_any(lowered, AGGRESSIVE) {
        Emotion::Aggressive
    } else if contains_any(lowered, POSITIVE) {
        Emotion::Positive
    } else if contains_any(lowered, NEGATIVE) {
        Emotion::Negative
    } else {
        Emotion::Neutral
    }
}

/// Excitement in `[0, 1]`: exclamations (≤0.5), laughter markers (≤0.3) and
/// excited keywords (0.2).
pub fn excitement(lowered: &str) -> f32 {
    let exclamations = lowered.chars().filter(|&c| c == '!').count() as f32;
    let laughs = lowered.chars().filter(|&c| c == 'w' || c == 'ｗ').count() as f32;

    let mut level = (exclamations * 0.1).min(0.5);
    level += (laughs * 0.05).min(0.3);
    if contains_any(lowered, EXCITED) {
        level += 0.2;
    }
    level.min(1.0)
}

fn pick_color(emotion: Emotion, rng: &mut impl Rng) -> Rgb {
    if emotion == Emotion::Positive {
        return Rgb::GREEN;
    }
    let roll: f64 = rng.gen();
    if roll < RARE_CHANCE {
        Rgb::PURPLE
    } else if roll < RARE_CHANCE + INVULNERABLE_CHANCE {
        Rgb::GRAY
    } else {
        Rgb::WHITE
    }
}

fn pick_pattern(emotion: Emotion, excitement: f32) -> Pattern {
    match emotion {
        Emotion::Aggressive if excitement > 0.5 => Pattern::Spiral,
        Emotion::Aggressive => Pattern::Straight,
        Emotion::Positive => Pattern::Wave,
        _ if excitement > 0.7 => Pattern::Random,
        _ => Pattern::Straight,
    }
}
