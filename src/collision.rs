//! Geometric hit tests.
//!
//! Everything here is a pure predicate; callers decide what a hit means.

use glam::Vec2;

use crate::avatar::Avatar;
use crate::entities::HostileBullet;

/// Average glyph width as a fraction of the font size.
const CHAR_WIDTH_RATIO: f32 = 0.6;
/// Vertical gap between rendered lines, in pixels.
pub const LINE_GAP_PX: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

pub fn circles_overlap(a: &Circle, b: &Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// Nearest point on the rectangle to the circle centre decides the overlap.
pub fn rect_circle_overlap(rect: &Rect, circle: &Circle) -> bool {
    let nearest = Vec2::new(
        circle.center.x.clamp(rect.x, rect.x + rect.width),
        circle.center.y.clamp(rect.y, rect.y + rect.height),
    );
    circle.center.distance(nearest) < circle.radius
}

/// Edges count as inside.
pub fn point_in_rect(point: Vec2, rect: &Rect) -> bool {
    point.x >= rect.x
        && point.x <= rect.x + rect.width
        && point.y >= rect.y
        && point.y <= rect.y + rect.height
}

pub fn point_in_circle(point: Vec2, circle: &Circle) -> bool {
    point.distance(circle.center) < circle.radius
}

// ── Entity hit-boxes ──────────────────────────────────────────────────────────

/// Small centred square, a third of the avatar's size on each side.
pub fn avatar_hitbox(avatar: &Avatar) -> Rect {
    let side = avatar.size / 3.0;
    Rect {
        x: avatar.position.x - side / 2.0,
        y: avatar.position.y - side / 2.0,
        width: side,
        height: side,
    }
}

/// Bounding rectangle of the bullet's whole text block.
pub fn bullet_hitbox(bullet: &HostileBullet, base_font_px: f32) -> Rect {
    let font_px = base_font_px * bullet.size;
    let widest = bullet
        .lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let rows = bullet.lines.len() as f32;
    Rect {
        x: bullet.position.x,
        y: bullet.position.y,
        width: widest as f32 * font_px * CHAR_WIDTH_RATIO,
        height: font_px * rows + (rows - 1.0).max(0.0) * LINE_GAP_PX,
    }
}

/// Always false while the avatar is invincible.
pub fn avatar_hits_bullet(avatar: &Avatar, bullet: &HostileBullet, base_font_px: f32) -> bool {
    if avatar.is_invincible() {
        return false;
    }
    rects_overlap(&avatar_hitbox(avatar), &bullet_hitbox(bullet, base_font_px))
}

/// Indices of every hostile bullet touching the avatar.
pub fn avatar_collisions<'a>(
    avatar: &Avatar,
    bullets: impl IntoIterator<Item = &'a HostileBullet>,
    base_font_px: f32,
) -> Vec<usize> {
    if avatar.is_invincible() {
        return Vec::new();
    }
    bullets
        .into_iter()
        .enumerate()
        .filter(|(_, b)| avatar_hits_bullet(avatar, b, base_font_px))
        .map(|(i, _)| i)
        .collect()
}
