use comment_danmaku::avatar::*;
use comment_danmaku::config::{GameConfig, NOMINAL_FRAME_MS};
use comment_danmaku::entities::*;

use glam::Vec2;

const BOUNDS: Bounds = Bounds {
    width: 800.0,
    height: 600.0,
};

fn make_avatar() -> Avatar {
    Avatar::new(Vec2::new(400.0, 300.0), skin_by_id("default"), &GameConfig::default())
}

fn keys(up: bool, down: bool, left: bool, right: bool) -> InputState {
    InputState {
        up,
        down,
        left,
        right,
        pointer: None,
        modality: InputModality::Keyboard,
    }
}

// ── Construction & skins ──────────────────────────────────────────────────────

#[test]
fn new_avatar_starts_with_one_shot_and_no_invincibility() {
    let a = make_avatar();
    assert_eq!(a.max_shots, 1);
    assert!(!a.is_invincible());
    assert!(a.bullets.is_empty());
}

#[test]
fn known_skins_resolve() {
    assert_eq!(skin_by_id("gold_star").shape, SkinShape::Star);
    assert_eq!(skin_by_id("gold_star").color, Rgb::GOLD);
    assert_eq!(skin_by_id("red_triangle").color, Rgb::RED);
}

#[test]
fn unknown_skin_falls_back_to_default() {
    let skin = skin_by_id("no_such_skin");
    assert_eq!(skin.id, "default");
    assert_eq!(skin.shape, SkinShape::Triangle);
}

// ── Auto-fire ─────────────────────────────────────────────────────────────────

#[test]
fn fires_on_first_update_without_input() {
    let mut a = make_avatar();
    a.update(NOMINAL_FRAME_MS, &InputState::default(), BOUNDS);
    assert_eq!(a.bullets.len(), 1);
}

#[test]
fn fire_cadence_follows_interval() {
    let mut a = make_avatar();
    let wide = Bounds {
        width: 5000.0,
        height: 600.0,
    };
    // 1 second at 150 ms per volley → first shot at t=0 plus six more
    for _ in 0..60 {
        a.update(NOMINAL_FRAME_MS, &InputState::default(), wide);
    }
    let fired = a.bullets.len();
    assert!((6..=8).contains(&fired), "fired {fired}");
}

#[test]
fn shoot_fans_out_symmetrically() {
    let mut a = make_avatar();
    a.max_shots = 3;
    a.shoot();
    assert_eq!(a.bullets.len(), 3);
    let sum_y: f32 = a.bullets.iter().map(|b| b.velocity.y).sum();
    assert!(sum_y.abs() < 1e-4);
    assert!(a.bullets.iter().all(|b| b.velocity.x > 0.0 && b.damage == 1));
    assert!((a.bullets[1].velocity.y).abs() < 1e-4);
}

#[test]
fn single_shot_is_flat() {
    let mut a = make_avatar();
    a.shoot();
    assert_eq!(a.bullets[0].velocity.y, 0.0);
    assert!((a.bullets[0].velocity.x - 10.0).abs() < 1e-5);
}

#[test]
fn increase_bullets_is_capped() {
    let mut a = make_avatar();
    for _ in 0..10 {
        a.increase_bullets();
    }
    assert_eq!(a.max_shots, 5);
}

#[test]
fn shots_are_pruned_off_screen() {
    let mut a = make_avatar();
    a.position = Vec2::new(780.0, 300.0);
    a.shoot();
    for _ in 0..20 {
        a.update(NOMINAL_FRAME_MS, &InputState::default(), BOUNDS);
    }
    assert!(a.bullets.iter().all(|b| b.position.x <= BOUNDS.width + 50.0));
}

#[test]
fn remove_bullet_ignores_bad_index() {
    let mut a = make_avatar();
    a.shoot();
    a.remove_bullet(7);
    assert_eq!(a.bullets.len(), 1);
    a.remove_bullet(0);
    assert!(a.bullets.is_empty());
}

// ── Damage ────────────────────────────────────────────────────────────────────

#[test]
fn take_damage_starts_invincibility() {
    let mut a = make_avatar();
    assert!(a.take_damage());
    assert!(a.is_invincible());
    assert!(!a.take_damage());
}

#[test]
fn invincibility_wears_off() {
    let mut a = make_avatar();
    a.take_damage();
    for _ in 0..119 {
        a.update(NOMINAL_FRAME_MS, &InputState::default(), BOUNDS);
    }
    assert!(a.is_invincible());
    for _ in 0..2 {
        a.update(NOMINAL_FRAME_MS, &InputState::default(), BOUNDS);
    }
    assert!(!a.is_invincible());
    assert!(a.take_damage());
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[test]
fn keyboard_moves_one_speed_step_per_frame() {
    let mut a = make_avatar();
    a.update(NOMINAL_FRAME_MS, &keys(false, false, false, true), BOUNDS);
    assert!((a.position.x - 405.0).abs() < 1e-3);
    assert_eq!(a.position.y, 300.0);
}

#[test]
fn diagonal_movement_is_normalised() {
    let mut a = make_avatar();
    a.update(NOMINAL_FRAME_MS, &keys(true, false, true, false), BOUNDS);
    let moved = a.position.distance(Vec2::new(400.0, 300.0));
    assert!((moved - 5.0).abs() < 1e-3);
}

#[test]
fn movement_scales_with_elapsed_time() {
    let mut a = make_avatar();
    a.update(NOMINAL_FRAME_MS * 2.0, &keys(false, true, false, false), BOUNDS);
    assert!((a.position.y - 310.0).abs() < 1e-3);
}

#[test]
fn position_is_clamped_to_bounds() {
    let mut a = make_avatar();
    a.position = Vec2::new(2.0, 598.0);
    a.update(NOMINAL_FRAME_MS, &keys(false, true, true, false), BOUNDS);
    let half = a.size / 2.0;
    assert_eq!(a.position.x, half);
    assert_eq!(a.position.y, BOUNDS.height - half);
}

#[test]
fn pointer_seeks_target() {
    let mut a = make_avatar();
    let input = InputState {
        pointer: Some(Vec2::new(600.0, 300.0)),
        modality: InputModality::Pointer,
        ..InputState::default()
    };
    let before = a.position.distance(Vec2::new(600.0, 300.0));
    a.update(NOMINAL_FRAME_MS, &input, BOUNDS);
    let after = a.position.distance(Vec2::new(600.0, 300.0));
    assert!(after < before);
    assert!(before - after <= a.speed + 1e-3);
}

#[test]
fn pointer_inside_deadzone_does_not_move() {
    let mut a = make_avatar();
    let input = InputState {
        pointer: Some(Vec2::new(402.0, 301.0)),
        modality: InputModality::Pointer,
        ..InputState::default()
    };
    a.update(NOMINAL_FRAME_MS, &input, BOUNDS);
    assert_eq!(a.position, Vec2::new(400.0, 300.0));
}

#[test]
fn keyboard_modality_ignores_pointer() {
    let mut a = make_avatar();
    let input = InputState {
        pointer: Some(Vec2::new(600.0, 300.0)),
        modality: InputModality::Keyboard,
        ..InputState::default()
    };
    a.update(NOMINAL_FRAME_MS, &input, BOUNDS);
    assert_eq!(a.position, Vec2::new(400.0, 300.0));
}
