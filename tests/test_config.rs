use std::io::Write;

use comment_danmaku::config::*;
use comment_danmaku::entities::{ColorFilterPolicy, Difficulty};

// ── Defaults ──────────────────────────────────────────────────────────────────

#[test]
fn defaults_validate() {
    assert!(GameConfig::default().validate().is_ok());
}

#[test]
fn difficulty_table_orders_pressure() {
    let c = GameConfig::default();
    let easy = c.profile(Difficulty::Easy);
    let normal = c.profile(Difficulty::Normal);
    let hard = c.profile(Difficulty::Hard);
    let hell = c.profile(Difficulty::Hell);

    assert!(easy.spawn_interval_ms > normal.spawn_interval_ms);
    assert!(normal.spawn_interval_ms > hard.spawn_interval_ms);
    assert!(easy.boss_threshold < normal.boss_threshold);
    assert_eq!(hard.score_multiplier, 3);

    assert!(hell.track_player);
    assert!(hell.bottom_decile_only);
    assert_eq!(hell.color_filter, ColorFilterPolicy::AllRed);
    for d in [easy, normal, hard] {
        assert!(!d.track_player);
        assert_eq!(d.color_filter, ColorFilterPolicy::Standard);
    }
}

// ── JSON overrides ────────────────────────────────────────────────────────────

#[test]
fn partial_json_keeps_other_defaults() {
    let c = GameConfig::from_json_str(r#"{ "initial_lives": 4, "mass_event_count": 5 }"#)
        .expect("valid config");
    assert_eq!(c.initial_lives, 4);
    assert_eq!(c.mass_event_count, 5);
    assert_eq!(c.max_lives, 5);
    assert_eq!(c.bullet_capacity, 100);
}

#[test]
fn nested_profile_override() {
    let raw = r#"{
        "difficulties": {
            "easy": {
                "speedMultiplier": 0.5,
                "spawnIntervalMs": 2000.0,
                "trackPlayer": true,
                "colorFilter": "all-red",
                "bottomDecileOnly": false,
                "bossThreshold": 5,
                "scoreMultiplier": 1
            }
        }
    }"#;
    let c = GameConfig::from_json_str(raw).expect("valid config");
    let easy = c.profile(Difficulty::Easy);
    assert_eq!(easy.boss_threshold, 5);
    assert_eq!(easy.color_filter, ColorFilterPolicy::AllRed);
    // untouched tiers keep their defaults
    assert_eq!(c.profile(Difficulty::Normal).boss_threshold, 60);
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = GameConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

// ── Validation ────────────────────────────────────────────────────────────────

#[test]
fn inverted_limits_are_rejected() {
    let err = GameConfig::from_json_str(r#"{ "limits": { "min_speed": 9.0, "max_speed": 1.0 } }"#)
        .unwrap_err();
    match err {
        ConfigError::InvalidRange { field, .. } => assert_eq!(field, "limits.min_speed"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn bad_ranges_are_rejected() {
    let cases = [
        GameConfig {
            bullet_capacity: 0,
            ..GameConfig::default()
        },
        GameConfig {
            initial_lives: 6,
            ..GameConfig::default()
        },
        GameConfig {
            initial_lives: 0,
            ..GameConfig::default()
        },
        GameConfig {
            spawn_probability: 1.5,
            ..GameConfig::default()
        },
    ];
    for c in cases {
        assert!(matches!(c.validate(), Err(ConfigError::InvalidRange { .. })));
    }
}

#[test]
fn non_positive_spawn_interval_is_rejected() {
    let mut c = GameConfig::default();
    c.difficulties.hard.spawn_interval_ms = 0.0;
    assert!(c.validate().is_err());
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "spawn_probability": 0.25 }}"#).expect("write config");
    let c = GameConfig::from_json_file(file.path()).expect("valid config");
    assert_eq!(c.spawn_probability, 0.25);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = GameConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}
