use std::io::Write;

use comment_danmaku::achievements::*;
use comment_danmaku::collaborators::*;
use comment_danmaku::entities::{Comment, Difficulty, MatchOutcome};

fn outcome(score: u64, cleared: bool) -> MatchOutcome {
    MatchOutcome {
        score,
        cleared,
        coins_earned: score / 100,
        difficulty: Difficulty::Hard,
        kills: 12,
        no_damage: cleared,
    }
}

// ── Comment sources ───────────────────────────────────────────────────────────

#[test]
fn static_comments_fetch_repeatedly() {
    let mut src = StaticComments(vec![Comment::new("a", "hi", 1)]);
    assert_eq!(src.fetch().expect("static fetch").len(), 1);
    assert_eq!(src.fetch().expect("static fetch").len(), 1);
    assert!(StaticComments::default().fetch().expect("static fetch").is_empty());
}

#[test]
fn json_file_comments_default_missing_fields() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"[
            {{ "id": "a", "text": "最高！", "author": "viewer", "likeCount": 12, "publishedAt": "2024-01-01" }},
            {{ "id": "b", "text": "ok" }}
        ]"#
    )
    .expect("write comments");

    let comments = JsonFileComments::new(file.path()).fetch().expect("valid comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].like_count, 12);
    assert_eq!(comments[0].author, "viewer");
    assert_eq!(comments[1].like_count, 0);
    assert_eq!(comments[1].author, "");
}

#[test]
fn null_and_mistyped_comment_fields_fall_back() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"[
            {{ "id": "a", "text": "great!!!", "likeCount": 60 }},
            {{ "id": "b", "text": "hello", "likeCount": null }},
            {{ "id": 7, "text": null, "author": ["x"], "likeCount": "15", "publishedAt": false }},
            {{ "id": "d", "text": "hm", "likeCount": -3 }},
            {{ "id": "e", "text": "wow", "likeCount": {{ "n": 1 }} }}
        ]"#
    )
    .expect("write comments");

    let comments = JsonFileComments::new(file.path()).fetch().expect("lenient comments");
    assert_eq!(comments.len(), 5);
    assert_eq!(comments[0].like_count, 60);
    assert_eq!(comments[1].text, "hello");
    assert_eq!(comments[1].like_count, 0);
    assert_eq!(comments[2].id, "7");
    assert_eq!(comments[2].text, "");
    assert_eq!(comments[2].author, "");
    assert_eq!(comments[2].like_count, 15);
    assert_eq!(comments[2].published_at, "");
    assert_eq!(comments[3].like_count, 0);
    assert_eq!(comments[4].like_count, 0);
}

#[test]
fn malformed_comment_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{ \"id\": ").expect("write comments");
    let err = JsonFileComments::new(file.path()).fetch().unwrap_err();
    assert!(matches!(err, CommentSourceError::Parse(_)));
}

#[test]
fn missing_comment_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = JsonFileComments::new(dir.path().join("none.json")).fetch().unwrap_err();
    assert!(matches!(err, CommentSourceError::Io { .. }));
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[test]
fn high_score_only_moves_up() {
    let mut store = MemoryStore::default();
    assert!(store.set_high_score(500).expect("store"));
    assert!(!store.set_high_score(300).expect("store"));
    assert!(!store.set_high_score(500).expect("store"));
    assert_eq!(store.get_high_score().expect("store"), 500);
}

#[test]
fn coins_accumulate() {
    let mut store = MemoryStore::default();
    assert_eq!(store.add_coins(10).expect("store"), 10);
    assert_eq!(store.add_coins(5).expect("store"), 15);
    assert_eq!(store.get_coins().expect("store"), 15);
}

#[test]
fn default_skin_is_selected() {
    assert_eq!(MemoryStore::default().get_selected_skin().expect("store"), "default");
}

#[test]
fn achievements_unlock_once() {
    let mut store = MemoryStore::default();
    assert!(store.unlock_achievement("first_clear").expect("store"));
    assert!(!store.unlock_achievement("first_clear").expect("store"));
    assert_eq!(store.get_achievements().expect("store"), vec!["first_clear".to_string()]);
    assert!(matches!(
        store.unlock_achievement(""),
        Err(PersistenceError::UnknownRecord(_))
    ));
}

// ── Stats ─────────────────────────────────────────────────────────────────────

#[test]
fn stats_track_streaks_and_bests() {
    let mut stats = GameStats::default();
    stats.record(1_000, 10, true, Difficulty::Easy, true);
    stats.record(3_000, 20, true, Difficulty::Easy, false);
    assert_eq!(stats.consecutive_clears, 2);
    assert_eq!(stats.difficulty_clears.get(&Difficulty::Easy), Some(&2));
    assert_eq!(stats.no_damage_clears, 1);

    stats.record(500, 3, false, Difficulty::Hell, false);
    assert_eq!(stats.total_games, 3);
    assert_eq!(stats.total_score, 4_500);
    assert_eq!(stats.total_kills, 33);
    assert_eq!(stats.best_score, 3_000);
    assert_eq!(stats.consecutive_clears, 0);
    assert!(!stats.difficulty_clears.contains_key(&Difficulty::Hell));
}

#[test]
fn record_outcome_updates_everything() {
    let mut store = MemoryStore::default();
    let unlocked = record_outcome(&mut store, &outcome(25_000, true));
    let ids: Vec<&str> = unlocked.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["score_10000", "clear_hard", "clear_no_damage"]);
    assert_eq!(store.high_score, 25_000);
    // 250 earned + 500 hard clear + 2000 no damage
    assert_eq!(store.coins, 2_750);
    assert!(store.unlocked_skins.contains("red_triangle"));
    assert_eq!(store.stats.total_games, 1);
    assert_eq!(store.stats.difficulty_clears.get(&Difficulty::Hard), Some(&1));

    let unlocked = record_outcome(&mut store, &outcome(100, false));
    assert!(unlocked.is_empty());
    assert_eq!(store.high_score, 25_000);
    assert_eq!(store.coins, 2_751);
    assert_eq!(store.stats.consecutive_clears, 0);
}

// ── Achievements ──────────────────────────────────────────────────────────────

#[test]
fn achievement_table_has_unique_ids() {
    assert_eq!(ACHIEVEMENTS.len(), 19);
    for (i, a) in ACHIEVEMENTS.iter().enumerate() {
        assert!(ACHIEVEMENTS[i + 1..].iter().all(|b| b.id != a.id), "duplicate {}", a.id);
        assert_eq!(achievement_by_id(a.id), Some(a));
    }
    assert_eq!(achievement_by_id("nope"), None);
}

#[test]
fn checks_count_the_match_on_top_of_earlier_stats() {
    let before = GameStats {
        total_games: 9,
        total_kills: 990,
        consecutive_clears: 2,
        ..GameStats::default()
    };
    let earned: Vec<&str> = newly_earned(&before, &outcome(0, true), &[])
        .iter()
        .map(|a| a.id)
        .collect();
    // 990 + 12 kills, 3rd clear in a row, 10th game
    assert_eq!(
        earned,
        vec!["kills_1000", "clear_hard", "clear_no_damage", "consecutive_3", "games_10"]
    );

    let lost: Vec<&str> = newly_earned(&before, &outcome(0, false), &[])
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(lost, vec!["kills_1000", "games_10"]);
}

#[test]
fn unlocked_achievements_are_not_earned_again() {
    let held = vec!["score_10000".to_string(), "clear_hard".to_string()];
    let earned = newly_earned(&GameStats::default(), &outcome(12_000, false), &held);
    assert!(earned.is_empty());

    let mut store = MemoryStore::default();
    record_outcome(&mut store, &outcome(12_000, true));
    let coins = store.coins;
    let again = record_outcome(&mut store, &outcome(12_000, true));
    assert!(again.is_empty());
    assert_eq!(store.coins, coins + 120);
}

#[test]
fn hell_clear_grants_the_gold_star() {
    let mut store = MemoryStore::default();
    let hell = MatchOutcome {
        difficulty: Difficulty::Hell,
        ..outcome(500, true)
    };
    let unlocked = record_outcome(&mut store, &hell);
    assert!(unlocked.iter().any(|a| a.reward == Reward::Skin("gold_star")));
    assert!(store.unlocked_skins.contains("gold_star"));
    assert!(store.achievements.contains("clear_hell"));
}

#[test]
fn progress_tracks_lifetime_stats() {
    let stats = GameStats {
        total_games: 25,
        best_score: 60_000,
        ..GameStats::default()
    };
    let games = achievement_by_id("games_100").expect("games_100");
    assert_eq!(games.progress(&stats, false), Progress { progress: 25, max: 100, percentage: 25 });

    let score = achievement_by_id("score_50000").expect("score_50000");
    assert_eq!(score.progress(&stats, false).percentage, 100);

    let hell = achievement_by_id("clear_hell").expect("clear_hell");
    assert_eq!(hell.progress(&stats, false), Progress { progress: 0, max: 1, percentage: 0 });
    assert_eq!(hell.progress(&stats, true), Progress { progress: 1, max: 1, percentage: 100 });
}

// ── Skins ─────────────────────────────────────────────────────────────────────

#[test]
fn spending_needs_enough_coins() {
    let mut store = MemoryStore::default();
    store.add_coins(300).expect("store");
    assert!(!store.spend_coins(301).expect("store"));
    assert_eq!(store.coins, 300);
    assert!(store.spend_coins(300).expect("store"));
    assert_eq!(store.coins, 0);
}

#[test]
fn only_the_default_skin_is_owned_at_first() {
    let store = MemoryStore::default();
    assert_eq!(store.get_unlocked_skins().expect("store"), vec!["default".to_string()]);
    assert!(owns_skin(&store, "default").expect("store"));
    assert!(!owns_skin(&store, "red_triangle").expect("store"));
    assert!(!owns_skin(&store, "rainbow").expect("store"));
}

#[test]
fn buying_a_skin_spends_its_cost() {
    let mut store = MemoryStore::default();
    store.add_coins(700).expect("store");

    assert_eq!(
        purchase_skin(&mut store, "gold_star").expect("store"),
        Purchase::TooExpensive { short: 300 }
    );
    assert_eq!(
        purchase_skin(&mut store, "red_triangle").expect("store"),
        Purchase::Bought { balance: 200 }
    );
    assert!(owns_skin(&store, "red_triangle").expect("store"));
    assert_eq!(
        purchase_skin(&mut store, "red_triangle").expect("store"),
        Purchase::AlreadyOwned
    );
    assert_eq!(purchase_skin(&mut store, "rainbow").expect("store"), Purchase::UnknownSkin);
    assert_eq!(store.coins, 200);
}

#[test]
fn achievement_skins_are_owned_without_buying() {
    let mut store = MemoryStore::default();
    store.unlock_achievement("clear_hell").expect("store");
    assert!(owns_skin(&store, "gold_star").expect("store"));
    assert_eq!(purchase_skin(&mut store, "gold_star").expect("store"), Purchase::AlreadyOwned);
    assert_eq!(store.coins, 0);
}

#[test]
fn only_owned_skins_can_be_equipped() {
    let mut store = MemoryStore::default();
    assert!(!equip_skin(&mut store, "gold_star").expect("store"));
    assert_eq!(store.selected_skin, "default");

    store.unlock_skin("gold_star").expect("store");
    assert!(equip_skin(&mut store, "gold_star").expect("store"));
    assert_eq!(store.get_selected_skin().expect("store"), "gold_star");
}

struct BrokenStore;

impl Persistence for BrokenStore {
    fn get_high_score(&self) -> Result<u64, PersistenceError> {
        Err(PersistenceError::UnknownRecord("highScore".into()))
    }
    fn set_high_score(&mut self, _: u64) -> Result<bool, PersistenceError> {
        Err(PersistenceError::UnknownRecord("highScore".into()))
    }
    fn get_coins(&self) -> Result<u64, PersistenceError> {
        Err(PersistenceError::UnknownRecord("coins".into()))
    }
    fn add_coins(&mut self, _: u64) -> Result<u64, PersistenceError> {
        Err(PersistenceError::UnknownRecord("coins".into()))
    }
    fn spend_coins(&mut self, _: u64) -> Result<bool, PersistenceError> {
        Err(PersistenceError::UnknownRecord("coins".into()))
    }
    fn get_unlocked_skins(&self) -> Result<Vec<String>, PersistenceError> {
        Err(PersistenceError::UnknownRecord("skins".into()))
    }
    fn unlock_skin(&mut self, _: &str) -> Result<bool, PersistenceError> {
        Err(PersistenceError::UnknownRecord("skins".into()))
    }
    fn get_selected_skin(&self) -> Result<String, PersistenceError> {
        Err(PersistenceError::UnknownRecord("skin".into()))
    }
    fn set_selected_skin(&mut self, _: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::UnknownRecord("skin".into()))
    }
    fn get_achievements(&self) -> Result<Vec<String>, PersistenceError> {
        Err(PersistenceError::UnknownRecord("achievements".into()))
    }
    fn unlock_achievement(&mut self, _: &str) -> Result<bool, PersistenceError> {
        Err(PersistenceError::UnknownRecord("achievements".into()))
    }
    fn get_game_stats(&self) -> Result<GameStats, PersistenceError> {
        Err(PersistenceError::UnknownRecord("stats".into()))
    }
    fn update_game_stats(
        &mut self,
        _: u64,
        _: u32,
        _: bool,
        _: Difficulty,
        _: bool,
    ) -> Result<GameStats, PersistenceError> {
        Err(PersistenceError::UnknownRecord("stats".into()))
    }
}

#[test]
fn record_outcome_swallows_store_failures() {
    assert!(record_outcome(&mut BrokenStore, &outcome(10, true)).is_empty());
    assert!(purchase_skin(&mut BrokenStore, "red_triangle").is_err());
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[test]
fn store_survives_a_save_load_cycle() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("store.json");

    let mut store = MemoryStore::default();
    record_outcome(&mut store, &outcome(9_900, true));
    store.unlock_achievement("hell_walker").expect("store");
    store.selected_skin = "gold_star".to_string();
    store.save(&path).expect("save");

    let loaded = MemoryStore::load(&path).expect("load");
    assert_eq!(loaded, store);
}

#[test]
fn missing_store_file_loads_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let loaded = MemoryStore::load(&dir.path().join("nothing.json")).expect("load");
    assert_eq!(loaded, MemoryStore::default());
}

#[test]
fn store_file_without_skins_owns_the_default() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "highScore": 40, "coins": 7 }}"#).expect("write store");
    let loaded = MemoryStore::load(file.path()).expect("load");
    assert_eq!(loaded.coins, 7);
    assert!(loaded.unlocked_skins.contains("default"));
    assert_eq!(loaded.selected_skin, "default");
}

#[test]
fn corrupt_store_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "[1, 2").expect("write store");
    assert!(matches!(
        MemoryStore::load(file.path()),
        Err(PersistenceError::Serialization(_))
    ));
}
