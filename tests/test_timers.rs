use comment_danmaku::timers::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ev {
    A,
    B,
}

// ── One-shot ──────────────────────────────────────────────────────────────────

#[test]
fn once_fires_after_delay_and_is_removed() {
    let mut t = Timers::new();
    let id = t.schedule_once(100.0, Ev::A);
    assert!(t.advance(60.0).is_empty());
    assert!(t.is_pending(id));
    assert_eq!(t.advance(40.0), vec![Ev::A]);
    assert!(!t.is_pending(id));
    assert!(t.advance(1000.0).is_empty());
}

#[test]
fn cancel_prevents_firing() {
    let mut t = Timers::new();
    let id = t.schedule_once(10.0, Ev::A);
    assert!(t.cancel(id));
    assert!(!t.cancel(id));
    assert!(t.advance(100.0).is_empty());
}

#[test]
fn cancel_after_fire_returns_false() {
    let mut t = Timers::new();
    let id = t.schedule_once(10.0, Ev::A);
    t.advance(10.0);
    assert!(!t.cancel(id));
}

// ── Repeating ─────────────────────────────────────────────────────────────────

#[test]
fn repeating_fires_every_period() {
    let mut t = Timers::new();
    let id = t.schedule_repeating(50.0, Ev::B);
    let mut fired = 0;
    for _ in 0..20 {
        fired += t.advance(10.0).len();
    }
    assert_eq!(fired, 4);
    assert!(t.is_pending(id));
}

#[test]
fn repeating_catches_up_at_most_once_per_advance() {
    let mut t = Timers::new();
    t.schedule_repeating(10.0, Ev::B);
    assert_eq!(t.advance(100.0), vec![Ev::B]);
}

// ── Ordering & bookkeeping ────────────────────────────────────────────────────

#[test]
fn due_events_come_earliest_first() {
    let mut t = Timers::new();
    t.schedule_once(30.0, Ev::A);
    t.schedule_once(10.0, Ev::B);
    assert_eq!(t.advance(50.0), vec![Ev::B, Ev::A]);
}

#[test]
fn ids_are_distinct() {
    let mut t = Timers::new();
    let a = t.schedule_once(1.0, Ev::A);
    let b = t.schedule_once(1.0, Ev::A);
    assert_ne!(a, b);
    assert_eq!(t.len(), 2);
}

#[test]
fn clear_drops_everything() {
    let mut t = Timers::new();
    t.schedule_once(1.0, Ev::A);
    t.schedule_repeating(1.0, Ev::B);
    t.clear();
    assert!(t.is_empty());
    assert!(t.advance(10.0).is_empty());
}
