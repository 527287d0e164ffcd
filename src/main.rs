mod display;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::filter::EnvFilter;

use comment_danmaku::collaborators::{
    equip_skin, purchase_skin, record_outcome, CommentSource, JsonFileComments, MemoryStore,
    Persistence, Purchase, StaticComments,
};
use comment_danmaku::config::GameConfig;
use comment_danmaku::entities::{Difficulty, InputModality, InputState, MatchOutcome};
use comment_danmaku::game::MatchController;

use display::Viewport;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// Frames a press or repeat keeps a direction key held. Terminals without
/// release events rely on OS key repeat (15 Hz or faster) to refresh it.
const HOLD_WINDOW: u64 = 8;

fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Command line ──────────────────────────────────────────────────────────────

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::ALL
        .into_iter()
        .find(|d| d.label() == s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected one of easy, normal, hard, hell; got `{s}`"))
}

#[derive(Parser, Debug)]
#[command(name = "comment_danmaku")]
#[command(about = "Dodge and shoot a bullet-hell built from viewer comments")]
struct Cli {
    /// Skip the menu and start at this difficulty.
    #[arg(short, long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// JSON array of comments; synthesized comments are used without it.
    #[arg(short, long)]
    comments: Option<PathBuf>,

    /// JSON file overriding the default tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible match.
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here; nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Equip an owned skin (default, red_triangle, gold_star).
    #[arg(long)]
    skin: Option<String>,

    /// Spend coins on a skin before the menu opens.
    #[arg(long)]
    buy_skin: Option<String>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Persistence ───────────────────────────────────────────────────────────────

fn store_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".comment_danmaku.json")
}

fn load_store() -> MemoryStore {
    MemoryStore::load(&store_path()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "save file unreadable, starting fresh");
        MemoryStore::default()
    })
}

fn save_store(store: &MemoryStore) {
    if let Err(e) = store.save(&store_path()) {
        tracing::warn!(error = %e, "failed to write save file");
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start(Difficulty),
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    store: &MemoryStore,
    notices: &[String],
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "弾  COMMENT  DANMAKU  幕";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    if store.high_score > 0 || store.coins > 0 {
        let hs_str = format!("Best Score: {}   Coins: {}", store.high_score, store.coins);
        out.queue(cursor::MoveTo(
            cx.saturating_sub(hs_str.chars().count() as u16 / 2),
            cy.saturating_sub(5),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&hs_str))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(12), cy.saturating_sub(3)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select difficulty:"))?;

    let options: &[(&str, Difficulty, &str)] = &[
        ("1", Difficulty::Easy, "Slow comments, boss after 40 kills"),
        ("2", Difficulty::Normal, "Balanced, double score"),
        ("3", Difficulty::Hard, "Fast and dense, triple score"),
        ("4", Difficulty::Hell, "Least-liked comments hunt you"),
    ];

    for (i, (key, difficulty, desc)) in options.iter().enumerate() {
        let (tag, color) = display::difficulty_tag(*difficulty);
        let row = cy.saturating_sub(1) + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(12), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", key)))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(format!("{:<11}", tag)))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!(" {}", desc)))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(12), cy + 5))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Green heals, purple is rare, gray can't be hurt."))?;

    out.queue(style::SetForegroundColor(Color::Magenta))?;
    for (i, notice) in notices.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(12), cy + 7 + i as u16))?;
        out.queue(Print(notice))?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;

    loop {
        let Ok(ev) = rx.recv() else {
            return Ok(MenuResult::Quit); // input thread gone
        };
        if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = ev {
            match code {
                KeyCode::Char('1') => return Ok(MenuResult::Start(Difficulty::Easy)),
                KeyCode::Char('2') => return Ok(MenuResult::Start(Difficulty::Normal)),
                KeyCode::Char('3') => return Ok(MenuResult::Start(Difficulty::Hard)),
                KeyCode::Char('4') => return Ok(MenuResult::Start(Difficulty::Hell)),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs one match. `Ok(true)` quits the program, `Ok(false)` returns to the menu.
///
/// Held keys are tracked per frame the same way for keyboard movement;
/// mouse motion switches the avatar to pointer seeking until the next
/// direction key.
fn game_loop<W: Write>(
    out: &mut W,
    game: &mut MatchController,
    rx: &mpsc::Receiver<Event>,
    high_score: u64,
    last_outcome: &RefCell<Option<MatchOutcome>>,
) -> std::io::Result<bool> {
    let (cols, rows) = terminal::size()?;
    let mut view = Viewport::new(cols, rows, game.config().surface);

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut input = InputState {
        modality: InputModality::Keyboard,
        ..InputState::default()
    };
    let mut frame: u64 = 0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let finished = game.get_state().phase.is_terminal();

        // ── Input ────────────────────────────────────────────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        key_frame.insert(code.clone(), frame);
                        match code {
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                                return Ok(true);
                            }
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                return Ok(true);
                            }
                            KeyCode::Char('p') | KeyCode::Char('P') => {
                                if !game.pause() {
                                    game.resume();
                                }
                            }
                            KeyCode::Char('r') | KeyCode::Char('R') if finished => {
                                return Ok(false);
                            }
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => {
                        key_frame.insert(code.clone(), frame);
                    }
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                    }
                },
                Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                    if matches!(
                        kind,
                        MouseEventKind::Moved | MouseEventKind::Drag(_) | MouseEventKind::Down(_)
                    ) {
                        input.pointer = Some(view.to_surface(column, row));
                        input.modality = InputModality::Pointer;
                    }
                }
                Event::Resize(c, r) => view = Viewport::new(c, r, game.config().surface),
                _ => {}
            }
        }

        // ── Held directions ──────────────────────────────────────────────────
        input.up = any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame);
        input.down = any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame);
        input.left = any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame);
        input.right = any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame);
        if input.up || input.down || input.left || input.right {
            input.modality = InputModality::Keyboard;
        }

        let now = Instant::now();
        let dt_ms = now.duration_since(last).as_secs_f32() * 1000.0;
        last = now;
        game.tick(dt_ms, &input);

        let coins = last_outcome
            .borrow()
            .as_ref()
            .map(|o| o.coins_earned)
            .unwrap_or(0);
        display::render(out, &game.render(), &view, high_score, coins)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = match &cli.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Release events drive held-key tracking where the terminal supports
    // the kitty keyboard protocol.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads happen on their own thread; the loops poll the channel.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &cli, config);

    // Restore the terminal even when `run` failed.
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    cli: &Cli,
    config: GameConfig,
) -> Result<()> {
    let mut store = load_store();

    let source: Box<dyn CommentSource> = match &cli.comments {
        Some(path) => Box::new(JsonFileComments::new(path)),
        None => Box::new(StaticComments::default()),
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = MatchController::new(config, source, rng);

    let mut notices = Vec::new();
    if let Some(id) = &cli.buy_skin {
        let notice = match purchase_skin(&mut store, id)? {
            Purchase::Bought { balance } => {
                save_store(&store);
                format!("Bought {id}. {balance} coins left.")
            }
            Purchase::AlreadyOwned => format!("You already own {id}."),
            Purchase::TooExpensive { short } => format!("{id} needs {short} more coins."),
            Purchase::UnknownSkin => format!("No skin called {id}."),
        };
        notices.push(notice);
    }
    if let Some(id) = &cli.skin {
        if equip_skin(&mut store, id)? {
            save_store(&store);
        } else {
            notices.push(format!("{id} is locked. Buy it or earn its achievement."));
        }
    }
    game.set_skin(&store.get_selected_skin()?);

    let last_outcome: Rc<RefCell<Option<MatchOutcome>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&last_outcome);
    game.on_finish(move |outcome| *sink.borrow_mut() = Some(outcome.clone()));

    let mut preset = cli.difficulty;
    loop {
        let difficulty = match preset.take() {
            Some(d) => d,
            None => match show_menu(out, rx, &store, &notices)? {
                MenuResult::Quit => break,
                MenuResult::Start(d) => d,
            },
        };

        last_outcome.borrow_mut().take();
        game.start(difficulty);
        let quit = game_loop(out, &mut game, rx, store.high_score, &last_outcome)?;
        game.stop();

        if let Some(outcome) = last_outcome.borrow().as_ref() {
            notices = record_outcome(&mut store, outcome)
                .iter()
                .map(|a| format!("Achievement unlocked: {} ({})", a.name, a.description))
                .collect();
            save_store(&store);
        }

        if quit {
            break;
        }
    }
    Ok(())
}
