//! Terminal front end for [`RenderFrame`] snapshots.
//!
//! The simulation works on a pixel surface; [`Viewport`] squeezes that
//! surface into the terminal grid and the `draw_*` helpers queue crossterm
//! commands for each sprite.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use glam::Vec2;

use comment_danmaku::entities::{Bounds, Difficulty, Phase, Rgb, SkinShape};
use comment_danmaku::render::{AvatarSprite, BulletSprite, HpBar, HpBarKind, RenderFrame};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_KILLS: Color = Color::White;
const C_SHOT: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;
const C_WARNING: Color = Color::Red;

/// Rows above the play area: HUD plus the top border.
const TOP_ROWS: u16 = 2;
/// Rows below the play area: bottom border plus the controls hint.
const BOTTOM_ROWS: u16 = 2;

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── Surface ↔ grid mapping ────────────────────────────────────────────────────

/// Maps the simulation's pixel surface onto the terminal's inner play area.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub surface: Bounds,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, surface: Bounds) -> Self {
        Viewport { cols, rows, surface }
    }

    fn inner_cols(&self) -> f32 {
        self.cols.saturating_sub(2).max(1) as f32
    }

    fn inner_rows(&self) -> f32 {
        self.rows.saturating_sub(TOP_ROWS + BOTTOM_ROWS).max(1) as f32
    }

    /// Terminal cell for a surface point; `None` outside the play area.
    pub fn to_cell(&self, p: Vec2) -> Option<(u16, u16)> {
        let fx = p.x / self.surface.width;
        let fy = p.y / self.surface.height;
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }
        let col = 1 + (fx * self.inner_cols()) as u16;
        let row = TOP_ROWS + (fy * self.inner_rows()) as u16;
        Some((col, row))
    }

    /// Surface point at the centre of a terminal cell, for mouse input.
    pub fn to_surface(&self, col: u16, row: u16) -> Vec2 {
        let fx = (col.saturating_sub(1) as f32 + 0.5) / self.inner_cols();
        let fy = (row.saturating_sub(TOP_ROWS) as f32 + 0.5) / self.inner_rows();
        Vec2::new(
            fx.clamp(0.0, 1.0) * self.surface.width,
            fy.clamp(0.0, 1.0) * self.surface.height,
        )
    }

    fn right_wall(&self) -> u16 {
        self.cols.saturating_sub(1)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    frame: &RenderFrame,
    view: &Viewport,
    high_score: u64,
    coins_earned: u64,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_hud(out, frame, view, high_score)?;

    for bullet in &frame.bullets {
        draw_bullet(out, bullet, view)?;
    }
    for &shot in &frame.shots {
        draw_shot(out, shot, view)?;
    }
    if let Some(avatar) = &frame.avatar {
        draw_avatar(out, avatar, view)?;
    }
    draw_hp_bars(out, &frame.hp_bars, view)?;
    if let Some(elapsed) = frame.boss_warning_ms {
        draw_boss_warning(out, elapsed, view)?;
    }
    draw_controls_hint(out, view)?;

    match frame.hud.phase {
        Phase::Paused => draw_paused(out, view)?,
        Phase::GameOver | Phase::Cleared => draw_match_end(out, frame, view, high_score, coins_earned)?,
        Phase::Idle | Phase::Playing => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.right_wall(), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

pub fn difficulty_tag(d: Difficulty) -> (&'static str, Color) {
    match d {
        Difficulty::Easy => ("[ EASY ]", Color::Green),
        Difficulty::Normal => ("[ NORMAL ]", Color::Yellow),
        Difficulty::Hard => ("[ HARD ]", Color::Red),
        Difficulty::Hell => ("[ HELL ]", Color::DarkRed),
    }
}

fn draw_hud<W: Write>(
    out: &mut W,
    frame: &RenderFrame,
    view: &Viewport,
    high_score: u64,
) -> std::io::Result<()> {
    let hud = &frame.hud;

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    if high_score > 0 {
        out.queue(Print(format!("Score:{:>8}  Hi:{:>8}", hud.score, high_score)))?;
    } else {
        out.queue(Print(format!("Score:{:>8}", hud.score)))?;
    }
    out.queue(style::SetForegroundColor(C_HUD_KILLS))?;
    out.queue(Print(format!("  Kills:{:>4}", hud.kills)))?;

    let (tag, color) = difficulty_tag(hud.difficulty);
    let lx = (view.cols / 2).saturating_sub(tag.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(tag))?;

    let lives_str = format!("Lives:{}", "♥".repeat(hud.lives as usize));
    let rx = view
        .cols
        .saturating_sub(lives_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_str))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

/// Draw a text bullet, one terminal row per text line, clipped at the
/// right wall. Bullets still entering from the right are skipped.
fn draw_bullet<W: Write>(out: &mut W, bullet: &BulletSprite, view: &Viewport) -> std::io::Result<()> {
    let Some((col, row)) = view.to_cell(bullet.position) else {
        return Ok(());
    };
    out.queue(style::SetForegroundColor(rgb(bullet.color)))?;
    for (i, line) in bullet.lines.iter().enumerate() {
        let r = row + i as u16;
        if r >= view.rows.saturating_sub(BOTTOM_ROWS) {
            break;
        }
        let room = view.right_wall().saturating_sub(col) as usize;
        let visible: String = line.chars().take(room).collect();
        out.queue(cursor::MoveTo(col, r))?;
        out.queue(Print(visible))?;
    }
    Ok(())
}

fn draw_shot<W: Write>(out: &mut W, shot: Vec2, view: &Viewport) -> std::io::Result<()> {
    if let Some((col, row)) = view.to_cell(shot) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(C_SHOT))?;
        out.queue(Print("·"))?;
    }
    Ok(())
}

fn draw_avatar<W: Write>(out: &mut W, avatar: &AvatarSprite, view: &Viewport) -> std::io::Result<()> {
    if !avatar.visible {
        return Ok(());
    }
    let Some((col, row)) = view.to_cell(avatar.position) else {
        return Ok(());
    };
    let glyph = match avatar.skin.shape {
        SkinShape::Triangle => "▶",
        SkinShape::Star => "★",
    };
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(rgb(avatar.skin.color)))?;
    out.queue(Print(glyph))?;
    Ok(())
}

/// HP bars stacked under the top border, right-aligned.
fn draw_hp_bars<W: Write>(out: &mut W, bars: &[HpBar], view: &Viewport) -> std::io::Result<()> {
    const BAR_CELLS: usize = 20;
    for (i, bar) in bars.iter().enumerate() {
        let label = match bar.kind {
            HpBarKind::Rare => "RARE",
            HpBarKind::Boss => "BOSS",
        };
        let filled = ((bar.ratio * BAR_CELLS as f32).ceil() as usize).min(BAR_CELLS);
        let text = format!(
            "{label} {}{} {}/{}",
            "█".repeat(filled),
            "░".repeat(BAR_CELLS - filled),
            bar.hp,
            bar.max_hp
        );
        let col = view
            .right_wall()
            .saturating_sub(text.chars().count() as u16 + 1);
        out.queue(cursor::MoveTo(col, TOP_ROWS + i as u16))?;
        out.queue(style::SetForegroundColor(rgb(bar.color)))?;
        out.queue(Print(text))?;
    }
    Ok(())
}

fn draw_boss_warning<W: Write>(out: &mut W, elapsed_ms: f32, view: &Viewport) -> std::io::Result<()> {
    // Blink at 4 Hz.
    if (elapsed_ms / 250.0) as u32 % 2 == 1 {
        return Ok(());
    }
    let msg = "!!  BOSS COMING  !!";
    let col = (view.cols / 2).saturating_sub(msg.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, view.rows / 2))?;
    out.queue(style::SetForegroundColor(C_WARNING))?;
    out.queue(Print(msg))?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("Arrows / WASD / Mouse : Move   P : Pause   Q : Quit"))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_centered<W: Write>(
    out: &mut W,
    view: &Viewport,
    lines: &[(String, Color)],
) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

fn draw_paused<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    draw_centered(
        out,
        view,
        &[
            ("╔════════════════════╗".to_string(), Color::Cyan),
            ("║       PAUSED       ║".to_string(), Color::Cyan),
            ("╚════════════════════╝".to_string(), Color::Cyan),
            ("P - Resume  Q - Quit".to_string(), Color::White),
        ],
    )
}

fn draw_match_end<W: Write>(
    out: &mut W,
    frame: &RenderFrame,
    view: &Viewport,
    high_score: u64,
    coins_earned: u64,
) -> std::io::Result<()> {
    let hud = &frame.hud;
    let (title, color) = if hud.phase == Phase::Cleared {
        ("║    STAGE  CLEAR    ║", Color::Yellow)
    } else {
        ("║    GAME  OVER      ║", Color::Red)
    };
    let new_best = hud.score >= high_score && hud.score > 0;
    let best_line = if new_best {
        (format!("★ NEW BEST: {:>8} ★", hud.score), Color::Yellow)
    } else {
        (format!("Best Score:  {:>8}", high_score), Color::DarkGrey)
    };

    draw_centered(
        out,
        view,
        &[
            ("╔════════════════════╗".to_string(), color),
            (title.to_string(), color),
            ("╚════════════════════╝".to_string(), color),
            (format!("Final Score: {:>8}", hud.score), Color::Yellow),
            best_line,
            (format!("Coins: +{coins_earned}"), Color::Yellow),
            ("R - Play Again  Q - Quit".to_string(), Color::White),
        ],
    )
}
