//! Layout and drawing: garden board, sidebar, title, pause and game over.
//!
//! The board is painted from [`flowergarden::render::draw_list`]; nothing here reads simulation
//! internals beyond the public accessors.

use crate::theme::Theme;
use flowergarden::render::{DrawPrimitive, Layer, draw_list};
use flowergarden::{BlockId, ResourceKind, Scene, Simulation};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per garden tile. Two rows per tile so half-row positions land on a cell.
pub const TILE_W: u16 = 4;
pub const TILE_H: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
/// The board shakes this long after a clear, flipping sides every step.
const SHAKE_MS: u128 = 240;
const SHAKE_STEP_MS: u128 = 40;

/// Flower glyphs cycled by display angle.
const FLOWER_GLYPHS: [&str; 4] = ["✿", "❀", "✾", "❁"];

/// Everything the frame needs besides the simulation.
pub struct View<'a> {
    pub sim: &'a Simulation,
    pub theme: &'a Theme,
    pub paused: bool,
    pub next: ResourceKind,
    /// Ticks per second, to turn the blink timer into a fade duration.
    pub tick_rate: f64,
    /// When the last clear happened, for the board shake.
    pub shake_since: Option<Instant>,
}

/// Fade-out effect over the blocks waiting to clear. Rebuilt whenever that set changes.
#[derive(Default)]
pub struct BlinkFx {
    effect: Option<Effect>,
    last_process: Option<Instant>,
    claimed: Vec<BlockId>,
}

/// Board size in terminal cells including the border. One extra tile row shows the spawn row.
fn board_outer_size(sim: &Simulation) -> (u16, u16) {
    let w = sim.grid().width() as u16 * TILE_W;
    let h = (sim.grid().height() as u16 + 1) * TILE_H;
    (w + 2, h + 2)
}

/// Board and sidebar rects, centred in `area`.
fn layout(area: Rect, sim: &Simulation) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(sim);
    let total_w = bw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(bh) / 2;
    let board = Rect {
        x,
        y,
        width: bw.min(area.width),
        height: bh.min(area.height),
    };
    let sidebar = Rect {
        x: board.x + board.width,
        y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(board.width)),
        height: bh.min(area.height),
    };
    (board, sidebar)
}

/// Inner board rect (no border) for a terminal of the given area. Used for pointer zones.
pub fn board_rect(area: Rect, sim: &Simulation) -> Rect {
    let (outer, _) = layout(area, sim);
    Block::default().borders(Borders::ALL).inner(outer)
}

/// Terminal rect of a tile at garden position (x, y), y=0 at the floor, y=height the spawn row.
fn tile_rect(board: Rect, grid_height: i32, x: f32, y: f32) -> Option<Rect> {
    let col = (x * f32::from(TILE_W)).round();
    let row = ((grid_height as f32 - y) * f32::from(TILE_H)).round();
    if col < 0.0 || row < 0.0 {
        return None;
    }
    let rect = Rect {
        x: board.x + col as u16,
        y: board.y + row as u16,
        width: TILE_W,
        height: TILE_H,
    };
    let inside = rect.right() <= board.right() && rect.bottom() <= board.bottom();
    inside.then_some(rect)
}

fn glyph(kind: ResourceKind, angle: Option<u16>) -> &'static str {
    match kind {
        ResourceKind::Seed => "•",
        ResourceKind::Soil => "▒",
        ResourceKind::Water => "≈",
        ResourceKind::Sun => "☼",
        ResourceKind::Rock => "▓",
        ResourceKind::Flower(_) => {
            let quarter = usize::from(angle.unwrap_or(0) / 90) % FLOWER_GLYPHS.len();
            FLOWER_GLYPHS[quarter]
        }
    }
}

/// Paint one tile: filled background in the block's colour, glyph in the middle of the top row.
fn paint_tile(buf: &mut Buffer, rect: Rect, prim: &DrawPrimitive, theme: &Theme) {
    let color = theme.color(prim.sprite);
    let (fill, fg) = match prim.sprite {
        ResourceKind::Soil | ResourceKind::Rock => (theme.bg, color),
        _ => (color, theme.bg),
    };
    let mut style = Style::default().fg(fg).bg(fill);
    if prim.layer == Layer::Blinking {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    if prim.alpha < u8::MAX / 2 {
        style = style.add_modifier(Modifier::DIM);
    }
    let symbol = glyph(prim.sprite, prim.angle);
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            let s = if matches!(prim.sprite, ResourceKind::Soil | ResourceKind::Rock) {
                symbol
            } else {
                " "
            };
            buf[(x, y)].set_symbol(s).set_style(style);
        }
    }
    if !matches!(prim.sprite, ResourceKind::Soil | ResourceKind::Rock) {
        let cx = rect.x + rect.width / 2 - 1;
        buf[(cx, rect.y)].set_symbol(symbol);
    }
}

/// Draw the current scene with pause / focus overlays.
pub fn draw(frame: &mut Frame, view: &View, blink: &mut BlinkFx, now: Instant) {
    let area = frame.area();
    let (still, sidebar) = layout(area, view.sim);
    let max_x = area.right().saturating_sub(still.width);
    let board = Rect {
        x: still
            .x
            .saturating_add_signed(shake_offset(view.shake_since, now))
            .min(max_x),
        ..still
    };
    draw_board(frame, view, board);
    draw_sidebar(frame, view, sidebar);
    apply_blink_effect(frame, view, still, blink, now);

    match view.sim.scene() {
        Scene::Setup | Scene::Title => draw_title(frame, view, board),
        Scene::GameOver => draw_game_over(frame, view, board),
        Scene::Playing => {}
    }
    if view.paused {
        draw_message(frame, view.theme, board, " Paused ", "P - Resume    Q - Quit");
    } else if !view.sim.has_focus() {
        draw_message(frame, view.theme, board, " Frozen ", "focus the window to continue");
    }
}

/// Board offset in columns while a clear shake is running.
fn shake_offset(since: Option<Instant>, now: Instant) -> i16 {
    let Some(since) = since else {
        return 0;
    };
    let ms = now.saturating_duration_since(since).as_millis();
    if ms >= SHAKE_MS {
        0
    } else if (ms / SHAKE_STEP_MS) % 2 == 0 {
        1
    } else {
        -1
    }
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let title = format!(" Flower Garden  | Wave {} ", view.sim.wave());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let spawn_rows = inner.y + TILE_H;
    for y in inner.top()..inner.bottom() {
        for x in inner.left()..inner.right() {
            let bg = if y < spawn_rows { theme.div_line } else { theme.bg };
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }

    let grid_height = view.sim.grid().height();
    for prim in draw_list(view.sim) {
        if let Some(rect) = tile_rect(inner, grid_height, prim.x, prim.y) {
            paint_tile(buf, rect, &prim, theme);
        }
    }
}

fn sidebar_block(theme: &Theme, title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let sim = view.sim;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next
            Constraint::Length(4), // Hold
            Constraint::Length(7), // Score, best, cascade
            Constraint::Length(3), // Wave progress
            Constraint::Min(0),    // Keys
        ])
        .split(area);

    draw_piece_box(frame, theme, chunks[0], " Next ", Some(view.next), false);
    draw_piece_box(frame, theme, chunks[1], " Hold ", sim.held(), sim.hold_used());

    let stats_block = sidebar_block(theme, " Garden ");
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats = vec![
        stat("Score: ", sim.displayed_score().to_string()),
        stat("Best:  ", sim.high_score().to_string()),
        stat("Wave:  ", sim.wave().to_string()),
        stat("Chain: ", format!("x{}", sim.cascade_multiplier())),
        stat("Blooms pending: ", sim.pending().len().to_string()),
    ];
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    let wave_block = sidebar_block(theme, " Wave goal ");
    let wave_inner = wave_block.inner(chunks[3]);
    wave_block.render(chunks[3], frame.buffer_mut());
    Gauge::default()
        .ratio(wave_progress(sim))
        .gauge_style(Style::default().fg(theme.color(ResourceKind::Seed)))
        .render(wave_inner, frame.buffer_mut());

    let help = vec![
        Line::from(Span::styled("←/→ move  ↓ drop", fg_style)),
        Line::from(Span::styled("↑/Space hold", fg_style)),
        Line::from(Span::styled("P pause  Q quit", fg_style)),
    ];
    Paragraph::new(help)
        .style(Style::default().fg(theme.inactive_fg))
        .block(sidebar_block(theme, " Keys "))
        .render(chunks[4], frame.buffer_mut());
}

/// Share of the bottom `wave` rows already in flower.
fn wave_progress(sim: &Simulation) -> f64 {
    let grid = sim.grid();
    let rows = (sim.wave() as i32).min(grid.height());
    let total = rows * grid.width();
    if total <= 0 {
        return 0.0;
    }
    let flowers = grid
        .iter()
        .filter(|(_, b)| b.row() < rows && b.kind.is_flower())
        .count();
    (flowers as f64 / f64::from(total)).min(1.0)
}

fn draw_piece_box(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    title: &'static str,
    kind: Option<ResourceKind>,
    dimmed: bool,
) {
    let block = sidebar_block(theme, title);
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let Some(kind) = kind else {
        return;
    };
    let tile = Rect {
        x: inner.x + 1,
        y: inner.y,
        width: TILE_W.min(inner.width),
        height: TILE_H.min(inner.height),
    };
    if tile.width < TILE_W || tile.height < TILE_H {
        return;
    }
    let prim = DrawPrimitive {
        x: 0.0,
        y: 0.0,
        sprite: kind,
        angle: None,
        alpha: u8::MAX,
        layer: Layer::Falling,
    };
    paint_tile(frame.buffer_mut(), tile, &prim, theme);
    let label_style = if dimmed {
        Style::default().fg(theme.inactive_fg)
    } else {
        Style::default().fg(theme.main_fg)
    };
    frame.buffer_mut().set_string(
        tile.right() + 1,
        tile.y,
        kind.sprite_name(),
        label_style,
    );
}

/// Fade the cells of blocks waiting to clear towards the background over the blink time.
fn apply_blink_effect(
    frame: &mut Frame,
    view: &View,
    board: Rect,
    blink: &mut BlinkFx,
    now: Instant,
) {
    let sim = view.sim;
    let claimed: Vec<BlockId> = sim
        .pending()
        .iter()
        .flat_map(|s| s.blocks.iter().copied())
        .collect();
    if claimed.is_empty() {
        *blink = BlinkFx::default();
        return;
    }

    let delta = blink
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    blink.last_process = Some(now);

    let inner = Block::default().borders(Borders::ALL).inner(board);
    if blink.effect.is_none() || blink.claimed != claimed {
        let grid_height = sim.grid().height();
        let mut cells: HashSet<(u16, u16)> = HashSet::new();
        for block in claimed.iter().filter_map(|&id| sim.grid().block(id)) {
            if let Some(r) = tile_rect(inner, grid_height, block.x as f32, block.y()) {
                for y in r.top()..r.bottom() {
                    for x in r.left()..r.right() {
                        cells.insert((x, y));
                    }
                }
            }
        }
        let blink_secs = f64::from(sim.config().blink_ticks) / view.tick_rate.max(1.0);
        let fade_ms = (blink_secs * 1000.0) as u32;
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        blink.effect = Some(
            fx::fade_to(bg, bg, (fade_ms.max(1), Interpolation::Linear))
                .with_filter(filter)
                .with_area(inner),
        );
        blink.claimed = claimed;
    }
    if let Some(effect) = blink.effect.as_mut() {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_message(frame: &mut Frame, theme: &Theme, board: Rect, title: &str, hint: &str) {
    let popup = popup_rect(board, 34, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_title(frame: &mut Frame, view: &View, board: Rect) {
    let theme = view.theme;
    let popup = popup_rect(board, board.width.saturating_sub(4), 9);
    let green = theme.color(ResourceKind::Seed);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "✿  Flower Garden  ✿",
            Style::default().fg(green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Best: {}", view.sim.high_score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "press any key to plant",
            Style::default().fg(theme.title),
        )),
        Line::from(Span::styled(
            "hold H + press R: reset best",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, board: Rect) {
    let theme = view.theme;
    let sim = view.sim;
    let popup = popup_rect(board, board.width.saturating_sub(4), 11);
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", sim.total_score()), fg)),
        Line::from(Span::styled(
            format!(
                " clears {} + waves {} ",
                sim.score(),
                sim.total_score().saturating_sub(sim.score())
            ),
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(Span::styled(format!(" Best: {} ", sim.high_score()), fg)),
        Line::from(Span::styled(format!(" Wave: {} ", sim.wave()), fg)),
    ];
    if sim.total_score() > 0 && sim.total_score() >= sim.high_score() {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R - Restart    Q - Quit ", fg)));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Flower Garden ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_rect_flips_y_and_clips() {
        let board = Rect::new(1, 1, 40, 22);
        // Floor row sits at the bottom, the spawn row at the top.
        assert_eq!(tile_rect(board, 10, 0.0, 0.0), Some(Rect::new(1, 21, 4, 2)));
        assert_eq!(tile_rect(board, 10, 9.0, 10.0), Some(Rect::new(37, 1, 4, 2)));
        // Half rows land one terminal row lower.
        assert_eq!(tile_rect(board, 10, 2.0, 9.5), Some(Rect::new(9, 2, 4, 2)));
        assert_eq!(tile_rect(board, 10, 10.0, 0.0), None);
        assert_eq!(tile_rect(board, 10, 0.0, 11.0), None);
    }

    #[test]
    fn test_shake_alternates_then_stops() {
        let start = Instant::now();
        let at = |ms| start + std::time::Duration::from_millis(ms);
        assert_eq!(shake_offset(None, at(10)), 0);
        assert_eq!(shake_offset(Some(start), at(0)), 1);
        assert_eq!(shake_offset(Some(start), at(50)), -1);
        assert_eq!(shake_offset(Some(start), at(90)), 1);
        assert_eq!(shake_offset(Some(start), at(240)), 0);
    }

    #[test]
    fn test_flower_glyph_turns_with_angle() {
        let daisy = ResourceKind::Flower(flowergarden::FlowerKind::Daisy);
        assert_eq!(glyph(daisy, Some(0)), FLOWER_GLYPHS[0]);
        assert_eq!(glyph(daisy, Some(95)), FLOWER_GLYPHS[1]);
        assert_eq!(glyph(daisy, Some(359)), FLOWER_GLYPHS[3]);
    }
}
