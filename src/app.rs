//! App: terminal init, main loop, key/mouse/focus handling and the fixed-rate tick.

use crate::Args;
use crate::highscores;
use crate::keys::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, BlinkFx, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use flowergarden::{Cue, InputFrame, Scene, Simulation, TouchLayout, TouchZone};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Render roughly this often even when no tick is due.
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Keys currently down. Terminals that report key releases give real hold state; the rest only
/// send presses and OS repeats, so each press counts as held for the next tick only.
#[derive(Debug, Default)]
struct KeyTracker {
    held: HashMap<KeyCode, Action>,
    pulsed: HashMap<KeyCode, Action>,
    pressed: Vec<(KeyCode, Action)>,
    released: bool,
    reports_release: bool,
}

impl KeyTracker {
    fn on_key(&mut self, key: KeyEvent) {
        let action = key_to_action(key);
        let code = normalise(key.code);
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if self.reports_release {
                    self.held.insert(code, action);
                } else {
                    self.pulsed.insert(code, action);
                }
                if key.kind == KeyEventKind::Press {
                    self.pressed.push((code, action));
                }
            }
            KeyEventKind::Release => {
                self.reports_release = true;
                self.held.remove(&code);
                self.released = true;
            }
        }
    }

    fn is_held(&self, action: Action) -> bool {
        self.held.values().chain(self.pulsed.values()).any(|&a| a == action)
    }

    fn code_held(&self, code: KeyCode) -> bool {
        self.held.contains_key(&code) || self.pulsed.contains_key(&code)
    }

    fn was_pressed(&self, action: Action) -> bool {
        self.pressed.iter().any(|&(_, a)| a == action)
    }

    /// Forget per-tick state once a tick has consumed it.
    fn end_tick(&mut self) {
        self.pulsed.clear();
        self.pressed.clear();
        self.released = false;
    }

    fn clear(&mut self) {
        self.held.clear();
        self.end_tick();
    }
}

/// Shifted letters arrive as uppercase; the reset gesture cares about the key, not the case.
fn normalise(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

pub struct App {
    args: Args,
    sim: Simulation,
    theme: Theme,
    paused: bool,
    keys: KeyTracker,
    /// Pointer zone held down on the board, if any.
    touch: Option<TouchZone>,
    clicked: bool,
    last_tick: Instant,
    blink: BlinkFx,
    /// Last clear, for the board shake.
    shake_since: Option<Instant>,
    /// Last terminal size, for mapping pointer positions onto the board.
    area: Rect,
}

impl App {
    pub fn new(args: Args, mut sim: Simulation, theme: Theme) -> Self {
        if args.no_title {
            sim.begin_play();
        }
        Self {
            args,
            sim,
            theme,
            paused: false,
            keys: KeyTracker::default(),
            touch: None,
            clicked: false,
            last_tick: Instant::now(),
            blink: BlinkFx::default(),
            shake_since: None,
            area: Rect::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
                KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
                PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;

        // Release events need the kitty protocol; without it keys fall back to press pulses.
        if let Err(e) = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        ) {
            log::debug!("keyboard enhancement unavailable: {e}");
        }

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        let mut stdout = std::io::stdout();
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        execute!(
            stdout,
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = Duration::from_secs_f64(1.0 / self.args.tick_rate.max(1.0));
        loop {
            let now = Instant::now();
            let next = self.sim.peek_next();
            let view = View {
                sim: &self.sim,
                theme: &self.theme,
                paused: self.paused,
                next,
                tick_rate: self.args.tick_rate,
                shake_since: self.shake_since,
            };
            let blink = &mut self.blink;
            let mut area = self.area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &view, blink, now);
            })?;
            self.area = area;

            let until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
            let timeout = until_tick.min(FRAME_DURATION);
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if !self.handle_event(event::read()?) {
                        return Ok(());
                    }
                }
            }

            if self.last_tick.elapsed() >= tick_interval {
                self.last_tick = Instant::now();
                if !self.paused {
                    self.step();
                }
            }
        }
    }

    /// Returns false when the player asked to quit.
    fn handle_event(&mut self, ev: Event) -> bool {
        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Press {
                    match key_to_action(key) {
                        Action::Quit => return false,
                        Action::Pause if self.sim.scene() == Scene::Playing => {
                            self.paused = !self.paused;
                            self.keys.clear();
                            return true;
                        }
                        _ => {}
                    }
                }
                self.keys.on_key(key);
            }
            Event::Mouse(mouse) => {
                let board = ui::board_rect(self.area, &self.sim);
                let layout = TouchLayout {
                    width: board.width,
                    height: board.height,
                };
                let zone_at = |x: u16, y: u16| {
                    if x < board.x || y < board.y {
                        return None;
                    }
                    layout.zone_at(x - board.x, y - board.y)
                };
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.clicked = true;
                        self.touch = zone_at(mouse.column, mouse.row);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        self.touch = zone_at(mouse.column, mouse.row);
                    }
                    MouseEventKind::Up(MouseButton::Left) => self.touch = None,
                    _ => {}
                }
            }
            Event::FocusLost => {
                self.sim.set_focus(false);
                self.keys.clear();
                self.touch = None;
            }
            Event::FocusGained => self.sim.set_focus(true),
            _ => {}
        }
        true
    }

    fn input_frame(&self) -> InputFrame {
        let keys = &self.keys;
        let mut frame = InputFrame {
            left: keys.is_held(Action::MoveLeft),
            right: keys.is_held(Action::MoveRight),
            down: keys.is_held(Action::SoftDrop),
            hold: keys.was_pressed(Action::Hold),
            any_key_up: keys.released || (!keys.reports_release && !keys.pressed.is_empty()),
            click: self.clicked,
            reset_high_score: keys.was_pressed(Action::Restart)
                && keys.code_held(KeyCode::Char('h')),
            restart: keys.was_pressed(Action::Restart),
        };
        if let Some(zone) = self.touch {
            // A tap on the hold corner is one hold, not one per tick.
            if zone != TouchZone::Hold || self.clicked {
                frame.press_zone(zone);
            }
        }
        frame
    }

    fn step(&mut self) {
        let input = self.input_frame();
        self.sim.tick(&input);
        self.keys.end_tick();
        self.clicked = false;

        for event in self.sim.drain_events() {
            match event {
                flowergarden::Event::Sound(cue) => {
                    if cue == Cue::ShapeClear {
                        self.shake_since = Some(Instant::now());
                    }
                    play(cue);
                }
                flowergarden::Event::HighScore(score) => {
                    if let Err(e) = highscores::save_high_score(score) {
                        log::warn!("could not save high score: {e:#}");
                    }
                }
                flowergarden::Event::SceneChanged { to, .. } => {
                    if to != Scene::Playing {
                        self.paused = false;
                    }
                }
                flowergarden::Event::WaveAdvanced { wave, bonus } => {
                    log::info!("wave {wave}, bonus {bonus}");
                }
            }
        }
    }
}

/// There is no audio backend in the terminal; cues are logged and the clear cue rings the bell.
fn play(cue: Cue) {
    log::trace!("cue {cue:?}");
    if cue == Cue::ShapeClear {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07").and_then(|()| stdout.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_press_only_terminal_pulses_keys() {
        let mut keys = KeyTracker::default();
        keys.on_key(key(KeyCode::Left, KeyEventKind::Press));
        assert!(keys.is_held(Action::MoveLeft));
        keys.end_tick();
        assert!(!keys.is_held(Action::MoveLeft));
    }

    #[test]
    fn test_release_reporting_terminal_holds_until_release() {
        let mut keys = KeyTracker::default();
        keys.on_key(key(KeyCode::Char('x'), KeyEventKind::Release));
        keys.end_tick();
        keys.on_key(key(KeyCode::Right, KeyEventKind::Press));
        keys.end_tick();
        assert!(keys.is_held(Action::MoveRight));
        keys.on_key(key(KeyCode::Right, KeyEventKind::Release));
        assert!(!keys.is_held(Action::MoveRight));
        assert!(keys.released);
    }

    #[test]
    fn test_reset_gesture_ignores_case() {
        let mut keys = KeyTracker::default();
        keys.on_key(key(KeyCode::Char('x'), KeyEventKind::Release));
        keys.on_key(key(KeyCode::Char('H'), KeyEventKind::Press));
        keys.on_key(key(KeyCode::Char('r'), KeyEventKind::Press));
        assert!(keys.code_held(KeyCode::Char('h')));
        assert!(keys.was_pressed(Action::Restart));
    }
}
