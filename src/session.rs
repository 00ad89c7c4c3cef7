//! Session state machine: scenes, the per-tick playing loop, cascade and wave scoring, score
//! easing and input debounce.

use crate::bag::{Bag, PoolContext};
use crate::config::RulesConfig;
use crate::error::ConfigError;
use crate::events::{Cue, Event};
use crate::grid::Grid;
use crate::input::InputFrame;
use crate::matcher::{Cleared, PendingClears};
use crate::physics::{self, FallingBlock, Shift, StepOutcome};
use crate::resource::ResourceKind;
use crate::shapes::ShapeTable;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Displayed-score easing steps as (minimum gap, step). First match wins.
const SCORE_EASE_STEPS: [(u64, u64); 4] = [(1500, 150), (250, 25), (100, 10), (1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scene {
    #[default]
    Setup,
    Title,
    Playing,
    GameOver,
}

/// Left/right debounce. Holding a key inside the cooldown marks it pending, so a key let go on
/// the very tick the cooldown ends still moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RepeatGate {
    moved_at: Option<u64>,
    pending: bool,
}

impl RepeatGate {
    fn poll(&mut self, held: bool, clock: u64, cooldown: u64) -> bool {
        let ready = self
            .moved_at
            .is_none_or(|at| clock.saturating_sub(at) >= cooldown);
        let fire = if held {
            self.pending = !ready;
            ready
        } else {
            let fire = self.pending && ready;
            self.pending = false;
            fire
        };
        if fire {
            self.moved_at = Some(clock);
            self.pending = false;
        }
        fire
    }
}

/// The whole simulation. Owns every piece of mutable state and advances one tick at a time.
#[derive(Debug)]
pub struct Simulation {
    config: RulesConfig,
    table: ShapeTable,
    rng: StdRng,
    scene: Scene,
    clock: u64,
    lost_focus: bool,
    title_entered_at: u64,

    grid: Grid,
    falling: Option<FallingBlock>,
    bag: Bag,
    pending: PendingClears,
    held: Option<ResourceKind>,
    hold_used: bool,

    score: u64,
    total_score: u64,
    displayed_score: u64,
    high_score: u64,
    /// The high score rose during easing and has not been announced yet.
    high_score_unsaved: bool,
    wave: u32,
    cascade_multiplier: u64,

    loose_blocks: bool,
    shape_check_pending: bool,
    trapped_check_pending: bool,

    left: RepeatGate,
    right: RepeatGate,
    down_armed: bool,
    game_over_at: Option<u64>,

    events: Vec<Event>,
}

impl Simulation {
    /// Validate the rules and the shape table and start in [`Scene::Setup`].
    pub fn new(config: RulesConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = ShapeTable::standard()?;
        let grid = Grid::new(config.grid_width, config.grid_height);
        Ok(Self {
            config,
            table,
            rng: StdRng::seed_from_u64(seed),
            scene: Scene::Setup,
            clock: 0,
            lost_focus: false,
            title_entered_at: 0,
            grid,
            falling: None,
            bag: Bag::new(),
            pending: PendingClears::new(),
            held: None,
            hold_used: false,
            score: 0,
            total_score: 0,
            displayed_score: 0,
            high_score: 0,
            high_score_unsaved: false,
            wave: 1,
            cascade_multiplier: 1,
            loose_blocks: false,
            shape_check_pending: false,
            trapped_check_pending: false,
            left: RepeatGate::default(),
            right: RepeatGate::default(),
            down_armed: true,
            game_over_at: None,
            events: Vec::new(),
        })
    }

    /// Seed the stored high score read at startup.
    pub fn with_high_score(mut self, high_score: u64) -> Self {
        self.high_score = high_score;
        self
    }

    /// Advance one tick. Does nothing while focus is lost.
    pub fn tick(&mut self, input: &InputFrame) {
        if self.lost_focus {
            return;
        }
        let next = match self.scene {
            Scene::Setup => Scene::Title,
            Scene::Title => self.tick_title(input),
            Scene::Playing => self.tick_playing(input),
            Scene::GameOver => self.tick_game_over(input),
        };
        self.clock += 1;
        self.change_scene(next);
    }

    pub fn set_focus(&mut self, focused: bool) {
        if self.lost_focus == focused {
            log::debug!("focus {}", if focused { "regained" } else { "lost" });
        }
        self.lost_focus = !focused;
    }

    pub fn has_focus(&self) -> bool {
        !self.lost_focus
    }

    /// Reinitialise the round and go back to [`Scene::Setup`]. The high score and clock survive.
    pub fn reset(&mut self) {
        self.reset_round();
        self.change_scene(Scene::Setup);
    }

    /// Jump straight into play, skipping the title screen.
    pub fn begin_play(&mut self) {
        if self.scene == Scene::GameOver {
            self.reset_round();
        }
        self.start_play();
    }

    /// The kind the next spawn will use.
    pub fn peek_next(&mut self) -> ResourceKind {
        let ctx = self.pool_context();
        self.bag.peek(ctx, &mut self.rng)
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for setting up positions in tests and tools.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn falling(&self) -> Option<&FallingBlock> {
        self.falling.as_ref()
    }

    /// Replace the active piece.
    pub fn set_falling(&mut self, piece: Option<FallingBlock>) {
        self.falling = piece;
    }

    pub fn pending(&self) -> &PendingClears {
        &self.pending
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Clock tick at which the last overflow ended play.
    pub fn game_over_at(&self) -> Option<u64> {
        self.game_over_at
    }

    /// Points from clears alone; `total_score` adds the wave bonuses.
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn displayed_score(&self) -> u64 {
        self.displayed_score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn cascade_multiplier(&self) -> u64 {
        self.cascade_multiplier
    }

    pub fn held(&self) -> Option<ResourceKind> {
        self.held
    }

    /// True once hold has been used for the current piece.
    pub fn hold_used(&self) -> bool {
        self.hold_used
    }

    fn change_scene(&mut self, next: Scene) {
        if next == self.scene {
            return;
        }
        log::info!("scene {:?} -> {:?} at tick {}", self.scene, next, self.clock);
        self.flush_high_score();
        self.events.push(Event::SceneChanged {
            from: self.scene,
            to: next,
        });
        if next == Scene::Title {
            self.title_entered_at = self.clock;
        }
        self.scene = next;
    }

    fn start_play(&mut self) {
        self.events.push(Event::Sound(Cue::MusicLoop));
        self.change_scene(Scene::Playing);
    }

    fn reset_round(&mut self) {
        self.grid = Grid::new(self.config.grid_width, self.config.grid_height);
        self.falling = None;
        self.bag = Bag::new();
        self.pending.clear();
        self.held = None;
        self.hold_used = false;
        self.score = 0;
        self.total_score = 0;
        self.displayed_score = 0;
        self.wave = 1;
        self.cascade_multiplier = 1;
        self.loose_blocks = false;
        self.shape_check_pending = false;
        self.trapped_check_pending = false;
        self.left = RepeatGate::default();
        self.right = RepeatGate::default();
        self.down_armed = true;
        self.game_over_at = None;
    }

    fn tick_title(&mut self, input: &InputFrame) -> Scene {
        if self.clock.saturating_sub(self.title_entered_at) < self.config.title_grace {
            return Scene::Title;
        }
        if input.reset_high_score {
            log::info!("high score reset");
            self.high_score = 0;
            self.high_score_unsaved = false;
            self.total_score = 0;
            self.displayed_score = 0;
            self.events.push(Event::HighScore(0));
            return Scene::Title;
        }
        if input.any_key_up || input.click {
            self.events.push(Event::Sound(Cue::MusicLoop));
            return Scene::Playing;
        }
        Scene::Title
    }

    fn tick_game_over(&mut self, input: &InputFrame) -> Scene {
        self.ease_displayed_score();
        if input.restart {
            self.reset_round();
            return Scene::Setup;
        }
        Scene::GameOver
    }

    fn tick_playing(&mut self, input: &InputFrame) -> Scene {
        if physics::any_loose_blocks(&self.grid) {
            self.loose_blocks = true;
        } else {
            self.loose_blocks = false;
            if self.shape_check_pending {
                self.scan_shapes();
                self.shape_check_pending = false;
            }
            if self.trapped_check_pending && self.falling.is_none() && self.pending.is_empty() {
                self.pending.schedule_trapped(
                    &self.grid,
                    self.config.blink_ticks,
                    self.config.blink_interval,
                );
                self.trapped_check_pending = false;
            }
        }

        if !self.loose_blocks && self.falling.is_none() && self.pending.is_empty() {
            self.spawn();
        }

        if self.loose_blocks && self.clock % self.config.resettle_every == 0 {
            physics::resettle(&mut self.grid);
        }

        if let Some(next) = self.handle_block_input(input) {
            return next;
        }

        let cleared = self.pending.resolve(&mut self.grid, &mut self.rng);
        if !cleared.is_empty() {
            self.apply_clears(&cleared);
        }

        self.check_wave();

        if self.clock % self.config.flower_spin_every == 0 {
            self.spin_flowers();
        }

        self.ease_displayed_score();
        Scene::Playing
    }

    fn pool_context(&self) -> PoolContext {
        PoolContext {
            wave: self.wave,
            resource_blocks: self.grid.count(ResourceKind::is_resource),
            sun_blocks: self.grid.count(|k| k == ResourceKind::Sun),
        }
    }

    /// New piece from the bag. Resets the cascade multiplier and re-enables hold.
    fn spawn(&mut self) {
        let ctx = self.pool_context();
        let kind = self.bag.next(ctx, &mut self.rng);
        self.falling = Some(FallingBlock::spawn(kind, &self.grid));
        self.cascade_multiplier = 1;
        self.hold_used = false;
        log::debug!("spawned {kind:?}");
    }

    fn hold(&mut self) {
        let Some(piece) = self.falling else {
            return;
        };
        if self.hold_used {
            return;
        }
        let kind = match self.held.replace(piece.kind) {
            Some(kind) => kind,
            None => {
                let ctx = self.pool_context();
                self.bag.next(ctx, &mut self.rng)
            }
        };
        self.falling = Some(FallingBlock::spawn(kind, &self.grid));
        self.hold_used = true;
        self.events.push(Event::Sound(Cue::HoldSwap));
        log::debug!("held {:?}, now falling {kind:?}", piece.kind);
    }

    fn handle_block_input(&mut self, input: &InputFrame) -> Option<Scene> {
        if input.hold {
            self.hold();
        }

        let cooldown = self.config.move_cooldown;
        if self.left.poll(input.left, self.clock, cooldown) {
            self.shift_piece(Shift::Left);
        }
        if self.right.poll(input.right, self.clock, cooldown) {
            self.shift_piece(Shift::Right);
        }

        if input.down {
            if self.down_armed {
                self.down_armed = false;
                if let Some(next) = self.drop_piece() {
                    return Some(next);
                }
            }
        } else {
            self.down_armed = true;
        }

        if self.clock % self.config.auto_drop_every == 0 {
            return self.drop_piece();
        }
        None
    }

    fn shift_piece(&mut self, dir: Shift) {
        if let Some(piece) = self.falling.as_mut() {
            physics::move_horizontal(&self.grid, piece, dir);
        }
    }

    /// One half-row step of the active piece. Returns the next scene if play ended.
    fn drop_piece(&mut self) -> Option<Scene> {
        match physics::step_down(&mut self.grid, &mut self.falling) {
            StepOutcome::Idle | StepOutcome::Fell => None,
            StepOutcome::Landed { .. } => {
                self.events.push(Event::Sound(Cue::BlockPop));
                self.scan_shapes();
                None
            }
            StepOutcome::Overflow { x, y } => {
                log::info!("overflow at ({x}, {y}), game over at tick {}", self.clock);
                self.game_over_at = Some(self.clock);
                Some(Scene::GameOver)
            }
        }
    }

    fn scan_shapes(&mut self) {
        self.pending.scan(
            &self.grid,
            &self.table,
            self.config.blink_ticks,
            self.config.blink_interval,
        );
    }

    fn apply_clears(&mut self, cleared: &[Cleared]) {
        let ceiling = self.config.score_ceiling;
        for clear in cleared {
            let points = self
                .config
                .clear_points
                .saturating_mul(self.cascade_multiplier)
                .saturating_mul(u64::from(self.wave));
            self.score = self.score.saturating_add(points).min(ceiling);
            self.total_score = self.total_score.saturating_add(points).min(ceiling);
            log::debug!(
                "{:?} cleared for {points} (x{}), total {}",
                clear.shape,
                self.cascade_multiplier,
                self.total_score
            );
            self.cascade_multiplier = self.cascade_multiplier.saturating_mul(3);
            self.events.push(Event::Sound(Cue::ShapeClear));
        }
        self.loose_blocks = true;
        self.shape_check_pending = true;
        self.trapped_check_pending = true;
    }

    /// Once the bottom `wave` rows are all flowers the wave is done.
    fn check_wave(&mut self) {
        if self.loose_blocks || !self.pending.is_empty() {
            return;
        }
        let rows = i32::try_from(self.wave).unwrap_or(i32::MAX);
        if rows > self.grid.height() {
            return;
        }
        if !(0..rows).all(|y| self.grid.row_all(y, ResourceKind::is_flower)) {
            return;
        }
        let bonus = self.config.wave_bonus.saturating_mul(u64::from(self.wave));
        self.total_score = self
            .total_score
            .saturating_add(bonus)
            .min(self.config.score_ceiling);
        self.wave += 1;
        log::debug!("wave {} reached, bonus {bonus}", self.wave);
        self.events.push(Event::WaveAdvanced {
            wave: self.wave,
            bonus,
        });
    }

    fn spin_flowers(&mut self) {
        let ids: Vec<_> = self
            .grid
            .iter()
            .filter(|(_, b)| b.angle.is_some())
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            if let Some(block) = self.grid.block_mut(id) {
                block.angle = block.angle.map(|a| (a + 1) % 360);
            }
        }
    }

    fn ease_displayed_score(&mut self) {
        let gap = self.total_score.saturating_sub(self.displayed_score);
        if gap == 0 {
            if self.total_score < self.displayed_score {
                self.displayed_score = self.total_score;
            }
            return;
        }
        let step = SCORE_EASE_STEPS
            .iter()
            .find(|(min_gap, _)| gap >= *min_gap)
            .map_or(1, |&(_, step)| step);
        self.displayed_score += step;
        self.events.push(Event::Sound(Cue::ScoreTick));
        if self.displayed_score > self.high_score {
            self.high_score = self.displayed_score;
            self.high_score_unsaved = true;
        }
        if self.displayed_score == self.total_score {
            self.flush_high_score();
        }
    }

    /// Announce a raised high score once, when easing settles or the scene changes.
    fn flush_high_score(&mut self) {
        if self.high_score_unsaved {
            self.high_score_unsaved = false;
            self.events.push(Event::HighScore(self.high_score));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Block, Placement};
    use crate::resource::FlowerKind;
    use crate::resource::ResourceKind::*;

    fn sim() -> Simulation {
        Simulation::new(RulesConfig::default(), 7).unwrap()
    }

    fn idle() -> InputFrame {
        InputFrame::default()
    }

    fn put(sim: &mut Simulation, x: i32, y: i32, kind: ResourceKind) {
        let placed = sim.grid_mut().set(x, y, Some(Block::new(kind, x, y)));
        assert!(matches!(placed, Placement::Placed(_)));
    }

    /// Setup -> Title, then wait out the grace period and press a key.
    fn into_play(sim: &mut Simulation) {
        sim.tick(&idle());
        assert_eq!(sim.scene(), Scene::Title);
        for _ in 0..sim.config().title_grace {
            sim.tick(&idle());
        }
        sim.tick(&InputFrame {
            any_key_up: true,
            ..idle()
        });
        assert_eq!(sim.scene(), Scene::Playing);
    }

    #[test]
    fn test_repeat_gate_cooldown_and_pending() {
        let mut gate = RepeatGate::default();
        assert!(gate.poll(true, 0, 8));
        assert!(!gate.poll(true, 3, 8));
        assert!(gate.pending);
        // Released inside the cooldown: dropped.
        assert!(!gate.poll(false, 7, 8));
        assert!(!gate.pending);
        // Released exactly at the boundary: still moves.
        assert!(!gate.poll(true, 7, 8));
        assert!(gate.poll(false, 8, 8));
        assert!(!gate.poll(false, 9, 8));
    }

    #[test]
    fn test_title_grace_and_start() {
        let mut sim = sim();
        sim.tick(&idle());
        assert_eq!(sim.scene(), Scene::Title);
        let key = InputFrame {
            any_key_up: true,
            ..idle()
        };
        sim.tick(&key);
        assert_eq!(sim.scene(), Scene::Title);
        for _ in 0..30 {
            sim.tick(&idle());
        }
        sim.tick(&key);
        assert_eq!(sim.scene(), Scene::Playing);
        let events = sim.drain_events();
        assert!(events.contains(&Event::Sound(Cue::MusicLoop)));
        assert!(events.contains(&Event::SceneChanged {
            from: Scene::Title,
            to: Scene::Playing
        }));
    }

    #[test]
    fn test_reset_gesture_zeroes_high_score() {
        let mut sim = sim().with_high_score(500);
        sim.tick(&idle());
        for _ in 0..30 {
            sim.tick(&idle());
        }
        sim.tick(&InputFrame {
            reset_high_score: true,
            any_key_up: true,
            ..idle()
        });
        assert_eq!(sim.high_score(), 0);
        assert_eq!(sim.scene(), Scene::Title);
        assert!(sim.drain_events().contains(&Event::HighScore(0)));
    }

    #[test]
    fn test_lost_focus_freezes_clock() {
        let mut sim = sim();
        into_play(&mut sim);
        let clock = sim.clock();
        let piece = sim.falling().copied();
        sim.set_focus(false);
        for _ in 0..100 {
            sim.tick(&InputFrame {
                down: true,
                left: true,
                ..idle()
            });
        }
        assert_eq!(sim.clock(), clock);
        assert_eq!(sim.falling().copied(), piece);
        sim.set_focus(true);
        sim.tick(&idle());
        assert_eq!(sim.clock(), clock + 1);
    }

    #[test]
    fn test_spawns_centred_piece() {
        let mut sim = sim();
        into_play(&mut sim);
        sim.tick(&idle());
        let piece = sim.falling().copied().unwrap();
        assert_eq!(piece.x, 5);
        assert!(piece.y() <= 10.0);
    }

    #[test]
    fn test_soft_drop_once_per_press() {
        let mut sim = sim();
        into_play(&mut sim);
        // Line up just after an auto drop so none fires during the test.
        while sim.clock() % 30 != 1 {
            sim.tick(&idle());
        }
        let start = sim.falling().unwrap().half_y();
        let down = InputFrame {
            down: true,
            ..idle()
        };
        for _ in 0..5 {
            sim.tick(&down);
        }
        assert_eq!(sim.falling().unwrap().half_y(), start - 1);
        sim.tick(&idle());
        sim.tick(&down);
        assert_eq!(sim.falling().unwrap().half_y(), start - 2);
    }

    #[test]
    fn test_hold_swaps_once_per_spawn() {
        let mut sim = sim();
        into_play(&mut sim);
        sim.tick(&idle());
        let first = sim.falling().unwrap().kind;
        let hold = InputFrame {
            hold: true,
            ..idle()
        };
        sim.tick(&hold);
        assert_eq!(sim.held(), Some(first));
        assert!(sim.hold_used());
        let second = sim.falling().unwrap().kind;
        sim.tick(&hold);
        assert_eq!(sim.held(), Some(first));
        assert_eq!(sim.falling().unwrap().kind, second);
        assert!(sim.drain_events().contains(&Event::Sound(Cue::HoldSwap)));
    }

    #[test]
    fn test_overflow_ends_game_and_records_tick() {
        let mut sim = sim();
        into_play(&mut sim);
        for y in 0..10 {
            put(&mut sim, 5, y, Rock);
        }
        sim.set_falling(Some(FallingBlock::new(Seed, 5, 10)));
        let mut ticks = 0;
        while sim.scene() == Scene::Playing {
            let clock = sim.clock();
            sim.tick(&idle());
            ticks += 1;
            assert!(ticks < 200);
            if sim.scene() == Scene::GameOver {
                assert_eq!(sim.game_over_at(), Some(clock));
            }
        }
        assert_eq!(sim.scene(), Scene::GameOver);
        let events = sim.drain_events();
        assert!(events.contains(&Event::SceneChanged {
            from: Scene::Playing,
            to: Scene::GameOver
        }));

        sim.tick(&InputFrame {
            restart: true,
            ..idle()
        });
        assert_eq!(sim.scene(), Scene::Setup);
        assert_eq!(sim.grid().iter().count(), 0);
        assert_eq!(sim.game_over_at(), None);
    }

    #[test]
    fn test_cascade_multiplier_triples_per_clear() {
        let mut sim = sim();
        into_play(&mut sim);
        sim.cascade_multiplier = 1;
        let clear = Cleared {
            shape: crate::shapes::ShapeId::Trapped,
            removed: 1,
            flower_at: None,
        };
        sim.apply_clears(std::slice::from_ref(&clear));
        assert_eq!(sim.total_score(), 10);
        assert_eq!(sim.cascade_multiplier(), 3);
        sim.apply_clears(std::slice::from_ref(&clear));
        assert_eq!(sim.total_score(), 40);
        assert_eq!(sim.cascade_multiplier(), 9);
        sim.wave = 2;
        sim.apply_clears(std::slice::from_ref(&clear));
        assert_eq!(sim.total_score(), 40 + 180);
        sim.spawn();
        assert_eq!(sim.cascade_multiplier(), 1);
    }

    #[test]
    fn test_score_respects_ceiling() {
        let mut sim = Simulation::new(
            RulesConfig {
                score_ceiling: 25,
                ..RulesConfig::default()
            },
            1,
        )
        .unwrap();
        let clear = Cleared {
            shape: crate::shapes::ShapeId::Trapped,
            removed: 1,
            flower_at: None,
        };
        for _ in 0..5 {
            sim.apply_clears(std::slice::from_ref(&clear));
        }
        assert_eq!(sim.total_score(), 25);
    }

    #[test]
    fn test_wave_advances_when_bottom_rows_bloom() {
        let mut sim = sim();
        into_play(&mut sim);
        for x in 0..10 {
            put(&mut sim, x, 0, Flower(FlowerKind::Daisy));
        }
        sim.check_wave();
        assert_eq!(sim.wave(), 2);
        assert_eq!(sim.total_score(), 100);
        assert_eq!(sim.score(), 0);
        // Wave 2 needs two rows.
        sim.check_wave();
        assert_eq!(sim.wave(), 2);
        assert!(sim.drain_events().contains(&Event::WaveAdvanced { wave: 2, bonus: 100 }));
    }

    #[test]
    fn test_displayed_score_eases_and_updates_high_score() {
        let mut sim = sim();
        sim.total_score = 1_786;
        let mut seen = Vec::new();
        while sim.displayed_score() != sim.total_score() {
            sim.ease_displayed_score();
            seen.push(sim.displayed_score());
            assert!(seen.len() < 1000);
        }
        // Big steps first, single points at the end.
        assert_eq!(seen[0], 150);
        assert_eq!(seen[seen.len() - 1] - seen[seen.len() - 2], 1);
        assert_eq!(sim.high_score(), 1_786);
        let events = sim.drain_events();
        let writes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, Event::HighScore(_)))
            .collect();
        assert_eq!(writes, [&Event::HighScore(1_786)]);
        assert!(events.contains(&Event::Sound(Cue::ScoreTick)));
    }

    #[test]
    fn test_high_score_written_when_scene_changes_mid_ease() {
        let mut sim = sim();
        sim.total_score = 400;
        sim.ease_displayed_score();
        sim.ease_displayed_score();
        assert_eq!(sim.high_score(), 50);
        assert!(
            !sim.drain_events()
                .iter()
                .any(|e| matches!(e, Event::HighScore(_)))
        );
        sim.change_scene(Scene::GameOver);
        let events = sim.drain_events();
        assert!(events.contains(&Event::HighScore(50)));
        sim.change_scene(Scene::Setup);
        assert!(!sim.drain_events().contains(&Event::HighScore(50)));
    }

    #[test]
    fn test_landing_match_blooms_flower() {
        let mut sim = sim();
        into_play(&mut sim);
        put(&mut sim, 0, 0, Seed);
        put(&mut sim, 1, 0, Soil);
        put(&mut sim, 0, 1, Water);
        sim.set_falling(Some(FallingBlock::new(Sun, 1, 1)));
        let mut ticks = 0;
        while sim.grid().get(0, 0).is_none_or(|b| !b.kind.is_flower()) {
            sim.tick(&InputFrame {
                down: ticks % 2 == 0,
                ..idle()
            });
            ticks += 1;
            assert!(ticks < 500);
        }
        assert_eq!(
            sim.grid().get(0, 0).map(|b| b.kind),
            Some(Flower(FlowerKind::Daisy))
        );
        assert!(sim.total_score() >= 10);
    }
}
