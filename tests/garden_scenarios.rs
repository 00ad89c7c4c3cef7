//! Garden scenarios driven through the public API.

use flowergarden::bag::{Bag, PoolContext, rock_weight};
use flowergarden::grid::Placement;
use flowergarden::matcher::PendingClears;
use flowergarden::physics::{self, FallingBlock, StepOutcome};
use flowergarden::shapes::{ShapeFamily, ShapeId, ShapeTable};
use flowergarden::{
    Block, Event, FlowerKind, Grid, InputFrame, ResourceKind, RulesConfig, Scene, Simulation,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn put(grid: &mut Grid, x: i32, y: i32, kind: ResourceKind) {
    assert!(matches!(
        grid.set(x, y, Some(Block::new(kind, x, y))),
        Placement::Placed(_)
    ));
}

fn start_playing(sim: &mut Simulation) {
    sim.tick(&InputFrame::default());
    for _ in 0..sim.config().title_grace {
        sim.tick(&InputFrame::default());
    }
    sim.tick(&InputFrame {
        any_key_up: true,
        ..InputFrame::default()
    });
    assert_eq!(sim.scene(), Scene::Playing);
}

#[test]
fn test_out_of_bounds_get_is_empty() {
    let grid = Grid::new(10, 10);
    for (x, y) in [(-1, 0), (0, -1), (10, 0), (0, 10), (i32::MAX, i32::MIN)] {
        assert_eq!(grid.get(x, y), None, "({x}, {y})");
    }
}

#[test]
fn test_o_shape_scan_finds_single_match() {
    let mut grid = Grid::new(10, 10);
    put(&mut grid, 0, 0, ResourceKind::Seed);
    put(&mut grid, 1, 0, ResourceKind::Soil);
    put(&mut grid, 0, 1, ResourceKind::Water);
    put(&mut grid, 1, 1, ResourceKind::Sun);

    let table = ShapeTable::standard().unwrap();
    let mut pending = PendingClears::new();
    assert_eq!(pending.scan(&grid, &table, 60, 10), 1);

    let shape = pending.iter().next().unwrap();
    assert_eq!(shape.shape, ShapeId::Resource(ShapeFamily::O));
    let mut covered: Vec<_> = shape.blocks.iter().chain(&shape.catalysts).copied().collect();
    covered.sort_unstable_by_key(|id| grid.block(*id).map(|b| (b.row(), b.x)));
    let expected: Vec<_> = [(0, 0), (1, 0), (0, 1), (1, 1)]
        .iter()
        .filter_map(|&(x, y)| grid.id_at(x, y))
        .collect();
    assert_eq!(covered, expected);
}

#[test]
fn test_bag_exhausts_then_refills() {
    let mut rng = StdRng::seed_from_u64(3);
    let ctx = PoolContext::default();
    let mut bag = Bag::new();

    let mut drawn: Vec<_> = (0..7).map(|_| bag.next(ctx, &mut rng)).collect();
    assert!(bag.is_empty());
    assert_eq!(bag.refills(), 1);
    drawn.sort_unstable();
    let mut expected = vec![
        ResourceKind::Seed,
        ResourceKind::Seed,
        ResourceKind::Soil,
        ResourceKind::Soil,
        ResourceKind::Water,
        ResourceKind::Water,
        ResourceKind::Sun,
    ];
    expected.sort_unstable();
    assert_eq!(drawn, expected);

    bag.next(ctx, &mut rng);
    assert_eq!(bag.refills(), 2);
}

#[test]
fn test_rock_weight_by_wave() {
    assert_eq!(rock_weight(1), 0);
    assert_eq!(rock_weight(3), 1);
    assert_eq!(rock_weight(7), 0);
    assert_eq!(rock_weight(8), 1);
}

#[test]
fn test_peek_twice_returns_same_kind() {
    let mut sim = Simulation::new(RulesConfig::default(), 11).unwrap();
    let first = sim.peek_next();
    assert_eq!(sim.peek_next(), first);
}

#[test]
fn test_landed_block_is_in_grid_and_no_longer_falling() {
    let mut grid = Grid::new(10, 10);
    put(&mut grid, 3, 0, ResourceKind::Rock);
    let mut falling = Some(FallingBlock::new(ResourceKind::Water, 3, 4));
    let mut last_y = falling.unwrap().y();
    loop {
        match physics::step_down(&mut grid, &mut falling) {
            StepOutcome::Fell => {
                let y = falling.unwrap().y();
                assert!(y >= 0.0 && y < last_y);
                last_y = y;
            }
            StepOutcome::Landed { id, x, y } => {
                assert_eq!((x, y), (3, 1));
                assert_eq!(grid.id_at(3, 1), Some(id));
                assert!(falling.is_none());
                break;
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_resettle_stabilises() {
    let mut grid = Grid::new(10, 10);
    put(&mut grid, 2, 3, ResourceKind::Seed);
    put(&mut grid, 2, 6, ResourceKind::Soil);
    put(&mut grid, 7, 0, ResourceKind::Rock);
    put(&mut grid, 7, 2, ResourceKind::Water);
    assert!(physics::any_loose_blocks(&grid));

    let mut passes = 0;
    while physics::resettle(&mut grid) > 0 {
        passes += 1;
        assert!(passes < 100);
    }
    assert!(!physics::any_loose_blocks(&grid));
    assert!(grid.is_consistent());
    assert_eq!(grid.get(2, 0).map(|b| b.kind), Some(ResourceKind::Seed));
    assert_eq!(grid.get(2, 1).map(|b| b.kind), Some(ResourceKind::Soil));
    assert_eq!(grid.get(7, 1).map(|b| b.kind), Some(ResourceKind::Water));
}

#[test]
fn test_overflow_records_game_over_tick() {
    let mut sim = Simulation::new(RulesConfig::default(), 5).unwrap();
    start_playing(&mut sim);
    for y in 0..10 {
        put(sim.grid_mut(), 0, y, ResourceKind::Rock);
    }
    sim.set_falling(Some(FallingBlock::new(ResourceKind::Seed, 0, 10)));

    let mut last_clock = sim.clock();
    for _ in 0..100 {
        if sim.scene() == Scene::GameOver {
            break;
        }
        last_clock = sim.clock();
        sim.tick(&InputFrame::default());
    }
    assert_eq!(sim.scene(), Scene::GameOver);
    assert_eq!(sim.game_over_at(), Some(last_clock));
}

#[test]
fn test_clear_scores_and_blooms() {
    let mut sim = Simulation::new(RulesConfig::default(), 9).unwrap();
    start_playing(&mut sim);
    let grid = sim.grid_mut();
    put(grid, 4, 0, ResourceKind::Soil);
    put(grid, 5, 0, ResourceKind::Seed);
    put(grid, 4, 1, ResourceKind::Sun);
    sim.set_falling(Some(FallingBlock::new(ResourceKind::Water, 5, 3)));

    let mut ticks = 0;
    while sim.total_score() == 0 {
        sim.tick(&InputFrame::default());
        ticks += 1;
        assert!(ticks < 1000);
    }
    assert_eq!(sim.total_score(), 10);
    assert_eq!(
        sim.grid().get(4, 0).map(|b| b.kind),
        Some(ResourceKind::Flower(FlowerKind::Daisy))
    );
    // Sun stays behind.
    assert_eq!(sim.grid().get(4, 1).map(|b| b.kind), Some(ResourceKind::Sun));
    assert!(
        sim.drain_events()
            .iter()
            .any(|e| matches!(e, Event::Sound(flowergarden::Cue::ShapeClear)))
    );
}

/// Tick until the total score changes `count` times, recording (total, multiplier) each time.
fn score_steps(sim: &mut Simulation, count: usize) -> Vec<(u64, u64)> {
    let mut steps = Vec::new();
    let mut last = sim.total_score();
    for _ in 0..2000 {
        sim.tick(&InputFrame::default());
        if sim.total_score() != last {
            last = sim.total_score();
            assert!(sim.falling().is_none(), "a piece spawned mid cascade");
            steps.push((last, sim.cascade_multiplier()));
            if steps.len() == count {
                break;
            }
        }
    }
    steps
}

#[test]
fn test_cascade_after_resettle_triples_multiplier() {
    let mut sim = Simulation::new(RulesConfig::default(), 21).unwrap();
    start_playing(&mut sim);
    let grid = sim.grid_mut();
    for (x, y, kind) in [
        (0, 0, ResourceKind::Seed),
        (1, 0, ResourceKind::Soil),
        (2, 0, ResourceKind::Water),
        (4, 0, ResourceKind::Water),
        (1, 1, ResourceKind::Seed),
        (2, 1, ResourceKind::Soil),
    ] {
        put(grid, x, y, kind);
    }
    sim.set_falling(Some(FallingBlock::new(ResourceKind::Sun, 3, 1)));

    assert_eq!(score_steps(&mut sim, 2), [(10, 3), (40, 9)]);

    let mut ticks = 0;
    while sim.falling().is_none() {
        sim.tick(&InputFrame::default());
        ticks += 1;
        assert!(ticks < 2000);
    }
    assert_eq!(sim.cascade_multiplier(), 1);
}

#[test]
fn test_resources_trapped_under_flower_clear_once_quiet() {
    let mut sim = Simulation::new(RulesConfig::default(), 4).unwrap();
    start_playing(&mut sim);
    let grid = sim.grid_mut();
    for (x, y, kind) in [
        (0, 0, ResourceKind::Rock),
        (1, 0, ResourceKind::Rock),
        (0, 1, ResourceKind::Seed),
        (1, 1, ResourceKind::Soil),
        (0, 2, ResourceKind::Water),
    ] {
        put(grid, x, y, kind);
    }
    sim.set_falling(Some(FallingBlock::new(ResourceKind::Sun, 1, 3)));

    // The bloom, then the rock under the daisy at the tripled multiplier.
    assert_eq!(score_steps(&mut sim, 2), [(10, 3), (40, 9)]);

    let daisy = ResourceKind::Flower(FlowerKind::Daisy);
    let mut ticks = 0;
    while sim.grid().get(0, 0).map(|b| b.kind) != Some(daisy) {
        sim.tick(&InputFrame::default());
        ticks += 1;
        assert!(ticks < 2000);
    }
    assert_eq!(sim.grid().get(1, 0).map(|b| b.kind), Some(ResourceKind::Rock));
    assert_eq!(sim.grid().get(2, 0), None);
    assert_eq!(sim.total_score(), 40);
}
