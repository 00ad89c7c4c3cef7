//! Shape matcher: finds every template match on the grid, picks the best set that does not share
//! consumed blocks, and turns the picks into timed pending clears that bloom into flowers.

use crate::grid::{Block, BlockId, Grid};
use crate::resource::ResourceKind;
use crate::shapes::{ShapeId, ShapeTable};
use rand::Rng;
use std::collections::HashSet;

/// Above this many candidates the include/exclude search is replaced by a greedy pass.
pub const EXHAUSTIVE_CANDIDATE_LIMIT: usize = 20;

const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One template match at one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub shape: ShapeId,
    pub origin: (i32, i32),
    /// Blocks the match uses up.
    pub blocks: Vec<BlockId>,
    /// Wildcard blocks that only had to be present.
    pub catalysts: Vec<BlockId>,
}

impl Candidate {
    #[inline]
    pub fn weight(&self) -> usize {
        self.blocks.len()
    }

    /// Two candidates conflict when they would consume the same block.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.blocks.iter().any(|b| other.blocks.contains(b))
    }

    /// Every block the match covers, consumed or not.
    pub fn cells(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().chain(self.catalysts.iter()).copied()
    }
}

/// Every template match on the grid, scanning origins bottom-left first.
pub fn find_candidates(grid: &Grid, table: &ShapeTable) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<(ShapeId, Vec<BlockId>)> = HashSet::new();
    let mut ids = Vec::with_capacity(4);
    let mut kinds = Vec::with_capacity(4);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            for template in table.templates() {
                ids.clear();
                kinds.clear();
                for &(dx, dy) in &template.coords {
                    let Some(id) = grid.id_at(x + dx, y + dy) else {
                        break;
                    };
                    let Some(block) = grid.block(id) else {
                        break;
                    };
                    ids.push(id);
                    kinds.push(block.kind);
                }
                if ids.len() != template.coords.len() {
                    continue;
                }
                let Some(m) = template.rule.check(&kinds) else {
                    continue;
                };
                let candidate = Candidate {
                    shape: template.shape,
                    origin: (x, y),
                    blocks: m.consumed.iter().map(|&i| ids[i]).collect(),
                    catalysts: m.wildcards.iter().map(|&i| ids[i]).collect(),
                };
                let mut key = candidate.cells().collect::<Vec<_>>();
                key.sort_unstable();
                if seen.insert((candidate.shape, key)) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

/// Indices of a non-conflicting subset of `candidates` with the largest total weight.
///
/// Exhaustive include/exclude search, so exponential in the candidate count. Past
/// [`EXHAUSTIVE_CANDIDATE_LIMIT`] it falls back to a heaviest-first greedy pick, which keeps
/// the non-overlap guarantee but may leave weight on the table.
pub fn select_best(candidates: &[Candidate]) -> Vec<usize> {
    if candidates.len() > EXHAUSTIVE_CANDIDATE_LIMIT {
        log::warn!(
            "{} shape candidates exceed the exhaustive limit of {}; selecting greedily",
            candidates.len(),
            EXHAUSTIVE_CANDIDATE_LIMIT
        );
        return select_greedy(candidates);
    }
    // suffix[i] = total weight of candidates[i..], an upper bound for pruning.
    let mut suffix = vec![0; candidates.len() + 1];
    for i in (0..candidates.len()).rev() {
        suffix[i] = suffix[i + 1] + candidates[i].weight();
    }
    let mut search = Search {
        candidates,
        suffix: &suffix,
        chosen: Vec::new(),
        best: Vec::new(),
        best_weight: 0,
    };
    search.run(0, 0);
    search.best
}

struct Search<'a> {
    candidates: &'a [Candidate],
    suffix: &'a [usize],
    chosen: Vec<usize>,
    best: Vec<usize>,
    best_weight: usize,
}

impl Search<'_> {
    fn run(&mut self, i: usize, weight: usize) {
        if weight > self.best_weight {
            self.best_weight = weight;
            self.best = self.chosen.clone();
        }
        if i == self.candidates.len() || weight + self.suffix[i] <= self.best_weight {
            return;
        }
        let candidate = &self.candidates[i];
        let fits = self
            .chosen
            .iter()
            .all(|&c| !self.candidates[c].conflicts_with(candidate));
        if fits {
            self.chosen.push(i);
            self.run(i + 1, weight + candidate.weight());
            self.chosen.pop();
        }
        self.run(i + 1, weight);
    }
}

fn select_greedy(candidates: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(candidates[i].weight()));
    let mut chosen: Vec<usize> = Vec::new();
    for i in order {
        if chosen.iter().all(|&c| !candidates[c].conflicts_with(&candidates[i])) {
            chosen.push(i);
        }
    }
    chosen.sort_unstable();
    chosen
}

/// A matched shape waiting to clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkingShape {
    pub shape: ShapeId,
    /// Blocks removed when the timer runs out. Claimed exclusively by this shape.
    pub blocks: Vec<BlockId>,
    /// Wildcard blocks that stay behind.
    pub catalysts: Vec<BlockId>,
    pub timer: u32,
    pub blink_interval: u32,
    pub visible: bool,
}

impl BlinkingShape {
    pub fn new(
        shape: ShapeId,
        blocks: Vec<BlockId>,
        catalysts: Vec<BlockId>,
        timer: u32,
        blink_interval: u32,
    ) -> Self {
        Self {
            shape,
            blocks,
            catalysts,
            timer,
            blink_interval,
            visible: true,
        }
    }
}

/// What a finished pending clear did to the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleared {
    pub shape: ShapeId,
    pub removed: usize,
    /// Where the bloomed flower went, if the shape blooms.
    pub flower_at: Option<(i32, i32)>,
}

/// Pending clears. No block id appears in two entries' `blocks`.
#[derive(Debug, Clone, Default)]
pub struct PendingClears {
    shapes: Vec<BlinkingShape>,
}

impl PendingClears {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlinkingShape> {
        self.shapes.iter()
    }

    /// True if some pending shape will remove this block.
    pub fn is_claimed(&self, id: BlockId) -> bool {
        self.shapes.iter().any(|s| s.blocks.contains(&id))
    }

    /// Add a pending clear unless one of its blocks is already claimed.
    pub fn push(&mut self, shape: BlinkingShape) -> bool {
        if shape.blocks.iter().any(|&b| self.is_claimed(b)) {
            return false;
        }
        self.shapes.push(shape);
        true
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Scan the grid and schedule the best non-overlapping set of new matches. Flower clusters
    /// also take the rocks around them. Returns how many shapes were scheduled.
    pub fn scan(
        &mut self,
        grid: &Grid,
        table: &ShapeTable,
        blink_ticks: u32,
        blink_interval: u32,
    ) -> usize {
        let candidates: Vec<Candidate> = find_candidates(grid, table)
            .into_iter()
            .filter(|c| !c.cells().any(|b| self.is_claimed(b)))
            .collect();
        if candidates.is_empty() {
            return 0;
        }
        let picks = select_best(&candidates);
        let mut claimed: HashSet<BlockId> = picks
            .iter()
            .flat_map(|&i| candidates[i].blocks.iter().copied())
            .collect();
        let mut scheduled = 0;
        for i in picks {
            let candidate = &candidates[i];
            let mut blocks = candidate.blocks.clone();
            if candidate.shape.is_flower_family() {
                for rock in nearby_rocks(grid, &candidate.blocks) {
                    if !self.is_claimed(rock) && claimed.insert(rock) {
                        blocks.push(rock);
                    }
                }
            }
            log::debug!(
                "matched {:?} at {:?} ({} blocks)",
                candidate.shape,
                candidate.origin,
                blocks.len()
            );
            let shape = BlinkingShape::new(
                candidate.shape,
                blocks,
                candidate.catalysts.clone(),
                blink_ticks,
                blink_interval,
            );
            if self.push(shape) {
                scheduled += 1;
            }
        }
        scheduled
    }

    /// Queue resources sitting directly under a flower as one clear group, so they are not stuck
    /// forever. Returns true if a group was queued.
    pub fn schedule_trapped(&mut self, grid: &Grid, blink_ticks: u32, blink_interval: u32) -> bool {
        let trapped: Vec<BlockId> = grid
            .iter()
            .filter(|(id, b)| {
                b.kind.is_resource()
                    && !self.is_claimed(*id)
                    && grid
                        .get(b.x, b.row() + 1)
                        .is_some_and(|above| above.kind.is_flower())
            })
            .map(|(id, _)| id)
            .collect();
        if trapped.is_empty() {
            return false;
        }
        log::debug!("{} trapped resources queued", trapped.len());
        self.push(BlinkingShape::new(
            ShapeId::Trapped,
            trapped,
            Vec::new(),
            blink_ticks,
            blink_interval,
        ))
    }

    /// Advance every pending clear by one tick. Finished ones remove their blocks and, for
    /// resource shapes, leave one flower at the lowest-then-leftmost cleared cell.
    pub fn resolve<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> Vec<Cleared> {
        for shape in &mut self.shapes {
            shape.timer = shape.timer.saturating_sub(1);
            if shape.blink_interval > 0 && shape.timer % shape.blink_interval == 0 {
                shape.visible = !shape.visible;
            }
        }
        let (done, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.shapes).into_iter().partition(|s| s.timer == 0);
        self.shapes = waiting;

        let mut cleared = Vec::with_capacity(done.len());
        for shape in done {
            let positions: Vec<(i32, i32)> = shape
                .blocks
                .iter()
                .filter_map(|&id| grid.block(id).map(|b| (b.x, b.row())))
                .collect();
            let removed = shape
                .blocks
                .iter()
                .filter(|&&id| grid.remove(id).is_some())
                .count();
            let flower_at = shape.shape.bloom().and_then(|flower| {
                let (x, y) = lowest_leftmost(&positions)?;
                let angle = rng.random_range(0..360);
                let block = Block::new(ResourceKind::Flower(flower), x, y).with_angle(angle);
                grid.set(x, y, Some(block));
                Some((x, y))
            });
            log::debug!("cleared {:?}: {} blocks, flower at {:?}", shape.shape, removed, flower_at);
            cleared.push(Cleared {
                shape: shape.shape,
                removed,
                flower_at,
            });
        }
        cleared
    }
}

fn nearby_rocks(grid: &Grid, blocks: &[BlockId]) -> Vec<BlockId> {
    let mut rocks = Vec::new();
    for block in blocks.iter().filter_map(|&id| grid.block(id)) {
        for (dx, dy) in NEIGHBOURS_8 {
            if let Some(id) = grid.id_at(block.x + dx, block.row() + dy) {
                let is_rock = grid.block(id).is_some_and(|b| b.kind == ResourceKind::Rock);
                if is_rock && !rocks.contains(&id) {
                    rocks.push(id);
                }
            }
        }
    }
    rocks
}

/// Lowest row first, then leftmost column.
pub fn lowest_leftmost(positions: &[(i32, i32)]) -> Option<(i32, i32)> {
    positions.iter().copied().min_by_key(|&(x, y)| (y, x))
}
