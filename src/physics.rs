//! Block physics: the falling piece's half-row descent and landing, and the slow resettle of
//! settled blocks that lost their support.

use crate::grid::{Block, BlockId, Grid, Placement};
use crate::resource::ResourceKind;

/// The player-controlled piece. Not part of the grid until it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallingBlock {
    pub kind: ResourceKind,
    pub x: i32,
    half_y: i32,
}

impl FallingBlock {
    pub fn new(kind: ResourceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            half_y: y * 2,
        }
    }

    /// New piece in the centre column of the spawn row just above the grid.
    pub fn spawn(kind: ResourceKind, grid: &Grid) -> Self {
        Self::new(kind, grid.width() / 2, grid.height())
    }

    #[inline]
    pub fn half_y(&self) -> i32 {
        self.half_y
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.half_y as f32 / 2.0
    }

    #[inline]
    pub fn floor_row(&self) -> i32 {
        self.half_y.div_euclid(2)
    }

    #[inline]
    pub fn ceil_row(&self) -> i32 {
        (self.half_y + 1).div_euclid(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Left,
    Right,
}

impl Shift {
    #[inline]
    fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// What one half-row step did to the falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No falling piece.
    Idle,
    Fell,
    Landed { id: BlockId, x: i32, y: i32 },
    /// The piece had to land at or above the grid height.
    Overflow { x: i32, y: i32 },
}

/// Slide the piece one column. Rejected silently if the column is outside the grid or occupied
/// at either row the piece currently spans.
pub fn move_horizontal(grid: &Grid, piece: &mut FallingBlock, dir: Shift) -> bool {
    let new_x = piece.x + dir.dx();
    if new_x < 0 || new_x >= grid.width() {
        return false;
    }
    if grid.is_occupied(new_x, piece.floor_row()) || grid.is_occupied(new_x, piece.ceil_row()) {
        return false;
    }
    piece.x = new_x;
    true
}

/// Lower the piece half a row, or land it into the grid if the row below is the floor or taken.
pub fn step_down(grid: &mut Grid, falling: &mut Option<FallingBlock>) -> StepOutcome {
    let Some(piece) = falling.as_mut() else {
        return StepOutcome::Idle;
    };
    let next_half = piece.half_y - 1;
    let target_row = next_half.div_euclid(2);
    if next_half >= 0 && !grid.is_occupied(piece.x, target_row) {
        piece.half_y = next_half;
        return StepOutcome::Fell;
    }

    let piece = *piece;
    *falling = None;
    // A resettling block may have slipped into the floor row; land on top of the column instead.
    let mut row = piece.floor_row();
    while grid.is_occupied(piece.x, row) {
        row += 1;
    }
    match grid.set(piece.x, row, Some(Block::new(piece.kind, piece.x, row))) {
        Placement::Placed(id) => {
            log::debug!("{:?} landed at ({}, {})", piece.kind, piece.x, row);
            StepOutcome::Landed {
                id,
                x: piece.x,
                y: row,
            }
        }
        _ => {
            log::info!("{:?} overflowed at ({}, {})", piece.kind, piece.x, row);
            StepOutcome::Overflow { x: piece.x, y: row }
        }
    }
}

/// A settled block is loose while it is between rows or has nothing under it above the floor.
pub fn is_loose(grid: &Grid, block: &Block) -> bool {
    block.is_half_step() || (block.row() > 0 && !grid.is_occupied(block.x, block.row() - 1))
}

pub fn any_loose_blocks(grid: &Grid) -> bool {
    grid.iter().any(|(_, b)| is_loose(grid, b))
}

/// Advance the lowest loose blocks by half a row. Only the lowest ones move, so supports settle
/// before the blocks resting on them. Returns how many blocks moved.
pub fn resettle(grid: &mut Grid) -> usize {
    let loose: Vec<(BlockId, i32)> = grid
        .iter()
        .filter(|(_, b)| is_loose(grid, b))
        .map(|(id, b)| (id, b.half_y()))
        .collect();
    let Some(lowest) = loose.iter().map(|&(_, half_y)| half_y).min() else {
        return 0;
    };
    let mut moved = 0;
    for (id, half_y) in loose {
        if half_y == lowest && grid.shift_to(id, (half_y - 1).max(0)) {
            moved += 1;
        }
    }
    moved
}
