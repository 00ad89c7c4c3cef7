//! Grid store: a fixed-size, row-major cell array over a block arena.
//!
//! Cells hold `BlockId` handles, never blocks. Blocks live in the arena so that the grid and the
//! pending-clear list can both refer to "the same block" by comparing handles. y=0 is the floor.

use crate::resource::ResourceKind;

/// Generation-checked handle into the block arena. A handle to a removed block stays dead even
/// after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    index: u32,
    generation: u32,
}

/// A settled block. `y` is stored in half rows so the half-step resettle is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: ResourceKind,
    pub x: i32,
    half_y: i32,
    /// Display rotation in degrees; only bloomed flowers carry one.
    pub angle: Option<u16>,
}

impl Block {
    pub fn new(kind: ResourceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            half_y: y * 2,
            angle: None,
        }
    }

    pub fn with_angle(mut self, angle: u16) -> Self {
        self.angle = Some(angle % 360);
        self
    }

    #[inline]
    pub fn half_y(&self) -> i32 {
        self.half_y
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.half_y as f32 / 2.0
    }

    /// Row of the cell that references this block (floor of `y`).
    #[inline]
    pub fn row(&self) -> i32 {
        self.half_y.div_euclid(2)
    }

    /// True while the block sits between two rows.
    #[inline]
    pub fn is_half_step(&self) -> bool {
        self.half_y.rem_euclid(2) == 1
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    block: Option<Block>,
}

/// Result of writing a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed(BlockId),
    Cleared,
    /// Row at or above the grid height: the stack overflowed.
    Overflow,
    /// Left of, right of, or below the grid.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Option<BlockId>>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let (w, h) = (width.max(0) as usize, height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![None; w * h],
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Handle at (x, y); `None` for empty and out-of-bounds cells alike.
    #[inline]
    pub fn id_at(&self, x: i32, y: i32) -> Option<BlockId> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// Block at (x, y); `None` for empty and out-of-bounds cells alike.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Block> {
        self.id_at(x, y).and_then(|id| self.block(id).copied())
    }

    #[inline]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.id_at(x, y).is_some()
    }

    /// Arena lookup; `None` once the block has been removed.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.block.as_ref())
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.block.as_mut())
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        self.block(id).is_some()
    }

    /// Write one cell. `Some(block)` replaces whatever was there and moves the block to (x, y);
    /// `None` empties the cell. Nothing else changes.
    pub fn set(&mut self, x: i32, y: i32, block: Option<Block>) -> Placement {
        if x >= 0 && x < self.width && y >= self.height {
            return Placement::Overflow;
        }
        let Some(i) = self.index(x, y) else {
            return Placement::Rejected;
        };
        if let Some(old) = self.cells[i].take() {
            self.release(old);
        }
        match block {
            Some(mut block) => {
                block.x = x;
                block.half_y = y * 2;
                let id = self.allocate(block);
                self.cells[i] = Some(id);
                Placement::Placed(id)
            }
            None => Placement::Cleared,
        }
    }

    /// Remove a block by handle, emptying its cell.
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let block = *self.block(id)?;
        if let Some(i) = self.index(block.x, block.row()) {
            if self.cells[i] == Some(id) {
                self.cells[i] = None;
            }
        }
        self.release(id);
        Some(block)
    }

    /// Move a settled block to a new half-row height in its column. The cell reference follows
    /// the floor row. Returns false (and does nothing) if the target cell holds another block.
    pub fn shift_to(&mut self, id: BlockId, half_y: i32) -> bool {
        let Some(block) = self.block(id).copied() else {
            return false;
        };
        let old_row = block.row();
        let new_row = half_y.div_euclid(2);
        if new_row != old_row {
            let Some(target) = self.index(block.x, new_row) else {
                return false;
            };
            if self.cells[target].is_some_and(|other| other != id) {
                return false;
            }
            if let Some(source) = self.index(block.x, old_row) {
                self.cells[source] = None;
            }
            self.cells[target] = Some(id);
        }
        if let Some(b) = self.block_mut(id) {
            b.half_y = half_y;
        }
        true
    }

    /// Settled blocks in row-major order from the floor up.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.cells
            .iter()
            .flatten()
            .filter_map(|&id| self.block(id).map(|b| (id, b)))
    }

    pub fn count(&self, pred: impl Fn(ResourceKind) -> bool) -> usize {
        self.iter().filter(|(_, b)| pred(b.kind)).count()
    }

    /// True if every cell of row `y` holds a block matching `pred`.
    pub fn row_all(&self, y: i32, pred: impl Fn(ResourceKind) -> bool) -> bool {
        (0..self.width).all(|x| self.get(x, y).is_some_and(|b| pred(b.kind)))
    }

    fn allocate(&mut self, block: Block) -> BlockId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.block = Some(block);
            BlockId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                block: Some(block),
            });
            BlockId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: BlockId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.block.is_some() {
                slot.block = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Every cell's block must sit at that cell. Used by tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(i, cell)| match cell {
            None => true,
            Some(id) => self.block(*id).is_some_and(|b| {
                let (x, y) = ((i as i32) % self.width, (i as i32) / self.width);
                b.x == x && b.row() == y
            }),
        })
    }
}
