//! Read-only draw list for render sinks. Positions are in tile units with y=0 at the floor.

use crate::resource::ResourceKind;
use crate::session::Simulation;

/// Which pass produced a primitive. Sinks may style layers differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Settled,
    Falling,
    Blinking,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPrimitive {
    pub x: f32,
    pub y: f32,
    pub sprite: ResourceKind,
    /// Rotation in degrees, flowers only.
    pub angle: Option<u16>,
    /// 0 transparent, 255 opaque. Blinking blocks fade out as their clear timer runs down.
    pub alpha: u8,
    pub layer: Layer,
}

impl DrawPrimitive {
    fn tile(x: f32, y: f32, sprite: ResourceKind, layer: Layer) -> Self {
        Self {
            x,
            y,
            sprite,
            angle: None,
            alpha: u8::MAX,
            layer,
        }
    }
}

/// Settled blocks not waiting to clear, then the falling piece, then blinking blocks in their
/// visible phase.
pub fn draw_list(sim: &Simulation) -> Vec<DrawPrimitive> {
    let grid = sim.grid();
    let pending = sim.pending();
    let mut out = Vec::with_capacity(grid.iter().count() + 1);

    for (id, block) in grid.iter() {
        if pending.is_claimed(id) {
            continue;
        }
        let mut prim = DrawPrimitive::tile(block.x as f32, block.y(), block.kind, Layer::Settled);
        prim.angle = block.angle;
        out.push(prim);
    }

    if let Some(piece) = sim.falling() {
        out.push(DrawPrimitive::tile(
            piece.x as f32,
            piece.y(),
            piece.kind,
            Layer::Falling,
        ));
    }

    let blink_ticks = u64::from(sim.config().blink_ticks.max(1));
    for shape in pending.iter().filter(|s| s.visible) {
        let alpha = (u64::from(shape.timer).min(blink_ticks) * 255 / blink_ticks) as u8;
        for block in shape.blocks.iter().filter_map(|&id| grid.block(id)) {
            let mut prim =
                DrawPrimitive::tile(block.x as f32, block.y(), block.kind, Layer::Blinking);
            prim.angle = block.angle;
            prim.alpha = alpha;
            out.push(prim);
        }
    }
    out
}
