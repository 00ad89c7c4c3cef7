//! Per-tick input sample and the pointer zones that mirror the keyboard controls.

/// Input sampled once per tick by whatever owns the devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    /// Left is held.
    pub left: bool,
    /// Right is held.
    pub right: bool,
    /// Down is held. Soft drop fires once per press.
    pub down: bool,
    /// Hold was pressed this tick.
    pub hold: bool,
    /// Some key was released this tick.
    pub any_key_up: bool,
    pub click: bool,
    /// Title-screen gesture that zeroes the stored high score.
    pub reset_high_score: bool,
    /// Leave the game-over screen.
    pub restart: bool,
}

impl InputFrame {
    /// Fold a held pointer zone into this frame as if its key were held.
    pub fn press_zone(&mut self, zone: TouchZone) {
        match zone {
            TouchZone::Left => self.left = true,
            TouchZone::Right => self.right = true,
            TouchZone::Down => self.down = true,
            TouchZone::Hold => self.hold = true,
        }
    }
}

/// Pointer regions mapped 1:1 to keyboard actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchZone {
    Left,
    Right,
    Down,
    Hold,
}

/// Zone layout over a pointer surface of `width` x `height`, origin top-left: the bottom
/// quarter drops, the top-right corner holds, and the rest splits into left and right halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchLayout {
    pub width: u16,
    pub height: u16,
}

impl TouchLayout {
    pub fn zone_at(&self, x: u16, y: u16) -> Option<TouchZone> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let (x, y) = (u32::from(x), u32::from(y));
        let (w, h) = (u32::from(self.width), u32::from(self.height));
        if y * 4 >= h * 3 {
            Some(TouchZone::Down)
        } else if y * 4 < h && x * 4 >= w * 3 {
            Some(TouchZone::Hold)
        } else if x * 2 < w {
            Some(TouchZone::Left)
        } else {
            Some(TouchZone::Right)
        }
    }
}
