//! Fire-and-forget notifications for the outside world (audio, persistence, logging).

use crate::session::Scene;

/// Audio triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Displayed score moved one step towards the total.
    ScoreTick,
    ShapeClear,
    /// A falling block landed.
    BlockPop,
    HoldSwap,
    /// Start of play; the sink loops it.
    MusicLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Sound(Cue),
    SceneChanged { from: Scene, to: Scene },
    /// The stored high score should now be this value.
    HighScore(u64),
    WaveAdvanced { wave: u32, bonus: u64 },
}
