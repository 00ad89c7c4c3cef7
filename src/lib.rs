//! Flower Garden simulation core.
//!
//! Resource blocks (seed, soil, water, sun, rock) fall one at a time into a small grid. When
//! settled blocks form one of the polyomino shapes with the right mix of kinds, they blink and
//! clear, leaving a flower behind. Filling the bottom rows with flowers advances the wave.
//!
//! Everything here is tick-driven and single-threaded: [`Simulation::tick`] advances one step,
//! [`render::draw_list`] and [`Simulation::drain_events`] expose the results to the front end.

pub mod bag;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod input;
pub mod matcher;
pub mod physics;
pub mod render;
pub mod resource;
pub mod session;
pub mod shapes;

pub use config::RulesConfig;
pub use error::ConfigError;
pub use events::{Cue, Event};
pub use grid::{Block, BlockId, Grid};
pub use input::{InputFrame, TouchLayout, TouchZone};
pub use resource::{FlowerKind, ResourceKind};
pub use session::{Scene, Simulation};
