//! Start-up validation errors. Gameplay itself never fails; only bad rule data does.

use crate::shapes::ShapeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least 1 tick")]
    ZeroCadence(&'static str),
    #[error("grid must be at least {min}x{min}, got {width}x{height}")]
    GridTooSmall { width: i32, height: i32, min: i32 },
    #[error("shape {0:?} has no cells")]
    EmptyTemplate(ShapeId),
    #[error("shape {shape:?} lists {coords} cells but {types} required types")]
    LengthMismatch {
        shape: ShapeId,
        coords: usize,
        types: usize,
    },
    #[error("shape {shape:?} repeats offset ({dx}, {dy})")]
    DuplicateOffset { shape: ShapeId, dx: i32, dy: i32 },
}
