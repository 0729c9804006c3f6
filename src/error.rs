//! Error taxonomy shared by classification, projection and the simulation harness.

use thiserror::Error;

/// A request that cannot be honoured as configured.
///
/// Raised before any board is touched; callers either fix their input or
/// fall back to a safe default (the orchestrator clamps mine counts itself).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a board needs at least 2 axes, got {0}")]
    TooFewAxes(usize),

    #[error("axis {axis} has size {size}, every axis needs at least 2 cells")]
    AxisTooSmall { axis: usize, size: usize },

    #[error("axis {axis} has size {size}, the maximum is {max}")]
    AxisTooLarge { axis: usize, size: usize, max: usize },

    #[error("dice cube faces must be square, got {rows}x{cols}")]
    DiceFaceNotSquare { rows: usize, cols: usize },

    #[error("3-D boards must be cubic, got {0:?}")]
    NonCubic(Vec<usize>),

    #[error("board {0:?} has more cells than can be addressed")]
    BoardTooLarge(Vec<usize>),

    #[error("board has {cells} cells, cannot hold {mines} mines")]
    TooManyMines { mines: usize, cells: usize },

    #[error("axis {axis} does not exist on a {rank}-axis board")]
    NoSuchAxis { axis: usize, rank: usize },

    #[error("slice index {index} is outside 0..{size} on axis {axis}")]
    SliceOutOfRange { axis: usize, index: usize, size: usize },

    #[error("axis {axis} is drawn directly on a {topology} board and cannot be pinned")]
    NotAHighAxis { axis: usize, topology: &'static str },

    #[error("axis {axis} cannot be sliced on a {topology} board")]
    UnsupportedSlice { axis: usize, topology: &'static str },

    #[error("{0}")]
    Invalid(String),
}

/// Failure reported by the external solving engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine fault: {0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(&'static str),

    #[error(transparent)]
    EngineFault(#[from] EngineError),

    #[error("malformed board state: {0}")]
    MalformedState(String),
}

/// CSV export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no game records to export")]
    NoRecords,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
