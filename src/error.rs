//! Error types for maze generation and solving

use thiserror::Error;

use crate::maze::Coord;

/// Failure of a wall operation, a generation run, or a solve run.
///
/// None of these are retried. A run that hits one of them halts and reports it
/// through its handle's outcome. Aborting a run is not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    /// A wall operation was requested between cells that do not share a wall.
    #[error("cells {from:?} and {to:?} are not adjacent")]
    Adjacency { from: Coord, to: Coord },

    /// A wall operation referenced a coordinate outside the grid.
    #[error("no cell at row {row}, col {col}")]
    OutOfBounds { row: usize, col: usize },

    /// The backtracking solver found zero or several solution-marked neighbours.
    #[error("backtracking at {at:?} found {found} solution-marked neighbours, expected exactly one")]
    AlgorithmInvariant { at: Coord, found: usize },

    /// The frontier emptied before the goal was reached.
    #[error("{search} exhausted its frontier without reaching the goal")]
    ExhaustedSearch { search: &'static str },

    /// Any other failure raised inside a scheduled step, including panics.
    #[error("step failed: {0}")]
    Step(String),

    #[error("a maze needs at least 2 rows and 2 columns, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("unknown solving algorithm `{0}`")]
    UnknownAlgorithm(String),

    /// Generation was requested on a maze that already has a start or open walls.
    #[error("maze was already carved; generate into a fresh maze")]
    AlreadyCarved,

    /// Solving was requested on a maze with no start or no finish.
    #[error("maze has no {0} cell")]
    MissingEndpoint(&'static str),
}

pub type Result<T> = std::result::Result<T, MazeError>;
