//! Incremental maze generation and solving.
//!
//! A [`session::MazeSession`] generates a maze with a unique start and finish,
//! then searches it with one of four strategies. Both phases run as steps on a
//! cooperative [`scheduler::Scheduler`], so they can be paced, observed between
//! steps, and aborted at any time.

pub mod config;
pub mod error;
pub mod generators;
pub mod maze;
pub mod scheduler;
pub mod session;
pub mod solvers;

pub use config::{Config, Pacing};
pub use error::{MazeError, Result};
pub use maze::{Cell, CellKind, Coord, Direction, Mark, Maze, MazeRef};
pub use scheduler::{Completion, Handle, Outcome, Scheduler};
pub use session::{MazeSession, Status};
pub use solvers::Solver;
