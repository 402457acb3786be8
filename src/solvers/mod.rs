use std::{str::FromStr, time::Duration};

mod astar;
mod backtracking;
mod frontier;

use astar::AStar;
use backtracking::Backtracking;
use frontier::{Discipline, FrontierSearch};

use crate::{
    error::{MazeError, Result},
    generators::get_rng,
    maze::{Coord, Mark, MazeRef},
    scheduler::{Handle, Scheduler, Task},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    BreadthFirst,
    DepthFirst,
    Backtracking,
    AStar,
}

impl Solver {
    pub const ALL: [Solver; 4] = [
        Solver::BreadthFirst,
        Solver::DepthFirst,
        Solver::Backtracking,
        Solver::AStar,
    ];

    /// Name used to select the algorithm from outside.
    pub fn name(self) -> &'static str {
        match self {
            Solver::BreadthFirst => "breadth-first",
            Solver::DepthFirst => "depth-first",
            Solver::Backtracking => "backtracking",
            Solver::AStar => "astar",
        }
    }
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::BreadthFirst => write!(f, "Breadth-First Search (BFS)"),
            Solver::DepthFirst => write!(f, "Depth-First Search (DFS)"),
            Solver::Backtracking => write!(f, "Backtracking"),
            Solver::AStar => write!(f, "A* Search"),
        }
    }
}

impl FromStr for Solver {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self> {
        Solver::ALL
            .into_iter()
            .find(|solver| solver.name() == s)
            .ok_or_else(|| MazeError::UnknownAlgorithm(s.to_string()))
    }
}

/// Start and finish of a generated maze.
fn endpoints(maze: &MazeRef) -> Result<(Coord, Coord)> {
    let maze = maze.borrow();
    let start = maze.start().ok_or(MazeError::MissingEndpoint("start"))?;
    let finish = maze.finish().ok_or(MazeError::MissingEndpoint("finish"))?;
    Ok((start, finish))
}

/// Clears the marks of any previous solve and builds the search task.
pub fn solver_task(maze: &MazeRef, solver: Solver, seed: Option<u64>) -> Result<Box<dyn Task>> {
    let (start, finish) = endpoints(maze)?;
    maze.borrow_mut().clear_marks(
        [Mark::Current, Mark::Visited, Mark::Solution]
            .into_iter()
            .collect(),
    );
    tracing::info!("[solver] solving with {} from {:?} to {:?}", solver, start, finish);

    let maze = maze.clone();
    Ok(match solver {
        Solver::BreadthFirst => Box::new(FrontierSearch::new(maze, start, Discipline::Queue)),
        Solver::DepthFirst => Box::new(FrontierSearch::new(maze, start, Discipline::Stack)),
        Solver::Backtracking => Box::new(Backtracking::new(maze, start, get_rng(seed))),
        Solver::AStar => Box::new(AStar::new(maze, start, finish)),
    })
}

/// Schedules a search of an already generated maze.
pub fn solve(
    scheduler: &mut Scheduler,
    maze: &MazeRef,
    solver: Solver,
    seed: Option<u64>,
    delay: Duration,
) -> Result<Handle> {
    let task = solver_task(maze, solver, seed)?;
    Ok(scheduler.spawn_boxed(task, delay))
}
