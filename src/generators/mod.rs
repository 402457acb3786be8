use std::{collections::HashSet, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};

mod decoy;
mod solution;

use decoy::DecoyFiller;
use solution::SolutionCarver;

use crate::{
    error::{MazeError, Result},
    maze::{CellId, Coord, Mark, Maze, MazeRef},
    scheduler::{Handle, Next, Scheduler, StepContext, Task},
};

/// Get a random number generator, optionally seeded for reproducibility.
pub fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Progress shared by both generation phases: which cells have been carved and
/// where the cursor is.
pub(crate) struct Carving {
    visited: HashSet<CellId>,
    cursor: Option<Coord>,
}

impl Carving {
    fn new() -> Self {
        Carving {
            visited: HashSet::new(),
            cursor: None,
        }
    }

    fn is_visited(&self, maze: &Maze, coord: Coord) -> bool {
        self.visited.contains(&maze.cell(coord).id())
    }

    /// Marks `coord` carved. Returns `false` if it already was.
    fn visit(&mut self, maze: &mut Maze, coord: Coord) -> bool {
        if !self.visited.insert(maze.cell(coord).id()) {
            return false;
        }
        maze.mark(coord, Mark::Generated);
        true
    }

    fn move_cursor(&mut self, maze: &mut Maze, coord: Coord) {
        if let Some(previous) = self.cursor.replace(coord) {
            maze.unmark(previous, Mark::Current);
        }
        maze.mark(coord, Mark::Current);
    }

    fn clear_cursor(&mut self, maze: &mut Maze) {
        if let Some(previous) = self.cursor.take() {
            maze.unmark(previous, Mark::Current);
        }
    }

    /// Neighbours of `coord` that have not been carved, in direction order.
    fn unvisited_adjacents(&self, maze: &Maze, coord: Coord) -> Vec<Coord> {
        maze.adjacents(coord)
            .filter(|c| !self.visited.contains(&c.id()))
            .map(|c| c.coord())
            .collect()
    }

    /// Whether any carved cell still borders an uncarved one.
    fn has_frontier(&self, maze: &Maze) -> bool {
        maze.cells()
            .iter()
            .filter(|c| self.visited.contains(&c.id()))
            .any(|c| !self.unvisited_adjacents(maze, c.coord()).is_empty())
    }
}

fn choose<T: Copy, R: Rng>(rng: &mut R, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

enum Phase {
    /// Carving the single start-to-finish path.
    Solution(SolutionCarver),
    /// Filling the rest of the grid with dead-end branches.
    Decoys(DecoyFiller),
}

/// Generation run: carve a solution path, then fill the remaining space with decoys.
pub struct Generation {
    maze: MazeRef,
    rng: StdRng,
    carving: Carving,
    phase: Phase,
}

impl Generation {
    /// Picks a random edge cell as the start. Carving begins on the first step.
    pub fn new(maze: MazeRef, mut rng: StdRng) -> Result<Self> {
        let start = {
            let mut grid = maze.borrow_mut();
            let (rows, cols) = (grid.rows(), grid.cols());
            if rows < 2 || cols < 2 {
                return Err(MazeError::InvalidDimensions { rows, cols });
            }
            let carved = grid.cells().iter().any(|c| c.open_directions().next().is_some());
            if grid.start().is_some() || carved {
                return Err(MazeError::AlreadyCarved);
            }
            let start = grid.random_edge(&mut rng, None);
            grid.set_start(start)?;
            start
        };
        tracing::info!("[generator] start designated at {:?}", start);
        Ok(Generation {
            maze,
            rng,
            carving: Carving::new(),
            phase: Phase::Solution(SolutionCarver::new(start)),
        })
    }
}

impl Task for Generation {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        let mut maze = self.maze.borrow_mut();
        let done = match &mut self.phase {
            Phase::Solution(carver) => carver.step(&mut maze, &mut self.carving, &mut self.rng)?,
            Phase::Decoys(filler) => filler.step(&mut maze, &mut self.carving, &mut self.rng)?,
        };
        if !done {
            return Ok(Next::Ready);
        }
        if matches!(self.phase, Phase::Solution(_)) {
            tracing::info!(
                "[generator] solution carved through {} cells, filling decoys",
                self.carving.visited.len()
            );
            self.phase = Phase::Decoys(DecoyFiller::new());
        } else {
            self.carving.clear_cursor(&mut maze);
            tracing::info!(
                "[generator] run {} complete, {} cells carved",
                ctx.run_id(),
                self.carving.visited.len()
            );
            ctx.finish();
        }
        Ok(Next::Ready)
    }
}

/// Schedules generation of `maze`. Fails with [`MazeError::AlreadyCarved`] unless
/// the maze is fresh: no start and every wall closed.
pub fn generate(
    scheduler: &mut Scheduler,
    maze: &MazeRef,
    seed: Option<u64>,
    delay: Duration,
) -> Result<Handle> {
    let generation = Generation::new(maze.clone(), get_rng(seed))?;
    Ok(scheduler.spawn(generation, delay))
}
