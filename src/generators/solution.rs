use std::collections::VecDeque;

use rand::Rng;

use super::{Carving, choose};
use crate::{
    error::{MazeError, Result},
    maze::{Coord, Direction, Maze},
};

/// Randomized depth-first carve from the start until it reaches a suitable finish.
///
/// The frontier is double-ended: the cell carved into goes to the front so the
/// carve keeps going deep, its unvisited siblings go to the back.
pub(super) struct SolutionCarver {
    start: Coord,
    frontier: VecDeque<Coord>,
}

impl SolutionCarver {
    pub(super) fn new(start: Coord) -> Self {
        SolutionCarver {
            start,
            frontier: VecDeque::from([start]),
        }
    }

    /// A finish must sit on the edge and share neither row nor column with the
    /// start, so the solution can never be a straight line.
    fn is_finish_candidate(&self, maze: &Maze, coord: Coord) -> bool {
        coord != self.start
            && maze.is_edge(coord)
            && coord.0 != self.start.0
            && coord.1 != self.start.1
    }

    /// Processes one frontier cell. Returns `true` once the finish is designated.
    pub(super) fn step<R: Rng>(
        &mut self,
        maze: &mut Maze,
        carving: &mut Carving,
        rng: &mut R,
    ) -> Result<bool> {
        let Some(coord) = self.frontier.pop_front() else {
            return Err(MazeError::ExhaustedSearch {
                search: "solution carving",
            });
        };
        carving.move_cursor(maze, coord);
        if !carving.visit(maze, coord) {
            return Ok(false);
        }

        if self.is_finish_candidate(maze, coord) {
            maze.set_finish(coord)?;
            tracing::debug!("[generator] finish designated at {:?}", coord);
            return Ok(true);
        }

        let unvisited = carving.unvisited_adjacents(maze, coord);
        let next = if unvisited.is_empty() {
            backtrack_to_unvisited(maze, coord, carving, rng)?
        } else {
            let next = choose(rng, &unvisited);
            maze.open_between(coord, next)?;
            next
        };
        self.frontier.push_front(next);
        self.frontier
            .extend(unvisited.into_iter().filter(|&c| c != next));
        Ok(false)
    }
}

/// Walks the carved passages from a dead end until it finds a cell with an
/// uncarved neighbour, opens a wall into that neighbour and returns it.
///
/// The walk never turns straight back the way it came unless that is the only
/// way out.
fn backtrack_to_unvisited<R: Rng>(
    maze: &mut Maze,
    from: Coord,
    carving: &Carving,
    rng: &mut R,
) -> Result<Coord> {
    // Without this the walk below would wander forever
    if !carving.has_frontier(maze) {
        return Err(MazeError::ExhaustedSearch {
            search: "solution carving",
        });
    }
    tracing::trace!("[generator] backtracking from {:?}", from);

    let mut current = from;
    let mut backwards: Option<Direction> = None;
    loop {
        let open = maze
            .cell(current)
            .open_directions()
            .filter(|&d| maze.adjacent_to(current, d).is_some())
            .collect::<Vec<_>>();
        let options = if open.len() > 1 {
            open.into_iter()
                .filter(|&d| Some(d) != backwards)
                .collect::<Vec<_>>()
        } else {
            open
        };
        if options.is_empty() {
            return Err(MazeError::ExhaustedSearch {
                search: "solution carving",
            });
        }

        let direction = choose(rng, &options);
        let Some(next) = direction.shift(current) else {
            unreachable!("open directions were filtered to existing neighbours");
        };
        backwards = Some(direction.opposite());

        let unvisited = carving.unvisited_adjacents(maze, next);
        if !unvisited.is_empty() {
            let target = choose(rng, &unvisited);
            maze.open_between(next, target)?;
            return Ok(target);
        }
        current = next;
    }
}
