use std::collections::HashSet;

use rand::{Rng, rngs::StdRng};

use crate::{
    error::{MazeError, Result},
    maze::{CellId, Coord, Mark, Maze, MazeRef},
    scheduler::{Next, StepContext, Task},
};

/// Walks a single live path, marking it as the solution, and retreats along
/// that marking at dead ends.
///
/// The solution mark is the only record of the way back, so it must always form
/// a simple path: while retreating exactly one open neighbour carries it.
pub struct Backtracking {
    maze: MazeRef,
    start: Coord,
    current: Coord,
    visited: HashSet<CellId>,
    backtracking: bool,
    rng: StdRng,
}

impl Backtracking {
    pub fn new(maze: MazeRef, start: Coord, rng: StdRng) -> Self {
        Backtracking {
            maze,
            start,
            current: start,
            visited: HashSet::new(),
            backtracking: false,
            rng,
        }
    }

    fn unvisited_open_adjacents(&self, maze: &Maze) -> Vec<Coord> {
        maze.open_adjacents(self.current)
            .filter(|c| !self.visited.contains(&c.id()))
            .map(|c| c.coord())
            .collect()
    }

    fn advance(&mut self, maze: &mut Maze, ctx: &mut StepContext) {
        maze.mark(self.current, Mark::Visited);
        maze.mark(self.current, Mark::Solution);
        self.visited.insert(maze.cell(self.current).id());

        if maze.cell(self.current).is_finish() {
            tracing::info!(
                "[solver] backtracking reached finish after visiting {} cells",
                self.visited.len()
            );
            ctx.finish();
            return;
        }

        let unvisited = self.unvisited_open_adjacents(maze);
        if unvisited.is_empty() {
            tracing::trace!("[solver] dead end at {:?}, backtracking", self.current);
            self.backtracking = true;
            maze.unmark(self.current, Mark::Solution);
        } else {
            self.current = unvisited[self.rng.random_range(0..unvisited.len())];
        }
    }

    fn retreat(&mut self, maze: &mut Maze) -> Result<()> {
        if !self.unvisited_open_adjacents(maze).is_empty() {
            self.backtracking = false;
            return Ok(());
        }
        maze.unmark(self.current, Mark::Solution);

        let on_path = maze
            .open_adjacents(self.current)
            .filter(|c| c.has_mark(Mark::Solution))
            .map(|c| c.coord())
            .collect::<Vec<_>>();
        match on_path.as_slice() {
            [previous] => {
                self.current = *previous;
                Ok(())
            }
            // Retreated past the start: every reachable cell was tried
            [] if self.current == self.start => Err(MazeError::ExhaustedSearch {
                search: "backtracking search",
            }),
            _ => Err(MazeError::AlgorithmInvariant {
                at: self.current,
                found: on_path.len(),
            }),
        }
    }
}

impl Task for Backtracking {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        let maze = self.maze.clone();
        let mut maze = maze.borrow_mut();
        if self.backtracking {
            self.retreat(&mut maze)?;
        } else {
            self.advance(&mut maze, ctx);
        }
        Ok(Next::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        maze::Maze,
        scheduler::{Completion, RunId, Scheduler},
        solvers::tests::generated,
    };
    use rand::SeedableRng;
    use std::time::Duration;

    #[test]
    fn test_solution_marks_stay_a_simple_path() {
        for seed in 0..10 {
            let maze = generated(7, 7, seed);
            let start = maze.borrow().start().unwrap();
            let mut solver = Backtracking::new(maze.clone(), start, StdRng::seed_from_u64(seed));
            let mut ctx = StepContext::new(RunId(0));
            while !ctx.is_finished() {
                solver.step(&mut ctx).unwrap();
                let maze = maze.borrow();
                for cell in maze.marked(Mark::Solution) {
                    if cell.coord() == start {
                        continue;
                    }
                    let on_path = maze
                        .open_adjacents(cell.coord())
                        .filter(|c| c.has_mark(Mark::Solution))
                        .count();
                    assert!(on_path <= 2, "branching solution at {:?}", cell.coord());
                }
                if !solver.backtracking {
                    let behind = maze
                        .open_adjacents(solver.current)
                        .filter(|c| c.has_mark(Mark::Solution))
                        .count();
                    assert!(behind <= 1, "live cell {:?} touches {behind} solution cells", solver.current);
                }
            }
        }
    }

    #[test]
    fn test_dead_end_corridor_is_unmarked() {
        // (0,0) start, corridor east to a dead end, finish south of the start
        let mut maze = Maze::new(2, 3);
        maze.open_between((0, 0), (0, 1)).unwrap();
        maze.open_between((0, 1), (0, 2)).unwrap();
        maze.open_between((0, 0), (1, 0)).unwrap();
        maze.set_start((0, 0)).unwrap();
        maze.set_finish((1, 0)).unwrap();
        let maze = maze.into_shared();

        let mut scheduler = Scheduler::new();
        for seed in 0..8 {
            let handle = scheduler.spawn(
                Backtracking::new(maze.clone(), (0, 0), StdRng::seed_from_u64(seed)),
                Duration::ZERO,
            );
            assert_eq!(scheduler.block_on(&handle), Some(Ok(Completion::Finished)));
            let solution = maze.borrow().marked(Mark::Solution).map(|c| c.coord()).collect::<Vec<_>>();
            assert_eq!(solution, vec![(0, 0), (1, 0)]);
            maze.borrow_mut()
                .clear_marks([Mark::Visited, Mark::Solution].into_iter().collect());
        }
    }

    #[test]
    fn test_broken_trail_violates_invariant() {
        // Cycle (0,0)-(0,1)-(1,1)-(1,0)-(0,0); finish unreachable
        let mut maze = Maze::new(3, 2);
        maze.open_between((0, 0), (0, 1)).unwrap();
        maze.open_between((0, 1), (1, 1)).unwrap();
        maze.open_between((1, 1), (1, 0)).unwrap();
        maze.open_between((1, 0), (0, 0)).unwrap();
        maze.set_start((0, 0)).unwrap();
        maze.set_finish((2, 1)).unwrap();
        let maze = maze.into_shared();

        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(
            Backtracking::new(maze, (0, 0), StdRng::seed_from_u64(1)),
            Duration::ZERO,
        );
        assert!(matches!(
            scheduler.block_on(&handle),
            Some(Err(MazeError::AlgorithmInvariant { .. }))
        ));
    }

    /// Start (0,0) with a corridor east to a dead end; the finish below it is walled off.
    fn walled_off_finish() -> MazeRef {
        let mut maze = Maze::new(2, 3);
        maze.open_between((0, 0), (0, 1)).unwrap();
        maze.open_between((0, 1), (0, 2)).unwrap();
        maze.set_start((0, 0)).unwrap();
        maze.set_finish((1, 2)).unwrap();
        maze.into_shared()
    }

    #[test]
    fn test_retreating_past_start_exhausts_search() {
        let maze = walled_off_finish();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(
            Backtracking::new(maze.clone(), (0, 0), StdRng::seed_from_u64(3)),
            Duration::ZERO,
        );
        assert_eq!(
            scheduler.block_on(&handle),
            Some(Err(MazeError::ExhaustedSearch {
                search: "backtracking search"
            }))
        );
        assert_eq!(maze.borrow().marked(Mark::Solution).count(), 0);
        assert_eq!(maze.borrow().marked(Mark::Visited).count(), 3);
    }

    #[test]
    fn test_lost_trail_mid_path_violates_invariant() {
        let maze = walled_off_finish();
        let mut solver = Backtracking::new(maze.clone(), (0, 0), StdRng::seed_from_u64(3));
        let mut ctx = StepContext::new(RunId(0));
        // Walk to the dead end at (0,2) and turn around
        for _ in 0..3 {
            solver.step(&mut ctx).unwrap();
        }
        assert!(solver.backtracking);
        assert_eq!(solver.current, (0, 2));

        maze.borrow_mut().unmark((0, 1), Mark::Solution);
        assert!(matches!(
            solver.step(&mut ctx),
            Err(MazeError::AlgorithmInvariant { at: (0, 2), found: 0 })
        ));
    }
}
