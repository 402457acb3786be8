use std::collections::{HashSet, VecDeque};

use crate::{
    error::{MazeError, Result},
    maze::{CellId, Coord, Mark, MazeRef},
    scheduler::{Next, StepContext, Task},
};

/// Where newly discovered cells enter the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// At the back: breadth-first.
    Queue,
    /// At the front: depth-first, newest first.
    Stack,
}

/// Breadth- or depth-first search. Tracks reachability only, no parents.
pub struct FrontierSearch {
    maze: MazeRef,
    frontier: VecDeque<Coord>,
    visited: HashSet<CellId>,
    discipline: Discipline,
}

impl FrontierSearch {
    pub fn new(maze: MazeRef, start: Coord, discipline: Discipline) -> Self {
        FrontierSearch {
            maze,
            frontier: VecDeque::from([start]),
            visited: HashSet::new(),
            discipline,
        }
    }

    fn search_name(&self) -> &'static str {
        match self.discipline {
            Discipline::Queue => "breadth-first search",
            Discipline::Stack => "depth-first search",
        }
    }
}

impl Task for FrontierSearch {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        let Some(current) = self.frontier.pop_front() else {
            return Err(MazeError::ExhaustedSearch {
                search: self.search_name(),
            });
        };
        let mut maze = self.maze.borrow_mut();
        maze.mark(current, Mark::Visited);
        // Already expanded through another neighbour
        if !self.visited.insert(maze.cell(current).id()) {
            return Ok(Next::Ready);
        }
        if maze.cell(current).is_finish() {
            tracing::info!(
                "[solver] {} reached finish after visiting {} cells",
                self.search_name(),
                self.visited.len()
            );
            ctx.finish();
            return Ok(Next::Ready);
        }

        let open = maze.open_adjacents(current).map(|c| c.coord()).collect::<Vec<_>>();
        match self.discipline {
            Discipline::Queue => self.frontier.extend(open),
            Discipline::Stack => open
                .into_iter()
                .rev()
                .for_each(|c| self.frontier.push_front(c)),
        }
        Ok(Next::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{maze::Maze, scheduler::Scheduler};
    use std::time::Duration;

    /// Two corridors out of the start: south to the finish, east to a dead end.
    fn forked_maze() -> MazeRef {
        let mut maze = Maze::new(3, 3);
        for (a, b) in [((0, 0), (1, 0)), ((1, 0), (2, 0)), ((0, 0), (0, 1)), ((0, 1), (0, 2))] {
            maze.open_between(a, b).unwrap();
        }
        maze.set_start((0, 0)).unwrap();
        maze.set_finish((2, 0)).unwrap();
        maze.into_shared()
    }

    fn visit_order(discipline: Discipline) -> Vec<Coord> {
        let maze = forked_maze();
        let mut search = FrontierSearch::new(maze.clone(), (0, 0), discipline);
        let mut order = Vec::new();
        let mut ctx = StepContext::new(crate::scheduler::RunId(0));
        while !ctx.is_finished() {
            let before = search.visited.len();
            search.step(&mut ctx).unwrap();
            if search.visited.len() > before {
                let maze = maze.borrow();
                let newest = maze
                    .cells()
                    .iter()
                    .find(|c| search.visited.contains(&c.id()) && !order.contains(&c.coord()))
                    .map(|c| c.coord())
                    .unwrap();
                order.push(newest);
            }
        }
        order
    }

    #[test]
    fn test_breadth_first_order() {
        let order = visit_order(Discipline::Queue);
        // The dead end's first cell is reached before the finish
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (2, 0)]);
    }

    #[test]
    fn test_depth_first_order() {
        let order = visit_order(Discipline::Stack);
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_exhausted_search_fails() {
        let mut maze = Maze::new(2, 2);
        maze.set_start((0, 0)).unwrap();
        maze.set_finish((1, 1)).unwrap();
        let maze = maze.into_shared();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(FrontierSearch::new(maze, (0, 0), Discipline::Queue), Duration::ZERO);
        assert_eq!(
            scheduler.block_on(&handle),
            Some(Err(MazeError::ExhaustedSearch {
                search: "breadth-first search"
            }))
        );
    }
}
