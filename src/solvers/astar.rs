use std::{collections::HashSet, rc::Rc};

use crate::{
    error::{MazeError, Result},
    maze::{CellId, Coord, Mark, MazeRef},
    scheduler::{Next, StepContext, Task},
};

/// Squared Euclidean distance. Cheaper than the true distance and orders
/// candidates the same way.
fn squared_distance(a: Coord, b: Coord) -> usize {
    let dr = a.0.abs_diff(b.0);
    let dc = a.1.abs_diff(b.1);
    dr * dr + dc * dc
}

#[derive(Debug)]
struct TrackedCell {
    /// Coordinates of the cell in the maze
    coord: Coord,
    id: CellId,
    /// The node from which this cell was reached
    parent: Option<Rc<TrackedCell>>,
    /// Cost to reach this cell from the start
    traveling_cost: usize,
    /// Estimated cost to reach the finish from this cell
    heuristic_cost: usize,
}

impl TrackedCell {
    fn new(coord: Coord, id: CellId, parent: Option<Rc<TrackedCell>>, finish: Coord) -> Self {
        let traveling_cost = parent
            .as_ref()
            .map_or(0, |p| p.traveling_cost + squared_distance(p.coord, coord));
        TrackedCell {
            coord,
            id,
            parent,
            traveling_cost,
            heuristic_cost: squared_distance(coord, finish),
        }
    }

    fn cost(&self) -> usize {
        self.traveling_cost + self.heuristic_cost
    }
}

/// A* over open walls, keeping the frontier sorted by ascending cost.
///
/// Equal costs keep discovery order. Each cell has at most one pending entry;
/// a cheaper route replaces it, an equal or dearer one is dropped.
pub struct AStar {
    maze: MazeRef,
    finish: Coord,
    frontier: Vec<Rc<TrackedCell>>,
    visited: HashSet<CellId>,
}

impl AStar {
    pub fn new(maze: MazeRef, start: Coord, finish: Coord) -> Self {
        let root = TrackedCell::new(start, maze.borrow().cell(start).id(), None, finish);
        AStar {
            maze,
            finish,
            frontier: vec![Rc::new(root)],
            visited: HashSet::new(),
        }
    }

    /// Inserts before the first entry that costs strictly more.
    fn insert_by_cost(&mut self, node: Rc<TrackedCell>) {
        let idx = self
            .frontier
            .iter()
            .position(|n| n.cost() > node.cost())
            .unwrap_or(self.frontier.len());
        self.frontier.insert(idx, node);
    }
}

impl Task for AStar {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        if self.frontier.is_empty() {
            return Err(MazeError::ExhaustedSearch { search: "A* search" });
        }
        let current = self.frontier.remove(0);
        let mut maze = self.maze.borrow_mut();
        maze.mark(current.coord, Mark::Visited);
        self.visited.insert(current.id);

        if current.coord == self.finish {
            tracing::info!(
                "[solver] A* reached finish at cost {}, visited {} cells",
                current.traveling_cost,
                self.visited.len()
            );
            ctx.finish();
            return Ok(Next::Deferred(Box::new(MarkSolution {
                maze: self.maze.clone(),
                node: Some(current),
            })));
        }

        let candidates = maze
            .open_adjacents(current.coord)
            .filter(|c| !self.visited.contains(&c.id()))
            .map(|c| TrackedCell::new(c.coord(), c.id(), Some(current.clone()), self.finish))
            .collect::<Vec<_>>();
        drop(maze);

        for candidate in candidates {
            if let Some(idx) = self.frontier.iter().position(|n| n.id == candidate.id) {
                if self.frontier[idx].cost() <= candidate.cost() {
                    continue;
                }
                self.frontier.remove(idx);
            }
            self.insert_by_cost(Rc::new(candidate));
        }
        Ok(Next::Ready)
    }
}

/// Marks the parent chain from the finish back to the start, one cell per step.
struct MarkSolution {
    maze: MazeRef,
    node: Option<Rc<TrackedCell>>,
}

impl Task for MarkSolution {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        match self.node.take() {
            Some(node) => {
                self.maze.borrow_mut().mark(node.coord, Mark::Solution);
                self.node = node.parent.clone();
            }
            None => ctx.finish(),
        }
        Ok(Next::Ready)
    }
}
