use std::collections::{HashSet, VecDeque};

use rand::Rng;

use super::{Carving, choose};
use crate::{
    error::{MazeError, Result},
    maze::{Coord, Maze},
};

/// Fills everything the solution carve left untouched with dead-end branches.
///
/// Each branch is seeded from an uncarved cell bordering the carved region,
/// connected to it by one wall, and carved depth-first until it dead-ends.
/// When the seeds run out the boundary is scanned again; generation is done
/// when a scan finds nothing.
pub(super) struct DecoyFiller {
    seeds: VecDeque<Coord>,
    branch: Option<Coord>,
}

impl DecoyFiller {
    pub(super) fn new() -> Self {
        DecoyFiller {
            seeds: VecDeque::new(),
            branch: None,
        }
    }

    /// Does one unit of work. Returns `true` once no uncarved cell is left.
    pub(super) fn step<R: Rng>(
        &mut self,
        maze: &mut Maze,
        carving: &mut Carving,
        rng: &mut R,
    ) -> Result<bool> {
        if let Some(tip) = self.branch {
            self.extend_branch(maze, carving, rng, tip)?;
            return Ok(false);
        }

        while let Some(seed) = self.seeds.pop_front() {
            // An earlier branch may have swallowed it
            if carving.is_visited(maze, seed) {
                continue;
            }
            let grid: &Maze = maze;
            let anchors = grid
                .adjacents(seed)
                .filter(|c| carving.is_visited(grid, c.coord()))
                .map(|c| c.coord())
                .collect::<Vec<_>>();
            if anchors.is_empty() {
                continue;
            }
            maze.open_between(choose(rng, &anchors), seed)?;
            carving.visit(maze, seed);
            carving.move_cursor(maze, seed);
            self.branch = Some(seed);
            return Ok(false);
        }

        self.seeds = boundary_of_carved_region(maze, carving)?;
        tracing::trace!("[generator] rescanned boundary, {} seeds", self.seeds.len());
        Ok(self.seeds.is_empty())
    }

    fn extend_branch<R: Rng>(
        &mut self,
        maze: &mut Maze,
        carving: &mut Carving,
        rng: &mut R,
        tip: Coord,
    ) -> Result<()> {
        let unvisited = carving.unvisited_adjacents(maze, tip);
        if unvisited.is_empty() {
            self.branch = None;
            return Ok(());
        }
        let next = choose(rng, &unvisited);
        maze.open_between(tip, next)?;
        carving.visit(maze, next);
        carving.move_cursor(maze, next);
        self.branch = Some(next);
        Ok(())
    }
}

/// Walks the carved region from the start through open walls and collects the
/// uncarved cells bordering it, in discovery order.
fn boundary_of_carved_region(maze: &Maze, carving: &Carving) -> Result<VecDeque<Coord>> {
    let start = maze.start().ok_or(MazeError::MissingEndpoint("start"))?;
    let mut seen = HashSet::from([maze.cell(start).id()]);
    let mut queue = VecDeque::from([start]);
    let mut boundary = VecDeque::new();
    let mut on_boundary = HashSet::new();

    while let Some(coord) = queue.pop_front() {
        for adj in maze.open_adjacents(coord) {
            if seen.insert(adj.id()) {
                queue.push_back(adj.coord());
            }
        }
        for adj in carving.unvisited_adjacents(maze, coord) {
            if on_boundary.insert(adj) {
                boundary.push_back(adj);
            }
        }
    }
    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Mark;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_boundary_scan() {
        let mut maze = Maze::new(3, 3);
        maze.set_start((0, 0)).unwrap();
        let mut carving = Carving::new();
        carving.visit(&mut maze, (0, 0));
        carving.visit(&mut maze, (0, 1));
        maze.open_between((0, 0), (0, 1)).unwrap();

        let boundary = boundary_of_carved_region(&maze, &carving).unwrap();
        assert_eq!(boundary, VecDeque::from([(1, 0), (1, 1), (0, 2)]));
    }

    #[test]
    fn test_fills_whole_grid() {
        let mut maze = Maze::new(4, 4);
        maze.set_start((0, 0)).unwrap();
        let mut carving = Carving::new();
        carving.visit(&mut maze, (0, 0));
        let mut filler = DecoyFiller::new();
        let mut rng = StdRng::seed_from_u64(11);

        let mut steps = 0;
        while !filler.step(&mut maze, &mut carving, &mut rng).unwrap() {
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(maze.marked(Mark::Generated).count(), 16);
        let open_pairs = maze
            .cells()
            .iter()
            .map(|c| c.open_directions().count())
            .sum::<usize>();
        // Each opened wall is counted from both sides
        assert_eq!(open_pairs, 2 * 15);
    }

    #[test]
    fn test_needs_a_start() {
        let mut maze = Maze::new(2, 2);
        let mut carving = Carving::new();
        let mut filler = DecoyFiller::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            filler.step(&mut maze, &mut carving, &mut rng),
            Err(MazeError::MissingEndpoint("start"))
        );
    }
}
