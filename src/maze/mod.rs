pub mod cell;
mod direction;
pub mod grid;

use std::{cell::RefCell, fmt, rc::Rc, sync::mpsc::Sender};

use rand::Rng;

pub use cell::{Cell, CellId, CellKind, Mark, Marks};
pub use direction::Direction;
use grid::{Grid, GridEvent};

use crate::error::{MazeError, Result};

/// Grid position as `(row, col)`.
pub type Coord = (usize, usize);

/// A maze shared between the runs that generate and solve it and whoever draws it.
///
/// Only one run mutates it at a time; the scheduler never overlaps steps.
pub type MazeRef = Rc<RefCell<Maze>>;

/// Fixed-size grid of cells with paired wall mutation.
///
/// Opening or closing a wall on one cell always updates the facing wall of the
/// neighbour on the other side, if there is one, so both cells agree.
pub struct Maze {
    grid: Grid,
    start: Option<Coord>,
    finish: Option<Coord>,
}

impl Maze {
    /// Creates a maze of `rows` x `cols` cells with every wall closed.
    pub fn new(rows: usize, cols: usize) -> Self {
        Maze::with_events(rows, cols, None)
    }

    /// Same as [`Maze::new`], streaming every change to `sender`.
    pub fn with_events(rows: usize, cols: usize, sender: Option<Sender<GridEvent>>) -> Self {
        Maze {
            grid: Grid::new(rows, cols, sender),
            start: None,
            finish: None,
        }
    }

    pub fn into_shared(self) -> MazeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        self.grid.cells()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.get(row, col)
    }

    /// Like [`Maze::get`] for coordinates already known to be in bounds.
    ///
    /// # Panics
    /// If `coord` is out of bounds.
    pub fn cell(&self, coord: Coord) -> &Cell {
        match self.grid.get(coord.0, coord.1) {
            Some(cell) => cell,
            None => panic!("The given coordinate {coord:?} is out of bounds"),
        }
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.0 < self.rows() && coord.1 < self.cols()
    }

    pub fn is_edge(&self, coord: Coord) -> bool {
        self.is_in_bounds(coord)
            && (coord.0 == 0
                || coord.1 == 0
                || coord.0 == self.rows() - 1
                || coord.1 == self.cols() - 1)
    }

    pub fn start(&self) -> Option<Coord> {
        self.start
    }

    pub fn finish(&self) -> Option<Coord> {
        self.finish
    }

    /// Cell next to `coord` in `direction`, or `None` past the boundary.
    pub fn adjacent_to(&self, coord: Coord, direction: Direction) -> Option<&Cell> {
        let (row, col) = direction.shift(coord)?;
        self.get(row, col)
    }

    /// All existing neighbours, in direction order.
    pub fn adjacents(&self, coord: Coord) -> impl Iterator<Item = &Cell> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.adjacent_to(coord, d))
    }

    /// Neighbours reachable through an open wall.
    ///
    /// Re-checks adjacency, since a boundary cell may report an open direction
    /// that has no cell behind it.
    pub fn open_adjacents(&self, coord: Coord) -> impl Iterator<Item = &Cell> + '_ {
        let open = self
            .get(coord.0, coord.1)
            .map(Cell::walls)
            .unwrap_or_default();
        Direction::ALL
            .into_iter()
            .filter(move |d| open[d.index()])
            .filter_map(move |d| self.adjacent_to(coord, d))
    }

    /// Neighbours behind a closed wall.
    pub fn closed_adjacents(&self, coord: Coord) -> impl Iterator<Item = &Cell> + '_ {
        let open = self
            .get(coord.0, coord.1)
            .map(Cell::walls)
            .unwrap_or([true; 4]);
        Direction::ALL
            .into_iter()
            .filter(move |d| !open[d.index()])
            .filter_map(move |d| self.adjacent_to(coord, d))
    }

    /// Sets the wall of `coord` in `direction`, and the facing wall of its neighbour.
    fn set_wall(&mut self, coord: Coord, direction: Direction, open: bool) -> Result<()> {
        self.grid
            .update(coord, |c| c.set_open(direction, open))
            .ok_or(MazeError::OutOfBounds {
                row: coord.0,
                col: coord.1,
            })?;
        if let Some(adjacent) = direction.shift(coord) {
            // Out of bounds means there is no neighbour on this side
            self.grid
                .update(adjacent, |c| c.set_open(direction.opposite(), open));
        }
        Ok(())
    }

    pub fn open_wall(&mut self, coord: Coord, direction: Direction) -> Result<()> {
        self.set_wall(coord, direction, true)
    }

    pub fn close_wall(&mut self, coord: Coord, direction: Direction) -> Result<()> {
        self.set_wall(coord, direction, false)
    }

    fn direction_between(&self, from: Coord, to: Coord) -> Result<Direction> {
        if !self.is_in_bounds(from) || !self.is_in_bounds(to) {
            return Err(MazeError::Adjacency { from, to });
        }
        Direction::between(from, to).ok_or(MazeError::Adjacency { from, to })
    }

    /// Opens the wall shared by two grid-adjacent cells.
    pub fn open_between(&mut self, from: Coord, to: Coord) -> Result<()> {
        let direction = self.direction_between(from, to)?;
        self.open_wall(from, direction)
    }

    /// Closes the wall shared by two grid-adjacent cells.
    pub fn close_between(&mut self, from: Coord, to: Coord) -> Result<()> {
        let direction = self.direction_between(from, to)?;
        self.close_wall(from, direction)
    }

    /// Cells on the outer ring: the top and bottom cell of every column,
    /// then the leftmost and rightmost cell of every inner row.
    pub fn edge_cells(&self) -> Vec<Coord> {
        let (rows, cols) = (self.rows(), self.cols());
        if rows == 0 || cols == 0 {
            return Vec::new();
        }
        let mut edges = Vec::with_capacity(2 * (rows + cols));
        (0..cols).for_each(|col| {
            edges.push((0, col));
            if rows > 1 {
                edges.push((rows - 1, col));
            }
        });
        (1..rows.saturating_sub(1)).for_each(|row| {
            edges.push((row, 0));
            if cols > 1 {
                edges.push((row, cols - 1));
            }
        });
        edges
    }

    /// Uniformly random edge cell other than `excluding`.
    ///
    /// # Panics
    /// If the maze has no edge cell besides `excluding`.
    pub fn random_edge<R: Rng>(&self, rng: &mut R, excluding: Option<Coord>) -> Coord {
        let edges = self.edge_cells();
        if edges.is_empty() || (edges.len() == 1 && Some(edges[0]) == excluding) {
            panic!("Cannot draw an edge cell from a degenerate maze");
        }
        loop {
            let candidate = edges[rng.random_range(0..edges.len())];
            if Some(candidate) != excluding {
                return candidate;
            }
        }
    }

    /// Makes `coord` the start cell. A previous start is demoted to normal.
    pub fn set_start(&mut self, coord: Coord) -> Result<()> {
        self.set_endpoint(coord, CellKind::Start)
    }

    /// Makes `coord` the finish cell. A previous finish is demoted to normal.
    pub fn set_finish(&mut self, coord: Coord) -> Result<()> {
        self.set_endpoint(coord, CellKind::Finish)
    }

    fn set_endpoint(&mut self, coord: Coord, kind: CellKind) -> Result<()> {
        if !self.is_in_bounds(coord) {
            return Err(MazeError::OutOfBounds {
                row: coord.0,
                col: coord.1,
            });
        }
        let slot = match kind {
            CellKind::Start => &mut self.start,
            CellKind::Finish => &mut self.finish,
            CellKind::Normal => unreachable!("normal is not an endpoint"),
        };
        let previous = slot.replace(coord);
        if let Some(previous) = previous.filter(|&p| p != coord) {
            self.grid.update(previous, |c| c.set_kind(CellKind::Normal));
        }
        // Taking over the other endpoint's cell clears that endpoint
        if self.start == self.finish {
            match kind {
                CellKind::Start => self.finish = None,
                _ => self.start = None,
            }
        }
        self.grid.update(coord, |c| c.set_kind(kind));
        Ok(())
    }

    pub fn mark(&mut self, coord: Coord, mark: Mark) {
        self.grid.update(coord, |c| c.set_mark(mark, true));
    }

    pub fn unmark(&mut self, coord: Coord, mark: Mark) {
        self.grid.update(coord, |c| c.set_mark(mark, false));
    }

    /// Removes the given marks from every cell.
    pub fn clear_marks(&mut self, marks: Marks) {
        let coords = self
            .cells()
            .iter()
            .filter(|c| c.marks().iter().any(|m| marks.contains(m)))
            .map(Cell::coord)
            .collect::<Vec<_>>();
        for coord in coords {
            marks.iter().for_each(|m| self.unmark(coord, m));
        }
    }

    /// Cells carrying `mark`, in row-major order.
    pub fn marked(&self, mark: Mark) -> impl Iterator<Item = &Cell> + '_ {
        self.cells().iter().filter(move |c| c.has_mark(mark))
    }
}

impl fmt::Display for Maze {
    /// Draws the maze with one text row per wall line and one per cell row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wall = |open: bool| if open { "  " } else { "──" };
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                let cell = self.cell((row, col));
                write!(f, "+{}", wall(cell.is_open(Direction::North)))?;
            }
            writeln!(f, "+")?;
            for col in 0..self.cols() {
                let cell = self.cell((row, col));
                let side = if cell.is_open(Direction::West) { " " } else { "│" };
                write!(f, "{}{}", side, cell.glyph())?;
            }
            let east_open = self.cols() > 0 && self.cell((row, self.cols() - 1)).is_open(Direction::East);
            writeln!(f, "{}", if east_open { " " } else { "│" })?;
        }
        if let Some(last) = self.rows().checked_sub(1) {
            for col in 0..self.cols() {
                write!(f, "+{}", wall(self.cell((last, col)).is_open(Direction::South)))?;
            }
            writeln!(f, "+")?;
        }
        Ok(())
    }
}
