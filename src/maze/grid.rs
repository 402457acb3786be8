use std::sync::mpsc::Sender;

use super::cell::{Cell, CellId, CellKind, Marks};

/// A change to the grid, streamed to an observer such as a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// A fresh grid of all-closed, unmarked, normal cells.
    Initial { rows: usize, cols: usize },
    /// Open state of the cell's walls, indexed like `Direction::ALL`.
    Walls {
        coord: (usize, usize),
        open: [bool; 4],
    },
    Kind {
        coord: (usize, usize),
        kind: CellKind,
    },
    Marks {
        coord: (usize, usize),
        marks: Marks,
    },
}

/// Row-major cell storage. Cell ids are allocated here, in creation order,
/// starting from 1 for every new grid.
pub struct Grid {
    data: Box<[Cell]>,
    rows: usize,
    cols: usize,
    sender: Option<Sender<GridEvent>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, sender: Option<Sender<GridEvent>>) -> Self {
        let mut next_id = 1u32;
        let mut data = Vec::with_capacity(rows * cols);
        (0..rows).for_each(|row| {
            (0..cols).for_each(|col| {
                data.push(Cell::new(CellId(next_id), row, col));
                next_id += 1;
            })
        });
        if let Some(s) = &sender {
            let _ = s.send(GridEvent::Initial { rows, cols });
        }
        Grid {
            data: data.into_boxed_slice(),
            rows,
            cols,
            sender,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.data
    }

    fn ravel_index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.ravel_index(row, col).map(|idx| &self.data[idx])
    }

    /// Applies `update` to the cell at `coord` and reports the change if `update`
    /// says it changed something. Returns `None` when `coord` is out of bounds.
    pub fn update<F>(&mut self, coord: (usize, usize), update: F) -> Option<bool>
    where
        F: FnOnce(&mut Cell) -> bool,
    {
        let idx = self.ravel_index(coord.0, coord.1)?;
        let cell = &mut self.data[idx];
        let before_kind = cell.kind();
        let before_marks = cell.marks();
        let before_walls = cell.walls();
        if !update(cell) {
            return Some(false);
        }
        if let Some(sender) = &self.sender {
            let event = if cell.walls() != before_walls {
                GridEvent::Walls {
                    coord,
                    open: cell.walls(),
                }
            } else if cell.kind() != before_kind {
                GridEvent::Kind {
                    coord,
                    kind: cell.kind(),
                }
            } else {
                debug_assert_ne!(cell.marks(), before_marks);
                GridEvent::Marks {
                    coord,
                    marks: cell.marks(),
                }
            };
            let _ = sender.send(event);
        }
        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{Direction, Mark};

    #[test]
    fn test_ids_are_sequential_per_grid() {
        let first = Grid::new(2, 3, None);
        let second = Grid::new(2, 3, None);
        let ids = first.cells().iter().map(|c| c.id().0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(second.get(0, 0).map(Cell::id), Some(CellId(1)));
        assert_eq!(first.get(1, 2).map(Cell::coord), Some((1, 2)));
        assert!(first.get(2, 0).is_none());
    }

    #[test]
    fn test_only_effective_updates_are_reported() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut grid = Grid::new(2, 2, Some(tx));
        assert_eq!(rx.recv(), Ok(GridEvent::Initial { rows: 2, cols: 2 }));

        assert_eq!(grid.update((0, 0), |c| c.set_mark(Mark::Visited, true)), Some(true));
        assert_eq!(grid.update((0, 0), |c| c.set_mark(Mark::Visited, true)), Some(false));
        assert_eq!(grid.update((0, 1), |c| c.set_open(Direction::South, true)), Some(true));
        assert_eq!(grid.update((5, 5), |_| true), None);

        let events = rx.try_iter().collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GridEvent::Marks { coord: (0, 0), .. }));
        assert_eq!(
            events[1],
            GridEvent::Walls {
                coord: (0, 1),
                open: [false, true, false, false]
            }
        );
    }
}
