use crossterm::style::{Color, StyledContent, Stylize};

use crate::maze::direction::Direction;

/// Identity of a cell, unique within the maze that allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

/// Role of a cell in the maze.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    #[default]
    Normal,
    /// Entry of the maze. At most one per maze.
    Start,
    /// Exit of the maze. At most one per maze.
    Finish,
}

/// Observational annotation on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Carved by the generator.
    Generated,
    /// The generator's active cursor.
    Current,
    /// Expanded by a solver.
    Visited,
    /// Part of a solver's (tentative) solution path.
    Solution,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Generated, Mark::Current, Mark::Visited, Mark::Solution];

    fn bit(self) -> u8 {
        match self {
            Mark::Generated => 1 << 0,
            Mark::Current => 1 << 1,
            Mark::Visited => 1 << 2,
            Mark::Solution => 1 << 3,
        }
    }
}

/// A set of [`Mark`]s.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marks(u8);

impl Marks {
    pub const EMPTY: Marks = Marks(0);

    pub fn contains(self, mark: Mark) -> bool {
        self.0 & mark.bit() != 0
    }

    pub fn insert(&mut self, mark: Mark) {
        self.0 |= mark.bit();
    }

    pub fn remove(&mut self, mark: Mark) {
        self.0 &= !mark.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = Mark> {
        Mark::ALL.into_iter().filter(move |&m| self.contains(m))
    }
}

impl FromIterator<Mark> for Marks {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut marks = Marks::EMPTY;
        iter.into_iter().for_each(|m| marks.insert(m));
        marks
    }
}

/// A single grid unit: a fixed position, four walls, a role, and marks.
///
/// Walls are stored as one bitset of open directions. The closed directions are
/// its complement, so every direction is always in exactly one of the two sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    row: usize,
    col: usize,
    kind: CellKind,
    open: u8,
    marks: Marks,
}

impl Cell {
    /// The width of each cell when rendered, in character widths.
    pub const CELL_WIDTH: usize = 2;

    pub(crate) fn new(id: CellId, row: usize, col: usize) -> Self {
        Cell {
            id,
            row,
            col,
            kind: CellKind::Normal,
            open: 0,
            marks: Marks::EMPTY,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Position as `(row, col)`.
    pub fn coord(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_start(&self) -> bool {
        self.kind == CellKind::Start
    }

    pub fn is_finish(&self) -> bool {
        self.kind == CellKind::Finish
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(mark)
    }

    pub fn is_open(&self, direction: Direction) -> bool {
        self.open & (1 << direction.index()) != 0
    }

    pub fn is_closed(&self, direction: Direction) -> bool {
        !self.is_open(direction)
    }

    /// Open walls in enumeration order.
    pub fn open_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|&d| self.is_open(d))
    }

    /// Closed walls in enumeration order.
    pub fn closed_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|&d| self.is_closed(d))
    }

    /// Open state of all four walls, indexed like [`Direction::ALL`].
    pub fn walls(&self) -> [bool; 4] {
        Direction::ALL.map(|d| self.is_open(d))
    }

    // Mutators return whether anything changed so the grid only reports real updates.

    pub(crate) fn set_open(&mut self, direction: Direction, open: bool) -> bool {
        let before = self.open;
        if open {
            self.open |= 1 << direction.index();
        } else {
            self.open &= !(1 << direction.index());
        }
        before != self.open
    }

    pub(crate) fn set_kind(&mut self, kind: CellKind) -> bool {
        std::mem::replace(&mut self.kind, kind) != kind
    }

    pub(crate) fn set_mark(&mut self, mark: Mark, on: bool) -> bool {
        let before = self.marks;
        if on {
            self.marks.insert(mark);
        } else {
            self.marks.remove(mark);
        }
        before != self.marks
    }

    /// Two-column glyph for the cell's interior, styled by role and most relevant mark.
    pub fn glyph(&self) -> StyledContent<&'static str> {
        let styled_symbol = match self.kind {
            CellKind::Start => "🟩".with(Color::Green),
            CellKind::Finish => "🟥".with(Color::Red),
            CellKind::Normal if self.has_mark(Mark::Solution) => "🟨".with(Color::Yellow),
            CellKind::Normal if self.has_mark(Mark::Current) => "🟪".with(Color::Magenta),
            CellKind::Normal if self.has_mark(Mark::Visited) => "* ".with(Color::Blue),
            CellKind::Normal if self.has_mark(Mark::Generated) => "  ".with(Color::Reset),
            CellKind::Normal => "░░".with(Color::DarkGrey),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                styled_symbol.content().width(),
                Cell::CELL_WIDTH,
                "Each cell must occupy exactly two character widths."
            );
        }

        styled_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_partition_directions() {
        let mut cell = Cell::new(CellId(1), 0, 0);
        assert_eq!(cell.closed_directions().count(), 4);
        assert!(cell.set_open(Direction::East, true));
        assert!(!cell.set_open(Direction::East, true));
        for d in Direction::ALL {
            assert_ne!(cell.is_open(d), cell.is_closed(d));
        }
        assert_eq!(cell.open_directions().collect::<Vec<_>>(), vec![Direction::East]);
        assert_eq!(
            cell.closed_directions().collect::<Vec<_>>(),
            vec![Direction::North, Direction::South, Direction::West]
        );
    }

    #[test]
    fn test_marks_toggle_independently() {
        let mut cell = Cell::new(CellId(1), 0, 0);
        cell.set_mark(Mark::Visited, true);
        cell.set_mark(Mark::Solution, true);
        cell.set_mark(Mark::Visited, false);
        assert!(cell.has_mark(Mark::Solution));
        assert!(!cell.has_mark(Mark::Visited));
        assert_eq!(cell.marks().iter().collect::<Vec<_>>(), vec![Mark::Solution]);
    }

    #[test]
    fn test_glyph_width() {
        let mut cell = Cell::new(CellId(1), 0, 0);
        for kind in [CellKind::Normal, CellKind::Start, CellKind::Finish] {
            cell.set_kind(kind);
            for mark in Mark::ALL {
                cell.set_mark(mark, true);
                let _ = cell.glyph();
            }
        }
    }
}
