/// One of the four walls of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All directions in enumeration order. Adjacency queries follow this order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Unit translation as (row delta, col delta).
    pub fn translation(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    /// Shifts `(row, col)` one unit in this direction.
    /// Returns `None` when the shift would go below zero.
    pub fn shift(self, (row, col): (usize, usize)) -> Option<(usize, usize)> {
        let (dr, dc) = self.translation();
        Some((row.checked_add_signed(dr)?, col.checked_add_signed(dc)?))
    }

    /// Position of this direction in [`Direction::ALL`], used as a bit index.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    /// Direction leading from `from` to `to`, if the two are grid-adjacent.
    pub fn between(from: (usize, usize), to: (usize, usize)) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| d.shift(from) == Some(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_are_involutive() {
        for d in Direction::ALL {
            assert_ne!(d, d.opposite());
            assert_eq!(d, d.opposite().opposite());
        }
    }

    #[test]
    fn test_shift_clips_at_zero() {
        assert_eq!(Direction::North.shift((0, 3)), None);
        assert_eq!(Direction::West.shift((2, 0)), None);
        assert_eq!(Direction::South.shift((0, 3)), Some((1, 3)));
        assert_eq!(Direction::East.shift((2, 0)), Some((2, 1)));
    }

    #[test]
    fn test_between() {
        assert_eq!(Direction::between((1, 1), (0, 1)), Some(Direction::North));
        assert_eq!(Direction::between((1, 1), (1, 0)), Some(Direction::West));
        assert_eq!(Direction::between((1, 1), (2, 2)), None);
        assert_eq!(Direction::between((1, 1), (1, 1)), None);
        assert_eq!(Direction::between((0, 0), (0, 2)), None);
    }
}
