//! Maze size, pacing and seeding.

use std::time::Duration;

/// How long the scheduler waits between two steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// The same delay regardless of maze size.
    Fixed(Duration),
    /// `budget / max(rows, cols)`, so larger mazes animate with shorter steps.
    Scaled { budget: Duration },
}

impl Pacing {
    /// No delay between steps. Every step still gets its own turn.
    pub fn instant() -> Self {
        Pacing::Fixed(Duration::ZERO)
    }

    pub fn delay(self, rows: usize, cols: usize) -> Duration {
        match self {
            Pacing::Fixed(delay) => delay,
            Pacing::Scaled { budget } => {
                let longest = rows.max(cols).max(1);
                budget / u32::try_from(longest).unwrap_or(u32::MAX)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rows: usize,
    pub cols: usize,
    /// Seed for every random choice. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub generation_pacing: Pacing,
    pub solve_pacing: Pacing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            seed: None,
            generation_pacing: Pacing::Scaled {
                budget: Duration::from_millis(1200),
            },
            solve_pacing: Pacing::Scaled {
                budget: Duration::from_millis(500),
            },
        }
    }
}

impl Config {
    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Drops every delay, for headless runs and tests.
    pub fn instant(mut self) -> Self {
        self.generation_pacing = Pacing::instant();
        self.solve_pacing = Pacing::instant();
        self
    }

    pub fn generation_delay(&self, rows: usize, cols: usize) -> Duration {
        self.generation_pacing.delay(rows, cols)
    }

    pub fn solve_delay(&self, rows: usize, cols: usize) -> Duration {
        self.solve_pacing.delay(rows, cols)
    }

    /// Defaults overridden by `MAZE_ROWS`, `MAZE_COLS`, `MAZE_SEED` and `MAZE_INSTANT=1`.
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let mut config = Config::default();
        if let Some(rows) = parse("MAZE_ROWS") {
            config.rows = rows as usize;
        }
        if let Some(cols) = parse("MAZE_COLS") {
            config.cols = cols as usize;
        }
        config.seed = parse("MAZE_SEED");
        if lookup("MAZE_INSTANT").is_some_and(|v| v == "1") {
            config = config.instant();
        }
        config
    }
}
