//! Coordinates generation and solving for a single on-screen maze.
//!
//! Generating replaces the maze and cancels whatever was running. A solve
//! requested while the maze is still being generated waits for it, and is
//! cancelled with it if the generation is aborted.

use std::sync::mpsc::Sender;

use crate::{
    config::Config,
    error::{MazeError, Result},
    generators,
    maze::{Mark, Maze, MazeRef, grid::GridEvent},
    scheduler::{Completion, Handle, Next, Outcome, Scheduler, StepContext, Task},
    solvers::{self, Solver},
};

/// What the session is doing, for status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Generating,
    Generated,
    /// A solve was requested and is waiting for generation to complete.
    WaitingForGenerator,
    Solving { visited: usize },
    Solved { visited: usize },
    Cancelled,
    Failed(MazeError),
}

/// Solve run that starts searching only once the generation it depends on finished.
struct PendingSolve {
    generation: Handle,
    maze: MazeRef,
    solver: Solver,
    seed: Option<u64>,
}

impl Task for PendingSolve {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        match self.generation.outcome() {
            None => Ok(Next::Ready),
            Some(Ok(Completion::Finished)) => {
                let search = solvers::solver_task(&self.maze, self.solver, self.seed)?;
                ctx.finish();
                Ok(Next::Deferred(search))
            }
            Some(Ok(Completion::Aborted)) => {
                tracing::debug!("[session] generation was aborted, cancelling pending solve");
                ctx.cancel();
                Ok(Next::Ready)
            }
            Some(Err(e)) => Err(e),
        }
    }
}

pub struct MazeSession {
    config: Config,
    scheduler: Scheduler,
    maze: Option<MazeRef>,
    events: Option<Sender<GridEvent>>,
    generation: Option<Handle>,
    solve: Option<Handle>,
}

impl MazeSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
            maze: None,
            events: None,
            generation: None,
            solve: None,
        }
    }

    /// Streams the changes of every maze generated from now on to `sender`.
    pub fn with_events(mut self, sender: Sender<GridEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current maze, if one was generated.
    pub fn maze(&self) -> Option<&MazeRef> {
        self.maze.as_ref()
    }

    /// Runs one scheduler turn. Returns `false` when nothing is left to run.
    pub fn tick(&mut self) -> bool {
        self.scheduler.turn()
    }

    pub fn run_until_idle(&mut self) {
        self.scheduler.run_until_idle();
    }

    pub fn block_on(&mut self, handle: &Handle) -> Option<Outcome> {
        self.scheduler.block_on(handle)
    }

    /// Replaces the maze with a fresh `rows` x `cols` one and starts generating it.
    /// Any generation or solve in flight is aborted first.
    pub fn generate(&mut self, rows: usize, cols: usize) -> Result<Handle> {
        if rows < 2 || cols < 2 {
            return Err(MazeError::InvalidDimensions { rows, cols });
        }
        self.cancel_generate();
        self.cancel_solve();
        self.solve = None;

        let maze = Maze::with_events(rows, cols, self.events.clone()).into_shared();
        let delay = self.config.generation_delay(rows, cols);
        let handle = generators::generate(&mut self.scheduler, &maze, self.config.seed, delay)?;
        tracing::info!("[session] generating {}x{} maze as run {}", rows, cols, handle.id());
        self.maze = Some(maze);
        self.generation = Some(handle.clone());
        Ok(handle)
    }

    /// Starts solving the current maze once its generation finishes.
    ///
    /// Returns `Ok(None)` without doing anything if a solve is already in
    /// flight; requests are not queued.
    pub fn solve(&mut self, solver: Solver) -> Result<Option<Handle>> {
        if self.solve.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("[session] solve already in flight, ignoring request");
            return Ok(None);
        }
        let (Some(maze), Some(generation)) = (&self.maze, &self.generation) else {
            return Err(MazeError::MissingEndpoint("start"));
        };

        let delay = self.config.solve_delay(maze.borrow().rows(), maze.borrow().cols());
        let handle = self.scheduler.spawn(
            PendingSolve {
                generation: generation.clone(),
                maze: maze.clone(),
                solver,
                seed: self.config.seed,
            },
            delay,
        );
        tracing::info!("[session] solve with {} queued as run {}", solver, handle.id());
        self.solve = Some(handle.clone());
        Ok(Some(handle))
    }

    pub fn cancel_generate(&mut self) {
        if let Some(handle) = &self.generation {
            handle.abort();
        }
    }

    pub fn cancel_solve(&mut self) {
        if let Some(handle) = &self.solve {
            handle.abort();
        }
    }

    /// Cells expanded by the current or last solve.
    pub fn visited_count(&self) -> usize {
        self.maze
            .as_ref()
            .map_or(0, |m| m.borrow().marked(Mark::Visited).count())
    }

    pub fn status(&self) -> Status {
        let visited = self.visited_count();
        if let Some(solve) = &self.solve {
            return match solve.outcome() {
                None if self.generation.as_ref().is_some_and(|g| !g.is_finished()) => {
                    Status::WaitingForGenerator
                }
                None => Status::Solving { visited },
                Some(Ok(Completion::Finished)) => Status::Solved { visited },
                Some(Ok(Completion::Aborted)) => Status::Cancelled,
                Some(Err(e)) => Status::Failed(e),
            };
        }
        match self.generation.as_ref().map(Handle::outcome) {
            None => Status::Idle,
            Some(None) => Status::Generating,
            Some(Some(Ok(Completion::Finished))) => Status::Generated,
            Some(Some(Ok(Completion::Aborted))) => Status::Cancelled,
            Some(Some(Err(e))) => Status::Failed(e),
        }
    }
}
