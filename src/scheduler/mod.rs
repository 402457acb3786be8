//! Single-threaded, delay-paced, abortable step runner.
//!
//! A [`Scheduler`] owns any number of runs and executes one step of one run per
//! [`Scheduler::turn`]. Steps of the same run never overlap and always execute
//! in order. Between two turns the caller may inspect shared state or abort
//! runs; nothing else ever interleaves with a step.
//!
//! Every step is scheduled `delay` after the previous step of its run settled.
//! A zero delay still goes through a turn, so spawning never runs a step
//! synchronously.

mod handle;
mod task;

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    time::{Duration, Instant},
};

pub use handle::{Completion, Handle, Outcome, RunId};
pub use task::{LoopFn, Next, StepContext, Task, loop_fn};

use crate::error::MazeError;

struct Frame {
    task: Box<dyn Task>,
    /// Set once the task called `finish`; the frame pops when its deferred children settle.
    finishing: bool,
}

struct Run {
    handle: Handle,
    /// Innermost deferred task on top.
    frames: Vec<Frame>,
    delay: Duration,
    due: Instant,
}

/// Result of executing a single step.
enum Settled {
    Pending,
    Done(Outcome),
}

#[derive(Default)]
pub struct Scheduler {
    runs: Vec<Run>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to be stepped every `delay` until it finishes.
    /// The first step happens on a later turn, never inside this call.
    pub fn spawn<T: Task + 'static>(&mut self, task: T, delay: Duration) -> Handle {
        self.spawn_boxed(Box::new(task), delay)
    }

    pub fn spawn_boxed(&mut self, task: Box<dyn Task>, delay: Duration) -> Handle {
        self.next_id += 1;
        let handle = Handle::new(RunId(self.next_id));
        tracing::debug!("[scheduler] run {} spawned with delay {:?}", handle.id(), delay);
        self.runs.push(Run {
            handle: handle.clone(),
            frames: vec![Frame {
                task,
                finishing: false,
            }],
            delay,
            due: Instant::now() + delay,
        });
        handle
    }

    /// Number of runs that have not settled yet.
    pub fn active_runs(&self) -> usize {
        self.runs.iter().filter(|r| !r.handle.is_finished()).count()
    }

    fn drop_settled(&mut self) {
        self.runs.retain(|run| {
            let settled = run.handle.is_finished();
            if settled && run.handle.is_aborted() {
                tracing::debug!("[scheduler] run {} dropped after abort", run.handle.id());
            }
            !settled
        });
    }

    /// Executes the next due step, sleeping until it is due.
    /// Returns `false` when there was nothing left to run.
    pub fn turn(&mut self) -> bool {
        self.drop_settled();
        let Some(idx) = self
            .runs
            .iter()
            .enumerate()
            .min_by_key(|(_, run)| (run.due, run.handle.id()))
            .map(|(idx, _)| idx)
        else {
            return false;
        };

        let wait = self.runs[idx].due.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        // An abort may have arrived from another thread while sleeping
        if self.runs[idx].handle.is_finished() {
            self.runs.swap_remove(idx);
            return true;
        }

        let run = &mut self.runs[idx];
        match Scheduler::step_run(run) {
            Settled::Pending => {
                run.due = Instant::now() + run.delay;
            }
            Settled::Done(outcome) => {
                match &outcome {
                    Ok(completion) => {
                        tracing::debug!("[scheduler] run {} settled: {:?}", run.handle.id(), completion)
                    }
                    Err(e) => tracing::warn!("[scheduler] run {} failed: {}", run.handle.id(), e),
                }
                if matches!(outcome, Ok(Completion::Aborted)) {
                    run.handle.abort();
                } else {
                    run.handle.settle(outcome);
                }
                self.runs.swap_remove(idx);
            }
        }
        true
    }

    fn step_run(run: &mut Run) -> Settled {
        let Some(frame) = run.frames.last_mut() else {
            return Settled::Done(Ok(Completion::Finished));
        };
        let mut ctx = StepContext::new(run.handle.id());
        let result = catch_unwind(AssertUnwindSafe(|| frame.task.step(&mut ctx)));
        tracing::trace!("[scheduler] run {} stepped", run.handle.id());

        let next = match result {
            Err(payload) => return Settled::Done(Err(MazeError::Step(panic_message(&payload)))),
            Ok(Err(e)) => return Settled::Done(Err(e)),
            Ok(Ok(next)) => next,
        };
        if ctx.is_cancelled() {
            return Settled::Done(Ok(Completion::Aborted));
        }
        frame.finishing |= ctx.is_finished();

        match next {
            Next::Deferred(task) => {
                run.frames.push(Frame {
                    task,
                    finishing: false,
                });
            }
            Next::Ready => {
                // Pop every frame that finished, resuming the first one that has not
                while run.frames.last().is_some_and(|f| f.finishing) {
                    run.frames.pop();
                }
                if run.frames.is_empty() {
                    return Settled::Done(Ok(Completion::Finished));
                }
            }
        }
        Settled::Pending
    }

    /// Runs turns until every run has settled.
    pub fn run_until_idle(&mut self) {
        while self.turn() {}
    }

    /// Runs turns until `handle` settles and returns its outcome.
    /// Returns `None` if this scheduler ran out of work first, which means the
    /// run belongs to another scheduler.
    pub fn block_on(&mut self, handle: &Handle) -> Option<Outcome> {
        while !handle.is_finished() {
            if !self.turn() {
                break;
            }
        }
        handle.outcome()
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "step panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    /// Counts up to `limit`, recording every value it sees.
    fn counter(log: Rc<RefCell<Vec<u32>>>, limit: u32) -> impl Task {
        loop_fn(0u32, move |value, ctx| {
            log.borrow_mut().push(value);
            if value + 1 >= limit {
                ctx.finish();
            }
            Ok(value + 1)
        })
    }

    #[test]
    fn test_spawn_does_not_step_synchronously() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(counter(log.clone(), 3), Duration::ZERO);
        assert!(log.borrow().is_empty());
        assert!(!handle.is_finished());

        assert!(scheduler.turn());
        assert_eq!(*log.borrow(), vec![0]);
        assert_eq!(scheduler.block_on(&handle), Some(Ok(Completion::Finished)));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!scheduler.turn());
    }

    #[test]
    fn test_abort_suppresses_next_step() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(counter(log.clone(), 100), Duration::ZERO);
        scheduler.turn();
        scheduler.turn();
        handle.abort();
        handle.abort();
        scheduler.run_until_idle();
        assert_eq!(*log.borrow(), vec![0, 1]);
        assert_eq!(handle.outcome(), Some(Ok(Completion::Aborted)));
        assert_eq!(scheduler.active_runs(), 0);
    }

    #[test]
    fn test_runs_interleave_but_steps_stay_ordered() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let a = {
            let log = log.clone();
            scheduler.spawn(
                loop_fn(0u32, move |v, ctx| {
                    log.borrow_mut().push(("a", v));
                    if v == 2 {
                        ctx.finish();
                    }
                    Ok(v + 1)
                }),
                Duration::ZERO,
            )
        };
        let b = {
            let log = log.clone();
            scheduler.spawn(
                loop_fn(0u32, move |v, ctx| {
                    log.borrow_mut().push(("b", v));
                    if v == 2 {
                        ctx.finish();
                    }
                    Ok(v + 1)
                }),
                Duration::ZERO,
            )
        };
        scheduler.run_until_idle();
        assert!(a.is_finished() && b.is_finished());
        let a_values = log.borrow().iter().filter(|e| e.0 == "a").map(|e| e.1).collect::<Vec<_>>();
        let b_values = log.borrow().iter().filter(|e| e.0 == "b").map(|e| e.1).collect::<Vec<_>>();
        assert_eq!(a_values, vec![0, 1, 2]);
        assert_eq!(b_values, vec![0, 1, 2]);
    }

    #[test]
    fn test_errors_and_panics_settle_the_run() {
        let mut scheduler = Scheduler::new();
        let failing = scheduler.spawn(
            loop_fn((), |_, _| Err(MazeError::ExhaustedSearch { search: "test" })),
            Duration::ZERO,
        );
        let panicking = scheduler.spawn(
            loop_fn((), |_, _| -> crate::error::Result<()> { panic!("boom") }),
            Duration::ZERO,
        );
        scheduler.run_until_idle();
        assert_eq!(
            failing.outcome(),
            Some(Err(MazeError::ExhaustedSearch { search: "test" }))
        );
        assert_eq!(panicking.outcome(), Some(Err(MazeError::Step("boom".into()))));
    }

    struct Parent {
        log: Rc<RefCell<Vec<&'static str>>>,
        deferred: bool,
    }

    impl Task for Parent {
        fn step(&mut self, ctx: &mut StepContext) -> crate::error::Result<Next> {
            self.log.borrow_mut().push("parent");
            if self.deferred {
                ctx.finish();
                return Ok(Next::Ready);
            }
            self.deferred = true;
            let log = self.log.clone();
            Ok(Next::Deferred(Box::new(loop_fn(0, move |n, ctx| {
                log.borrow_mut().push("child");
                if n == 1 {
                    ctx.finish();
                }
                Ok(n + 1)
            }))))
        }
    }

    #[test]
    fn test_deferred_task_settles_before_parent_resumes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(
            Parent {
                log: log.clone(),
                deferred: false,
            },
            Duration::ZERO,
        );
        assert_eq!(scheduler.block_on(&handle), Some(Ok(Completion::Finished)));
        assert_eq!(*log.borrow(), vec!["parent", "child", "child", "parent"]);
    }

    #[test]
    fn test_abort_reaches_deferred_task() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(
            Parent {
                log: log.clone(),
                deferred: false,
            },
            Duration::ZERO,
        );
        scheduler.turn();
        scheduler.turn();
        handle.abort();
        scheduler.run_until_idle();
        assert_eq!(*log.borrow(), vec!["parent", "child"]);
        assert_eq!(handle.outcome(), Some(Ok(Completion::Aborted)));
    }

    #[test]
    fn test_cancel_from_inside_is_an_abort() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.spawn(
            loop_fn((), |_, ctx| {
                ctx.cancel();
                Ok(())
            }),
            Duration::ZERO,
        );
        assert_eq!(scheduler.block_on(&handle), Some(Ok(Completion::Aborted)));
        assert!(handle.is_aborted());
    }

    #[test]
    fn test_steps_are_paced_by_delay() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let delay = Duration::from_millis(5);
        let started = Instant::now();
        let handle = scheduler.spawn(counter(log, 3), delay);
        scheduler.block_on(&handle);
        assert!(started.elapsed() >= delay * 3);
    }
}
