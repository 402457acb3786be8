use crate::{error::Result, scheduler::RunId};

/// What a step hands back to the scheduler.
pub enum Next {
    /// Continue with another step of the same task after the run's delay.
    Ready,
    /// Run this task to completion first, then resume the current one.
    ///
    /// The deferred task runs under the same handle, so aborting the run also
    /// stops it.
    Deferred(Box<dyn Task>),
}

/// Per-invocation controls passed to [`Task::step`].
pub struct StepContext {
    run: RunId,
    finished: bool,
    cancelled: bool,
}

impl StepContext {
    pub(crate) fn new(run: RunId) -> Self {
        StepContext {
            run,
            finished: false,
            cancelled: false,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// Ends the task once the current invocation (and anything it deferred to) settles.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Ends the whole run as aborted once the current invocation returns.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A long-running computation broken into steps.
///
/// The scheduler calls [`Task::step`] repeatedly, one call per tick, until the
/// task calls [`StepContext::finish`], returns an error, or the run is aborted.
pub trait Task {
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next>;
}

/// Task built from a closure that threads a value from one step to the next.
pub struct LoopFn<S, F> {
    value: Option<S>,
    f: F,
}

/// Wraps `f` as a [`Task`]. Each step receives the value returned by the
/// previous one, starting with `initial`.
pub fn loop_fn<S, F>(initial: S, f: F) -> LoopFn<S, F>
where
    F: FnMut(S, &mut StepContext) -> Result<S>,
{
    LoopFn {
        value: Some(initial),
        f,
    }
}

impl<S, F> Task for LoopFn<S, F>
where
    F: FnMut(S, &mut StepContext) -> Result<S>,
{
    fn step(&mut self, ctx: &mut StepContext) -> Result<Next> {
        // Only missing if a previous step errored, which ends the run
        let Some(value) = self.value.take() else {
            ctx.finish();
            return Ok(Next::Ready);
        };
        self.value = Some((self.f)(value, ctx)?);
        Ok(Next::Ready)
    }
}
