use std::{
    fmt,
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::error::MazeError;

/// Identity of one run, assigned by the scheduler that spawned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The run called `finish` and everything it deferred to has settled.
    Finished,
    /// The run was aborted, from outside or by cancelling itself.
    Aborted,
}

pub type Outcome = Result<Completion, MazeError>;

struct RunShared {
    id: RunId,
    cancelled: AtomicBool,
    outcome: Mutex<Option<Outcome>>,
    settled: Condvar,
}

/// Handle to a scheduled run. Clones refer to the same run.
///
/// Safe to share with other threads, e.g. an input thread that aborts the run
/// while the scheduler keeps ticking on its own thread.
#[derive(Clone)]
pub struct Handle {
    shared: Arc<RunShared>,
}

impl Handle {
    pub(crate) fn new(id: RunId) -> Self {
        Handle {
            shared: Arc::new(RunShared {
                id,
                cancelled: AtomicBool::new(false),
                outcome: Mutex::new(None),
                settled: Condvar::new(),
            }),
        }
    }

    pub fn id(&self) -> RunId {
        self.shared.id
    }

    fn lock(&self) -> MutexGuard<'_, Option<Outcome>> {
        // A poisoned lock still holds a valid outcome slot
        self.shared
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops the run. A step already executing still completes, but no further
    /// step starts. The run settles as [`Completion::Aborted`] unless it had
    /// already settled. Calling this more than once has no further effect.
    pub fn abort(&self) {
        if !self.shared.cancelled.swap(true, Ordering::SeqCst) {
            self.settle(Ok(Completion::Aborted));
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Records the outcome unless one is already recorded. Returns whether it was recorded.
    pub(crate) fn settle(&self, outcome: Outcome) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        self.shared.settled.notify_all();
        true
    }

    pub fn is_finished(&self) -> bool {
        self.lock().is_some()
    }

    /// The outcome, if the run has settled.
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().clone()
    }

    /// Blocks until the run settles.
    ///
    /// Only useful from a thread other than the one driving the scheduler;
    /// on the driving thread use `Scheduler::block_on`.
    pub fn wait(&self) -> Outcome {
        let mut slot = self.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self
                .shared
                .settled
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Handle::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let slot = self.lock();
        let (slot, _) = self
            .shared
            .settled
            .wait_timeout_while(slot, timeout, |o| o.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.clone()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id())
            .field("aborted", &self.is_aborted())
            .field("outcome", &self.outcome())
            .finish()
    }
}
