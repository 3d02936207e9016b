//! Single-lane task queue with dispatch pacing
//!
//! The lane holds the FIFO queue of pending tasks together with the pacing
//! clock (the instant of the last dispatch). Both live under the same lock in
//! the scheduler, so an append can never interleave with a dequeue and only
//! one dispatch can win a given pacing slot.

use crate::crawler::adapter::RawPage;
use crate::crawler::request::RequestOptions;
use crate::CourierError;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Continuation signalled exactly once with the task's outcome
pub(crate) type Reply = oneshot::Sender<Result<RawPage, CourierError>>;

/// One queued fetch awaiting its turn on the lane
#[derive(Debug)]
pub(crate) struct Task {
    pub options: RequestOptions,
    pub reply: Reply,
}

/// What the lane worker should do next
#[derive(Debug)]
pub(crate) enum Next {
    /// Dispatch this task now; the pacing clock has been stamped
    Dispatch { id: u64, task: Task },

    /// Tasks are waiting but the previous dispatch was too recent
    Wait(Duration),

    /// Nothing queued; wait for a submission
    Idle,

    /// Nothing queued and intake is closed
    Closed,
}

/// Queue and pacing state of the lane
#[derive(Debug)]
pub(crate) struct Lane {
    tasks: VecDeque<Task>,
    delay: Duration,
    last_dispatch: Option<Instant>,
    dispatched: u64,
    closed: bool,
}

impl Lane {
    pub fn new(delay: Duration) -> Self {
        Self {
            tasks: VecDeque::new(),
            delay,
            last_dispatch: None,
            dispatched: 0,
            closed: false,
        }
    }

    /// Appends a task to the back of the queue
    ///
    /// Hands the task back if intake has been closed.
    pub fn push(&mut self, task: Task) -> Result<(), Task> {
        if self.closed {
            return Err(task);
        }
        self.tasks.push_back(task);
        Ok(())
    }

    /// Decides the next step at instant `now`
    ///
    /// Dequeues the head task only when at least `delay` has passed since the
    /// previous dispatch, and stamps the pacing clock with `now` when it does.
    pub fn next(&mut self, now: Instant) -> Next {
        if self.tasks.is_empty() {
            return if self.closed { Next::Closed } else { Next::Idle };
        }

        if let Some(last) = self.last_dispatch {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.delay {
                return Next::Wait(self.delay - elapsed);
            }
        }

        match self.tasks.pop_front() {
            Some(task) => {
                self.last_dispatch = Some(now);
                let id = self.dispatched;
                self.dispatched += 1;
                Next::Dispatch { id, task }
            }
            None => Next::Idle,
        }
    }

    /// Stops accepting tasks; queued ones are still dispatched
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Number of tasks dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}
