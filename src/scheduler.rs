//! Batch scheduling of image work.
//!
//! Pending ids are split into fixed-size groups. A group runs concurrently on
//! the rayon pool; the scheduler then waits for the next frame before starting
//! the following group, so a burst of decodes never monopolizes the machine.
//!
//! ```text
//! [a b c] ─ frame ─ [d e f] ─ frame ─ [g]
//!  par_iter          par_iter          par_iter
//! ```
//!
//! De-duplication across callers goes through [`InFlight`]: an id can be
//! claimed by at most one worker at a time, and the claim is released when the
//! returned guard drops, whether processing succeeded or failed.
//!
//! Once [`BatchScheduler::stop`] is called the groups that have not started
//! are discarded. A group already running completes.

use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Waits between groups.
pub trait FrameClock: Send + Sync {
    fn next_frame(&self);
}

/// Sleeps for a fixed interval per frame. A zero interval yields the thread.
#[derive(Debug, Clone, Copy)]
pub struct IntervalClock {
    interval: Duration,
}

impl IntervalClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&self) {
        if self.interval.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.interval);
        }
    }
}

/// Split `items` into groups of at most `size` (a size of 0 is treated as 1).
pub fn partition<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// What happened to one scheduling request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleReport {
    pub groups_run: usize,
    /// Groups dropped because the scheduler was stopped.
    pub groups_discarded: usize,
    pub items_run: usize,
}

/// Runs groups of work with a frame wait in between.
pub struct BatchScheduler {
    batch_size: usize,
    clock: Box<dyn FrameClock>,
    stopped: AtomicBool,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, clock: Box<dyn FrameClock>) -> Self {
        Self {
            batch_size: batch_size.max(1),
            clock,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Run `work` over `items` group by group.
    ///
    /// Blocks until every group has run or the scheduler was stopped.
    pub fn run<T, F>(&self, items: &[T], work: F) -> ScheduleReport
    where
        T: Clone + Send + Sync,
        F: Fn(&T) + Send + Sync,
    {
        let groups = partition(items, self.batch_size);
        let total = groups.len();
        let mut report = ScheduleReport::default();

        for (n, group) in groups.iter().enumerate() {
            if self.is_stopped() {
                report.groups_discarded = total - n;
                debug!(discarded = report.groups_discarded, "scheduler stopped");
                break;
            }
            if n > 0 {
                self.clock.next_frame();
                // Stop may land while waiting for the frame
                if self.is_stopped() {
                    report.groups_discarded = total - n;
                    debug!(discarded = report.groups_discarded, "scheduler stopped");
                    break;
                }
            }
            debug!(group = n + 1, of = total, size = group.len(), "running group");
            group.par_iter().for_each(&work);
            report.groups_run += 1;
            report.items_run += group.len();
        }
        report
    }
}

impl std::fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("batch_size", &self.batch_size)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Ids currently being processed.
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<String>>,
    released: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`. Returns `None` when another worker already holds it.
    pub fn claim(&self, id: &str) -> Option<InFlightGuard<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if ids.insert(id.to_string()) {
            Some(InFlightGuard {
                owner: self,
                id: id.to_string(),
            })
        } else {
            None
        }
    }

    /// Block until nobody holds `id`. Returns at once when it is not claimed.
    pub fn wait_released(&self, id: &str) {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        while ids.contains(id) {
            ids = self.released.wait(ids).unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases an [`InFlight`] claim on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    id: String,
}

impl InFlightGuard<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
        self.owner.released.notify_all();
    }
}
