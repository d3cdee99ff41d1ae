//! Cooperative Task Scheduler
//!
//! Single-threaded timers for the work that runs outside the per-frame
//! update: polling loops, countdowns, delayed audio and restarts.
//!
//! Tasks are plain data (`T`) dispatched by the owner, so a task can
//! mutate the whole game context without closures capturing it.
//!
//! ## Pass semantics
//!
//! - [`Scheduler::advance`] starts a new pass and moves the clock.
//! - [`Scheduler::pop_due`] yields due tasks in (due time, id) order.
//! - A task scheduled during a pass never runs in that pass.
//! - A repeating task fires at most once per pass.
//! - A cancelled task is never yielded again, even later in the same pass.

/// Handle to a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    due: f64,
    interval: Option<f64>,
    last_pass: u64,
    task: T,
}

/// Timer wheel for cooperative tasks.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    pass: u64,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Empty scheduler at time zero.
    pub fn new() -> Self {
        Self {
            now: 0.0,
            pass: 0,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Current clock (seconds).
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run `task` once, `delay` seconds from now.
    pub fn after(&mut self, delay: f32, task: T) -> TaskId {
        self.insert(delay, None, task)
    }

    /// Run `task` every `interval` seconds, first after one interval.
    ///
    /// An interval of zero means "every pass".
    pub fn every(&mut self, interval: f32, task: T) -> TaskId {
        self.insert(interval, Some(interval), task)
    }

    /// Run `task` first after `first_delay`, then every `interval`.
    pub fn repeat(&mut self, first_delay: f32, interval: f32, task: T) -> TaskId {
        self.insert(first_delay, Some(interval), task)
    }

    fn insert(&mut self, delay: f32, interval: Option<f32>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due: self.now + delay.max(0.0) as f64,
            interval: interval.map(|i| i.max(0.0) as f64),
            last_pass: self.pass,
            task,
        });
        id
    }

    /// Cancel a task. Returns false if it already finished or was unknown.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every pending task. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// True while the task is pending.
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a new pass, moving the clock forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.now += dt.max(0.0) as f64;
        self.pass += 1;
    }
}

impl<T: Clone> Scheduler<T> {
    /// Take the next task that is due in the current pass.
    pub fn pop_due(&mut self) -> Option<(TaskId, T)> {
        let pass = self.pass;
        let now = self.now;

        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.last_pass < pass && e.due <= now)
            .min_by(|(_, a), (_, b)| {
                a.due
                    .total_cmp(&b.due)
                    .then(a.id.cmp(&b.id))
            })
            .map(|(i, _)| i)?;

        match self.entries[index].interval {
            Some(interval) => {
                let entry = &mut self.entries[index];
                entry.due = if interval > 0.0 { entry.due + interval } else { now };
                entry.last_pass = pass;
                Some((entry.id, entry.task.clone()))
            }
            None => {
                let entry = self.entries.remove(index);
                Some((entry.id, entry.task))
            }
        }
    }
}
