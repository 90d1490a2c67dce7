//! Deferred execution.
//!
//! `TimerHost` is the one capability hooks need from the host: "run this after
//! a delay, unless cancelled first". Nothing here spawns threads; the host's
//! event loop calls [`TimerQueue::run_due`] (or [`ManualTimers::advance`] in
//! tests) and the due tasks run on that thread, in deadline order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

use crate::clock::{Clock, ManualClock, SystemClock};

new_key_type! {
    /// Handle to a scheduled task.
    pub struct TimerId;
}

pub type Task = Box<dyn FnOnce()>;

pub trait TimerHost {
    fn now(&self) -> Instant;

    /// Runs `task` once, no earlier than `delay` from now.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Removes a queued task. Returns `false` if it already ran or was cancelled.
    /// Once this returns the task will never run.
    fn cancel(&self, id: TimerId) -> bool;

    fn is_scheduled(&self, id: TimerId) -> bool;
}

struct Entry {
    deadline: Instant,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Queue {
    entries: SlotMap<TimerId, Entry>,
    // (deadline, seq) keeps equal deadlines FIFO.
    order: BTreeMap<(Instant, u64), TimerId>,
    next_seq: u64,
}

impl Queue {
    fn insert(&mut self, deadline: Instant, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.entries.insert(Entry {
            deadline,
            seq,
            task,
        });
        self.order.insert((deadline, seq), id);
        id
    }

    fn remove(&mut self, id: TimerId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.order.remove(&(entry.deadline, entry.seq));
        Some(entry)
    }

    fn pop_due(&mut self, now: Instant) -> Option<Task> {
        let (&(deadline, _), &id) = self.order.iter().next()?;
        if deadline > now {
            return None;
        }
        self.remove(id).map(|e| e.task)
    }
}

// Stand-in deadline for delays the clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A `TimerHost` over any [`Clock`].
pub struct TimerQueue {
    clock: Rc<dyn Clock>,
    queue: RefCell<Queue>,
}

impl TimerQueue {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: RefCell::new(Queue::default()),
        }
    }

    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock))
    }

    /// Runs every task whose deadline has passed and returns how many ran.
    ///
    /// The queue is not borrowed while a task runs, so tasks may schedule or
    /// cancel freely. A task scheduled with zero delay from inside another task
    /// runs in the same pass.
    pub fn run_due(&self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.clock.now();
            let task = self.queue.borrow_mut().pop_due(now);
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            log::trace!("timers: ran {ran} task(s)");
        }
        ran
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue
            .borrow()
            .order
            .keys()
            .next()
            .map(|&(deadline, _)| deadline)
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimerHost for TimerQueue {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let now = self.clock.now();
        let deadline = match now.checked_add(delay) {
            Some(deadline) => deadline,
            None => {
                log::debug!("timers: delay {delay:?} overflows the clock; clamping");
                now.checked_add(FAR_FUTURE).unwrap_or(now)
            }
        };
        self.queue.borrow_mut().insert(deadline, task)
    }

    fn cancel(&self, id: TimerId) -> bool {
        // Drop the task only after the borrow is released; its captures may
        // reach back into this queue.
        let removed = self.queue.borrow_mut().remove(id);
        removed.is_some()
    }

    fn is_scheduled(&self, id: TimerId) -> bool {
        self.queue.borrow().entries.contains_key(id)
    }
}

/// Virtual-time timers for tests and headless drivers.
pub struct ManualTimers {
    clock: Rc<ManualClock>,
    queue: TimerQueue,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        let clock = Rc::new(ManualClock::new(start));
        Self {
            queue: TimerQueue::new(clock.clone()),
            clock,
        }
    }

    pub fn clock(&self) -> &Rc<ManualClock> {
        &self.clock
    }

    /// Moves virtual time forward by `d`, stopping at every deadline on the
    /// way so each task observes its own deadline as "now".
    pub fn advance(&self, d: Duration) -> usize {
        self.advance_to(self.clock.now() + d)
    }

    pub fn advance_to(&self, target: Instant) -> usize {
        let mut ran = 0;
        while let Some(deadline) = self.queue.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline);
            ran += self.queue.run_due();
        }
        self.clock.set(target);
        ran + self.queue.run_due()
    }

    pub fn run_due(&self) -> usize {
        self.queue.run_due()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for ManualTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerHost for ManualTimers {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        self.queue.schedule(delay, task)
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.queue.cancel(id)
    }

    fn is_scheduled(&self, id: TimerId) -> bool {
        self.queue.is_scheduled(id)
    }
}

thread_local! {
    static CURRENT_TIMERS: RefCell<Option<Rc<dyn TimerHost>>> = const { RefCell::new(None) };
    static FALLBACK_TIMERS: Rc<TimerQueue> = Rc::new(TimerQueue::system());
}

/// The timer host hooks should use right now: the one installed by the
/// running composition, else this thread's system-clock queue.
pub fn current_timers() -> Rc<dyn TimerHost> {
    if let Some(host) = CURRENT_TIMERS.with(|c| c.borrow().clone()) {
        return host;
    }
    let fallback: Rc<dyn TimerHost> = fallback_timers();
    fallback
}

/// This thread's system-clock queue. Hosts without their own timer loop must
/// call `run_due` on it.
pub fn fallback_timers() -> Rc<TimerQueue> {
    FALLBACK_TIMERS.with(|f| f.clone())
}

/// Runs `f` with `host` as the current timer host.
pub fn with_timers<R>(host: Rc<dyn TimerHost>, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Rc<dyn TimerHost>>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let prev = self.0.take();
            CURRENT_TIMERS.with(|c| *c.borrow_mut() = prev);
        }
    }

    let prev = CURRENT_TIMERS.with(|c| c.borrow_mut().replace(host));
    let _restore = Restore(prev);
    f()
}
