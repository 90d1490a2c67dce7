//! Debounced callbacks.
//!
//! [`Debouncer`] is the scheduler: one target, one delay, one set of edge
//! options, and at most one pending invocation. Calls made while an
//! invocation is pending only replace the buffered arguments and push the
//! deadline back (never past `max_wait` since the last invocation).
//!
//! [`DebouncedInvoker`] wraps a `Debouncer` behind a stable handle that can be
//! reconfigured and torn down, and [`use_debounce_callback`] binds one to the
//! running composition.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tarry_core::{
    ConfigError, TimerHost, TimerId, current_timers, on_unmount, remember, scoped_effect,
};
use web_time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

pub type Target<A, R> = Rc<dyn Fn(A) -> R>;

/// Edge and ceiling options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Invoke at the start of a burst.
    pub leading: bool,
    /// Invoke once the burst has been quiet for the delay.
    pub trailing: bool,
    /// Longest an invocation may be deferred while calls keep arriving.
    pub max_wait: Option<Duration>,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

impl DebounceOptions {
    pub fn leading(mut self, on: bool) -> Self {
        self.leading = on;
        self
    }

    pub fn trailing(mut self, on: bool) -> Self {
        self.trailing = on;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Raw debounce settings as they appear in config files. Durations are
/// signed milliseconds so bad input is caught by [`DebounceConfig::validate`]
/// instead of at parse time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub delay_ms: i64,
    pub leading: bool,
    pub trailing: bool,
    pub max_wait_ms: Option<i64>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY.as_millis() as i64,
            leading: false,
            trailing: true,
            max_wait_ms: None,
        }
    }
}

impl DebounceConfig {
    pub fn validate(&self) -> Result<(Duration, DebounceOptions), ConfigError> {
        let delay = millis("delay_ms", self.delay_ms)?;
        let max_wait = self
            .max_wait_ms
            .map(|ms| millis("max_wait_ms", ms))
            .transpose()?;
        let options = DebounceOptions {
            leading: self.leading,
            trailing: self.trailing,
            max_wait,
        };
        check_edges(&options)?;
        Ok((delay, options))
    }
}

fn millis(field: &'static str, value: i64) -> Result<Duration, ConfigError> {
    u64::try_from(value)
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::NegativeDuration { field, value })
}

// With no edge and no ceiling nothing could ever invoke the target.
fn check_edges(options: &DebounceOptions) -> Result<(), ConfigError> {
    if !options.leading && !options.trailing && options.max_wait.is_none() {
        return Err(ConfigError::NoEdge);
    }
    Ok(())
}

struct State<A> {
    timer: Option<TimerId>,
    last_args: Option<A>,
    last_call: Option<Instant>,
    last_invoke: Option<Instant>,
}

struct Shared<A: 'static, R: 'static> {
    target: Target<A, R>,
    delay: Duration,
    options: DebounceOptions,
    // options.max_wait raised to at least `delay`
    max_wait: Option<Duration>,
    host: Rc<dyn TimerHost>,
    state: RefCell<State<A>>,
}

impl<A: 'static, R: 'static> Shared<A, R> {
    fn should_invoke(&self, st: &State<A>, now: Instant) -> bool {
        let Some(last_call) = st.last_call else {
            return true;
        };
        let since_call = now.saturating_duration_since(last_call);
        since_call >= self.delay
            || self
                .max_wait
                .is_some_and(|max_wait| self.since_invoke(st, now) >= max_wait)
    }

    fn since_invoke(&self, st: &State<A>, now: Instant) -> Duration {
        st.last_invoke
            .map_or(Duration::MAX, |t| now.saturating_duration_since(t))
    }

    fn remaining_wait(&self, st: &State<A>, now: Instant) -> Duration {
        let since_call = st
            .last_call
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        let waiting = self.delay.saturating_sub(since_call);
        match self.max_wait {
            Some(max_wait) => waiting.min(max_wait.saturating_sub(self.since_invoke(st, now))),
            None => waiting,
        }
    }

    fn arm(self: &Rc<Self>, wait: Duration) {
        let weak = Rc::downgrade(self);
        let id = self.host.schedule(
            wait,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.timer_expired();
                }
            }),
        );
        self.state.borrow_mut().timer = Some(id);
    }

    fn disarm(&self) {
        let timer = self.state.borrow_mut().timer.take();
        if let Some(id) = timer {
            self.host.cancel(id);
        }
    }

    /// Runs the target with the buffered arguments. The state borrow is
    /// released first so the target may call back into this debouncer.
    fn invoke_target(&self, now: Instant) -> Option<R> {
        let args = {
            let mut st = self.state.borrow_mut();
            let args = st.last_args.take()?;
            st.last_invoke = Some(now);
            args
        };
        log::trace!("debounce: invoking target");
        Some((self.target)(args))
    }

    fn leading_edge(self: &Rc<Self>, now: Instant) -> Option<R> {
        self.state.borrow_mut().last_invoke = Some(now);
        self.arm(self.delay);
        if self.options.leading {
            self.invoke_target(now)
        } else {
            None
        }
    }

    fn trailing_edge(&self, now: Instant) -> Option<R> {
        self.state.borrow_mut().timer = None;
        if self.options.trailing && self.state.borrow().last_args.is_some() {
            return self.invoke_target(now);
        }
        self.state.borrow_mut().last_args = None;
        None
    }

    fn timer_expired(self: &Rc<Self>) {
        let now = self.host.now();
        let rearm = {
            let mut st = self.state.borrow_mut();
            st.timer = None;
            if self.should_invoke(&st, now) {
                None
            } else {
                Some(self.remaining_wait(&st, now))
            }
        };
        match rearm {
            Some(wait) => {
                log::trace!("debounce: still busy, re-arming for {wait:?}");
                self.arm(wait);
            }
            None => {
                // A trailing result has no caller to go to.
                let _ = self.trailing_edge(now);
            }
        }
    }

    fn call(self: &Rc<Self>, args: A) -> Option<R> {
        let now = self.host.now();
        let (invoking, armed) = {
            let mut st = self.state.borrow_mut();
            let invoking = self.should_invoke(&st, now);
            st.last_args = Some(args);
            st.last_call = Some(now);
            (invoking, st.timer.is_some())
        };

        if invoking {
            if !armed {
                return self.leading_edge(now);
            }
            if self.max_wait.is_some() {
                // The ceiling was hit mid-burst: run now and restart the window.
                log::debug!("debounce: max wait reached, invoking mid-burst");
                self.disarm();
                self.arm(self.delay);
                return self.invoke_target(now);
            }
        }
        if !armed {
            self.arm(self.delay);
        }
        None
    }

    fn cancel(&self) {
        self.disarm();
        let mut st = self.state.borrow_mut();
        st.last_args = None;
        st.last_call = None;
        st.last_invoke = None;
    }

    fn flush(&self) -> Option<R> {
        if self.state.borrow().timer.is_none() {
            return None;
        }
        self.disarm();
        // Nothing stays pending, so the next call opens a new burst.
        self.state.borrow_mut().last_call = None;
        self.trailing_edge(self.host.now())
    }
}

impl<A: 'static, R: 'static> Drop for Shared<A, R> {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().timer.take() {
            self.host.cancel(id);
        }
    }
}

/// One debounced target on one timer host.
///
/// Clones share the same pending state. Dropping the last clone cancels any
/// pending invocation.
pub struct Debouncer<A: 'static, R: 'static> {
    shared: Rc<Shared<A, R>>,
}

impl<A: 'static, R: 'static> Clone for Debouncer<A, R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<A: 'static, R: 'static> Debouncer<A, R> {
    pub fn new(
        host: Rc<dyn TimerHost>,
        target: Target<A, R>,
        delay: Duration,
        options: DebounceOptions,
    ) -> Result<Self, ConfigError> {
        check_edges(&options)?;
        let max_wait = options.max_wait.map(|max_wait| max_wait.max(delay));
        Ok(Self {
            shared: Rc::new(Shared {
                target,
                delay,
                options,
                max_wait,
                host,
                state: RefCell::new(State {
                    timer: None,
                    last_args: None,
                    last_call: None,
                    last_invoke: None,
                }),
            }),
        })
    }

    /// Records `args` as the latest call. Returns the target's result only if
    /// it ran during this call (leading edge or max-wait ceiling).
    pub fn call(&self, args: A) -> Option<R> {
        self.shared.call(args)
    }

    /// Drops the pending invocation, if any. Idempotent.
    pub fn cancel(&self) {
        self.shared.cancel()
    }

    /// Runs the pending invocation now.
    pub fn flush(&self) -> Option<R> {
        self.shared.flush()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.borrow().timer.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    pub fn options(&self) -> DebounceOptions {
        self.shared.options
    }

    fn matches(&self, target: &Target<A, R>, delay: Duration, options: &DebounceOptions) -> bool {
        Rc::ptr_eq(&self.shared.target, target)
            && self.shared.delay == delay
            && self.shared.options == *options
    }
}

impl<A: 'static, R: 'static> fmt::Debug for Debouncer<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.shared.delay)
            .field("options", &self.shared.options)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Stable call surface over a replaceable [`Debouncer`].
///
/// Exactly one debouncer is installed at a time and every operation goes to
/// it. [`reconfigure`](Self::reconfigure) swaps in a new one synchronously;
/// the old one is retired with its pending call (if any) left to fire on its
/// original schedule. [`teardown`](Self::teardown) cancels the installed
/// debouncer and everything still retired, after which the invoker is inert:
/// `invoke` is a no-op returning `None`.
pub struct DebouncedInvoker<A: 'static, R: 'static> {
    host: Rc<dyn TimerHost>,
    current: RefCell<Debouncer<A, R>>,
    retired: RefCell<Vec<Debouncer<A, R>>>,
    torn_down: Cell<bool>,
}

impl<A: 'static, R: 'static> DebouncedInvoker<A, R> {
    /// Builds on the current timer host.
    pub fn new(
        target: impl Fn(A) -> R + 'static,
        delay: Duration,
        options: DebounceOptions,
    ) -> Result<Self, ConfigError> {
        Self::with_host(current_timers(), Rc::new(target), delay, options)
    }

    pub fn with_host(
        host: Rc<dyn TimerHost>,
        target: Target<A, R>,
        delay: Duration,
        options: DebounceOptions,
    ) -> Result<Self, ConfigError> {
        let current = Debouncer::new(host.clone(), target, delay, options)?;
        Ok(Self {
            host,
            current: RefCell::new(current),
            retired: RefCell::new(Vec::new()),
            torn_down: Cell::new(false),
        })
    }

    // Cloned out so no borrow is held while the target runs.
    fn installed(&self) -> Debouncer<A, R> {
        self.current.borrow().clone()
    }

    pub fn invoke(&self, args: A) -> Option<R> {
        if self.torn_down.get() {
            log::debug!("debounce: invoke after teardown ignored");
            return None;
        }
        self.installed().call(args)
    }

    /// Cancels the installed debouncer's pending call. Calls left pending by
    /// debouncers retired in [`reconfigure`](Self::reconfigure) still fire on
    /// their original schedule; only [`teardown`](Self::teardown) cancels
    /// those.
    pub fn cancel(&self) {
        self.installed().cancel()
    }

    pub fn flush(&self) -> Option<R> {
        self.installed().flush()
    }

    pub fn is_pending(&self) -> bool {
        self.current.borrow().is_pending()
    }

    pub fn delay(&self) -> Duration {
        self.current.borrow().delay()
    }

    pub fn options(&self) -> DebounceOptions {
        self.current.borrow().options()
    }

    /// Installs a fresh debouncer if `target` (by identity), `delay` or
    /// `options` differ from the installed one. Returns whether it did.
    pub fn reconfigure(
        &self,
        target: Target<A, R>,
        delay: Duration,
        options: DebounceOptions,
    ) -> Result<bool, ConfigError> {
        if self.torn_down.get() {
            return Ok(false);
        }
        if self.current.borrow().matches(&target, delay, &options) {
            return Ok(false);
        }

        let next = Debouncer::new(self.host.clone(), target, delay, options)?;
        let prev = self.current.replace(next);
        log::debug!(
            "debounce: reconfigured {:?} -> {:?}/{:?}",
            prev.delay(),
            delay,
            options
        );

        let mut retired = self.retired.borrow_mut();
        retired.retain(Debouncer::is_pending);
        if prev.is_pending() {
            retired.push(prev);
        }
        Ok(true)
    }

    /// Cancels everything this invoker ever scheduled. Runs once; later calls
    /// do nothing.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        self.installed().cancel();
        let retired = std::mem::take(&mut *self.retired.borrow_mut());
        for debouncer in retired {
            debouncer.cancel();
        }
        log::trace!("debounce: torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }
}

/// Debounces `target` for the lifetime of the calling composition.
///
/// The same invoker comes back on every pass; it is reconfigured in place
/// whenever `target`, `delay` or `options` change and torn down with the
/// composition's scope. Pass the same `Rc` for `target` across passes
/// (e.g. from `remember`) or every pass counts as a change.
pub fn use_debounce_callback<A: 'static, R: 'static>(
    target: Target<A, R>,
    delay: Duration,
    options: DebounceOptions,
) -> Result<Rc<DebouncedInvoker<A, R>>, ConfigError> {
    let slot = remember(|| RefCell::new(None::<Rc<DebouncedInvoker<A, R>>>));

    let existing = slot.borrow().clone();
    if let Some(invoker) = existing {
        invoker.reconfigure(target, delay, options)?;
        return Ok(invoker);
    }

    let invoker = Rc::new(DebouncedInvoker::with_host(
        current_timers(),
        target,
        delay,
        options,
    )?);
    *slot.borrow_mut() = Some(invoker.clone());

    let owned = invoker.clone();
    scoped_effect(move || on_unmount(move || owned.teardown()));
    Ok(invoker)
}
