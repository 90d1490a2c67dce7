use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tarry_core::{
    Dispose, TimerHost, TimerId, current_timers, deferred_effect, isomorphic_layout_effect,
    on_unmount, remember,
};
use web_time::Duration;

use crate::SameRc;

/// A one-shot timer that is cleared when dropped.
pub struct Timeout {
    host: Rc<dyn TimerHost>,
    id: Cell<Option<TimerId>>,
}

impl Timeout {
    pub fn start(host: Rc<dyn TimerHost>, delay: Duration, f: impl FnOnce() + 'static) -> Self {
        let id = host.schedule(delay, Box::new(f));
        Self {
            host,
            id: Cell::new(Some(id)),
        }
    }

    /// Returns whether a still-queued callback was removed.
    pub fn clear(&self) -> bool {
        match self.id.take() {
            Some(id) => self.host.cancel(id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.id
            .get()
            .is_some_and(|id| self.host.is_scheduled(id))
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Calls `callback` once, `delay` after the composition first runs with that
/// delay. `None` disables the timer.
///
/// A new `callback` on a later pass replaces the one the timer will call
/// without restarting it. A new `delay` clears the running timer and starts
/// over. Unmounting clears it.
pub fn use_timeout(callback: Rc<dyn Fn()>, delay: Option<Duration>) {
    let saved = remember(|| RefCell::new(callback.clone()));

    {
        let saved = saved.clone();
        let latest = callback.clone();
        isomorphic_layout_effect(SameRc(callback), move || {
            *saved.borrow_mut() = latest;
            Dispose::noop()
        });
    }

    deferred_effect(delay, move || {
        let Some(delay) = delay else {
            return Dispose::noop();
        };
        log::trace!("timeout: armed for {delay:?}");
        let timeout = Timeout::start(current_timers(), delay, move || {
            let callback = saved.borrow().clone();
            callback();
        });
        on_unmount(move || {
            timeout.clear();
        })
    });
}
