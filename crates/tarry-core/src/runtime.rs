use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::input::{PointerEvent, PointerListeners};
use crate::scope::Scope;
use crate::timer::{TimerHost, with_timers};

thread_local! {
    /// Slots used by `remember*` when no composition is running.
    pub static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
    static CURRENT_COMPOSITION: RefCell<Option<Weak<CompositionInner>>> = const { RefCell::new(None) };
}

#[derive(Default)]
pub struct Composer {
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
}

/// When a queued effect runs relative to the commit of a composition pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTiming {
    /// After the build, before commit (before anything is painted).
    Layout,
    /// After commit.
    Deferred,
}

type Queued = Box<dyn FnOnce()>;

struct CompositionInner {
    composer: RefCell<Composer>,
    scope: Scope,
    timers: Rc<dyn TimerHost>,
    pointer: PointerListeners,
    interactive: bool,
    layout_queue: RefCell<Vec<Queued>>,
    deferred_queue: RefCell<Vec<Queued>>,
    on_commit: RefCell<Option<Box<dyn FnMut()>>>,
    passes: Cell<u64>,
}

/// One tree of hooks: its slots, its root scope, and the host services
/// (timers, pointer listeners) its hooks bind to.
///
/// `compose` runs one pass. `dispose` tears every hook down.
#[derive(Clone)]
pub struct Composition {
    inner: Rc<CompositionInner>,
}

impl Composition {
    /// A composition for a host that paints frames.
    pub fn new(timers: Rc<dyn TimerHost>) -> Self {
        Self::with_host(timers, true)
    }

    /// A composition for a host that never paints (servers, tests, CLIs).
    pub fn headless(timers: Rc<dyn TimerHost>) -> Self {
        Self::with_host(timers, false)
    }

    fn with_host(timers: Rc<dyn TimerHost>, interactive: bool) -> Self {
        Self {
            inner: Rc::new(CompositionInner {
                composer: RefCell::new(Composer::default()),
                scope: Scope::new(),
                timers,
                pointer: PointerListeners::default(),
                interactive,
                layout_queue: RefCell::new(Vec::new()),
                deferred_queue: RefCell::new(Vec::new()),
                on_commit: RefCell::new(None),
                passes: Cell::new(0),
            }),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.inner.interactive
    }

    pub fn timers(&self) -> &Rc<dyn TimerHost> {
        &self.inner.timers
    }

    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    pub fn pointer(&self) -> &PointerListeners {
        &self.inner.pointer
    }

    /// Completed passes.
    pub fn passes(&self) -> u64 {
        self.inner.passes.get()
    }

    /// Called once per pass between layout and deferred effects.
    pub fn set_on_commit(&self, f: impl FnMut() + 'static) {
        *self.inner.on_commit.borrow_mut() = Some(Box::new(f));
    }

    /// Runs one pass: `build`, then queued layout effects, commit, then
    /// queued deferred effects.
    pub fn compose<R>(&self, build: impl FnOnce() -> R) -> R {
        if self.is_disposed() {
            log::warn!("compose called on a disposed composition; effects run against a dead scope");
        }
        self.inner.composer.borrow_mut().cursor = 0;

        self.enter(|| {
            let out = build();
            self.drain(EffectTiming::Layout);

            let hook = self.inner.on_commit.borrow_mut().take();
            if let Some(mut hook) = hook {
                hook();
                let mut slot = self.inner.on_commit.borrow_mut();
                if slot.is_none() {
                    *slot = Some(hook);
                }
            }
            self.inner.passes.set(self.inner.passes.get() + 1);

            self.drain(EffectTiming::Deferred);
            out
        })
    }

    /// Forwards a pointer event to every listener registered by this
    /// composition's hooks. Returns the number of listeners reached.
    pub fn dispatch_pointer(&self, event: &PointerEvent) -> usize {
        self.enter(|| self.inner.pointer.dispatch(event))
    }

    /// Tears down every hook in this composition.
    pub fn dispose(&self) {
        self.inner.layout_queue.borrow_mut().clear();
        self.inner.deferred_queue.borrow_mut().clear();
        log::debug!(
            "composition: disposing after {} pass(es)",
            self.inner.passes.get()
        );
        self.inner.scope.clone().dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.scope.is_disposed()
    }

    pub fn downgrade(&self) -> WeakComposition {
        WeakComposition {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Weak<CompositionInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_COMPOSITION.with(|c| *c.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_COMPOSITION.with(|c| c.borrow_mut().replace(Rc::downgrade(&self.inner)));
        let _restore = Restore(prev);
        with_timers(self.inner.timers.clone(), || self.inner.scope.run(f))
    }

    fn queue(&self, timing: EffectTiming) -> &RefCell<Vec<Queued>> {
        match timing {
            EffectTiming::Layout => &self.inner.layout_queue,
            EffectTiming::Deferred => &self.inner.deferred_queue,
        }
    }

    fn drain(&self, timing: EffectTiming) {
        // Effects may queue more effects of the same timing.
        loop {
            let batch = std::mem::take(&mut *self.queue(timing).borrow_mut());
            if batch.is_empty() {
                break;
            }
            for effect in batch {
                effect();
            }
        }
    }
}

/// Non-owning handle; for cleanups stored inside the composition itself.
#[derive(Clone)]
pub struct WeakComposition {
    inner: Weak<CompositionInner>,
}

impl WeakComposition {
    pub fn upgrade(&self) -> Option<Composition> {
        self.inner.upgrade().map(|inner| Composition { inner })
    }
}

pub fn current_composition() -> Option<Composition> {
    CURRENT_COMPOSITION.with(|c| {
        c.borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Composition { inner }))
    })
}

/// Queues `effect` on the running composition. Outside a composition there
/// is no pass to wait for, so it runs immediately.
pub fn enqueue_effect(timing: EffectTiming, effect: impl FnOnce() + 'static) {
    match current_composition() {
        Some(c) => {
            c.queue(timing).borrow_mut().push(Box::new(effect));
        }
        None => effect(),
    }
}

fn with_composer<R>(f: impl FnOnce(&mut Composer) -> R) -> R {
    if let Some(c) = current_composition() {
        let mut composer = c.inner.composer.borrow_mut();
        return f(&mut composer);
    }
    COMPOSER.with(|c| f(&mut c.borrow_mut()))
}

/// Slot-based remember (sequential composition only)
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    with_composer(|c| {
        let cursor = c.cursor;
        c.cursor += 1;

        if cursor >= c.slots.len() {
            let rc: Rc<T> = Rc::new(init());
            c.slots.push(Box::new(rc.clone()));
            return rc;
        }

        if let Some(rc) = c.slots[cursor].downcast_ref::<Rc<T>>() {
            rc.clone()
        } else {
            // replace (else panics)
            log::warn!(
                "remember: slot {} type changed; replacing. \
                 If this is due to conditional composition, prefer remember_with_key.",
                cursor
            );
            let rc: Rc<T> = Rc::new(init());
            c.slots[cursor] = Box::new(rc.clone());
            rc
        }
    })
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    with_composer(|c| {
        let key = key.into();

        if let Some(existing) = c.keyed_slots.get(&key) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            } else {
                log::warn!(
                    "remember_with_key: key '{}' reused with a different type; replacing.",
                    key
                );
            }
        }

        let rc: Rc<T> = Rc::new(init());
        c.keyed_slots.insert(key, Box::new(rc.clone()));
        rc
    })
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

pub fn remember_state_with_key<T: 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> Rc<RefCell<T>> {
    remember_with_key(key, || RefCell::new(init()))
}
