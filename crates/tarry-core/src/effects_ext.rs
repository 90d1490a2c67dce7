use crate::runtime::{EffectTiming, current_composition, enqueue_effect};
use crate::{Dispose, on_unmount, remember, scoped_effect};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Per-callsite state of a keyed effect.
struct EffectSlot<K> {
    last_key: RefCell<Option<K>>,
    cleanup: RefCell<Option<Dispose>>,
    installed: Cell<bool>,
    unmounted: Cell<bool>,
}

impl<K: PartialEq + 'static> EffectSlot<K> {
    fn new() -> Self {
        Self {
            last_key: RefCell::new(None),
            cleanup: RefCell::new(None),
            installed: Cell::new(false),
            unmounted: Cell::new(false),
        }
    }

    // Install a single unmount disposer for this callsite.
    fn install(self: &Rc<Self>) {
        if self.installed.replace(true) {
            return;
        }
        let slot = self.clone();
        scoped_effect(move || {
            on_unmount(move || {
                slot.unmounted.set(true);
                slot.run_cleanup();
            })
        });
    }

    /// Records `key`; true if it differs from the previous pass.
    fn swap_key(&self, key: K) -> bool {
        let mut last = self.last_key.borrow_mut();
        if last.as_ref() == Some(&key) {
            return false;
        }
        *last = Some(key);
        true
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(d) = cleanup {
            d.run();
        }
    }

    fn rerun(&self, effect: impl FnOnce() -> Dispose) {
        if self.unmounted.get() {
            return;
        }
        self.run_cleanup();
        let d = effect();
        *self.cleanup.borrow_mut() = Some(d);
    }
}

/// cleanup on key change or unmount
pub fn disposable_effect<K: PartialEq + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    // Slot-based (like Compose). For branch-stability use `remember_with_key` variants later.
    let slot = remember(EffectSlot::<K>::new);
    slot.install();

    if slot.swap_key(key) {
        slot.rerun(effect);
    }
}

/// Like [`disposable_effect`], but the effect waits for the composition pass
/// to reach `timing` instead of running inline.
pub fn queued_effect<K: PartialEq + 'static>(
    timing: EffectTiming,
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    let slot = remember(EffectSlot::<K>::new);
    slot.install();

    if slot.swap_key(key) {
        enqueue_effect(timing, move || slot.rerun(effect));
    }
}

/// Runs after the build pass, before commit.
pub fn layout_effect<K: PartialEq + 'static>(key: K, effect: impl FnOnce() -> Dispose + 'static) {
    queued_effect(EffectTiming::Layout, key, effect)
}

/// Runs after commit.
pub fn deferred_effect<K: PartialEq + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    queued_effect(EffectTiming::Deferred, key, effect)
}

/// Layout timing on hosts that paint, deferred timing everywhere else.
pub fn isomorphic_timing() -> EffectTiming {
    match current_composition() {
        Some(c) if c.is_interactive() => EffectTiming::Layout,
        _ => EffectTiming::Deferred,
    }
}

pub fn isomorphic_layout_effect<K: PartialEq + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    queued_effect(isomorphic_timing(), key, effect)
}
