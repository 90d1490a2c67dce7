use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use tarry_core::{
    Dispose, PointerEvent, PointerEventKind, PointerKind, Rect, current_composition,
    deferred_effect, on_unmount,
};

use crate::SameRc;

bitflags! {
    /// Pointer events that count as a click.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClickTriggers: u8 {
        const MOUSE_DOWN = 1;
        const MOUSE_UP = 1 << 1;
        const TOUCH_START = 1 << 2;
    }
}

impl ClickTriggers {
    /// Pens count as mice.
    pub fn matches(&self, event: &PointerEvent) -> bool {
        match (event.kind, event.event) {
            (PointerKind::Touch, PointerEventKind::Down(_)) => self.contains(Self::TOUCH_START),
            (PointerKind::Mouse | PointerKind::Pen, PointerEventKind::Down(_)) => {
                self.contains(Self::MOUSE_DOWN)
            }
            (PointerKind::Mouse | PointerKind::Pen, PointerEventKind::Up(_)) => {
                self.contains(Self::MOUSE_UP)
            }
            _ => false,
        }
    }
}

/// Which mouse transition counts as the click. Touch starts always count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MouseTrigger {
    #[default]
    MouseDown,
    MouseUp,
}

impl MouseTrigger {
    pub fn triggers(self) -> ClickTriggers {
        let mouse = match self {
            MouseTrigger::MouseDown => ClickTriggers::MOUSE_DOWN,
            MouseTrigger::MouseUp => ClickTriggers::MOUSE_UP,
        };
        mouse | ClickTriggers::TOUCH_START
    }
}

/// Where an element currently sits on screen. Layout fills it in; `None`
/// while the element is not laid out.
pub type RegionRef = Rc<Cell<Option<Rect>>>;

pub fn region_ref() -> RegionRef {
    Rc::new(Cell::new(None))
}

pub type OutsideHandler = Rc<dyn Fn(&PointerEvent)>;

/// Calls `handler` for clicks that land outside `region`.
pub struct ClickOutside {
    region: RegionRef,
    handler: OutsideHandler,
    triggers: ClickTriggers,
}

impl ClickOutside {
    pub fn new(region: RegionRef, handler: OutsideHandler, triggers: ClickTriggers) -> Self {
        Self {
            region,
            handler,
            triggers,
        }
    }

    /// Returns whether the handler ran. Clicks are ignored while the region
    /// is unset.
    pub fn handle(&self, event: &PointerEvent) -> bool {
        if !self.triggers.matches(event) {
            return false;
        }
        match self.region.get() {
            Some(rect) if !rect.contains(event.position) => {
                (self.handler)(event);
                true
            }
            _ => false,
        }
    }
}

/// Listens for clicks outside `region` on the composition's pointer stream.
///
/// The listener is replaced whenever `region`, `handler` (by identity) or
/// `trigger` change, and removed on unmount.
pub fn use_click_outside(region: RegionRef, handler: OutsideHandler, trigger: MouseTrigger) {
    let key = (SameRc(region.clone()), SameRc(handler.clone()), trigger);
    deferred_effect(key, move || {
        let Some(composition) = current_composition() else {
            log::warn!("use_click_outside outside of a composition; no pointer events will arrive");
            return Dispose::noop();
        };

        let detector = ClickOutside::new(region, handler, trigger.triggers());
        let id = composition.pointer().add(move |event| {
            detector.handle(event);
        });
        let composition = composition.downgrade();
        on_unmount(move || {
            if let Some(composition) = composition.upgrade() {
                composition.pointer().remove(id);
            }
        })
    });
}
