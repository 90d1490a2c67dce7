use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,   // Left mouse, touch
    Secondary, // Right mouse
    Tertiary,  // Middle mouse
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down(PointerButton),
    Up(PointerButton),
    Move,
    Cancel,
}

#[derive(Clone, Debug)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub event: PointerEventKind,
    pub position: Vec2,
    pub pressure: f32,
}

impl PointerEvent {
    pub fn mouse(event: PointerEventKind, position: Vec2) -> Self {
        Self {
            id: PointerId(0),
            kind: PointerKind::Mouse,
            event,
            position,
            pressure: 1.0,
        }
    }

    pub fn touch(id: u64, event: PointerEventKind, position: Vec2) -> Self {
        Self {
            id: PointerId(id),
            kind: PointerKind::Touch,
            event,
            position,
            pressure: 1.0,
        }
    }
}

new_key_type! {
    pub struct ListenerId;
}

type Listener = Rc<dyn Fn(&PointerEvent)>;

/// Document-level pointer listeners. The host feeds every pointer event in
/// through [`PointerListeners::dispatch`].
#[derive(Default)]
pub struct PointerListeners {
    listeners: RefCell<SlotMap<ListenerId, Listener>>,
}

impl PointerListeners {
    pub fn add(&self, listener: impl Fn(&PointerEvent) + 'static) -> ListenerId {
        self.listeners.borrow_mut().insert(Rc::new(listener))
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.borrow_mut().remove(id);
        removed.is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every registered listener. One removed by an earlier listener
    /// during the same dispatch is skipped.
    pub fn dispatch(&self, event: &PointerEvent) -> usize {
        let snapshot: SmallVec<[(ListenerId, Listener); 8]> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, l)| (id, l.clone()))
            .collect();

        let mut reached = 0;
        for (id, listener) in snapshot {
            if !self.listeners.borrow().contains_key(id) {
                continue;
            }
            listener(event);
            reached += 1;
        }
        reached
    }
}
