use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tarry_core::{Signal, Spring, SpringValue, TimerHost, current_timers, remember, signal};

/// Panel spring: quick, with a barely visible overshoot.
pub const PANEL_SPRING: Spring = Spring {
    stiffness: 300.0,
    damping: 30.0,
    mass: 1.0,
    rest_delta: 0.01,
    rest_speed: 0.01,
};

/// Open/closed state of a collapsible panel plus its animated height.
///
/// The height chases `content_height` while expanded and `0.0` while
/// collapsed. Call [`tick`](Self::tick) once per frame.
pub struct Expandable {
    expanded: Signal<bool>,
    content_height: Cell<f32>,
    height: RefCell<SpringValue>,
    host: Rc<dyn TimerHost>,
}

impl Expandable {
    pub fn new(initially_expanded: bool, host: Rc<dyn TimerHost>) -> Self {
        Self {
            expanded: signal(initially_expanded),
            content_height: Cell::new(0.0),
            height: RefCell::new(SpringValue::new(0.0, PANEL_SPRING)),
            host,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded.get()
    }

    /// Observable expanded flag.
    pub fn expanded(&self) -> Signal<bool> {
        self.expanded.clone()
    }

    pub fn toggle(&self) {
        self.set_expanded(!self.is_expanded());
    }

    pub fn set_expanded(&self, expanded: bool) {
        if self.is_expanded() != expanded {
            self.expanded.set(expanded);
        }
        self.retarget();
    }

    /// Feeds in the measured height of the panel's content.
    pub fn set_content_height(&self, height: f32) {
        self.content_height.set(height.max(0.0));
        self.retarget();
    }

    fn retarget(&self) {
        let target = if self.is_expanded() {
            self.content_height.get()
        } else {
            0.0
        };
        self.height.borrow_mut().set_target(target, self.host.now());
    }

    /// Advances the animation to the host's current time. Returns `true`
    /// while the height is still moving.
    pub fn tick(&self) -> bool {
        self.height.borrow_mut().update(self.host.now())
    }

    /// Current animated height.
    pub fn height(&self) -> f32 {
        self.height.borrow().get()
    }

    pub fn target_height(&self) -> f32 {
        self.height.borrow().target()
    }

    pub fn is_animating(&self) -> bool {
        self.height.borrow().is_animating()
    }
}

/// Remembers an [`Expandable`] for the calling composition.
pub fn use_expandable(initially_expanded: bool) -> Rc<Expandable> {
    remember(|| Expandable::new(initially_expanded, current_timers()))
}
