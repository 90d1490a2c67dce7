//! Hooks for Tarry compositions.
//!
//! - [`use_debounce_callback`]: defer a callback until calls settle, with
//!   leading/trailing edges, a max-wait ceiling, `cancel`, `flush` and
//!   `is_pending`.
//! - [`use_timeout`]: run a callback once after a delay.
//! - [`use_click_outside`]: react to clicks that land outside a region.
//! - [`use_expandable`]: open/closed state with a spring-animated height.
//! - [`use_file_input`]: validate picked files by size and type.
//!
//! Each hook is also available as a plain type ([`DebouncedInvoker`],
//! [`Timeout`], [`ClickOutside`], [`Expandable`], [`FileInput`]) for use
//! outside a composition.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tarry_core::{Composition, ManualTimers};
//! use tarry_hooks::*;
//! use web_time::Duration;
//!
//! let timers = Rc::new(ManualTimers::new());
//! let composition = Composition::headless(timers.clone());
//! let saved = Rc::new(RefCell::new(Vec::new()));
//!
//! let target: Target<String, ()> = {
//!     let saved = saved.clone();
//!     Rc::new(move |text: String| saved.borrow_mut().push(text))
//! };
//! let search = composition
//!     .compose(|| use_debounce_callback(target, Duration::from_millis(300), DebounceOptions::default()))
//!     .unwrap();
//!
//! search.invoke("r".into());
//! search.invoke("ru".into());
//! search.invoke("rust".into());
//! timers.advance(Duration::from_millis(300));
//! assert_eq!(*saved.borrow(), vec!["rust".to_string()]);
//! ```

use std::rc::Rc;

pub mod debounce;
pub mod expandable;
pub mod file_input;
pub mod outside_click;
pub mod timeout;

pub use debounce::*;
pub use expandable::*;
pub use file_input::*;
pub use outside_click::*;
pub use timeout::*;

/// Effect key comparing an `Rc` by identity.
pub(crate) struct SameRc<T: ?Sized>(pub(crate) Rc<T>);

impl<T: ?Sized> PartialEq for SameRc<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
