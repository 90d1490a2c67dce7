//! # Compositions, Scopes, and Timers
//!
//! Tarry hooks are plain functions called while a [`Composition`] runs a pass.
//! They keep their state in `remember*` slots, tie their cleanup to the
//! composition's [`Scope`], and get deferred execution from a [`TimerHost`].
//!
//! ## Remembered state
//!
//! ```rust
//! use tarry_core::*;
//! use std::rc::Rc;
//!
//! let timers = Rc::new(ManualTimers::new());
//! let composition = Composition::headless(timers);
//!
//! let count = composition.compose(|| {
//!     let count = remember_state(|| 0);
//!     *count.borrow_mut() += 1;
//!     count
//! });
//! composition.compose(|| *remember_state(|| 0).borrow_mut() += 1);
//! assert_eq!(*count.borrow(), 2);
//! ```
//!
//! - `remember` and `remember_state` are order‑based: the Nth call in a pass
//!   always refers to the Nth stored value.
//! - `remember_with_key` and `remember_state_with_key` are key‑based and more
//!   stable across conditional branches.
//!
//! ## Effects and cleanup
//!
//! - `effect` runs once and registers its `Dispose` with the current scope.
//! - `scoped_effect` is wired to the current `Scope` and is cleaned up when the
//!   composition is disposed.
//! - `disposable_effect(key, ..)` re-runs whenever `key` changes, cleaning up
//!   the previous run first.
//! - `layout_effect` / `deferred_effect` do the same but wait for the pass to
//!   reach that point; `isomorphic_layout_effect` picks layout timing on hosts
//!   that paint and deferred timing on headless ones.
//!
//! ## Timers
//!
//! A host drives a [`TimerQueue`] from its event loop (`run_due`), or tests
//! drive [`ManualTimers`] in virtual time:
//!
//! ```rust
//! use tarry_core::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use web_time::Duration;
//!
//! let timers = ManualTimers::new();
//! let fired = Rc::new(Cell::new(false));
//! let f = fired.clone();
//! timers.schedule(Duration::from_millis(10), Box::new(move || f.set(true)));
//!
//! timers.advance(Duration::from_millis(9));
//! assert!(!fired.get());
//! timers.advance(Duration::from_millis(1));
//! assert!(fired.get());
//! ```

pub mod animation;
pub mod clock;
pub mod effects;
pub mod effects_ext;
pub mod error;
pub mod geometry;
pub mod input;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod tests;
pub mod timer;

pub use animation::*;
pub use clock::*;
pub use effects::*;
pub use effects_ext::*;
pub use error::*;
pub use geometry::*;
pub use input::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
pub use timer::*;
