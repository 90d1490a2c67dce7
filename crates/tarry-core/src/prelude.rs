pub use crate::animation::{Spring, SpringValue};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::effects::{Dispose, effect, on_unmount};
pub use crate::effects_ext::{
    deferred_effect, disposable_effect, isomorphic_layout_effect, layout_effect,
};
pub use crate::error::ConfigError;
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::input::{PointerButton, PointerEvent, PointerEventKind, PointerKind};
pub use crate::runtime::{
    Composition, EffectTiming, remember, remember_state, remember_state_with_key,
    remember_with_key,
};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, signal};
pub use crate::timer::{ManualTimers, TimerHost, TimerId, TimerQueue, current_timers};
