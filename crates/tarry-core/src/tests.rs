#[cfg(test)]
mod tests {
    use crate::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use web_time::{Duration, Instant};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn log_into(log: &Rc<RefCell<Vec<String>>>, entry: &str) -> impl FnOnce() + 'static {
        let log = log.clone();
        let entry = entry.to_string();
        move || log.borrow_mut().push(entry)
    }

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn test_signal_subscriber_can_read_and_unsubscribe() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let id = {
            let seen = seen.clone();
            let sig2 = sig.clone();
            sig.subscribe(move |v| seen.borrow_mut().push((*v, sig2.get())))
        };

        sig.set(7);
        sig.unsubscribe(id);
        sig.set(8);
        assert_eq!(*seen.borrow(), vec![(7, 7)]);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(Cell::new(0));

        let scope = Scope::new();
        let c = cleaned_up.clone();
        scope.add_disposer(move || c.set(c.get() + 1));

        assert_eq!(cleaned_up.get(), 0);
        scope.clone().dispose();
        assert_eq!(cleaned_up.get(), 1);

        // Second dispose and the final drop do nothing.
        scope.clone().dispose();
        drop(scope);
        assert_eq!(cleaned_up.get(), 1);
    }

    #[test]
    fn test_scope_drop_runs_disposers() {
        let cleaned_up = Rc::new(Cell::new(false));
        {
            let scope = Scope::new();
            let c = cleaned_up.clone();
            scope.add_disposer(move || c.set(true));
        }
        assert!(cleaned_up.get());
    }

    #[test]
    fn test_scope_children_dispose_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let parent = Scope::new();
        parent.add_disposer(log_into(&log, "parent"));
        let child = parent.child();
        child.add_disposer(log_into(&log, "child"));

        parent.dispose();
        assert_eq!(*log.borrow(), vec!["child", "parent"]);
        assert!(child.is_disposed());
    }

    #[test]
    fn test_disposer_added_after_dispose_runs_now() {
        let scope = Scope::new();
        scope.clone().dispose();

        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        scope.add_disposer(move || r.set(true));
        assert!(ran.get());
    }

    #[test]
    fn test_key_based_remember() {
        COMPOSER.with(|c| c.borrow_mut().keyed_slots.clear());

        let val1 = remember_with_key("test", || 42);
        let val2 = remember_with_key("test", || 100);

        // Should return the same instance
        assert_eq!(*val1, 42);
        assert_eq!(*val2, 42); // Not 100, because key exists
    }

    #[test]
    fn test_remember_is_per_composition() {
        let timers: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let a = Composition::headless(timers.clone());
        let b = Composition::headless(timers);

        let first = a.compose(|| remember(|| Cell::new(1)));
        first.set(5);
        let again = a.compose(|| remember(|| Cell::new(1)));
        let other = b.compose(|| remember(|| Cell::new(1)));

        assert_eq!(again.get(), 5);
        assert_eq!(other.get(), 1);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let timers = ManualTimers::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        timers.schedule(ms(30), Box::new(log_into(&log, "c")));
        timers.schedule(ms(10), Box::new(log_into(&log, "a")));
        timers.schedule(ms(10), Box::new(log_into(&log, "b")));

        assert_eq!(timers.advance(ms(5)), 0);
        assert_eq!(timers.advance(ms(25)), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_task_observes_its_own_deadline() {
        let timers = Rc::new(ManualTimers::new());
        let start = timers.now();
        let seen = Rc::new(Cell::new(None));

        let (t, s) = (timers.clone(), seen.clone());
        timers.schedule(ms(40), Box::new(move || s.set(Some(t.now()))));
        timers.advance(ms(100));

        assert_eq!(seen.get(), Some(start + ms(40)));
        assert_eq!(timers.now(), start + ms(100));
    }

    #[test]
    fn test_cancel_prevents_run() {
        let timers = ManualTimers::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let id = timers.schedule(ms(10), Box::new(move || f.set(true)));

        assert!(timers.is_scheduled(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        timers.advance(ms(50));
        assert!(!fired.get());
    }

    #[test]
    fn test_tasks_may_reschedule_from_inside() {
        let timers = Rc::new(ManualTimers::new());
        let count = Rc::new(Cell::new(0));

        fn tick(timers: Rc<ManualTimers>, count: Rc<Cell<u32>>) {
            count.set(count.get() + 1);
            if count.get() < 3 {
                let t = timers.clone();
                timers.schedule(
                    Duration::from_millis(10),
                    Box::new(move || tick(t, count)),
                );
            }
        }

        let (t, c) = (timers.clone(), count.clone());
        timers.schedule(ms(10), Box::new(move || tick(t, c)));
        timers.advance(ms(100));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_timer_queue_over_manual_clock() {
        let clock = Rc::new(ManualClock::new(Instant::now()));
        let queue = TimerQueue::new(clock.clone());
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        queue.schedule(ms(20), Box::new(move || f.set(f.get() + 1)));

        assert_eq!(queue.run_due(), 0);
        clock.advance(ms(20));
        assert_eq!(queue.run_due(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_with_timers_restores_previous_host() {
        let manual: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let inside = with_timers(manual.clone(), || Rc::ptr_eq(&current_timers(), &manual));
        assert!(inside);
        assert!(!Rc::ptr_eq(&current_timers(), &manual));
    }

    #[test]
    fn test_disposable_effect_reruns_on_key_change() {
        let timers: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let composition = Composition::headless(timers);
        let log = Rc::new(RefCell::new(Vec::new()));

        let pass = |key: u32| {
            let log = log.clone();
            composition.compose(move || {
                let l = log.clone();
                disposable_effect(key, move || {
                    l.borrow_mut().push(format!("run {key}"));
                    on_unmount(log_into(&l, &format!("clean {key}")))
                });
            });
        };

        pass(1);
        pass(1);
        pass(2);
        composition.dispose();

        assert_eq!(*log.borrow(), vec!["run 1", "clean 1", "run 2", "clean 2"]);
    }

    #[test]
    fn test_layout_effects_run_before_commit_and_deferred_after() {
        let timers: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let composition = Composition::new(timers);
        let log = Rc::new(RefCell::new(Vec::new()));
        composition.set_on_commit(log_into_repeat(&log, "commit"));

        let l = log.clone();
        composition.compose(move || {
            let (a, b) = (l.clone(), l.clone());
            deferred_effect((), move || {
                a.borrow_mut().push("deferred".into());
                Dispose::noop()
            });
            layout_effect((), move || {
                b.borrow_mut().push("layout".into());
                Dispose::noop()
            });
            l.borrow_mut().push("build".into());
        });

        assert_eq!(*log.borrow(), vec!["build", "layout", "commit", "deferred"]);
        assert_eq!(composition.passes(), 1);
    }

    fn log_into_repeat(log: &Rc<RefCell<Vec<String>>>, entry: &str) -> impl FnMut() + 'static {
        let log = log.clone();
        let entry = entry.to_string();
        move || log.borrow_mut().push(entry.clone())
    }

    #[test]
    fn test_isomorphic_timing_follows_host() {
        let timers: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let painted = Composition::new(timers.clone());
        let headless = Composition::headless(timers);

        assert_eq!(painted.compose(isomorphic_timing), EffectTiming::Layout);
        assert_eq!(headless.compose(isomorphic_timing), EffectTiming::Deferred);
        assert_eq!(isomorphic_timing(), EffectTiming::Deferred);
    }

    #[test]
    fn test_composition_installs_its_timers() {
        let timers: Rc<dyn TimerHost> = Rc::new(ManualTimers::new());
        let composition = Composition::headless(timers.clone());
        let same = composition.compose(|| Rc::ptr_eq(&current_timers(), &timers));
        assert!(same);
    }

    #[test]
    fn test_pointer_listener_removed_mid_dispatch_is_skipped() {
        let listeners = Rc::new(PointerListeners::default());
        let hits = Rc::new(RefCell::new(Vec::new()));
        let second: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let (l, h, s) = (listeners.clone(), hits.clone(), second.clone());
        listeners.add(move |_| {
            h.borrow_mut().push("first");
            if let Some(id) = s.get() {
                l.remove(id);
            }
        });
        let h = hits.clone();
        second.set(Some(listeners.add(move |_| h.borrow_mut().push("second"))));

        let ev = PointerEvent::mouse(
            PointerEventKind::Down(PointerButton::Primary),
            Vec2::new(1.0, 1.0),
        );
        assert_eq!(listeners.dispatch(&ev), 1);
        assert_eq!(*hits.borrow(), vec!["first"]);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(rect.contains(Vec2 { x: 110.0, y: 60.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
        assert_eq!(
            rect.size(),
            Size {
                width: 100.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn test_effect_cleanup_follows_scope() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scope = Scope::new();

        let d = scope.run(|| {
            let l = log.clone();
            effect(move || {
                l.borrow_mut().push("run".to_string());
                on_unmount(log_into(&l, "cleanup"))
            })
        });
        assert!(!d.is_spent());

        scope.clone().dispose();
        assert!(d.is_spent());
        d.run();
        assert_eq!(*log.borrow(), vec!["run", "cleanup"]);
    }

    #[test]
    fn test_spring_settles_on_target() {
        let t0 = Instant::now();
        let mut v = SpringValue::new(0.0, Spring::new(300.0, 30.0));
        v.set_target(120.0, t0);
        assert!(v.is_animating());
        assert!(v.spring().damping_ratio() < 1.0);

        assert!(v.update(t0 + ms(50)));
        let early = v.get();
        assert!(early > 0.0 && early < 120.0);

        let mut t = t0 + ms(50);
        while v.update(t) {
            t += ms(16);
            assert!(t < t0 + Duration::from_secs(5), "spring never settled");
        }
        assert_eq!(v.get(), 120.0);
        assert_eq!(v.velocity(), 0.0);
    }

    #[test]
    fn test_spring_at_rest_ignores_same_target() {
        let t0 = Instant::now();
        let mut v = SpringValue::new(4.0, Spring::default());
        v.set_target(4.0, t0);
        assert!(!v.is_animating());
        assert!(!v.update(t0 + ms(100)));
    }
}
