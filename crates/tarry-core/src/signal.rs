use std::cell::RefCell;
use std::rc::Rc;

pub type SubId = usize;

/// Observable value. Clones share the same value and subscribers.
pub struct Signal<T: 'static>(Rc<Inner<T>>);

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T> {
    value: RefCell<T>,
    subs: RefCell<Vec<Option<Rc<dyn Fn(&T)>>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Inner {
            value: RefCell::new(value),
            subs: RefCell::new(Vec::new()),
        }))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    pub fn set(&self, v: T) {
        *self.0.value.borrow_mut() = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.0.value.borrow_mut());
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let mut subs = self.0.subs.borrow_mut();
        subs.push(Some(Rc::new(f)));
        subs.len() - 1
    }

    pub fn unsubscribe(&self, id: SubId) {
        if let Some(slot) = self.0.subs.borrow_mut().get_mut(id) {
            *slot = None;
        }
    }

    // Subscribers may read the signal (or subscribe) while being notified.
    fn notify(&self) {
        let subs: Vec<Rc<dyn Fn(&T)>> = self.0.subs.borrow().iter().flatten().cloned().collect();
        let value = self.0.value.borrow();
        for s in subs {
            s(&value);
        }
    }
}

pub fn signal<T: 'static>(t: T) -> Signal<T> {
    Signal::new(t)
}
