use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Callback invoked with the new value every time a [`Signal`] is set.
pub type Listener<T> = Rc<dyn Fn(&T)>;

type ListenerList<T> = Rc<RefCell<Vec<Listener<T>>>>;

// ── Signal ────────────────────────────────────────────────────────────────────

/// Observable value cell.
///
/// `set` always stores the value and then synchronously calls every listener
/// in registration order, even when the new value equals the old one.
///
/// Notification walks a snapshot of the listener list, so listeners added or
/// removed from inside a callback only take part in the *next* `set`.
///
/// # Reentrancy
/// A listener must not call `set` on the signal that is currently notifying
/// it. Doing so starts a nested notification pass before the outer one has
/// finished, and listeners will observe values out of order.
pub struct Signal<T> {
    value: RefCell<T>,
    listeners: ListenerList<T>,
}

impl<T: Clone> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Current value. No side effects.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Store `value` and notify every listener with it.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value.clone();
        self.notify(&value);
    }
}

impl<T> Signal<T> {
    /// Register `listener`. Adding the same `Rc` twice is a no-op.
    pub fn add_listener(&self, listener: &Listener<T>) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|l| Rc::ptr_eq(l, listener)) {
            listeners.push(Rc::clone(listener));
        }
    }

    /// Unregister `listener`. Removing one that is not registered is a no-op.
    pub fn remove_listener(&self, listener: &Listener<T>) {
        self.listeners.borrow_mut().retain(|l| !Rc::ptr_eq(l, listener));
    }

    /// Register a closure and return a handle that can remove it again.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription<T> {
        let listener: Listener<T> = Rc::new(f);
        self.add_listener(&listener);
        Subscription {
            listener,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self, value: &T) {
        // Snapshot so callbacks may (un)subscribe without a RefCell conflict.
        let snapshot: Vec<Listener<T>> = self.listeners.borrow().clone();
        for listener in &snapshot {
            listener(value);
        }
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

// ── Subscription ──────────────────────────────────────────────────────────────

/// Handle returned by [`Signal::subscribe`].
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription<T> {
    listener: Listener<T>,
    listeners: Weak<RefCell<Vec<Listener<T>>>>,
}

impl<T> Subscription<T> {
    /// Remove the listener from its signal. Harmless if the signal is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|l| !Rc::ptr_eq(l, &self.listener));
        }
    }

    /// The registered callback, usable with [`Signal::remove_listener`].
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
