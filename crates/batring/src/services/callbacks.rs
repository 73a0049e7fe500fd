//! Listener registry shared by the singleton services.

use std::cell::RefCell;

/// A simple list of `Fn(&T)` listeners.
///
/// Services own one of these and invoke `notify` on the GTK main loop
/// whenever their state changes. Registering from inside a notification
/// is not supported (the listener list is borrowed during dispatch).
pub struct Callbacks<T> {
    listeners: RefCell<Vec<Box<dyn Fn(&T)>>>,
}

impl<T> Callbacks<T> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Register a listener.
    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&T) + 'static,
    {
        self.listeners.borrow_mut().push(Box::new(callback));
    }

    /// Invoke all listeners with the given value.
    pub fn notify(&self, value: &T) {
        for listener in self.listeners.borrow().iter() {
            listener(value);
        }
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn notify_reaches_all_listeners() {
        let callbacks: Callbacks<u32> = Callbacks::new();
        let seen = Rc::new(Cell::new(0u32));

        for _ in 0..3 {
            let seen = seen.clone();
            callbacks.register(move |value| seen.set(seen.get() + value));
        }

        callbacks.notify(&5);
        assert_eq!(seen.get(), 15);
    }
}
