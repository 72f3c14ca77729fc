// ActionTracker: Gesture Listener Registry
//
// Ordered, non-owning subscriber list.  Notification works on a snapshot, so
// a listener may add or remove listeners (itself included) from inside its
// callback; the change applies from the next pass on.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::events::GestureType;

/// Receives classified gestures.  Called synchronously from the analysis tick
/// that completed the gesture; `Unknown` is never delivered.
pub trait GestureListener {
    fn on_gesture_complete(&self, gesture: GestureType);
}

#[derive(Default)]
pub struct ListenerRegistry {
    entries: RefCell<Vec<Weak<dyn GestureListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` at the end of the notification order.  The
    /// registry keeps only a weak reference; registering twice is a no-op.
    pub fn add_listener<L: GestureListener + 'static>(&self, listener: &Rc<L>) {
        let listener: Rc<dyn GestureListener> = listener.clone();
        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| entry.strong_count() > 0);
        if entries.iter().any(|entry| same_listener(entry, &listener)) {
            return;
        }
        entries.push(Rc::downgrade(&listener));
    }

    pub fn remove_listener<L: GestureListener + 'static>(&self, listener: &Rc<L>) {
        let listener: Rc<dyn GestureListener> = listener.clone();
        self.entries
            .borrow_mut()
            .retain(|entry| entry.strong_count() > 0 && !same_listener(entry, &listener));
    }

    pub fn remove_all_listeners(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Number of listeners that are still alive.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `gesture` to every live listener in registration order.
    pub fn notify_all(&self, gesture: GestureType) {
        if !gesture.is_known() {
            return;
        }

        // Release the borrow before calling out; callbacks may re-enter.
        let snapshot: Vec<Weak<dyn GestureListener>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|entry| entry.strong_count() > 0);
            entries.clone()
        };

        for listener in snapshot.iter().filter_map(Weak::upgrade) {
            listener.on_gesture_complete(gesture);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry").field("listeners", &self.len()).finish()
    }
}

// Identity by allocation address; vtable pointers are not compared.
fn same_listener(entry: &Weak<dyn GestureListener>, listener: &Rc<dyn GestureListener>) -> bool {
    std::ptr::addr_eq(entry.as_ptr(), Rc::as_ptr(listener))
}
