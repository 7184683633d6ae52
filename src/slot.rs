//! Single-slot value handoff between a producer and a consumer thread.

use std::sync::{Arc, Condvar, Mutex};

/// A shared slot holding the latest value of type `T`.
///
/// The producer overwrites the slot wholesale with [`Latest::set`]; only the
/// most recent value matters, so there is no queue and no backpressure. The
/// consumer either waits for a fresh value ([`Latest::wait`], used for frame
/// handoff to the detector) or reads the current one without consuming it
/// ([`Latest::peek`], used by the render loop, for which a stale value is
/// acceptable).
pub struct Latest<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    value: Mutex<Option<T>>,
    condvar: Condvar,
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(None),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Stores `value`, replacing any value already in the slot.
    ///
    /// Never blocks. A consumer blocked in [`Latest::wait`] is woken up.
    pub fn set(&self, value: T) {
        *self.shared.value.lock().unwrap() = Some(value);
        self.shared.condvar.notify_one();
    }

    /// Removes and returns the current value, if any.
    pub fn take(&self) -> Option<T> {
        self.shared.value.lock().unwrap().take()
    }

    /// Blocks until a value is available, then removes and returns it.
    pub fn wait(&self) -> T {
        let mut guard = self.shared.value.lock().unwrap();
        loop {
            match guard.take() {
                Some(value) => return value,
                None => guard = self.shared.condvar.wait(guard).unwrap(),
            }
        }
    }
}

impl<T: Clone> Latest<T> {
    /// Returns a clone of the current value without removing it.
    pub fn peek(&self) -> Option<T> {
        self.shared.value.lock().unwrap().clone()
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn test_last_write_wins() {
        let slot = Latest::new();
        slot.set(1);
        slot.set(2);
        assert_eq!(slot.peek(), Some(2));
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let slot = Latest::new();
        assert_eq!(slot.peek(), None::<i32>);
        slot.set(7);
        assert_eq!(slot.peek(), Some(7));
        assert_eq!(slot.peek(), Some(7));
    }

    #[test]
    fn test_wait_wakes_consumer() {
        let slot = Latest::new();
        let producer = slot.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            producer.set("frame");
        });
        assert_eq!(slot.wait(), "frame");
        handle.join().unwrap();
    }
}
