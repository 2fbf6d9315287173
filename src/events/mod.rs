//! # Observable state
//!
//! UI layers render from the latest known state of the catalog and of the
//! trainer form, and re-render when it changes. [`StateStream`] is the push
//! side of that contract: every update is delivered to the current
//! subscribers, and a subscriber that joins late immediately sees the most
//! recent value instead of waiting for the next change.
//!
//! It is a thin wrapper over [`tokio::sync::watch`]. Receivers only ever hold
//! the newest value, so a slow renderer skips intermediate states rather than
//! queueing them.
//!
//! ## Usage
//!
//! ```rust
//! use pokedex_cuscatlan::events::StateStream;
//!
//! let stream = StateStream::new(0u32);
//! let rx = stream.subscribe();
//!
//! stream.update(|count| *count += 1);
//! assert_eq!(*rx.borrow(), 1);
//! ```

use tokio::sync::watch;

/// Latest-value broadcast cell.
pub struct StateStream<T> {
    sender: watch::Sender<T>,
}

impl<T> StateStream<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Subscribe to future changes. The current value is readable right away.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Mutate the state in place and notify every subscriber.
    ///
    /// Works with zero subscribers; the value is kept for the next one.
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.sender.send_modify(modify);
    }

    pub fn replace(&self, value: T) {
        self.sender.send_replace(value);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> StateStream<T> {
    pub fn current(&self) -> T {
        self.sender.borrow().clone()
    }
}

impl<T: Default> Default for StateStream<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
