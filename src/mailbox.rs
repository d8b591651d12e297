//! Hand-off slot for the most recent decoded event.
//!
//! The BLE side publishes every event it decodes; a consumer (a polling HTTP handler, a
//! display task) takes what is there at its own pace. Only the newest event is kept: a publish
//! over an untaken event replaces it, and a take empties the slot until something new arrives,
//! so repeated polls come back empty instead of repeating old data.
//!
//! The mailbox does no locking itself. When producer and consumer run on different tasks, the
//! application wraps it in whatever mutual exclusion its platform provides, keeping the
//! critical section to the `publish`/`take` call. `take` moves the value out, so a consumer
//! never sees a torn event.

/// A single-value slot with take-once semantics.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Option<T>,
}

impl<T> Mailbox<T> {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Mailbox { slot: None }
    }

    /// Stores `value`, replacing a previous one that was not picked up in time.
    pub fn publish(&mut self, value: T) {
        self.slot = Some(value);
    }

    /// Removes and returns the latest value, leaving the mailbox empty.
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// Returns whether there is nothing to take.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_empties_the_slot() {
        let mut mailbox = Mailbox::new();
        assert!(mailbox.is_empty());
        mailbox.publish(3);
        assert_eq!(mailbox.take(), Some(3));
        assert_eq!(mailbox.take(), None);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn publishing_replaces_an_untaken_value() {
        let mut mailbox = Mailbox::new();
        mailbox.publish(1);
        mailbox.publish(2);
        assert_eq!(mailbox.take(), Some(2));
        assert_eq!(mailbox.take(), None);
    }
}
