//! # Feedback Slot
//!
//! The single shared slot that holds the latest coaching text.
//!
//! The frame loop reserves a [`Ticket`] when a rep completes and hands it to
//! the background rephrasing task together with the verdict. The task
//! publishes its result with that ticket; the display path reads the slot at
//! any time.
//!
//! Tickets are strictly increasing. A publish succeeds only if its ticket is
//! newer than the last accepted write, so a slow task for an earlier rep can
//! never overwrite the text of a later one, and each ticket writes at most once.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Write permission for one publish, ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(pub u64);

/// Point-in-time view of the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Ticket of the last accepted write.
    pub ticket: Ticket,
    pub text: String,
}

#[derive(Debug)]
struct SlotInner {
    issued: u64,
    written: u64,
    text: String,
}

/// Cloneable handle to the shared coaching text.
#[derive(Debug, Clone)]
pub struct FeedbackSlot {
    inner: Arc<RwLock<SlotInner>>,
}

impl FeedbackSlot {
    /// Create a slot showing `initial` until the first publish.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SlotInner {
                issued: 0,
                written: 0,
                text: initial.into(),
            })),
        }
    }

    /// Reserve the next ticket.
    #[must_use]
    pub fn reserve(&self) -> Ticket {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.issued = inner.issued.saturating_add(1);
        Ticket(inner.issued)
    }

    /// Store `text` if `ticket` is newer than the current content.
    ///
    /// Returns `false` when the write was discarded as stale or unknown.
    pub fn publish(&self, ticket: Ticket, text: impl Into<String>) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 <= inner.written || ticket.0 > inner.issued {
            return false;
        }
        inner.written = ticket.0;
        inner.text = text.into();
        true
    }

    /// Overwrite unconditionally and invalidate every outstanding ticket.
    pub fn reset(&self, text: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.issued = inner.issued.saturating_add(1);
        inner.written = inner.issued;
        inner.text = text.into();
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SlotSnapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        SlotSnapshot {
            ticket: Ticket(inner.written),
            text: inner.text.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_text_until_first_publish() {
        let slot = FeedbackSlot::new("Start");
        assert_eq!(slot.text(), "Start");
        let t = slot.reserve();
        assert!(slot.publish(t, "Nice"));
        assert_eq!(slot.text(), "Nice");
        assert_eq!(slot.snapshot().ticket, t);
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let slot = FeedbackSlot::new("");
        let first = slot.reserve();
        let second = slot.reserve();

        assert!(slot.publish(second, "rep 2"));
        assert!(!slot.publish(first, "rep 1"));
        assert_eq!(slot.text(), "rep 2");
    }

    #[test]
    fn ticket_writes_at_most_once() {
        let slot = FeedbackSlot::new("");
        let t = slot.reserve();
        assert!(slot.publish(t, "a"));
        assert!(!slot.publish(t, "b"));
        assert_eq!(slot.text(), "a");
    }

    #[test]
    fn unissued_ticket_is_rejected() {
        let slot = FeedbackSlot::new("x");
        assert!(!slot.publish(Ticket(7), "forged"));
        assert_eq!(slot.text(), "x");
    }

    #[test]
    fn reset_invalidates_outstanding_tickets() {
        let slot = FeedbackSlot::new("old");
        let pending = slot.reserve();
        slot.reset("fresh");
        assert!(!slot.publish(pending, "late"));
        assert_eq!(slot.text(), "fresh");
    }

    #[test]
    fn clones_share_state_across_threads() {
        let slot = FeedbackSlot::new("");
        let ticket = slot.reserve();
        let writer = slot.clone();
        std::thread::spawn(move || writer.publish(ticket, "from thread"))
            .join()
            .expect("join");
        assert_eq!(slot.text(), "from thread");
    }
}
