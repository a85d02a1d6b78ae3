//! In-memory audit trail recorder.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::AuditEvent;

/// Thread-safe recorder for the most recent audit events.
///
/// Every recorded event is also emitted as a structured `tracing` event with
/// target `audit`, so a subscriber can ship the full trail elsewhere. The
/// in-memory copy keeps at most `capacity` events and drops the oldest.
///
/// # Example
///
/// ```
/// use featureboard_policy::audit::{AuditTrail, AuditEvent, AuditOutcome};
/// use featureboard_policy::Operation;
///
/// let trail = AuditTrail::with_capacity(2);
/// for id in ["req-1", "req-2", "req-3"] {
///     trail.record(AuditEvent::new(id, Some("root"), Operation::Delete, AuditOutcome::Success));
/// }
///
/// let events = trail.events();
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[0].request_id(), "req-2");
/// assert_eq!(trail.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct AuditTrail {
    capacity: usize,
    inner: Mutex<Retained>,
}

#[derive(Debug, Default)]
struct Retained {
    events: VecDeque<AuditEvent>,
    dropped: u64,
}

impl AuditTrail {
    /// Events kept by [`AuditTrail::new`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates an empty trail keeping [`Self::DEFAULT_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty trail keeping at most `capacity` events.
    ///
    /// A capacity of zero keeps nothing in memory; events still reach the
    /// `audit` tracing target.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Retained::default()),
        }
    }

    /// Returns the maximum number of retained events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records an audit event.
    pub fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            request_id = %event.request_id(),
            principal = event.principal().unwrap_or("<none>"),
            operation = %event.operation(),
            outcome = %event.outcome(),
            resource_id = event.resource_id().unwrap_or("<none>"),
            detail = event.detail().unwrap_or(""),
            "audit event"
        );

        let mut inner = self.inner.lock();
        if self.capacity == 0 {
            inner.dropped += 1;
            return;
        }
        if inner.events.len() == self.capacity {
            inner.events.pop_front();
            inner.dropped += 1;
        }
        inner.events.push_back(event);
    }

    /// Returns a snapshot of the retained events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    /// Returns the number of retained events.
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    /// Returns true if no events are retained.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Returns how many events were evicted or never retained.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }

    /// Clears all retained events.
    pub fn clear(&self) {
        self.inner.lock().events.clear();
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
