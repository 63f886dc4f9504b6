//! Event timeline: binds operations to events and fires them when due.
//!
//! Dispatching an event at time `t` schedules every operation bound to that
//! event id for `t + offset`. [`EventManager::advance`] then fires whatever
//! has come due, earliest first, ties in registration order.

use crate::operation::{Operation, OperationTarget};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use trajex_core::{Event, EventError};

/// Firings allowed in one `advance`; bounds zero-offset dispatch loops.
const MAX_FIRINGS_PER_ADVANCE: usize = 10_000;

#[derive(Debug, Clone)]
struct Registration {
    event: Event,
    operation: Operation,
    recurring: bool,
    /// Cleared once a non-recurring entry has been scheduled this trial.
    armed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: f64,
    registration: usize,
    seq: u64,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then(self.registration.cmp(&other.registration))
            .then(self.seq.cmp(&other.seq))
    }
}

/// One operation that fired during `advance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired {
    pub event: Event,
    pub operation: Operation,
    pub due: f64,
}

#[derive(Debug, Default)]
pub struct EventManager {
    registrations: Vec<Registration>,
    pending: BinaryHeap<Reverse<Pending>>,
    seq: u64,
    closed: bool,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `operation` to `event`. Fails once the first trial has started.
    pub fn register_operation(
        &mut self,
        event: Event,
        operation: Operation,
        recurring: bool,
    ) -> Result<(), EventError> {
        if self.closed {
            return Err(EventError::RegistrationClosed);
        }
        tracing::debug!(%event, action = operation.action(), recurring, "registered operation");
        self.registrations.push(Registration {
            event,
            operation,
            recurring,
            armed: true,
        });
        Ok(())
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clears pending firings and re-arms one-shot operations.
    pub fn on_trial_started(&mut self) {
        self.closed = true;
        self.pending.clear();
        for r in &mut self.registrations {
            r.armed = true;
        }
    }

    /// Records that `event_id` happened at `time` and schedules its operations.
    pub fn dispatch_event(&mut self, event_id: &str, time: f64) {
        for (index, r) in self.registrations.iter_mut().enumerate() {
            if r.event.id() != event_id || !r.armed {
                continue;
            }
            if !r.recurring {
                r.armed = false;
            }
            self.seq += 1;
            self.pending.push(Reverse(Pending {
                due: time + r.event.offset(),
                registration: index,
                seq: self.seq,
            }));
        }
    }

    /// Fires every operation due at or before `now`.
    ///
    /// `DispatchEvent` operations are handled here, and anything they
    /// schedule that is already due fires within the same call.
    pub fn advance(&mut self, now: f64, target: &mut dyn OperationTarget) -> Vec<Fired> {
        let mut fired = Vec::new();
        while let Some(Reverse(next)) = self.pending.peek().copied() {
            if next.due > now {
                break;
            }
            if fired.len() >= MAX_FIRINGS_PER_ADVANCE {
                tracing::warn!(now, "too many operations fired in one frame; deferring the rest");
                break;
            }
            self.pending.pop();
            let r = &self.registrations[next.registration];
            let operation = r.operation.clone();
            let event = r.event.clone();
            match &operation {
                Operation::DispatchEvent { dispatched: id } => self.dispatch_event(id, next.due),
                op => target.execute(op, next.due),
            }
            fired.push(Fired {
                event,
                operation,
                due: next.due,
            });
        }
        fired
    }
}
