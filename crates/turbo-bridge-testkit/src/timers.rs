//! Virtual clock.
//!
//! Timers never fire on their own. Tests move time forward with
//! [`MockDocument::advance`], which runs due callbacks in deadline order.

use std::collections::BTreeMap;
use std::time::Duration;

use turbo_bridge::host::{TimerHost, TimerId};
use turbo_bridge::{BridgeError, BridgeResult};

use crate::document::MockDocument;

#[derive(Default)]
pub(crate) struct VirtualClock {
    now: Duration,
    queue: BTreeMap<TimerId, (Duration, Box<dyn FnOnce()>)>,
}

impl VirtualClock {
    /// Remove the earliest timer due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<(Duration, Box<dyn FnOnce()>)> {
        let id = self
            .queue
            .iter()
            .filter(|(_, (due, _))| *due <= limit)
            .min_by_key(|(id, (due, _))| (*due, **id))
            .map(|(id, _)| *id)?;
        self.queue.remove(&id)
    }
}

impl MockDocument {
    /// Move the clock forward, firing every timer that falls due.
    pub fn advance(&self, by: Duration) {
        let limit = self.clock.borrow().now + by;
        loop {
            let next = self.clock.borrow_mut().pop_due(limit);
            let Some((due, callback)) = next else { break };
            self.clock.borrow_mut().now = due;
            callback();
        }
        self.clock.borrow_mut().now = limit;
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    pub fn pending_timers(&self) -> usize {
        self.clock.borrow().queue.len()
    }
}

impl TimerHost for MockDocument {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> BridgeResult<TimerId> {
        if self.faults.borrow().timers {
            return Err(BridgeError::Timer("setTimeout failed".to_string()));
        }
        let id = TimerId(self.next_id());
        let mut clock = self.clock.borrow_mut();
        let due = clock.now + delay;
        clock.queue.insert(id, (due, callback));
        Ok(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.clock.borrow_mut().queue.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let doc = MockDocument::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        for (label, ms) in [("late", 30), ("early", 10), ("middle", 20)] {
            let fired = fired.clone();
            doc.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || fired.borrow_mut().push(label)),
            )
            .unwrap();
        }

        doc.advance(Duration::from_millis(20));
        assert_eq!(*fired.borrow(), vec!["early", "middle"]);
        assert_eq!(doc.pending_timers(), 1);

        doc.advance(Duration::from_millis(10));
        assert_eq!(*fired.borrow(), vec!["early", "middle", "late"]);
        assert_eq!(doc.now(), Duration::from_millis(30));
    }

    #[test]
    fn test_clear_timeout() {
        let doc = MockDocument::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = fired.clone();
        let id = doc
            .set_timeout(
                Duration::from_millis(5),
                Box::new(move || *flag.borrow_mut() = true),
            )
            .unwrap();

        doc.clear_timeout(id);
        doc.clear_timeout(id);
        doc.advance(Duration::from_millis(50));

        assert!(!*fired.borrow());
    }

    #[test]
    fn test_callback_can_schedule_more_work() {
        let doc = Rc::new(MockDocument::new());
        let fired = Rc::new(RefCell::new(0));

        let inner_doc = Rc::downgrade(&doc);
        let counter = fired.clone();
        doc.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                *counter.borrow_mut() += 1;
                if let Some(doc) = inner_doc.upgrade() {
                    let counter = counter.clone();
                    doc.set_timeout(
                        Duration::from_millis(5),
                        Box::new(move || *counter.borrow_mut() += 1),
                    )
                    .unwrap();
                }
            }),
        )
        .unwrap();

        doc.advance(Duration::from_millis(10));
        assert_eq!(*fired.borrow(), 2);
    }
}
