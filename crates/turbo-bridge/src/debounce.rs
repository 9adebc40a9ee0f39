//! Trailing-edge debounce over a [`TimerHost`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::error::BridgeResult;
use crate::host::{TimerHost, TimerId};

/// Coalesces bursts of triggers into one action after `delay` of quiet.
///
/// Each [`trigger`](Debouncer::trigger) cancels the pending timer and
/// schedules a new one, so at most one action runs per quiet period.
/// Dropping the debouncer cancels any pending action.
pub struct Debouncer<T: TimerHost + 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: TimerHost> {
    timers: Rc<T>,
    delay: Duration,
    pending: Cell<Option<TimerId>>,
    action: Box<dyn Fn()>,
}

impl<T: TimerHost + 'static> Debouncer<T> {
    pub fn new(timers: Rc<T>, delay: Duration, action: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                timers,
                delay,
                pending: Cell::new(None),
                action: Box::new(action),
            }),
        }
    }

    /// Restart the quiet period.
    pub fn trigger(&self) -> BridgeResult<()> {
        self.cancel();

        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.timers.set_timeout(
            self.inner.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.pending.set(None);
                    (inner.action)();
                }
            }),
        )?;
        self.inner.pending.set(Some(id));
        Ok(())
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.timers.clear_timeout(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }
}

impl<T: TimerHost + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T: TimerHost + 'static> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.inner.delay)
            .field("pending", &self.inner.pending.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Manually driven clock.
    #[derive(Default)]
    struct FakeTimers {
        now: Cell<u64>,
        next_id: Cell<u64>,
        queue: RefCell<BTreeMap<TimerId, (u64, Box<dyn FnOnce()>)>>,
    }

    impl FakeTimers {
        fn advance(&self, ms: u64) {
            let target = self.now.get() + ms;
            loop {
                let due = self
                    .queue
                    .borrow()
                    .iter()
                    .filter(|(_, (at, _))| *at <= target)
                    .min_by_key(|(id, (at, _))| (*at, **id))
                    .map(|(id, (at, _))| (*id, *at));
                let Some((id, at)) = due else { break };
                let callback = self.queue.borrow_mut().remove(&id).map(|(_, cb)| cb);
                self.now.set(at);
                if let Some(callback) = callback {
                    callback();
                }
            }
            self.now.set(target);
        }

        fn scheduled(&self) -> usize {
            self.queue.borrow().len()
        }
    }

    impl TimerHost for FakeTimers {
        fn set_timeout(
            &self,
            delay: Duration,
            callback: Box<dyn FnOnce()>,
        ) -> BridgeResult<TimerId> {
            let id = TimerId(self.next_id.get());
            self.next_id.set(id.0 + 1);
            let at = self.now.get() + delay.as_millis() as u64;
            self.queue.borrow_mut().insert(id, (at, callback));
            Ok(id)
        }

        fn clear_timeout(&self, id: TimerId) {
            self.queue.borrow_mut().remove(&id);
        }
    }

    fn counting(timers: &Rc<FakeTimers>, ms: u64) -> (Debouncer<FakeTimers>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let debouncer = Debouncer::new(timers.clone(), Duration::from_millis(ms), move || {
            counter.set(counter.get() + 1);
        });
        (debouncer, count)
    }

    #[test]
    fn test_single_trigger_fires_after_delay() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, count) = counting(&timers, 10);

        debouncer.trigger().unwrap();
        assert!(debouncer.is_pending());

        timers.advance(9);
        assert_eq!(count.get(), 0);

        timers.advance(1);
        assert_eq!(count.get(), 1);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_coalesces() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, count) = counting(&timers, 10);

        for _ in 0..5 {
            debouncer.trigger().unwrap();
            timers.advance(4);
        }
        assert_eq!(count.get(), 0);
        assert_eq!(timers.scheduled(), 1);

        timers.advance(10);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_separate_bursts_fire_separately() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, count) = counting(&timers, 10);

        debouncer.trigger().unwrap();
        timers.advance(20);
        debouncer.trigger().unwrap();
        timers.advance(20);

        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, count) = counting(&timers, 10);

        debouncer.trigger().unwrap();
        debouncer.cancel();
        timers.advance(50);

        assert_eq!(count.get(), 0);
        assert_eq!(timers.scheduled(), 0);
    }

    #[test]
    fn test_drop_cancels_pending() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, count) = counting(&timers, 10);

        debouncer.trigger().unwrap();
        drop(debouncer);
        timers.advance(50);

        assert_eq!(count.get(), 0);
        assert_eq!(timers.scheduled(), 0);
    }

    #[test]
    fn test_delay_accessor() {
        let timers = Rc::new(FakeTimers::default());
        let (debouncer, _) = counting(&timers, 25);
        assert_eq!(debouncer.delay(), Duration::from_millis(25));
    }
}
