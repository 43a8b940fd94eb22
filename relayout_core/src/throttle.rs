// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leading- and trailing-edge rate limiter.
//!
//! [`Throttle`] wraps a function so that a burst of calls invokes it at most
//! once per `wait` interval:
//!
//! ```text
//!  calls:   ││││││││││            │││││
//!           ▼                     ▼
//!  invoke:  L─────── wait ───────T────── wait ──────T
//! ```
//!
//! - The first call after a quiet period invokes immediately (leading edge).
//! - Calls inside the window latch their arguments (last write wins) and
//!   schedule a single trailing invocation for when the window closes.
//! - A call that finds the window already over, or the clock moved backwards
//!   so far that the remaining time exceeds `wait`, is a new leading edge and
//!   cancels any pending trailing invocation.
//!
//! Every call returns the result of the most recent actual invocation, which
//! may be stale.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use crate::engine::Handler;
use crate::host::{TimeoutId, Timers, Trigger};
use crate::time::{Duration, HostTime};
use crate::trace::{ThrottleDecision, ThrottleEvent, TraceSlot};

/// Mutable rate limiter state.
#[derive(Debug)]
struct State<A, R> {
    /// Time of the last actual invocation; `None` before the first one.
    last: Option<HostTime>,
    /// Scheduled trailing invocation.
    pending: Option<TimeoutId>,
    /// Arguments for the trailing invocation.
    latched: Option<A>,
    /// Result of the last actual invocation.
    result: Option<R>,
}

/// A rate-limited function. Cloning yields another handle to the same state.
pub struct Throttle<A: 'static, R: 'static> {
    inner: Rc<Inner<A, R>>,
}

impl<A: 'static, R: 'static> Clone for Throttle<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner<A, R> {
    me: Weak<Self>,
    func: Box<dyn Fn(A) -> R>,
    wait: Duration,
    timers: Rc<dyn Timers>,
    state: RefCell<State<A, R>>,
    trace: Option<Rc<TraceSlot>>,
}

enum Edge<A> {
    Leading(Option<TimeoutId>, A),
    Deferred(Option<Duration>),
}

impl<A: 'static, R: Clone + 'static> Throttle<A, R> {
    /// Wraps `func` so it runs at most once per `wait`.
    pub fn new(func: impl Fn(A) -> R + 'static, wait: Duration, timers: Rc<dyn Timers>) -> Self {
        Self::build(Box::new(func), wait, timers, None)
    }

    pub(crate) fn with_trace(
        func: impl Fn(A) -> R + 'static,
        wait: Duration,
        timers: Rc<dyn Timers>,
        trace: Rc<TraceSlot>,
    ) -> Self {
        Self::build(Box::new(func), wait, timers, Some(trace))
    }

    fn build(
        func: Box<dyn Fn(A) -> R>,
        wait: Duration,
        timers: Rc<dyn Timers>,
        trace: Option<Rc<TraceSlot>>,
    ) -> Self {
        Self {
            inner: Rc::new_cyclic(|me| Inner {
                me: me.clone(),
                func,
                wait,
                timers,
                state: RefCell::new(State {
                    last: None,
                    pending: None,
                    latched: None,
                    result: None,
                }),
                trace,
            }),
        }
    }

    /// Calls the wrapped function now or later, returning the most recent
    /// result (`None` before the first invocation).
    pub fn call(&self, args: A) -> Option<R> {
        self.inner.call(args)
    }

    /// Drops a pending trailing invocation and its latched arguments.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` while a trailing invocation is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending.is_some()
    }

    /// The configured interval.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}

impl<A: 'static, R: Clone + 'static> Inner<A, R> {
    fn call(&self, args: A) -> Option<R> {
        let now = self.timers.now();
        let edge = {
            let mut state = self.state.borrow_mut();
            let wait = i128::from(self.wait.0);
            let remaining = match state.last {
                None => 0,
                Some(last) => wait - now.signed_micros_since(last),
            };
            if remaining <= 0 || remaining > wait {
                state.last = Some(now);
                state.latched = None;
                Edge::Leading(state.pending.take(), args)
            } else {
                state.latched = Some(args);
                if state.pending.is_some() {
                    Edge::Deferred(None)
                } else {
                    Edge::Deferred(Some(Duration(u64::try_from(remaining).unwrap_or(0))))
                }
            }
        };

        match edge {
            Edge::Leading(pending, args) => {
                if let Some(id) = pending {
                    self.timers.clear_timeout(id);
                }
                self.emit(now, ThrottleDecision::Leading);
                Some(self.invoke(args))
            }
            Edge::Deferred(Some(delay)) => {
                // The scheduled timeout owns the limiter until it fires.
                let me = self.me.upgrade();
                let id = self.timers.set_timeout(
                    delay,
                    Box::new(move || {
                        if let Some(inner) = me {
                            inner.trailing();
                        }
                    }),
                );
                let mut state = self.state.borrow_mut();
                state.pending = Some(id);
                self.emit(now, ThrottleDecision::Scheduled(delay));
                state.result.clone()
            }
            Edge::Deferred(None) => {
                self.emit(now, ThrottleDecision::Coalesced);
                self.state.borrow().result.clone()
            }
        }
    }

    fn trailing(&self) {
        let now = self.timers.now();
        let args = {
            let mut state = self.state.borrow_mut();
            state.pending = None;
            state.last = Some(now);
            state.latched.take()
        };
        if let Some(args) = args {
            self.emit(now, ThrottleDecision::Trailing);
            self.invoke(args);
        }
    }

    /// Runs the wrapped function with no state borrow held, so it may call
    /// back into this throttle.
    fn invoke(&self, args: A) -> R {
        let result = (self.func)(args);
        self.state.borrow_mut().result = Some(result.clone());
        result
    }

    fn cancel(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.latched = None;
            state.pending.take()
        };
        if let Some(id) = pending {
            self.timers.clear_timeout(id);
            self.emit(self.timers.now(), ThrottleDecision::Cancelled);
        }
    }

    fn emit(&self, timestamp: HostTime, decision: ThrottleDecision) {
        if let Some(trace) = &self.trace {
            trace.emit(|sink| sink.on_throttle(&ThrottleEvent { timestamp, decision }));
        }
    }
}

impl Handler for Throttle<Trigger, ()> {
    fn on_layout_change(&self, trigger: Trigger) {
        let _ = self.call(trigger);
    }
}

impl<A: 'static, R: 'static> fmt::Debug for Throttle<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.try_borrow();
        let mut s = f.debug_struct("Throttle");
        s.field("wait", &self.inner.wait);
        if let Ok(state) = state {
            s.field("last", &state.last).field("pending", &state.pending);
        }
        s.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StepTimers;
    use alloc::vec::Vec;
    use core::cell::Cell;

    fn recorder(timers: &Rc<StepTimers>, wait_ms: u64) -> (Throttle<u32, u32>, Rc<RefCell<Vec<u32>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let throttle = Throttle::new(
            move |x: u32| {
                s.borrow_mut().push(x);
                x * 10
            },
            Duration::from_millis(wait_ms),
            timers.clone(),
        );
        (throttle, seen)
    }

    #[test]
    fn first_call_is_leading() {
        let timers = Rc::new(StepTimers::default());
        timers.set_now(HostTime::from_millis(1_000));
        let (throttle, seen) = recorder(&timers, 100);

        assert_eq!(throttle.call(1), Some(10));
        assert_eq!(*seen.borrow(), [1]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn leading_even_at_time_zero() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(7);
        assert_eq!(*seen.borrow(), [7], "never-invoked state is a leading edge");
    }

    #[test]
    fn burst_yields_leading_and_trailing_with_last_args() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);

        for i in 1..=500 {
            throttle.call(i);
        }
        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(timers.pending(), 1, "one trailing timer for the burst");

        timers.advance(Duration::from_millis(100));
        assert_eq!(*seen.borrow(), [1, 500], "last write wins");

        for i in 501..=1000 {
            throttle.call(i);
        }
        timers.advance(Duration::from_millis(100));
        assert_eq!(*seen.borrow(), [1, 500, 1000]);
    }

    #[test]
    fn coalesced_calls_return_stale_result() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, _) = recorder(&timers, 100);
        assert_eq!(throttle.call(3), Some(30));
        timers.advance(Duration::from_millis(10));
        assert_eq!(throttle.call(4), Some(30));
        timers.advance(Duration::from_millis(90));
        assert_eq!(throttle.call(5), Some(40), "trailing result is cached");
    }

    #[test]
    fn trailing_fires_after_remaining_window() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(1);
        timers.advance(Duration::from_millis(60));
        throttle.call(2);
        timers.advance(Duration::from_millis(39));
        assert_eq!(*seen.borrow(), [1]);
        timers.advance(Duration::from_millis(1));
        assert_eq!(*seen.borrow(), [1, 2]);
    }

    #[test]
    fn expired_window_is_new_leading_edge() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(1);
        timers.advance(Duration::from_millis(250));
        throttle.call(2);
        assert_eq!(*seen.borrow(), [1, 2]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn clock_regression_cancels_pending_and_invokes() {
        let timers = Rc::new(StepTimers::default());
        timers.set_now(HostTime::from_millis(10_000));
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(1);
        timers.advance(Duration::from_millis(20));
        throttle.call(2);
        assert!(throttle.is_pending());

        timers.set_now(HostTime::from_millis(5_000));
        throttle.call(3);
        assert_eq!(*seen.borrow(), [1, 3]);
        assert!(!throttle.is_pending(), "pending trailing call cancelled");
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn cancel_drops_trailing_call() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(1);
        throttle.call(2);
        throttle.cancel();
        timers.advance(Duration::from_millis(500));
        assert_eq!(*seen.borrow(), [1]);
    }

    #[test]
    fn trailing_call_survives_dropped_handle() {
        let timers = Rc::new(StepTimers::default());
        let (throttle, seen) = recorder(&timers, 100);
        throttle.call(1);
        throttle.call(2);
        drop(throttle);
        timers.advance(Duration::from_millis(100));
        assert_eq!(*seen.borrow(), [1, 2]);
    }

    #[test]
    fn reentrant_call_from_wrapped_function() {
        let timers = Rc::new(StepTimers::default());
        let slot: Rc<RefCell<Option<Throttle<(), ()>>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));
        let throttle = {
            let slot = slot.clone();
            let count = count.clone();
            Throttle::new(
                move |()| {
                    count.set(count.get() + 1);
                    if let Some(t) = slot.borrow().as_ref() {
                        t.call(());
                    }
                },
                Duration::from_millis(50),
                timers.clone(),
            )
        };
        *slot.borrow_mut() = Some(throttle.clone());

        throttle.call(());
        assert_eq!(count.get(), 1);
        assert!(throttle.is_pending(), "nested call was coalesced");
        slot.borrow_mut().take();
    }
}
