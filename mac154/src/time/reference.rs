//! The network time reference.
//!
//! The reference merges two hardware counters into one monotonic,
//! syntonized network uptime:
//!
//! - a **sleep counter** (~32 kHz) that keeps running in the deepest
//!   power states, and
//! - a **radio counter** (~4 MHz) that provides the sub-microsecond
//!   resolution TSCH needs, but only while powered.
//!
//! On wake-up the radio counter is started and an epoch offset is
//! captured, so the merged tick is continuous across sleep boundaries. A
//! monotonicity clamp guarantees the reported tick never moves backwards
//! even when the two counters disagree slightly. A single compare
//! register drives [`NetTimeReference::on_compare`], which announces the
//! elapsed ticks to the timeout queue and reprograms the next deadline.

use core::cell::{Cell, RefCell};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use critical_section::Mutex;

use super::queue::{ExpiryAction, QueueError, TimeoutId, TimeoutQueue};
use super::{ns_from_ticks, ticks_from_ns, NetTime, NetTimeApi, Rounding, Timepoint};

/// The number of concurrently pending timeouts.
const TIMEOUT_SLOTS: usize = 16;

/// A low-power counter that keeps running while the device sleeps.
pub trait SleepCounter {
    /// The counter frequency in Hz.
    fn frequency(&self) -> u64;
    /// The current counter value.
    fn now(&self) -> u64;
}

/// A high-resolution counter co-located with the radio.
pub trait RadioCounter {
    /// The counter frequency in Hz.
    fn frequency(&self) -> u64;
    /// Power the counter up.
    fn start(&self);
    /// Power the counter down.
    fn stop(&self);
    /// The current counter value.
    fn now(&self) -> u64;
    /// Arm the compare register at an absolute counter value.
    fn set_compare(&self, tick: u64);
    /// Disarm the compare register.
    fn clear_compare(&self);
}

struct Inner {
    queue: TimeoutQueue<TIMEOUT_SLOTS>,
    /// Monotonicity clamp: the highest tick ever reported.
    last_tick: u64,
    /// The tick up to which the queue has been announced.
    queue_tick: u64,
    /// Offset from the radio counter to the merged tick.
    epoch_offset: i64,
    /// Wake-up request count for the radio counter.
    wake_requests: u8,
    /// The armed compare tick, if any.
    programmed: Option<u64>,
}

/// The merged network time reference.
pub struct NetTimeReference<S, R> {
    sleep_counter: S,
    radio_counter: R,
    inner: Mutex<RefCell<Inner>>,
}

impl<S: SleepCounter, R: RadioCounter> NetTimeReference<S, R> {
    /// Create a reference over the two counters.
    pub fn new(sleep_counter: S, radio_counter: R) -> Self {
        Self {
            sleep_counter,
            radio_counter,
            inner: Mutex::new(RefCell::new(Inner {
                queue: TimeoutQueue::new(),
                last_tick: 0,
                queue_tick: 0,
                epoch_offset: 0,
                wake_requests: 0,
                programmed: None,
            })),
        }
    }

    fn frequency(&self) -> u64 {
        self.radio_counter.frequency()
    }

    /// The merged counter value in radio ticks, monotonically clamped.
    fn tick_now(&self, inner: &mut Inner) -> u64 {
        let raw = if inner.wake_requests > 0 {
            (self.radio_counter.now() as i64 + inner.epoch_offset) as u64
        } else {
            // The radio counter is off; fall back to the sleep counter,
            // scaled to radio resolution.
            let sleep_ticks = self.sleep_counter.now();
            (sleep_ticks as u128 * self.frequency() as u128
                / self.sleep_counter.frequency() as u128) as u64
        };

        let tick = raw.max(inner.last_tick);
        inner.last_tick = tick;
        tick
    }

    fn reprogram(&self, inner: &mut Inner) {
        match inner.queue.next_delta() {
            Some(delta) => {
                let at = inner.queue_tick + delta;
                inner.programmed = Some(at);
                if inner.wake_requests > 0 {
                    self.radio_counter
                        .set_compare((at as i64 - inner.epoch_offset) as u64);
                }
            }
            None => {
                inner.programmed = None;
                if inner.wake_requests > 0 {
                    self.radio_counter.clear_compare();
                }
            }
        }
    }

    fn add_timeout(
        &self,
        inner: &mut Inner,
        at_tick: u64,
        period: Option<u64>,
        action: ExpiryAction,
    ) -> Result<TimeoutId, QueueError> {
        // Deltas are relative to the queue position, which only advances
        // while expiries are announced. During an announce the position is
        // the firing deadline, so a timeout chained from a callback is
        // measured from that deadline rather than from wall time.
        let dt = at_tick.saturating_sub(inner.queue_tick);
        let id = inner.queue.add(dt, period, action)?;
        self.reprogram(inner);
        Ok(id)
    }

    fn cancel_timeout(&self, id: TimeoutId) {
        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);
            if inner.queue.abort(id) {
                self.reprogram(inner);
            }
        });
    }

    /// Start a timer at an absolute network time, optionally periodic.
    /// Returns the actually programmed timepoint, after rounding.
    pub fn timer_start(
        &self,
        timer: &NetTimer,
        expire_at: NetTime,
        period_ns: Option<i64>,
        rounding: Rounding,
    ) -> Result<Timepoint, QueueError> {
        let at_tick = ticks_from_ns(expire_at.as_ns(), self.frequency(), rounding);
        let period = period_ns.map(|p| ticks_from_ns(p, self.frequency(), rounding));

        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);

            if let Some(id) = timer.id.take() {
                inner.queue.abort(id);
            }

            let id = self.add_timeout(
                inner,
                at_tick,
                period,
                ExpiryAction::Callback {
                    handler: timer.handler,
                    token: timer.token,
                },
            )?;
            timer.id.set(Some(id));

            Ok(Timepoint::from_ticks(at_tick))
        })
    }

    /// Stop a timer. Idempotent.
    pub fn timer_stop(&self, timer: &NetTimer) {
        if let Some(id) = timer.id.take() {
            self.cancel_timeout(id);
        }
    }

    /// The compare interrupt entry point: announce the elapsed ticks to
    /// the timeout queue, firing due expiries with the lock released, then
    /// reprogram the next deadline.
    pub fn on_compare(&self) {
        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);
            let now = self.tick_now(inner);

            // The compare must not fire before its programmed tick.
            if let Some(programmed) = inner.programmed.take() {
                debug_assert!(now >= programmed, "compare fired early");
            }
        });

        // Drain the queue one expiry at a time, so each action fires with
        // the lock released. `queue_tick` tracks the announced position;
        // while the drain runs it sits on the firing deadline, which is
        // what a timeout chained from an expiry action is measured from.
        loop {
            let action = critical_section::with(|cs| {
                let inner = &mut *self.inner.borrow_ref_mut(cs);
                let now = self.tick_now(inner);
                let mut budget = now - inner.queue_tick;
                let before = budget;
                let action = inner.queue.pop_due(&mut budget);
                inner.queue_tick += before - budget;
                action
            });

            match action {
                Some(action) => action.fire(),
                None => break,
            }
        }

        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);
            self.reprogram(inner);
        });
    }

    /// Sleep until the given network time.
    pub fn wait_until(&self, t: NetTime) -> WaitUntil<'_, S, R> {
        WaitUntil {
            reference: self,
            at: t,
            id: None,
        }
    }
}

impl<S: SleepCounter, R: RadioCounter> NetTimeApi for NetTimeReference<S, R> {
    fn now(&self) -> NetTime {
        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);
            let tick = self.tick_now(inner);
            NetTime::from_ns(ns_from_ticks(tick, self.frequency()))
        })
    }

    fn timepoint_from_time(&self, t: NetTime, rounding: Rounding) -> Timepoint {
        Timepoint::from_ticks(ticks_from_ns(t.as_ns(), self.frequency(), rounding))
    }

    fn time_from_timepoint(&self, tp: Timepoint) -> NetTime {
        NetTime::from_ns(ns_from_ticks(tp.as_ticks(), self.frequency()))
    }

    fn syntonize(&self, _measured_time: NetTime, _measured_timepoint: Timepoint) {
        // Skew correction is a hook; the minimal reference runs on the
        // raw counters.
    }

    fn counter_wake_up(&self) {
        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);

            if inner.wake_requests == 0 {
                // Capture the sleep-derived tick first, then the epoch,
                // so the merged tick stays continuous across the sleep
                // boundary.
                let base = self.tick_now(inner);
                self.radio_counter.start();
                inner.epoch_offset = base as i64 - self.radio_counter.now() as i64;
                inner.wake_requests = 1;
                self.reprogram(inner);
            } else {
                inner.wake_requests = inner.wake_requests.saturating_add(1);
            }
        });
    }

    fn counter_may_sleep(&self) {
        critical_section::with(|cs| {
            let inner = &mut *self.inner.borrow_ref_mut(cs);
            if inner.wake_requests == 0 {
                return;
            }

            if inner.wake_requests == 1 {
                // Latch the final high-resolution tick into the clamp
                // before the counter disappears.
                let _ = self.tick_now(inner);
                inner.wake_requests = 0;
                self.radio_counter.stop();
            } else {
                inner.wake_requests -= 1;
            }
        });
    }

    fn wait_until(&self, t: NetTime) -> impl Future<Output = ()> {
        NetTimeReference::wait_until(self, t)
    }
}

/// A one-shot or periodic timer armed through
/// [`NetTimeReference::timer_start`].
pub struct NetTimer {
    handler: fn(usize),
    token: usize,
    id: Cell<Option<TimeoutId>>,
}

impl NetTimer {
    /// Create a timer that calls `handler(token)` on expiry.
    pub const fn new(handler: fn(usize), token: usize) -> Self {
        Self {
            handler,
            token,
            id: Cell::new(None),
        }
    }
}

/// The future returned by [`NetTimeReference::wait_until`].
pub struct WaitUntil<'a, S, R> {
    reference: &'a NetTimeReference<S, R>,
    at: NetTime,
    id: Option<TimeoutId>,
}

impl<S: SleepCounter, R: RadioCounter> Future for WaitUntil<'_, S, R> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.reference.now() >= this.at {
            if let Some(id) = this.id.take() {
                this.reference.cancel_timeout(id);
            }
            return Poll::Ready(());
        }

        let at_tick = ticks_from_ns(
            this.at.as_ns(),
            this.reference.frequency(),
            Rounding::Next,
        );

        critical_section::with(|cs| {
            let inner = &mut *this.reference.inner.borrow_ref_mut(cs);

            if let Some(id) = this.id.take() {
                inner.queue.abort(id);
            }

            // A full queue leaves the waker unregistered; waking
            // immediately degrades to polling rather than hanging.
            match this.reference.add_timeout(
                inner,
                at_tick,
                None,
                ExpiryAction::Wake(cx.waker().clone()),
            ) {
                Ok(id) => this.id = Some(id),
                Err(_) => cx.waker().wake_by_ref(),
            }
        });

        Poll::Pending
    }
}

impl<S, R> Drop for WaitUntil<'_, S, R> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            critical_section::with(|cs| {
                let inner = &mut *self.reference.inner.borrow_ref_mut(cs);
                inner.queue.abort(id);
            });
        }
    }
}
