//! Millisecond time-keeping and bounded waiting.
//!
//! A 1 ms hardware timer interrupt is the only time source on the target. The
//! interrupt handler calls [`SysTick::on_tick`]; everything else reads the
//! counter through the [`Clock`] trait, which tests replace with a fake.
//!
//! Every wait in this crate is bounded: either by a [`Deadline`] or by the
//! attempt ceiling of [`retry`].

use core::sync::atomic::{AtomicU32, Ordering};

/// A monotonic millisecond clock.
///
/// `now_ms` wraps at `u32::MAX`; compare instants with wrapping arithmetic
/// (see [`Deadline`]) rather than directly.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u32;
    /// Block the caller for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Tick counter shared between the 1 ms timer interrupt and the foreground
/// loop.
///
/// The interrupt is the single writer; readers only ever need the latest
/// value, so relaxed atomics are enough and no critical section is taken.
///
/// ```rust
/// use libw5500::time::{Clock, SysTick};
///
/// static SYSTICK: SysTick = SysTick::new();
///
/// // from the timer interrupt handler:
/// SYSTICK.on_tick();
/// assert_eq!(SYSTICK.now_ms(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SysTick {
    ticks: AtomicU32,
}

impl SysTick {
    /// A counter starting at zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one millisecond. Call from the timer interrupt only.
    pub fn on_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clock for SysTick {
    fn now_ms(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn delay_ms(&self, ms: u32) {
        let deadline = Deadline::start(self, ms);
        while !deadline.expired(self) {
            core::hint::spin_loop();
        }
    }
}

/// A time budget measured from the moment it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: u32,
    budget_ms: u32,
}

impl Deadline {
    /// Start a budget of `budget_ms` now.
    pub fn start<C: Clock + ?Sized>(clock: &C, budget_ms: u32) -> Self {
        Self {
            start: clock.now_ms(),
            budget_ms,
        }
    }

    /// Milliseconds since the deadline was started.
    pub fn elapsed<C: Clock + ?Sized>(&self, clock: &C) -> u32 {
        clock.now_ms().wrapping_sub(self.start)
    }

    /// Whether the whole budget has been used.
    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        self.elapsed(clock) >= self.budget_ms
    }

    /// Milliseconds left, zero once expired.
    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> u32 {
        self.budget_ms.saturating_sub(self.elapsed(clock))
    }
}

/// Run `op` until it succeeds, at most `max_attempts` times.
///
/// `op` receives the zero-based attempt number. Between a failed attempt and
/// the next one the caller sleeps `interval_ms` on `clock`; there is no sleep
/// after the last attempt. Returns the first success or the last error. A
/// ceiling of zero still runs one attempt.
///
/// ```rust
/// use core::cell::Cell;
/// use libw5500::time::{retry, Clock};
///
/// struct Fake(Cell<u32>);
/// impl Clock for Fake {
///     fn now_ms(&self) -> u32 { self.0.get() }
///     fn delay_ms(&self, ms: u32) { self.0.set(self.0.get() + ms) }
/// }
///
/// let clock = Fake(Cell::new(0));
/// let result: Result<u32, ()> = retry(&clock, 5, 1000, |n| if n == 2 { Ok(n) } else { Err(()) });
/// assert_eq!(result, Ok(2));
/// assert_eq!(clock.now_ms(), 2000);
/// ```
pub fn retry<C, T, E, F>(clock: &C, max_attempts: u32, interval_ms: u32, mut op: F) -> Result<T, E>
where
    C: Clock + ?Sized,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 >= attempts => return Err(err),
            Err(_) => {
                attempt += 1;
                clock.delay_ms(interval_ms);
            }
        }
    }
}
