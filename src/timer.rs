//! Millisecond time keeping.
//!
//! The controller runs on a free-running millisecond counter supplied by the platform (a
//! `millis()`-style timer interrupt, an RTC, or a test fake). Every software timer is just the
//! timestamp of its last event; elapsed time is `now − timestamp`.

/// A monotonic millisecond counter.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch. Must never go backwards.
    fn millis(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn millis(&self) -> u64 {
        (**self).millis()
    }
}

/// Timestamp of the last event of some kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Stopwatch {
    last: u64,
}

impl Stopwatch {
    /// A stopwatch last reset at `now`.
    pub const fn started_at(now: u64) -> Self {
        Self { last: now }
    }

    /// Records an event at `now`.
    pub fn reset(&mut self, now: u64) {
        self.last = now;
    }

    /// Milliseconds since the last event. Saturates at zero if `now` is behind.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.last)
    }

    /// Whether at least `period` milliseconds have passed since the last event.
    pub fn has_elapsed(&self, now: u64, period: u64) -> bool {
        self.elapsed(now) >= period
    }
}
