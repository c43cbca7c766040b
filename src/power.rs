//! Deep sleep and wake-up.
//!
//! The platform's power-down primitive is opaque to the firmware: it stops the clocks and
//! returns only after one of the registered external interrupts has fired. [`DeepSleep`] is that
//! seam.
//!
//! ## Interrupt handling (`wake-isr` feature)
//!
//! Wake interrupts are armed only immediately before powering down and disarmed right after, so
//! the main loop and the ISRs never run concurrently. Even so, the ISR does nothing but set the
//! single-slot [`WakeLatch`]. Re-enabling the converter, resetting timers and granting a
//! transmit permit all happen in the main loop once [`DeepSleep::power_down`] has returned.
//!
//! ```rust,ignore
//! #[avr_device::interrupt(atmega328p)]
//! fn INT0() {
//!     keyfob433::power::on_wake_interrupt();
//! }
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn INT1() {
//!     keyfob433::power::on_wake_interrupt();
//! }
//! ```
//!
//! Wrapping the platform sleep in [`LatchedSleep`] makes returns from the power-down primitive
//! that were not caused by a latched wake go straight back to sleep.

#[cfg(feature = "wake-isr")]
use core::cell::Cell;
#[cfg(feature = "wake-isr")]
use critical_section::Mutex;

/// The platform's power management, as seen by the controller.
pub trait DeepSleep {
    /// Attaches level-triggered (LOW) interrupts on the button and charger pins.
    fn arm_wake_sources(&mut self);

    /// Powers the MCU down (converter and brown-out detector off) until an interrupt fires.
    fn power_down(&mut self);

    /// Detaches both wake interrupts.
    fn disarm_wake_sources(&mut self);

    /// Whether the last return from [`power_down`](DeepSleep::power_down) was a real wake.
    ///
    /// The default treats every return as a wake.
    fn take_wake_event(&mut self) -> bool {
        true
    }
}

/// Single-slot flag set from interrupt context and consumed by the main loop.
#[cfg(feature = "wake-isr")]
pub struct WakeLatch {
    pending: Mutex<Cell<bool>>,
}

#[cfg(feature = "wake-isr")]
impl WakeLatch {
    /// An empty latch.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(false)),
        }
    }

    /// Records a wake. Safe to call from an ISR; repeated calls collapse into one.
    pub fn signal(&self) {
        critical_section::with(|cs| self.pending.borrow(cs).set(true));
    }

    /// Consumes the pending wake, if any.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).replace(false))
    }

    /// Whether a wake is pending, without consuming it.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }
}

#[cfg(feature = "wake-isr")]
impl core::fmt::Debug for WakeLatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WakeLatch")
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(feature = "wake-isr")]
impl Default for WakeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// The latch the wake ISRs signal.
#[cfg(feature = "wake-isr")]
pub static WAKE_LATCH: WakeLatch = WakeLatch::new();

/// Wake ISR body: call from both the button and charger external-interrupt handlers.
#[cfg(feature = "wake-isr")]
pub fn on_wake_interrupt() {
    WAKE_LATCH.signal();
}

/// Adapts a platform sleep so that only latched wakes count.
#[cfg(feature = "wake-isr")]
#[derive(Debug)]
pub struct LatchedSleep<S> {
    /// Platform power management.
    pub inner: S,
    latch: &'static WakeLatch,
}

#[cfg(feature = "wake-isr")]
impl<S: DeepSleep> LatchedSleep<S> {
    /// Wraps `inner`, reading wakes from `latch` (normally [`WAKE_LATCH`]).
    pub fn new(inner: S, latch: &'static WakeLatch) -> Self {
        Self { inner, latch }
    }
}

#[cfg(feature = "wake-isr")]
impl<S: DeepSleep> DeepSleep for LatchedSleep<S> {
    fn arm_wake_sources(&mut self) {
        // A wake left over from before this sleep must not end it.
        let _ = self.latch.take();
        self.inner.arm_wake_sources();
    }

    fn power_down(&mut self) {
        self.inner.power_down();
    }

    fn disarm_wake_sources(&mut self) {
        self.inner.disarm_wake_sources();
    }

    fn take_wake_event(&mut self) -> bool {
        self.latch.take()
    }
}

#[cfg(all(test, feature = "wake-isr"))]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Arm,
        PowerDown,
        Disarm,
    }

    /// Platform fake whose `power_down` signals `latch` on the listed calls only.
    struct Platform {
        calls: Vec<Call>,
        wake_on: Vec<bool>,
        latch: &'static WakeLatch,
    }

    impl DeepSleep for Platform {
        fn arm_wake_sources(&mut self) {
            self.calls.push(Call::Arm);
        }

        fn power_down(&mut self) {
            let n = self.calls.iter().filter(|c| **c == Call::PowerDown).count();
            self.calls.push(Call::PowerDown);
            if self.wake_on.get(n).copied().unwrap_or(true) {
                self.latch.signal();
            }
        }

        fn disarm_wake_sources(&mut self) {
            self.calls.push(Call::Disarm);
        }
    }

    #[test]
    fn test_latch_is_single_slot() {
        static LATCH: WakeLatch = WakeLatch::new();
        assert!(!LATCH.take());
        LATCH.signal();
        LATCH.signal();
        assert!(LATCH.is_pending());
        assert!(LATCH.take());
        assert!(!LATCH.take());
    }

    #[test]
    fn test_latched_sleep_reports_only_real_wakes() {
        static LATCH: WakeLatch = WakeLatch::new();
        let platform = Platform {
            calls: Vec::new(),
            wake_on: vec![false, true],
            latch: &LATCH,
        };
        let mut sleep = LatchedSleep::new(platform, &LATCH);

        sleep.power_down();
        assert!(!sleep.take_wake_event());
        sleep.power_down();
        assert!(sleep.take_wake_event());
        assert!(!sleep.take_wake_event());
    }

    #[test]
    fn test_arming_discards_stale_wake() {
        static LATCH: WakeLatch = WakeLatch::new();
        let platform = Platform {
            calls: Vec::new(),
            wake_on: Vec::new(),
            latch: &LATCH,
        };
        let mut sleep = LatchedSleep::new(platform, &LATCH);
        LATCH.signal();
        sleep.arm_wake_sources();
        assert!(!LATCH.is_pending());
        sleep.disarm_wake_sources();
        assert_eq!(sleep.inner.calls, vec![Call::Arm, Call::Disarm]);
    }

    #[test]
    fn test_global_isr_entry_point() {
        // Only this test touches the global latch.
        let _ = WAKE_LATCH.take();
        on_wake_interrupt();
        assert!(WAKE_LATCH.take());
    }
}
