//! Three-LED battery indicator.
//!
//! [`BatteryIndicator`] decides what the red, yellow and green LEDs show; [`LedBank`] owns the
//! pins and applies its decisions. The split keeps the display logic free of hardware so it can
//! be checked exhaustively.
//!
//! ## Modes
//!
//! | Condition                      | Period | Display |
//! |--------------------------------|--------|---------|
//! | charging                       | 500 ms | "filling" blink: all qualifying LEDs on, then the highest off |
//! | not charging, `v >= red`       | 500 ms | steady: red, plus yellow if `v >= yellow`, plus green if `v >= green` |
//! | not charging, `v < red`        | 100 ms | red blinks, yellow and green off |
//!
//! While charging the levels compare with `>`; while not charging with `>=`. A supply sitting
//! exactly on a threshold therefore shows one LED fewer on the charger than off it. This matches
//! the shipped firmware and is kept pending product review.
//!
//! The blink phase is shared by the charging and low-battery modes. It starts unlit, so the
//! first charging refresh turns the highest LED off and the first low-battery refresh turns red
//! off.

use embedded_hal::digital::OutputPin;

use crate::config::Thresholds;
use crate::error::Error;
use crate::timer::Stopwatch;

/// What to do with one LED on a refresh. `None` leaves it as it is.
pub type LedCommand = Option<bool>;

/// Commands for all three LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LedUpdate {
    /// Red LED.
    pub red: LedCommand,
    /// Yellow LED.
    pub yellow: LedCommand,
    /// Green LED.
    pub green: LedCommand,
}

impl LedUpdate {
    const fn set(red: bool, yellow: bool, green: bool) -> Self {
        Self {
            red: Some(red),
            yellow: Some(yellow),
            green: Some(green),
        }
    }
}

/// Which display the last refresh produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DisplayMode {
    /// Charger connected, filling blink.
    Charging,
    /// On battery, level shown steadily.
    Steady,
    /// On battery below the red threshold, red blinking.
    LowBattery,
}

/// Display state machine.
#[derive(Debug, Clone)]
pub struct BatteryIndicator {
    thresholds: Thresholds,
    default_period_ms: u64,
    low_period_ms: u64,
    period_ms: u64,
    lit: bool,
    last_refresh: Option<Stopwatch>,
    mode: Option<DisplayMode>,
}

impl BatteryIndicator {
    /// Creates an indicator that refreshes immediately on the first check.
    pub const fn new(thresholds: Thresholds, default_period_ms: u64, low_period_ms: u64) -> Self {
        Self {
            thresholds,
            default_period_ms,
            low_period_ms,
            period_ms: default_period_ms,
            lit: false,
            last_refresh: None,
            mode: None,
        }
    }

    /// Current refresh period.
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Current blink phase; `true` means the next blink step lights.
    pub const fn lit(&self) -> bool {
        self.lit
    }

    /// Mode of the last successful refresh.
    pub const fn mode(&self) -> Option<DisplayMode> {
        self.mode
    }

    /// Whether a refresh is due at `now`.
    pub fn is_due(&self, now: u64) -> bool {
        match &self.last_refresh {
            Some(sw) => sw.has_elapsed(now, self.period_ms),
            None => true,
        }
    }

    /// Computes the display for supply voltage `vcc_mv` and restarts the refresh period at `now`.
    pub fn update(&mut self, now: u64, vcc_mv: u32, charging: bool) -> LedUpdate {
        let update = if charging {
            self.charging(vcc_mv)
        } else if vcc_mv >= self.thresholds.red_mv {
            self.steady(vcc_mv)
        } else {
            self.low_battery()
        };
        self.last_refresh = Some(Stopwatch::started_at(now));
        update
    }

    /// Restarts the refresh period without changing the display, after an unusable sample.
    pub fn skip(&mut self, now: u64) {
        self.last_refresh = Some(Stopwatch::started_at(now));
    }

    /// Makes the next check due immediately. Mode and blink phase are kept.
    pub fn restart(&mut self) {
        self.last_refresh = None;
    }

    fn charging(&mut self, vcc: u32) -> LedUpdate {
        let t = self.thresholds;
        self.period_ms = self.default_period_ms;
        self.mode = Some(DisplayMode::Charging);

        let update = if self.lit {
            LedUpdate::set(true, vcc > t.red_mv, vcc > t.yellow_mv)
        } else if vcc > t.yellow_mv {
            LedUpdate {
                green: Some(false),
                ..LedUpdate::default()
            }
        } else if vcc > t.red_mv {
            LedUpdate {
                yellow: Some(false),
                ..LedUpdate::default()
            }
        } else {
            LedUpdate {
                red: Some(false),
                ..LedUpdate::default()
            }
        };
        self.lit = !self.lit;
        update
    }

    fn steady(&mut self, vcc: u32) -> LedUpdate {
        let t = self.thresholds;
        self.period_ms = self.default_period_ms;
        self.mode = Some(DisplayMode::Steady);
        LedUpdate::set(true, vcc >= t.yellow_mv, vcc >= t.green_mv)
    }

    fn low_battery(&mut self) -> LedUpdate {
        self.period_ms = self.low_period_ms;
        self.mode = Some(DisplayMode::LowBattery);
        let update = LedUpdate::set(self.lit, false, false);
        self.lit = !self.lit;
        update
    }
}

/// Owns the three LED pins.
#[derive(Debug)]
pub struct LedBank<R, Y, G>
where
    R: OutputPin,
    Y: OutputPin,
    G: OutputPin,
{
    /// Red LED pin
    pub red: R,
    /// Yellow LED pin
    pub yellow: Y,
    /// Green LED pin
    pub green: G,
}

fn drive<P: OutputPin>(pin: &mut P, command: LedCommand) -> Result<(), Error> {
    match command {
        Some(true) => pin.set_high().map_err(Error::pin),
        Some(false) => pin.set_low().map_err(Error::pin),
        None => Ok(()),
    }
}

impl<R, Y, G> LedBank<R, Y, G>
where
    R: OutputPin,
    Y: OutputPin,
    G: OutputPin,
{
    /// Wraps the three pins. Their state is left untouched.
    pub fn new(red: R, yellow: Y, green: G) -> Self {
        Self { red, yellow, green }
    }

    /// Applies an update in red, yellow, green order.
    pub fn apply(&mut self, update: LedUpdate) -> Result<(), Error> {
        drive(&mut self.red, update.red)?;
        drive(&mut self.yellow, update.yellow)?;
        drive(&mut self.green, update.green)
    }

    /// Turns every LED off, attempting all three even if one fails.
    pub fn all_off(&mut self) -> Result<(), Error> {
        let red = self.red.set_low().map_err(Error::pin);
        let yellow = self.yellow.set_low().map_err(Error::pin);
        let green = self.green.set_low().map_err(Error::pin);
        red.and(yellow).and(green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn indicator() -> BatteryIndicator {
        BatteryIndicator::new(Thresholds::DEFAULT, 500, 100)
    }

    fn leds(update: LedUpdate) -> (bool, bool, bool) {
        (
            update.red.unwrap(),
            update.yellow.unwrap(),
            update.green.unwrap(),
        )
    }

    #[test]
    fn test_first_check_is_due() {
        let ind = indicator();
        assert!(ind.is_due(0));
        assert_eq!(ind.period_ms(), Config::DEFAULT.charging_blink_ms);
        assert_eq!(ind.mode(), None);
    }

    #[test]
    fn test_steady_levels() {
        let cases = [
            (4200, (true, true, true)),
            (3750, (true, true, true)),
            (3749, (true, true, false)),
            (3600, (true, true, false)),
            (3599, (true, false, false)),
            (3500, (true, false, false)),
            (3450, (true, false, false)),
        ];
        for (mv, expected) in cases {
            let mut ind = indicator();
            let update = ind.update(0, mv, false);
            assert_eq!(leds(update), expected, "at {mv} mV");
            assert_eq!(ind.mode(), Some(DisplayMode::Steady));
            assert_eq!(ind.period_ms(), 500);
        }
    }

    #[test]
    fn test_steady_does_not_blink() {
        let mut ind = indicator();
        let first = ind.update(0, 3500, false);
        let second = ind.update(500, 3500, false);
        assert_eq!(first, second);
        assert_eq!(leds(first), (true, false, false));
    }

    #[test]
    fn test_low_battery_blinks_red() {
        let mut ind = indicator();
        let first = ind.update(0, 3449, false);
        assert_eq!(leds(first), (false, false, false));
        assert_eq!(ind.period_ms(), 100);
        assert_eq!(ind.mode(), Some(DisplayMode::LowBattery));
        assert!(!ind.is_due(99));
        assert!(ind.is_due(100));

        let second = ind.update(100, 3449, false);
        assert_eq!(leds(second), (true, false, false));
        let third = ind.update(200, 3449, false);
        assert_eq!(leds(third), (false, false, false));
    }

    #[test]
    fn test_charging_fill_then_drain() {
        let mut ind = indicator();
        // Phase starts unlit: the first charging refresh drains.
        let drain = ind.update(0, 3800, true);
        assert_eq!(
            drain,
            LedUpdate {
                green: Some(false),
                ..LedUpdate::default()
            }
        );
        let fill = ind.update(500, 3800, true);
        assert_eq!(leds(fill), (true, true, true));
        let drain = ind.update(1000, 3800, true);
        assert_eq!(drain.green, Some(false));
        assert_eq!(drain.red, None);
        assert_eq!(drain.yellow, None);
        assert_eq!(ind.mode(), Some(DisplayMode::Charging));
        assert_eq!(ind.period_ms(), 500);
    }

    #[test]
    fn test_charging_uses_strict_comparisons() {
        let mut ind = indicator();
        let _ = ind.update(0, 3600, true);
        // Exactly on the yellow threshold: yellow lit, green not.
        assert_eq!(leds(ind.update(500, 3600, true)), (true, true, false));
        assert_eq!(ind.update(1000, 3600, true).yellow, Some(false));

        let mut ind = indicator();
        let _ = ind.update(0, 3450, true);
        assert_eq!(leds(ind.update(500, 3450, true)), (true, false, false));
        assert_eq!(ind.update(1000, 3450, true).red, Some(false));

        // Off the charger the same voltage lights one more LED.
        let mut ind = indicator();
        assert_eq!(leds(ind.update(0, 3600, false)), (true, true, false));
        assert_eq!(leds(ind.update(500, 3750, false)), (true, true, true));
    }

    #[test]
    fn test_charger_connect_restores_period() {
        let mut ind = indicator();
        let _ = ind.update(0, 3300, false);
        assert_eq!(ind.period_ms(), 100);
        let _ = ind.update(100, 3300, true);
        assert_eq!(ind.period_ms(), 500);
        let _ = ind.update(600, 3300, false);
        let _ = ind.update(700, 3500, false);
        assert_eq!(ind.period_ms(), 500);
    }

    #[test]
    fn test_skip_restarts_period_only() {
        let mut ind = indicator();
        ind.skip(10);
        assert!(!ind.is_due(509));
        assert!(ind.is_due(510));
        assert_eq!(ind.mode(), None);
        assert!(!ind.lit());
    }

    #[test]
    fn test_restart_makes_refresh_due() {
        let mut ind = indicator();
        let _ = ind.update(0, 3300, false);
        assert!(!ind.is_due(50));
        ind.restart();
        assert!(ind.is_due(50));
        assert_eq!(ind.mode(), Some(DisplayMode::LowBattery));
        assert!(ind.lit());
    }

    #[test]
    fn test_led_bank_apply() {
        let red = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let yellow = PinMock::new(&[]);
        let green = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut bank = LedBank::new(red, yellow, green);
        bank.apply(LedUpdate {
            red: Some(true),
            yellow: None,
            green: Some(false),
        })
        .unwrap();
        bank.red.done();
        bank.yellow.done();
        bank.green.done();
    }

    #[test]
    fn test_led_bank_all_off() {
        let red = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let yellow = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let green = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut bank = LedBank::new(red, yellow, green);
        bank.all_off().unwrap();
        bank.red.done();
        bank.yellow.done();
        bank.green.done();
    }
}
