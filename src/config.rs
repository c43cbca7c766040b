//! Compile-time configuration.
//!
//! There is no runtime configuration surface: a [`Config`] is assembled from
//! [`consts`](crate::consts) at build time and checked once when the
//! [`Keyfob`](crate::controller::Keyfob) is constructed.

use crate::consts::*;
use crate::error::ConfigError;
use crate::payload::Button;

/// Battery voltage thresholds in millivolts. Must satisfy `red < yellow < green`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Thresholds {
    /// Below this the battery is low.
    pub red_mv: u32,
    /// Yellow LED level.
    pub yellow_mv: u32,
    /// Green LED level.
    pub green_mv: u32,
}

impl Thresholds {
    /// Factory thresholds.
    pub const DEFAULT: Thresholds = Thresholds {
        red_mv: VCC_RED_THRESHOLD_MV,
        yellow_mv: VCC_YELLOW_THRESHOLD_MV,
        green_mv: VCC_GREEN_THRESHOLD_MV,
    };
}

/// Everything the firmware needs to know that is fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Config {
    /// 28-bit identifier placed in every payload.
    pub device_id: u32,
    /// Button code this fob sends.
    pub button: Button,
    /// Calibrated bandgap voltage in millivolts.
    pub vref_mv: u32,
    /// LED thresholds.
    pub thresholds: Thresholds,
    /// Indicator refresh period while charging, and the default period.
    pub charging_blink_ms: u64,
    /// Indicator refresh period while blinking on low battery.
    pub low_blink_ms: u64,
    /// Inactivity window before sleeping.
    pub awake_window_ms: u64,
    /// Spacing of charger heartbeat permits.
    pub charger_tx_interval_ms: u64,
    /// Seed for the rolling-field generator.
    pub random_seed: u32,
    /// When set, a held permit is only spent while the button is pressed.
    pub transmit_requires_button: bool,
}

impl Config {
    /// The factory configuration.
    pub const DEFAULT: Config = Config {
        device_id: KEYFOB_ID,
        button: Button::One,
        vref_mv: VREF_ACTUAL_MV,
        thresholds: Thresholds::DEFAULT,
        charging_blink_ms: CHARGE_BLINK_CONNECTED_PERIOD_MS,
        low_blink_ms: CHARGE_BLINK_LOW_PERIOD_MS,
        awake_window_ms: TIME_AFTER_WAKE_UP_MS,
        charger_tx_interval_ms: CHARGER_TX_INTERVAL_MS,
        random_seed: RANDOM_SEED,
        transmit_requires_button: false,
    };

    /// Checks the invariants the rest of the firmware relies on.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id > KEYFOB_ID_MAX {
            return Err(ConfigError::IdOutOfRange(self.device_id));
        }
        let t = &self.thresholds;
        if !(t.red_mv < t.yellow_mv && t.yellow_mv < t.green_mv) {
            return Err(ConfigError::ThresholdOrder);
        }
        if self.vref_mv == 0 {
            return Err(ConfigError::ZeroReference);
        }
        if self.charging_blink_ms == 0 || self.low_blink_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// The factory constants must always be shippable.
const _: () = assert!(Config::DEFAULT.validate().is_ok());
