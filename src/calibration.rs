//! Bandgap reference calibration.
//!
//! The internal bandgap is nominally 1.1 V but varies from part to part, and every supply
//! reading scales with it. To calibrate a unit, flash it with [`RunMode::ReferenceCalibration`],
//! measure the voltage on the AREF pin with a multimeter, and put that value (in millivolts)
//! into [`Config::vref_mv`](crate::config::Config::vref_mv).
//!
//! In calibration mode the firmware never enters the normal loop. The board code calls
//! [`expose_reference`] once and then idles.

use embedded_hal::delay::DelayNs;
use nb::block;

use crate::consts::VCC_SETTLE_MS;
use crate::error::Error;
use crate::vcc::BandgapAdc;

/// What the firmware does after reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RunMode {
    /// Keyfob operation.
    #[default]
    Normal,
    /// Route the bandgap to AREF and stay there for measurement.
    ReferenceCalibration,
}

impl RunMode {
    /// Whether the keyfob loop should run.
    pub const fn is_normal(self) -> bool {
        matches!(self, RunMode::Normal)
    }
}

/// Drives the bandgap onto the reference pin and performs one conversion so the reference
/// output is live.
///
/// Returns the raw reading of that conversion. It carries no calibration information by
/// itself; the value to record is what the meter shows on AREF.
pub fn expose_reference<A, D>(adc: &mut A, delay: &mut D) -> Result<u16, Error>
where
    A: BandgapAdc,
    D: DelayNs,
{
    adc.expose_reference().map_err(|_| Error::Adc)?;
    delay.delay_ms(VCC_SETTLE_MS);
    adc.start_conversion().map_err(|_| Error::Adc)?;
    let raw = block!(adc.read()).map_err(|_| Error::Adc)?;
    info!("bandgap on AREF, measure it now (raw {})", raw);
    Ok(raw)
}
