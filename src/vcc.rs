//! Supply voltage measurement against the internal bandgap.
//!
//! The converter is referenced to the supply and made to sample the fixed ~1.1 V bandgap. The
//! lower the supply, the larger the reading, so the supply is back-calculated as
//!
//! ```text
//! vcc_mv = vref_actual_mv * 1024 / raw
//! ```
//!
//! where `vref_actual_mv` is the bandgap voltage measured on this particular part (see
//! [`calibration`](crate::calibration)).
//!
//! Switching the reference back afterwards takes a dummy conversion to settle, which
//! [`BandgapAdc::restore_default_reference`] is expected to perform.

use embedded_hal::delay::DelayNs;
use nb::block;

use crate::consts::{ADC_FULL_SCALE, VCC_SETTLE_MS};
use crate::error::Error;

/// The analog subsystem as seen by the voltage sampler.
///
/// Implementations wrap the MCU's converter registers. Errors are opaque to the firmware; any
/// error skips the current sample.
pub trait BandgapAdc {
    /// Converter error.
    type Error: core::fmt::Debug;

    /// Powers the converter up, e.g. after deep sleep turned it off.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// References the converter to the supply and selects the bandgap as input.
    fn select_bandgap(&mut self) -> Result<(), Self::Error>;

    /// Starts a single conversion.
    fn start_conversion(&mut self) -> Result<(), Self::Error>;

    /// Returns the 10-bit result, or `WouldBlock` while the conversion is running.
    fn read(&mut self) -> nb::Result<u16, Self::Error>;

    /// Restores the default reference and lets it settle for the next unrelated conversion.
    fn restore_default_reference(&mut self) -> Result<(), Self::Error>;

    /// Drives the bandgap onto the external reference pin so it can be measured.
    fn expose_reference(&mut self) -> Result<(), Self::Error>;
}

/// Converts a raw bandgap reading into supply millivolts.
///
/// Returns `None` for a zero reading, which carries no information.
pub const fn vcc_from_raw(raw: u16, vref_mv: u32) -> Option<u32> {
    if raw == 0 {
        return None;
    }
    Some(vref_mv * ADC_FULL_SCALE / raw as u32)
}

/// Measures the supply voltage in millivolts.
///
/// Selects the bandgap, waits [`VCC_SETTLE_MS`], converts, and restores the default reference.
/// The reference is restored even when the conversion fails.
pub fn sample_vcc<A, D>(adc: &mut A, delay: &mut D, vref_mv: u32) -> Result<u32, Error>
where
    A: BandgapAdc,
    D: DelayNs,
{
    adc.select_bandgap().map_err(|_| Error::Adc)?;
    delay.delay_ms(VCC_SETTLE_MS);

    let raw = adc
        .start_conversion()
        .map_err(|_| Error::Adc)
        .and_then(|()| block!(adc.read()).map_err(|_| Error::Adc));
    let restored = adc.restore_default_reference().map_err(|_| Error::Adc);

    let raw = raw?;
    restored?;
    vcc_from_raw(raw, vref_mv).ok_or(Error::ZeroReading)
}
