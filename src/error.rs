//! Error types.
//!
//! The keyfob is an open-loop device: nothing it sends is acknowledged, and the controller
//! never halts on a fault. These errors exist so that each component can report precisely what
//! went wrong; the [`controller`](crate::controller) logs them and carries on with the next
//! tick. Only construction of a [`Keyfob`](crate::controller::Keyfob) surfaces an error to the
//! caller.

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// Top-level error for hardware-facing operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// A GPIO read or write failed.
    #[error("pin error: {0:?}")]
    Pin(ErrorKind),
    /// The converter reported an error.
    #[error("adc error")]
    Adc,
    /// The bandgap conversion returned zero; the supply voltage cannot be derived.
    #[error("bandgap reading was zero")]
    ZeroReading,
    /// The configuration is not usable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A payload could not be built.
    #[error("invalid payload: {0}")]
    Payload(#[from] PayloadError),
}

impl Error {
    /// Maps any `embedded-hal` digital error into [`Error::Pin`].
    pub fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }
}

/// Reasons a [`Config`](crate::config::Config) is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ConfigError {
    /// The device ID does not fit into 28 bits.
    #[error("device id {0:#x} exceeds 28 bits")]
    IdOutOfRange(u32),
    /// Thresholds must satisfy red < yellow < green.
    #[error("voltage thresholds are not strictly ordered")]
    ThresholdOrder,
    /// The reference calibration must be non-zero.
    #[error("reference voltage is zero")]
    ZeroReference,
    /// A period or interval that must be positive is zero.
    #[error("timing constant is zero")]
    ZeroPeriod,
}

/// Reasons a 64-bit word is not a valid payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PayloadError {
    /// The device ID does not fit into 28 bits.
    #[error("device id {0:#x} exceeds 28 bits")]
    IdOutOfRange(u32),
    /// The button code is not a 4-bit value.
    #[error("button code {0:#x} exceeds 4 bits")]
    ButtonOutOfRange(u8),
    /// The two frame marker bytes are wrong.
    #[error("frame marker mismatch")]
    FrameMarker,
    /// The two copies of the button nibble disagree.
    #[error("button fields disagree")]
    ButtonMismatch,
    /// The two copies of the rolling byte disagree.
    #[error("rolling fields disagree")]
    RollingMismatch,
}

/// Reasons a captured waveform does not decode to a packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DecodeError {
    /// The waveform ended before all pulses were seen.
    #[error("waveform truncated")]
    Truncated,
    /// A preamble pulse was not one time unit wide.
    #[error("bad preamble pulse")]
    BadPreamble,
    /// The low gap between preamble and payload is missing or too short.
    #[error("missing sync gap")]
    MissingSyncGap,
    /// A data pulse is neither one nor two time units wide.
    #[error("bad data pulse of {0} us")]
    BadPulse(u32),
}
