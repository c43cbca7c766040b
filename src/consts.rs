//! Factory constants for the keyfob.
//!
//! These are the build-time values the firmware ships with: device identity, analog
//! calibration, battery thresholds, indicator and activity timing, and the RF wire timing.
//! They are gathered into [`Config::DEFAULT`](crate::config::Config::DEFAULT); edit them here
//! and rebuild to provision a different fob.
//!
//! ## Wire timing
//!
//! Every RF duration is a multiple of the time unit [`TIME_UNIT_US`] (`T`):
//!
//! | Element             | Duration                  |
//! |---------------------|---------------------------|
//! | preamble cycle      | `T` low, `T` high, × 12   |
//! | sync gap            | `10·T` low                |
//! | `0` bit             | `2·T` high, `T` low       |
//! | `1` bit             | `T` high, `2·T` low       |
//! | inter-packet gap    | `39·T` low                |

/// Button 1 nibble.
pub const KEYFOB_BUTTON_1: u8 = 0b0100;
/// Button 2 nibble.
pub const KEYFOB_BUTTON_2: u8 = 0b0010;
/// Button 3 nibble.
pub const KEYFOB_BUTTON_3: u8 = 0b0001;
/// Button 4 nibble.
pub const KEYFOB_BUTTON_4: u8 = 0b1000;

/// Identifier this fob transmits. Only the low 28 bits are representable on the wire.
pub const KEYFOB_ID: u32 = 0x000_0000;

/// Largest identifier that fits the 28-bit ID field.
pub const KEYFOB_ID_MAX: u32 = (1 << 28) - 1;

/// Seed for the rolling-field generator.
pub const RANDOM_SEED: u32 = 1234;

/// Measured value of the internal ~1.1 V bandgap reference, in millivolts.
pub const VREF_ACTUAL_MV: u32 = 1101;

/// Full scale of the 10-bit converter used for the bandgap back-calculation.
pub const ADC_FULL_SCALE: u32 = 1024;

/// Time for the reference mux to settle before converting, in milliseconds.
pub const VCC_SETTLE_MS: u32 = 10;

/// At or above this supply voltage (mV) the green LED is lit.
pub const VCC_GREEN_THRESHOLD_MV: u32 = 3750;
/// At or above this supply voltage (mV) the yellow LED is lit.
pub const VCC_YELLOW_THRESHOLD_MV: u32 = 3600;
/// Below this supply voltage (mV) the battery is low and the red LED blinks.
pub const VCC_RED_THRESHOLD_MV: u32 = 3450;

/// Indicator refresh period while blinking on low battery, in milliseconds.
pub const CHARGE_BLINK_LOW_PERIOD_MS: u64 = 100;
/// Indicator refresh period while charging (and the default), in milliseconds.
pub const CHARGE_BLINK_CONNECTED_PERIOD_MS: u64 = 500;

/// How long the fob stays awake without activity before powering down, in milliseconds.
pub const TIME_AFTER_WAKE_UP_MS: u64 = 1000;

/// Minimum spacing of charger heartbeat transmit permits, in milliseconds.
pub const CHARGER_TX_INTERVAL_MS: u64 = 1000;

/// Protocol time unit `T`, in microseconds.
pub const TIME_UNIT_US: u32 = 413;

/// Number of (low, high) cycles in the preamble.
pub const PREAMBLE_CYCLES: usize = 12;

/// Length of the low sync gap between preamble and payload, in units of `T`.
pub const SYNC_GAP_UNITS: u32 = 10;

/// Length of the low gap after each packet, in units of `T`.
pub const PACKET_GAP_UNITS: u32 = 39;

/// Number of payload bits on the wire.
pub const PAYLOAD_BITS: usize = 64;

/// Number of trailing flag bits (battery OK, repeat) after the payload.
pub const FLAG_BITS: usize = 2;

/// Value sent in the trailing flag bits: both set.
pub const FLAGS_VALUE: u8 = 0b11;

/// Packets sent per transmit permit.
pub const PACKET_REPEATS: usize = 4;

/// Number of level segments in one encoded packet.
///
/// Two per preamble cycle, the sync gap, two per payload or flag bit, and the trailing gap.
pub const PACKET_SEGMENTS: usize = PREAMBLE_CYCLES * 2 + 1 + (PAYLOAD_BITS + FLAG_BITS) * 2 + 1;
