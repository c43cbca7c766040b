//! The 64-bit keyfob payload.
//!
//! ## Layout
//!
//! Bits are numbered from the least significant; the word is sent most significant bit first.
//!
//! | Bits    | Content                                  |
//! |---------|------------------------------------------|
//! | 56–63   | frame marker `0x20`                      |
//! | 52–55   | frame marker `0x2` (high nibble of byte 6) |
//! | 48–51   | button nibble (copy)                     |
//! | 40–47   | rolling byte (copy)                      |
//! | 32–39   | rolling byte                             |
//! | 4–31    | 28-bit device identifier                 |
//! | 0–3     | button nibble                            |
//!
//! Two flag bits (battery OK, repeat) follow the word on the wire; they are not part of the
//! payload and are always sent as `1`.

use crate::consts::{
    KEYFOB_BUTTON_1, KEYFOB_BUTTON_2, KEYFOB_BUTTON_3, KEYFOB_BUTTON_4, KEYFOB_ID_MAX,
};
use crate::error::PayloadError;

/// Fixed frame marker bits.
pub const FRAME_MARKER: u64 = 0x2020_0000_0000_0000;

/// Mask covering the frame marker nibbles in bytes 7 and 6.
const FRAME_MASK: u64 = 0xFFF0_0000_0000_0000;

/// Multiplying a nibble by this places it at bits 0–3 and 48–51.
const BUTTON_SPREAD: u64 = 0x0001_0000_0000_0001;

/// Multiplying a byte by this places it into two adjacent bytes.
const ROLLING_SPREAD: u64 = 0x101;

const ROLLING_SHIFT: u32 = 32;
const ID_SHIFT: u32 = 4;

/// The four buttons of the emulated fob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Button {
    /// `0b0100`
    #[default]
    One,
    /// `0b0010`
    Two,
    /// `0b0001`
    Three,
    /// `0b1000`
    Four,
}

impl Button {
    /// The nibble transmitted for this button.
    pub const fn code(self) -> u8 {
        match self {
            Button::One => KEYFOB_BUTTON_1,
            Button::Two => KEYFOB_BUTTON_2,
            Button::Three => KEYFOB_BUTTON_3,
            Button::Four => KEYFOB_BUTTON_4,
        }
    }

    /// Looks a nibble up, if it belongs to a known button.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            KEYFOB_BUTTON_1 => Some(Button::One),
            KEYFOB_BUTTON_2 => Some(Button::Two),
            KEYFOB_BUTTON_3 => Some(Button::Three),
            KEYFOB_BUTTON_4 => Some(Button::Four),
            _ => None,
        }
    }
}

/// One transmission's worth of data, before serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Payload {
    button: u8,
    device_id: u32,
    rolling: u8,
}

impl Payload {
    /// Builds a payload, checking that `button` is a nibble and `device_id` fits 28 bits.
    ///
    /// Any nibble is accepted so that codes outside the four stock buttons can be emulated.
    pub const fn new(button: u8, device_id: u32, rolling: u8) -> Result<Self, PayloadError> {
        if button > 0x0F {
            return Err(PayloadError::ButtonOutOfRange(button));
        }
        if device_id > KEYFOB_ID_MAX {
            return Err(PayloadError::IdOutOfRange(device_id));
        }
        Ok(Self {
            button,
            device_id,
            rolling,
        })
    }

    /// Builds a payload for one of the stock buttons.
    pub const fn for_button(
        button: Button,
        device_id: u32,
        rolling: u8,
    ) -> Result<Self, PayloadError> {
        Self::new(button.code(), device_id, rolling)
    }

    /// Button nibble.
    pub const fn button(&self) -> u8 {
        self.button
    }

    /// 28-bit device identifier.
    pub const fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Rolling byte.
    pub const fn rolling(&self) -> u8 {
        self.rolling
    }

    /// Serializes into the 64-bit wire word.
    pub const fn to_bits(&self) -> u64 {
        FRAME_MARKER
            | BUTTON_SPREAD * self.button as u64
            | (self.rolling as u64 * ROLLING_SPREAD) << ROLLING_SHIFT
            | (self.device_id as u64) << ID_SHIFT
    }

    /// Parses a wire word, checking the frame marker and both duplicated fields.
    pub const fn from_bits(bits: u64) -> Result<Self, PayloadError> {
        if bits & FRAME_MASK != FRAME_MARKER {
            return Err(PayloadError::FrameMarker);
        }
        let button_lo = (bits & 0x0F) as u8;
        let button_hi = ((bits >> 48) & 0x0F) as u8;
        if button_lo != button_hi {
            return Err(PayloadError::ButtonMismatch);
        }
        let rolling_lo = ((bits >> ROLLING_SHIFT) & 0xFF) as u8;
        let rolling_hi = ((bits >> (ROLLING_SHIFT + 8)) & 0xFF) as u8;
        if rolling_lo != rolling_hi {
            return Err(PayloadError::RollingMismatch);
        }
        let device_id = ((bits >> ID_SHIFT) as u32) & KEYFOB_ID_MAX;
        Ok(Self {
            button: button_lo,
            device_id,
            rolling: rolling_lo,
        })
    }
}

impl From<Payload> for u64 {
    fn from(payload: Payload) -> u64 {
        payload.to_bits()
    }
}

impl TryFrom<u64> for Payload {
    type Error = PayloadError;

    fn try_from(bits: u64) -> Result<Self, Self::Error> {
        Payload::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_word() {
        let payload = Payload::for_button(Button::One, 0x123_4567, 0xAB).unwrap();
        assert_eq!(payload.to_bits(), 0x2024_ABAB_1234_5674);
    }

    #[test]
    fn test_factory_word_with_zero_id() {
        let payload = Payload::for_button(Button::One, 0, 178).unwrap();
        assert_eq!(payload.to_bits(), 0x2024_B2B2_0000_0004);
    }

    #[test]
    fn test_button_fields_agree_for_every_nibble() {
        for code in 0..=0x0F {
            let bits = Payload::new(code, 0xFFF_FFFF, 0x5A).unwrap().to_bits();
            assert_eq!(bits & 0x0F, code as u64);
            assert_eq!((bits >> 48) & 0x0F, code as u64);
        }
    }

    #[test]
    fn test_roundtrip_over_buttons_and_ids() {
        let ids = [0, 1, 0x0ABC_DEF, 0x800_0000, KEYFOB_ID_MAX];
        for button in [Button::One, Button::Two, Button::Three, Button::Four] {
            for &id in &ids {
                for rolling in [0, 0x7F, 0xFE] {
                    let payload = Payload::for_button(button, id, rolling).unwrap();
                    assert_eq!(Payload::from_bits(payload.to_bits()), Ok(payload));
                }
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        assert_eq!(
            Payload::new(0x10, 0, 0),
            Err(PayloadError::ButtonOutOfRange(0x10))
        );
        assert_eq!(
            Payload::new(1, 0x1000_0000, 0),
            Err(PayloadError::IdOutOfRange(0x1000_0000))
        );
    }

    #[test]
    fn test_from_bits_detects_corruption() {
        let bits = Payload::for_button(Button::Two, 0x42, 9).unwrap().to_bits();
        assert_eq!(
            Payload::from_bits(bits ^ (1 << 61)),
            Err(PayloadError::FrameMarker)
        );
        assert_eq!(
            Payload::from_bits(bits ^ 0x1),
            Err(PayloadError::ButtonMismatch)
        );
        assert_eq!(
            Payload::from_bits(bits ^ (1 << 40)),
            Err(PayloadError::RollingMismatch)
        );
    }

    #[test]
    fn test_button_codes() {
        assert_eq!(Button::One.code(), 0b0100);
        assert_eq!(Button::Two.code(), 0b0010);
        assert_eq!(Button::Three.code(), 0b0001);
        assert_eq!(Button::Four.code(), 0b1000);
        assert_eq!(Button::from_code(0b1000), Some(Button::Four));
        assert_eq!(Button::from_code(0b0011), None);
    }
}
