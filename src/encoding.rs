//! Inverse-width OOK waveform encoding and decoding.
//!
//! A packet is rendered as a flat list of [`Segment`]s, each a pin level held for a duration.
//! The [`transmitter`](crate::transmitter) plays them back verbatim, so everything about the
//! wire format lives here and can be checked without hardware.
//!
//! ## Bit encoding
//!
//! The width of the HIGH pulse carries the bit, and every bit spans `3·T`:
//!
//! - `0` → HIGH `2·T`, LOW `T`
//! - `1` → HIGH `T`, LOW `2·T`
//!
//! ## Packet
//!
//! ```text
//! preamble (12 × LOW T, HIGH T) | LOW 10T | 64 payload bits | 2 flag bits | LOW 39T
//! ```
//!
//! ## Decoding
//!
//! [`decode_packet`] merges adjacent segments of the same level, so it accepts both the exact
//! encoder output and an edge capture from a logic analyzer. It classifies each data pulse by
//! comparing its HIGH width against `1.5·T`.

use core::iter::once;

use heapless::Vec;

use crate::consts::{
    FLAG_BITS, FLAGS_VALUE, PACKET_GAP_UNITS, PACKET_SEGMENTS, PAYLOAD_BITS, PREAMBLE_CYCLES,
    SYNC_GAP_UNITS, TIME_UNIT_US,
};
use crate::error::DecodeError;

/// Logic level of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Level {
    /// Carrier off.
    Low,
    /// Carrier on.
    High,
}

/// A pin level held for a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Segment {
    /// Level to drive.
    pub level: Level,
    /// How long to hold it, in microseconds.
    pub duration_us: u32,
}

impl Segment {
    /// A LOW segment of `units` time units.
    pub const fn low(units: u32) -> Self {
        Self {
            level: Level::Low,
            duration_us: units * TIME_UNIT_US,
        }
    }

    /// A HIGH segment of `units` time units.
    pub const fn high(units: u32) -> Self {
        Self {
            level: Level::High,
            duration_us: units * TIME_UNIT_US,
        }
    }
}

/// Buffer for one whole packet, e.g. a receiver's capture handed to [`decode_packet`].
pub type Packet = Vec<Segment, PACKET_SEGMENTS>;

/// Returns the two segments encoding one bit.
pub const fn encode_bit(bit: bool) -> [Segment; 2] {
    if bit {
        [Segment::high(1), Segment::low(2)]
    } else {
        [Segment::high(2), Segment::low(1)]
    }
}

/// Renders one packet carrying `payload` followed by the two fixed flag bits.
///
/// Segments are produced lazily from `payload`, so playing a packet never buffers the whole
/// waveform. Collect into a [`Packet`] where random access is needed.
pub fn encode_packet(payload: u64) -> impl Iterator<Item = Segment> + Clone {
    let preamble = (0..PREAMBLE_CYCLES).flat_map(|_| [Segment::low(1), Segment::high(1)]);
    let payload_bits = (0..PAYLOAD_BITS)
        .rev()
        .map(move |i| payload & (1u64 << i) != 0);
    let flag_bits = (0..FLAG_BITS).rev().map(|i| FLAGS_VALUE & (1u8 << i) != 0);

    preamble
        .chain(once(Segment::low(SYNC_GAP_UNITS)))
        .chain(payload_bits.chain(flag_bits).flat_map(encode_bit))
        .chain(once(Segment::low(PACKET_GAP_UNITS)))
}

/// Total airtime of `segments` in microseconds.
pub fn packet_duration_us<I>(segments: I) -> u32
where
    I: IntoIterator<Item = Segment>,
{
    segments.into_iter().map(|s| s.duration_us).sum()
}

/// A packet recovered from a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct DecodedPacket {
    /// The 64 payload bits.
    pub payload: u64,
    /// The trailing flag bits, first-sent in bit 1.
    pub flags: u8,
}

/// Iterates over runs of equal level, merging adjacent segments.
struct Runs<'a> {
    segments: &'a [Segment],
}

impl Iterator for Runs<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let (first, rest) = self.segments.split_first()?;
        let mut run = *first;
        let mut taken = 0;
        for s in rest.iter().take_while(|s| s.level == run.level) {
            run.duration_us += s.duration_us;
            taken += 1;
        }
        self.segments = &rest[taken..];
        Some(run)
    }
}

fn next_high(runs: &mut impl Iterator<Item = Segment>) -> Result<u32, DecodeError> {
    match runs.next() {
        Some(r) if r.level == Level::High => Ok(r.duration_us),
        _ => Err(DecodeError::Truncated),
    }
}

fn next_low(runs: &mut impl Iterator<Item = Segment>) -> Result<u32, DecodeError> {
    match runs.next() {
        Some(r) if r.level == Level::Low => Ok(r.duration_us),
        _ => Err(DecodeError::Truncated),
    }
}

/// Recovers payload and flags from a packet waveform.
///
/// Leading LOW time before the first preamble pulse is ignored. Trailing segments after the
/// last flag bit are ignored, so a capture of several repeated packets decodes to the first.
pub fn decode_packet(segments: &[Segment]) -> Result<DecodedPacket, DecodeError> {
    let t = TIME_UNIT_US;
    let mut runs = Runs { segments }.skip_while(|r| r.level == Level::Low);

    for cycle in 0..PREAMBLE_CYCLES {
        let width = next_high(&mut runs)?;
        if width < t / 2 || width > t + t / 2 {
            return Err(DecodeError::BadPreamble);
        }
        let gap = next_low(&mut runs)?;
        let last = cycle + 1 == PREAMBLE_CYCLES;
        if last {
            if gap < SYNC_GAP_UNITS * t / 2 {
                return Err(DecodeError::MissingSyncGap);
            }
        } else if gap > t + t / 2 {
            return Err(DecodeError::BadPreamble);
        }
    }

    let mut word: u128 = 0;
    let total = PAYLOAD_BITS + FLAG_BITS;
    for i in 0..total {
        let width = next_high(&mut runs)?;
        let bit = match width {
            w if w < t / 2 || w > 2 * t + t / 2 => return Err(DecodeError::BadPulse(w)),
            w if w < t + t / 2 => 1,
            _ => 0,
        };
        word = (word << 1) | bit;
        // The LOW after the last bit merges with the packet gap and may be cut off.
        if i + 1 < total {
            let _ = next_low(&mut runs)?;
        }
    }

    Ok(DecodedPacket {
        payload: (word >> FLAG_BITS) as u64,
        flags: (word & ((1 << FLAG_BITS) - 1)) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Button, Payload};

    #[test]
    fn test_packet_shape() {
        let packet: Packet = encode_packet(0).collect();
        assert_eq!(packet.len(), PACKET_SEGMENTS);
        assert_eq!(packet[0], Segment::low(1));
        assert_eq!(packet[1], Segment::high(1));
        assert_eq!(packet[24], Segment::low(10));
        assert_eq!(packet[25], Segment::high(2)); // MSB of a zero payload
        assert_eq!(*packet.last().unwrap(), Segment::low(39));
        // The two flag bits are ones.
        assert_eq!(packet[PACKET_SEGMENTS - 5], Segment::high(1));
        assert_eq!(packet[PACKET_SEGMENTS - 3], Segment::high(1));
    }

    #[test]
    fn test_encoder_streams_without_buffering() {
        assert_eq!(encode_packet(0).count(), PACKET_SEGMENTS);
        assert_eq!(encode_packet(u64::MAX).count(), PACKET_SEGMENTS);
        assert!(size_of_val(&encode_packet(0)) < size_of::<Packet>() / 2);
        let streamed: Packet = encode_packet(0x2024_ABAB_1234_5674).collect();
        assert!(streamed.iter().copied().eq(encode_packet(0x2024_ABAB_1234_5674)));
    }

    #[test]
    fn test_bit_widths() {
        assert_eq!(encode_bit(false), [Segment::high(2), Segment::low(1)]);
        assert_eq!(encode_bit(true), [Segment::high(1), Segment::low(2)]);
        assert_eq!(encode_bit(false)[0].duration_us, 826);
        assert_eq!(encode_bit(true)[1].duration_us, 826);
    }

    #[test]
    fn test_packet_duration() {
        // 24T preamble + 10T gap + 66 * 3T bits + 39T gap
        let expected = (24 + 10 + 66 * 3 + 39) * TIME_UNIT_US;
        assert_eq!(packet_duration_us(encode_packet(u64::MAX)), expected);
    }

    #[test]
    fn test_roundtrip_through_waveform() {
        for button in [Button::One, Button::Two, Button::Three, Button::Four] {
            for id in [0, 0x0AB_CDEF, 0xFFF_FFFF] {
                let payload = Payload::for_button(button, id, 0x3C).unwrap();
                let packet: Packet = encode_packet(payload.to_bits()).collect();
                let decoded = decode_packet(&packet).unwrap();
                assert_eq!(decoded.payload, payload.to_bits());
                assert_eq!(decoded.flags, FLAGS_VALUE);
                assert_eq!(Payload::from_bits(decoded.payload), Ok(payload));
            }
        }
    }

    #[test]
    fn test_decode_tolerates_jitter() {
        let bits = 0x2024_ABAB_1234_5674;
        let mut packet: Packet = encode_packet(bits).collect();
        for (i, s) in packet.iter_mut().enumerate() {
            if i % 3 == 0 {
                s.duration_us += 60;
            } else if i % 3 == 1 {
                s.duration_us -= 60;
            }
        }
        assert_eq!(decode_packet(&packet).unwrap().payload, bits);
    }

    #[test]
    fn test_decode_first_of_repeated_packets() {
        let mut capture: std::vec::Vec<Segment> = std::vec::Vec::new();
        capture.extend(encode_packet(0x2020_0000_0000_0000));
        capture.extend(encode_packet(u64::MAX));
        assert_eq!(
            decode_packet(&capture).unwrap().payload,
            0x2020_0000_0000_0000
        );
    }

    #[test]
    fn test_decode_truncated() {
        let packet: Packet = encode_packet(0x1234).collect();
        assert_eq!(decode_packet(&packet[..60]), Err(DecodeError::Truncated));
        assert_eq!(decode_packet(&[]), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_decode_bad_preamble_and_gap() {
        let mut packet: Packet = encode_packet(0).collect();
        packet[3] = Segment::high(3);
        assert_eq!(decode_packet(&packet), Err(DecodeError::BadPreamble));

        let mut packet: Packet = encode_packet(0).collect();
        packet[24] = Segment::low(2);
        assert_eq!(decode_packet(&packet), Err(DecodeError::MissingSyncGap));
    }

    #[test]
    fn test_decode_bad_pulse() {
        let mut packet: Packet = encode_packet(0).collect();
        packet[25] = Segment::high(4);
        assert_eq!(
            decode_packet(&packet),
            Err(DecodeError::BadPulse(4 * TIME_UNIT_US))
        );
    }
}
