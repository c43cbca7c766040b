//! Blocking RF packet transmitter.
//!
//! Drives the transmitter's data pin directly: HIGH keys the carrier, LOW releases it. A burst
//! is [`PACKET_REPEATS`] copies of the packet produced by
//! [`encode_packet`](crate::encoding::encode_packet), timed with an `embedded-hal` delay.
//!
//! ## Timing
//!
//! One burst takes roughly 450 ms of airtime and runs to completion; nothing in it yields.
//! Wake interrupts are detached while the fob is awake, so nothing preempts the waveform
//! either. If the platform has other interrupts enabled, their latency shows up as jitter on
//! the pulse that was active, which the receiver tolerates up to about `T/2`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::consts::PACKET_REPEATS;
use crate::encoding::{Level, Segment, encode_packet};
use crate::error::Error;
use crate::payload::Payload;

/// Owns the TX pin and plays packets on it.
#[derive(Debug)]
pub struct Transmitter<TX>
where
    TX: OutputPin,
{
    /// TX pin
    pub tx: TX,
    /// Number of bursts sent to completion.
    pub bursts_sent: u16,
}

impl<TX> Transmitter<TX>
where
    TX: OutputPin,
{
    /// Wraps the TX pin and drives it `LOW` (carrier off).
    pub fn new(tx: TX) -> Self {
        let mut tx = tx;
        let _ = tx.set_low();
        Self { tx, bursts_sent: 0 }
    }

    /// Sends `payload` [`PACKET_REPEATS`] times, then leaves the pin `LOW`.
    ///
    /// The pin is forced low even if a write fails midway; the first error is returned.
    pub fn send_burst<D: DelayNs>(
        &mut self,
        delay: &mut D,
        payload: &Payload,
    ) -> Result<(), Error> {
        let bits = payload.to_bits();
        trace!("tx burst: {:x}", bits);

        let mut result = Ok(());
        for _ in 0..PACKET_REPEATS {
            result = self.play(delay, encode_packet(bits));
            if result.is_err() {
                break;
            }
        }

        let idle = self.force_low();
        if result.is_ok() {
            self.bursts_sent = self.bursts_sent.wrapping_add(1);
        }
        result.and(idle)
    }

    /// Drives the pin `LOW`.
    pub fn force_low(&mut self) -> Result<(), Error> {
        self.tx.set_low().map_err(Error::pin)
    }

    fn play<D, I>(&mut self, delay: &mut D, segments: I) -> Result<(), Error>
    where
        D: DelayNs,
        I: IntoIterator<Item = Segment>,
    {
        for segment in segments {
            match segment.level {
                Level::High => self.tx.set_high(),
                Level::Low => self.tx.set_low(),
            }
            .map_err(Error::pin)?;
            delay.delay_us(segment.duration_us);
        }
        Ok(())
    }
}
