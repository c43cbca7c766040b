//! Rolling-field generator.
//!
//! Receivers of the emulated protocol only expect the rolling byte to change between presses,
//! not to be unpredictable. The generator is the Park–Miller "minimal standard" LCG
//! (`x' = 16807·x mod (2³¹ − 1)`, evaluated with Schrage's method so it never overflows 32 bits),
//! which is what the AVR C library's `random()` implements. Seeding it with the same value
//! therefore reproduces the exact rolling sequence of the stock firmware.

/// Substitute for a zero state, which would otherwise be a fixed point.
const ZERO_STATE_SUBSTITUTE: i32 = 123_459_876;

/// Exclusive upper bound of a rolling value (`0..=254`).
pub const ROLLING_RANGE: u32 = 0xFF;

/// Park–Miller minimal standard generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkMiller {
    state: u32,
}

impl ParkMiller {
    const MODULUS: i32 = 0x7FFF_FFFF;
    const MULTIPLIER: i32 = 16_807;
    const QUOTIENT: i32 = 127_773; // MODULUS / MULTIPLIER
    const REMAINDER: i32 = 2_836; // MODULUS % MULTIPLIER

    /// Creates a generator from a seed.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns the next value in `0..2³¹`.
    pub fn next_u31(&mut self) -> u32 {
        let mut x = (self.state & 0x7FFF_FFFF) as i32;
        if x == 0 {
            x = ZERO_STATE_SUBSTITUTE;
        }
        let hi = x / Self::QUOTIENT;
        let lo = x % Self::QUOTIENT;
        x = Self::MULTIPLIER * lo - Self::REMAINDER * hi;
        if x < 0 {
            x += Self::MODULUS;
        }
        self.state = x as u32;
        self.state
    }

    /// Returns a value in `0..bound`, or `0` if `bound` is zero.
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u31() % bound
    }

    /// Draws the next rolling byte.
    pub fn rolling(&mut self) -> u8 {
        self.below(ROLLING_RANGE) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_raw_value_matches_minimal_standard() {
        let mut rng = ParkMiller::new(1234);
        assert_eq!(rng.next_u31(), 16_807 * 1234);
    }

    #[test]
    fn test_rolling_sequence_for_factory_seed() {
        let mut rng = ParkMiller::new(crate::consts::RANDOM_SEED);
        let drawn = [
            rng.rolling(),
            rng.rolling(),
            rng.rolling(),
            rng.rolling(),
            rng.rolling(),
        ];
        assert_eq!(drawn, [178, 67, 108, 127, 166]);
    }

    #[test]
    fn test_zero_seed_does_not_stick() {
        let mut rng = ParkMiller::new(0);
        let first = rng.next_u31();
        assert_ne!(first, 0);
        assert_ne!(rng.next_u31(), first);
    }

    #[test]
    fn test_below_zero_bound() {
        let mut rng = ParkMiller::new(7);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn test_rolling_never_reaches_255() {
        let mut rng = ParkMiller::new(99);
        for _ in 0..10_000 {
            assert!(rng.rolling() < 255);
        }
    }
}
