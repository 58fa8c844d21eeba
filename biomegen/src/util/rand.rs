//! Java-compatible linear congruential generator, used to derive field seeds and octave
//! permutations so that a world seed always expands to the same noise fields.

use std::num::Wrapping;

use glam::DVec3;


const MULTIPLIER: Wrapping<i64> = Wrapping(0x5DEECE66D);
const ADDEND: Wrapping<i64> = Wrapping(0xB);
const MASK: Wrapping<i64> = Wrapping((1 << 48) - 1);

const DOUBLE_DIV: f64 = (1u64 << 53) as f64;


#[inline]
fn initial_scramble(seed: i64) -> Wrapping<i64> {
    (Wrapping(seed) ^ MULTIPLIER) & MASK
}


/// A pseudo-random number generator with the same constants and output sequence as
/// `java.util.Random`.
#[derive(Debug, Clone)]
pub struct JavaRandom {
    seed: Wrapping<i64>
}

impl JavaRandom {

    #[inline]
    pub fn new(seed: i64) -> JavaRandom {
        JavaRandom { seed: initial_scramble(seed) }
    }

    #[inline]
    pub fn set_seed(&mut self, seed: i64) {
        self.seed = initial_scramble(seed);
    }

    #[inline]
    fn next(&mut self, bits: u8) -> i32 {
        self.seed = (self.seed * MULTIPLIER + ADDEND) & MASK;
        (self.seed.0 as u64 >> (48 - bits)) as i32
    }

    #[inline]
    pub fn next_int(&mut self) -> i32 {
        self.next(32)
    }

    pub fn next_int_bounded(&mut self, bound: i32) -> i32 {

        debug_assert!(bound > 0, "bound must be positive");

        if (bound & -bound) == bound {
            (((bound as i64).wrapping_mul(self.next(31) as i64)) >> 31) as i32
        } else {

            let mut bits;
            let mut val;

            loop {
                bits = self.next(31);
                val = bits.rem_euclid(bound);
                if bits - val + (bound - 1) >= 0 {
                    break;
                }
            }

            val

        }

    }

    pub fn next_long(&mut self) -> i64 {
        ((self.next(32) as i64) << 32).wrapping_add(self.next(32) as i64)
    }

    /// Get the next pseudo-random double-precision float in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        let high = (self.next(26) as i64) << 27;
        let low = self.next(27) as i64;
        (high.wrapping_add(low) as f64) / DOUBLE_DIV
    }

    /// Get the next pseudo-random double-precision vector, x, y and z drawn in order.
    pub fn next_dvec3(&mut self) -> DVec3 {
        DVec3 {
            x: self.next_double(),
            y: self.next_double(),
            z: self.next_double(),
        }
    }

}
