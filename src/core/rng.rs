use hexf::*;
use super::mc::Float;

pub const ONE_MINUS_EPSILON: f64 = hexf64!("0x1.fffffffffffffp-1");

pub const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
pub const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
pub const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// PCG pseudo-random number generator.
///
/// Every photon worker owns one of these. Streams selected with
/// [Rng::seeded] are statistically independent, so a run is reproducible for
/// a fixed seed and worker count.
#[derive(Debug, Copy, Clone)]
pub struct Rng {
    state: u64,
    inc: u64
}

impl Rng {
    pub fn new(seed: u64) -> Rng {
        Rng::seeded(seed, PCG32_DEFAULT_STREAM)
    }

    /// Create a generator with the given initial state on the given stream.
    pub fn seeded(seed: u64, stream: u64) -> Rng {
        let mut rng = Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM
        };
        rng.set_sequence(seed, stream);
        rng
    }

    pub fn set_sequence(&mut self, initstate: u64, initseq: u64) {
        self.state = 0;
        self.inc = initseq.wrapping_shl(1) | 1;
        self.uniform_uint32();
        self.state = self.state.wrapping_add(initstate);
        self.uniform_uint32();
    }

    pub fn uniform_uint32(&mut self) -> u32 {
        let oldstate: u64 = self.state;
        self.state = oldstate.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted: u32 = (oldstate.wrapping_shr(18) ^ oldstate).wrapping_shr(27) as u32;
        let rot: u32 = oldstate.wrapping_shr(59) as u32;
        xorshifted.rotate_right(rot)
    }

    pub fn uniform_uint32_bounded(&mut self, b: u32) -> u32 {
        let threshold = b.wrapping_neg() % b;
        loop {
            let r = self.uniform_uint32();
            if r >= threshold {
                return r % b;
            }
        }
    }

    /// Uniform double in `[0, 1)` built from 53 random bits.
    pub fn uniform_float(&mut self) -> Float {
        let hi = self.uniform_uint32() as u64;
        let lo = self.uniform_uint32() as u64;
        let bits = ((hi << 32) | lo) >> 11;
        (bits as Float * hexf64!("0x1.0p-53")).min(ONE_MINUS_EPSILON)
    }

    /// Uniform double in `(0, 1]`, safe to pass to `ln`.
    #[inline]
    pub fn uniform_open_float(&mut self) -> Float {
        1.0 - self.uniform_float()
    }

    /// Skip ahead `idelta` draws of [uniform_uint32](Rng::uniform_uint32).
    pub fn advance(&mut self, idelta: u64) {
        let mut cur_mult = PCG32_MULT;
        let mut cur_plus = self.inc;
        let mut acc_mult = 1_u64;
        let mut acc_plus = 0_u64;
        let mut delta = idelta;

        while delta > 0 {
            if delta & 1 != 0 {
                acc_mult = acc_mult.wrapping_mul(cur_mult);
                acc_plus = acc_plus.wrapping_mul(cur_mult).wrapping_add(cur_plus);
            }
            cur_plus = cur_mult.wrapping_add(1).wrapping_mul(cur_plus);
            cur_mult = cur_mult.wrapping_mul(cur_mult);
            delta /= 2;
        }
        self.state = acc_mult.wrapping_mul(self.state).wrapping_add(acc_plus);
    }
}

impl Default for Rng {
    fn default() -> Rng {
        Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::seeded(7, 3);
        let mut b = Rng::seeded(7, 3);
        for _ in 0..100 {
            assert_eq!(a.uniform_uint32(), b.uniform_uint32());
        }
    }

    #[test]
    fn streams_differ() {
        let mut a = Rng::seeded(7, 0);
        let mut b = Rng::seeded(7, 1);
        let same = (0..32).filter(|_| a.uniform_uint32() == b.uniform_uint32()).count();
        assert!(same < 4);
    }

    #[test]
    fn uniform_float_in_unit_interval() {
        let mut rng = Rng::new(0);
        for _ in 0..10_000 {
            let u = rng.uniform_float();
            assert!(u >= 0.0 && u < 1.0);
            let v = rng.uniform_open_float();
            assert!(v > 0.0 && v <= 1.0);
        }
    }

    #[test]
    fn advance_matches_stepping() {
        let mut a = Rng::seeded(11, 5);
        let mut b = a;
        for _ in 0..37 {
            a.uniform_uint32();
        }
        b.advance(37);
        assert_eq!(a.uniform_uint32(), b.uniform_uint32());
    }

    #[test]
    fn bounded_stays_in_range() {
        let mut rng = Rng::new(3);
        for _ in 0..1000 {
            assert!(rng.uniform_uint32_bounded(6) < 6);
        }
    }
}
