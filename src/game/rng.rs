// Deterministic sequence generator for chart generation.
//
// Same seed must yield the same stream on every platform and in every
// session, since per-level records are only comparable when the generated
// chart is identical. Cosmetic randomness (particle spread, shield rolls)
// goes through `rand` instead and is allowed to differ between runs.

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
// 2^31 - 1. The state is reduced modulo this and masked to 31 bits.
const LCG_MODULUS: u64 = 0x7FFF_FFFF;

const LEVEL_SEED_STRIDE: u32 = 12_345;

/// 31-bit linear congruential generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChartRng {
    state: u32,
}

impl ChartRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// The generator that drives level `level`'s chart.
    pub fn for_level(level: u32) -> Self {
        Self::new(level.wrapping_mul(LEVEL_SEED_STRIDE))
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let stepped = (u64::from(self.state) * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state = (stepped & LCG_MODULUS) as u32;
        self.state as f64 / LCG_MODULUS as f64
    }

    /// One biased coin flip: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        (self.next_f64() * len as f64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_golden_sequence_for_seed_12345() {
        // First six outputs for seed 12345, pinned so any change to the
        // recurrence shows up as a regeneration of every chart.
        let mut rng = ChartRng::new(12345);
        let expected = [
            0.655157002459819,
            0.082918475420641929,
            0.71884191069698056,
            0.19905230784744599,
            0.26209551527262459,
            0.7494772871720965,
        ];
        for (i, want) in expected.iter().enumerate() {
            let got = rng.next_f64();
            assert_eq!(got, *want, "output {i} diverged from the golden sequence");
        }
    }

    #[test]
    fn matches_golden_sequence_for_other_seeds() {
        let mut one = ChartRng::new(1);
        assert_eq!(one.next_f64(), 0.51387007837829646);
        assert_eq!(one.next_f64(), 0.43980080654835368);

        let mut fortytwo = ChartRng::new(42);
        assert_eq!(fortytwo.next_f64(), 0.5823075997560786);
        assert_eq!(fortytwo.next_f64(), 0.61019677417827622);
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let mut a = ChartRng::new(987_654);
        let mut b = ChartRng::new(987_654);
        for _ in 0..1_000 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn outputs_stay_in_unit_interval() {
        let mut rng = ChartRng::new(u32::MAX);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "value {v} escaped [0, 1)");
        }
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut rng = ChartRng::for_level(9);
        for _ in 0..1_000 {
            assert!(rng.pick_index(4) < 4);
        }
    }
}
