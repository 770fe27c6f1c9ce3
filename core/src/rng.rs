//! Deterministic random number generation.
//!
//! RULE: Nothing in the viewer may call any platform RNG.
//! All randomness flows through a `RandomSource`, normally a `SimRng`
//! derived from the single master seed in the config.
//!
//! Each concern gets its own stream, seeded from
//! (master_seed XOR stream_index * golden). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// Anything that can roll uniform floats in [0.0, 1.0).
///
/// Tests substitute fixed sources to pin exact outcomes.
pub trait RandomSource {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Integer in `[min, max]`, both ends inclusive.
    fn int_in_range(&mut self, min: u32, max: u32) -> u32 {
        debug_assert!(min <= max, "int_in_range: min > max");
        let span = f64::from(max - min) + 1.0;
        let offset = (self.next_f64() * span).floor() as u32;
        (min + offset).min(max)
    }

    /// Index in `[0, len)`. `len` must be > 0.
    fn pick_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "len must be > 0");
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }

    /// Uniform value in `[-span/2, span/2)`.
    fn centered(&mut self, span: f64) -> f64 {
        (self.next_f64() - 0.5) * span
    }
}

/// A named, deterministic RNG for a single stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream RNG from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for SimRng {
    fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// All stream RNGs for one page lifetime, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SimRng {
        SimRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Generator = 0,
    Motion = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Motion => "motion",
        }
    }
}
