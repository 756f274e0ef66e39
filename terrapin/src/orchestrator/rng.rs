// File: terrapin/src/orchestrator/rng.rs
//
// Seeded RNG
//
// All randomness produced by fixtures (synthetic transaction digests, random
// test data) flows through TestRng so a failing run can be replayed by seed.

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Environment variable holding a replay seed, hex with or without `0x`
pub const SEED_ENV_VAR: &str = "TERRAPIN_TEST_SEED";

/// Test RNG with seed for reproducibility
///
/// When a test fails, the seed printed at creation lets it be replayed:
///
/// ```text
/// TestRng seed: 0xa3f5c8e1b2d94706
///    Replay: TERRAPIN_TEST_SEED=0xa3f5c8e1b2d94706 cargo test ...
/// ```
///
/// The inner generator sits behind a mutex so a single `Arc<TestRng>` can be
/// shared by the builder and the fixture.
pub struct TestRng {
    inner: Mutex<StdRng>,
    seed: u64,
}

impl TestRng {
    /// Create a new TestRng with an explicit seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    /// Create a TestRng seeded from `TERRAPIN_TEST_SEED`, or randomly
    ///
    /// The chosen seed is always printed to stderr for replay.
    pub fn new_from_env_or_random() -> Self {
        let seed = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|s| parse_seed(&s))
            .unwrap_or_else(|| rand::thread_rng().gen());

        eprintln!("TestRng seed: 0x{:016x}", seed);
        eprintln!("   Replay: {}=0x{:016x} cargo test ...", SEED_ENV_VAR, seed);

        Self::with_seed(seed)
    }

    /// Get the seed used to initialize this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random value of type T
    pub fn gen<T>(&self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.inner.lock().gen()
    }

    /// Generate a random value in the given range
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.inner.lock().gen_range(range)
    }

    /// Fill a byte slice with random data
    pub fn fill_bytes(&self, dest: &mut [u8]) {
        let mut rng = self.inner.lock();
        rng.fill_bytes(dest)
    }

    /// Random lowercase hex string encoding `len` random bytes
    pub fn gen_hex(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len];
        self.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

// Support both "0x..." and raw hex
fn parse_seed(value: &str) -> Option<u64> {
    let trimmed = value.trim().trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_generation() {
        let rng1 = TestRng::with_seed(42);
        let rng2 = TestRng::with_seed(42);

        let values1: Vec<u64> = (0..10).map(|_| rng1.gen()).collect();
        let values2: Vec<u64> = (0..10).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_different_seeds_produce_different_values() {
        let rng1 = TestRng::with_seed(42);
        let rng2 = TestRng::with_seed(43);

        let values1: Vec<u64> = (0..10).map(|_| rng1.gen()).collect();
        let values2: Vec<u64> = (0..10).map(|_| rng2.gen()).collect();

        assert_ne!(values1, values2);
    }

    #[test]
    fn test_gen_range() {
        let rng = TestRng::with_seed(42);
        for _ in 0..100 {
            let value = rng.gen_range(1..=10);
            assert!((1..=10).contains(&value));
        }
    }

    #[test]
    fn test_gen_hex() {
        let rng = TestRng::with_seed(7);
        let value = rng.gen_hex(32);
        assert_eq!(value.len(), 64);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        // Consecutive draws differ
        assert_ne!(value, rng.gen_hex(32));
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("0xdeadbeef"), Some(0xdeadbeef));
        assert_eq!(parse_seed(" ff "), Some(0xff));
        assert_eq!(parse_seed("not hex"), None);
    }
}
