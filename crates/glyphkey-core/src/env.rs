//! Environment abstraction for deterministic testing.
//!
//! Decouples handshake logic from system resources (wall clock, randomness).
//! Production uses the OS RNG and clock; tests use a seeded RNG and a manual
//! clock so every generated token and ephemeral key replays exactly.

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Seconds since the Unix epoch. Used for key timestamps only.
    fn wall_clock_secs(&self) -> u64;
}

/// Deterministic environments for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    };

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;

    /// Seeded RNG plus a manually advanced clock.
    ///
    /// Clones share the RNG stream and the clock.
    #[derive(Clone)]
    pub struct SeededEnv {
        rng: Arc<Mutex<ChaCha20Rng>>,
        clock: Arc<AtomicU64>,
    }

    impl SeededEnv {
        /// Environment whose random stream is fixed by `seed`.
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
                clock: Arc::new(AtomicU64::new(1_700_000_000)),
            }
        }

        /// Move the wall clock forward.
        pub fn advance(&self, secs: u64) {
            self.clock.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Environment for SeededEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        }

        fn wall_clock_secs(&self) -> u64 {
            self.clock.load(Ordering::SeqCst)
        }
    }

}
