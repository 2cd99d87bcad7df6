//! Deterministic draw randomness.
//!
//! Draws are derived from a server-held secret, the opening session id, and
//! a domain tag, via a SHA256 hash chain. The same inputs always produce the
//! same stream, so an opening can be re-derived for audit.

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;

/// Domain tag for the winning-entry draw.
pub const DOMAIN_WINNER: u32 = 0;

/// Domain tag for the decoy reel draws.
pub const DOMAIN_REEL: u32 = 1;

/// Server secret that seeds all draws. Never leaves the server.
#[derive(Clone)]
pub struct RngSecret([u8; 32]);

impl RngSecret {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Deterministic random number generator for reward draws.
///
/// Uses SHA256 hash chains to generate random values deterministically
/// from the secret, session id, and domain.
#[derive(Clone)]
pub struct DrawRng {
    state: [u8; 32],
    index: usize,
}

impl DrawRng {
    /// Create a new RNG from the secret, a session id, and a domain tag.
    pub fn new(secret: &RngSecret, session_id: u64, domain: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(&session_id.to_be_bytes());
        hasher.update(&domain.to_be_bytes());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    /// Get the next random byte.
    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            // Rehash to get more bytes
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }

    /// Get a random u32 value.
    pub fn next_u32(&mut self) -> u32 {
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | self.next_byte() as u32;
        }
        value
    }

    /// Get a random u64 value.
    pub fn next_u64(&mut self) -> u64 {
        let mut value = 0u64;
        for _ in 0..8 {
            value = (value << 8) | self.next_byte() as u64;
        }
        value
    }

    /// Get a random value in range [0, max).
    pub fn next_bounded(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        // Rejection sampling for an unbiased distribution
        let limit = u64::MAX - (u64::MAX % max);
        loop {
            let value = self.next_u64();
            if value < limit {
                return value % max;
            }
        }
    }

    /// Get a random f64 in range [0.0, 1.0) with full 53-bit precision.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> RngSecret {
        RngSecret::new([7u8; 32])
    }

    #[test]
    fn test_deterministic_stream() {
        let mut a = DrawRng::new(&secret(), 42, DOMAIN_WINNER);
        let mut b = DrawRng::new(&secret(), 42, DOMAIN_WINNER);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_domains_diverge() {
        let mut winner = DrawRng::new(&secret(), 42, DOMAIN_WINNER);
        let mut reel = DrawRng::new(&secret(), 42, DOMAIN_REEL);
        assert_ne!(winner.next_u64(), reel.next_u64());
    }

    #[test]
    fn test_sessions_diverge() {
        let mut a = DrawRng::new(&secret(), 1, DOMAIN_WINNER);
        let mut b = DrawRng::new(&secret(), 2, DOMAIN_WINNER);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_bounded_in_range() {
        let mut rng = DrawRng::new(&secret(), 9, DOMAIN_REEL);
        for max in [1u64, 2, 6, 7, 100, 1_000_000] {
            for _ in 0..50 {
                assert!(rng.next_bounded(max) < max);
            }
        }
        assert_eq!(rng.next_bounded(0), 0);
    }

    #[test]
    fn test_unit_in_range() {
        let mut rng = DrawRng::new(&secret(), 11, DOMAIN_WINNER);
        for _ in 0..1_000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_stream_extends_past_one_hash() {
        // More than 32 bytes forces a rehash; the stream must keep going.
        let mut rng = DrawRng::new(&secret(), 13, DOMAIN_REEL);
        for _ in 0..16 {
            rng.next_u64();
        }
    }
}
