//! Deterministic seeds: (user, cycle) → reproducible 32-bit value
//!
//! The same user and cycle always yield the same seed, so a replayed
//! session regenerates the same audio and the same BPM jitter.

use sha2::{Digest, Sha256};

/// SHA-256 of `"{user_id}:{cycle_index}"`, first 64 bits big-endian,
/// masked to 32 bits
pub fn deterministic_seed(user_id: &str, cycle_index: u64) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", user_id, cycle_index).as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[0..8]);
    (u64::from_be_bytes(head) & 0xFFFF_FFFF) as u32
}

/// `base + floor(((seed mod 1000) / 1000) * jitter)`, always in `base..base + jitter`
pub fn jitter_bpm(base: u32, seed: u32, jitter: u32) -> u32 {
    let frac = u64::from(seed % 1000);
    base.saturating_add((frac * u64::from(jitter) / 1000) as u32)
}

// =============================================================================
// TESTS
// =============================================================================
