// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Small helpers over `ring`'s system RNG.

use ring::rand::{SecureRandom, SystemRandom};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Uniform-ish index in `0..len`. Returns 0 if the RNG is unavailable.
pub fn index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let mut buf = [0u8; 8];
    if SystemRandom::new().fill(&mut buf).is_err() {
        return 0;
    }
    (u64::from_le_bytes(buf) % len as u64) as usize
}

/// Random lowercase base36 token of `len` characters.
pub fn base36_token(len: usize) -> String {
    let mut buf = vec![0u8; len];
    if SystemRandom::new().fill(&mut buf).is_err() {
        // RNG unavailable: derive from the clock.
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        buf = nanos.to_le_bytes().iter().cycle().take(len).copied().collect();
    }
    buf.iter()
        .map(|b| BASE36[*b as usize % BASE36.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_token_shape() {
        let t = base36_token(9);
        assert_eq!(t.len(), 9);
        assert!(t.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_index_in_range() {
        for _ in 0..100 {
            assert!(index(8) < 8);
        }
        assert_eq!(index(0), 0);
    }
}
