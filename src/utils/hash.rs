//! Hashing with `rustc_hash::FxHasher`: fast and deterministic, which is
//! all board fingerprints need.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        assert_eq!(compute(b"cells"), compute(b"cells"));
        assert_ne!(compute(b"cells"), compute(b"cellz"));
    }
}
