//! # Height Samples
//!
//! A height sample is an `f32` with a reserved low range meaning
//! "no value computed yet". Consumers must go through [`is_valid`]
//! instead of comparing against the sentinel directly: any value at or
//! below [`VALID_MIN`] is absent, not a real height.

/// Sentinel stored for samples that have never been computed.
pub const UNSET: f32 = -10_000_000.0;

/// Validity threshold: a sample is a real height iff it is above this.
pub const VALID_MIN: f32 = -9_000_000.0;

/// Returns true if `sample` is a real height rather than a sentinel.
#[inline]
#[must_use]
pub fn is_valid(sample: f32) -> bool {
    sample > VALID_MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_invalid() {
        assert!(!is_valid(UNSET));
        assert!(!is_valid(VALID_MIN));
        assert!(!is_valid(VALID_MIN - 1.0));
    }

    #[test]
    fn test_ordinary_heights_are_valid() {
        assert!(is_valid(0.0));
        assert!(is_valid(-5000.0));
        assert!(is_valid(VALID_MIN + 1.0));
    }
}
