//! Deterministic float ordering.
//!
//! Picking and cache keys compare floats; these helpers give them a total,
//! platform-independent order.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// A float wrapper with a deterministic total ordering.
///
/// - Uses `f64::total_cmp` (after canonicalization) for `Ord`.
/// - Treats NaN as equal to NaN for `Eq` (after canonicalization), enabling
///   use as a key.
#[derive(Debug, Copy, Clone, Default)]
pub struct StableF64(pub f64);

impl PartialEq for StableF64 {
    fn eq(&self, other: &Self) -> bool {
        stable_total_cmp_f64(self.0, other.0) == Ordering::Equal
    }
}

impl Eq for StableF64 {}

impl PartialOrd for StableF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StableF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        stable_total_cmp_f64(self.0, other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{StableF64, canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(canonical_f64(0.0), 0.0);
        assert_eq!(StableF64(-0.0), StableF64(0.0));
    }

    #[test]
    fn stable_cmp_is_total_and_deterministic() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
        assert!(StableF64(f64::NAN) == StableF64(f64::NAN));
    }
}
