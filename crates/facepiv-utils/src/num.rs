//! Numeric helpers.

/// Wraps an `f32` to give it a total [`Ord`], panicking on `NaN`.
///
/// Floating point numbers only implement [`PartialOrd`], which makes them awkward to use with
/// APIs like [`Iterator::max_by_key`] or [`slice::sort_unstable_by_key`]. Every value that flows
/// through this wrapper is expected to already be a checked, finite measurement (a confidence, a
/// byte count, a distance), so encountering `NaN` here indicates a bug upstream, not a recoverable
/// runtime condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalF32(pub f32);

impl Eq for TotalF32 {}

impl PartialOrd for TotalF32 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or_else(|| panic!("TotalF32: comparison with NaN ({} vs {})", self.0, other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_f32_orders_like_f32() {
        let mut v = [TotalF32(3.0), TotalF32(1.0), TotalF32(2.0)];
        v.sort();
        assert_eq!(v.map(|t| t.0), [1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn total_f32_panics_on_nan() {
        let _ = TotalF32(f32::NAN).cmp(&TotalF32(1.0));
    }
}
