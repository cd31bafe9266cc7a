//! The quantised bits-per-pixel search grid used by [`crate::encode::strategy`].

/// Descending rate grid, in bits per pixel. Monotonically decreasing, strictly positive.
///
/// Chosen to bracket the common PIV/TWIC working range (0.1-6.0 bpp) with finer steps where the
/// target-size search spends most of its time (around 0.5-1.5 bpp).
pub const RATE_TABLE: &[f32] = &[
    6.0, 5.0, 4.0, 3.0, 2.5, 2.0, 1.5, 1.2, 1.0, 0.85, 0.75, 0.68, 0.55, 0.46, 0.36, 0.28, 0.22,
    0.17, 0.13, 0.10,
];

/// Returns the index into [`RATE_TABLE`] whose expected encoded size (`rate * pixels / 8`) is
/// closest to `target_bytes`.
pub fn nearest_rate_index(target_bytes: f64, pixels: u64) -> usize {
    let mut best_index = 0;
    let mut best_diff = f64::INFINITY;
    for (i, &rate) in RATE_TABLE.iter().enumerate() {
        let expected_bytes = rate as f64 * pixels as f64 / 8.0;
        let diff = (expected_bytes - target_bytes).abs();
        if diff < best_diff {
            best_diff = diff;
            best_index = i;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_strictly_decreasing_and_positive() {
        assert!(RATE_TABLE.windows(2).all(|w| w[0] > w[1]));
        assert!(RATE_TABLE.iter().all(|&r| r > 0.0));
    }

    #[test]
    fn table_meets_the_documented_shape_contract() {
        assert!(RATE_TABLE.len() >= 15);
        assert!(RATE_TABLE[0] >= 4.0);
        assert!(*RATE_TABLE.last().unwrap() <= 0.15);
    }

    #[test]
    fn nearest_rate_index_picks_the_closest_expected_size() {
        let pixels = 420 * 560;
        // 20000 bytes * 0.95 / (pixels/8) ~= 0.645 bpp, between 0.68 and 0.55.
        let target = 20_000.0 * 0.95;
        let idx = nearest_rate_index(target, pixels);
        assert!(RATE_TABLE[idx] == 0.68 || RATE_TABLE[idx] == 0.55);
    }
}
