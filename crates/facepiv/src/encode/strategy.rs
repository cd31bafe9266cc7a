//! [`EncodingStrategy`] execution: a single fixed-rate call, or a bounded probe over the rate
//! table to hit a byte budget.

use tokio_util::sync::CancellationToken;

use crate::encode::rate_table::{nearest_rate_index, RATE_TABLE};
use crate::encode::EncodingResult;
use crate::error::{Error, Result};
use crate::external::Jp2kEncoder;
use crate::options::{EncodingStrategy, ProcessingOptions};
use crate::roi::RoiRegion;

/// The 5% safety margin `TargetSize` encodes under: the cap is never brushed exactly.
const TARGET_SAFETY_MARGIN: f64 = 0.95;
/// The lower edge of the "good enough, stop probing" band, as a fraction of the safety-margined
/// target.
const ACCEPTABLE_BAND_LOW: f64 = 0.85 / TARGET_SAFETY_MARGIN;

/// Runs `strategy` against `canvas`, returning the encoded result or a typed failure.
///
/// `roi` is only attached to the call when `options.enable_roi` is set; a caller that wants an
/// un-prioritised encode (eg. for a quick preview) can also pass `roi = None` directly.
pub async fn execute<E: Jp2kEncoder>(
    strategy: &EncodingStrategy,
    canvas: &facepiv_image::Image,
    roi: Option<&RoiRegion>,
    encoder: &E,
    options: &ProcessingOptions,
    cancel: &CancellationToken,
) -> Result<EncodingResult> {
    let roi = if options.enable_roi { roi } else { None };

    match *strategy {
        EncodingStrategy::FixedRate { bpp } => {
            fixed_rate(canvas, roi, encoder, bpp, options, cancel).await
        }
        EncodingStrategy::TargetSize { bytes } => {
            target_size(canvas, roi, encoder, bytes, options, cancel).await
        }
    }
}

async fn fixed_rate<E: Jp2kEncoder>(
    canvas: &facepiv_image::Image,
    roi: Option<&RoiRegion>,
    encoder: &E,
    bpp: f32,
    options: &ProcessingOptions,
    cancel: &CancellationToken,
) -> Result<EncodingResult> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let data = encoder
        .encode(
            canvas,
            roi,
            bpp,
            options.roi_start_level,
            options.align_roi,
            cancel,
        )
        .await
        .map_err(Error::EncodingFailed)?;

    Ok(EncodingResult {
        actual_size: data.len(),
        actual_rate: bpp,
        target_size: None,
        data,
    })
}

/// Builds the probe order described in §4.6: `floor(n/2)` indices above the estimated centre
/// (ascending toward it), then the centre itself, then the remaining indices below it. Indices
/// are clamped into the table's bounds and deduplicated while preserving the probe order.
fn probe_order(center: usize, tries: usize, table_len: usize) -> Vec<usize> {
    let upper_count = tries / 2;
    let lower_count = tries.saturating_sub(upper_count).saturating_sub(1);

    let mut order = Vec::with_capacity(tries);
    for i in (1..=upper_count).rev() {
        if let Some(idx) = center.checked_sub(i) {
            order.push(idx);
        }
    }
    order.push(center.min(table_len - 1));
    for i in 1..=lower_count {
        let idx = center + i;
        if idx < table_len {
            order.push(idx);
        }
    }

    order.dedup();
    order
}

async fn target_size<E: Jp2kEncoder>(
    canvas: &facepiv_image::Image,
    roi: Option<&RoiRegion>,
    encoder: &E,
    target_bytes: usize,
    options: &ProcessingOptions,
    cancel: &CancellationToken,
) -> Result<EncodingResult> {
    let pixels = canvas.width() as u64 * canvas.height() as u64;
    let cap_bytes = target_bytes as f64 * TARGET_SAFETY_MARGIN;
    let center = nearest_rate_index(cap_bytes, pixels);

    let tries = (options.max_retries as usize + 1).max(1);
    let order = probe_order(center, tries, RATE_TABLE.len());

    let mut best_under_cap: Option<(f32, Vec<u8>)> = None;
    let mut best_overall: Option<(f32, usize)> = None;
    let mut last_error: Option<anyhow::Error> = None;

    for idx in order {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let rate = RATE_TABLE[idx];

        let data = match encoder
            .encode(
                canvas,
                roi,
                rate,
                options.roi_start_level,
                options.align_roi,
                cancel,
            )
            .await
        {
            Ok(data) => data,
            Err(err) => {
                log::warn!("encoder failed at rate {rate} bpp, skipping: {err:#}");
                last_error = Some(err);
                continue;
            }
        };

        let size = data.len();
        match best_overall {
            Some((_, best_size)) if best_size <= size => {}
            _ => best_overall = Some((rate, size)),
        }

        if size as f64 <= cap_bytes {
            let is_closer = match &best_under_cap {
                Some((_, best_data)) => size > best_data.len(),
                None => true,
            };
            if is_closer {
                best_under_cap = Some((rate, data));
            }

            if size as f64 >= cap_bytes * ACCEPTABLE_BAND_LOW {
                break;
            }
        }
    }

    if let Some((rate, data)) = best_under_cap {
        return Ok(EncodingResult {
            actual_size: data.len(),
            actual_rate: rate,
            target_size: Some(target_bytes),
            data,
        });
    }

    if let Some((best_rate, best_size)) = best_overall {
        return Err(Error::CannotMeetSize {
            requested: target_bytes,
            best_size,
            best_rate,
        });
    }

    Err(Error::EncodingFailed(
        last_error.unwrap_or_else(|| anyhow::anyhow!("target-size search: no rate was attempted")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_order_matches_documented_example_for_three_tries() {
        // n = 3 around i*: i*-1, i*, i*+1.
        assert_eq!(probe_order(10, 3, 20), vec![9, 10, 11]);
    }

    #[test]
    fn probe_order_clamps_at_the_low_edge() {
        let order = probe_order(0, 3, 20);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn probe_order_clamps_at_the_high_edge() {
        let order = probe_order(19, 3, 20);
        assert_eq!(order, vec![18, 19]);
    }

    #[test]
    fn probe_order_handles_a_single_try() {
        assert_eq!(probe_order(5, 1, 20), vec![5]);
    }
}
