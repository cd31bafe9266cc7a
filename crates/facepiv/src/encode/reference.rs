//! A deterministic stand-in [`Jp2kEncoder`] for tests and for callers that haven't wired up a
//! real JPEG 2000 codec yet.
//!
//! This does not produce a spec-conformant J2K codestream; it produces a byte-accounting stub
//! whose size tracks `base_rate_bpp * pixels / 8` exactly, so the encoding-strategy search (which
//! only cares about the relationship between requested rate and resulting byte count) can be
//! exercised without a real codec dependency. Swap in a real encoder binding for production use.

use tokio_util::sync::CancellationToken;

use crate::external::Jp2kEncoder;
use crate::roi::RoiRegion;

/// Magic bytes standing in for a JP2 signature box, so output at least *looks* like a
/// length-prefixed container to anything sniffing the stream.
const MAGIC: &[u8; 4] = b"\x00\x00\x00\x0c";

/// Encodes by emitting a fixed-size, deterministically-filled buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceEncoder;

impl Jp2kEncoder for ReferenceEncoder {
    async fn encode(
        &self,
        rgba_420x560: &facepiv_image::Image,
        roi: Option<&RoiRegion>,
        base_rate_bpp: f32,
        roi_start_level: u8,
        roi_align: bool,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<u8>> {
        if cancel.is_cancelled() {
            anyhow::bail!("encode cancelled");
        }
        if base_rate_bpp <= 0.0 {
            anyhow::bail!("base_rate_bpp must be positive, got {base_rate_bpp}");
        }

        let pixels = rgba_420x560.width() as f64 * rgba_420x560.height() as f64;
        let size = ((base_rate_bpp as f64 * pixels / 8.0).round() as usize).max(MAGIC.len());

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(MAGIC);

        // Checksum the raster so two different inputs encoded at the same rate don't collide,
        // without this stub needing any real entropy coding.
        let mut checksum: u32 = 0;
        for pixel in rgba_420x560.data().chunks_exact(4) {
            checksum = checksum
                .wrapping_mul(31)
                .wrapping_add(u32::from(pixel[0]) + u32::from(pixel[1]) + u32::from(pixel[2]));
        }
        out.extend_from_slice(&checksum.to_le_bytes());

        if let Some(roi) = roi {
            out.push(if roi_align { 1 } else { 0 });
            out.push(roi_start_level);
            out.extend_from_slice(&roi.bounding_box.x().to_le_bytes());
            out.extend_from_slice(&roi.bounding_box.y().to_le_bytes());
            out.extend_from_slice(&roi.bounding_box.w().to_le_bytes());
            out.extend_from_slice(&roi.bounding_box.h().to_le_bytes());
        }

        out.resize(size, 0);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facepiv_image::Color;

    fn canvas() -> facepiv_image::Image {
        facepiv_image::Image::filled(420, 560, Color::OPAQUE_BLACK)
    }

    #[tokio::test]
    async fn size_tracks_the_requested_rate() {
        let encoder = ReferenceEncoder;
        let cancel = CancellationToken::new();
        let img = canvas();

        let low = encoder.encode(&img, None, 0.5, 3, false, &cancel).await.unwrap();
        let high = encoder.encode(&img, None, 4.0, 3, false, &cancel).await.unwrap();
        assert!(high.len() > low.len());
    }

    #[tokio::test]
    async fn rejects_nonpositive_rate() {
        let encoder = ReferenceEncoder;
        let cancel = CancellationToken::new();
        let img = canvas();
        assert!(encoder.encode(&img, None, 0.0, 3, false, &cancel).await.is_err());
    }

    #[tokio::test]
    async fn respects_cancellation() {
        let encoder = ReferenceEncoder;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let img = canvas();
        assert!(encoder.encode(&img, None, 1.0, 3, false, &cancel).await.is_err());
    }
}
