//! The JPEG 2000 Region-of-Interest "Inner Region", per INCITS 385-2004 Appendix C.6.

use crate::geometry::{ImageDimensions, RoiBoundingBox};

/// A named ROI region with a priority and the landmark indices it's derived from.
///
/// Priority is on a 1-3 scale; only priority 3 (the Inner Region) is currently produced, but the
/// type is shaped for additional regions (eg. eyes-only) without a breaking change.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiRegion {
    pub name: String,
    pub priority: u8,
    pub bounding_box: RoiBoundingBox,
    pub landmark_indices: Vec<usize>,
}

/// The set of ROI regions for one output canvas. Currently always a single Inner Region.
#[derive(Debug, Clone, PartialEq)]
pub struct FacialRoiSet {
    pub inner_region: RoiRegion,
}

/// Computes the Appendix C.6 Inner Region rectangle for an output canvas of `canvas.width` x
/// `canvas.height`.
///
/// The source formula uses `canvas.width` for both the x and y extents of the region (this is
/// preserved verbatim from the standard's appendix, a known quirk documented in the spec this
/// pipeline implements); `innerMaxY` is clamped to the canvas height so non-420x560 canvases
/// don't produce an out-of-bounds box. Fails rather than panicking if the canvas is too short for
/// the formula's `inner_y` to land inside it at all.
pub fn inner_region_for(canvas: ImageDimensions) -> Result<FacialRoiSet, String> {
    let w = canvas.width as f32;
    let h = canvas.height;

    let inner_x = (0.1 * w - 1.0).floor() as i64;
    let inner_y = (0.1 * w - 1.0).floor() as i64;
    let inner_max_x = (0.9 * w - 1.0).floor() as i64;
    let inner_max_y = (1.1 * w - 1.0).floor() as i64;

    let inner_x = inner_x.max(0) as u32;
    let inner_y = inner_y.max(0) as u32;

    if inner_y >= h {
        return Err(format!(
            "inner_region_for: {}x{} canvas is too short for the Inner Region (inner_y={inner_y})",
            canvas.width, canvas.height
        ));
    }

    let inner_width = (inner_max_x - inner_x as i64 + 1).max(1) as u32;
    let inner_height_unclamped = (inner_max_y - inner_y as i64 + 1).max(1) as u32;
    let inner_height = inner_height_unclamped.min(h.saturating_sub(inner_y));

    let bounding_box = RoiBoundingBox::new(inner_x, inner_y, inner_width, inner_height, canvas)?;

    Ok(FacialRoiSet {
        inner_region: RoiRegion {
            name: "InnerRegion".to_string(),
            priority: 3,
            bounding_box,
            landmark_indices: (0..crate::landmarks::LANDMARK_COUNT).collect(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_documented_piv_canvas_result() {
        let canvas = ImageDimensions::new(420, 560).unwrap();
        let roi = inner_region_for(canvas).unwrap();
        let bb = roi.inner_region.bounding_box;
        assert_eq!((bb.x(), bb.y(), bb.w(), bb.h()), (41, 41, 337, 421));
        assert_eq!(roi.inner_region.priority, 3);
    }

    #[test]
    fn clamps_to_canvas_height_for_non_standard_canvases() {
        // A much shorter canvas should clamp innerHeight instead of overflowing past the bottom.
        let canvas = ImageDimensions::new(420, 100).unwrap();
        let roi = inner_region_for(canvas).unwrap();
        let bb = roi.inner_region.bounding_box;
        assert!(bb.y() + bb.h() <= canvas.height);
    }

    #[test]
    fn canvas_too_short_for_inner_y_fails_cleanly_instead_of_panicking() {
        let canvas = ImageDimensions::new(420, 30).unwrap();
        assert!(inner_region_for(canvas).is_err());
    }

    #[test]
    fn landmark_indices_cover_all_68_points() {
        let canvas = ImageDimensions::new(420, 560).unwrap();
        let roi = inner_region_for(canvas).unwrap();
        assert_eq!(roi.inner_region.landmark_indices.len(), 68);
    }
}
