//! Transform planner (C5): from landmarks and source dimensions, produces a [`PivTransform`]
//! whose composition (rotate, crop, resize) targets a 420x560 canvas satisfying PIV geometry.

use nalgebra::{Rotation2, Vector2};

use crate::error::{Error, Result};
use crate::geometry::{CropRect, FaceBox, ImageDimensions, Point2D};

/// PIV tolerates at most this much head tilt; larger angles are treated as uncorrectable by
/// rotation alone and are clamped rather than fully applied.
const MAX_ROTATION_DEGREES: f32 = 5.0;
/// The hard input-validation ceiling distinct from the tolerated tilt above: a caller that
/// constructs a `PivTransform` directly (rather than through `plan`) may request up to this much
/// rotation, at the cost of failing compliance.
const ROTATION_VALIDATION_LIMIT: f32 = 45.0;

const TARGET_WIDTH: u32 = 420;
const TARGET_HEIGHT: u32 = 560;
/// Crop width is this many times the larger face-box dimension; this padding ratio historically
/// yields PIV-compliant head width ratios around 1.85-2.0.
const CROP_PADDING_FACTOR: f32 = 2.0;
/// The eye line sits this far from the top of the crop (60% from the bottom), matching the BB
/// compliance target.
const EYE_LINE_FRACTION_FROM_TOP: f32 = 1.0 - 0.60;
/// If clamping the crop to the source bounds would shrink either axis below this fraction of the
/// originally planned size, the source is considered too small or the face too close to the
/// edge, and planning fails with `CropBoundsExceeded` rather than silently degrading the crop.
const MIN_CROP_RETENTION: f32 = 0.5;

/// A planned rotate -> crop -> scale transform targeting a 420x560 canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivTransform {
    rotation_degrees: f32,
    crop_region: CropRect,
    scale_factor: f32,
    target_dimensions: ImageDimensions,
    is_piv_compliant: bool,
}

impl PivTransform {
    /// Constructs a `PivTransform` directly, validating the invariants in §4.4.
    pub fn new(
        rotation_degrees: f32,
        crop_region: CropRect,
        scale_factor: f32,
        target_dimensions: ImageDimensions,
        is_piv_compliant: bool,
    ) -> Result<Self> {
        if rotation_degrees.abs() > ROTATION_VALIDATION_LIMIT {
            return Err(Error::RotationOutOfRange(rotation_degrees));
        }
        if !(scale_factor > 0.0 && scale_factor <= 10.0) {
            return Err(Error::InvalidInput(format!(
                "scale_factor must be in (0, 10], got {scale_factor}"
            )));
        }
        if target_dimensions.width < TARGET_WIDTH || target_dimensions.height < TARGET_HEIGHT {
            return Err(Error::InvalidInput(format!(
                "target_dimensions must be at least {TARGET_WIDTH}x{TARGET_HEIGHT}, got {}x{}",
                target_dimensions.width, target_dimensions.height
            )));
        }
        Ok(Self {
            rotation_degrees,
            crop_region,
            scale_factor,
            target_dimensions,
            is_piv_compliant,
        })
    }

    /// The identity transform: no rotation, the full source, scale 1.0, target 420x560.
    pub fn identity() -> Self {
        Self {
            rotation_degrees: 0.0,
            crop_region: CropRect::full(),
            scale_factor: 1.0,
            target_dimensions: ImageDimensions {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
            },
            is_piv_compliant: true,
        }
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    pub fn crop_region(&self) -> CropRect {
        self.crop_region
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn target_dimensions(&self) -> ImageDimensions {
        self.target_dimensions
    }

    pub fn is_piv_compliant(&self) -> bool {
        self.is_piv_compliant
    }
}

/// The source canvas's dimensions after rotating it by `degrees` about its own center, growing to
/// the rotated bounding box. Mirrors [`facepiv_image::rotate_bilinear`]'s sizing exactly, since
/// the planner and the executor must agree on the intermediate canvas size.
pub(crate) fn rotated_dimensions(source: ImageDimensions, degrees: f32) -> (f32, f32) {
    let radians = degrees.to_radians();
    let (w, h) = (source.width as f32, source.height as f32);
    let new_w = w * radians.cos().abs() + h * radians.sin().abs();
    let new_h = w * radians.sin().abs() + h * radians.cos().abs();
    (new_w, new_h)
}

/// Plans a [`PivTransform`] from the eye centers, the detected face box, and the source image's
/// dimensions.
///
/// Fails with [`Error::CropBoundsExceeded`] if the face sits too close to the source's edge for
/// the planned crop to fit without collapsing below [`MIN_CROP_RETENTION`] of its target size.
pub fn plan(
    left_eye: Point2D,
    right_eye: Point2D,
    face_box: FaceBox,
    source: ImageDimensions,
) -> Result<PivTransform> {
    let dx = right_eye.x - left_eye.x;
    let dy = right_eye.y - left_eye.y;
    let theta_raw = -dy.atan2(dx).to_degrees();
    let rotation_degrees = theta_raw.clamp(-MAX_ROTATION_DEGREES, MAX_ROTATION_DEGREES);

    let source_center = Point2D::new(source.width as f32 / 2.0, source.height as f32 / 2.0);
    let eye_mid = left_eye.midpoint(&right_eye);

    let rotation = Rotation2::new(rotation_degrees.to_radians());
    let relative = Vector2::new(eye_mid.x - source_center.x, eye_mid.y - source_center.y);
    let rotated_relative = rotation * relative;

    let (rotated_w, rotated_h) = rotated_dimensions(source, rotation_degrees);
    // The rotated canvas keeps the same center point as the source; its origin shifts by half of
    // the growth on each axis.
    let rotated_center = Point2D::new(rotated_w / 2.0, rotated_h / 2.0);
    let eye_mid_rotated = Point2D::new(
        rotated_center.x + rotated_relative.x,
        rotated_center.y + rotated_relative.y,
    );

    let crop_width = CROP_PADDING_FACTOR * face_box.w().max(face_box.h());
    let crop_height = crop_width * (TARGET_HEIGHT as f32 / TARGET_WIDTH as f32);

    let crop_left = eye_mid_rotated.x - crop_width / 2.0;
    let crop_top = eye_mid_rotated.y - EYE_LINE_FRACTION_FROM_TOP * crop_height;

    let clamped_left = crop_left.max(0.0);
    let clamped_top = crop_top.max(0.0);
    let clamped_right = (crop_left + crop_width).min(rotated_w);
    let clamped_bottom = (crop_top + crop_height).min(rotated_h);

    let clamped_width = clamped_right - clamped_left;
    let clamped_height = clamped_bottom - clamped_top;

    if clamped_width < crop_width * MIN_CROP_RETENTION
        || clamped_height < crop_height * MIN_CROP_RETENTION
        || clamped_width <= 0.0
        || clamped_height <= 0.0
    {
        return Err(Error::CropBoundsExceeded(format!(
            "planned crop {crop_width:.1}x{crop_height:.1} at ({crop_left:.1}, {crop_top:.1}) does not fit within the {rotated_w:.1}x{rotated_h:.1} rotated source"
        )));
    }

    let rotated_dims = ImageDimensions::new(rotated_w.round() as u32, rotated_h.round() as u32)
        .map_err(Error::InvalidInput)?;
    let crop_region = CropRect::from_pixels(
        clamped_left.round() as i32,
        clamped_top.round() as i32,
        clamped_width.round().max(1.0) as u32,
        clamped_height.round().max(1.0) as u32,
        rotated_dims,
    )
    .map_err(Error::InvalidInput)?;

    let scale_factor = (TARGET_WIDTH as f32 / clamped_width)
        .min(TARGET_HEIGHT as f32 / clamped_height)
        .min(1.0);

    let crop_aspect_is_3_4 = ((clamped_width / clamped_height)
        - (TARGET_WIDTH as f32 / TARGET_HEIGHT as f32))
        .abs()
        <= 0.01;
    let is_piv_compliant = theta_raw.abs() <= MAX_ROTATION_DEGREES && crop_aspect_is_3_4;

    PivTransform::new(
        rotation_degrees,
        crop_region,
        scale_factor,
        ImageDimensions::new(TARGET_WIDTH, TARGET_HEIGHT).expect("420x560 is always valid"),
        is_piv_compliant,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn level_centered_face_yields_near_zero_rotation() {
        let transform = plan(
            Point2D::new(350.0, 250.0),
            Point2D::new(450.0, 250.0),
            FaceBox::new(300.0, 200.0, 200.0, 250.0).unwrap(),
            ImageDimensions::new(800, 600).unwrap(),
        )
        .unwrap();

        assert_relative_eq!(transform.rotation_degrees(), 0.0, epsilon = 0.1);
        assert_eq!(transform.target_dimensions().width, 420);
        assert_eq!(transform.target_dimensions().height, 560);
        assert!(transform.is_piv_compliant());
    }

    #[test]
    fn slight_tilt_is_clamped_to_five_degrees() {
        let transform = plan(
            Point2D::new(100.0, 100.0),
            Point2D::new(200.0, 110.0),
            FaceBox::new(80.0, 60.0, 150.0, 180.0).unwrap(),
            ImageDimensions::new(800, 600).unwrap(),
        )
        .unwrap();

        // theta_raw = -atan2(10, 100) * 180/pi ~= -5.71deg, clamped to -5.0.
        assert_relative_eq!(transform.rotation_degrees(), -5.0, epsilon = 0.1);
    }

    #[test]
    fn equal_eye_heights_yield_exactly_zero_rotation() {
        let transform = plan(
            Point2D::new(100.0, 200.0),
            Point2D::new(300.0, 200.0),
            FaceBox::new(100.0, 100.0, 200.0, 250.0).unwrap(),
            ImageDimensions::new(800, 600).unwrap(),
        )
        .unwrap();
        assert_eq!(transform.rotation_degrees(), 0.0);
    }

    #[test]
    fn face_too_close_to_edge_fails_with_crop_bounds_exceeded() {
        let result = plan(
            Point2D::new(5.0, 5.0),
            Point2D::new(15.0, 5.0),
            FaceBox::new(0.0, 0.0, 300.0, 300.0).unwrap(),
            ImageDimensions::new(320, 240).unwrap(),
        );
        assert!(matches!(result, Err(Error::CropBoundsExceeded(_))));
    }

    #[test]
    fn identity_transform_matches_documented_values() {
        let identity = PivTransform::identity();
        assert_eq!(identity.rotation_degrees(), 0.0);
        assert_eq!(identity.crop_region(), CropRect::full());
        assert_eq!(identity.scale_factor(), 1.0);
    }

    #[test]
    fn rejects_rotation_past_validation_limit() {
        let result = PivTransform::new(
            50.0,
            CropRect::full(),
            1.0,
            ImageDimensions::new(420, 560).unwrap(),
            false,
        );
        assert!(matches!(result, Err(Error::RotationOutOfRange(_))));
    }
}
