//! Transform executor (C6): applies a planned [`PivTransform`] to a source raster, producing the
//! 420x560 RGBA8 canvas handed to the encoder.

use nalgebra::{Rotation2, Vector2};

use facepiv_image::{pad_to_aspect, resize_bilinear, rotate_bilinear, AspectRatio, Color, Image, Rect};

use crate::error::{Error, Result};
use crate::geometry::{ImageDimensions, Point2D};
use crate::transform::plan::{rotated_dimensions, PivTransform};

/// If the post-crop aspect ratio differs from 3:4 by more than this fraction, the crop is padded
/// to 3:4 before the final resize instead of being stretched.
const ASPECT_TOLERANCE: f32 = 0.01;

/// Applies `transform` to `source`: rotate, crop, then resize (stretching or padding to 3:4 as
/// needed) to exactly 420x560. The returned image always has alpha = 255 everywhere.
pub fn execute(transform: &PivTransform, source: &Image) -> Result<Image> {
    let target = transform.target_dimensions();

    let rotated = rotate_bilinear(source, transform.rotation_degrees());
    let rotated_dims = ImageDimensions::new(rotated.width(), rotated.height())
        .map_err(Error::InvalidInput)?;

    let (x, y, w, h) = transform.crop_region().to_pixels(rotated_dims);
    let cropped = rotated.crop(Rect::from_top_left(x, y, w, h));
    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(Error::CropBoundsExceeded(
            "transform executor: crop region produced an empty raster".to_string(),
        ));
    }

    let target_ratio = target.width as f32 / target.height as f32;
    let cropped_ratio = cropped.width() as f32 / cropped.height() as f32;
    let relative_diff = (cropped_ratio - target_ratio).abs() / target_ratio;

    let prepared = if relative_diff <= ASPECT_TOLERANCE {
        cropped
    } else {
        pad_to_aspect(
            &cropped,
            AspectRatio::new(target.width, target.height),
            Color::OPAQUE_BLACK,
        )
    };

    let mut resized = resize_bilinear(&prepared, target.width, target.height);
    resized.force_opaque();
    Ok(resized)
}

/// Maps a point from `source`'s coordinate space into the coordinate space of the canvas
/// [`execute`] would produce for `transform`, without rasterizing anything.
///
/// Used to recompute PIV lines from the original landmarks against the rendered canvas (§4.7),
/// rather than re-running the landmark extractor on the transformed raster. Mirrors `execute`'s
/// rotate -> crop -> pad -> resize decisions exactly, including the pad/stretch branch.
pub fn remap_point(transform: &PivTransform, source: ImageDimensions, point: Point2D) -> Point2D {
    let target = transform.target_dimensions();
    let rotation_degrees = transform.rotation_degrees();

    let source_center = Point2D::new(source.width as f32 / 2.0, source.height as f32 / 2.0);
    let (rotated_w, rotated_h) = rotated_dimensions(source, rotation_degrees);
    let rotated_center = Point2D::new(rotated_w / 2.0, rotated_h / 2.0);

    let rotation = Rotation2::new(rotation_degrees.to_radians());
    let relative = Vector2::new(point.x - source_center.x, point.y - source_center.y);
    let rotated_relative = rotation * relative;
    let point_rotated = Point2D::new(
        rotated_center.x + rotated_relative.x,
        rotated_center.y + rotated_relative.y,
    );

    let rotated_dims = ImageDimensions::new(rotated_w.round().max(1.0) as u32, rotated_h.round().max(1.0) as u32)
        .unwrap_or(ImageDimensions { width: 1, height: 1 });
    let (crop_x, crop_y, crop_w, crop_h) = transform.crop_region().to_pixels(rotated_dims);
    let point_in_crop = Point2D::new(point_rotated.x - crop_x as f32, point_rotated.y - crop_y as f32);

    let target_ratio = target.width as f32 / target.height as f32;
    let cropped_ratio = crop_w as f32 / crop_h as f32;
    let relative_diff = (cropped_ratio - target_ratio).abs() / target_ratio;

    let (point_padded, padded_w, padded_h) = if relative_diff <= ASPECT_TOLERANCE {
        (point_in_crop, crop_w, crop_h)
    } else {
        let (out_w, out_h) = if target_ratio > cropped_ratio {
            (((crop_h as f32) * target_ratio).round() as u32, crop_h)
        } else {
            (crop_w, ((crop_w as f32) / target_ratio).round() as u32)
        };
        let out_w = out_w.max(crop_w);
        let out_h = out_h.max(crop_h);
        let off_x = (out_w as i32 - crop_w as i32) / 2;
        let off_y = (out_h as i32 - crop_h as i32) / 2;
        (
            Point2D::new(point_in_crop.x + off_x as f32, point_in_crop.y + off_y as f32),
            out_w,
            out_h,
        )
    };

    let scale_x = target.width as f32 / padded_w.max(1) as f32;
    let scale_y = target.height as f32 / padded_h.max(1) as f32;
    Point2D::new(point_padded.x * scale_x, point_padded.y * scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CropRect;

    #[test]
    fn identity_transform_on_target_sized_source_is_a_no_op_resize() {
        let source = Image::filled(420, 560, Color::from_rgb8(128, 64, 32));
        let transform = PivTransform::identity();
        let output = execute(&transform, &source).unwrap();

        assert_eq!(output.width(), 420);
        assert_eq!(output.height(), 560);
        assert_eq!(output.get(10, 10).r(), 128);
    }

    #[test]
    fn output_is_always_420x560_with_full_opacity() {
        let source = Image::filled(800, 600, Color::from_rgb8(200, 200, 200));
        let crop = CropRect::new(0.1, 0.1, 0.5, 0.5).unwrap();
        let transform = PivTransform::new(
            3.0,
            crop,
            1.0,
            ImageDimensions::new(420, 560).unwrap(),
            true,
        )
        .unwrap();

        let output = execute(&transform, &source).unwrap();
        assert_eq!((output.width(), output.height()), (420, 560));
        for y in [0, output.height() - 1] {
            for x in [0, output.width() - 1] {
                assert_eq!(output.get(x, y).a(), 255);
            }
        }
    }

    #[test]
    fn remap_point_is_identity_for_a_target_sized_source_with_identity_transform() {
        let transform = PivTransform::identity();
        let source = ImageDimensions::new(420, 560).unwrap();
        let p = Point2D::new(200.0, 300.0);
        let mapped = remap_point(&transform, source, p);
        assert!((mapped.x - p.x).abs() < 0.5);
        assert!((mapped.y - p.y).abs() < 0.5);
    }

    #[test]
    fn non_matching_aspect_crop_is_padded_not_distorted() {
        // A square crop from a square source, forced through a 3:4 target: the content must be
        // padded (letterboxed), not stretched into an ellipse-from-circle-style distortion. We
        // can't directly observe "not distorted" on flat color, so just assert the pipeline
        // completes and still produces the mandated canvas size.
        let source = Image::filled(400, 400, Color::from_rgb8(10, 20, 30));
        let transform = PivTransform::new(
            0.0,
            CropRect::full(),
            1.0,
            ImageDimensions::new(420, 560).unwrap(),
            true,
        )
        .unwrap();
        let output = execute(&transform, &source).unwrap();
        assert_eq!((output.width(), output.height()), (420, 560));
    }
}
