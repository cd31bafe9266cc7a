//! Rotate/resize/pad operations used to compose the transform executor.
//!
//! All three operate on whole [`Image`]s rather than views, since the executor always needs to grow
//! the canvas (rotation) or replace it outright (resize, pad) rather than write through a borrow.

use nalgebra::{Rotation2, Vector2};

use crate::{AspectRatio, Color, Image};

/// Samples `image` at floating-point coordinates `(x, y)` using bilinear interpolation.
///
/// Coordinates outside `[0, width) x [0, height)` (with half a pixel of slack at the edges, to
/// avoid flickering black borders from rounding) sample as `fill`.
fn sample_bilinear(image: &Image, x: f32, y: f32, fill: Color) -> Color {
    let w = image.width() as i32;
    let h = image.height() as i32;

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as i32;
    let y0 = y0 as i32;

    let get = |gx: i32, gy: i32| -> [f32; 4] {
        if gx < 0 || gy < 0 || gx >= w || gy >= h {
            [fill.r() as f32, fill.g() as f32, fill.b() as f32, fill.a() as f32]
        } else {
            let c = image.get(gx as u32, gy as u32);
            [c.r() as f32, c.g() as f32, c.b() as f32, c.a() as f32]
        }
    };

    let c00 = get(x0, y0);
    let c10 = get(x0 + 1, y0);
    let c01 = get(x0, y0 + 1);
    let c11 = get(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for ch in 0..4 {
        let top = c00[ch] + (c10[ch] - c00[ch]) * fx;
        let bottom = c01[ch] + (c11[ch] - c01[ch]) * fx;
        let v = top + (bottom - top) * fy;
        out[ch] = v.round().clamp(0.0, 255.0) as u8;
    }
    Color(out)
}

/// Rotates `image` clockwise by `degrees` around its center, with bilinear interpolation.
///
/// The output canvas grows to the rotated bounding box of the source image, so no content is
/// clipped. Pixels that fall outside the source after the inverse rotation are filled with opaque
/// black, matching the PIV canvas background convention.
pub fn rotate_bilinear(image: &Image, degrees: f32) -> Image {
    if degrees == 0.0 {
        return image.clone();
    }

    let theta = degrees.to_radians();
    let rot = Rotation2::new(theta);
    let inv_rot = Rotation2::new(-theta);

    let (w, h) = (image.width() as f32, image.height() as f32);
    let center = Vector2::new(w / 2.0, h / 2.0);

    // Rotate the 4 corners to find the new bounding box.
    let corners = [
        Vector2::new(0.0, 0.0),
        Vector2::new(w, 0.0),
        Vector2::new(0.0, h),
        Vector2::new(w, h),
    ];
    let mut min = Vector2::new(f32::MAX, f32::MAX);
    let mut max = Vector2::new(f32::MIN, f32::MIN);
    for corner in corners {
        let rotated = rot * (corner - center) + center;
        min.x = min.x.min(rotated.x);
        min.y = min.y.min(rotated.y);
        max.x = max.x.max(rotated.x);
        max.y = max.y.max(rotated.y);
    }

    let out_w = (max.x - min.x).ceil().max(1.0) as u32;
    let out_h = (max.y - min.y).ceil().max(1.0) as u32;
    log::debug!(
        "rotating {}x{} image by {degrees:.2} degrees, canvas grows to {out_w}x{out_h}",
        image.width(),
        image.height()
    );
    let mut out = Image::new(out_w, out_h);

    // The new center, in output-image coordinates.
    let out_center = Vector2::new(out_w as f32 / 2.0, out_h as f32 / 2.0);

    for dest_y in 0..out_h {
        for dest_x in 0..out_w {
            let dest = Vector2::new(dest_x as f32 + 0.5, dest_y as f32 + 0.5) - out_center;
            let src = inv_rot * dest + center;
            let color = sample_bilinear(image, src.x - 0.5, src.y - 0.5, Color::OPAQUE_BLACK);
            out.set(dest_x, dest_y, color);
        }
    }

    out
}

/// Resizes `image` to exactly `(new_width, new_height)` using bilinear sampling, stretching if the
/// aspect ratio doesn't match.
pub fn resize_bilinear(image: &Image, new_width: u32, new_height: u32) -> Image {
    if image.width() == new_width && image.height() == new_height {
        return image.clone();
    }

    let mut out = Image::new(new_width, new_height);
    if image.width() == 0 || image.height() == 0 || new_width == 0 || new_height == 0 {
        return out;
    }

    let scale_x = image.width() as f32 / new_width as f32;
    let scale_y = image.height() as f32 / new_height as f32;

    for dest_y in 0..new_height {
        for dest_x in 0..new_width {
            let src_x = (dest_x as f32 + 0.5) * scale_x - 0.5;
            let src_y = (dest_y as f32 + 0.5) * scale_y - 0.5;
            let color = sample_bilinear(image, src_x, src_y, Color::OPAQUE_BLACK);
            out.set(dest_x, dest_y, color);
        }
    }

    out
}

/// Pads `image` with `fill` to reach `target_ratio`, centering the original content.
///
/// Used before a final resize when a crop's aspect ratio diverges too much from the destination
/// canvas's aspect ratio to simply stretch it without visible distortion.
pub fn pad_to_aspect(image: &Image, target_ratio: AspectRatio, fill: Color) -> Image {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return image.clone();
    }

    let current_ratio = w as f32 / h as f32;
    let target = target_ratio.as_f32();

    let (out_w, out_h) = if target > current_ratio {
        // target is wider: pad left/right
        (((h as f32) * target).round() as u32, h)
    } else {
        // target is taller (or equal): pad top/bottom
        (w, ((w as f32) / target).round() as u32)
    };

    let mut out = Image::filled(out_w.max(w), out_h.max(h), fill);
    let off_x = (out.width() as i32 - w as i32) / 2;
    let off_y = (out.height() as i32 - h as i32) / 2;
    out.paste(image, off_x, off_y);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn rotate_zero_degrees_is_identity() {
        let img = Image::filled(10, 10, Color::WHITE);
        let rotated = rotate_bilinear(&img, 0.0);
        assert_eq!(rotated.width(), img.width());
        assert_eq!(rotated.height(), img.height());
    }

    #[test]
    fn rotate_90_degrees_swaps_dimensions() {
        let img = Image::filled(10, 20, Color::WHITE);
        let rotated = rotate_bilinear(&img, 90.0);
        assert_eq!(rotated.width(), 20);
        assert_eq!(rotated.height(), 10);
    }

    #[test]
    fn resize_to_same_size_is_identity() {
        let img = Image::filled(5, 5, Color::WHITE);
        let resized = resize_bilinear(&img, 5, 5);
        assert_eq!(resized.width(), 5);
        assert_eq!(resized.height(), 5);
    }

    #[test]
    fn resize_produces_exact_target_dims() {
        let img = Image::filled(100, 50, Color::WHITE);
        let resized = resize_bilinear(&img, 420, 560);
        assert_eq!(resized.width(), 420);
        assert_eq!(resized.height(), 560);
    }

    #[test]
    fn pad_to_aspect_grows_narrower_dimension() {
        let img = Image::filled(100, 100, Color::WHITE);
        let padded = pad_to_aspect(&img, AspectRatio::new(3, 4), Color::BLACK);
        // 3:4 is taller than 1:1, so height should grow.
        assert_eq!(padded.width(), 100);
        assert!(padded.height() > 100);
    }
}
