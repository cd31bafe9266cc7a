//! Geometry primitives shared by the landmark, PIV, and transform-planning code.
//!
//! These are plain floating-point value types with validating constructors; once built, they are
//! never mutated in place. A new value is produced whenever a field would otherwise change.

use std::fmt;

/// A point in image pixel coordinates. Origin is the top-left corner; `y` increases downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// The arithmetic mean of a non-empty slice of points.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn mean(points: &[Point2D]) -> Point2D {
        assert!(!points.is_empty(), "Point2D::mean: empty slice");
        let n = points.len() as f32;
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2D::new(sx / n, sy / n)
    }
}

/// A face bounding box: `(x, y, w, h)` in pixel coordinates, `x`/`y` at the top-left corner.
///
/// Invariant: `w > 0 && h > 0`. Construction validates this (and rejects non-finite values) so that
/// every live `FaceBox` is usable without further checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl FaceBox {
    /// Creates a `FaceBox`, failing if `w` or `h` is non-positive or any field is non-finite.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Result<Self, String> {
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return Err(format!(
                "FaceBox::new: non-finite coordinate(s) ({x}, {y}, {w}, {h})"
            ));
        }
        if w <= 0.0 || h <= 0.0 {
            return Err(format!(
                "FaceBox::new: width and height must be positive, got w={w}, h={h}"
            ));
        }
        Ok(Self { x, y, w, h })
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn w(&self) -> f32 {
        self.w
    }

    pub fn h(&self) -> f32 {
        self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Returns a box scaled about its own center by `factor`.
    pub fn scale(&self, factor: f32) -> FaceBox {
        let center = self.center();
        let w = self.w * factor;
        let h = self.h * factor;
        FaceBox {
            x: center.x - w / 2.0,
            y: center.y - h / 2.0,
            w,
            h,
        }
    }

    /// Grows the box symmetrically by `frac` of its width/height on every side.
    pub fn expand(&self, frac: f32) -> FaceBox {
        let dw = self.w * frac;
        let dh = self.h * frac;
        FaceBox {
            x: self.x - dw,
            y: self.y - dh,
            w: self.w + dw * 2.0,
            h: self.h + dh * 2.0,
        }
    }

    /// Intersection-over-union with `other`. `0.0` if the boxes are disjoint.
    pub fn iou(&self, other: &FaceBox) -> f32 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        let inter_w = (x1 - x0).max(0.0);
        let inter_h = (y1 - y0).max(0.0);
        let inter_area = inter_w * inter_h;
        if inter_area <= 0.0 {
            return 0.0;
        }

        let union_area = self.area() + other.area() - inter_area;
        inter_area / union_area
    }
}

/// A closed interval `[min, max]` over an ordered, copyable scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl Range<f32> {
    pub fn new(min: f32, max: f32) -> Self {
        assert!(min <= max, "Range::new: min {min} > max {max}");
        Self { min, max }
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    /// How far outside the range `v` lies, scaled by the range's own size.
    ///
    /// Returns `0.0` if `v` is inside the range. Otherwise returns the absolute distance to the
    /// nearer boundary divided by `max(boundary, 0.001)`, so the result is comparable across
    /// ranges of very different magnitude (a 1px overshoot on a 1000px range is not the same
    /// severity as a 1px overshoot on a 1px range).
    pub fn calculate_deviation(&self, v: f32) -> f32 {
        if self.contains(v) {
            return 0.0;
        }
        let (distance, boundary) = if v < self.min {
            (self.min - v, self.min)
        } else {
            (v - self.max, self.max)
        };
        distance / boundary.abs().max(0.001)
    }
}

/// A confidence value, always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence(f32);

impl Confidence {
    /// Creates a `Confidence`, failing on `NaN`, infinities, or values outside `[0, 1]`.
    pub fn new(value: f32) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("Confidence::new: non-finite value {value}"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("Confidence::new: {value} is outside [0, 1]"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// A normalised crop rectangle: all fields in `[0, 1]`, relative to some reference image.
///
/// Invariant: `left + width <= 1` and `top + height <= 1` (ie. the rectangle doesn't spill past
/// the right or bottom edge of its reference frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl CropRect {
    const EPSILON: f32 = 1e-4;

    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Result<Self, String> {
        let fields = [left, top, width, height];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(format!(
                "CropRect::new: non-finite field(s) in ({left}, {top}, {width}, {height})"
            ));
        }
        if left < 0.0 || top < 0.0 || width <= 0.0 || height <= 0.0 {
            return Err(format!(
                "CropRect::new: left/top must be >= 0 and width/height > 0, got ({left}, {top}, {width}, {height})"
            ));
        }
        if left + width > 1.0 + Self::EPSILON || top + height > 1.0 + Self::EPSILON {
            return Err(format!(
                "CropRect::new: rectangle ({left}, {top}, {width}, {height}) extends past the unit square"
            ));
        }
        Ok(Self {
            left,
            top,
            width: width.min(1.0 - left),
            height: height.min(1.0 - top),
        })
    }

    /// The crop covering the entire reference image.
    pub fn full() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Converts this normalised crop into pixel coordinates against a `reference` resolution.
    pub fn to_pixels(&self, reference: ImageDimensions) -> (i32, i32, u32, u32) {
        let w = reference.width as f32;
        let h = reference.height as f32;
        let x = (self.left * w).round() as i32;
        let y = (self.top * h).round() as i32;
        let width = (self.width * w).round().max(1.0) as u32;
        let height = (self.height * h).round().max(1.0) as u32;
        (x, y, width, height)
    }

    /// Builds a normalised crop from an integer pixel rectangle against `reference`.
    pub fn from_pixels(
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        reference: ImageDimensions,
    ) -> Result<Self, String> {
        let w = reference.width as f32;
        let h = reference.height as f32;
        Self::new(x as f32 / w, y as f32 / h, width as f32 / w, height as f32 / h)
    }
}

/// A positive pixel width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!(
                "ImageDimensions::new: width and height must be nonzero, got {width}x{height}"
            ));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// An integer-pixel bounding box on an output canvas.
///
/// Invariant: `x >= 0 && y >= 0 && w > 0 && h > 0`, and the box lies within its canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiBoundingBox {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl RoiBoundingBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32, canvas: ImageDimensions) -> Result<Self, String> {
        if w == 0 || h == 0 {
            return Err(format!("RoiBoundingBox::new: w/h must be nonzero, got {w}x{h}"));
        }
        if x + w > canvas.width || y + h > canvas.height {
            return Err(format!(
                "RoiBoundingBox::new: box ({x}, {y}, {w}, {h}) does not fit within {}x{} canvas",
                canvas.width, canvas.height
            ));
        }
        Ok(Self { x, y, w, h })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn w(&self) -> u32 {
        self.w
    }

    pub fn h(&self) -> u32 {
        self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn face_box_rejects_nonpositive_dims() {
        assert!(FaceBox::new(0.0, 0.0, 0.0, 10.0).is_err());
        assert!(FaceBox::new(0.0, 0.0, 10.0, -1.0).is_err());
    }

    #[test]
    fn iou_self_is_one() {
        let b = FaceBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert_relative_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn iou_disjoint_is_zero() {
        let a = FaceBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = FaceBox::new(100.0, 100.0, 10.0, 10.0).unwrap();
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn contains_center() {
        let b = FaceBox::new(0.0, 0.0, 10.0, 20.0).unwrap();
        assert!(b.contains(b.center()));
    }

    #[test]
    fn distance_is_symmetric_and_zero_for_self() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_relative_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn confidence_rejects_out_of_range_and_nan() {
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f32::NAN).is_err());
        assert!(Confidence::new(f32::INFINITY).is_err());
        assert!(Confidence::new(0.5).is_ok());
    }

    #[test]
    fn range_deviation_is_zero_inside() {
        let r = Range::new(0.5, 0.7);
        assert_eq!(r.calculate_deviation(0.6), 0.0);
        assert_eq!(r.calculate_deviation(0.5), 0.0);
        assert_eq!(r.calculate_deviation(0.7), 0.0);
    }

    #[test]
    fn range_deviation_scales_with_boundary() {
        let r = Range::new(0.0, 100.0);
        assert_relative_eq!(r.calculate_deviation(110.0), 10.0 / 100.0);
    }

    #[test]
    fn crop_rect_round_trips_through_pixels() {
        let dims = ImageDimensions::new(800, 600).unwrap();
        let rect = CropRect::from_pixels(100, 50, 400, 300, dims).unwrap();
        let (x, y, w, h) = rect.to_pixels(dims);
        assert_eq!((x, y, w, h), (100, 50, 400, 300));
    }

    #[test]
    fn crop_rect_rejects_spilling_past_unit_square() {
        assert!(CropRect::new(0.6, 0.0, 0.6, 1.0).is_err());
    }
}
