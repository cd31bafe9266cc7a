//! The 68-point facial landmark topology and its derived facial-feature points.
//!
//! Index ranges follow the widely used 68-point scheme (the same one produced by dlib's and
//! PFLD-style landmark models):
//!
//! - `0..=16`  jaw contour, left to right
//! - `17..=21` left brow, `22..=26` right brow
//! - `27..=30` nose bridge, `31..=35` nostrils
//! - `36..=41` left eye, `42..=47` right eye
//! - `48..=67` mouth (outer ring clockwise, then inner ring)

use crate::geometry::Point2D;

pub const LANDMARK_COUNT: usize = 68;

const JAW: std::ops::RangeInclusive<usize> = 0..=16;
const LEFT_EYE: std::ops::RangeInclusive<usize> = 36..=41;
const RIGHT_EYE: std::ops::RangeInclusive<usize> = 42..=47;
const NOSE_BRIDGE: std::ops::RangeInclusive<usize> = 27..=30;

const MOUTH_LEFT_CORNER: usize = 48;
const MOUTH_RIGHT_CORNER: usize = 54;
const MOUTH_TOP_CENTER: usize = 51;
const MOUTH_BOTTOM_CENTER: usize = 57;

/// An ordered, exactly-68-point facial landmark set.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks68 {
    points: [Point2D; LANDMARK_COUNT],
}

impl Landmarks68 {
    /// Builds a `Landmarks68` from exactly 68 points, in canonical order.
    ///
    /// Fails if `points` doesn't have exactly 68 entries, or if any coordinate is non-finite.
    pub fn new(points: &[Point2D]) -> Result<Self, String> {
        if points.len() != LANDMARK_COUNT {
            return Err(format!(
                "Landmarks68::new: expected {LANDMARK_COUNT} points, got {}",
                points.len()
            ));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err("Landmarks68::new: landmark coordinates must be finite".to_string());
        }

        let mut arr = [Point2D::new(0.0, 0.0); LANDMARK_COUNT];
        arr.copy_from_slice(points);
        Ok(Self { points: arr })
    }

    pub fn point(&self, index: usize) -> Point2D {
        self.points[index]
    }

    pub fn points(&self) -> &[Point2D; LANDMARK_COUNT] {
        &self.points
    }

    fn mean_of(&self, indices: impl Iterator<Item = usize>) -> Point2D {
        let pts: Vec<Point2D> = indices.map(|i| self.points[i]).collect();
        Point2D::mean(&pts)
    }

    /// Mean of the 6 left-eye contour points (indices 36-41).
    pub fn left_eye_center(&self) -> Point2D {
        self.mean_of(LEFT_EYE)
    }

    /// Mean of the 6 right-eye contour points (indices 42-47).
    pub fn right_eye_center(&self) -> Point2D {
        self.mean_of(RIGHT_EYE)
    }

    /// Mean of the 4 nose-bridge points (indices 27-30).
    pub fn nose_center(&self) -> Point2D {
        self.mean_of(NOSE_BRIDGE)
    }

    /// Mean of the 4 mouth-corner/center points (indices 48, 51, 54, 57).
    pub fn mouth_center(&self) -> Point2D {
        let pts = [
            self.points[MOUTH_LEFT_CORNER],
            self.points[MOUTH_TOP_CENTER],
            self.points[MOUTH_RIGHT_CORNER],
            self.points[MOUTH_BOTTOM_CENTER],
        ];
        Point2D::mean(&pts)
    }

    /// The jaw-contour point (indices 0-16) with the smallest x coordinate.
    pub fn left_extremum(&self) -> Point2D {
        JAW.map(|i| self.points[i])
            .min_by(|a, b| a.x.partial_cmp(&b.x).expect("jaw coordinates must be finite"))
            .expect("JAW range is never empty")
    }

    /// The jaw-contour point (indices 0-16) with the largest x coordinate.
    pub fn right_extremum(&self) -> Point2D {
        JAW.map(|i| self.points[i])
            .max_by(|a, b| a.x.partial_cmp(&b.x).expect("jaw coordinates must be finite"))
            .expect("JAW range is never empty")
    }
}

/// Builds a synthetic, front-facing, level 68-point mesh centered at `(cx, cy)` with the given
/// inter-ocular distance `eye_dist` and jaw half-width `jaw_half_width`.
///
/// This is not a landmark model: it places every point where a level, centered face would put it,
/// regardless of what's actually in the image. It exists for two consumers: crate-internal tests
/// that need a plausible landmark set without wiring up a real model, and the CLI's placeholder
/// [`crate::external::LandmarkExtractor`], which has the same problem in production.
pub fn synthetic_level_face(cx: f32, cy: f32, eye_dist: f32, jaw_half_width: f32) -> [Point2D; LANDMARK_COUNT] {
    let mut pts = [Point2D::new(cx, cy); LANDMARK_COUNT];

    // Jaw contour: spread evenly from left to right at face-bottom height.
    let jaw_y = cy + eye_dist * 1.3;
    for (i, idx) in JAW.enumerate() {
        let t = i as f32 / 16.0;
        pts[idx] = Point2D::new(cx - jaw_half_width + 2.0 * jaw_half_width * t, jaw_y);
    }

    let eye_y = cy;
    for idx in LEFT_EYE {
        pts[idx] = Point2D::new(cx - eye_dist / 2.0, eye_y);
    }
    for idx in RIGHT_EYE {
        pts[idx] = Point2D::new(cx + eye_dist / 2.0, eye_y);
    }
    for idx in NOSE_BRIDGE {
        pts[idx] = Point2D::new(cx, cy + eye_dist * 0.3);
    }

    let mouth_y = cy + eye_dist * 0.8;
    pts[MOUTH_LEFT_CORNER] = Point2D::new(cx - eye_dist / 3.0, mouth_y);
    pts[MOUTH_RIGHT_CORNER] = Point2D::new(cx + eye_dist / 3.0, mouth_y);
    pts[MOUTH_TOP_CENTER] = Point2D::new(cx, mouth_y - 2.0);
    pts[MOUTH_BOTTOM_CENTER] = Point2D::new(cx, mouth_y + 2.0);

    pts
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Wraps [`synthetic_level_face`] as a ready-to-use [`Landmarks68`] for tests across the crate.
    pub fn level_face(cx: f32, cy: f32, eye_dist: f32, jaw_half_width: f32) -> Landmarks68 {
        Landmarks68::new(&synthetic_level_face(cx, cy, eye_dist, jaw_half_width)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::level_face;
    use super::*;

    #[test]
    fn rejects_wrong_point_count() {
        let pts = vec![Point2D::new(0.0, 0.0); 67];
        assert!(Landmarks68::new(&pts).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut pts = vec![Point2D::new(0.0, 0.0); LANDMARK_COUNT];
        pts[10] = Point2D::new(f32::NAN, 0.0);
        assert!(Landmarks68::new(&pts).is_err());
    }

    #[test]
    fn eye_centers_are_symmetric_for_level_face() {
        let lm = level_face(400.0, 300.0, 100.0, 150.0);
        let left = lm.left_eye_center();
        let right = lm.right_eye_center();
        assert_eq!(left.y, right.y);
        assert!(left.x < right.x);
    }

    #[test]
    fn jaw_extrema_bracket_the_contour() {
        let lm = level_face(400.0, 300.0, 100.0, 150.0);
        assert!(lm.left_extremum().x <= lm.right_extremum().x);
    }
}
