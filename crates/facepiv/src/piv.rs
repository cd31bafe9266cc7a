//! PIV compliance geometry: the "AA/BB/CC" lines defined by INCITS 385-2004 and their validation
//! against a rendered canvas.

use crate::geometry::Range;
use crate::landmarks::Landmarks68;

/// The three INCITS 385-2004 compliance lines, derived from a landmark set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivComplianceLines {
    /// `Line AA`: the vertical line midway between the nose and mouth centers.
    pub line_aa_x: f32,
    /// `Line BB`: the horizontal line through the midpoint of the two eye centers.
    pub line_bb_y: f32,
    /// `Line CC`: the head width, measured between the jaw-contour extrema.
    pub line_cc_width: f32,
    /// The y coordinate at which both ears are level, for visualisation purposes.
    pub level_ear_y: f32,
}

/// Computes [`PivComplianceLines`] from a landmark set. A pure function of the landmarks.
pub fn calculate_piv_lines(lm: &Landmarks68) -> PivComplianceLines {
    let nose = lm.nose_center();
    let mouth = lm.mouth_center();
    let left_eye = lm.left_eye_center();
    let right_eye = lm.right_eye_center();
    let left_ext = lm.left_extremum();
    let right_ext = lm.right_extremum();

    PivComplianceLines {
        line_aa_x: (nose.x + mouth.x) / 2.0,
        line_bb_y: (left_eye.y + right_eye.y) / 2.0,
        line_cc_width: right_ext.x - left_ext.x,
        level_ear_y: (left_ext.y + right_ext.y) / 2.0,
        // nose/mouth retained for the AA check below via the caller, so we stash nothing extra here.
    }
}

/// How severely a [`PivComplianceValidation`] misses the PIV geometry targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Compliant,
    Low,
    Medium,
    High,
    Critical,
}

/// The result of validating [`PivComplianceLines`] against an image's actual dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct PivComplianceValidation {
    pub is_aa_aligned: bool,
    pub is_bb_positioned: bool,
    pub is_cc_ratio_valid: bool,
    pub is_fully_compliant: bool,
    pub severity: Severity,
    /// Signed offset of Line AA from the image's vertical center, in pixels.
    pub aa_deviation_px: f32,
    /// Eye line position as a fraction of image height measured from the bottom (`0.5..=0.7` is
    /// compliant, `0.6` is optimal).
    pub bb_fraction_from_bottom: f32,
    /// `image_width / LineCC_Width`; must be `>= 1.75` to comply.
    pub cc_ratio: f32,
    /// The minimum head width, in pixels, that would satisfy the CC ratio requirement.
    pub min_required_head_width: f32,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

const AA_MAX_DEVIATION_PX: f32 = 10.0;
const AA_MAX_NOSE_MOUTH_OFFSET_PX: f32 = 8.0;
const BB_OPTIMAL: f32 = 0.60;
const CC_MIN_RATIO: f32 = 1.75;
const CC_EPSILON: f32 = 0.001;

/// Validates a set of PIV compliance lines against the image dimensions `(width, height)`.
///
/// `nose_mouth_x_offset` is `|NoseCenter.x - MouthCenter.x|`; the AA check requires both the line
/// itself be centered *and* the nose/mouth be roughly vertically aligned with each other, since a
/// centered AA line can otherwise hide a tilted nose/mouth axis.
pub fn validate(
    lines: &PivComplianceLines,
    nose_mouth_x_offset: f32,
    width: f32,
    height: f32,
) -> PivComplianceValidation {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let aa_deviation_px = lines.line_aa_x - width / 2.0;
    let is_aa_aligned =
        aa_deviation_px.abs() <= AA_MAX_DEVIATION_PX && nose_mouth_x_offset <= AA_MAX_NOSE_MOUTH_OFFSET_PX;
    if !is_aa_aligned {
        issues.push(format!(
            "Line AA is {:.1}px off-center (limit {AA_MAX_DEVIATION_PX}px); nose/mouth x-offset is {:.1}px (limit {AA_MAX_NOSE_MOUTH_OFFSET_PX}px)",
            aa_deviation_px, nose_mouth_x_offset
        ));
        recommendations.push(format!(
            "Shift the crop {:.1}px {} to center Line AA",
            aa_deviation_px.abs(),
            if aa_deviation_px > 0.0 { "left" } else { "right" }
        ));
    }

    let bb_fraction_from_bottom = (height - lines.line_bb_y) / height;
    let bb_range = Range::new(0.50, 0.70);
    let is_bb_positioned = bb_range.contains(bb_fraction_from_bottom);
    if !is_bb_positioned {
        let target_y = height * (1.0 - BB_OPTIMAL);
        let shift_px = lines.line_bb_y - target_y;
        issues.push(format!(
            "Eye line sits at {:.1}% from the bottom (must be 50-70%, optimal 60%)",
            bb_fraction_from_bottom * 100.0
        ));
        recommendations.push(format!(
            "Shift the eye line {:.1}px {} to reach the optimal 60% position",
            shift_px.abs(),
            if shift_px > 0.0 { "up" } else { "down" }
        ));
    }

    let cc_ratio = width / lines.line_cc_width;
    let is_cc_ratio_valid = cc_ratio >= CC_MIN_RATIO - CC_EPSILON;
    let min_required_head_width = width / CC_MIN_RATIO;
    if !is_cc_ratio_valid {
        issues.push(format!(
            "Head width ratio is {cc_ratio:.3} (must be >= {CC_MIN_RATIO})"
        ));
        recommendations.push(format!(
            "Reduce head width to at most {min_required_head_width:.1}px, or widen the canvas"
        ));
    }

    let is_fully_compliant = is_aa_aligned && is_bb_positioned && is_cc_ratio_valid;
    let failed_count = [!is_aa_aligned, !is_bb_positioned, !is_cc_ratio_valid]
        .iter()
        .filter(|f| **f)
        .count();
    let severity = match failed_count {
        0 => Severity::Compliant,
        _ if failed_count >= 3 => Severity::Critical,
        _ if !is_cc_ratio_valid => Severity::High,
        _ if !is_bb_positioned => Severity::Medium,
        _ => Severity::Low,
    };

    PivComplianceValidation {
        is_aa_aligned,
        is_bb_positioned,
        is_cc_ratio_valid,
        is_fully_compliant,
        severity,
        aa_deviation_px,
        bb_fraction_from_bottom,
        cc_ratio,
        min_required_head_width,
        issues,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::level_face;

    #[test]
    fn fully_compliant_iff_all_three_hold() {
        // Chosen so width/cc_width >= 1.75, eye line in range, and AA centered.
        let lm = level_face(210.0, 280.0, 70.0, 120.0);
        let lines = calculate_piv_lines(&lm);
        let nose = lm.nose_center();
        let mouth = lm.mouth_center();
        let validation = validate(&lines, (nose.x - mouth.x).abs(), 420.0, 560.0);

        assert_eq!(
            validation.is_fully_compliant,
            validation.is_aa_aligned && validation.is_bb_positioned && validation.is_cc_ratio_valid
        );
    }

    #[test]
    fn cc_ratio_exactly_at_threshold_is_compliant() {
        let lines = PivComplianceLines {
            line_aa_x: 210.0,
            line_bb_y: 224.0, // (560 - 224) / 560 = 0.6
            line_cc_width: 420.0 / 1.75,
            level_ear_y: 0.0,
        };
        let validation = validate(&lines, 0.0, 420.0, 560.0);
        assert!(validation.is_cc_ratio_valid);
    }

    #[test]
    fn bb_boundaries_are_inclusive() {
        let mut lines = PivComplianceLines {
            line_aa_x: 210.0,
            line_bb_y: 280.0,
            line_cc_width: 240.0,
            level_ear_y: 0.0,
        };

        lines.line_bb_y = 560.0 * (1.0 - 0.50);
        assert!(validate(&lines, 0.0, 420.0, 560.0).is_bb_positioned);

        lines.line_bb_y = 560.0 * (1.0 - 0.70);
        assert!(validate(&lines, 0.0, 420.0, 560.0).is_bb_positioned);
    }

    #[test]
    fn severity_orders_as_documented() {
        assert!(Severity::Compliant < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
