//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the encoder should pick its target bitrate.
///
/// Modeled as a tagged sum rather than a trait object hierarchy: there are exactly two ways to
/// drive the encoder, and callers need to pattern-match on which one is in play (eg. a UI showing
/// "encoding to 14 KB" vs "encoding at 2.0 bpp").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Encode once at a fixed bits-per-pixel rate.
    FixedRate { bpp: f32 },
    /// Search the rate table for the highest quality that still fits under `bytes * 0.95`.
    TargetSize { bytes: usize },
}

/// Configuration for a single [`crate::pipeline::process`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub min_face_confidence: f32,
    pub require_single_face: bool,
    pub max_retries: u32,
    #[serde(with = "duration_secs")]
    pub processing_timeout: Duration,
    pub preserve_metadata: bool,
    /// How many resolution levels participate in ROI priority coding (0 = most aggressive
    /// transition, 3 = smoothest).
    pub roi_start_level: u8,
    pub enable_roi: bool,
    pub align_roi: bool,
    pub strategy: EncodingStrategy,
    /// When set, a transform that fails PIV compliance is reported as
    /// [`crate::Error::NotPivCompliant`] instead of succeeding with the validation attached to the
    /// result. Off by default: compliance is informational unless a caller opts into strictness.
    pub strict_compliance: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            min_face_confidence: 0.8,
            require_single_face: true,
            max_retries: 2,
            processing_timeout: Duration::from_secs(30),
            preserve_metadata: false,
            roi_start_level: 3,
            enable_roi: true,
            align_roi: false,
            strategy: EncodingStrategy::TargetSize { bytes: 20_000 },
            strict_compliance: false,
        }
    }
}

impl ProcessingOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_face_confidence) {
            return Err(format!(
                "min_face_confidence must be in [0, 1], got {}",
                self.min_face_confidence
            ));
        }
        if self.roi_start_level > 3 {
            return Err(format!(
                "roi_start_level must be in [0, 3], got {}",
                self.roi_start_level
            ));
        }
        match self.strategy {
            EncodingStrategy::FixedRate { bpp } if bpp <= 0.0 => {
                Err(format!("FixedRate bpp must be positive, got {bpp}"))
            }
            EncodingStrategy::TargetSize { bytes } if bytes == 0 => {
                Err("TargetSize bytes must be nonzero".to_string())
            }
            _ => Ok(()),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs_f64().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ProcessingOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut opts = ProcessingOptions::default();
        opts.min_face_confidence = 1.5;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let opts = ProcessingOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let decoded: ProcessingOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, decoded);
    }

    #[test]
    fn strategy_tag_is_stable_in_serialized_form() {
        let strategy = EncodingStrategy::TargetSize { bytes: 14_000 };
        let json = serde_json::to_string(&strategy).unwrap();
        assert_eq!(json, r#"{"kind":"target_size","bytes":14000}"#);
    }
}
