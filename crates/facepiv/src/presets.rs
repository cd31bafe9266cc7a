//! Named, pre-filled [`ProcessingOptions`] for common deployment targets.
//!
//! These mirror the option combinations credentialing programs actually ask for (TWIC's 14 KB
//! cap, archival-quality capture) rather than being an exhaustive options explorer.

use std::time::Duration;

use crate::options::{EncodingStrategy, ProcessingOptions};

/// TWIC's mandated 14 KB facial image cap.
pub fn twic_max() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::TargetSize { bytes: 14_000 },
        roi_start_level: 2,
        min_face_confidence: 0.8,
        ..ProcessingOptions::default()
    }
}

/// The smallest size PIV deployments typically accept, with aggressive ROI priority.
pub fn piv_min() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::TargetSize { bytes: 12_000 },
        roi_start_level: 1,
        min_face_confidence: 0.8,
        ..ProcessingOptions::default()
    }
}

/// The default PIV working point: a reasonable size/quality trade-off.
pub fn piv_balanced() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::TargetSize { bytes: 20_000 },
        roi_start_level: 3,
        min_face_confidence: 0.8,
        ..ProcessingOptions::default()
    }
}

/// Higher-quality PIV capture for enrollment stations with generous storage budgets.
pub fn piv_high() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::TargetSize { bytes: 30_000 },
        roi_start_level: 3,
        min_face_confidence: 0.8,
        ..ProcessingOptions::default()
    }
}

/// Fixed high-rate encoding for long-term storage, with strict confidence and metadata kept.
pub fn archival() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::FixedRate { bpp: 4.0 },
        roi_start_level: 3,
        min_face_confidence: 0.95,
        preserve_metadata: true,
        ..ProcessingOptions::default()
    }
}

/// Low-latency encoding for interactive capture kiosks, trading quality for speed.
pub fn fast() -> ProcessingOptions {
    ProcessingOptions {
        strategy: EncodingStrategy::FixedRate { bpp: 0.5 },
        roi_start_level: 0,
        min_face_confidence: 0.7,
        processing_timeout: Duration::from_secs(10),
        max_retries: 1,
        ..ProcessingOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_internally_valid() {
        for opts in [
            twic_max(),
            piv_min(),
            piv_balanced(),
            piv_high(),
            archival(),
            fast(),
        ] {
            opts.validate().expect("preset must be internally valid");
        }
    }

    #[test]
    fn twic_max_respects_the_regulatory_cap() {
        assert_eq!(
            twic_max().strategy,
            EncodingStrategy::TargetSize { bytes: 14_000 }
        );
    }

    #[test]
    fn fast_uses_a_short_timeout() {
        assert!(fast().processing_timeout <= Duration::from_secs(10));
    }
}
