//! The tagged result type used throughout the pipeline.
//!
//! Every fallible operation in this crate returns `Result<T, Error>` instead of panicking or
//! throwing; panics are reserved for programmer errors (broken invariants passed to `debug_assert!`
//! in test builds), never for conditions a caller could hit in practice.

use crate::piv::PivComplianceValidation;

/// Errors produced while running the PIV facial image pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input image: {0}")]
    InvalidInput(String),

    #[error("no face detected above the configured confidence threshold")]
    NoFaceDetected,

    #[error("expected exactly one face, found {0}")]
    MultipleFacesDetected(usize),

    #[error("best face confidence {0:.3} is below the configured threshold")]
    LowConfidence(f32),

    #[error("invalid landmarks: {0}")]
    InvalidLandmarks(String),

    #[error("computed crop region does not fit within the source image: {0}")]
    CropBoundsExceeded(String),

    #[error("rotation {0} degrees is outside the allowed [-45, 45] range")]
    RotationOutOfRange(f32),

    #[error("transformed image failed PIV compliance: {0:?}")]
    NotPivCompliant(PivComplianceValidation),

    #[error("encoder failed for every attempted rate: {0}")]
    EncodingFailed(#[source] anyhow::Error),

    #[error(
        "could not meet target size {requested} bytes (closest attempt: {best_size} bytes at {best_rate} bpp)"
    )]
    CannotMeetSize {
        requested: usize,
        best_size: usize,
        best_rate: f32,
    },

    #[error("operation was cancelled")]
    Cancelled,

    #[error("operation timed out")]
    Timeout,

    #[error("external component failed: {0}")]
    External(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
