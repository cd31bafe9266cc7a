//! Capability interfaces for the external collaborators this crate depends on: a face detector, a
//! 68-point landmark extractor, and a JPEG 2000 encoder.
//!
//! None of the three is implemented here. Model inference and codec internals are out of scope;
//! callers supply their own implementations (an ONNX session, a vendored codec binding, ...) and
//! hand them to [`crate::pipeline::process`]. These traits are the entire contract.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::geometry::{Confidence, FaceBox, Point2D};
use crate::roi::RoiRegion;

/// A single detected face, as reported by a [`FaceDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawFaceDetection {
    pub face_box: FaceBox,
    pub confidence: Confidence,
    /// Optional 5-point landmarks (eyes, nose tip, mouth corners), when the detector provides
    /// them cheaply alongside the bounding box. Unused by the planner, which always calls the
    /// full [`LandmarkExtractor`]; kept for detectors that expose it and callers that want it.
    pub landmarks_5pt: Option<[Point2D; 5]>,
}

/// Detects faces in a decoded RGBA raster.
///
/// Implementations typically wrap a neural network (eg. RetinaFace) run to completion inside
/// `detect`; `cancel` is checked cooperatively, not preemptively, so long-running implementations
/// should poll it between inference steps where practical.
///
/// The pipeline is generic over this trait rather than boxing it as `dyn`: detectors and
/// extractors are loaded once per process and threaded through every call, so static dispatch
/// costs nothing and avoids pinning every future by hand.
pub trait FaceDetector: Send + Sync {
    /// Returns every detected face, unfiltered by confidence. The caller applies
    /// [`crate::options::ProcessingOptions::min_face_confidence`] and the single-face policy.
    fn detect(
        &self,
        rgba: &facepiv_image::Image,
        cancel: &CancellationToken,
    ) -> impl Future<Output = anyhow::Result<Vec<RawFaceDetection>>> + Send;
}

/// Extracts the full 68-point landmark set for one face.
pub trait LandmarkExtractor: Send + Sync {
    /// `face_box` is the detector's box in `rgba`'s coordinate space; implementations are free to
    /// crop around it internally before running inference.
    fn extract(
        &self,
        rgba: &facepiv_image::Image,
        face_box: FaceBox,
        cancel: &CancellationToken,
    ) -> impl Future<Output = anyhow::Result<[Point2D; 68]>> + Send;
}

/// Encodes a 420x560 RGBA raster as a JPEG 2000 byte stream with an optional ROI.
///
/// When `roi` is `Some`, the codestream must use the maxshift ROI method over that region at
/// priority 3. `base_rate_bpp` is the requested bits-per-pixel; the codec is free to undershoot it
/// (lossless regions, quantisation granularity) but should not wildly overshoot it.
pub trait Jp2kEncoder: Send + Sync {
    fn encode(
        &self,
        rgba_420x560: &facepiv_image::Image,
        roi: Option<&RoiRegion>,
        base_rate_bpp: f32,
        roi_start_level: u8,
        roi_align: bool,
        cancel: &CancellationToken,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}
