//! Pipeline orchestrator (C8): sequences detect -> landmark -> plan -> execute -> encode, enforces
//! confidence thresholds and a wall-clock deadline, and assembles the final result.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use facepiv_utils::{num::TotalF32, timer::Timer};

use crate::encode::{self, EncodingResult};
use crate::error::{Error, Result};
use crate::external::{FaceDetector, Jp2kEncoder, LandmarkExtractor, RawFaceDetection};
use crate::geometry::ImageDimensions;
use crate::landmarks::Landmarks68;
use crate::options::ProcessingOptions;
use crate::piv::{self, PivComplianceValidation};
use crate::roi;
use crate::transform::{self, PivTransform};

/// The full result of a successful [`process`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub encoded_bytes: Vec<u8>,
    pub source_dimensions: ImageDimensions,
    pub transformed_dimensions: ImageDimensions,
    pub applied_transform: PivTransform,
    pub compliance_validation: PivComplianceValidation,
    pub actual_rate: f32,
    pub actual_size: usize,
    pub target_size: Option<usize>,
}

/// Runs the full PIV facial-image pipeline over `bytes`, using `detector`/`extractor`/`encoder`
/// as the external collaborators and `options` to parameterize every stage.
///
/// `cancel` is checked cooperatively before each suspension point (detector inference, landmark
/// inference, and each encoder call inside the target-size search); a caller that wants to abort
/// an in-flight call should call `cancel.cancel()` from another task. Independently, a wall-clock
/// deadline of `options.processing_timeout` aborts the whole call and returns [`Error::Timeout`].
pub async fn process<D, L, E>(
    bytes: &[u8],
    options: &ProcessingOptions,
    detector: &D,
    extractor: &L,
    encoder: &E,
    cancel: &CancellationToken,
) -> Result<ProcessingResult>
where
    D: FaceDetector,
    L: LandmarkExtractor,
    E: Jp2kEncoder,
{
    options.validate().map_err(Error::InvalidInput)?;

    match tokio::time::timeout(
        options.processing_timeout,
        run(bytes, options, detector, extractor, encoder, cancel),
    )
    .await
    {
        Ok(result) => result,
        Err(_elapsed) => {
            cancel.cancel();
            Err(Error::Timeout)
        }
    }
}

async fn run<D, L, E>(
    bytes: &[u8],
    options: &ProcessingOptions,
    detector: &D,
    extractor: &L,
    encoder: &E,
    cancel: &CancellationToken,
) -> Result<ProcessingResult>
where
    D: FaceDetector,
    L: LandmarkExtractor,
    E: Jp2kEncoder,
{
    let mut t_decode = Timer::new("decode");
    let img = t_decode
        .time(|| facepiv_image::Image::decode(bytes))
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    let source_dimensions = ImageDimensions::new(img.width(), img.height()).map_err(Error::InvalidInput)?;
    log::debug!(
        "decoded {}x{} source image in {:?}",
        source_dimensions.width,
        source_dimensions.height,
        t_decode.last()
    );

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let detect_start = Instant::now();
    let detections = detector.detect(&img, cancel).await.map_err(Error::External)?;
    log::debug!("detected {} candidate face(s) in {:?}", detections.len(), detect_start.elapsed());
    let face = select_primary_face(detections, options)?;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let extract_start = Instant::now();
    let points = extractor
        .extract(&img, face.face_box, cancel)
        .await
        .map_err(Error::External)?;
    log::debug!("extracted landmarks in {:?}", extract_start.elapsed());
    let landmarks = Landmarks68::new(&points).map_err(Error::InvalidLandmarks)?;

    let mut t_plan = Timer::new("plan");
    let transform = t_plan.time(|| {
        transform::plan(
            landmarks.left_eye_center(),
            landmarks.right_eye_center(),
            face.face_box,
            source_dimensions,
        )
    })?;
    log::debug!(
        "planned transform (rotation {:.2} deg) in {:?}",
        transform.rotation_degrees(),
        t_plan.last()
    );

    let mut t_execute = Timer::new("execute");
    let canvas = t_execute.time(|| transform::execute(&transform, &img))?;
    let transformed_dimensions = ImageDimensions::new(canvas.width(), canvas.height())
        .map_err(Error::InvalidInput)?;
    log::debug!(
        "executed transform to {}x{} canvas in {:?}",
        transformed_dimensions.width,
        transformed_dimensions.height,
        t_execute.last()
    );

    let remapped_points: Vec<_> = landmarks
        .points()
        .iter()
        .map(|&p| transform::remap_point(&transform, source_dimensions, p))
        .collect();
    let remapped = Landmarks68::new(&remapped_points).map_err(Error::InvalidLandmarks)?;
    let lines = piv::calculate_piv_lines(&remapped);
    let nose_mouth_offset = (remapped.nose_center().x - remapped.mouth_center().x).abs();
    let validation = piv::validate(
        &lines,
        nose_mouth_offset,
        transformed_dimensions.width as f32,
        transformed_dimensions.height as f32,
    );
    if options.strict_compliance && !validation.is_fully_compliant {
        return Err(Error::NotPivCompliant(validation));
    }

    let roi_set = options
        .enable_roi
        .then(|| roi::inner_region_for(transformed_dimensions))
        .transpose()
        .map_err(Error::InvalidInput)?;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let encode_start = Instant::now();
    let EncodingResult {
        data,
        actual_rate,
        actual_size,
        target_size,
    } = encode::execute(
        &options.strategy,
        &canvas,
        roi_set.as_ref().map(|set| &set.inner_region),
        encoder,
        options,
        cancel,
    )
    .await?;
    log::debug!(
        "encoded {} bytes at {:.2} bpp in {:?} (PIV compliant: {})",
        data.len(),
        actual_rate,
        encode_start.elapsed(),
        validation.is_fully_compliant
    );

    Ok(ProcessingResult {
        encoded_bytes: data,
        source_dimensions,
        transformed_dimensions,
        applied_transform: transform,
        compliance_validation: validation,
        actual_rate,
        actual_size,
        target_size,
    })
}

fn select_primary_face(
    detections: Vec<RawFaceDetection>,
    options: &ProcessingOptions,
) -> Result<RawFaceDetection> {
    if detections.is_empty() {
        return Err(Error::NoFaceDetected);
    }

    let candidates: Vec<_> = detections
        .iter()
        .filter(|d| d.confidence.value() >= options.min_face_confidence)
        .cloned()
        .collect();

    if candidates.is_empty() {
        let best_confidence = detections
            .iter()
            .map(|d| d.confidence.value())
            .fold(f32::MIN, f32::max);
        return Err(Error::LowConfidence(best_confidence));
    }
    if options.require_single_face && candidates.len() != 1 {
        return Err(Error::MultipleFacesDetected(candidates.len()));
    }

    Ok(candidates
        .into_iter()
        .max_by_key(|d| (TotalF32(d.confidence.value()), TotalF32(d.face_box.area())))
        .expect("candidates is non-empty"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::ReferenceEncoder;
    use crate::geometry::{Confidence, FaceBox, Point2D};
    use crate::landmarks::fixtures::level_face;
    use facepiv_image::{Color, Image};

    struct StubDetector(Vec<RawFaceDetection>);

    impl FaceDetector for StubDetector {
        async fn detect(
            &self,
            _rgba: &Image,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<Vec<RawFaceDetection>> {
            Ok(self.0.clone())
        }
    }

    struct StubExtractor(Landmarks68);

    impl LandmarkExtractor for StubExtractor {
        async fn extract(
            &self,
            _rgba: &Image,
            _face_box: FaceBox,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<[Point2D; 68]> {
            Ok(*self.0.points())
        }
    }

    fn encode_png(img: &Image) -> Vec<u8> {
        let dyn_img = image::RgbaImage::from_raw(img.width(), img.height(), img.data().to_vec())
            .expect("valid raster");
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(dyn_img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn no_face_detected_fails_with_no_face_detected() {
        let img = Image::filled(800, 600, Color::from_rgb8(128, 128, 128));
        let bytes = encode_png(&img);

        let detector = StubDetector(vec![]);
        let extractor = StubExtractor(level_face(400.0, 300.0, 100.0, 150.0));
        let encoder = ReferenceEncoder;
        let options = ProcessingOptions::default();
        let cancel = CancellationToken::new();

        let result = process(&bytes, &options, &detector, &extractor, &encoder, &cancel).await;
        assert!(matches!(result, Err(Error::NoFaceDetected)));
    }

    #[tokio::test]
    async fn a_face_below_the_confidence_threshold_fails_with_low_confidence() {
        let img = Image::filled(800, 600, Color::from_rgb8(128, 128, 128));
        let bytes = encode_png(&img);

        let face = RawFaceDetection {
            face_box: FaceBox::new(100.0, 100.0, 200.0, 250.0).unwrap(),
            confidence: Confidence::new(0.5).unwrap(),
            landmarks_5pt: None,
        };
        let detector = StubDetector(vec![face]);
        let extractor = StubExtractor(level_face(400.0, 300.0, 100.0, 150.0));
        let encoder = ReferenceEncoder;
        let options = ProcessingOptions::default();
        let cancel = CancellationToken::new();

        let result = process(&bytes, &options, &detector, &extractor, &encoder, &cancel).await;
        assert!(matches!(result, Err(Error::LowConfidence(_))));
    }

    #[tokio::test]
    async fn two_faces_with_require_single_face_fails_with_multiple_faces() {
        let img = Image::filled(800, 600, Color::from_rgb8(128, 128, 128));
        let bytes = encode_png(&img);

        let face = RawFaceDetection {
            face_box: FaceBox::new(100.0, 100.0, 200.0, 250.0).unwrap(),
            confidence: Confidence::new(0.9).unwrap(),
            landmarks_5pt: None,
        };
        let detector = StubDetector(vec![face.clone(), face]);
        let extractor = StubExtractor(level_face(400.0, 300.0, 100.0, 150.0));
        let encoder = ReferenceEncoder;
        let options = ProcessingOptions::default();
        let cancel = CancellationToken::new();

        let result = process(&bytes, &options, &detector, &extractor, &encoder, &cancel).await;
        assert!(matches!(result, Err(Error::MultipleFacesDetected(2))));
    }

    #[tokio::test]
    async fn a_plausible_single_face_image_produces_a_result_within_the_target_cap() {
        let img = Image::filled(800, 600, Color::from_rgb8(128, 128, 128));
        let bytes = encode_png(&img);

        let face = RawFaceDetection {
            face_box: FaceBox::new(300.0, 150.0, 200.0, 250.0).unwrap(),
            confidence: Confidence::new(0.95).unwrap(),
            landmarks_5pt: None,
        };
        let detector = StubDetector(vec![face]);
        let extractor = StubExtractor(level_face(400.0, 300.0, 120.0, 150.0));
        let encoder = ReferenceEncoder;
        let options = ProcessingOptions::default();
        let cancel = CancellationToken::new();

        let result = process(&bytes, &options, &detector, &extractor, &encoder, &cancel)
            .await
            .unwrap();

        assert_eq!(result.transformed_dimensions, ImageDimensions::new(420, 560).unwrap());
        assert!(result.actual_size as f64 <= 20_000.0 * 0.95);
    }

    #[tokio::test]
    async fn an_already_cancelled_token_short_circuits_with_cancelled() {
        let img = Image::filled(800, 600, Color::from_rgb8(128, 128, 128));
        let bytes = encode_png(&img);

        let detector = StubDetector(vec![]);
        let extractor = StubExtractor(level_face(400.0, 300.0, 100.0, 150.0));
        let encoder = ReferenceEncoder;
        let options = ProcessingOptions::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = process(&bytes, &options, &detector, &extractor, &encoder, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
