//! Command-line front end for the `facepiv` pipeline.
//!
//! This is a thin, illustrative wrapper: a real deployment would inject a trained RetinaFace
//! detector, a PFLD landmark model, and a real JPEG 2000 codec binding. This binary ships with
//! [`facepiv::encode::ReferenceEncoder`] and two placeholder detector/extractor implementations so
//! the pipeline is runnable end-to-end out of the box; swap them for production collaborators via
//! the library API, not by editing this binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use facepiv::encode::ReferenceEncoder;
use facepiv::external::{FaceDetector, Jp2kEncoder, LandmarkExtractor, RawFaceDetection};
use facepiv::geometry::{Confidence, FaceBox, Point2D};
use facepiv::{EncodingStrategy, Error, ProcessingOptions};
use facepiv_image::Image;
use tokio_util::sync::CancellationToken;

/// Turns a portrait photograph into a PIV/FIPS-201 compliant JPEG 2000 facial image.
#[derive(Parser, Debug)]
#[command(name = "facepiv", version, about)]
struct Cli {
    /// Path to the source image (any format the `image` crate can decode).
    input: PathBuf,

    /// Path to write the encoded JPEG 2000 output to.
    output: PathBuf,

    /// Minimum face detection confidence, in [0, 1].
    #[arg(long, default_value_t = 0.8)]
    min_face_confidence: f32,

    /// Allow multiple detected faces (picks the best one) instead of failing on more than one.
    #[arg(long)]
    no_require_single_face: bool,

    /// How many additional encode attempts the target-size search may make.
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Wall-clock deadline for the whole call, in seconds.
    #[arg(long, default_value_t = 30)]
    processing_timeout_secs: u64,

    /// Disable Region-of-Interest priority coding.
    #[arg(long)]
    no_roi: bool,

    /// ROI resolution levels participating in priority coding, in [0, 3].
    #[arg(long, default_value_t = 3)]
    roi_start_level: u8,

    /// Encode at a fixed bits-per-pixel rate instead of searching for a target size.
    #[arg(long, conflicts_with = "target_size_bytes")]
    fixed_rate_bpp: Option<f32>,

    /// Target output size in bytes (the default strategy).
    #[arg(long, default_value_t = 20_000)]
    target_size_bytes: usize,

    /// Abort the pipeline if the rendered result fails PIV compliance, instead of reporting it.
    #[arg(long)]
    strict_compliance: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new().expect("failed to start async runtime");
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let options = ProcessingOptions {
        min_face_confidence: cli.min_face_confidence,
        require_single_face: !cli.no_require_single_face,
        max_retries: cli.max_retries,
        processing_timeout: Duration::from_secs(cli.processing_timeout_secs),
        enable_roi: !cli.no_roi,
        roi_start_level: cli.roi_start_level,
        strategy: match cli.fixed_rate_bpp {
            Some(bpp) => EncodingStrategy::FixedRate { bpp },
            None => EncodingStrategy::TargetSize {
                bytes: cli.target_size_bytes,
            },
        },
        strict_compliance: cli.strict_compliance,
        ..ProcessingOptions::default()
    };

    if let Err(err) = options.validate() {
        eprintln!("invalid options: {err}");
        return ExitCode::from(3);
    }

    let bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {err}", cli.input.display());
            return ExitCode::from(2);
        }
    };

    let detector = PlaceholderDetector;
    let extractor = PlaceholderExtractor;
    let encoder = ReferenceEncoder;
    let cancel = CancellationToken::new();

    match facepiv::process(&bytes, &options, &detector, &extractor, &encoder, &cancel).await {
        Ok(result) => {
            if let Err(err) = std::fs::write(&cli.output, &result.encoded_bytes) {
                eprintln!("failed to write {}: {err}", cli.output.display());
                return ExitCode::from(2);
            }
            log::info!(
                "encoded {} bytes at {:.2} bpp (PIV compliant: {})",
                result.actual_size,
                result.actual_rate,
                result.compliance_validation.is_fully_compliant
            );
            ExitCode::SUCCESS
        }
        // Every pipeline failure past argument parsing and file I/O is either a detection/compliance
        // problem or an encoder/codec problem; both map to exit code 1 per the CLI's documented contract.
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

/// A detector that reports the whole image as a single high-confidence face.
///
/// Stands in for a real RetinaFace binding so the CLI is runnable without one; the crop is
/// deliberately conservative (80% of the shorter source dimension) so the downstream transform
/// planner has slack to work with on typical portrait photos.
struct PlaceholderDetector;

impl FaceDetector for PlaceholderDetector {
    async fn detect(
        &self,
        rgba: &Image,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<RawFaceDetection>> {
        let side = rgba.width().min(rgba.height()) as f32 * 0.8;
        let x = (rgba.width() as f32 - side) / 2.0;
        let y = (rgba.height() as f32 - side) / 2.0;

        Ok(vec![RawFaceDetection {
            face_box: FaceBox::new(x, y, side, side)
                .map_err(|msg| anyhow::anyhow!("placeholder detector: {msg}"))?,
            confidence: Confidence::new(1.0).expect("1.0 is a valid confidence"),
            landmarks_5pt: None,
        }])
    }
}

/// A landmark extractor that places a level, front-facing 68-point mesh inside the given face box.
///
/// Stands in for a real PFLD binding; every landmark lands where a level, centered face would put
/// it, so the pipeline produces a plausible compliant image on a roughly-centered portrait without
/// needing a trained model loaded.
struct PlaceholderExtractor;

impl LandmarkExtractor for PlaceholderExtractor {
    async fn extract(
        &self,
        _rgba: &Image,
        face_box: FaceBox,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<[Point2D; 68]> {
        let center = face_box.center();
        let eye_dist = face_box.w() * 0.35;
        let jaw_half_width = face_box.w() * 0.5;

        Ok(facepiv::landmarks::synthetic_level_face(
            center.x,
            center.y,
            eye_dist,
            jaw_half_width,
        ))
    }
}
