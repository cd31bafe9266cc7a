//! A pipeline that turns an arbitrary portrait photograph into a compressed facial image
//! complying with the U.S. federal PIV standard INCITS 385-2004 / FIPS 201.
//!
//! From a decoded RGBA raster, [`pipeline::process`] detects the primary face, extracts 68 facial
//! landmarks, computes a rotate/crop/scale transform that places the face at the standards-mandated
//! position within a 420x560 canvas, and encodes the canvas as JPEG 2000 with a Region-of-Interest
//! coding scheme so the facial area is preserved at higher quality than the background, under a
//! target byte budget.
//!
//! Face detection, landmark extraction, and the JPEG 2000 codec core are not implemented by this
//! crate: they're injected by the caller as implementations of [`external::FaceDetector`],
//! [`external::LandmarkExtractor`], and [`external::Jp2kEncoder`]. See [`encode::ReferenceEncoder`]
//! for a deterministic stand-in usable in tests or before a real codec binding is wired up.

pub mod encode;
pub mod error;
pub mod external;
pub mod geometry;
pub mod landmarks;
pub mod options;
pub mod pipeline;
pub mod piv;
pub mod presets;
pub mod roi;
pub mod transform;

pub use error::{Error, Result};
pub use options::{EncodingStrategy, ProcessingOptions};
pub use pipeline::{process, ProcessingResult};
