//! Variation detection for web pages: decide, from a sequence of page
//! captures taken over time, whether a page is serving multiple visually
//! distinct variants (an A/B or multivariate experiment).
//!
//! The pipeline: decode and size-match the captures, fingerprint each one
//! with a frequency-domain perceptual hash, measure every capture against
//! the first usable one (pixel-diff ratio + windowed SSIM), cluster by
//! fingerprint equality, localize change with a grid variance heatmap, and
//! fold the signals into a verdict, a heuristic confidence score, and a
//! JSON report.
//!
//! Capture acquisition (the headless-browser side) lives outside this
//! crate; it hands over a [`CaptureBatch`] and gets back a report or a
//! structured error payload.

pub mod analysis;
pub mod capture;
pub mod cluster;
pub mod comparison;
pub mod decision;
pub mod error;
pub mod fingerprint;
pub mod heatmap;
pub mod report;

pub use analysis::{analyze, AnalysisConfig};
pub use capture::{decode_frames, CaptureBatch, CaptureFrame, DecodedFrame};
pub use cluster::{cluster_variants, VariantGroup};
pub use comparison::{compare_to_reference, DifferenceSample};
pub use decision::{decide, AnalysisVerdict};
pub use error::AnalysisError;
pub use fingerprint::Fingerprint;
pub use heatmap::{build_heatmap, HeatCell};
pub use report::{error_payload, AnalysisReport};
