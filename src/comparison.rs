use image::imageops::FilterType;
use image::DynamicImage;
use image_compare::Algorithm;
use serde::Serialize;
use tracing::debug;

/// Per-channel intensity delta at or below which a sample is treated as
/// anti-aliasing / compression noise rather than real change.
pub const DEFAULT_PIXEL_SENSITIVITY: u8 = 10;

/// Pairwise record between the reference capture and one later capture.
#[derive(Debug, Clone, Serialize)]
pub struct DifferenceSample {
    /// Original capture index of the compared frame.
    pub index: usize,
    /// Share of channel samples whose delta exceeds the sensitivity, in [0, 1].
    pub pixel_diff_ratio: f64,
    /// Windowed structural similarity over grayscale views; `None` when the
    /// pair could not be aligned to equal dimensions.
    pub ssim: Option<f64>,
}

/// Compute both difference metrics for one reference/comparison pair.
/// Pure function; inputs are expected to be size-matched by the decoder.
pub fn compare_to_reference(
    reference: &DynamicImage,
    other: &DynamicImage,
    index: usize,
    sensitivity: u8,
) -> DifferenceSample {
    DifferenceSample {
        index,
        pixel_diff_ratio: pixel_diff_ratio(reference, other, sensitivity),
        ssim: ssim(reference, other),
    }
}

/// Fraction of per-channel samples differing by more than `sensitivity`.
///
/// The comparison image is resampled if its dimensions drifted from the
/// reference, so a ratio is always produced.
pub fn pixel_diff_ratio(reference: &DynamicImage, other: &DynamicImage, sensitivity: u8) -> f64 {
    let reference = reference.to_rgb8();
    let mut other = other.to_rgb8();

    if reference.dimensions() != other.dimensions() {
        other = image::imageops::resize(
            &other,
            reference.width(),
            reference.height(),
            FilterType::CatmullRom,
        );
    }

    let changed = reference
        .as_raw()
        .iter()
        .zip(other.as_raw().iter())
        .filter(|(a, b)| a.abs_diff(**b) > sensitivity)
        .count();

    changed as f64 / reference.as_raw().len() as f64
}

/// Windowed SSIM-family score over grayscale views, nominally in [-1, 1]
/// (1.0 = structurally identical). Windowing keeps localized change from
/// being diluted by a large unchanged background.
pub fn ssim(reference: &DynamicImage, other: &DynamicImage) -> Option<f64> {
    let gray_reference = reference.to_luma8();
    let gray_other = other.to_luma8();

    if gray_reference.dimensions() != gray_other.dimensions() {
        debug!(
            "ssim skipped: dimensions {:?} vs {:?}",
            gray_reference.dimensions(),
            gray_other.dimensions()
        );
        return None;
    }

    image_compare::gray_similarity_structure(&Algorithm::MSSIMSimple, &gray_reference, &gray_other)
        .ok()
        .map(|similarity| similarity.score)
}
