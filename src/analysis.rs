use image::DynamicImage;
use tracing::debug;

use crate::capture::{decode_frames, CaptureBatch};
use crate::cluster::cluster_variants;
use crate::comparison::{compare_to_reference, DifferenceSample, DEFAULT_PIXEL_SENSITIVITY};
use crate::decision::decide;
use crate::error::AnalysisError;
use crate::fingerprint::Fingerprint;
use crate::heatmap::build_heatmap;
use crate::report::{assemble_report, AnalysisReport};

/// Tunables for one analysis run.
///
/// Constructed once per run and never mutated; there are no ambient
/// defaults beyond [`Default`]. The default values carry the original
/// production constants; they are heuristic placeholders, not calibrated
/// parameters.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Minimum pixel-difference ratio flagged as variation (0.05 = 5%).
    pub threshold: f64,
    /// Per-channel intensity delta at or below which a sample counts as noise.
    pub pixel_sensitivity: u8,
    /// The heatmap grid is grid_size x grid_size cells.
    pub grid_size: usize,
    /// At most this many rasters feed the variance heatmap.
    pub heatmap_frame_cap: usize,
    /// Heat cells surfaced in the report.
    pub top_hot_spots: usize,
    /// Preview thumbnail dimensions.
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Emitted previews are truncated to this many base64 characters.
    pub preview_prefix_len: usize,
    /// At most this many variant groups get a preview sample.
    pub max_preview_groups: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            pixel_sensitivity: DEFAULT_PIXEL_SENSITIVITY,
            grid_size: 10,
            heatmap_frame_cap: 5,
            top_hot_spots: 3,
            thumbnail_width: 400,
            thumbnail_height: 300,
            preview_prefix_len: 100,
            max_preview_groups: 2,
        }
    }
}

/// Run the full variation analysis over one capture batch.
///
/// Stateless and idempotent: identical inputs produce an identical report.
/// Per-capture failures inside the batch are skipped, not fatal; the run
/// only errors when fewer than two captures are usable.
pub fn analyze(
    batch: &CaptureBatch,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let decoded = decode_frames(batch)?;
    debug!(
        "analyzing {} of {} delivered captures",
        decoded.len(),
        batch.frames.len()
    );

    let fingerprints: Vec<(usize, Fingerprint)> = decoded
        .iter()
        .map(|frame| (frame.index, Fingerprint::of_image(&frame.image)))
        .collect();
    let groups = cluster_variants(&fingerprints);
    debug!("{} distinct variants", groups.len());

    // every later capture is measured against the first usable one
    let reference = &decoded[0];
    let samples: Vec<DifferenceSample> = decoded[1..]
        .iter()
        .map(|frame| {
            compare_to_reference(
                &reference.image,
                &frame.image,
                frame.index,
                config.pixel_sensitivity,
            )
        })
        .collect();

    let stack: Vec<&DynamicImage> = decoded
        .iter()
        .take(config.heatmap_frame_cap)
        .map(|frame| &frame.image)
        .collect();
    let heatmap = build_heatmap(&stack, config.grid_size);

    let max_difference = samples
        .iter()
        .map(|s| s.pixel_diff_ratio)
        .fold(0.0, f64::max);
    let average_difference = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|s| s.pixel_diff_ratio).sum::<f64>() / samples.len() as f64
    };

    let verdict = decide(
        groups.len(),
        max_difference,
        average_difference,
        config.threshold,
    );

    assemble_report(batch, &decoded, &groups, &samples, verdict, heatmap, config)
}
