use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::analysis::AnalysisConfig;
use crate::capture::{CaptureBatch, DecodedFrame};
use crate::cluster::VariantGroup;
use crate::comparison::DifferenceSample;
use crate::decision::AnalysisVerdict;
use crate::error::AnalysisError;
use crate::heatmap::HeatCell;

/// Final structured result of one analysis run.
///
/// Serializes to the nested report mapping: `analysis`, `variations`,
/// `similarity_metrics`, `hot_spots`, `recommendations`, and (only when
/// more than one variant group exists) `screenshot_samples`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis: AnalysisSection,
    pub variations: VariationsSection,
    pub similarity_metrics: SimilaritySection,
    pub hot_spots: Vec<HeatCell>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_samples: Option<Vec<ScreenshotSample>>,
}

/// Headline numbers: counts, verdict, confidence, difference percentages.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSection {
    pub captures_requested: usize,
    pub captures_analyzed: usize,
    pub captures_failed: usize,
    pub capture_delay_seconds: f64,
    pub unique_variants: usize,
    pub variation_detected: bool,
    pub confidence: f64,
    pub max_difference_pct: f64,
    pub average_difference_pct: f64,
    pub threshold_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariationsSection {
    pub groups: Vec<VariationGroupReport>,
    pub total_unique: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariationGroupReport {
    pub label: String,
    pub fingerprint: String,
    pub capture_indices: Vec<usize>,
    pub frequency: usize,
    /// Share of analyzed captures in this group, 0-100.
    pub percentage: f64,
}

/// Aggregated structural similarity against the reference capture.
/// All `None` when no pair produced a score.
#[derive(Debug, Clone, Serialize)]
pub struct SimilaritySection {
    pub average_ssim: Option<f64>,
    pub min_ssim: Option<f64>,
    pub max_ssim: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenshotSample {
    pub variation: String,
    /// Truncated `data:image/png;base64,` prefix, bounded for payload size.
    /// Full-fidelity previews need a separate asset-fetch path.
    pub preview: String,
}

/// The `{"error": ...}` object that replaces the report when the run fails.
pub fn error_payload(error: &AnalysisError) -> serde_json::Value {
    serde_json::json!({ "error": error.to_string() })
}

pub(crate) fn assemble_report(
    batch: &CaptureBatch,
    decoded: &[DecodedFrame],
    groups: &[VariantGroup],
    samples: &[DifferenceSample],
    verdict: AnalysisVerdict,
    heatmap: Vec<HeatCell>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let analyzed = decoded.len();

    let analysis = AnalysisSection {
        captures_requested: batch.requested,
        captures_analyzed: analyzed,
        captures_failed: batch.frames.len().saturating_sub(analyzed),
        capture_delay_seconds: batch.delay.as_secs_f64(),
        unique_variants: groups.len(),
        variation_detected: verdict.variation_detected,
        confidence: verdict.confidence,
        max_difference_pct: verdict.max_difference * 100.0,
        average_difference_pct: verdict.average_difference * 100.0,
        threshold_pct: config.threshold * 100.0,
    };

    let group_reports: Vec<VariationGroupReport> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| VariationGroupReport {
            label: format!("variation_{}", i + 1),
            fingerprint: group.fingerprint.to_hex(),
            capture_indices: group.indices.clone(),
            frequency: group.indices.len(),
            percentage: group.indices.len() as f64 / analyzed as f64 * 100.0,
        })
        .collect();

    let ssim_values: Vec<f64> = samples.iter().filter_map(|s| s.ssim).collect();
    let similarity_metrics = SimilaritySection {
        average_ssim: if ssim_values.is_empty() {
            None
        } else {
            Some(ssim_values.iter().sum::<f64>() / ssim_values.len() as f64)
        },
        min_ssim: ssim_values.iter().copied().reduce(f64::min),
        max_ssim: ssim_values.iter().copied().reduce(f64::max),
    };

    let recommendations = recommendations(&verdict, groups.len());

    let screenshot_samples = if groups.len() > 1 {
        Some(preview_samples(decoded, groups, config)?)
    } else {
        None
    };

    Ok(AnalysisReport {
        analysis,
        variations: VariationsSection {
            total_unique: groups.len(),
            groups: group_reports,
        },
        similarity_metrics,
        hot_spots: heatmap
            .into_iter()
            .take(config.top_hot_spots)
            .collect(),
        recommendations,
        screenshot_samples,
    })
}

fn recommendations(verdict: &AnalysisVerdict, num_variants: usize) -> Vec<String> {
    let mut out = Vec::new();

    if verdict.variation_detected {
        if num_variants == 2 {
            out.push(
                "Strong indication of an A/B test. Consider monitoring this page regularly to track test duration."
                    .to_string(),
            );
        } else if num_variants > 2 {
            out.push(
                "Multiple variations detected. This could be a multivariate test or personalization."
                    .to_string(),
            );
        }
        out.push(
            "Analyze the varying elements to understand the competitor's testing priorities."
                .to_string(),
        );
    } else {
        out.push(
            "No clear variation detected. The page appears consistent across captures.".to_string(),
        );
        if verdict.average_difference > 0.01 {
            out.push(
                "Minor differences detected, possibly due to dynamic content or ads.".to_string(),
            );
        }
    }

    out
}

/// One representative capture per variant group, for up to
/// `config.max_preview_groups` groups.
fn preview_samples(
    decoded: &[DecodedFrame],
    groups: &[VariantGroup],
    config: &AnalysisConfig,
) -> Result<Vec<ScreenshotSample>, AnalysisError> {
    let mut out = Vec::new();

    for (i, group) in groups.iter().take(config.max_preview_groups).enumerate() {
        let Some(&first_index) = group.indices.first() else {
            continue;
        };
        let Some(frame) = decoded.iter().find(|f| f.index == first_index) else {
            continue;
        };
        out.push(ScreenshotSample {
            variation: format!("variation_{}", i + 1),
            preview: encode_preview(&frame.image, config)?,
        });
    }

    Ok(out)
}

fn encode_preview(image: &DynamicImage, config: &AnalysisConfig) -> Result<String, AnalysisError> {
    let thumb = image.resize_exact(
        config.thumbnail_width,
        config.thumbnail_height,
        FilterType::Lanczos3,
    );

    let mut png = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let encoded = general_purpose::STANDARD.encode(&png);
    let prefix = &encoded[..config.preview_prefix_len.min(encoded.len())];
    Ok(format!("data:image/png;base64,{}...", prefix))
}
