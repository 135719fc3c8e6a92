use serde::Serialize;

/// Outcome of the heuristic decision model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnalysisVerdict {
    pub variation_detected: bool,
    /// Heuristic score in [0, 1]; see the ladder in [`decide`]. Not a
    /// calibrated probability.
    pub confidence: f64,
    pub max_difference: f64,
    pub average_difference: f64,
}

/// Apply the decision rule and confidence ladder.
///
/// Detection triggers on either signal: a pixel-difference spike above the
/// caller's threshold, or more than one fingerprint group. Clustering
/// dominates: multiple variants with tiny pixel deltas still count.
///
/// The confidence ladder is evaluated top-down, first match wins:
/// exactly 2 groups => 0.9 (classic two-arm test signature),
/// more than 2 => 0.7 (multivariate / personalization),
/// 1 group but max difference over threshold => 0.5 (likely dynamic
/// content, not structural), otherwise 0.1. The constants are uncalibrated
/// placeholders carried over from production observation; do not tune them
/// without labeled data.
pub fn decide(
    num_variants: usize,
    max_difference: f64,
    average_difference: f64,
    threshold: f64,
) -> AnalysisVerdict {
    let variation_detected = max_difference > threshold || num_variants > 1;

    let confidence = if num_variants == 2 {
        0.9
    } else if num_variants > 2 {
        0.7
    } else if max_difference > threshold {
        0.5
    } else {
        0.1
    };

    AnalysisVerdict {
        variation_detected,
        confidence,
        max_difference,
        average_difference,
    }
}
