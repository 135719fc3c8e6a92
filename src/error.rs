use thiserror::Error;

/// Run-level failures. Per-capture problems (a frame that failed to render
/// or decode) are absorbed upstream and skipped; only conditions that
/// invalidate the whole run surface here.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("insufficient usable captures: {usable} decoded, at least 2 required")]
    InsufficientData { usable: usize },

    #[error("preview encoding failed: {0}")]
    PreviewEncoding(#[from] image::ImageError),
}
