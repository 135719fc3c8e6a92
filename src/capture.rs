use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

use crate::error::AnalysisError;

/// One capture attempt from the acquisition collaborator.
///
/// A failed attempt is kept in the sequence rather than dropped so the
/// original indices stay meaningful downstream. No retries happen on
/// failure; a capture that refused to render is itself a signal about the
/// page.
#[derive(Debug, Clone)]
pub enum CaptureFrame {
    /// Raw encoded image bytes (PNG/JPEG) as handed over by the renderer.
    Image(Vec<u8>),
    /// The renderer gave up on this index (timeout, navigation error, ...).
    Failed { reason: String },
}

/// Ordered capture sequence plus the acquisition metadata that gets echoed
/// into the report.
#[derive(Debug, Clone)]
pub struct CaptureBatch {
    pub frames: Vec<CaptureFrame>,
    /// Number of captures originally requested (may exceed frames delivered).
    pub requested: usize,
    /// Inter-capture delay the collaborator actually used.
    pub delay: Duration,
}

impl CaptureBatch {
    pub fn new(frames: Vec<CaptureFrame>, requested: usize, delay: Duration) -> Self {
        Self {
            frames,
            requested,
            delay,
        }
    }
}

/// A decoded raster that kept its position in the original capture sequence.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub index: usize,
    pub image: DynamicImage,
}

/// Decode the batch, skipping failed or undecodable entries.
///
/// Survivors whose dimensions differ from the first decoded frame (the
/// reference) are resampled to the reference size with a bicubic filter, so
/// later stages never see mixed dimensions. Nearest-neighbor would inject
/// high-frequency noise into the difference signal, so it is never used
/// here.
pub fn decode_frames(batch: &CaptureBatch) -> Result<Vec<DecodedFrame>, AnalysisError> {
    let mut decoded: Vec<DecodedFrame> = Vec::with_capacity(batch.frames.len());
    let mut reference_dims: Option<(u32, u32)> = None;

    for (index, frame) in batch.frames.iter().enumerate() {
        let bytes = match frame {
            CaptureFrame::Image(bytes) => bytes,
            CaptureFrame::Failed { reason } => {
                warn!("capture {} failed, skipping: {}", index, reason);
                continue;
            }
        };

        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!("capture {} could not be decoded, skipping: {}", index, e);
                continue;
            }
        };

        let image = match reference_dims {
            None => {
                reference_dims = Some(image.dimensions());
                image
            }
            Some((w, h)) if image.dimensions() != (w, h) => {
                debug!(
                    "capture {} resampled from {:?} to reference {}x{}",
                    index,
                    image.dimensions(),
                    w,
                    h
                );
                image.resize_exact(w, h, FilterType::CatmullRom)
            }
            Some(_) => image,
        };

        decoded.push(DecodedFrame { index, image });
    }

    if decoded.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            usable: decoded.len(),
        });
    }

    Ok(decoded)
}
