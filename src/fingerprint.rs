use std::fmt;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

/// Side length of the reduced grayscale sample the DCT runs over.
const SAMPLE_SIZE: u32 = 32;
/// Side length of the retained low-frequency coefficient block (8x8 = 64 bits).
const HASH_SIZE: usize = 8;

/// 64-bit frequency-domain perceptual hash of a raster.
///
/// Visually near-identical rasters collide with high probability (robust to
/// JPEG-style noise and small shifts), while layout-level differences flip
/// low-frequency bits. Equality is exact bit equality; callers wanting
/// fuzzy grouping should pre-bucket with [`Fingerprint::distance`] before
/// clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Hash one raster. Pure and deterministic: the same raster always
    /// yields bit-identical output.
    pub fn of_image(image: &DynamicImage) -> Self {
        let gray = image.to_luma8();
        let reduced =
            image::imageops::resize(&gray, SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Lanczos3);

        let coeffs = dct_low_frequency(&reduced, HASH_SIZE);
        let median = median(&coeffs);

        let mut bits = 0u64;
        for (i, &coeff) in coeffs.iter().enumerate() {
            if coeff > median {
                bits |= 1 << i;
            }
        }
        Fingerprint(bits)
    }

    pub fn from_bits(bits: u64) -> Self {
        Fingerprint(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    /// 16-digit lowercase hex rendering, the reproducible display format.
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Hamming distance in bits. This is the extension point for fuzzy
    /// pre-bucketing; the clusterer itself never uses it.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// DCT-II over the reduced grayscale sample, computing only the low-frequency
/// `size` x `size` coefficient block.
fn dct_low_frequency(gray: &GrayImage, size: usize) -> Vec<f64> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;

    let mut coeffs = vec![0.0f64; size * size];

    for v in 0..size {
        for u in 0..size {
            let mut sum = 0.0;
            for y in 0..height {
                for x in 0..width {
                    let pixel = gray.get_pixel(x as u32, y as u32)[0] as f64;
                    let cos_u = (std::f64::consts::PI * (2 * x + 1) as f64 * u as f64
                        / (2.0 * width as f64))
                        .cos();
                    let cos_v = (std::f64::consts::PI * (2 * y + 1) as f64 * v as f64
                        / (2.0 * height as f64))
                        .cos();
                    sum += pixel * cos_u * cos_v;
                }
            }

            let cu = if u == 0 { 1.0 / 2.0f64.sqrt() } else { 1.0 };
            let cv = if v == 0 { 1.0 / 2.0f64.sqrt() } else { 1.0 };

            coeffs[v * size + u] = sum * cu * cv * 2.0 / (width * height) as f64;
        }
    }

    coeffs
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}
