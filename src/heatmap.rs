use image::{DynamicImage, RgbImage};
use serde::Serialize;

/// One region of the fixed grid overlay, scored by cross-capture variance.
#[derive(Debug, Clone, Serialize)]
pub struct HeatCell {
    pub grid_x: usize,
    pub grid_y: usize,
    pub variance: f64,
}

/// Build the spatial variance heatmap from a stack of size-matched rasters.
///
/// Per-pixel population variance is computed across the stack independently
/// per color channel, channel-averaged, then averaged within each cell of a
/// `grid_size` x `grid_size` overlay. The grid always has exactly
/// `grid_size`² cells whatever the resolution: trailing cells shrink at the
/// image edge, and cells that fall entirely off a small image score 0.
///
/// Cells come back sorted by descending variance; the sort is stable, so
/// ties keep row-major encounter order. Callers bound cost by capping the
/// stack before calling (the analysis feeds at most the first few frames).
pub fn build_heatmap(images: &[&DynamicImage], grid_size: usize) -> Vec<HeatCell> {
    let rasters: Vec<RgbImage> = images.iter().map(|image| image.to_rgb8()).collect();

    let Some(first) = rasters.first() else {
        return Vec::new();
    };
    let (width, height) = first.dimensions();
    let (width, height) = (width as usize, height as usize);

    let variance = per_pixel_variance(&rasters, width, height);

    let cell_w = width.div_ceil(grid_size).max(1);
    let cell_h = height.div_ceil(grid_size).max(1);

    let mut cells = Vec::with_capacity(grid_size * grid_size);
    for gy in 0..grid_size {
        for gx in 0..grid_size {
            let x_end = ((gx + 1) * cell_w).min(width);
            let y_end = ((gy + 1) * cell_h).min(height);

            let mut sum = 0.0;
            let mut count = 0usize;
            for y in (gy * cell_h)..y_end {
                for x in (gx * cell_w)..x_end {
                    sum += variance[y * width + x];
                    count += 1;
                }
            }

            cells.push(HeatCell {
                grid_x: gx,
                grid_y: gy,
                variance: if count > 0 { sum / count as f64 } else { 0.0 },
            });
        }
    }

    cells.sort_by(|a, b| b.variance.total_cmp(&a.variance));
    cells
}

/// Channel-averaged population variance per pixel across the stack.
fn per_pixel_variance(rasters: &[RgbImage], width: usize, height: usize) -> Vec<f64> {
    let n = rasters.len() as f64;
    let mut variance = vec![0.0f64; width * height];

    for (pixel, slot) in variance.iter_mut().enumerate() {
        let mut channel_sum = 0.0;
        for channel in 0..3 {
            let offset = pixel * 3 + channel;
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for raster in rasters {
                let value = raster.as_raw()[offset] as f64;
                sum += value;
                sum_sq += value * value;
            }
            let mean = sum / n;
            // clamp tiny negative residue from the E[x^2] - E[x]^2 form
            channel_sum += (sum_sq / n - mean * mean).max(0.0);
        }
        *slot = channel_sum / 3.0;
    }

    variance
}
