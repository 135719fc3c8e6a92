use std::collections::HashSet;
use std::io::Cursor;
use std::time::Duration;

use abscope::{analyze, error_payload, AnalysisConfig, CaptureBatch, CaptureFrame};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let r = ((x as f32 / width as f32) * 255.0) as u8;
        let g = ((y as f32 / height as f32) * 255.0) as u8;
        Rgb([r, g, 128])
    }))
}

/// "Layout A": dark band across the top.
fn layout_a(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgb([20, 20, 20])
        } else {
            Rgb([235, 235, 235])
        }
    }))
}

/// "Layout B": dark band down the left.
fn layout_b(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([20, 20, 20])
        } else {
            Rgb([235, 235, 235])
        }
    }))
}

fn batch_of(frames: Vec<CaptureFrame>) -> CaptureBatch {
    let requested = frames.len();
    CaptureBatch::new(frames, requested, Duration::from_secs(3))
}

fn image_frames(images: &[DynamicImage]) -> Vec<CaptureFrame> {
    images
        .iter()
        .map(|image| CaptureFrame::Image(png_bytes(image)))
        .collect()
}

#[test]
fn test_consistent_page_is_single_quiet_variant() {
    let image = gradient(64, 48);
    let batch = batch_of(image_frames(&vec![image; 10]));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.analysis.captures_analyzed, 10);
    assert_eq!(report.analysis.unique_variants, 1);
    assert!(!report.analysis.variation_detected);
    assert_eq!(report.analysis.confidence, 0.1);
    assert_eq!(report.analysis.max_difference_pct, 0.0);
    assert!(report.screenshot_samples.is_none());
    assert!(report.recommendations[0].contains("consistent"));

    // identical captures leave nothing for the heatmap
    assert!(report.hot_spots.iter().all(|c| c.variance == 0.0));

    // and structural similarity is perfect against the reference
    let avg = report.similarity_metrics.average_ssim.unwrap();
    assert!((avg - 1.0).abs() < 1e-6);
}

#[test]
fn test_two_arm_experiment_detected() {
    let a = layout_a(64, 64);
    let b = layout_b(64, 64);
    let mut images = Vec::new();
    for i in 0..10 {
        images.push(if i % 2 == 0 { a.clone() } else { b.clone() });
    }
    let batch = batch_of(image_frames(&images));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.analysis.unique_variants, 2);
    assert!(report.analysis.variation_detected);
    assert_eq!(report.analysis.confidence, 0.9);
    assert!(report.analysis.max_difference_pct > 5.0);

    // one preview per group, truncated data URLs
    let samples = report.screenshot_samples.unwrap();
    assert_eq!(samples.len(), 2);
    for sample in &samples {
        assert!(sample.preview.starts_with("data:image/png;base64,"));
        assert!(sample.preview.ends_with("..."));
    }

    assert!(report.recommendations[0].contains("A/B test"));
}

#[test]
fn test_variant_groups_partition_usable_indices() {
    let a = layout_a(64, 64);
    let b = layout_b(64, 64);
    let images = vec![
        a.clone(),
        a.clone(),
        b.clone(),
        a.clone(),
        b.clone(),
        b.clone(),
    ];
    let batch = batch_of(image_frames(&images));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    let mut seen = HashSet::new();
    for group in &report.variations.groups {
        assert_eq!(group.frequency, group.capture_indices.len());
        for &index in &group.capture_indices {
            assert!(seen.insert(index), "index {} in two groups", index);
        }
    }
    assert_eq!(seen, (0..6).collect::<HashSet<_>>());
    assert_eq!(report.variations.total_unique, 2);

    // discovery order: the first capture's variant is variation_1
    assert_eq!(report.variations.groups[0].capture_indices[0], 0);
    assert_eq!(report.variations.groups[0].label, "variation_1");

    let pct: f64 = report.variations.groups.iter().map(|g| g.percentage).sum();
    assert!((pct - 100.0).abs() < 1e-9);
}

#[test]
fn test_single_failed_capture_does_not_abort_run() {
    let image = gradient(64, 48);
    let mut frames = image_frames(&vec![image; 9]);
    frames.insert(
        3,
        CaptureFrame::Failed {
            reason: "navigation timeout".into(),
        },
    );
    let batch = batch_of(frames);

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.analysis.captures_analyzed, 9);
    assert_eq!(report.analysis.captures_failed, 1);

    let grouped: HashSet<usize> = report
        .variations
        .groups
        .iter()
        .flat_map(|g| g.capture_indices.iter().copied())
        .collect();
    assert!(!grouped.contains(&3));
    assert_eq!(grouped.len(), 9);
}

#[test]
fn test_too_few_captures_is_structured_error() {
    let image = gradient(64, 48);
    let mut frames = vec![CaptureFrame::Image(png_bytes(&image))];
    for _ in 0..9 {
        frames.push(CaptureFrame::Failed {
            reason: "navigation timeout".into(),
        });
    }
    let batch = batch_of(frames);

    let err = analyze(&batch, &AnalysisConfig::default()).unwrap_err();
    let payload = error_payload(&err);
    let message = payload["error"].as_str().unwrap();
    assert!(message.contains("insufficient"));
    assert!(message.contains("1"));
}

#[test]
fn test_mixed_resolutions_are_analyzed_against_reference() {
    // second capture arrives at a different size; it is resampled, not dropped
    let images = vec![gradient(64, 48), gradient(32, 24), gradient(64, 48)];
    let batch = batch_of(image_frames(&images));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.analysis.captures_analyzed, 3);
    // the resampled pair still gets an SSIM score
    assert!(report.similarity_metrics.min_ssim.is_some());
}

#[test]
fn test_report_serializes_with_expected_keys() {
    let a = layout_a(64, 64);
    let b = layout_b(64, 64);
    let batch = batch_of(image_frames(&[a.clone(), b, a]));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    for key in [
        "analysis",
        "variations",
        "similarity_metrics",
        "hot_spots",
        "recommendations",
        "screenshot_samples",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert!(value["hot_spots"].as_array().unwrap().len() <= 3);
}

#[test]
fn test_hot_spots_follow_localized_change() {
    // two variants differing only in the top-left quadrant
    let base = DynamicImage::ImageRgb8(RgbImage::from_fn(80, 80, |_, _| Rgb([200, 200, 200])));
    let variant = DynamicImage::ImageRgb8(RgbImage::from_fn(80, 80, |x, y| {
        if x < 16 && y < 16 {
            Rgb([0, 0, 0])
        } else {
            Rgb([200, 200, 200])
        }
    }));
    let batch = batch_of(image_frames(&[
        base.clone(),
        variant.clone(),
        base,
        variant.clone(),
        variant,
    ]));

    let report = analyze(&batch, &AnalysisConfig::default()).unwrap();

    let top = &report.hot_spots[0];
    assert!(top.grid_x <= 1 && top.grid_y <= 1);
    assert!(top.variance > 0.0);
}
