//! Condition extractors.
//!
//! Each extractor is a pure function from a cropped face to one
//! [`ConditionMetric`]. They share nothing but the immutable face image and
//! configuration, so they may run in any order or concurrently.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::{gaussian_blur_f32, laplacian_filter};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::color::{hsv_planes, lab_planes};
use crate::config::ExtractorConfig;
use crate::locate::FaceRegion;
use crate::metrics::{AnalysisResult, Condition, ConditionMetric};

/// Analyze a located face. A missing region yields an empty result rather
/// than an error.
pub fn analyze_region(region: Option<&FaceRegion>, config: &ExtractorConfig) -> AnalysisResult {
    match region {
        Some(region) => analyze_face(&region.image, config),
        None => {
            log::debug!("no face region to analyze, returning empty result");
            AnalysisResult::new()
        }
    }
}

/// Run every extractor over `face`.
pub fn analyze_face(face: &RgbImage, config: &ExtractorConfig) -> AnalysisResult {
    #[cfg(feature = "parallel")]
    if config.parallel {
        use rayon::prelude::*;

        let metrics: Vec<ConditionMetric> = Condition::ALL[..]
            .par_iter()
            .map(|&condition| extract(condition, face, config))
            .collect();
        return metrics.into_iter().collect();
    }

    Condition::ALL
        .iter()
        .map(|&condition| extract(condition, face, config))
        .collect()
}

/// Run the extractor for a single condition.
pub fn extract(condition: Condition, face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let metric = match condition {
        Condition::AcneSpots => acne_spots(face, config),
        Condition::DarkCircles => dark_circles(face, config),
        Condition::Redness => redness(face, config),
        Condition::Oiliness => oiliness(face, config),
        Condition::Dryness => dryness(face, config),
        Condition::UnevenTone => uneven_tone(face),
        Condition::Texture => texture(face),
    };
    log::debug!("{condition}: {} ({})", metric.value, metric.label());
    metric
}

/// Dark blemishes: Otsu-thresholded dark regions of spot size, as a fraction
/// of the face area.
pub fn acne_spots(face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let gray = image::imageops::grayscale(face);
    let image_area = gray.width() as f64 * gray.height() as f64;
    if image_area == 0.0 {
        return ConditionMetric::new(Condition::AcneSpots, 0.0).with_count(0);
    }

    // gaussian_blur_f32 panics on a non-positive sigma
    let blurred = if config.blur_sigma > 0.0 && config.blur_sigma.is_finite() {
        gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };
    let level = otsu_level(&blurred);
    let dark_mask = threshold(&blurred, level, ThresholdType::BinaryInverted);
    let labels = connected_components(&dark_mask, Connectivity::Eight, Luma([0u8]));

    let component_count = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    let mut areas = vec![0u32; component_count + 1];
    for pixel in labels.pixels() {
        areas[pixel[0] as usize] += 1;
    }

    let spot_range = config.acne_min_area..=config.acne_max_area;
    let (count, total_area) = areas
        .iter()
        .skip(1)
        .filter(|&&area| spot_range.contains(&area))
        .fold((0u32, 0u64), |(count, total), &area| {
            (count + 1, total + area as u64)
        });

    let severity = (total_area as f64 / image_area * config.acne_area_scale).min(100.0);
    ConditionMetric::new(Condition::AcneSpots, severity).with_count(count)
}

/// Share of the upper half of the face that is much darker than its mean
/// lightness.
pub fn dark_circles(face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let lab = lab_planes(face);
    let eye_rows = lab.l.height() / 2;
    let eye_region: Vec<f64> = lab
        .l
        .enumerate_pixels()
        .filter(|(_, y, _)| *y < eye_rows)
        .map(|(_, _, p)| p[0] as f64)
        .collect();

    if eye_region.is_empty() {
        return ConditionMetric::new(Condition::DarkCircles, 0.0);
    }

    let dark_threshold = mean(&eye_region) * config.dark_circle_ratio;
    let dark = eye_region.iter().filter(|&&l| l < dark_threshold).count();
    let percentage = dark as f64 / eye_region.len() as f64 * 100.0;
    ConditionMetric::new(Condition::DarkCircles, percentage)
}

/// Share of pixels whose hue falls in one of the red bands with enough
/// saturation and brightness.
pub fn redness(face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let hsv = hsv_planes(face);
    let total = hsv.h.width() as f64 * hsv.h.height() as f64;
    if total == 0.0 {
        return ConditionMetric::new(Condition::Redness, 0.0);
    }

    let floor = config.red_min_saturation_value;
    let red = hsv
        .h
        .pixels()
        .zip(hsv.s.pixels())
        .zip(hsv.v.pixels())
        .filter(|((h, s), v)| {
            s[0] >= floor
                && v[0] >= floor
                && config
                    .red_hue_ranges
                    .iter()
                    .any(|[low, high]| (*low..=*high).contains(&h[0]))
        })
        .count();

    ConditionMetric::new(Condition::Redness, red as f64 / total * 100.0)
}

/// Grayscale intensity variance as a proxy for shine.
pub fn oiliness(face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let gray = image::imageops::grayscale(face);
    let values: Vec<f64> = gray.pixels().map(|p| p[0] as f64).collect();
    let score = variance(&values) / config.oiliness_divisor * 100.0;
    ConditionMetric::new(Condition::Oiliness, score)
}

/// Laplacian response variance as a proxy for flaky, textured skin.
pub fn dryness(face: &RgbImage, config: &ExtractorConfig) -> ConditionMetric {
    let gray = image::imageops::grayscale(face);
    let laplacian = laplacian_filter(&gray);
    let values: Vec<f64> = laplacian.pixels().map(|p| p[0] as f64).collect();
    let score = variance(&values) / config.dryness_divisor * 100.0;
    ConditionMetric::new(Condition::Dryness, score)
}

/// Spread of the chrominance channels.
pub fn uneven_tone(face: &RgbImage) -> ConditionMetric {
    let lab = lab_planes(face);
    let a_std = std_dev(&plane_values(&lab.a));
    let b_std = std_dev(&plane_values(&lab.b));
    ConditionMetric::new(Condition::UnevenTone, (a_std + b_std) / 2.0 * 2.0)
}

/// Mean Sobel gradient magnitude.
pub fn texture(face: &RgbImage) -> ConditionMetric {
    let gray = image::imageops::grayscale(face);
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);
    let magnitudes: Vec<f64> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| (x[0] as f64).hypot(y[0] as f64))
        .collect();
    ConditionMetric::new(Condition::Texture, mean(&magnitudes))
}

fn plane_values(plane: &GrayImage) -> Vec<f64> {
    plane.pixels().map(|p| p[0] as f64).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Level;
    use image::Rgb;

    const SKIN: Rgb<u8> = Rgb([224, 182, 160]);

    fn flat(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(width, height, color)
    }

    fn checkerboard(size: u32, cell: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn flat_skin_is_clear() {
        let face = flat(64, 64, SKIN);
        let config = ExtractorConfig::default();
        let result = analyze_face(&face, &config);

        assert_eq!(result.len(), Condition::ALL.len());
        assert_eq!(result.value(Condition::AcneSpots), Some(0.0));
        assert_eq!(result.value(Condition::DarkCircles), Some(0.0));
        assert_eq!(result.value(Condition::Oiliness), Some(0.0));
        assert_eq!(result.value(Condition::Dryness), Some(0.0));
        assert_eq!(result.value(Condition::UnevenTone), Some(0.0));
        assert_eq!(result.value(Condition::Texture), Some(0.0));
        assert_eq!(result.get(Condition::Texture).unwrap().label(), "smooth");
    }

    #[test]
    fn dark_spots_register_as_acne() {
        let mut face = flat(100, 100, SKIN);
        // Four 5x5 dark spots (25 px each), well inside the spot size range.
        for (cx, cy) in [(20, 20), (70, 25), (30, 70), (75, 75)] {
            for y in cy..cy + 5 {
                for x in cx..cx + 5 {
                    face.put_pixel(x, y, Rgb([60, 30, 25]));
                }
            }
        }

        let metric = acne_spots(&face, &ExtractorConfig::default());
        assert_eq!(metric.count, Some(4));
        assert!(metric.value > 0.0, "severity {}", metric.value);
        assert!(metric.value <= 100.0);
    }

    #[test]
    fn unusable_blur_sigma_skips_smoothing() {
        let mut face = flat(60, 60, SKIN);
        for y in 20..25 {
            for x in 20..25 {
                face.put_pixel(x, y, Rgb([60, 30, 25]));
            }
        }
        for sigma in [0.0, -2.0, f32::NAN] {
            let config = ExtractorConfig {
                blur_sigma: sigma,
                ..ExtractorConfig::default()
            };
            let metric = acne_spots(&face, &config);
            assert_eq!(metric.count, Some(1), "sigma {sigma}");
            // 25 of 3600 px, scaled by 1000
            assert_eq!(metric.value, 6.94);
        }
    }

    #[test]
    fn broad_shadow_is_not_acne() {
        // Left half dark: one component far larger than any spot.
        let face = RgbImage::from_fn(100, 100, |x, _| if x < 50 { Rgb([40, 30, 30]) } else { SKIN });
        let metric = acne_spots(&face, &ExtractorConfig::default());
        assert_eq!(metric.count, Some(0));
        assert_eq!(metric.value, 0.0);
    }

    #[test]
    fn dark_band_in_upper_half_is_dark_circles() {
        // Rows 10..20 of the upper 50 rows are near black: 20% of the eye region.
        let face = RgbImage::from_fn(40, 100, |_, y| {
            if (10..20).contains(&y) {
                Rgb([20, 15, 15])
            } else {
                SKIN
            }
        });
        let metric = dark_circles(&face, &ExtractorConfig::default());
        assert_eq!(metric.value, 20.0);
        assert_eq!(metric.level, Level::Medium);
    }

    #[test]
    fn dark_lower_half_is_ignored_by_dark_circles() {
        let face = RgbImage::from_fn(40, 100, |_, y| if y >= 50 { Rgb([20, 15, 15]) } else { SKIN });
        assert_eq!(dark_circles(&face, &ExtractorConfig::default()).value, 0.0);
    }

    #[test]
    fn single_row_face_has_no_eye_region() {
        let face = flat(10, 1, SKIN);
        assert_eq!(dark_circles(&face, &ExtractorConfig::default()).value, 0.0);
    }

    #[test]
    fn redness_counts_both_hue_bands() {
        // Quarter pure red (hue 0), quarter crimson (hue ~175), half skin.
        let face = RgbImage::from_fn(100, 100, |x, _| match x {
            0..=24 => Rgb([220, 20, 20]),
            25..=49 => Rgb([220, 20, 60]),
            _ => Rgb([200, 200, 200]),
        });
        let metric = redness(&face, &ExtractorConfig::default());
        assert_eq!(metric.value, 50.0);
        assert_eq!(metric.level, Level::High);
    }

    #[test]
    fn desaturated_red_is_not_redness() {
        let face = flat(20, 20, Rgb([130, 120, 120]));
        assert_eq!(redness(&face, &ExtractorConfig::default()).value, 0.0);
    }

    #[test]
    fn high_contrast_saturates_oiliness_and_texture() {
        let face = checkerboard(64, 4);
        let config = ExtractorConfig::default();

        // Half black, half white: variance 16256 ≫ 1000.
        assert_eq!(oiliness(&face, &config).value, 100.0);
        assert_eq!(dryness(&face, &config).value, 100.0);
        assert_eq!(texture(&face).value, 100.0);
        assert_eq!(texture(&face).label(), "rough");
    }

    #[test]
    fn oiliness_divisor_is_tunable() {
        // Two gray levels 20 apart: population variance 100.
        let face = RgbImage::from_fn(20, 20, |x, _| {
            if x % 2 == 0 {
                Rgb([100, 100, 100])
            } else {
                Rgb([120, 120, 120])
            }
        });
        let default = oiliness(&face, &ExtractorConfig::default());
        assert_eq!(default.value, 10.0);

        let tuned = ExtractorConfig {
            oiliness_divisor: 200.0,
            ..ExtractorConfig::default()
        };
        assert_eq!(oiliness(&face, &tuned).value, 50.0);
    }

    #[test]
    fn dryness_divisor_is_tunable() {
        // Columns alternate 100/105. The Laplacian is +-10 inside and +-5 on
        // the clamped border columns: variance (18 * 100 + 2 * 25) / 20 = 92.5.
        let face = RgbImage::from_fn(20, 6, |x, _| {
            if x % 2 == 0 {
                Rgb([100, 100, 100])
            } else {
                Rgb([105, 105, 105])
            }
        });
        let default = dryness(&face, &ExtractorConfig::default());
        assert_eq!(default.value, 18.5);
        assert_eq!(default.level, Level::Low);

        let tuned = ExtractorConfig {
            dryness_divisor: 185.0,
            ..ExtractorConfig::default()
        };
        assert_eq!(dryness(&face, &tuned).value, 50.0);
    }

    #[test]
    fn two_tone_face_is_uneven() {
        // Lab bytes: a 139 vs 150, b 143 vs 156. Half and half gives standard
        // deviations 5.5 and 6.5, so (5.5 + 6.5) / 2 * 2 = 12.
        let face = RgbImage::from_fn(50, 50, |x, _| {
            if x < 25 {
                Rgb([230, 190, 170])
            } else {
                Rgb([150, 90, 60])
            }
        });
        let metric = uneven_tone(&face);
        assert_eq!(metric.value, 12.0);
        assert_eq!(metric.level, Level::Low);
        assert_eq!(uneven_tone(&flat(50, 50, SKIN)).value, 0.0);
    }

    #[test]
    fn step_edge_texture_is_moderate() {
        // Black | gray 128 at x = 20. Only columns 19 and 20 respond, each
        // with 4 * 128 = 512: mean 2 * 512 / 40 = 25.6.
        let face = RgbImage::from_fn(40, 10, |x, _| {
            if x < 20 {
                Rgb([0, 0, 0])
            } else {
                Rgb([128, 128, 128])
            }
        });
        let metric = texture(&face);
        assert_eq!(metric.value, 25.6);
        assert_eq!(metric.level, Level::Medium);
        assert_eq!(metric.label(), "moderate");
    }

    #[test]
    fn all_values_stay_in_range() {
        let config = ExtractorConfig::default();
        for face in [checkerboard(48, 1), checkerboard(48, 3), flat(3, 3, SKIN)] {
            for metric in analyze_face(&face, &config).iter() {
                assert!(
                    (0.0..=100.0).contains(&metric.value),
                    "{} out of range: {}",
                    metric.condition,
                    metric.value
                );
            }
        }
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let face = checkerboard(40, 5);
        let parallel = analyze_face(&face, &ExtractorConfig::default());
        let sequential = analyze_face(
            &face,
            &ExtractorConfig {
                parallel: false,
                ..ExtractorConfig::default()
            },
        );
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn missing_region_is_empty() {
        assert!(analyze_region(None, &ExtractorConfig::default()).is_empty());
    }
}
