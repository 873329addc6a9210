//! Tunable parameters for face location, condition extraction and skin-type
//! classification.
//!
//! Every threshold here is a hand-tuned heuristic, not a calibrated
//! constant, so all of them can be overridden from JSON:
//!
//! ```
//! use skinscan::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_json_str(
//!     r#"{ "locator": { "padding": 32 }, "extractors": { "oiliness_divisor": 800.0 } }"#,
//! ).unwrap();
//! assert_eq!(config.locator.padding, 32);
//! assert_eq!(config.locator.min_face_size, 100);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SkinScanError;

/// Full analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Face detection and cropping.
    pub locator: LocatorConfig,
    /// Condition extractor thresholds.
    pub extractors: ExtractorConfig,
    /// Which skin-type classifier to use.
    pub classifier: ClassifierKind,
}

/// Face locator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Pixels added on every side of the detected face before cropping (default: 20).
    pub padding: u32,
    /// Smallest face the primary detector looks for, in pixels (default: 100).
    pub min_face_size: u32,
    /// Primary detector score threshold (default: 2.0).
    pub score_threshold: f64,
    /// Image pyramid scale factor for the primary detector (default: 1/1.1).
    pub pyramid_scale_factor: f32,
    /// Sliding window step of the primary detector, in pixels (default: 4).
    pub slide_window_step: u32,
    /// Square input size of the fallback network (default: 300).
    pub fallback_input_size: u32,
    /// Detections at or below this confidence are discarded (default: 0.5).
    pub fallback_confidence: f32,
    /// Per-channel mean subtracted from the fallback input, in B, G, R order.
    pub fallback_mean: [f32; 3],
    /// SeetaFace model used by the primary detector.
    pub primary_model_path: Option<PathBuf>,
    /// SSD face model used by the fallback detector.
    pub fallback_model_path: Option<PathBuf>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            padding: 20,
            min_face_size: 100,
            score_threshold: 2.0,
            pyramid_scale_factor: 1.0 / 1.1,
            slide_window_step: 4,
            fallback_input_size: 300,
            fallback_confidence: 0.5,
            fallback_mean: [104.0, 177.0, 123.0],
            primary_model_path: None,
            fallback_model_path: None,
        }
    }
}

/// Condition extractor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Gaussian sigma applied before acne thresholding (default: 1.1, a 5×5 kernel).
    pub blur_sigma: f32,
    /// Smallest dark-spot component counted as acne, in pixels (default: 10).
    pub acne_min_area: u32,
    /// Largest dark-spot component counted as acne, in pixels (default: 500).
    pub acne_max_area: u32,
    /// Multiplier from spot area fraction to severity (default: 1000).
    pub acne_area_scale: f64,
    /// Pixels darker than this fraction of the mean lightness count as dark circles (default: 0.7).
    pub dark_circle_ratio: f64,
    /// Red hue ranges on the 0..=180 hue scale, inclusive (default: 0..=10 and 170..=180).
    pub red_hue_ranges: Vec<[u8; 2]>,
    /// Minimum saturation and value for a pixel to count as red (default: 50).
    pub red_min_saturation_value: u8,
    /// Grayscale variance that maps to an oiliness score of 100 (default: 1000).
    pub oiliness_divisor: f64,
    /// Laplacian variance that maps to a dryness score of 100 (default: 500).
    pub dryness_divisor: f64,
    /// Run extractors concurrently when the `parallel` feature is enabled (default: true).
    pub parallel: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            acne_min_area: 10,
            acne_max_area: 500,
            acne_area_scale: 1000.0,
            dark_circle_ratio: 0.7,
            red_hue_ranges: vec![[0, 10], [170, 180]],
            red_min_saturation_value: 50,
            oiliness_divisor: 1000.0,
            dryness_divisor: 500.0,
            parallel: true,
        }
    }
}

/// Skin-type classifier selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierKind {
    /// The hand-built rule cascade.
    #[default]
    Rules,
    /// A decision forest loaded from JSON, with the rule cascade as fallback.
    Forest {
        /// Path to the serialized forest.
        path: PathBuf,
    },
}

impl AnalysisConfig {
    /// Parse and validate a configuration from a JSON string. Missing fields
    /// take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SkinScanError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkinScanError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Reject values that would make the heuristics meaningless.
    pub fn validate(&self) -> Result<(), SkinScanError> {
        let locator = &self.locator;
        let extractors = &self.extractors;

        if locator.fallback_input_size == 0 {
            return Err(invalid("fallback_input_size must be > 0"));
        }
        if !(0.0..=1.0).contains(&locator.fallback_confidence) {
            return Err(invalid(format!(
                "fallback_confidence must be within 0.0..=1.0, got {}",
                locator.fallback_confidence
            )));
        }
        if !(locator.pyramid_scale_factor > 0.0 && locator.pyramid_scale_factor < 1.0) {
            return Err(invalid(format!(
                "pyramid_scale_factor must be within (0.0, 1.0), got {}",
                locator.pyramid_scale_factor
            )));
        }
        if locator.slide_window_step == 0 {
            return Err(invalid("slide_window_step must be > 0"));
        }
        if !(extractors.blur_sigma > 0.0 && extractors.blur_sigma.is_finite()) {
            return Err(invalid("blur_sigma must be > 0"));
        }
        if extractors.acne_min_area > extractors.acne_max_area {
            return Err(invalid(format!(
                "acne area range is inverted: {} > {}",
                extractors.acne_min_area, extractors.acne_max_area
            )));
        }
        if !(extractors.acne_area_scale > 0.0) {
            return Err(invalid("acne_area_scale must be > 0"));
        }
        if !(extractors.oiliness_divisor > 0.0 && extractors.dryness_divisor > 0.0) {
            return Err(invalid("variance divisors must be > 0"));
        }
        if extractors
            .red_hue_ranges
            .iter()
            .any(|[low, high]| low > high || *high > 180)
        {
            return Err(invalid("red hue ranges must satisfy low <= high <= 180"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SkinScanError {
    SkinScanError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            AnalysisConfig::from_json_str(r#"{"extractors": {"dryness_divisor": 250.0}}"#).unwrap();
        assert_eq!(config.extractors.dryness_divisor, 250.0);
        assert_eq!(config.extractors.oiliness_divisor, 1000.0);
        assert_eq!(config.locator.padding, 20);
    }

    #[test]
    fn forest_classifier_is_tagged() {
        let config = AnalysisConfig::from_json_str(
            r#"{"classifier": {"kind": "forest", "path": "models/skin_forest.json"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.classifier,
            ClassifierKind::Forest {
                path: PathBuf::from("models/skin_forest.json")
            }
        );
    }

    #[test]
    fn rejects_inverted_acne_range() {
        let result =
            AnalysisConfig::from_json_str(r#"{"extractors": {"acne_min_area": 600}}"#);
        assert!(matches!(result, Err(SkinScanError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_divisor() {
        let result =
            AnalysisConfig::from_json_str(r#"{"extractors": {"oiliness_divisor": 0.0}}"#);
        assert!(matches!(result, Err(SkinScanError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unusable_blur_sigma() {
        for sigma in [0.0, -1.0, f32::NAN] {
            let mut config = AnalysisConfig::default();
            config.extractors.blur_sigma = sigma;
            assert!(
                matches!(config.validate(), Err(SkinScanError::InvalidConfig(_))),
                "sigma {sigma} accepted"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let result =
            AnalysisConfig::from_json_str(r#"{"locator": {"fallback_confidence": 1.5}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_hue_beyond_scale() {
        let result =
            AnalysisConfig::from_json_str(r#"{"extractors": {"red_hue_ranges": [[170, 200]]}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let result = AnalysisConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(SkinScanError::Json(_))));
    }
}
