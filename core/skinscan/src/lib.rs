//! Facial skin analysis: locate the face, measure seven skin conditions,
//! aggregate a health score, classify the skin type and look up care advice.
//!
//! The heuristics are hand-tuned, not a validated diagnostic model.
//!
//! # Example
//!
//! ```no_run
//! use skinscan::{AnalysisConfig, SkinAnalyzer};
//!
//! let config = AnalysisConfig::load("skinscan.json").unwrap();
//! let analyzer = SkinAnalyzer::new(config).unwrap();
//!
//! let bytes = std::fs::read("selfie.jpg").unwrap();
//! let report = analyzer.analyze_bytes(&bytes);
//! if report.found {
//!     println!("{} skin, health {}", report.skin_type, report.health_score);
//! }
//! ```

#![warn(missing_docs)]

/// Skin-type classifiers and the rule cascade.
pub mod classify;
mod color;
/// Tunable analysis parameters.
pub mod config;
mod crop;
mod error;
/// Per-condition metric extractors.
pub mod extract;
/// Face detection traits and data types.
pub mod face_detector;
/// Decision-forest skin-type classifier.
pub mod forest;
/// Two-tier face location.
pub mod locate;
/// Condition metrics and the analysis result map.
pub mod metrics;
#[cfg(feature = "onnx")]
/// SSD face detector running on ONNX Runtime.
pub mod onnx_backend;
/// Care recommendations by skin type.
pub mod recommend;
#[cfg(feature = "rustface")]
/// SeetaFace-based face detector backend.
pub mod rustface_backend;
mod score;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub use classify::{build_classifier, RuleCascade, SkinType, SkinTypeClassifier};
pub use config::{AnalysisConfig, ClassifierKind, ExtractorConfig, LocatorConfig};
pub use crop::CropRegion;
pub use error::SkinScanError;
pub use face_detector::{FaceBounds, FaceDetector};
pub use forest::ForestClassifier;
pub use locate::{DetectorTier, FaceLocator, FaceRegion};
pub use metrics::{AnalysisResult, Condition, ConditionMetric, Level};
#[cfg(feature = "onnx")]
pub use onnx_backend::SsdFaceDetector;
pub use recommend::{recommend, RecommendationBundle};
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;
pub use score::health_score;

/// Outcome of analysing one image.
///
/// "No face" is a normal outcome: check `found` before reading the
/// analysis. A not-found report carries an empty analysis, a score of 0,
/// [`SkinType::Normal`] and the normal-skin advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Whether a face was located and analysed.
    pub found: bool,
    /// Padded crop that was analysed, in source image coordinates.
    pub face_bounds: Option<CropRegion>,
    /// Detector tier that located the face.
    pub detector_tier: Option<DetectorTier>,
    /// Per-condition metrics; empty when no face was found.
    pub analysis: AnalysisResult,
    /// Overall health in 0..=100.
    pub health_score: f64,
    /// Classified skin type.
    pub skin_type: SkinType,
    /// Advice for `skin_type` and the measured concerns.
    pub recommendations: RecommendationBundle,
}

/// One side of a before/after comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Whether a face was located.
    pub found: bool,
    /// Per-condition metrics.
    pub analysis: AnalysisResult,
    /// Overall health in 0..=100.
    pub health_score: f64,
}

impl From<ScanReport> for ScanSummary {
    fn from(report: ScanReport) -> Self {
        Self {
            found: report.found,
            analysis: report.analysis,
            health_score: report.health_score,
        }
    }
}

/// Health progress between two photos of the same person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Earlier photo.
    pub before: ScanSummary,
    /// Later photo.
    pub after: ScanSummary,
    /// `after.health_score - before.health_score`.
    pub improvement: f64,
    /// Improvement relative to the before score, or 0 when that score is 0.
    pub improvement_percentage: f64,
}

/// Runs the full analysis pipeline.
///
/// Construct with [`SkinAnalyzer::new`]; detectors named by the config's
/// model paths are loaded eagerly. Detector and classifier overrides are
/// applied through the builder methods.
pub struct SkinAnalyzer {
    config: AnalysisConfig,
    locator: FaceLocator,
    classifier: Box<dyn SkinTypeClassifier>,
}

impl SkinAnalyzer {
    /// Create an analyzer from `config`.
    ///
    /// Returns [`SkinScanError::InvalidConfig`] when `config` fails
    /// [`AnalysisConfig::validate`]. A model that fails to load is logged
    /// and left out; with no detector at all every image reports "not found".
    pub fn new(config: AnalysisConfig) -> Result<Self, SkinScanError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: AnalysisConfig) -> Self {
        let mut locator = FaceLocator::new(&config.locator);
        if let Some(detector) = default_primary(&config.locator) {
            locator = locator.with_primary(detector);
        }
        if let Some(detector) = default_fallback(&config.locator) {
            locator = locator.with_fallback(detector);
        }
        let classifier = build_classifier(&config.classifier);

        Self {
            config,
            locator,
            classifier,
        }
    }

    /// Use `detector` as the primary tier, replacing any configured one.
    ///
    /// ```no_run
    /// use image::DynamicImage;
    /// use skinscan::{FaceBounds, FaceDetector, SkinAnalyzer, SkinScanError};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError> {
    ///         // Your detection logic here
    ///         Ok(vec![])
    ///     }
    /// }
    ///
    /// let analyzer = SkinAnalyzer::default().face_detector(Box::new(MyDetector));
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.locator = self.locator.with_primary(detector);
        self
    }

    /// Use `detector` as the fallback tier, replacing any configured one.
    pub fn fallback_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.locator = self.locator.with_fallback(detector);
        self
    }

    /// Replace the configured skin-type classifier.
    pub fn classifier(mut self, classifier: Box<dyn SkinTypeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// The validated config this analyzer was built from.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse encoded image bytes (JPEG, PNG or WebP). Undecodable input
    /// is reported as "not found".
    pub fn analyze_bytes(&self, input: &[u8]) -> ScanReport {
        match locate::decode_image(input) {
            Ok(image) => self.analyze_image(&image),
            Err(e) => {
                log::debug!("no face: {e}");
                self.not_found()
            }
        }
    }

    /// Analyse a decoded image.
    pub fn analyze_image(&self, image: &DynamicImage) -> ScanReport {
        let Some(region) = self.locator.locate(image) else {
            log::debug!("no face located");
            return self.not_found();
        };

        let analysis = extract::analyze_region(Some(&region), &self.config.extractors);
        let health_score = health_score(&analysis);
        let skin_type = self.classifier.classify(&analysis);
        log::debug!("health score {health_score}, skin type {skin_type}");

        ScanReport {
            found: true,
            face_bounds: Some(region.bounds),
            detector_tier: Some(region.tier),
            recommendations: recommend(skin_type, &analysis),
            analysis,
            health_score,
            skin_type,
        }
    }

    /// Analyse a before and an after photo and report the change in health
    /// score.
    pub fn compare(&self, before: &[u8], after: &[u8]) -> Comparison {
        let before = ScanSummary::from(self.analyze_bytes(before));
        let after = ScanSummary::from(self.analyze_bytes(after));

        let improvement = metrics::round2(after.health_score - before.health_score);
        let improvement_percentage = if before.health_score > 0.0 {
            metrics::round2(improvement / before.health_score * 100.0)
        } else {
            0.0
        };

        Comparison {
            before,
            after,
            improvement,
            improvement_percentage,
        }
    }

    fn not_found(&self) -> ScanReport {
        let analysis = AnalysisResult::new();
        ScanReport {
            found: false,
            face_bounds: None,
            detector_tier: None,
            health_score: health_score(&analysis),
            skin_type: SkinType::Normal,
            recommendations: recommend(SkinType::Normal, &analysis),
            analysis,
        }
    }
}

impl Default for SkinAnalyzer {
    fn default() -> Self {
        Self::with_valid_config(AnalysisConfig::default())
    }
}

#[cfg(feature = "rustface")]
fn default_primary(config: &LocatorConfig) -> Option<Box<dyn FaceDetector>> {
    let path = config.primary_model_path.as_ref()?;
    match RustfaceDetector::from_file(path, config) {
        Ok(detector) => Some(Box::new(detector)),
        Err(e) => {
            log::warn!("primary face detector unavailable: {e}");
            None
        }
    }
}

#[cfg(not(feature = "rustface"))]
fn default_primary(config: &LocatorConfig) -> Option<Box<dyn FaceDetector>> {
    if config.primary_model_path.is_some() {
        log::warn!("primary_model_path is set but skinscan was built without `rustface`");
    }
    None
}

#[cfg(feature = "onnx")]
fn default_fallback(config: &LocatorConfig) -> Option<Box<dyn FaceDetector>> {
    let path = config.fallback_model_path.as_ref()?;
    match SsdFaceDetector::from_file(path, config) {
        Ok(detector) => Some(Box::new(detector)),
        Err(e) => {
            log::warn!("fallback face detector unavailable: {e}");
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn default_fallback(config: &LocatorConfig) -> Option<Box<dyn FaceDetector>> {
    if config.fallback_model_path.is_some() {
        log::warn!("fallback_model_path is set but skinscan was built without `onnx`");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;

        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    /// Reports one face covering the middle half of the image.
    struct CenterFace;

    impl FaceDetector for CenterFace {
        fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError> {
            let (w, h) = (image.width() as f64, image.height() as f64);
            Ok(vec![FaceBounds {
                x: w / 4.0,
                y: h / 4.0,
                width: w / 2.0,
                height: h / 2.0,
                confidence: 0.9,
            }])
        }
    }

    struct NoFace;

    impl FaceDetector for NoFace {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError> {
            Ok(vec![])
        }
    }

    /// Always answers the same label, to prove overrides are used.
    struct AlwaysDry;

    impl SkinTypeClassifier for AlwaysDry {
        fn classify(&self, _analysis: &AnalysisResult) -> SkinType {
            SkinType::Dry
        }
    }

    fn analyzer() -> SkinAnalyzer {
        SkinAnalyzer::default().face_detector(Box::new(CenterFace))
    }

    fn assert_not_found(report: &ScanReport) {
        assert!(!report.found);
        assert!(report.analysis.is_empty());
        assert_eq!(report.health_score, 0.0);
        assert_eq!(report.skin_type, SkinType::Normal);
        assert_eq!(report.recommendations, recommend(SkinType::Normal, &AnalysisResult::new()));
        assert!(report.face_bounds.is_none());
        assert!(report.detector_tier.is_none());
    }

    #[test]
    fn located_face_is_fully_analysed() {
        let report = analyzer().analyze_bytes(&make_test_png(200, 160));
        assert!(report.found);
        assert_eq!(report.detector_tier, Some(DetectorTier::Primary));
        assert_eq!(report.analysis.len(), Condition::ALL.len());
        assert!((0.0..=100.0).contains(&report.health_score));
        assert_eq!(report.recommendations.skin_type, report.skin_type);
        // 100x80 face padded by 20 on each side
        assert_eq!(
            report.face_bounds,
            Some(CropRegion {
                x: 30,
                y: 20,
                width: 140,
                height: 120
            })
        );
    }

    #[test]
    fn no_detector_is_not_found() {
        assert_not_found(&SkinAnalyzer::default().analyze_bytes(&make_test_png(100, 100)));
    }

    #[test]
    fn empty_detections_are_not_found() {
        let analyzer = SkinAnalyzer::default().face_detector(Box::new(NoFace));
        assert_not_found(&analyzer.analyze_bytes(&make_test_png(100, 100)));
    }

    #[test]
    fn undecodable_input_is_not_found() {
        assert_not_found(&analyzer().analyze_bytes(b"not an image"));
        assert_not_found(&analyzer().analyze_bytes(&[]));
    }

    #[test]
    fn fallback_detector_is_consulted() {
        let analyzer = SkinAnalyzer::default()
            .face_detector(Box::new(NoFace))
            .fallback_detector(Box::new(CenterFace));
        let report = analyzer.analyze_bytes(&make_test_png(120, 120));
        assert_eq!(report.detector_tier, Some(DetectorTier::Fallback));
    }

    #[test]
    fn classifier_override_is_used() {
        let report = analyzer()
            .classifier(Box::new(AlwaysDry))
            .analyze_bytes(&make_test_png(120, 120));
        assert_eq!(report.skin_type, SkinType::Dry);
        assert_eq!(report.recommendations.skin_type, SkinType::Dry);
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let png = make_test_png(180, 140);
        let analyzer = analyzer();
        let first = analyzer.analyze_bytes(&png);
        let second = analyzer.analyze_bytes(&png);
        assert_eq!(first, second);
    }

    #[test]
    fn sequential_and_parallel_extraction_agree() {
        let png = make_test_png(150, 150);
        let mut config = AnalysisConfig::default();
        config.extractors.parallel = false;
        let sequential = SkinAnalyzer::new(config)
            .unwrap()
            .face_detector(Box::new(CenterFace))
            .analyze_bytes(&png);
        assert_eq!(sequential, analyzer().analyze_bytes(&png));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = AnalysisConfig::default();
        config.extractors.blur_sigma = 0.0;
        assert!(matches!(
            SkinAnalyzer::new(config),
            Err(SkinScanError::InvalidConfig(_))
        ));

        let mut config = AnalysisConfig::default();
        config.extractors.acne_min_area = 600;
        assert!(SkinAnalyzer::new(config).is_err());
    }

    #[test]
    fn compare_same_photo_shows_no_change() {
        let png = make_test_png(160, 160);
        let comparison = analyzer().compare(&png, &png);
        assert!(comparison.before.found && comparison.after.found);
        assert_eq!(comparison.improvement, 0.0);
        assert_eq!(comparison.improvement_percentage, 0.0);
    }

    #[test]
    fn compare_from_missing_face_has_zero_percentage() {
        let comparison = analyzer().compare(b"broken", &make_test_png(160, 160));
        assert!(!comparison.before.found);
        assert_eq!(comparison.before.health_score, 0.0);
        assert_eq!(comparison.improvement, comparison.after.health_score);
        assert_eq!(comparison.improvement_percentage, 0.0);
    }

    #[test]
    fn report_serializes_to_consumer_shape() {
        let report = analyzer().analyze_bytes(&make_test_png(120, 120));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["found"], true);
        assert_eq!(json["detector_tier"], "primary");
        assert!(json["analysis"]["acne_spots"]["value"].is_number());
        assert!(json["analysis"]["texture"]["level"].is_string());
        let label = json["analysis"]["texture"]["label"].as_str().unwrap();
        assert!(["smooth", "moderate", "rough"].contains(&label), "{label}");
        assert!(json["recommendations"]["general_tips"].is_array());
    }
}
