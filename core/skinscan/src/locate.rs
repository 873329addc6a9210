//! Two-tier face location.
//!
//! The primary detector runs first and its largest candidate wins. Only when
//! it finds nothing is the fallback detector consulted, and then the most
//! confident candidate above the configured threshold wins. Decode failures,
//! missing models and detector errors all collapse into "no face": callers
//! cannot, and need not, tell those apart. Candidates lying wholly outside
//! the image are dropped before either selection.

use std::cmp::Ordering;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::config::LocatorConfig;
use crate::crop::{padded_region, CropRegion};
use crate::error::SkinScanError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Which detector tier produced a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorTier {
    /// Cascade detector, largest face wins.
    Primary,
    /// Neural detector, most confident face wins.
    Fallback,
}

/// The cropped face handed to the extractors.
#[derive(Debug, Clone)]
pub struct FaceRegion {
    /// Padded, clamped crop rectangle in source image coordinates.
    pub bounds: CropRegion,
    /// Detector that found the face.
    pub tier: DetectorTier,
    /// Pixels inside `bounds`.
    pub image: RgbImage,
}

/// Finds the principal face in an image using up to two detectors.
pub struct FaceLocator {
    primary: Option<Box<dyn FaceDetector>>,
    fallback: Option<Box<dyn FaceDetector>>,
    padding: u32,
    fallback_confidence: f64,
}

impl FaceLocator {
    /// A locator with no detectors; [`FaceLocator::locate`] finds nothing
    /// until at least one is attached.
    pub fn new(config: &LocatorConfig) -> Self {
        Self {
            primary: None,
            fallback: None,
            padding: config.padding,
            fallback_confidence: config.fallback_confidence as f64,
        }
    }

    /// Attach the primary detector, replacing any earlier one.
    pub fn with_primary(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.primary = Some(detector);
        self
    }

    /// Attach the fallback detector, replacing any earlier one.
    pub fn with_fallback(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.fallback = Some(detector);
        self
    }

    /// Whether either tier has a detector.
    pub fn has_detector(&self) -> bool {
        self.primary.is_some() || self.fallback.is_some()
    }

    /// Decode `input` and locate the face in it.
    pub fn locate_bytes(&self, input: &[u8]) -> Option<FaceRegion> {
        match decode_image(input) {
            Ok(image) => self.locate(&image),
            Err(e) => {
                log::debug!("no face: {e}");
                None
            }
        }
    }

    /// Locate the principal face and return its padded crop.
    pub fn locate(&self, image: &DynamicImage) -> Option<FaceRegion> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }

        let (bounds, tier) = self.detect(image)?;
        let crop = padded_region(&bounds, self.padding, image.width(), image.height())?;
        log::debug!(
            "{tier:?} detector chose face at ({}, {}) {}x{}, cropped to ({}, {}) {}x{}",
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            crop.x,
            crop.y,
            crop.width,
            crop.height
        );

        let image = image
            .crop_imm(crop.x, crop.y, crop.width, crop.height)
            .to_rgb8();
        Some(FaceRegion {
            bounds: crop,
            tier,
            image,
        })
    }

    fn detect(&self, image: &DynamicImage) -> Option<(FaceBounds, DetectorTier)> {
        if let Some(face) = self
            .candidates(self.primary.as_deref(), image, DetectorTier::Primary)
            .and_then(|faces| select_largest(&faces))
        {
            return Some((face, DetectorTier::Primary));
        }

        let candidates = self.candidates(self.fallback.as_deref(), image, DetectorTier::Fallback)?;
        select_most_confident(&candidates, self.fallback_confidence)
            .map(|face| (face, DetectorTier::Fallback))
    }

    /// Run one tier and keep only candidates that leave a non-empty crop.
    fn candidates(
        &self,
        detector: Option<&dyn FaceDetector>,
        image: &DynamicImage,
        tier: DetectorTier,
    ) -> Option<Vec<FaceBounds>> {
        let (width, height) = (image.width(), image.height());
        let mut faces = run_detector(detector?, image, tier)?;
        faces.retain(|face| padded_region(face, self.padding, width, height).is_some());
        Some(faces)
    }
}

/// Decode JPEG, PNG or WebP bytes, rejecting empty images.
pub fn decode_image(input: &[u8]) -> Result<DynamicImage, SkinScanError> {
    let image =
        image::load_from_memory(input).map_err(|e| SkinScanError::DecodeError(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(SkinScanError::ZeroDimensions);
    }
    Ok(image)
}

fn run_detector(
    detector: &dyn FaceDetector,
    image: &DynamicImage,
    tier: DetectorTier,
) -> Option<Vec<FaceBounds>> {
    match detector.detect(image) {
        Ok(faces) => {
            log::debug!("{tier:?} detector returned {} candidate(s)", faces.len());
            Some(faces)
        }
        Err(e) => {
            log::warn!("{tier:?} face detector failed: {e}");
            None
        }
    }
}

/// Leftmost, then topmost, first.
fn position_order(a: &FaceBounds, b: &FaceBounds) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Largest area wins; equal areas go to the leftmost, then topmost face.
pub fn select_largest(faces: &[FaceBounds]) -> Option<FaceBounds> {
    faces
        .iter()
        .filter(|face| face.area() > 0.0)
        .min_by(|a, b| {
            b.area()
                .total_cmp(&a.area())
                .then_with(|| position_order(a, b))
        })
        .cloned()
}

/// Highest confidence strictly above `threshold` wins; equal confidences go
/// to the leftmost, then topmost face.
pub fn select_most_confident(faces: &[FaceBounds], threshold: f64) -> Option<FaceBounds> {
    faces
        .iter()
        .filter(|face| face.confidence > threshold && face.area() > 0.0)
        .min_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| position_order(a, b))
        })
        .cloned()
}
