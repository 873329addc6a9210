use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::SkinScanError;

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score. The scale depends on the backend.
    pub confidence: f64,
}

impl FaceBounds {
    /// Area of the bounding box in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom face detector and pass it to
/// [`crate::SkinAnalyzer::face_detector`] or
/// [`crate::SkinAnalyzer::fallback_detector`]. Errors are logged and treated
/// as "no face" by the locator.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in `image`, returning every candidate rectangle.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError>;
}
