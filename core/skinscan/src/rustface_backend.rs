use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;

use crate::config::LocatorConfig;
use crate::error::SkinScanError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// This is the primary tier of the face locator. The model is parsed once on
/// construction and cloned into a fresh detector per call, so a single
/// instance can be shared across threads.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_threshold: f64,
    pyramid_scale_factor: f32,
    slide_window_step: u32,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file.
    pub fn from_file(path: impl AsRef<Path>, config: &LocatorConfig) -> Result<Self, SkinScanError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            SkinScanError::ModelLoad(format!("{}: {e}", path.display()))
        })?;
        Self::from_bytes(&data, config)
    }

    /// Parse a SeetaFace model from memory.
    pub fn from_bytes(model_data: &[u8], config: &LocatorConfig) -> Result<Self, SkinScanError> {
        let model = rustface::read_model(Cursor::new(model_data))
            .map_err(|e| SkinScanError::ModelLoad(format!("SeetaFace model: {e}")))?;
        Ok(Self {
            model,
            min_face_size: config.min_face_size,
            score_threshold: config.score_threshold,
            pyramid_scale_factor: config.pyramid_scale_factor,
            slide_window_step: config.slide_window_step,
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_threshold);
        detector.set_pyramid_scale_factor(self.pyramid_scale_factor);
        detector.set_slide_window_step(self.slide_window_step, self.slide_window_step);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        log::debug!("rustface found {} candidate(s) in {width}x{height}", faces.len());

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    confidence: face.score(),
                }
            })
            .collect())
    }
}
