//! Neural fallback detector running a 300×300 SSD face model through ONNX
//! Runtime.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;

use crate::config::LocatorConfig;
use crate::error::SkinScanError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Values per detection row: image id, label, confidence, x1, y1, x2, y2.
const ROW_LEN: usize = 7;

/// SSD face detector. Every row the model emits is returned; the locator
/// applies the confidence threshold.
pub struct SsdFaceDetector {
    session: Mutex<Session>,
    input_size: u32,
    mean_bgr: [f32; 3],
}

impl SsdFaceDetector {
    /// Load an ONNX model file.
    pub fn from_file(path: impl AsRef<Path>, config: &LocatorConfig) -> Result<Self, SkinScanError> {
        let path = path.as_ref();
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| SkinScanError::ModelLoad(format!("{}: {e}", path.display())))?;
        log::debug!("loaded SSD face model from {}", path.display());
        Ok(Self::with_session(session, config))
    }

    /// Load an ONNX model from memory.
    pub fn from_bytes(model: &[u8], config: &LocatorConfig) -> Result<Self, SkinScanError> {
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_memory(model))
            .map_err(|e| SkinScanError::ModelLoad(e.to_string()))?;
        Ok(Self::with_session(session, config))
    }

    fn with_session(session: Session, config: &LocatorConfig) -> Self {
        Self {
            session: Mutex::new(session),
            input_size: config.fallback_input_size,
            mean_bgr: config.fallback_mean,
        }
    }

    /// Resize to the model input and lay out as mean-subtracted BGR NCHW.
    fn blob(&self, image: &DynamicImage) -> Vec<f32> {
        let size = self.input_size;
        let resized = imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle);
        let plane = (size * size) as usize;
        let mut data = vec![0f32; 3 * plane];

        for (i, pixel) in resized.pixels().enumerate() {
            let [r, g, b] = pixel.0;
            data[i] = b as f32 - self.mean_bgr[0];
            data[plane + i] = g as f32 - self.mean_bgr[1];
            data[2 * plane + i] = r as f32 - self.mean_bgr[2];
        }
        data
    }
}

impl FaceDetector for SsdFaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBounds>, SkinScanError> {
        let (width, height) = (image.width() as f64, image.height() as f64);
        if width == 0.0 || height == 0.0 {
            return Err(SkinScanError::ZeroDimensions);
        }

        let size = self.input_size as usize;
        let input = Value::from_array((vec![1usize, 3, size, size], self.blob(image)))
            .map_err(|e| SkinScanError::Inference(e.to_string()))?;

        let mut session = self.session.lock();
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(|e| SkinScanError::Inference(e.to_string()))?;
        let (_, rows) = outputs
            .get(&output_name)
            .ok_or_else(|| SkinScanError::Inference(format!("missing output {output_name}")))?
            .try_extract_tensor::<f32>()
            .map_err(|e| SkinScanError::Inference(e.to_string()))?;

        Ok(parse_detections(rows, width, height))
    }
}

/// Turn raw `[_, _, confidence, x1, y1, x2, y2]` rows with normalised
/// corners into boxes clamped to the image.
fn parse_detections(rows: &[f32], width: f64, height: f64) -> Vec<FaceBounds> {
    rows.chunks_exact(ROW_LEN)
        .filter_map(|row| {
            let x1 = (row[3] as f64 * width).clamp(0.0, width);
            let y1 = (row[4] as f64 * height).clamp(0.0, height);
            let x2 = (row[5] as f64 * width).clamp(0.0, width);
            let y2 = (row[6] as f64 * height).clamp(0.0, height);
            (x2 > x1 && y2 > y1).then(|| FaceBounds {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence: row[2] as f64,
            })
        })
        .collect()
}
