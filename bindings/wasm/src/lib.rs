use serde::{Deserialize, Serialize};
use skinscan::{AnalysisConfig, SkinAnalyzer, SkinScanError};
use wasm_bindgen::prelude::*;

/// Options for skin analysis, passed as a JavaScript object.
///
/// All fields are optional. `config` replaces the whole analysis config;
/// the remaining fields override single values on top of it.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    pub config: Option<AnalysisConfig>,
    pub padding: Option<u32>,
    pub min_face_size: Option<u32>,
    pub score_threshold: Option<f64>,
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert a `SkinScanError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: SkinScanError) -> JsValue {
    let code = match &e {
        SkinScanError::DecodeError(_) => "DECODE_ERROR",
        SkinScanError::ZeroDimensions => "ZERO_DIMENSIONS",
        SkinScanError::ModelLoad(_) => "MODEL_LOAD",
        SkinScanError::Inference(_) => "INFERENCE",
        SkinScanError::InvalidConfig(_) => "INVALID_OPTIONS",
        SkinScanError::Io(_) => "IO_ERROR",
        SkinScanError::Json(_) => "INVALID_OPTIONS",
    };
    make_error(code, &e.to_string())
}

fn parse_options(options: JsValue) -> Result<AnalysisConfig, JsValue> {
    let opts: AnalyzeOptions = if options.is_undefined() || options.is_null() {
        AnalyzeOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))?
    };

    let mut config = opts.config.unwrap_or_default();
    if let Some(padding) = opts.padding {
        config.locator.padding = padding;
    }
    if let Some(size) = opts.min_face_size {
        config.locator.min_face_size = size;
    }
    if let Some(threshold) = opts.score_threshold {
        config.locator.score_threshold = threshold;
    }
    // Threads are unavailable in the browser
    config.extractors.parallel = false;
    Ok(config)
}

fn build_analyzer(detector_model: Option<Vec<u8>>, options: JsValue) -> Result<SkinAnalyzer, JsValue> {
    let analyzer = SkinAnalyzer::new(parse_options(options)?).map_err(to_js_error)?;
    match detector_model {
        Some(model) => with_detector(analyzer, &model),
        None => Ok(analyzer),
    }
}

#[cfg(feature = "face-detection")]
fn with_detector(analyzer: SkinAnalyzer, model: &[u8]) -> Result<SkinAnalyzer, JsValue> {
    let detector = skinscan::RustfaceDetector::from_bytes(model, &analyzer.config().locator)
        .map_err(to_js_error)?;
    Ok(analyzer.face_detector(Box::new(detector)))
}

#[cfg(not(feature = "face-detection"))]
fn with_detector(_analyzer: SkinAnalyzer, _model: &[u8]) -> Result<SkinAnalyzer, JsValue> {
    Err(make_error(
        "INVALID_OPTIONS",
        "detector_model requires the face-detection feature",
    ))
}

/// Serialize to a plain JS object (maps become objects, not `Map`s).
fn to_js_object<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| make_error("SERIALIZE_ERROR", &e.to_string()))
}

/// Analyse the skin in a face photo.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param detector_model - SeetaFace model bytes for the face detector
/// @param options - Optional object with fields: config, padding,
///   minFaceSize, scoreThreshold
/// @returns Report object with found, face_bounds, detector_tier, analysis,
///   health_score, skin_type and recommendations
#[wasm_bindgen]
pub fn analyze(
    input: Vec<u8>,
    detector_model: Option<Vec<u8>>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let analyzer = build_analyzer(detector_model, options)?;
    to_js_object(&analyzer.analyze_bytes(&input))
}

/// Compare the skin health of a before and an after photo.
///
/// @param before - Raw image bytes of the earlier photo
/// @param after - Raw image bytes of the later photo
/// @param detector_model - SeetaFace model bytes for the face detector
/// @param options - Same as for `analyze`
/// @returns Object with before, after, improvement and improvement_percentage
#[wasm_bindgen]
pub fn compare(
    before: Vec<u8>,
    after: Vec<u8>,
    detector_model: Option<Vec<u8>>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let analyzer = build_analyzer(detector_model, options)?;
    to_js_object(&analyzer.compare(&before, &after))
}
