use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use skinscan_core::{
    AnalysisConfig, AnalysisResult, RecommendationBundle, ScanReport, ScanSummary, SkinAnalyzer,
    SkinScanError,
};

fn to_py_err(e: SkinScanError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn build_analyzer(config_json: Option<&str>, detector_model: Option<&[u8]>) -> PyResult<SkinAnalyzer> {
    let config = match config_json {
        Some(json) => AnalysisConfig::from_json_str(json).map_err(to_py_err)?,
        None => AnalysisConfig::default(),
    };
    let analyzer = SkinAnalyzer::new(config).map_err(to_py_err)?;
    with_detector(analyzer, detector_model)
}

#[cfg(feature = "face-detection")]
fn with_detector(analyzer: SkinAnalyzer, detector_model: Option<&[u8]>) -> PyResult<SkinAnalyzer> {
    let Some(model) = detector_model else {
        return Ok(analyzer);
    };
    let detector = skinscan_core::RustfaceDetector::from_bytes(model, &analyzer.config().locator)
        .map_err(to_py_err)?;
    Ok(analyzer.face_detector(Box::new(detector)))
}

#[cfg(not(feature = "face-detection"))]
fn with_detector(analyzer: SkinAnalyzer, detector_model: Option<&[u8]>) -> PyResult<SkinAnalyzer> {
    match detector_model {
        Some(_) => Err(PyValueError::new_err(
            "detector_model requires the face-detection feature",
        )),
        None => Ok(analyzer),
    }
}

fn analysis_dict<'py>(py: Python<'py>, analysis: &AnalysisResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for metric in analysis.iter() {
        let entry = PyDict::new(py);
        entry.set_item("value", metric.value)?;
        entry.set_item("level", metric.level.as_str())?;
        entry.set_item("label", metric.label())?;
        if let Some(count) = metric.count {
            entry.set_item("count", count)?;
        }
        dict.set_item(metric.condition.name(), entry)?;
    }
    Ok(dict)
}

fn recommendations_dict<'py>(
    py: Python<'py>,
    bundle: &RecommendationBundle,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("skin_type", bundle.skin_type.as_str())?;
    dict.set_item("products", &bundle.products)?;
    dict.set_item("morning_routine", &bundle.morning_routine)?;
    dict.set_item("night_routine", &bundle.night_routine)?;
    dict.set_item("diet_tips", &bundle.diet_tips)?;
    dict.set_item("hydration_tips", &bundle.hydration_tips)?;
    dict.set_item("general_tips", &bundle.general_tips)?;
    Ok(dict)
}

fn report_dict<'py>(py: Python<'py>, report: &ScanReport) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("found", report.found)?;
    match report.face_bounds {
        Some(bounds) => {
            let fb = PyDict::new(py);
            fb.set_item("x", bounds.x)?;
            fb.set_item("y", bounds.y)?;
            fb.set_item("width", bounds.width)?;
            fb.set_item("height", bounds.height)?;
            dict.set_item("face_bounds", fb)?;
        }
        None => dict.set_item("face_bounds", py.None())?,
    }
    let tier = report.detector_tier.map(|tier| match tier {
        skinscan_core::DetectorTier::Primary => "primary",
        skinscan_core::DetectorTier::Fallback => "fallback",
    });
    dict.set_item("detector_tier", tier)?;
    dict.set_item("analysis", analysis_dict(py, &report.analysis)?)?;
    dict.set_item("health_score", report.health_score)?;
    dict.set_item("skin_type", report.skin_type.as_str())?;
    dict.set_item(
        "recommendations",
        recommendations_dict(py, &report.recommendations)?,
    )?;
    Ok(dict)
}

fn summary_dict<'py>(py: Python<'py>, summary: &ScanSummary) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("found", summary.found)?;
    dict.set_item("analysis", analysis_dict(py, &summary.analysis)?)?;
    dict.set_item("health_score", summary.health_score)?;
    Ok(dict)
}

/// Analyse the skin in a face photo.
///
/// Args:
///     input: Raw image bytes (JPEG, PNG, or WebP)
///     config_json: Analysis config as a JSON string (optional, defaults apply)
///     detector_model: SeetaFace model bytes for the primary face detector
///
/// Returns:
///     dict with keys: found (bool), face_bounds (dict or None), detector_tier
///     (str or None), analysis (dict), health_score (float), skin_type (str),
///     recommendations (dict). When found is False the analysis is empty.
#[pyfunction]
#[pyo3(signature = (input, *, config_json=None, detector_model=None))]
fn analyze(
    py: Python<'_>,
    input: Vec<u8>,
    config_json: Option<&str>,
    detector_model: Option<Vec<u8>>,
) -> PyResult<Py<PyDict>> {
    let analyzer = build_analyzer(config_json, detector_model.as_deref())?;
    let report = py.allow_threads(|| analyzer.analyze_bytes(&input));
    Ok(report_dict(py, &report)?.into())
}

/// Compare the skin health of a before and an after photo.
///
/// Args:
///     before: Raw image bytes of the earlier photo
///     after: Raw image bytes of the later photo
///     config_json: Analysis config as a JSON string (optional)
///     detector_model: SeetaFace model bytes for the primary face detector
///
/// Returns:
///     dict with keys: before (dict), after (dict), improvement (float),
///     improvement_percentage (float)
#[pyfunction]
#[pyo3(signature = (before, after, *, config_json=None, detector_model=None))]
fn compare(
    py: Python<'_>,
    before: Vec<u8>,
    after: Vec<u8>,
    config_json: Option<&str>,
    detector_model: Option<Vec<u8>>,
) -> PyResult<Py<PyDict>> {
    let analyzer = build_analyzer(config_json, detector_model.as_deref())?;
    let comparison = py.allow_threads(|| analyzer.compare(&before, &after));

    let dict = PyDict::new(py);
    dict.set_item("before", summary_dict(py, &comparison.before)?)?;
    dict.set_item("after", summary_dict(py, &comparison.after)?)?;
    dict.set_item("improvement", comparison.improvement)?;
    dict.set_item("improvement_percentage", comparison.improvement_percentage)?;
    Ok(dict.into())
}

#[pymodule]
fn skinscan(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(compare, m)?)?;
    Ok(())
}
