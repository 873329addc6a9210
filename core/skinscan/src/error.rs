use thiserror::Error;

/// Errors from decoding, model loading, inference and configuration.
#[derive(Debug, Error)]
pub enum SkinScanError {
    /// Input bytes are not a supported image.
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    /// Decoded image has no pixels.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// A detector or classifier model could not be read or parsed.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// A loaded model failed while running.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A config value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a config file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Config JSON is malformed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
