// Per-request error type. Every failure between the analyze trigger and
// the rendered report maps to one of these variants; the UI decides how
// failure is shown, rather than receiving an error disguised as a report.

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong during one analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not read image data: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported image type '{0}' (accepted: jpg, jpeg, png, bmp, gif)")]
    UnsupportedFormat(String),

    #[error("request to the analysis service failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("the analysis service rejected the API key ({0})")]
    Unauthorized(StatusCode),

    #[error("the analysis service rate-limited the request, try again later")]
    RateLimited,

    #[error("the analysis service returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("unexpected response from the analysis service: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Stable short name for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Io(_) => "io",
            AnalysisError::Decode(_) => "decode",
            AnalysisError::UnsupportedFormat(_) => "unsupported-format",
            AnalysisError::Network(_) => "network",
            AnalysisError::Unauthorized(_) => "unauthorized",
            AnalysisError::RateLimited => "rate-limited",
            AnalysisError::Api { .. } => "api",
            AnalysisError::MalformedResponse(_) => "malformed-response",
        }
    }
}
