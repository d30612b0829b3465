//! Error taxonomy for backend calls and local validation.
//!
//! Pipeline code (interval algebra, windowing, projection, snapping) is total
//! and never fails; errors only arise at the HTTP boundary and from input
//! validation. They are converted to a message string at the app boundary and
//! never propagate into pipeline state.

use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// The analysis service endpoint is missing or unusable. Fatal to the
    /// session, shown as a persistent status message.
    Config(String),
    /// The request never produced a usable response (connection refused,
    /// timeout, DNS). Recoverable, surfaced per action.
    Transport(reqwest::Error),
    /// The response body was not the expected JSON shape.
    Decode(serde_json::Error),
    /// The service answered with a non-success status and (usually) an
    /// `{ "error": … }` body.
    Server { status: u16, message: String },
    /// A required local input is missing or malformed; the action is aborted
    /// before any state mutation.
    Validation(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "configuration error: {msg}"),
            ApiError::Transport(err) => write!(f, "request failed: {err}"),
            ApiError::Decode(err) => write!(f, "unexpected response from server: {err}"),
            ApiError::Server { status, message } => {
                write!(f, "server error ({status}): {message}")
            }
            ApiError::Validation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            ApiError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err)
    }
}

impl ApiError {
    /// True when the error should be pinned in the status bar instead of
    /// shown once per action.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Config(_))
    }
}
