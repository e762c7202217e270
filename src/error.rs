use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid credentials ({status}): {message}")]
    InvalidCredentials { status: u16, message: String },
    #[error("Registration rejected ({status}): {message}")]
    Registration { status: u16, message: String },
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("Session refresh failed")]
    RefreshFailed,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid request ({status}): {message}")]
    Validation { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server responded with {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Malformed response body: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Board error: {0}")]
    Board(#[from] crate::domain::board::BoardError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Maps a non-success response of an ordinary authenticated call.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { status: code, message },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation { status: code, message },
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Http { status: code, message },
        }
    }

    /// True only for an HTTP 401, the one failure class recovered by a token refresh.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { status: 401, .. })
    }

    /// HTTP status carried by the error, if the server produced one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials { status, .. }
            | Self::Registration { status, .. }
            | Self::Unauthorized { status, .. }
            | Self::Validation { status, .. }
            | Self::Http { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
