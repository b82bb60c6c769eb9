use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Errors raised by counter persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value for {key} is not a count: {value:?}")]
    Parse { key: String, value: String },

    #[error("unknown counter key: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors raised by the remote tribute table.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("datastore error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("tribute table does not exist")]
    MissingTable,

    #[error("tribute table has no rows")]
    NoRow,

    #[error("read back {actual} after writing {expected}")]
    VerifyFailed { expected: u64, actual: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{0} contains characters not allowed in an HTTP header")]
    InvalidHeader(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("packaging I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode build info: {0}")]
    Json(#[from] serde_json::Error),
}
