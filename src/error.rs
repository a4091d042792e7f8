use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use log::{error, warn};
use thiserror::Error;

/// Errors from the filesystem helpers in [`crate::files`]
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file pattern '{0}'")]
    Pattern(String),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl FileError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Errors from mapping an episode id onto a media file
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid episode ID format: {0}")]
    InvalidEpisodeId(String),

    #[error("directory not found: {0}")]
    SeasonDirNotFound(String),

    #[error("{kind} file not found for episode: {episode_id}")]
    FileNotFound {
        kind: &'static str,
        episode_id: String,
    },

    #[error(transparent)]
    Search(#[from] FileError),
}

/// Errors from listing the library
#[derive(Debug, Error)]
pub enum ShowError {
    #[error("failed to find episode lists: {0}")]
    Scan(#[from] FileError),

    #[error("no episodes found")]
    NoEpisodes,
}

/// Errors from the playback state store
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Episode ID is required")]
    EmptyEpisodeId,

    #[error("failed to persist state: {0}")]
    Persist(#[from] FileError),
}

/// Request-terminal errors, each mapped onto one HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
            other => warn!("Request rejected ({}): {}", status.as_u16(), other),
        }

        let mut response = (status, self.to_string()).into_response();
        if let ApiError::RangeNotSatisfiable { size } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Search(inner) => ApiError::Internal(inner.to_string()),
            other => ApiError::NotFound(other.to_string()),
        }
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::EmptyEpisodeId => ApiError::BadRequest(e.to_string()),
            StateError::Persist(_) => ApiError::Internal(format!("Failed to update state: {}", e)),
        }
    }
}

impl From<ShowError> for ApiError {
    fn from(e: ShowError) -> Self {
        match e {
            ShowError::NoEpisodes => ApiError::NotFound(e.to_string()),
            ShowError::Scan(_) => ApiError::Internal(e.to_string()),
        }
    }
}
