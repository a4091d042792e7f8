use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use log::{debug, info};
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::constants::{subtitle_content_type, VIDEO_CONTENT_TYPE};
use crate::error::{ApiError, ApiResult};
use crate::serve::{run_blocking, AppState};

/// Inclusive byte span requested through a `Range` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Parse a `bytes=<start>-<end>` header against a file of `file_size` bytes
///
/// `end` may be omitted and then defaults to the last byte. Syntax errors are
/// `BadRequest`; a well-formed span outside the file is `RangeNotSatisfiable`.
/// Suffix (`bytes=-N`) and multi-range requests are not supported.
pub fn parse_range_header(value: &str, file_size: u64) -> Result<ByteRange, ApiError> {
    let parts: Vec<&str> = value.split('=').collect();
    if parts.len() != 2 || parts[0] != "bytes" {
        return Err(ApiError::bad_request("Invalid range header"));
    }

    let bounds: Vec<&str> = parts[1].split('-').collect();
    if bounds.len() != 2 {
        return Err(ApiError::bad_request("Invalid range values"));
    }

    let size = i64::try_from(file_size).unwrap_or(i64::MAX);
    let start: i64 = bounds[0]
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid start position: {}", bounds[0])))?;
    let end: i64 = if bounds[1].is_empty() {
        size - 1
    } else {
        bounds[1]
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid end position: {}", bounds[1])))?
    };

    if start < 0 || end >= size || start > end {
        debug!("Unsatisfiable range {}-{} for {} bytes", start, end, file_size);
        return Err(ApiError::RangeNotSatisfiable { size: file_size });
    }

    Ok(ByteRange {
        start: start as u64,
        end: end as u64,
    })
}

/// Open a resolved media file, mapping a vanished file to 404
async fn open_media(path: &std::path::Path, label: &str) -> ApiResult<(File, u64)> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("{} file not found", label)));
        }
        Err(e) => {
            return Err(ApiError::internal(format!(
                "Failed to open {} file {}: {}",
                label,
                path.display(),
                e
            )))
        }
    };

    let metadata = file.metadata().await.map_err(|e| {
        ApiError::internal(format!("Failed to get file info for {}: {}", path.display(), e))
    })?;

    Ok((file, metadata.len()))
}

fn build_response(builder: axum::http::response::Builder, body: Body) -> ApiResult<Response> {
    builder
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// `GET /api/episode/{id}/video`, honouring single `bytes=` ranges
pub async fn video_handler(
    State(state): State<Arc<AppState>>,
    Path(episode_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let path: PathBuf = {
        let state = Arc::clone(&state);
        let id = episode_id.clone();
        run_blocking(move || Ok(state.resolver.video_path(&id)?)).await?
    };
    debug!("Video for {}: {}", episode_id, path.display());

    let (mut file, file_size) = open_media(&path, "Video").await?;

    let range_header = match headers.get(header::RANGE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::bad_request("Invalid range header"))?,
        ),
        None => None,
    };

    let range = match range_header.filter(|value| !value.is_empty()) {
        Some(value) => parse_range_header(value, file_size)?,
        None => {
            info!("Serving full video {} ({} bytes)", path.display(), file_size);
            let builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
                .header(header::CONTENT_LENGTH, file_size)
                .header(header::ACCEPT_RANGES, "bytes");
            return build_response(builder, Body::from_stream(ReaderStream::new(file)));
        }
    };

    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to seek in {}: {}", path.display(), e)))?;

    debug!(
        "Serving bytes {}-{} of {} ({} bytes)",
        range.start,
        range.end,
        path.display(),
        range.len()
    );
    let builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_RANGE, range.content_range(file_size))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, range.len())
        .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE);
    build_response(
        builder,
        Body::from_stream(ReaderStream::new(file.take(range.len()))),
    )
}

/// `GET /api/episode/{id}/subtitle`, always the whole file
pub async fn subtitle_handler(
    State(state): State<Arc<AppState>>,
    Path(episode_id): Path<String>,
) -> ApiResult<Response> {
    let path: PathBuf = {
        let state = Arc::clone(&state);
        let id = episode_id.clone();
        run_blocking(move || Ok(state.resolver.subtitle_path(&id)?)).await?
    };

    let (file, file_size) = open_media(&path, "Subtitle").await?;
    let content_type = subtitle_content_type(&path);
    debug!("Subtitle for {}: {} ({})", episode_id, path.display(), content_type);

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_size);
    build_response(builder, Body::from_stream(ReaderStream::new(file)))
}
