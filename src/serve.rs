use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::files::ensure_dir;
use crate::models::{
    NextEpisodeResponse, PlaybackStateUpdateRequest, ShowInfoResponse, UpdateStateResponse,
};
use crate::resolver::EpisodeResolver;
use crate::show::ShowService;
use crate::state::StateStore;
use crate::streaming::{subtitle_handler, video_handler};

/// Shared state for all handlers
#[derive(Debug)]
pub struct AppState {
    pub resolver: EpisodeResolver,
    pub shows: ShowService,
    pub state_store: StateStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: EpisodeResolver::new(config),
            shows: ShowService::new(config.seasons_dir.clone()),
            state_store: StateStore::new(config.state_file.clone()),
        }
    }
}

/// Run blocking filesystem work off the async workers
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("Blocking task failed: {}", e)))?
}

/// Build the full router with CORS and request logging
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/show/info", get(show_info_handler))
        .route("/api/show/state", post(update_state_handler))
        .route("/api/episode/{id}/video", get(video_handler))
        .route("/api/episode/{id}/subtitle", get(subtitle_handler))
        .route("/api/episode/{id}/next", get(next_episode_handler))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(app_state)
}

/// Start the HTTP server and block until it exits
pub fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(data_dir) = config.state_file.parent() {
        ensure_dir(data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
    }

    let port = config.port;
    println!("Starting server on port {}", port);
    println!("Media directory: {}", config.media_dir.display());
    println!("Seasons directory: {}", config.seasons_dir.display());
    println!("State file: {}", config.state_file.display());
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", port);
    println!("Endpoints:");
    println!("  GET  /api/show/info  - Episode list and resume position");
    println!("  POST /api/show/state  - Save resume position");
    println!("  GET  /api/episode/:id/video  - Video stream (supports Range)");
    println!("  GET  /api/episode/:id/subtitle  - Subtitle file");
    println!("  GET  /api/episode/:id/next  - Next episode id");
    println!("  GET  /health  - Health check");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let app = build_router(Arc::new(AppState::new(&config)));

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        error!("{} {} - {} in {:?}", method, path, status.as_u16(), started.elapsed());
    } else {
        info!("{} {} - {} in {:?}", method, path, status.as_u16(), started.elapsed());
    }
    response
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Make a root-relative URL absolute using the request's host
fn absolutize(url: &mut String, host: &str) {
    if url.starts_with('/') {
        *url = format!("http://{}{}", host, url);
    }
}

fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
}

async fn show_info_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Json<ShowInfoResponse>> {
    let (mut show_info, current) = run_blocking(move || {
        let show_info = state.shows.show_info()?;
        Ok((show_info, state.state_store.get()))
    })
    .await?;

    if let Some(host) = request_host(&headers, &uri) {
        for episode in &mut show_info.episodes {
            absolutize(&mut episode.video_url, &host);
            if let Some(subtitle_url) = episode.subtitle_url.as_mut() {
                absolutize(subtitle_url, &host);
            }
        }
    }

    show_info.current_episode_id = current.current_episode_id;
    show_info.playback_time_seconds = current.playback_time_seconds;

    if show_info.current_episode_id.is_empty() {
        if let Some(first) = show_info.episodes.first() {
            show_info.current_episode_id = first.id.clone();
        }
    }

    Ok(Json(show_info))
}

async fn update_state_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<UpdateStateResponse>> {
    let request: PlaybackStateUpdateRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

    if request.episode_id.is_empty() {
        return Err(ApiError::bad_request("Episode ID is required"));
    }

    run_blocking(move || {
        state
            .state_store
            .update(&request.episode_id, request.playback_time_seconds)?;
        Ok(())
    })
    .await?;

    Ok(Json(UpdateStateResponse { success: true }))
}

async fn next_episode_handler(
    State(state): State<Arc<AppState>>,
    Path(episode_id): Path<String>,
) -> ApiResult<Json<NextEpisodeResponse>> {
    let next = run_blocking(move || Ok(state.shows.next_episode_id(&episode_id)?)).await?;
    Ok(Json(NextEpisodeResponse { episode_id: next }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_only_root_relative() {
        let mut relative = "/api/episode/Show_S01E01/video".to_string();
        absolutize(&mut relative, "192.168.1.10:8080");
        assert_eq!(relative, "http://192.168.1.10:8080/api/episode/Show_S01E01/video");

        let mut absolute = "https://cdn.example.com/e1.mp4".to_string();
        absolutize(&mut absolute, "host");
        assert_eq!(absolute, "https://cdn.example.com/e1.mp4");

        let mut empty = String::new();
        absolutize(&mut empty, "host");
        assert_eq!(empty, "");
    }

    #[test]
    fn test_request_host_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "example.local:8080".parse().unwrap());
        let uri: Uri = "http://other:1/api/show/info".parse().unwrap();
        assert_eq!(request_host(&headers, &uri).as_deref(), Some("example.local:8080"));

        assert_eq!(request_host(&HeaderMap::new(), &uri).as_deref(), Some("other:1"));

        let relative: Uri = "/api/show/info".parse().unwrap();
        assert_eq!(request_host(&HeaderMap::new(), &relative), None);
    }
}
