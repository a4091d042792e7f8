use serde::{Deserialize, Serialize};

/// One episode as listed in a sidecar JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInfo {
    /// e.g. "Show_S01E01"
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub video_url: String,
    /// Absent (or null) when the episode has no subtitle track
    #[serde(default)]
    pub subtitle_url: Option<String>,
}

/// Episode list plus the resume cursor, as returned by `GET /api/show/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowInfoResponse {
    pub episodes: Vec<EpisodeInfo>,
    pub current_episode_id: String,
    pub playback_time_seconds: i64,
}

/// Persisted playback cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerState {
    pub current_episode_id: String,
    pub playback_time_seconds: i64,
    /// Unix timestamp (seconds) of the last update
    pub last_updated: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackStateUpdateRequest {
    pub episode_id: String,
    pub playback_time_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdateStateResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEpisodeResponse {
    pub episode_id: String,
}
