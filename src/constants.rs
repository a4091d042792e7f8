/// Video extensions tried, in priority order, before falling back to a pattern search
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".wmv"];

/// Subtitle extensions tried, in priority order, before falling back to a pattern search
pub const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".vtt"];

/// Content type sent for every video response regardless of container
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Directory holding per-season subtitle folders, next to the seasons root
pub const SUBTITLES_DIR_NAME: &str = "subtitles";

/// Glob used to discover sidecar episode lists under the seasons root
pub const SIDECAR_PATTERN: &str = "*.json";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_KEY: &str = "your-secret-token";
pub const DEFAULT_VIDEO_FILE_PATTERN: &str = "*.mp4,*.mkv,*.avi";
pub const DEFAULT_SUBTITLE_FILE_PATTERN: &str = "*.srt,*.vtt";

/// Pick a subtitle content type from the file extension
pub fn subtitle_content_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("vtt") => "text/vtt",
        Some("srt") => "application/x-subrip",
        _ => "text/plain",
    }
}
