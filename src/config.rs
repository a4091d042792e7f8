use clap::Parser;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_API_KEY, DEFAULT_PORT, DEFAULT_SUBTITLE_FILE_PATTERN, DEFAULT_VIDEO_FILE_PATTERN,
};
use crate::files::FilePatterns;

/// Command line / environment options for the server
///
/// Every option falls back to an environment variable; empty values count as unset.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Serve an episodic media library and remember where playback stopped")]
pub struct Args {
    /// Port to listen on (default: 8080)
    #[arg(short, long, env = "PORT")]
    pub port: Option<String>,

    /// Media root (default: ../media relative to the working directory)
    #[arg(long, env = "MEDIA_DIR")]
    pub media_dir: Option<String>,

    /// Directory holding season-NN folders and sidecar JSON files (default: <media dir>/shows)
    #[arg(long, env = "SEASONS_DIR")]
    pub seasons_dir: Option<String>,

    /// Playback state file (default: ./data/state.json)
    #[arg(long, env = "STATE_FILE")]
    pub state_file: Option<String>,

    /// API key clients are configured with; not enforced by the server
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Comma-separated globs used when no exact video file name matches
    #[arg(long, env = "VIDEO_FILE_PATTERN")]
    pub video_file_pattern: Option<String>,

    /// Comma-separated globs used when no exact subtitle file name matches
    #[arg(long, env = "SUBTITLE_FILE_PATTERN")]
    pub subtitle_file_pattern: Option<String>,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub media_dir: PathBuf,
    pub seasons_dir: PathBuf,
    pub state_file: PathBuf,
    pub api_key: String,
    pub video_file_pattern: FilePatterns,
    pub subtitle_file_pattern: FilePatterns,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    non_empty(value).map(PathBuf::from)
}

impl Config {
    /// Apply defaults relative to `cwd` and validate the parsed options
    pub fn from_args(args: Args, cwd: &Path) -> Result<Self, String> {
        let port = match non_empty(args.port) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("Invalid port '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let media_dir = non_empty_path(args.media_dir).unwrap_or_else(|| {
            cwd.parent().unwrap_or(cwd).join("media")
        });
        let seasons_dir =
            non_empty_path(args.seasons_dir).unwrap_or_else(|| media_dir.join("shows"));
        let state_file =
            non_empty_path(args.state_file).unwrap_or_else(|| cwd.join("data").join("state.json"));
        let api_key = non_empty(args.api_key).unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let video_raw = non_empty(args.video_file_pattern)
            .unwrap_or_else(|| DEFAULT_VIDEO_FILE_PATTERN.to_string());
        let subtitle_raw = non_empty(args.subtitle_file_pattern)
            .unwrap_or_else(|| DEFAULT_SUBTITLE_FILE_PATTERN.to_string());

        let video_file_pattern = FilePatterns::parse(&video_raw)
            .map_err(|e| format!("VIDEO_FILE_PATTERN: {}", e))?;
        let subtitle_file_pattern = FilePatterns::parse(&subtitle_raw)
            .map_err(|e| format!("SUBTITLE_FILE_PATTERN: {}", e))?;

        Ok(Self {
            port,
            media_dir,
            seasons_dir,
            state_file,
            api_key,
            video_file_pattern,
            subtitle_file_pattern,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Default layout rooted at `media_dir`: `shows/`, `subtitles/` and `data/state.json`
    pub(crate) fn for_media_dir(media_dir: &Path) -> Self {
        let args = Args {
            media_dir: Some(media_dir.display().to_string()),
            state_file: Some(media_dir.join("data").join("state.json").display().to_string()),
            ..Args::default()
        };
        Self::from_args(args, media_dir).unwrap()
    }
}
