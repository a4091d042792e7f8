//! Maps episode ids such as `Show_S02E05` onto files laid out as
//! `<seasons root>/season-02/episode-05.<ext>` (and
//! `<seasons root>/../subtitles/season-02/episode-05.<ext>` for subtitles).

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::constants::{SUBTITLES_DIR_NAME, SUBTITLE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::ResolveError;
use crate::files::{file_exists, find_files, FilePatterns};

/// Season and episode digit groups parsed out of an episode id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeKey {
    pub season: String,
    pub episode: String,
}

impl EpisodeKey {
    /// Parse `<prefix>_S<DD>E<D..>`; ids without `_` are taken whole
    pub fn parse(episode_id: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidEpisodeId(episode_id.to_string());

        let code = episode_id
            .rsplit_once('_')
            .map_or(episode_id, |(_, code)| code);
        let bytes = code.as_bytes();
        if bytes.len() < 6 || bytes[0] != b'S' || bytes[3] != b'E' {
            return Err(invalid());
        }

        let season = &code[1..3];
        let episode = &code[4..];
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(season) || !all_digits(episode) {
            return Err(invalid());
        }

        Ok(Self {
            season: season.to_string(),
            episode: episode.to_string(),
        })
    }

    pub fn season_dir_name(&self) -> String {
        format!("season-{}", self.season)
    }

    pub fn episode_file_stem(&self) -> String {
        format!("episode-{}", self.episode)
    }
}

/// What kind of media file to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Subtitle,
}

impl MediaKind {
    fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Subtitle => "subtitle",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => VIDEO_EXTENSIONS,
            MediaKind::Subtitle => SUBTITLE_EXTENSIONS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeResolver {
    video_root: PathBuf,
    subtitle_root: PathBuf,
    video_patterns: FilePatterns,
    subtitle_patterns: FilePatterns,
}

impl EpisodeResolver {
    pub fn new(config: &Config) -> Self {
        let subtitle_root = config
            .seasons_dir
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SUBTITLES_DIR_NAME);

        Self {
            video_root: config.seasons_dir.clone(),
            subtitle_root,
            video_patterns: config.video_file_pattern.clone(),
            subtitle_patterns: config.subtitle_file_pattern.clone(),
        }
    }

    pub fn video_path(&self, episode_id: &str) -> Result<PathBuf, ResolveError> {
        self.resolve(episode_id, MediaKind::Video)
    }

    pub fn subtitle_path(&self, episode_id: &str) -> Result<PathBuf, ResolveError> {
        self.resolve(episode_id, MediaKind::Subtitle)
    }

    pub fn resolve(&self, episode_id: &str, kind: MediaKind) -> Result<PathBuf, ResolveError> {
        let key = EpisodeKey::parse(episode_id)?;
        let (root, patterns) = match kind {
            MediaKind::Video => (&self.video_root, &self.video_patterns),
            MediaKind::Subtitle => (&self.subtitle_root, &self.subtitle_patterns),
        };

        let season_dir = root.join(key.season_dir_name());
        if !file_exists(&season_dir) {
            debug!("{} directory not found: {}", kind.label(), season_dir.display());
            return Err(ResolveError::SeasonDirNotFound(season_dir.display().to_string()));
        }

        let stem = key.episode_file_stem();
        for ext in kind.extensions() {
            let candidate = season_dir.join(format!("{}{}", stem, ext));
            if file_exists(&candidate) {
                debug!("Exact {} match for {}: {}", kind.label(), episode_id, candidate.display());
                return Ok(candidate);
            }
        }

        debug!(
            "No exact {} match for {}, searching {} with '{}'",
            kind.label(),
            episode_id,
            season_dir.display(),
            patterns.as_str()
        );

        for candidate in find_files(&season_dir, patterns)? {
            let base = candidate
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if base.contains(&stem) || stem.contains(&base) {
                info!("Partial {} match for {}: {}", kind.label(), episode_id, candidate.display());
                return Ok(candidate);
            }
        }

        Err(ResolveError::FileNotFound {
            kind: kind.label(),
            episode_id: episode_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolver_for(media_dir: &Path) -> EpisodeResolver {
        let config = Config::for_media_dir(media_dir);
        EpisodeResolver::new(&config)
    }

    fn touch(path: PathBuf) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_parse_episode_key() {
        let key = EpisodeKey::parse("Show_S01E02").unwrap();
        assert_eq!(key.season, "01");
        assert_eq!(key.episode, "02");
        assert_eq!(key.season_dir_name(), "season-01");
        assert_eq!(key.episode_file_stem(), "episode-02");

        let key = EpisodeKey::parse("The_Office_S09E123").unwrap();
        assert_eq!(key.season_dir_name(), "season-09");
        assert_eq!(key.episode_file_stem(), "episode-123");

        assert_eq!(EpisodeKey::parse("S03E04").unwrap().episode, "04");
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for id in [
            "", "Show_", "Show_S1E1", "Show_X01E01", "Show_S01X01", "Show_S0aE01",
            "Show_S01E0b", "Show_S01E", "Show_S..E/../x", "Show_S01E01 ",
        ] {
            assert!(
                matches!(EpisodeKey::parse(id), Err(ResolveError::InvalidEpisodeId(_))),
                "expected {:?} to be rejected",
                id
            );
        }
    }

    #[test]
    fn test_parse_non_ascii_does_not_panic() {
        assert!(EpisodeKey::parse("Show_Sé1E01").is_err());
        assert!(EpisodeKey::parse("Show_S01Eé").is_err());
    }

    #[test]
    fn test_exact_match_prefers_extension_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let shows = temp_dir.path().join("shows");
        touch(shows.join("season-01/episode-01.mkv"));
        let mp4 = touch(shows.join("season-01/episode-01.mp4"));

        let resolver = resolver_for(temp_dir.path());
        assert_eq!(resolver.video_path("Show_S01E01").unwrap(), mp4);
    }

    #[test]
    fn test_exact_match_outside_default_patterns() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wmv = touch(temp_dir.path().join("shows/season-02/episode-03.wmv"));

        let resolver = resolver_for(temp_dir.path());
        assert_eq!(resolver.video_path("Show_S02E03").unwrap(), wmv);
    }

    #[test]
    fn test_partial_match_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        let shows = temp_dir.path().join("shows");
        touch(shows.join("season-01/episode-02 - Diversity Day.mkv"));
        let wanted = touch(shows.join("season-01/The Office episode-01 (720p).mkv"));

        let resolver = resolver_for(temp_dir.path());
        assert_eq!(resolver.video_path("Show_S01E01").unwrap(), wanted);
    }

    #[test]
    fn test_partial_match_contained_by_stem() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wanted = touch(temp_dir.path().join("shows/season-01/episode.avi"));

        let resolver = resolver_for(temp_dir.path());
        assert_eq!(resolver.video_path("Show_S01E01").unwrap(), wanted);
    }

    #[test]
    fn test_partial_match_respects_patterns() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path().join("shows/season-01/episode-01-extra.mov"));

        let resolver = resolver_for(temp_dir.path());
        assert!(matches!(
            resolver.video_path("Show_S01E01"),
            Err(ResolveError::FileNotFound { kind: "video", .. })
        ));
    }

    #[test]
    fn test_missing_season_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("shows")).unwrap();

        let resolver = resolver_for(temp_dir.path());
        assert!(matches!(
            resolver.video_path("Show_S05E01"),
            Err(ResolveError::SeasonDirNotFound(_))
        ));
    }

    #[test]
    fn test_subtitle_uses_sibling_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path().join("shows/season-01/episode-01.srt"));
        let vtt = touch(temp_dir.path().join("subtitles/season-01/episode-01.vtt"));

        let resolver = resolver_for(temp_dir.path());
        assert_eq!(resolver.subtitle_path("Show_S01E01").unwrap(), vtt);
    }

    #[test]
    fn test_subtitle_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path().join("shows/season-01/episode-01.srt"));

        let resolver = resolver_for(temp_dir.path());
        assert!(matches!(
            resolver.subtitle_path("Show_S01E01"),
            Err(ResolveError::SeasonDirNotFound(_))
        ));
    }
}
