use log::{debug, info, warn};
use std::path::PathBuf;

use crate::constants::SIDECAR_PATTERN;
use crate::error::ShowError;
use crate::files::{file_exists, find_files, read_json, FilePatterns};
use crate::models::{EpisodeInfo, ShowInfoResponse};

/// Builds the episode list from sidecar JSON files under the seasons root
#[derive(Debug, Clone)]
pub struct ShowService {
    seasons_dir: PathBuf,
    sidecar_patterns: FilePatterns,
}

impl ShowService {
    pub fn new(seasons_dir: impl Into<PathBuf>) -> Self {
        Self {
            seasons_dir: seasons_dir.into(),
            sidecar_patterns: FilePatterns::parse(SIDECAR_PATTERN)
                .unwrap_or_else(|e| unreachable!("{}", e)),
        }
    }

    pub fn show_info(&self) -> Result<ShowInfoResponse, ShowError> {
        Ok(ShowInfoResponse {
            episodes: self.all_episodes()?,
            ..ShowInfoResponse::default()
        })
    }

    /// Every episode from every sidecar file, sorted by id
    ///
    /// Files that cannot be read or parsed are skipped. A missing seasons root
    /// is an empty library, not an error.
    pub fn all_episodes(&self) -> Result<Vec<EpisodeInfo>, ShowError> {
        if !file_exists(&self.seasons_dir) {
            warn!("Seasons directory not found: {}", self.seasons_dir.display());
            return Ok(Vec::new());
        }

        let sidecars = find_files(&self.seasons_dir, &self.sidecar_patterns)?;
        debug!("Found {} episode list files", sidecars.len());

        let mut episodes = Vec::new();
        for sidecar in sidecars {
            match read_json::<Vec<EpisodeInfo>>(&sidecar) {
                Ok(list) => {
                    debug!("{} episodes in {}", list.len(), sidecar.display());
                    episodes.extend(list);
                }
                Err(e) => warn!("Skipping episode list: {}", e),
            }
        }

        episodes.sort_by(|a, b| a.id.cmp(&b.id));
        info!("Library has {} episodes", episodes.len());
        Ok(episodes)
    }

    /// The episode after `current_episode_id`, wrapping to the first
    ///
    /// An unknown id also maps to the first episode.
    pub fn next_episode_id(&self, current_episode_id: &str) -> Result<String, ShowError> {
        let episodes = self.all_episodes()?;
        next_in_sequence(&episodes, current_episode_id)
            .map(str::to_string)
            .ok_or(ShowError::NoEpisodes)
    }
}

fn next_in_sequence<'a>(episodes: &'a [EpisodeInfo], current: &str) -> Option<&'a str> {
    let first = episodes.first()?;
    let next = episodes
        .iter()
        .position(|e| e.id == current)
        .and_then(|i| episodes.get(i + 1))
        .unwrap_or(first);
    Some(&next.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn episode(id: &str) -> EpisodeInfo {
        EpisodeInfo {
            id: id.to_string(),
            title: Some(format!("Title {}", id)),
            video_url: format!("/api/episode/{}/video", id),
            subtitle_url: None,
        }
    }

    fn write_sidecar(path: &Path, episodes: &[EpisodeInfo]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(episodes).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = ShowService::new(temp_dir.path().join("shows"));
        assert!(service.all_episodes().unwrap().is_empty());
        assert!(service.show_info().unwrap().episodes.is_empty());
    }

    #[test]
    fn test_sidecars_are_merged_and_sorted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let season_2 = vec![episode("Show_S02E02"), episode("Show_S02E01")];
        let season_1 = vec![episode("Show_S01E03"), episode("Show_S01E01")];
        let extra = vec![episode("Show_S01E02")];
        write_sidecar(&root.join("a_season_2.json"), &season_2);
        write_sidecar(&root.join("z_season_1.json"), &season_1);
        write_sidecar(&root.join("season-01/nested/extra.json"), &extra);

        let service = ShowService::new(root);
        let episodes = service.all_episodes().unwrap();

        let mut expected: Vec<EpisodeInfo> = season_1
            .into_iter()
            .chain(season_2)
            .chain(extra)
            .collect();
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(episodes, expected);
        assert_eq!(episodes[0].id, "Show_S01E01");
        assert_eq!(episodes[4].id, "Show_S02E02");
    }

    #[test]
    fn test_malformed_sidecar_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        write_sidecar(&root.join("good.json"), &[episode("Show_S01E01")]);
        fs::write(root.join("bad.json"), "{\"id\": \"not a list\"}").unwrap();
        fs::write(root.join("truncated.json"), "[{\"id\": ").unwrap();

        let episodes = ShowService::new(root).all_episodes().unwrap();
        assert_eq!(episodes, vec![episode("Show_S01E01")]);
    }

    #[test]
    fn test_sidecar_with_null_subtitle_and_missing_title() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("season_1.json"),
            r#"[{"id": "Show_S01E01", "videoUrl": "/api/episode/Show_S01E01/video", "subtitleUrl": null}]"#,
        )
        .unwrap();

        let episodes = ShowService::new(temp_dir.path()).all_episodes().unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].title, None);
        assert_eq!(episodes[0].subtitle_url, None);
    }

    #[test]
    fn test_next_episode_sequence() {
        let episodes = vec![episode("A"), episode("B"), episode("C")];
        assert_eq!(next_in_sequence(&episodes, "A"), Some("B"));
        assert_eq!(next_in_sequence(&episodes, "B"), Some("C"));
        assert_eq!(next_in_sequence(&episodes, "C"), Some("A"));
        assert_eq!(next_in_sequence(&episodes, "unknown"), Some("A"));
        assert_eq!(next_in_sequence(&episodes, ""), Some("A"));
    }

    #[test]
    fn test_next_episode_single_and_empty() {
        let single = vec![episode("Only")];
        assert_eq!(next_in_sequence(&single, "Only"), Some("Only"));
        assert_eq!(next_in_sequence(&single, "Other"), Some("Only"));
        assert_eq!(next_in_sequence(&[], "Any"), None);
    }

    #[test]
    fn test_next_episode_id_from_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = ShowService::new(temp_dir.path());
        assert!(matches!(service.next_episode_id("X"), Err(ShowError::NoEpisodes)));

        write_sidecar(
            &temp_dir.path().join("s.json"),
            &[episode("Show_S01E02"), episode("Show_S01E01")],
        );
        assert_eq!(service.next_episode_id("Show_S01E01").unwrap(), "Show_S01E02");
        assert_eq!(service.next_episode_id("Show_S01E02").unwrap(), "Show_S01E01");
    }
}
