use chrono::Utc;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StateError;
use crate::files::{file_exists, read_json, write_json};
use crate::models::ServerState;

/// The single, process-wide playback cursor backed by a JSON file
///
/// Reads and writes share one exclusive lock. Every read reloads the file, so
/// edits made to it behind the server's back are picked up immediately.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: Mutex<ServerState>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_state(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Current state as persisted on disk
    pub fn get(&self) -> ServerState {
        let mut guard = self.lock();
        *guard = load_state(&self.path);
        guard.clone()
    }

    /// Replace the cursor, stamp it with the current time and persist it
    pub fn update(&self, episode_id: &str, playback_time_seconds: i64) -> Result<ServerState, StateError> {
        if episode_id.is_empty() {
            return Err(StateError::EmptyEpisodeId);
        }

        let next = ServerState {
            current_episode_id: episode_id.to_string(),
            playback_time_seconds,
            last_updated: Utc::now().timestamp(),
        };

        let mut guard = self.lock();
        write_json(&self.path, &next)?;
        *guard = next.clone();

        info!(
            "Playback state saved: episode {} at {}s",
            next.current_episode_id, next.playback_time_seconds
        );
        Ok(next)
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        // A panic while holding the lock cannot leave the state half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read the state file; a missing or corrupt file yields the empty state
fn load_state(path: &Path) -> ServerState {
    if !file_exists(path) {
        debug!("State file not found, using empty state: {}", path.display());
        return ServerState::default();
    }

    match read_json(path) {
        Ok(state) => state,
        Err(e) => {
            warn!("Failed to read state file, using empty state: {}", e);
            ServerState::default()
        }
    }
}
