use std::fs;
use std::path::{Path, PathBuf};

use super::{validate_user_id, StateStore, StoreError, UserState};

/// One pretty-printed JSON file per user under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{user_id}.json")))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, user_id: &str) -> Result<Option<UserState>, StoreError> {
        let path = self.user_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(UserState::from_json(&content)?))
    }

    /// Writes to a temp file then renames over the old document.
    fn save(&self, state: &UserState) -> Result<(), StoreError> {
        let path = self.user_path(&state.user_id)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, state.to_json()?)?;
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        tracing::debug!(user_id = %state.user_id, path = %path.display(), "state saved");
        Ok(())
    }
}
