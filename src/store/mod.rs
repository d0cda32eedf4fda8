//! Per-user state persistence.
//!
//! A user's whole state is one JSON document. Stores only load and save
//! whole documents; callers serialize read-modify-write per user.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::gamification::LedgerState;
use crate::services::profile::UserProfile;
use crate::services::scheduler::Vocabulary;
use crate::services::streak::StreakState;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid state document: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub user_id: String,
    pub updated_at: DateTime<Utc>,
    pub vocabulary: Vocabulary,
    pub profile: UserProfile,
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub ledger: LedgerState,
}

impl UserState {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            updated_at: now,
            vocabulary: Vocabulary::default(),
            profile: UserProfile::new(user_id, now),
            streak: StreakState::default(),
            ledger: LedgerState::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub trait StateStore: Send + Sync {
    /// `Ok(None)` when the user has no saved state yet.
    fn load(&self, user_id: &str) -> Result<Option<UserState>, StoreError>;

    fn save(&self, state: &UserState) -> Result<(), StoreError>;
}

/// Ids become file names, so only a conservative character set is allowed.
pub fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 128
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUserId(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert!(validate_user_id("user-42").is_ok());
        assert!(validate_user_id("ana@example.com").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("a/b").is_err());
        assert!(validate_user_id(".hidden").is_err());
    }

    #[test]
    fn test_document_defaults_missing_sections() {
        let now = Utc::now();
        let full = UserState::new("u1", now);
        let mut value = serde_json::to_value(&full).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("streak");
        object.remove("ledger");

        let loaded: UserState = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.streak, StreakState::default());
        assert_eq!(loaded.ledger, LedgerState::default());
    }
}
