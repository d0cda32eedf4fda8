use std::collections::HashMap;

use parking_lot::RwLock;

use super::{validate_user_id, StateStore, StoreError, UserState};

/// Keeps serialized documents in memory, so loads go through the same JSON
/// path as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, user_id: &str) -> Result<Option<UserState>, StoreError> {
        validate_user_id(user_id)?;
        self.documents
            .read()
            .get(user_id)
            .map(|json| UserState::from_json(json))
            .transpose()
    }

    fn save(&self, state: &UserState) -> Result<(), StoreError> {
        validate_user_id(&state.user_id)?;
        let json = state.to_json()?;
        self.documents.write().insert(state.user_id.clone(), json);
        Ok(())
    }
}
