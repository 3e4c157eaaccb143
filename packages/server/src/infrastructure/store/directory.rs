//! In-memory user directory.
//!
//! Seeded from the metadata observed on connect; `resolve` is used to
//! enrich fan-out payloads with display names.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DirectoryError, UserDirectory, UserId, UserProfile};

/// In-memory implementation of the user directory collaborator
#[derive(Default)]
pub struct InMemoryUserDirectory {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve(&self, user_id: UserId) -> Result<UserProfile, DirectoryError> {
        let profiles = self.profiles.lock().await;
        profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| DirectoryError::UserNotFound(user_id.as_str().to_string()))
    }

    async fn upsert(&self, profile: UserProfile) {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.user_id.clone(), profile);
    }
}
