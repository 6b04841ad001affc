//! User directory port
//!
//! The messaging core does not own user accounts; the host application
//! (identity, approval workflow, role assignment) implements this trait
//! and hands it to the service layer. The trait abstracts over whatever
//! backs the user store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;

/// A directory search hit, used to populate "start new conversation"
/// pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub display_name: String,
}

/// Lookup interface into the host application's user store
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether a user with this id exists
    async fn exists(&self, user_id: &str) -> Result<bool>;

    /// Resolve a user's display name, or `None` for an unknown id
    async fn display_name(&self, user_id: &str) -> Result<Option<String>>;

    /// Search users by display-name substring, excluding the requesting
    /// user. An empty query matches everyone else.
    async fn search(&self, query: &str, excluding_user_id: &str) -> Result<Vec<DirectoryEntry>>;
}

/// In-memory directory backed by a map of user id to display name.
///
/// Intended for tests and embedded hosts without a user database.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, replacing any previous display name
    pub fn insert(&self, user_id: impl Into<String>, display_name: impl Into<String>) {
        self.users
            .write()
            .expect("directory lock poisoned")
            .insert(user_id.into(), display_name.into());
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .users
            .read()
            .expect("directory lock poisoned")
            .contains_key(user_id))
    }

    async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .users
            .read()
            .expect("directory lock poisoned")
            .get(user_id)
            .cloned())
    }

    async fn search(&self, query: &str, excluding_user_id: &str) -> Result<Vec<DirectoryEntry>> {
        let query = query.to_lowercase();
        let users = self.users.read().expect("directory lock poisoned");
        let mut entries: Vec<DirectoryEntry> = users
            .iter()
            .filter(|(id, name)| {
                id.as_str() != excluding_user_id
                    && (query.is_empty() || name.to_lowercase().contains(&query))
            })
            .map(|(id, name)| DirectoryEntry {
                id: id.clone(),
                display_name: name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn UserDirectory) {}

    #[tokio::test]
    async fn test_exists_and_display_name() {
        let directory = InMemoryDirectory::new();
        directory.insert("u1", "Ana Cruz");

        assert!(directory.exists("u1").await.unwrap());
        assert!(!directory.exists("u2").await.unwrap());
        assert_eq!(
            directory.display_name("u1").await.unwrap().as_deref(),
            Some("Ana Cruz")
        );
        assert!(directory.display_name("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_excludes_requester() {
        let directory = InMemoryDirectory::new();
        directory.insert("u1", "Ana Cruz");
        directory.insert("u2", "Ben Cruz");
        directory.insert("u3", "Carla Reyes");

        let hits = directory.search("cruz", "u1").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "u2");

        let all = directory.search("", "u3").await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
