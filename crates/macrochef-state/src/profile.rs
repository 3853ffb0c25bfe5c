//! Dietary profile lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use macrochef_core::{DietaryProfile, RecipeError, Result};
use tokio::sync::RwLock;

/// Read access to stored dietary profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a user's profile.
    ///
    /// Fails with `ProfileNotFound` when no profile exists and with
    /// `StoreUnavailable` on transport errors.
    async fn get_profile(&self, user_id: &str) -> Result<DietaryProfile>;
}

/// In-memory implementation of ProfileStore.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, DietaryProfile>>>,
}

impl InMemoryProfileStore {
    /// Create an empty profile store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON object mapping user ids to profiles.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profiles: HashMap<String, DietaryProfile> = serde_json::from_str(json)?;
        Ok(Self {
            profiles: Arc::new(RwLock::new(profiles)),
        })
    }

    /// Load a JSON profile file, see [`InMemoryProfileStore::from_json_str`].
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            RecipeError::StoreUnavailable(format!("reading {}: {}", path.display(), e))
        })?;
        let store = Self::from_json_str(&json)?;
        tracing::info!(
            "Loaded {} profiles from {}",
            store.len().await,
            path.display()
        );
        Ok(store)
    }

    /// Insert or replace a profile.
    pub async fn insert(&self, user_id: impl Into<String>, profile: DietaryProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(user_id.into(), profile);
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<DietaryProfile> {
        let profiles = self.profiles.read().await;
        profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| RecipeError::ProfileNotFound {
                user_id: user_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryProfileStore::new();
        store
            .insert("u-1", DietaryProfile::new().with_ingredient("rice", 150))
            .await;

        let profile = store.get_profile("u-1").await.unwrap();
        assert_eq!(profile.available_ingredients.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = InMemoryProfileStore::new();
        let err = store.get_profile("ghost").await.unwrap_err();
        assert_eq!(
            err,
            RecipeError::ProfileNotFound {
                user_id: "ghost".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_from_json_str() {
        let store = InMemoryProfileStore::from_json_str(
            r#"{"u-1": {"isVegan": true, "allergiesOrIntolerances": ["soy"]}}"#,
        )
        .unwrap();

        let profile = store.get_profile("u-1").await.unwrap();
        assert!(profile.is_vegan);
        assert!(profile.allergies_or_intolerances.contains("soy"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_unavailable() {
        let result = InMemoryProfileStore::load_file("/definitely/not/here.json").await;
        assert!(matches!(result, Err(RecipeError::StoreUnavailable(_))));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            InMemoryProfileStore::from_json_str("not json"),
            Err(RecipeError::Serialization(_))
        ));
    }
}
