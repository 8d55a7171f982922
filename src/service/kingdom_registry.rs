//! Kingdom registry: validated signups keyed by kingdom name.

use std::sync::Arc;

use crate::domain::kingdom::{FactionSet, KINGDOM_KEY_PREFIX, KingdomEntry, KingdomSignup};
use crate::error::AppError;
use crate::storage::KeyValueStore;

/// Upsert and list kingdom signups.
#[derive(Debug, Clone)]
pub struct KingdomRegistry {
    store: Arc<dyn KeyValueStore>,
    factions: FactionSet,
}

impl KingdomRegistry {
    /// Creates a registry accepting the given factions.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, factions: FactionSet) -> Self {
        Self { store, factions }
    }

    /// Factions accepted on signup.
    #[must_use]
    pub fn factions(&self) -> &FactionSet {
        &self.factions
    }

    /// Validates `signup` and stores it, replacing any kingdom of the same
    /// (trimmed) name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first invalid field, or
    /// [`AppError::Storage`] if the write fails.
    pub async fn add_or_replace_kingdom(
        &self,
        signup: KingdomSignup,
    ) -> Result<KingdomEntry, AppError> {
        let entry = signup.validate(&self.factions)?;
        self.store.put(&entry.key(), &entry.to_fields()).await?;

        tracing::info!(
            kingdom = %entry.kingdom_name,
            kingdom_type = %entry.kingdom_type,
            faction = %entry.faction,
            "kingdom registered"
        );
        Ok(entry)
    }

    /// Lists every stored kingdom in store order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the store cannot be read.
    pub async fn list_kingdoms(&self) -> Result<Vec<KingdomEntry>, AppError> {
        let keys = self.store.list_keys(KINGDOM_KEY_PREFIX).await?;
        let mut kingdoms = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(fields) = self.store.get_all(&key).await? else {
                continue;
            };
            match KingdomEntry::from_fields(&fields) {
                Some(entry) => kingdoms.push(entry),
                None => tracing::warn!(%key, "skipping malformed kingdom entry"),
            }
        }
        Ok(kingdoms)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::kingdom::KingdomType;
    use crate::storage::MemoryStore;

    fn registry() -> KingdomRegistry {
        KingdomRegistry::new(Arc::new(MemoryStore::new()), FactionSet::default())
    }

    fn signup(name: &str, kingdom_type: &str) -> KingdomSignup {
        KingdomSignup {
            kingdom_name: name.to_string(),
            kingdom_type: kingdom_type.to_string(),
            faction: "stormforce".to_string(),
            discord_required: true,
            time_zone: "UTC".to_string(),
            other_info: String::new(),
        }
    }

    #[tokio::test]
    async fn alpha_is_listed_once() {
        let registry = registry();
        assert!(registry.add_or_replace_kingdom(signup("Alpha", "casual")).await.is_ok());

        let Ok(kingdoms) = registry.list_kingdoms().await else {
            panic!("list failed");
        };
        assert_eq!(kingdoms.len(), 1);
        assert!(kingdoms.iter().all(|k| k.kingdom_name == "Alpha" && k.discord_required));
    }

    #[tokio::test]
    async fn same_name_overwrites() {
        let registry = registry();
        let _ = registry.add_or_replace_kingdom(signup("Alpha", "casual")).await;
        let _ = registry.add_or_replace_kingdom(signup(" Alpha ", "hardcore")).await;

        let Ok(kingdoms) = registry.list_kingdoms().await else {
            panic!("list failed");
        };
        assert_eq!(kingdoms.len(), 1);
        assert_eq!(kingdoms.first().map(|k| k.kingdom_type), Some(KingdomType::Hardcore));
    }

    #[tokio::test]
    async fn invalid_signup_is_not_stored() {
        let registry = registry();
        let result = registry.add_or_replace_kingdom(signup("Alpha", "chaotic")).await;
        assert!(matches!(result, Err(AppError::Validation { field: "kingdomType", .. })));
        assert!(matches!(registry.list_kingdoms().await, Ok(k) if k.is_empty()));
    }
}
