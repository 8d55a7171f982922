//! Pet registry: countdown entries on top of the key-value store.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::domain::pet::{
    NewPet, PET_KEY_PREFIX, PET_TRACKING_LIST, PetEntry, PetSnapshot, pet_key, pet_key_from_id,
    validate_pet_names, validate_total_minutes,
};
use crate::error::AppError;
use crate::storage::KeyValueStore;

/// Outcome of one [`PetRegistry::sweep_expired`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired pet entries deleted.
    pub reclaimed: u64,
    /// Tracking-list keys dropped because their entry was gone.
    pub orphaned: u64,
    /// Keys physically reclaimed by the store's own TTL purge.
    pub purged: u64,
}

impl SweepReport {
    /// Whether the pass changed anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.reclaimed == 0 && self.orphaned == 0 && self.purged == 0
    }
}

/// Create, list, remove and time pet entries.
///
/// Stateless apart from its handles: every call goes to the store, and
/// remaining time is computed against the injected [`Clock`].
#[derive(Debug, Clone)]
pub struct PetRegistry {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_grace_secs: u64,
}

impl PetRegistry {
    /// Creates a registry.
    ///
    /// `ttl_grace_secs` is added to each countdown to form the store-level
    /// TTL, so the store never drops an entry that is still counting down.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl_grace_secs: u64) -> Self {
        Self {
            store,
            clock,
            ttl_grace_secs,
        }
    }

    fn store_ttl(&self, entry: &PetEntry) -> u64 {
        entry
            .duration_millis
            .div_ceil(1000)
            .saturating_add(self.ttl_grace_secs)
    }

    /// Writes `entry`, refreshes its TTL and optionally tracks its key.
    async fn write(&self, entry: &PetEntry, track: bool) -> Result<(), AppError> {
        let key = entry.key();
        self.store.put(&key, &entry.to_fields()).await?;
        self.store.set_expiry(&key, self.store_ttl(entry)).await?;
        if track {
            self.store.remove_from_list(PET_TRACKING_LIST, &key).await?;
            self.store.push_to_list(PET_TRACKING_LIST, &key).await?;
        }
        Ok(())
    }

    /// Drops `key` from the tracking list, then re-tracks it if a signup
    /// recreated the entry in the meantime.
    async fn untrack(&self, key: &str) -> Result<u64, AppError> {
        let removed = self.store.remove_from_list(PET_TRACKING_LIST, key).await?;
        if removed > 0 && self.store.exists(key).await? {
            self.store.remove_from_list(PET_TRACKING_LIST, key).await?;
            self.store.push_to_list(PET_TRACKING_LIST, key).await?;
            return Ok(0);
        }
        Ok(removed)
    }

    /// Upserts a pet and starts its countdown now.
    ///
    /// A repeat signup for the same `(pet_name, player_name)` overwrites the
    /// previous start time and duration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if any store write fails.
    pub async fn add_or_replace_pet(&self, pet: NewPet) -> Result<PetSnapshot, AppError> {
        let now = self.clock.now();
        let entry = PetEntry::start(pet, now);
        self.write(&entry, true).await?;

        tracing::info!(
            key = %entry.key(),
            total_minutes = entry.total_minutes,
            "pet countdown started"
        );
        Ok(PetSnapshot::at(entry, now))
    }

    /// Lists every tracked pet with its remaining time.
    ///
    /// Duplicate tracking-list keys, left by older writers, are collapsed and keys whose entry is
    /// gone are skipped. Entries that have run out but not yet been swept
    /// are included with zero remaining time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the store cannot be read.
    pub async fn list_pets(&self) -> Result<Vec<PetSnapshot>, AppError> {
        let keys = self.store.range_list(PET_TRACKING_LIST).await?;
        let now = self.clock.now();

        let mut seen = HashSet::with_capacity(keys.len());
        let mut pets = Vec::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }
            let Some(fields) = self.store.get_all(&key).await? else {
                continue;
            };
            match PetEntry::from_fields(&fields) {
                Ok(entry) => pets.push(PetSnapshot::at(entry, now)),
                Err(e) => tracing::warn!(%key, error = %e, "skipping malformed pet entry"),
            }
        }
        Ok(pets)
    }

    /// Removes a pet and its tracking-list references.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PetNotFound`] if no entry exists, which includes
    /// names that could never have been stored, or [`AppError::Storage`]
    /// on store failure.
    pub async fn remove_pet(&self, pet_name: &str, player_name: &str) -> Result<(), AppError> {
        let (pet_name, player_name) = validate_pet_names(pet_name, player_name)
            .map_err(|_| AppError::PetNotFound(pet_key(pet_name, player_name)))?;
        let key = pet_key(&pet_name, &player_name);

        if !self.store.exists(&key).await? {
            return Err(AppError::PetNotFound(key));
        }
        self.store.delete(&key).await?;
        self.store.remove_from_list(PET_TRACKING_LIST, &key).await?;

        tracing::info!(%key, "pet removed");
        Ok(())
    }

    /// Remaining milliseconds for the pet identified by
    /// `{pet_name}:{player_name}`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PetNotFound`] if no entry exists,
    /// [`AppError::Internal`] if the stored entry is malformed, or
    /// [`AppError::Storage`] on store failure.
    pub async fn time_left(&self, pet_id: &str) -> Result<u64, AppError> {
        let key = pet_key_from_id(pet_id);
        let entry = self.load(&key).await?;
        Ok(entry.remaining_millis(self.clock.now()))
    }

    /// Restarts an existing pet's countdown at `total_minutes` from now.
    ///
    /// The tracking list is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for bad input,
    /// [`AppError::PetNotFound`] if no entry exists, or
    /// [`AppError::Storage`] on store failure.
    pub async fn update_timer(
        &self,
        pet_name: &str,
        player_name: &str,
        total_minutes: u64,
    ) -> Result<PetSnapshot, AppError> {
        let (pet_name, player_name) = validate_pet_names(pet_name, player_name)?;
        let total_minutes = validate_total_minutes(total_minutes)?;

        let mut entry = self.load(&pet_key(&pet_name, &player_name)).await?;
        let now = self.clock.now();
        entry.restart(total_minutes, now);
        self.write(&entry, false).await?;

        tracing::info!(key = %entry.key(), total_minutes, "pet countdown restarted");
        Ok(PetSnapshot::at(entry, now))
    }

    /// Deletes every pet whose countdown has run out and drops tracking-list
    /// keys whose entry no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on the first store failure; work done
    /// before it is kept and the next pass picks up the rest.
    pub async fn sweep_expired(&self) -> Result<SweepReport, AppError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for key in self.store.list_keys(PET_KEY_PREFIX).await? {
            let Some(fields) = self.store.get_all(&key).await? else {
                continue;
            };
            let entry = match PetEntry::from_fields(&fields) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "leaving malformed pet entry to its TTL");
                    continue;
                }
            };
            let Some(start) = fields.get("startTime") else {
                continue;
            };
            // Only the countdown that was read is deleted; a signup that
            // landed since then carries a new start time and is kept.
            if entry.is_expired(now) && self.store.delete_if(&key, "startTime", start).await? {
                self.untrack(&key).await?;
                tracing::debug!(%key, "expired pet reclaimed");
                report.reclaimed += 1;
            }
        }

        let tracked: HashSet<String> = self
            .store
            .range_list(PET_TRACKING_LIST)
            .await?
            .into_iter()
            .collect();
        for key in tracked {
            if !self.store.exists(&key).await? {
                report.orphaned += self.untrack(&key).await?;
            }
        }

        report.purged = self.store.purge_expired().await?;
        Ok(report)
    }

    async fn load(&self, key: &str) -> Result<PetEntry, AppError> {
        let fields = self
            .store
            .get_all(key)
            .await?
            .ok_or_else(|| AppError::PetNotFound(key.to_string()))?;
        PetEntry::from_fields(&fields)
            .map_err(|e| AppError::Internal(format!("stored pet {key} is malformed: {e}")))
    }
}
