//! Timed pet entries and the remaining-time computation.
//!
//! A pet is identified by the `(pet_name, player_name)` pair and stored as a
//! hash under `pet:{pet_name}:{player_name}`. Expiry is never stored: it is
//! derived on every read by [`compute_remaining`].

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::storage::Fields;

/// Prefix shared by every pet hash key.
pub const PET_KEY_PREFIX: &str = "pet:";

/// List holding the keys of every pet ever added, newest first.
pub const PET_TRACKING_LIST: &str = "pets";

/// Longest accepted pet or player name, in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Longest accepted time zone label, in characters.
pub const MAX_TIME_ZONE_CHARS: usize = 50;

/// Longest accepted countdown: one year.
pub const MAX_TOTAL_MINUTES: u64 = 365 * 24 * 60;

const MILLIS_PER_MINUTE: u64 = 60_000;

/// Builds the storage key for a pet.
#[must_use]
pub fn pet_key(pet_name: &str, player_name: &str) -> String {
    format!("{PET_KEY_PREFIX}{pet_name}:{player_name}")
}

/// Builds the storage key for a `{pet_name}:{player_name}` identifier.
#[must_use]
pub fn pet_key_from_id(pet_id: &str) -> String {
    format!("{PET_KEY_PREFIX}{pet_id}")
}

fn validate_name(field: &'static str, label: &str, raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::validation(
            field,
            format!("{label} must be 1-{MAX_NAME_CHARS} characters"),
        ));
    }
    // ':' separates the two halves of the composite key.
    if name.contains(':') {
        return Err(AppError::validation(field, format!("{label} must not contain ':'")));
    }
    Ok(name.to_string())
}

/// Validates and trims a `(pet_name, player_name)` pair.
///
/// # Errors
///
/// Returns [`AppError::Validation`] naming the offending field if a name is
/// blank, longer than [`MAX_NAME_CHARS`], or contains `':'`.
pub fn validate_pet_names(pet_name: &str, player_name: &str) -> Result<(String, String), AppError> {
    Ok((
        validate_name("petName", "Pet name", pet_name)?,
        validate_name("playerName", "Player name", player_name)?,
    ))
}

/// Validates a countdown length in whole minutes.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for `totalMinutes` above
/// [`MAX_TOTAL_MINUTES`].
pub fn validate_total_minutes(total_minutes: u64) -> Result<u64, AppError> {
    if total_minutes > MAX_TOTAL_MINUTES {
        return Err(AppError::validation(
            "totalMinutes",
            format!("totalMinutes must be between 0 and {MAX_TOTAL_MINUTES}"),
        ));
    }
    Ok(total_minutes)
}

/// Validated signup for a timed pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    /// Trimmed pet name.
    pub pet_name: String,
    /// Trimmed player name.
    pub player_name: String,
    /// Free-form time zone label shown to other players.
    pub time_zone: String,
    /// Countdown length in minutes.
    pub total_minutes: u64,
}

impl NewPet {
    /// Validates the raw signup fields.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first invalid field.
    pub fn new(
        pet_name: &str,
        player_name: &str,
        time_zone: &str,
        total_minutes: u64,
    ) -> Result<Self, AppError> {
        let (pet_name, player_name) = validate_pet_names(pet_name, player_name)?;
        if time_zone.chars().count() > MAX_TIME_ZONE_CHARS {
            return Err(AppError::validation("timeZone", "Invalid time zone"));
        }
        Ok(Self {
            pet_name,
            player_name,
            time_zone: time_zone.to_string(),
            total_minutes: validate_total_minutes(total_minutes)?,
        })
    }
}

/// Stored pet record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetEntry {
    /// Pet name (first half of the key).
    pub pet_name: String,
    /// Player name (second half of the key).
    pub player_name: String,
    /// Time zone label.
    pub time_zone: String,
    /// Countdown length as submitted, in minutes.
    pub total_minutes: u64,
    /// When the countdown started.
    pub start_time: DateTime<Utc>,
    /// Countdown length in milliseconds.
    pub duration_millis: u64,
}

/// A stored pet field was missing or unparseable.
#[derive(Debug, thiserror::Error)]
pub enum PetRecordError {
    /// Required field absent from the hash.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// Field present but not parseable.
    #[error("invalid field {field}: {value:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw stored value.
        value: String,
    },
}

impl PetEntry {
    /// Starts a countdown for `pet` at `now`.
    #[must_use]
    pub fn start(pet: NewPet, now: DateTime<Utc>) -> Self {
        Self {
            pet_name: pet.pet_name,
            player_name: pet.player_name,
            time_zone: pet.time_zone,
            total_minutes: pet.total_minutes,
            start_time: now,
            duration_millis: pet.total_minutes.saturating_mul(MILLIS_PER_MINUTE),
        }
    }

    /// Restarts the countdown with a new length.
    pub fn restart(&mut self, total_minutes: u64, now: DateTime<Utc>) {
        self.total_minutes = total_minutes;
        self.duration_millis = total_minutes.saturating_mul(MILLIS_PER_MINUTE);
        self.start_time = now;
    }

    /// Storage key of this entry.
    #[must_use]
    pub fn key(&self) -> String {
        pet_key(&self.pet_name, &self.player_name)
    }

    /// Milliseconds left on the countdown at `now`.
    #[must_use]
    pub fn remaining_millis(&self, now: DateTime<Utc>) -> u64 {
        compute_remaining(self, now)
    }

    /// Whether the countdown has run out at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_millis(now) == 0
    }

    /// Serializes to the stored hash layout.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let start = self.start_time.timestamp_millis().to_string();
        let mut fields = Fields::new();
        fields.insert("petName".to_string(), self.pet_name.clone());
        fields.insert("playerName".to_string(), self.player_name.clone());
        fields.insert("timeZone".to_string(), self.time_zone.clone());
        fields.insert("totalMinutes".to_string(), self.total_minutes.to_string());
        fields.insert("duration".to_string(), self.duration_millis.to_string());
        fields.insert("startTime".to_string(), start.clone());
        fields.insert("timestamp".to_string(), start);
        fields
    }

    /// Parses the stored hash layout.
    ///
    /// # Errors
    ///
    /// Returns [`PetRecordError`] if a required field is missing or
    /// malformed.
    pub fn from_fields(fields: &Fields) -> Result<Self, PetRecordError> {
        let text = |field: &'static str| {
            fields
                .get(field)
                .cloned()
                .ok_or(PetRecordError::MissingField(field))
        };
        let number = |field: &'static str| -> Result<u64, PetRecordError> {
            let raw = text(field)?;
            raw.parse()
                .map_err(|_| PetRecordError::InvalidField { field, value: raw })
        };

        let raw_start = text("startTime")?;
        let start_time = raw_start
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(PetRecordError::InvalidField {
                field: "startTime",
                value: raw_start,
            })?;

        Ok(Self {
            pet_name: text("petName")?,
            player_name: text("playerName")?,
            time_zone: fields.get("timeZone").cloned().unwrap_or_default(),
            total_minutes: number("totalMinutes")?,
            start_time,
            duration_millis: number("duration")?,
        })
    }
}

/// Remaining countdown: `max(start_time + duration - now, 0)` in milliseconds.
#[must_use]
pub fn compute_remaining(entry: &PetEntry, now: DateTime<Utc>) -> u64 {
    let duration = i64::try_from(entry.duration_millis).unwrap_or(i64::MAX);
    let ends_at = entry.start_time.timestamp_millis().saturating_add(duration);
    let remaining = ends_at.saturating_sub(now.timestamp_millis());
    u64::try_from(remaining).unwrap_or(0)
}

/// A pet entry paired with its remaining time at a given instant.
#[derive(Debug, Clone)]
pub struct PetSnapshot {
    /// Storage key (`pet:{pet_name}:{player_name}`).
    pub key: String,
    /// Stored entry.
    pub entry: PetEntry,
    /// Milliseconds remaining when the snapshot was taken.
    pub remaining_millis: u64,
}

impl PetSnapshot {
    /// Captures `entry` at `now`.
    #[must_use]
    pub fn at(entry: PetEntry, now: DateTime<Utc>) -> Self {
        Self {
            key: entry.key(),
            remaining_millis: entry.remaining_millis(now),
            entry,
        }
    }
}
