//! Kingdom signup records and their validation rules.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::storage::Fields;

/// Prefix shared by every kingdom hash key.
pub const KINGDOM_KEY_PREFIX: &str = "kingdom:";

/// Factions accepted when none are configured.
pub const DEFAULT_FACTIONS: [&str; 4] = [
    "earthen_legion",
    "stormforce",
    "knights_of_inferno",
    "frozenguard",
];

/// Longest accepted kingdom name (after trimming), in characters.
pub const MAX_KINGDOM_NAME_CHARS: usize = 50;

/// Longest accepted time zone label, in characters.
pub const MAX_TIME_ZONE_CHARS: usize = 50;

/// Longest accepted free-text note, in characters.
pub const MAX_OTHER_INFO_CHARS: usize = 255;

/// Builds the storage key for a kingdom.
#[must_use]
pub fn kingdom_key(kingdom_name: &str) -> String {
    format!("{KINGDOM_KEY_PREFIX}{kingdom_name}")
}

/// Play style advertised by a kingdom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum KingdomType {
    /// Relaxed play.
    Casual,
    /// Competitive play.
    Hardcore,
    /// Somewhere between the two.
    InBetween,
}

impl KingdomType {
    /// Every variant, in display order.
    pub const ALL: [Self; 3] = [Self::Casual, Self::Hardcore, Self::InBetween];

    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Hardcore => "hardcore",
            Self::InBetween => "in_between",
        }
    }
}

impl fmt::Display for KingdomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KingdomType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::validation("kingdomType", "Invalid kingdom type"))
    }
}

/// Closed set of faction identifiers a kingdom may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionSet {
    factions: Vec<String>,
}

impl FactionSet {
    /// Builds a set from configured identifiers, keeping the first
    /// occurrence of each.
    #[must_use]
    pub fn new(factions: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let factions = factions
            .into_iter()
            .filter(|f| seen.insert(f.clone()))
            .collect();
        Self { factions }
    }

    /// Whether `faction` is a member.
    #[must_use]
    pub fn contains(&self, faction: &str) -> bool {
        self.factions.iter().any(|f| f == faction)
    }

    /// Members in configured order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.factions
    }
}

impl Default for FactionSet {
    fn default() -> Self {
        Self::new(DEFAULT_FACTIONS.iter().map(|f| (*f).to_string()))
    }
}

/// Kingdom signup whose fields have the right JSON types but are not yet
/// checked against the content rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KingdomSignup {
    /// Raw kingdom name.
    pub kingdom_name: String,
    /// Raw kingdom type.
    pub kingdom_type: String,
    /// Raw faction identifier.
    pub faction: String,
    /// Whether members must join the kingdom's Discord.
    pub discord_required: bool,
    /// Time zone label.
    pub time_zone: String,
    /// Free-text note.
    pub other_info: String,
}

impl KingdomSignup {
    /// Applies the content rules, yielding a storable entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first field that breaks
    /// its rule: blank or overlong name, unknown type, faction outside
    /// `factions`, overlong time zone, overlong note.
    pub fn validate(self, factions: &FactionSet) -> Result<KingdomEntry, AppError> {
        let kingdom_name = self.kingdom_name.trim();
        if kingdom_name.is_empty() || kingdom_name.chars().count() > MAX_KINGDOM_NAME_CHARS {
            return Err(AppError::validation("kingdomName", "Invalid kingdom name"));
        }
        let kingdom_type: KingdomType = self.kingdom_type.parse()?;
        if !factions.contains(&self.faction) {
            return Err(AppError::validation("faction", "Invalid faction"));
        }
        if self.time_zone.chars().count() > MAX_TIME_ZONE_CHARS {
            return Err(AppError::validation("timeZone", "Invalid time zone"));
        }
        if self.other_info.chars().count() > MAX_OTHER_INFO_CHARS {
            return Err(AppError::validation("otherInfo", "Invalid other information"));
        }

        Ok(KingdomEntry {
            kingdom_name: kingdom_name.to_string(),
            kingdom_type,
            faction: self.faction,
            discord_required: self.discord_required,
            time_zone: self.time_zone,
            other_info: self.other_info,
        })
    }
}

/// Stored kingdom record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KingdomEntry {
    /// Unique, trimmed kingdom name.
    pub kingdom_name: String,
    /// Play style.
    pub kingdom_type: KingdomType,
    /// Faction identifier.
    pub faction: String,
    /// Whether Discord membership is required.
    pub discord_required: bool,
    /// Time zone label.
    pub time_zone: String,
    /// Free-text note.
    pub other_info: String,
}

impl KingdomEntry {
    /// Storage key of this entry.
    #[must_use]
    pub fn key(&self) -> String {
        kingdom_key(&self.kingdom_name)
    }

    /// Serializes to the stored hash layout. `discordRequired` is stored as
    /// `"true"` / `"false"`.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("kingdomName".to_string(), self.kingdom_name.clone());
        fields.insert("kingdomType".to_string(), self.kingdom_type.as_str().to_string());
        fields.insert("faction".to_string(), self.faction.clone());
        fields.insert("discordRequired".to_string(), self.discord_required.to_string());
        fields.insert("timeZone".to_string(), self.time_zone.clone());
        fields.insert("otherInfo".to_string(), self.other_info.clone());
        fields
    }

    /// Parses the stored hash layout.
    ///
    /// Returns `None` when the hash is not a well-formed kingdom record.
    /// Factions are not re-checked so records survive a configuration change.
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        Some(Self {
            kingdom_name: fields.get("kingdomName")?.clone(),
            kingdom_type: fields.get("kingdomType")?.parse().ok()?,
            faction: fields.get("faction")?.clone(),
            discord_required: fields.get("discordRequired")?.parse().ok()?,
            time_zone: fields.get("timeZone").cloned().unwrap_or_default(),
            other_info: fields.get("otherInfo").cloned().unwrap_or_default(),
        })
    }
}
