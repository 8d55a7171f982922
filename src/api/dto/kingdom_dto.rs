//! Kingdom directory DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{KingdomEntry, KingdomSignup, KingdomType};
use crate::error::AppError;

/// Request body for `POST /add-kingdom`.
///
/// Fields are taken as raw JSON so that a wrong type is reported against
/// the field rather than as an unreadable body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddKingdomRequest {
    /// Kingdom name, 1-50 characters after trimming.
    #[serde(default)]
    #[schema(value_type = String)]
    pub kingdom_name: Value,
    /// One of `casual`, `hardcore`, `in_between`.
    #[serde(default)]
    #[schema(value_type = KingdomType)]
    pub kingdom_type: Value,
    /// Faction identifier from the configured set.
    #[serde(default)]
    #[schema(value_type = String)]
    pub faction: Value,
    /// Whether members must join the kingdom's Discord.
    #[serde(default)]
    #[schema(value_type = bool)]
    pub discord_required: Value,
    /// Time zone label, at most 50 characters. May be empty.
    #[serde(default)]
    #[schema(value_type = String)]
    pub time_zone: Value,
    /// Free-text note, at most 255 characters. May be empty.
    #[serde(default)]
    #[schema(value_type = String)]
    pub other_info: Value,
}

fn required_str(raw: Value, field: &'static str, message: &str) -> Result<String, AppError> {
    match raw {
        Value::String(s) => Ok(s),
        _ => Err(AppError::validation(field, message)),
    }
}

impl AddKingdomRequest {
    /// Checks JSON types and hands the values over for content validation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for the first field with the wrong
    /// JSON type.
    pub fn into_signup(self) -> Result<KingdomSignup, AppError> {
        let Value::Bool(discord_required) = self.discord_required else {
            return Err(AppError::validation(
                "discordRequired",
                "Invalid value for Discord requirement",
            ));
        };
        Ok(KingdomSignup {
            kingdom_name: required_str(self.kingdom_name, "kingdomName", "Invalid kingdom name")?,
            kingdom_type: required_str(self.kingdom_type, "kingdomType", "Invalid kingdom type")?,
            faction: required_str(self.faction, "faction", "Invalid faction")?,
            discord_required,
            time_zone: required_str(self.time_zone, "timeZone", "Invalid time zone")?,
            other_info: required_str(self.other_info, "otherInfo", "Invalid other information")?,
        })
    }
}

/// One row of `GET /list-kingdoms`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KingdomView {
    /// Kingdom name.
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

impl From<KingdomEntry> for KingdomView {
    fn from(entry: KingdomEntry) -> Self {
        Self {
            kingdom_name: entry.kingdom_name,
            kingdom_type: entry.kingdom_type,
            faction: entry.faction,
            discord_required: entry.discord_required,
            time_zone: entry.time_zone,
            other_info: entry.other_info,
        }
    }
}

/// Response body for `GET /config/kingdom-options`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KingdomOptionsResponse {
    /// Accepted kingdom types.
    pub kingdom_types: Vec<KingdomType>,
    /// Accepted faction identifiers.
    pub factions: Vec<String>,
}
