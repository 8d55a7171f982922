//! Pet board DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::PetSnapshot;
use crate::error::AppError;

/// Request body for `POST /add-pet-post`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPetRequest {
    /// Pet name.
    #[serde(default)]
    pub pet_name: String,
    /// Player name.
    #[serde(default)]
    pub player_name: String,
    /// Free-form time zone label.
    #[serde(default)]
    pub time_zone: String,
    /// Countdown length in whole minutes (number or numeric string).
    #[serde(default)]
    #[schema(value_type = u64)]
    pub total_minutes: Value,
}

/// Request body for `POST /update-timer`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimerRequest {
    /// Pet name.
    #[serde(default)]
    pub pet_name: String,
    /// Player name.
    #[serde(default)]
    pub player_name: String,
    /// New countdown length in whole minutes, counted from now.
    #[serde(default)]
    #[schema(value_type = u64)]
    pub total_minutes: Value,
}

/// One row of `GET /list-pets`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetView {
    /// Storage key, `pet:{petName}:{playerName}`.
    pub id: String,
    /// Pet name.
    pub pet_name: String,
    /// Player name.
    pub player_name: String,
    /// Time zone label.
    pub time_zone: String,
    /// Countdown length as submitted.
    pub total_minutes: u64,
    /// Countdown start, Unix epoch milliseconds.
    pub start_time: i64,
    /// Milliseconds remaining; `0` once expired.
    pub time_left: u64,
}

impl From<PetSnapshot> for PetView {
    fn from(snapshot: PetSnapshot) -> Self {
        let entry = snapshot.entry;
        Self {
            id: snapshot.key,
            start_time: entry.start_time.timestamp_millis(),
            pet_name: entry.pet_name,
            player_name: entry.player_name,
            time_zone: entry.time_zone,
            total_minutes: entry.total_minutes,
            time_left: snapshot.remaining_millis,
        }
    }
}

/// Response body for `GET /get-time-left/{petId}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeLeftResponse {
    /// Milliseconds remaining; `0` once expired.
    pub time_left: u64,
}

/// Reads `totalMinutes` from a JSON number or numeric string.
///
/// Fractional, negative, missing and non-numeric values are rejected.
///
/// # Errors
///
/// Returns [`AppError::Validation`] on `totalMinutes`.
pub fn parse_total_minutes(raw: &Value) -> Result<u64, AppError> {
    let minutes = match raw {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    minutes.ok_or_else(|| {
        AppError::validation("totalMinutes", "totalMinutes must be a non-negative whole number")
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn whole_numbers_and_numeric_strings_are_accepted() {
        assert!(matches!(parse_total_minutes(&json!(45)), Ok(45)));
        assert!(matches!(parse_total_minutes(&json!(30.0)), Ok(30)));
        assert!(matches!(parse_total_minutes(&json!(" 90 ")), Ok(90)));
        assert!(matches!(parse_total_minutes(&json!(0)), Ok(0)));
    }

    #[test]
    fn other_values_are_rejected() {
        for raw in [json!(-5), json!(1.5), json!("soon"), json!(null), json!(true)] {
            let result = parse_total_minutes(&raw);
            assert!(
                matches!(result, Err(AppError::Validation { field: "totalMinutes", .. })),
                "{raw} should be rejected"
            );
        }
    }
}
