//! Activity model as shown on the public calendar and managed from the admin panel.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::repository::{Draft, Patch, Record};
use crate::security::{sanitize_optional, sanitize_text};

/// A scheduled kindergarten activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Older records hold the raw form input here, a string such as `"20"`.
    #[serde(default, deserialize_with = "capacity_lenient")]
    pub capacity: Option<u32>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Activity {
    const STORE_KEY: &'static str = "activities";
    const LABEL: &'static str = "Activity";

    fn id(&self) -> i64 {
        self.id
    }

    fn touch(&mut self, now: String) {
        self.updated_at = Some(now);
    }
}

/// Request body for creating a new activity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "capacity_strict")]
    pub capacity: Option<u32>,
}

impl Draft for CreateActivityRequest {
    type Record = Activity;

    fn build(self, id: i64, now: String) -> Result<Activity, AppError> {
        let title = required(&self.title, "Activity title is required")?;
        let date = required(&self.date, "Activity date is required")?;
        let location = required(&self.location, "Activity location is required")?;

        Ok(Activity {
            id,
            title,
            date,
            time: sanitize_optional(self.time.as_deref()),
            location,
            description: sanitize_text(&self.description),
            image: sanitize_optional(self.image.as_deref()),
            capacity: self.capacity,
            created_at: now,
            updated_at: None,
        })
    }
}

/// Request body for updating an existing activity. Absent fields keep their
/// value; an empty `time`, `image` or a `null`/empty `capacity` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "capacity_patch")]
    pub capacity: Option<Option<u32>>,
}

impl Patch for UpdateActivityRequest {
    type Record = Activity;

    fn apply(self, activity: &mut Activity) -> Result<(), AppError> {
        if let Some(title) = self.title {
            activity.title = required(&title, "Activity title is required")?;
        }
        if let Some(date) = self.date {
            activity.date = required(&date, "Activity date is required")?;
        }
        if let Some(location) = self.location {
            activity.location = required(&location, "Activity location is required")?;
        }
        if let Some(time) = self.time {
            activity.time = sanitize_optional(Some(&time));
        }
        if let Some(description) = self.description {
            activity.description = sanitize_text(&description);
        }
        if let Some(image) = self.image {
            activity.image = sanitize_optional(Some(&image));
        }
        if let Some(capacity) = self.capacity {
            activity.capacity = capacity;
        }
        Ok(())
    }
}

/// Read a capacity given as a number, a numeric string, `""` or `null`.
/// `Err` carries the offending input.
fn parse_capacity(value: Option<Value>) -> Result<Option<u32>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| n.to_string()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed.parse().map(Some).map_err(|_| s.clone())
            }
        }
        Some(other) => Err(other.to_string()),
    }
}

/// Stored records: an unreadable capacity is dropped rather than failing the
/// whole collection.
fn capacity_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_capacity(value).unwrap_or_else(|raw| {
        tracing::warn!(capacity = %raw, "Ignoring unreadable stored activity capacity");
        None
    }))
}

fn capacity_strict<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    parse_capacity(value)
        .map_err(|raw| serde::de::Error::custom(format!("invalid capacity {}", raw)))
}

/// Only called when the field is present, so `null` and `""` become `Some(None)`.
fn capacity_patch<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<u32>>, D::Error> {
    capacity_strict(deserializer).map(Some)
}

/// Sanitize `value`, rejecting it when nothing is left.
pub(crate) fn required(value: &str, message: &str) -> Result<String, AppError> {
    let value = sanitize_text(value);
    if value.is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(value)
}
