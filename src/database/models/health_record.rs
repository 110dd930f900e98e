use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthRecord {
    pub id: i64,
    pub family_member_id: i64,
    /// Free-text category: condition, allergy, procedure, ...
    pub record_type: String,
    pub title: String,
    pub description: Option<String>,
    pub date_recorded: DateTime<Utc>,
    pub doctor_name: Option<String>,
    pub hospital_clinic: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHealthRecord {
    pub record_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the time of creation
    #[serde(default)]
    pub date_recorded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub hospital_clinic: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthRecordPatch {
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub date_recorded: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub doctor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub hospital_clinic: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub severity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}
