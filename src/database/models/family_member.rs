use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{nullable, Appointment, HealthRecord, Medication};

/// A person whose records a user manages. Never visible to any other user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyMember {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    /// Free-text label: spouse, child, parent, ...
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub emergency_contact: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member together with everything attached to it
#[derive(Debug, Clone, Serialize)]
pub struct FamilyMemberDetail {
    #[serde(flatten)]
    pub member: FamilyMember,
    pub health_records: Vec<HealthRecord>,
    pub medications: Vec<Medication>,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFamilyMember {
    pub full_name: String,
    pub relationship: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub emergency_contact: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyMemberPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone_number: Option<Option<String>>,
    #[serde(default)]
    pub emergency_contact: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}
