use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::nullable;

pub const DEFAULT_APPOINTMENT_STATUS: &str = "scheduled";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub family_member_id: i64,
    pub title: String,
    pub doctor_name: Option<String>,
    pub hospital_clinic: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub appointment_type: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    DEFAULT_APPOINTMENT_STATUS.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub title: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub hospital_clinic: Option<String>,
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub appointment_type: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub doctor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub hospital_clinic: Option<Option<String>>,
    #[serde(default)]
    pub appointment_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub appointment_type: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}
