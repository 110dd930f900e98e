pub mod appointment;
pub mod family_member;
pub mod health_record;
pub mod medication;
pub mod user;

pub use appointment::{Appointment, AppointmentPatch, NewAppointment};
pub use family_member::{FamilyMember, FamilyMemberDetail, FamilyMemberPatch, NewFamilyMember};
pub use health_record::{HealthRecord, HealthRecordPatch, NewHealthRecord};
pub use medication::{Medication, MedicationPatch, NewMedication};
pub use user::{NewUser, User, UserPatch};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in update patches. Use with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
