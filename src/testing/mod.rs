use chrono::{Duration, NaiveDate, Utc};

use crate::database::models::{
    Appointment, FamilyMember, HealthRecord, Medication, NewAppointment, NewFamilyMember,
    NewHealthRecord, NewMedication, NewUser, User,
};
use crate::database::Database;
use crate::services::{
    AppointmentService, FamilyMemberService, HealthRecordService, MedicationService, ServiceError,
    UserService,
};

pub const TEST_PASSWORD: &str = "secret1";

/// A fresh in-memory database per test, plus shortcuts for seeding rows
pub struct TestContext {
    pub db: Database,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let db = Database::in_memory()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open test database: {}", e))?;
        Ok(Self { db })
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.pool().clone())
    }

    pub fn family_members(&self) -> FamilyMemberService {
        FamilyMemberService::new(self.db.pool().clone())
    }

    pub fn health_records(&self) -> HealthRecordService {
        HealthRecordService::new(self.db.pool().clone())
    }

    pub fn medications(&self) -> MedicationService {
        MedicationService::new(self.db.pool().clone())
    }

    pub fn appointments(&self) -> AppointmentService {
        AppointmentService::new(self.db.pool().clone())
    }

    /// Active, non-superuser account with [`TEST_PASSWORD`]
    pub async fn create_user(&self, email: &str) -> Result<User, ServiceError> {
        self.users()
            .create(NewUser {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                full_name: None,
                phone_number: None,
                date_of_birth: None,
            })
            .await
    }

    pub async fn create_member(
        &self,
        user_id: i64,
        full_name: &str,
        relationship: &str,
    ) -> Result<FamilyMember, ServiceError> {
        let new_member = NewFamilyMember {
            full_name: full_name.to_string(),
            relationship: relationship.to_string(),
            date_of_birth: None,
            phone_number: None,
            emergency_contact: false,
            notes: None,
        };
        self.family_members().create(new_member, user_id).await
    }

    pub async fn create_health_record(
        &self,
        member_id: i64,
        user_id: i64,
        record_type: &str,
        title: &str,
    ) -> Result<HealthRecord, ServiceError> {
        self.health_records()
            .create(member_id, new_health_record(record_type, title), user_id)
            .await
    }

    pub async fn create_medication(
        &self,
        member_id: i64,
        user_id: i64,
        name: &str,
    ) -> Result<Medication, ServiceError> {
        let new_medication = NewMedication {
            name: name.to_string(),
            dosage: "250mg".to_string(),
            frequency: "twice daily".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end_date: None,
            prescribed_by: None,
            purpose: None,
            side_effects: None,
            is_active: true,
            notes: None,
        };
        self.medications().create(member_id, new_medication, user_id).await
    }

    pub async fn create_appointment(
        &self,
        member_id: i64,
        user_id: i64,
        title: &str,
    ) -> Result<Appointment, ServiceError> {
        let new_appointment = NewAppointment {
            title: title.to_string(),
            doctor_name: None,
            hospital_clinic: None,
            appointment_date: Utc::now() + Duration::days(7),
            appointment_type: None,
            status: "scheduled".to_string(),
            notes: None,
        };
        self.appointments().create(member_id, new_appointment, user_id).await
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

pub fn new_health_record(record_type: &str, title: &str) -> NewHealthRecord {
    NewHealthRecord {
        record_type: record_type.to_string(),
        title: title.to_string(),
        description: None,
        date_recorded: None,
        doctor_name: None,
        hospital_clinic: None,
        severity: None,
        status: None,
        notes: None,
    }
}
