use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{Appointment, AppointmentPatch, NewAppointment};
use crate::database::query_builder::UpdateQuery;

use super::{ensure_member, push_owned_by, require_text, require_text_if, Pagination, ServiceError};

const ENTITY: &str = "Appointment";

/// Filters for [`AppointmentService::list`]
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    /// Exact match, e.g. `scheduled`
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentService {
    pool: SqlitePool,
}

impl AppointmentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        member_id: i64,
        new_appointment: NewAppointment,
        user_id: i64,
    ) -> Result<Appointment, ServiceError> {
        require_text("title", &new_appointment.title)?;
        require_text("status", &new_appointment.status)?;
        let now = Utc::now();

        sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments
                (family_member_id, title, doctor_name, hospital_clinic, appointment_date,
                 appointment_type, status, notes, created_at, updated_at)
             SELECT id, ?, ?, ?, ?, ?, ?, ?, ?, ?
             FROM family_members WHERE id = ? AND user_id = ?
             RETURNING *",
        )
        .bind(&new_appointment.title)
        .bind(&new_appointment.doctor_name)
        .bind(&new_appointment.hospital_clinic)
        .bind(new_appointment.appointment_date)
        .bind(&new_appointment.appointment_type)
        .bind(&new_appointment.status)
        .bind(&new_appointment.notes)
        .bind(now)
        .bind(now)
        .bind(member_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::from_write(e, "Error creating appointment"))?
        .ok_or_else(|| {
            tracing::warn!("User {} tried to add an appointment to family member {}", user_id, member_id);
            ServiceError::AccessDenied("Family member")
        })
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<Appointment, ServiceError> {
        sqlx::query_as::<_, Appointment>(
            "SELECT a.* FROM appointments a
             JOIN family_members fm ON fm.id = a.family_member_id
             WHERE a.id = ? AND fm.user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound(ENTITY))
    }

    /// Ordered by appointment date, then id
    pub async fn list_by_member(
        &self,
        member_id: i64,
        user_id: i64,
        page: Pagination,
    ) -> Result<Vec<Appointment>, ServiceError> {
        ensure_member(&self.pool, member_id, user_id).await?;

        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE family_member_id = ?
             ORDER BY appointment_date, id LIMIT ? OFFSET ?",
        )
        .bind(member_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    pub async fn list(
        &self,
        user_id: i64,
        query: AppointmentQuery,
        page: Pagination,
    ) -> Result<Vec<Appointment>, ServiceError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT a.* FROM appointments a
             JOIN family_members fm ON fm.id = a.family_member_id
             WHERE fm.user_id = ",
        );
        sql.push_bind(user_id);
        if let Some(status) = query.status.filter(|s| !s.is_empty()) {
            sql.push(" AND a.status = ").push_bind(status);
        }
        sql.push(" ORDER BY a.appointment_date, a.id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let appointments = sql
            .build_query_as::<Appointment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(appointments)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: AppointmentPatch,
        user_id: i64,
    ) -> Result<Appointment, ServiceError> {
        require_text_if("title", patch.title.as_ref())?;
        require_text_if("status", patch.status.as_ref())?;

        let mut update = UpdateQuery::new("appointments");
        update
            .set_if("title", patch.title)
            .set_if("doctor_name", patch.doctor_name)
            .set_if("hospital_clinic", patch.hospital_clinic)
            .set_if("appointment_date", patch.appointment_date)
            .set_if("appointment_type", patch.appointment_type)
            .set_if("status", patch.status)
            .set_if("notes", patch.notes);

        let mut query = update.finish();
        push_owned_by(&mut query, id, user_id);

        query
            .build_query_as::<Appointment>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::from_write(e, "Error updating appointment"))?
            .ok_or(ServiceError::NotFound(ENTITY))
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "DELETE FROM appointments WHERE id = ?
             AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
