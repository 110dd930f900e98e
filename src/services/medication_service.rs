use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{Medication, MedicationPatch, NewMedication};
use crate::database::query_builder::UpdateQuery;

use super::{ensure_member, push_owned_by, require_text, require_text_if, Pagination, ServiceError};

const ENTITY: &str = "Medication";

/// Filters for [`MedicationService::list`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MedicationQuery {
    pub active_only: bool,
}

#[derive(Clone)]
pub struct MedicationService {
    pool: SqlitePool,
}

impl MedicationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Same single-statement parent check as health records
    pub async fn create(
        &self,
        member_id: i64,
        new_medication: NewMedication,
        user_id: i64,
    ) -> Result<Medication, ServiceError> {
        require_text("name", &new_medication.name)?;
        require_text("dosage", &new_medication.dosage)?;
        require_text("frequency", &new_medication.frequency)?;
        let now = Utc::now();

        sqlx::query_as::<_, Medication>(
            "INSERT INTO medications
                (family_member_id, name, dosage, frequency, start_date, end_date,
                 prescribed_by, purpose, side_effects, is_active, notes, created_at, updated_at)
             SELECT id, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             FROM family_members WHERE id = ? AND user_id = ?
             RETURNING *",
        )
        .bind(&new_medication.name)
        .bind(&new_medication.dosage)
        .bind(&new_medication.frequency)
        .bind(new_medication.start_date)
        .bind(new_medication.end_date)
        .bind(&new_medication.prescribed_by)
        .bind(&new_medication.purpose)
        .bind(&new_medication.side_effects)
        .bind(new_medication.is_active)
        .bind(&new_medication.notes)
        .bind(now)
        .bind(now)
        .bind(member_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::from_write(e, "Error creating medication"))?
        .ok_or_else(|| {
            tracing::warn!("User {} tried to add a medication to family member {}", user_id, member_id);
            ServiceError::AccessDenied("Family member")
        })
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<Medication, ServiceError> {
        sqlx::query_as::<_, Medication>(
            "SELECT m.* FROM medications m
             JOIN family_members fm ON fm.id = m.family_member_id
             WHERE m.id = ? AND fm.user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound(ENTITY))
    }

    pub async fn list_by_member(
        &self,
        member_id: i64,
        user_id: i64,
        page: Pagination,
    ) -> Result<Vec<Medication>, ServiceError> {
        ensure_member(&self.pool, member_id, user_id).await?;

        let medications = sqlx::query_as::<_, Medication>(
            "SELECT * FROM medications WHERE family_member_id = ?
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(member_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(medications)
    }

    /// Medications across all of the user's family members
    pub async fn list(
        &self,
        user_id: i64,
        query: MedicationQuery,
        page: Pagination,
    ) -> Result<Vec<Medication>, ServiceError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT m.* FROM medications m
             JOIN family_members fm ON fm.id = m.family_member_id
             WHERE fm.user_id = ",
        );
        sql.push_bind(user_id);
        if query.active_only {
            sql.push(" AND m.is_active = 1");
        }
        sql.push(" ORDER BY m.id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let medications = sql
            .build_query_as::<Medication>()
            .fetch_all(&self.pool)
            .await?;
        Ok(medications)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: MedicationPatch,
        user_id: i64,
    ) -> Result<Medication, ServiceError> {
        require_text_if("name", patch.name.as_ref())?;
        require_text_if("dosage", patch.dosage.as_ref())?;
        require_text_if("frequency", patch.frequency.as_ref())?;

        let mut update = UpdateQuery::new("medications");
        update
            .set_if("name", patch.name)
            .set_if("dosage", patch.dosage)
            .set_if("frequency", patch.frequency)
            .set_if("start_date", patch.start_date)
            .set_if("end_date", patch.end_date)
            .set_if("prescribed_by", patch.prescribed_by)
            .set_if("purpose", patch.purpose)
            .set_if("side_effects", patch.side_effects)
            .set_if("is_active", patch.is_active)
            .set_if("notes", patch.notes);

        let mut query = update.finish();
        push_owned_by(&mut query, id, user_id);

        query
            .build_query_as::<Medication>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::from_write(e, "Error updating medication"))?
            .ok_or(ServiceError::NotFound(ENTITY))
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "DELETE FROM medications WHERE id = ?
             AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
