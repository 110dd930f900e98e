use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{HealthRecord, HealthRecordPatch, NewHealthRecord};
use crate::database::query_builder::{contains_pattern, UpdateQuery};

use super::{ensure_member, push_owned_by, require_text, require_text_if, Pagination, ServiceError};

const ENTITY: &str = "Health record";
const PARENT: &str = "Family member";

/// Filters for [`HealthRecordService::search`]
#[derive(Debug, Clone, Default)]
pub struct HealthRecordQuery {
    /// Case-insensitive substring of title, description or doctor name
    pub search: Option<String>,
    /// Exact match on the record type
    pub record_type: Option<String>,
}

/// Health records reached through the owning family member.
#[derive(Clone)]
pub struct HealthRecordService {
    pool: SqlitePool,
}

impl HealthRecordService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert under `member_id` only if that member belongs to `user_id`.
    /// The ownership check and the insert are the same statement.
    pub async fn create(
        &self,
        member_id: i64,
        new_record: NewHealthRecord,
        user_id: i64,
    ) -> Result<HealthRecord, ServiceError> {
        require_text("record_type", &new_record.record_type)?;
        require_text("title", &new_record.title)?;
        let now = Utc::now();

        let record = sqlx::query_as::<_, HealthRecord>(
            "INSERT INTO health_records
                (family_member_id, record_type, title, description, date_recorded,
                 doctor_name, hospital_clinic, severity, status, notes, created_at, updated_at)
             SELECT id, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             FROM family_members WHERE id = ? AND user_id = ?
             RETURNING *",
        )
        .bind(&new_record.record_type)
        .bind(&new_record.title)
        .bind(&new_record.description)
        .bind(new_record.date_recorded.unwrap_or(now))
        .bind(&new_record.doctor_name)
        .bind(&new_record.hospital_clinic)
        .bind(&new_record.severity)
        .bind(&new_record.status)
        .bind(&new_record.notes)
        .bind(now)
        .bind(now)
        .bind(member_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::from_write(e, "Error creating health record"))?;

        match record {
            Some(record) => Ok(record),
            None => {
                tracing::warn!(
                    "User {} tried to add a health record to family member {}",
                    user_id,
                    member_id
                );
                Err(ServiceError::AccessDenied(PARENT))
            }
        }
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<HealthRecord, ServiceError> {
        sqlx::query_as::<_, HealthRecord>(
            "SELECT hr.* FROM health_records hr
             JOIN family_members fm ON fm.id = hr.family_member_id
             WHERE hr.id = ? AND fm.user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound(ENTITY))
    }

    /// Records of one member, oldest first. An unknown or foreign member is
    /// `NotFound`, never an empty list.
    pub async fn list_by_member(
        &self,
        member_id: i64,
        user_id: i64,
        page: Pagination,
    ) -> Result<Vec<HealthRecord>, ServiceError> {
        ensure_member(&self.pool, member_id, user_id).await?;

        let records = sqlx::query_as::<_, HealthRecord>(
            "SELECT * FROM health_records WHERE family_member_id = ?
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(member_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Every record across the user's members, narrowed by `query`
    pub async fn search(
        &self,
        user_id: i64,
        query: HealthRecordQuery,
        page: Pagination,
    ) -> Result<Vec<HealthRecord>, ServiceError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT hr.* FROM health_records hr
             JOIN family_members fm ON fm.id = hr.family_member_id
             WHERE fm.user_id = ",
        );
        sql.push_bind(user_id);

        if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            sql.push(" AND (LOWER(hr.title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(hr.description) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(hr.doctor_name) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(record_type) = query.record_type.filter(|t| !t.is_empty()) {
            sql.push(" AND hr.record_type = ").push_bind(record_type);
        }

        sql.push(" ORDER BY hr.id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let records = sql
            .build_query_as::<HealthRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: HealthRecordPatch,
        user_id: i64,
    ) -> Result<HealthRecord, ServiceError> {
        require_text_if("record_type", patch.record_type.as_ref())?;
        require_text_if("title", patch.title.as_ref())?;

        let mut update = UpdateQuery::new("health_records");
        update
            .set_if("record_type", patch.record_type)
            .set_if("title", patch.title)
            .set_if("description", patch.description)
            .set_if("date_recorded", patch.date_recorded)
            .set_if("doctor_name", patch.doctor_name)
            .set_if("hospital_clinic", patch.hospital_clinic)
            .set_if("severity", patch.severity)
            .set_if("status", patch.status)
            .set_if("notes", patch.notes);

        let mut query = update.finish();
        push_owned_by(&mut query, id, user_id);

        query
            .build_query_as::<HealthRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::from_write(e, "Error updating health record"))?
            .ok_or(ServiceError::NotFound(ENTITY))
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "DELETE FROM health_records WHERE id = ?
             AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
