pub mod appointment_service;
pub mod family_member_service;
pub mod health_record_service;
pub mod medication_service;
pub mod user_service;

pub use appointment_service::{AppointmentQuery, AppointmentService};
pub use family_member_service::FamilyMemberService;
pub use health_record_service::{HealthRecordQuery, HealthRecordService};
pub use medication_service::{MedicationQuery, MedicationService};
pub use user_service::UserService;

use sqlx::error::ErrorKind;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ApiConfig;

/// Failures of the credential store and the ownership-scoped services.
///
/// `NotFound` covers both "does not exist" and "belongs to someone else".
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The parent family member of a new record is not the caller's
    #[error("{0} not found or access denied")]
    AccessDenied(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Translate a failed write: constraint violations become a generic
    /// validation message, the cause is logged and dropped.
    pub(crate) fn from_write(err: sqlx::Error, message: &str) -> Self {
        let constraint = err.as_database_error().and_then(|db_err| match db_err.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => Some(db_err.message().to_string()),
            _ => None,
        });

        match constraint {
            Some(detail) => {
                tracing::warn!("Constraint violation ({}): {}", message, detail);
                ServiceError::Validation(message.to_string())
            }
            None => ServiceError::Database(err),
        }
    }
}

/// Zero-based offset and page size, applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

impl Pagination {
    /// Build from request values: negative values clamp to zero, a missing
    /// limit takes the configured default and any limit is capped at the
    /// configured maximum.
    pub fn new(skip: Option<i64>, limit: Option<i64>, api: &ApiConfig) -> Self {
        let requested = limit.unwrap_or(api.default_limit);
        let limit = if requested > api.max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", requested, api.max_limit);
            api.max_limit
        } else {
            requested
        };

        Self {
            skip: skip.unwrap_or(0).max(0),
            limit: limit.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Reject blank values for required text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Same as [`require_text`] but only when the patch carries a value
pub(crate) fn require_text_if(field: &str, value: Option<&String>) -> Result<(), ServiceError> {
    match value {
        Some(value) => require_text(field, value),
        None => Ok(()),
    }
}

/// `NotFound` unless `member_id` names one of `user_id`'s family members
pub(crate) async fn ensure_member(pool: &SqlitePool, member_id: i64, user_id: i64) -> Result<(), ServiceError> {
    let owned: Option<i64> = sqlx::query_scalar("SELECT id FROM family_members WHERE id = ? AND user_id = ?")
        .bind(member_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    match owned {
        Some(_) => Ok(()),
        None => Err(ServiceError::NotFound("Family member")),
    }
}

/// Append the filter shared by updates of member-owned rows: the row id plus
/// a parent owned by `user_id`.
pub(crate) fn push_owned_by(query: &mut QueryBuilder<'_, Sqlite>, id: i64, user_id: i64) {
    query
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ")
        .push_bind(user_id)
        .push(") RETURNING *");
}
