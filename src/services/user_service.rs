use chrono::Utc;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

use crate::auth::{hash_password, verify_password};
use crate::database::models::{NewUser, User, UserPatch};
use crate::database::query_builder::UpdateQuery;

use super::{Pagination, ServiceError};

const MIN_PASSWORD_LENGTH: usize = 6;
const DUPLICATE_EMAIL: &str = "User with this email already exists";

/// Credential store: user identities and their password hashes
#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Exact match; callers normalize the email beforehand if they need to
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, ServiceError> {
        validate_email(&new_user.email)?;
        validate_password(&new_user.password)?;

        let hashed_password = hash_password(&new_user.password)?;
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users
                (email, hashed_password, full_name, date_of_birth, phone_number,
                 is_active, is_superuser, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, 0, ?, ?)
             RETURNING *",
        )
        .bind(&new_user.email)
        .bind(&hashed_password)
        .bind(&new_user.full_name)
        .bind(new_user.date_of_birth)
        .bind(&new_user.phone_number)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::from_write(e, DUPLICATE_EMAIL))?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Returns the user only when the email exists and the password matches.
    /// Both failure cases produce the same `None`, and an unknown email still
    /// pays for one hash verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, ServiceError> {
        match self.find_by_email(email).await? {
            Some(user) if verify_password(password, &user.hashed_password) => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                if let Some(dummy) = dummy_hash() {
                    let _ = verify_password(password, dummy);
                }
                Ok(None)
            }
        }
    }

    /// Apply the supplied fields only. `None` when the id is unknown.
    pub async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, ServiceError> {
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        let hashed_password = match &patch.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut update = UpdateQuery::new("users");
        update
            .set_if("email", patch.email)
            .set_if("hashed_password", hashed_password)
            .set_if("full_name", patch.full_name)
            .set_if("phone_number", patch.phone_number)
            .set_if("date_of_birth", patch.date_of_birth)
            .set_if("is_active", patch.is_active);

        let mut query = update.finish();
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let user = query
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_EMAIL))?;
        Ok(user)
    }

    /// Remove the user; family members and their records go with it
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Deleted user {} and all owned records", id);
        }
        Ok(deleted)
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn set_superuser(&self, id: i64, is_superuser: bool) -> Result<Option<User>, ServiceError> {
        let mut update = UpdateQuery::new("users");
        update.set("is_superuser", is_superuser);
        let mut query = update.finish();
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let user = query
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace),
        None => false,
    };
    if !valid {
        return Err(ServiceError::validation("A valid email address is required"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Hash verified against when the email is unknown
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("phrm-dummy-password").ok());

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn alice() -> NewUser {
        NewUser {
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            full_name: Some("Alice".to_string()),
            phone_number: None,
            date_of_birth: None,
        }
    }

    #[tokio::test]
    async fn register_assigns_id_and_hashes_password() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();

        let user = users.create(alice()).await.unwrap();
        assert!(user.id > 0);
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert_ne!(user.hashed_password, "secret1");

        let found = users.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(users.find_by_id(user.id).await.unwrap().unwrap().email, user.email);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();

        users.create(alice()).await.unwrap();
        let err = users.create(alice()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg == DUPLICATE_EMAIL));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();

        users.create(alice()).await.unwrap();
        assert!(users.find_by_email("Alice@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let ctx = TestContext::new().await.unwrap();
        let mut new_user = alice();
        new_user.password = "abc".to_string();
        assert!(matches!(
            ctx.users().create(new_user).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_is_uniform_on_failure() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();
        users.create(alice()).await.unwrap();

        assert!(users.authenticate("alice@example.com", "secret1").await.unwrap().is_some());
        assert!(users.authenticate("alice@example.com", "wrong-pass").await.unwrap().is_none());
        assert!(users.authenticate("nobody@example.com", "secret1").await.unwrap().is_none());

        let dummy = dummy_hash().unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        assert!(std::ptr::eq(dummy, dummy_hash().unwrap()));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();
        let user = users.create(alice()).await.unwrap();

        let patch = UserPatch {
            phone_number: Some(Some("555-0100".to_string())),
            password: Some("newsecret".to_string()),
            ..Default::default()
        };
        let updated = users.update(user.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Alice"));
        assert_eq!(updated.phone_number.as_deref(), Some("555-0100"));
        assert!(updated.updated_at >= user.updated_at);

        assert!(users.authenticate("alice@example.com", "secret1").await.unwrap().is_none());
        assert!(users.authenticate("alice@example.com", "newsecret").await.unwrap().is_some());

        let cleared = users
            .update(user.id, UserPatch { full_name: Some(None), ..Default::default() })
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.full_name.is_none());
    }

    #[tokio::test]
    async fn update_unknown_user_is_none() {
        let ctx = TestContext::new().await.unwrap();
        let result = ctx.users().update(9999, UserPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_to_taken_email_is_rejected() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();
        users.create(alice()).await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();

        let patch = UserPatch { email: Some("alice@example.com".to_string()), ..Default::default() };
        assert!(matches!(users.update(carol.id, patch).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let ctx = TestContext::new().await.unwrap();
        let users = ctx.users();
        let user = users.create(alice()).await.unwrap();

        assert!(users.delete(user.id).await.unwrap());
        assert!(!users.delete(user.id).await.unwrap());
        assert!(users.find_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_everything_the_user_owns() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();
        for owner in [alice.id, carol.id] {
            let member = ctx.create_member(owner, "Bob", "child").await.unwrap();
            ctx.create_health_record(member.id, owner, "allergy", "Peanuts").await.unwrap();
            ctx.create_medication(member.id, owner, "Amoxicillin").await.unwrap();
            ctx.create_appointment(member.id, owner, "Checkup").await.unwrap();
        }

        assert!(ctx.users().delete(alice.id).await.unwrap());

        for table in ["family_members", "health_records", "medications", "appointments"] {
            assert_eq!(ctx.count_rows(table).await, 1, "{} kept rows of a deleted user", table);
        }
        let survivors = ctx.family_members().list(carol.id, None, Pagination::default()).await.unwrap();
        assert_eq!(survivors.len(), 1);

        assert!(ctx.users().delete(carol.id).await.unwrap());
        for table in ["family_members", "health_records", "medications", "appointments"] {
            assert_eq!(ctx.count_rows(table).await, 0, "{} has orphaned rows", table);
        }
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let ctx = TestContext::new().await.unwrap();
        for i in 0..3 {
            ctx.create_user(&format!("user{}@example.com", i)).await.unwrap();
        }
        let page = ctx.users().list(Pagination { skip: 1, limit: 5 }).await.unwrap();
        let emails: Vec<_> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["user1@example.com", "user2@example.com"]);
    }
}
