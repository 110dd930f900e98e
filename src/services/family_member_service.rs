use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{
    Appointment, FamilyMember, FamilyMemberDetail, FamilyMemberPatch, HealthRecord, Medication,
    NewFamilyMember,
};
use crate::database::query_builder::{contains_pattern, UpdateQuery};

use super::{require_text, require_text_if, Pagination, ServiceError};

const ENTITY: &str = "Family member";

/// Family members scoped to the requesting user.
///
/// Every statement carries `user_id = ?` in its own `WHERE` clause; there is
/// no fetch-then-compare step.
#[derive(Clone)]
pub struct FamilyMemberService {
    pool: SqlitePool,
}

impl FamilyMemberService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<FamilyMember, ServiceError> {
        sqlx::query_as::<_, FamilyMember>("SELECT * FROM family_members WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound(ENTITY))
    }

    /// The member plus its health records, medications and appointments
    pub async fn get_with_records(&self, id: i64, user_id: i64) -> Result<FamilyMemberDetail, ServiceError> {
        let member = self.get(id, user_id).await?;

        let health_records = sqlx::query_as::<_, HealthRecord>(
            "SELECT * FROM health_records WHERE family_member_id = ? ORDER BY id",
        )
        .bind(member.id)
        .fetch_all(&self.pool)
        .await?;

        let medications = sqlx::query_as::<_, Medication>(
            "SELECT * FROM medications WHERE family_member_id = ? ORDER BY id",
        )
        .bind(member.id)
        .fetch_all(&self.pool)
        .await?;

        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE family_member_id = ? ORDER BY id",
        )
        .bind(member.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(FamilyMemberDetail {
            member,
            health_records,
            medications,
            appointments,
        })
    }

    /// Members owned by `user_id` in insertion order. `search` matches a
    /// case-insensitive substring of the name or the relationship.
    pub async fn list(
        &self,
        user_id: i64,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<FamilyMember>, ServiceError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM family_members WHERE user_id = ");
        query.push_bind(user_id);

        if let Some(term) = search.filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            query
                .push(" AND (LOWER(full_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(relationship) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let members = query
            .build_query_as::<FamilyMember>()
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }

    /// Always attached to `user_id`
    pub async fn create(&self, new_member: NewFamilyMember, user_id: i64) -> Result<FamilyMember, ServiceError> {
        require_text("full_name", &new_member.full_name)?;
        require_text("relationship", &new_member.relationship)?;
        let now = Utc::now();

        let member = sqlx::query_as::<_, FamilyMember>(
            "INSERT INTO family_members
                (user_id, full_name, relationship, date_of_birth, phone_number,
                 emergency_contact, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&new_member.full_name)
        .bind(&new_member.relationship)
        .bind(new_member.date_of_birth)
        .bind(&new_member.phone_number)
        .bind(new_member.emergency_contact)
        .bind(&new_member.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::from_write(e, "Error creating family member"))?;

        tracing::debug!("User {} created family member {}", user_id, member.id);
        Ok(member)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: FamilyMemberPatch,
        user_id: i64,
    ) -> Result<FamilyMember, ServiceError> {
        require_text_if("full_name", patch.full_name.as_ref())?;
        require_text_if("relationship", patch.relationship.as_ref())?;

        let mut update = UpdateQuery::new("family_members");
        update
            .set_if("full_name", patch.full_name)
            .set_if("relationship", patch.relationship)
            .set_if("date_of_birth", patch.date_of_birth)
            .set_if("phone_number", patch.phone_number)
            .set_if("emergency_contact", patch.emergency_contact)
            .set_if("notes", patch.notes);

        let mut query = update.finish();
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING *");

        query
            .build_query_as::<FamilyMember>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::from_write(e, "Error updating family member"))?
            .ok_or(ServiceError::NotFound(ENTITY))
    }

    /// Deletes the member and, by cascade, everything attached to it
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM family_members WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn create_attaches_to_requesting_user() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();

        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();
        assert_eq!(bob.user_id, alice.id);
        assert!(!bob.emergency_contact);

        let fetched = ctx.family_members().get(bob.id, alice.id).await.unwrap();
        assert_eq!(fetched.full_name, "Bob");
    }

    #[tokio::test]
    async fn other_users_cannot_see_touch_or_delete_a_member() {
        let ctx = TestContext::new().await.unwrap();
        let members = ctx.family_members();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();
        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();

        assert!(matches!(members.get(bob.id, carol.id).await, Err(ServiceError::NotFound(_))));

        let patch = FamilyMemberPatch { full_name: Some("Mallory".to_string()), ..Default::default() };
        assert!(matches!(
            members.update(bob.id, patch, carol.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(!members.delete(bob.id, carol.id).await.unwrap());

        let unchanged = members.get(bob.id, alice.id).await.unwrap();
        assert_eq!(unchanged.full_name, "Bob");
        assert_eq!(unchanged.updated_at, bob.updated_at);
    }

    #[tokio::test]
    async fn missing_and_foreign_members_look_the_same() {
        let ctx = TestContext::new().await.unwrap();
        let members = ctx.family_members();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();
        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();

        let foreign = members.get(bob.id, carol.id).await.unwrap_err().to_string();
        let missing = members.get(bob.id + 1000, carol.id).await.unwrap_err().to_string();
        assert_eq!(foreign, missing);
    }

    #[tokio::test]
    async fn list_is_scoped_and_searchable() {
        let ctx = TestContext::new().await.unwrap();
        let members = ctx.family_members();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();
        ctx.create_member(alice.id, "Bob", "child").await.unwrap();
        ctx.create_member(alice.id, "Martha", "Mother").await.unwrap();
        ctx.create_member(alice.id, "Tom", "spouse").await.unwrap();
        ctx.create_member(carol.id, "Bobby", "child").await.unwrap();

        let all = members.list(alice.id, None, Pagination::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Martha", "Tom"]);

        let by_name = members.list(alice.id, Some("BOB"), Pagination::default()).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].full_name, "Bob");

        let by_relation = members.list(alice.id, Some("moth"), Pagination::default()).await.unwrap();
        assert_eq!(by_relation.len(), 1);
        assert_eq!(by_relation[0].full_name, "Martha");

        let paged = members.list(alice.id, None, Pagination { skip: 1, limit: 1 }).await.unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].full_name, "Martha");
    }

    #[tokio::test]
    async fn search_finds_non_ascii_names_in_their_own_case() {
        let ctx = TestContext::new().await.unwrap();
        let members = ctx.family_members();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        ctx.create_member(alice.id, "Émile", "Großvater").await.unwrap();

        let exact = members.list(alice.id, Some("Émile"), Pagination::default()).await.unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].full_name, "Émile");

        let ascii_folded = members.list(alice.id, Some("ÉMILE"), Pagination::default()).await.unwrap();
        assert_eq!(ascii_folded.len(), 1);

        let relation = members.list(alice.id, Some("GROß"), Pagination::default()).await.unwrap();
        assert_eq!(relation.len(), 1);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        ctx.create_member(alice.id, "Bob", "child").await.unwrap();

        let hits = ctx.family_members().list(alice.id, Some("%"), Pagination::default()).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn update_applies_patch_and_refreshes_timestamp() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();

        let patch = FamilyMemberPatch {
            emergency_contact: Some(true),
            notes: Some(Some("Allergic to peanuts".to_string())),
            ..Default::default()
        };
        let updated = ctx.family_members().update(bob.id, patch, alice.id).await.unwrap();
        assert_eq!(updated.full_name, "Bob");
        assert!(updated.emergency_contact);
        assert_eq!(updated.notes.as_deref(), Some("Allergic to peanuts"));
        assert_eq!(updated.created_at, bob.created_at);
        assert!(updated.updated_at >= bob.updated_at);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        assert!(matches!(
            ctx.create_member(alice.id, " ", "child").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_to_attached_records() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();
        ctx.create_health_record(bob.id, alice.id, "allergy", "Peanuts").await.unwrap();
        ctx.create_medication(bob.id, alice.id, "Cetirizine").await.unwrap();
        ctx.create_appointment(bob.id, alice.id, "Allergist").await.unwrap();

        assert!(ctx.family_members().delete(bob.id, alice.id).await.unwrap());
        assert_eq!(ctx.count_rows("health_records").await, 0);
        assert_eq!(ctx.count_rows("medications").await, 0);
        assert_eq!(ctx.count_rows("appointments").await, 0);
    }

    #[tokio::test]
    async fn detail_includes_attached_records() {
        let ctx = TestContext::new().await.unwrap();
        let alice = ctx.create_user("alice@example.com").await.unwrap();
        let carol = ctx.create_user("carol@example.com").await.unwrap();
        let bob = ctx.create_member(alice.id, "Bob", "child").await.unwrap();
        ctx.create_health_record(bob.id, alice.id, "allergy", "Peanuts").await.unwrap();
        ctx.create_appointment(bob.id, alice.id, "Allergist").await.unwrap();

        let detail = ctx.family_members().get_with_records(bob.id, alice.id).await.unwrap();
        assert_eq!(detail.member.id, bob.id);
        assert_eq!(detail.health_records.len(), 1);
        assert!(detail.medications.is_empty());
        assert_eq!(detail.appointments.len(), 1);

        assert!(matches!(
            ctx.family_members().get_with_records(bob.id, carol.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
