//! # User Repository
//!
//! Database operations for accounts. Password hashes live in this table and
//! never leave the API layer; the `User` type skips the hash when serialized.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use biblio_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a new account with the given role.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, email = %user.email, role = %role.as_str(), "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email (the login identifier).
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all accounts, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Changes a user's role. Returns `false` when no such user exists.
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<bool> {
        debug!(id = %id, role = %role.as_str(), "Setting user role");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any admin account exists. Used at startup to decide whether
    /// to seed one.
    pub async fn has_admin(&self) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE role = 'admin'"#)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let db = test_db().await;
        let user = db
            .users()
            .create("Ada", "ada@example.com", "hash", Role::Student)
            .await
            .unwrap();

        let found = db
            .users()
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Student);

        assert!(db
            .users()
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let db = test_db().await;
        db.users()
            .create("Ada", "ada@example.com", "hash", Role::Student)
            .await
            .unwrap();

        let err = db
            .users()
            .create("Ada Again", "ada@example.com", "hash", Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_role() {
        let db = test_db().await;
        let user = db
            .users()
            .create("Ada", "ada@example.com", "hash", Role::Student)
            .await
            .unwrap();

        assert!(db.users().set_role(&user.id, Role::Librarian).await.unwrap());
        let stored = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Librarian);

        assert!(!db.users().set_role("missing", Role::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_admin() {
        let db = test_db().await;
        assert!(!db.users().has_admin().await.unwrap());

        db.users()
            .create("Root", "admin@example.com", "hash", Role::Admin)
            .await
            .unwrap();
        assert!(db.users().has_admin().await.unwrap());
    }
}
