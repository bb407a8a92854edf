//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use loja_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, created_at, updated_at
            FROM loja.app_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Create a new user with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        insert_user(self.pool, email, password_hash).await
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, email, created_at, updated_at, password_hash
            FROM loja.app_user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }
}

/// Insert a user with any executor, so account creation can join a transaction.
pub(crate) async fn insert_user<'e>(
    executor: impl PgExecutor<'e>,
    email: &Email,
    password_hash: &str,
) -> Result<User, RepositoryError> {
    sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO loja.app_user (email, password_hash)
        VALUES ($1, $2)
        RETURNING id, email, created_at, updated_at
        ",
    )
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_insert(e, "email"))?
    .try_into()
}
