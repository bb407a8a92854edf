//! Profile repository.
//!
//! One profile per user. Saving again overwrites the existing row.

use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

use loja_core::{Cpf, Email, NewProfile, Profile, ProfileId, UserId};

use super::RepositoryError;
use super::users::insert_user;
use crate::models::user::User;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i32,
    user_id: i32,
    full_name: String,
    birth_date: NaiveDate,
    cpf: String,
    street: String,
    number: String,
    complement: Option<String>,
    district: String,
    postal_code: String,
    city: String,
    state: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            birth_date: row.birth_date,
            cpf: Cpf::from_trusted(row.cpf),
            street: row.street,
            number: row.number,
            complement: row.complement,
            district: row.district,
            postal_code: row.postal_code,
            city: row.city,
            state: row.state,
        }
    }
}

/// Repository for customer profiles.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, user_id, full_name, birth_date, cpf, street, number, complement,
                   district, postal_code, city, state
            FROM loja.profile
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    /// Create or replace the profile of an existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the CPF belongs to another profile.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(
        &self,
        user_id: UserId,
        profile: &NewProfile,
    ) -> Result<Profile, RepositoryError> {
        upsert_profile(self.pool, user_id, profile).await
    }

    /// Create a user account and its profile in one transaction.
    ///
    /// Nothing is written if either insert fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or the CPF is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_account(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &NewProfile,
    ) -> Result<(User, Profile), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = insert_user(&mut *tx, email, password_hash).await?;
        let profile = upsert_profile(&mut *tx, user.id, profile).await?;

        tx.commit().await?;

        Ok((user, profile))
    }
}

async fn upsert_profile<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
    profile: &NewProfile,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r"
        INSERT INTO loja.profile
            (user_id, full_name, birth_date, cpf, street, number, complement,
             district, postal_code, city, state)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            birth_date = EXCLUDED.birth_date,
            cpf = EXCLUDED.cpf,
            street = EXCLUDED.street,
            number = EXCLUDED.number,
            complement = EXCLUDED.complement,
            district = EXCLUDED.district,
            postal_code = EXCLUDED.postal_code,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            updated_at = NOW()
        RETURNING id, user_id, full_name, birth_date, cpf, street, number, complement,
                  district, postal_code, city, state
        ",
    )
    .bind(user_id)
    .bind(&profile.full_name)
    .bind(profile.birth_date)
    .bind(profile.cpf.as_str())
    .bind(&profile.street)
    .bind(&profile.number)
    .bind(profile.complement.as_deref())
    .bind(&profile.district)
    .bind(&profile.postal_code)
    .bind(&profile.city)
    .bind(&profile.state)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_insert(e, "cpf"))?;

    Ok(row.into())
}
