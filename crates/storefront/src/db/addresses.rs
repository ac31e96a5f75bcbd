//! Address repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use swiftcart_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, NewAddress};

/// Repository for user addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: String,
    full_name: String,
    area: String,
    city: String,
    state: String,
    postal_code: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).ok_or_else(|| {
            RepositoryError::DataCorruption("empty user id on address".to_owned())
        })?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id,
            full_name: row.full_name,
            area: row.area,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            phone: row.phone,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str = "id, user_id, full_name, area, city, state, postal_code, phone, created_at";

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {COLUMNS} FROM storefront.address WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Address::try_from).collect()
    }

    /// Get one of the user's addresses by ID.
    ///
    /// Scoped to the user so one user can never checkout against another's
    /// address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: &UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {COLUMNS} FROM storefront.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::try_from).transpose()
    }

    /// Create a new address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: &UserId,
        address: NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO storefront.address
                (id, user_id, full_name, area, city, state, postal_code, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "
        ))
        .bind(AddressId::generate())
        .bind(user_id)
        .bind(&address.full_name)
        .bind(&address.area)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Delete one of the user's addresses.
    ///
    /// Orders keep their own address snapshot, so deleting an address never
    /// rewrites history.
    ///
    /// # Returns
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: &UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.address WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
