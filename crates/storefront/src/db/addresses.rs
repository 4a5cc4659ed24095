//! Address queries.

use sqlx::{PgExecutor, PgPool};

use boutique_core::{AddressId, AddressType, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressFields, NewAddress};

/// Columns selected for an [`Address`], qualified with the `a` alias.
pub(super) const ADDRESS_COLUMNS: &str = "a.id, a.user_id, a.name, a.street_address, \
     a.apartment_address, a.country, a.zip, a.address_type, a.is_default";

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct AddressRow {
    id: i64,
    user_id: i64,
    name: String,
    street_address: String,
    apartment_address: Option<String>,
    country: String,
    zip: String,
    address_type: String,
    is_default: bool,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let address_type = row
            .address_type
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("address {}: {e}", row.id)))?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            fields: AddressFields {
                name: row.name,
                street_address: row.street_address,
                apartment_address: row.apartment_address,
                country: row.country,
                zip: row.zip,
            },
            address_type,
            default: row.is_default,
        })
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a non-default address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewAddress) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO storefront.address AS a (
                user_id, name, street_address, apartment_address, country, zip, address_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING a.id, a.user_id, a.name, a.street_address,
                      a.apartment_address, a.country, a.zip, a.address_type, a.is_default
            ",
        )
        .bind(input.user_id.as_i64())
        .bind(&input.fields.name)
        .bind(&input.fields.street_address)
        .bind(&input.fields.apartment_address)
        .bind(&input.fields.country)
        .bind(&input.fields.zip)
        .bind(input.address_type.as_str())
        .fetch_one(self.pool)
        .await?;

        Address::try_from(row)
    }

    /// Get the user's default address of a type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(
        &self,
        user_id: UserId,
        address_type: AddressType,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address a \
             WHERE a.user_id = $1 AND a.address_type = $2 AND a.is_default"
        ))
        .bind(user_id.as_i64())
        .bind(address_type.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::try_from).transpose()
    }

    /// Make an address the default for its type, clearing the previous
    /// default in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another user.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let address = fetch_by_id(&mut *tx, id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE storefront.address
            SET is_default = FALSE
            WHERE user_id = $1 AND address_type = $2 AND is_default AND id <> $3
            ",
        )
        .bind(user_id.as_i64())
        .bind(address.address_type.as_str())
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE storefront.address SET is_default = TRUE WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Address {
            default: true,
            ..address
        })
    }
}

/// Load an address by ID with any executor (pool or open transaction).
pub(super) async fn fetch_by_id<'e, E>(
    executor: E,
    id: AddressId,
) -> Result<Option<Address>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, AddressRow>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM storefront.address a WHERE a.id = $1"
    ))
    .bind(id.as_i64())
    .fetch_optional(executor)
    .await?;

    row.map(Address::try_from).transpose()
}
