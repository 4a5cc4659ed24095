//! Coupon queries.

use rust_decimal::Decimal;
use sqlx::PgPool;

use boutique_core::{CouponId, Discount};

use super::RepositoryError;
use crate::models::Coupon;

/// Internal row type for coupon queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct CouponRow {
    id: i64,
    code: String,
    discount_kind: String,
    discount_value: Decimal,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount = Discount::from_parts(&row.discount_kind, row.discount_value)
            .map_err(|e| RepositoryError::DataCorruption(format!("coupon {}: {e}", row.id)))?;

        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount,
        })
    }
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by its exact code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored discount is invalid.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            "SELECT id, code, discount_kind, discount_value FROM storefront.coupon WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Get a coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            "SELECT id, code, discount_kind, discount_value FROM storefront.coupon WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Insert a coupon, or update the discount of the coupon with the same code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, code: &str, discount: Discount) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            INSERT INTO storefront.coupon (code, discount_kind, discount_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE SET
                discount_kind = EXCLUDED.discount_kind,
                discount_value = EXCLUDED.discount_value
            RETURNING id, code, discount_kind, discount_value
            ",
        )
        .bind(code)
        .bind(discount.kind())
        .bind(discount.value())
        .fetch_one(self.pool)
        .await?;

        Coupon::try_from(row)
    }
}
