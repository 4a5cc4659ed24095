//! Refund request queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use boutique_core::{Email, OrderId, RefundId};

use super::RepositoryError;
use crate::models::{NewRefund, Refund};

/// Internal row type for refund queries.
#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: i64,
    order_id: i64,
    reason: String,
    email: String,
    accepted: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for Refund {
    type Error = RepositoryError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: RefundId::new(row.id),
            order_id: OrderId::new(row.order_id),
            reason: row.reason,
            email,
            accepted: row.accepted,
            created_at: row.created_at,
        })
    }
}

/// Repository for refund database operations.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    /// Create a new refund repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a refund request and flag the order, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        order_id: OrderId,
        input: &NewRefund,
    ) -> Result<Refund, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query(
            "UPDATE storefront.shop_order SET refund_requested = TRUE WHERE id = $1",
        )
        .bind(order_id.as_i64())
        .execute(&mut *tx)
        .await?;

        if flagged.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, RefundRow>(
            r"
            INSERT INTO storefront.refund (order_id, reason, email)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, reason, email, accepted, created_at
            ",
        )
        .bind(order_id.as_i64())
        .bind(&input.reason)
        .bind(input.email.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Refund::try_from(row)
    }
}
