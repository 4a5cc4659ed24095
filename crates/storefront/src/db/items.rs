//! Catalog item queries.

use rust_decimal::Decimal;
use sqlx::PgPool;

use boutique_core::{ItemId, Slug};

use super::RepositoryError;
use crate::models::{Item, NewItem};

/// Columns selected for an [`Item`], qualified with the `i` alias.
pub(super) const ITEM_COLUMNS: &str = "i.id, i.name, i.slug, i.price, i.discount_price, \
     i.category, i.label, i.description, i.image";

/// Internal row type for item queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ItemRow {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) slug: String,
    pub(super) price: Decimal,
    pub(super) discount_price: Option<Decimal>,
    pub(super) category: String,
    pub(super) label: Option<String>,
    pub(super) description: String,
    pub(super) image: Option<String>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug for item {}: {e}", row.id))
        })?;
        let category = row
            .category
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("item {}: {e}", row.id)))?;
        let label = row
            .label
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("item {}: {e}", row.id)))?;

        Ok(Self {
            id: ItemId::new(row.id),
            name: row.name,
            slug,
            price: row.price,
            discount_price: row.discount_price,
            category,
            label,
            description: row.description,
            image: row.image,
        })
    }
}

/// Repository for catalog item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a page of items ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.item i ORDER BY i.id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Item::try_from).collect()
    }

    /// Count all items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.item")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Get an item by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.item i WHERE i.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    /// Insert an item, or update the existing item with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO storefront.item AS i (
                name, slug, price, discount_price, category, label, description, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                discount_price = EXCLUDED.discount_price,
                category = EXCLUDED.category,
                label = EXCLUDED.label,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                updated_at = now()
            RETURNING i.id, i.name, i.slug, i.price, i.discount_price,
                      i.category, i.label, i.description, i.image
            ",
        )
        .bind(&item.name)
        .bind(item.slug.as_str())
        .bind(item.price)
        .bind(item.discount_price)
        .bind(item.category.as_str())
        .bind(item.label.map(|l| l.as_str()))
        .bind(&item.description)
        .bind(&item.image)
        .fetch_one(self.pool)
        .await?;

        Item::try_from(row)
    }
}
