//! Seed the catalog from a YAML file.
//!
//! Items are upserted by slug and coupons by code, so the same file can be
//! applied repeatedly.
//!
//! ```yaml
//! items:
//!   - name: Linen shirt
//!     slug: linen-shirt
//!     price: "39.90"
//!     discount_price: "29.90"
//!     category: shirt
//!     label: primary
//!     description: Breathable summer shirt.
//! coupons:
//!   - code: WELCOME10
//!     kind: percentage
//!     value: "10"
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use boutique_core::{Discount, DiscountError, ItemCategory, ItemLabel, Slug};
use boutique_storefront::db::{self, PgStore, RepositoryError};
use boutique_storefront::models::NewItem;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Coupon {code}: {source}")]
    Coupon { code: String, source: DiscountError },

    #[error("Item {0}: discount price must be below the list price")]
    DiscountNotBelowPrice(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub items: Vec<SeedItem>,
    #[serde(default)]
    pub coupons: Vec<SeedCoupon>,
}

#[derive(Debug, Deserialize)]
pub struct SeedItem {
    pub name: String,
    pub slug: Slug,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    pub category: ItemCategory,
    #[serde(default)]
    pub label: Option<ItemLabel>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCoupon {
    pub code: String,
    /// `fixed` or `percentage`.
    pub kind: String,
    pub value: Decimal,
}

/// Validated seed content.
#[derive(Debug)]
pub struct Catalog {
    pub items: Vec<NewItem>,
    pub coupons: Vec<(String, Discount)>,
}

/// Parse and validate seed YAML without touching the database.
///
/// # Errors
///
/// Returns `SeedError::Parse` for malformed YAML or invalid slugs and
/// categories, and a validation error for bad prices or discounts.
pub fn parse(content: &str) -> Result<Catalog, SeedError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    let items = file
        .items
        .into_iter()
        .map(|item| {
            if item.discount_price.is_some_and(|sale| sale >= item.price) {
                return Err(SeedError::DiscountNotBelowPrice(item.slug.to_string()));
            }
            Ok(NewItem {
                name: item.name,
                slug: item.slug,
                price: item.price,
                discount_price: item.discount_price,
                category: item.category,
                label: item.label,
                description: item.description,
                image: item.image,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let coupons = file
        .coupons
        .into_iter()
        .map(|coupon| {
            let code = coupon.code.trim().to_owned();
            Discount::from_parts(&coupon.kind, coupon.value)
                .map(|discount| (code.clone(), discount))
                .map_err(|source| SeedError::Coupon { code, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Catalog { items, coupons })
}

/// Load a seed file into the storefront database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or if the
/// database rejects a row.
pub async fn catalog(path: &Path) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog = parse(&content)?;
    info!(
        items = catalog.items.len(),
        coupons = catalog.coupons.len(),
        "Seed file validated"
    );

    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;
    let store = PgStore::new(db::create_pool(&database_url).await?);

    for item in &catalog.items {
        let saved = store.upsert_item(item).await?;
        info!(slug = %saved.slug, id = %saved.id, "Upserted item");
    }
    for (code, discount) in &catalog.coupons {
        let saved = store.upsert_coupon(code, *discount).await?;
        info!(code = %saved.code, kind = discount.kind(), "Upserted coupon");
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let catalog = parse(include_str!("../../seeds/catalog.yaml")).unwrap();
        assert!(!catalog.items.is_empty());
        assert!(!catalog.coupons.is_empty());
    }

    #[test]
    fn test_parse_items_and_coupons() {
        let catalog = parse(
            r#"
items:
  - name: Cap
    slug: cap
    price: "12.00"
    category: out_wear
    label: danger
coupons:
  - code: " FIVE "
    kind: fixed
    value: "5"
"#,
        )
        .unwrap();

        let cap = &catalog.items[0];
        assert_eq!(cap.slug.as_str(), "cap");
        assert_eq!(cap.category, ItemCategory::OutWear);
        assert_eq!(cap.label, Some(ItemLabel::Danger));
        assert_eq!(
            catalog.coupons[0],
            ("FIVE".to_owned(), Discount::Fixed(Decimal::new(5, 0)))
        );
    }

    #[test]
    fn test_rejects_bad_discounts() {
        let err = parse(
            r#"
coupons:
  - code: HUGE
    kind: percentage
    value: "150"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::Coupon { .. }));

        let err = parse(
            r#"
items:
  - name: Tee
    slug: tee
    price: "10.00"
    discount_price: "10.00"
    category: shirt
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::DiscountNotBelowPrice(_)));
    }

    #[test]
    fn test_rejects_invalid_slug() {
        let err = parse(
            r#"
items:
  - name: Tee
    slug: Not A Slug
    price: "10.00"
    category: shirt
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::Parse(_)));
    }
}
