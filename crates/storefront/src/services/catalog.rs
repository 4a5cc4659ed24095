//! Catalog browsing.

use tracing::instrument;

use super::ShopError;
use crate::db::ShopStore;
use crate::models::Item;

/// Items per catalog page.
pub const PAGE_SIZE: i64 = 10;

/// One page of the catalog listing.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub items: Vec<Item>,
    /// 1-based page number.
    pub page: i64,
    /// At least 1, even for an empty catalog.
    pub total_pages: i64,
}

impl CatalogPage {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Read-only catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }

    /// A page of items. Pages below 1 are treated as page 1; pages past the
    /// end are empty.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn page(&self, page: i64) -> Result<CatalogPage, ShopError> {
        let page = page.max(1);
        let total = self.store.count_items().await?;
        let total_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let offset = (page - 1).saturating_mul(PAGE_SIZE);
        let items = self.store.list_items(PAGE_SIZE, offset).await?;

        Ok(CatalogPage {
            items,
            page,
            total_pages,
        })
    }

    /// One item by slug.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotFound` if no item has this slug.
    pub async fn item(&self, slug: &str) -> Result<Item, ShopError> {
        self.store
            .find_item_by_slug(slug)
            .await?
            .ok_or_else(|| ShopError::ItemNotFound(slug.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing::new_item;

    async fn store_with(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..count {
            store.add_item(new_item(&format!("item-{i}"), 100)).await;
        }
        store
    }

    #[tokio::test]
    async fn test_pages_hold_ten_items() {
        let store = store_with(23).await;
        let catalog = CatalogService::new(&store);

        let first = catalog.page(1).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = catalog.page(3).await.unwrap();
        assert_eq!(last.items.len(), 3);
        assert!(!last.has_next());
    }

    #[tokio::test]
    async fn test_out_of_range_pages() {
        let store = store_with(3).await;
        let catalog = CatalogService::new(&store);

        assert_eq!(catalog.page(0).await.unwrap().page, 1);
        let beyond = catalog.page(9).await.unwrap();
        assert!(beyond.items.is_empty());
        assert!(beyond.has_previous());
    }

    #[tokio::test]
    async fn test_item_by_slug() {
        let store = store_with(1).await;
        let catalog = CatalogService::new(&store);

        assert_eq!(catalog.item("item-0").await.unwrap().slug.as_str(), "item-0");
        assert!(matches!(
            catalog.item("nope").await.unwrap_err(),
            ShopError::ItemNotFound(_)
        ));
    }
}
