//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::ShopStore;
use crate::payments::PaymentGateway;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and the payment gateway are trait
/// objects so tests can run the router against in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn ShopStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn ShopStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn ShopStore {
        self.inner.store.as_ref()
    }

    /// Payment processor client.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }
}
