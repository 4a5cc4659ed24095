//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::ItemView;
use crate::error::Result;
use crate::middleware::flash::{self, FlashMessage};
use crate::services::CatalogService;
use crate::state::AppState;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub flashes: Vec<FlashMessage>,
    pub items: Vec<ItemView>,
    pub page: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Item detail template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/show.html")]
pub struct ItemShowTemplate {
    pub flashes: Vec<FlashMessage>,
    pub item: ItemView,
}

/// Display one page of the catalog.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Result<CatalogIndexTemplate> {
    let currency = state.config().stripe.currency;
    let page = CatalogService::new(state.store())
        .page(query.page.unwrap_or(1))
        .await?;

    Ok(CatalogIndexTemplate {
        flashes: flash::take(&session).await,
        items: page
            .items
            .iter()
            .map(|item| ItemView::new(item, currency))
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
    })
}

/// Display an item.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<ItemShowTemplate> {
    let item = CatalogService::new(state.store()).item(&slug).await?;

    Ok(ItemShowTemplate {
        flashes: flash::take(&session).await,
        item: ItemView::new(&item, state.config().stripe.currency),
    })
}
