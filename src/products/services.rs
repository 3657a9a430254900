//! Catalog service: paging rules and view dispatch

use sqlx::SqlitePool;
use tracing::debug;

use super::models::{Category, Page, Product};
use super::repository::ProductRepository;
use super::view_counter::ViewCounter;
use crate::common::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_FEATURED: i64 = 8;
pub const MAX_FEATURED: i64 = 20;

/// page < 1 becomes 1; limit < 1 becomes 12; limit > 100 becomes 100
pub fn clamp_page(page: i64, limit: i64) -> Page {
    let page = page.max(1);
    let limit = if limit < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    };
    Page { page, limit }
}

pub fn clamp_featured(limit: i64) -> i64 {
    if limit < 1 {
        DEFAULT_FEATURED
    } else {
        limit.min(MAX_FEATURED)
    }
}

pub struct ProductService {
    repo: ProductRepository,
    views: ViewCounter,
}

impl ProductService {
    pub fn new(db: SqlitePool, view_queue_capacity: usize) -> Self {
        Self {
            views: ViewCounter::spawn(db.clone(), view_queue_capacity),
            repo: ProductRepository::new(db),
        }
    }

    pub async fn list_products(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64, Page), ApiError> {
        let page = clamp_page(page, limit);
        let (products, total) = self.repo.list(page).await?;
        Ok((products, total, page))
    }

    pub async fn products_by_category(
        &self,
        category: &str,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64, Page), ApiError> {
        let page = clamp_page(page, limit);
        let (products, total) = self.repo.by_category(category, page).await?;
        Ok((products, total, page))
    }

    pub async fn search_products(
        &self,
        query: &str,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64, Page), ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::BadRequest("Search query is required".to_string()));
        }

        let page = clamp_page(page, limit);
        let (products, total) = self.repo.search(query, page).await?;
        Ok((products, total, page))
    }

    pub async fn featured_products(&self, limit: i64) -> Result<Vec<Product>, ApiError> {
        self.repo.featured(clamp_featured(limit)).await
    }

    /// The returned product carries the view count from before this view
    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        let product = self.repo.find_by_id(id).await?;
        if !self.views.record(id) {
            debug!(product_id = id, "View not recorded");
        }
        Ok(product)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.repo.categories().await
    }
}
