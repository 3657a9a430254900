// src/products/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use std::sync::Arc;
use tracing::{error, info};

use super::models::{
    CategoryListResponse, FeaturedResponse, PageParams, Product, ProductListResponse,
    SearchParams,
};
use crate::common::{ApiError, AppState};

/// GET /api/products?page=&limit=
pub async fn list_products(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let (products, total, page) = state
        .product_service
        .list_products(params.page(), params.limit())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch products");
            e
        })?;

    Ok(Json(ProductListResponse {
        products,
        total,
        page: page.page,
        limit: page.limit,
        query: None,
    }))
}

/// GET /api/products/featured?limit=
pub async fn featured_products(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<FeaturedResponse>, ApiError> {
    let products = state
        .product_service
        .featured_products(params.limit())
        .await?;
    Ok(Json(FeaturedResponse { products }))
}

/// GET /api/products/search?q=&page=&limit=
pub async fn search_products(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let query = params.q.clone().unwrap_or_default();
    let paging = params.paging();

    let (products, total, page) = state
        .product_service
        .search_products(&query, paging.page(), paging.limit())
        .await?;

    info!(results = products.len(), total = total, "Product search");

    Ok(Json(ProductListResponse {
        products,
        total,
        page: page.page,
        limit: page.limit,
        query: Some(query),
    }))
}

/// GET /api/products/category/:category
pub async fn products_by_category(
    Extension(state): Extension<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let (products, total, page) = state
        .product_service
        .products_by_category(&category, params.page(), params.limit())
        .await?;

    Ok(Json(ProductListResponse {
        products,
        total,
        page: page.page,
        limit: page.limit,
        query: None,
    }))
}

/// GET /api/products/:id
pub async fn get_product(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = id
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Invalid product ID".to_string()))?;

    let product = state.product_service.get_product(id).await?;
    Ok(Json(product))
}

/// GET /api/categories
pub async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = state.product_service.list_categories().await?;
    Ok(Json(CategoryListResponse { categories }))
}
