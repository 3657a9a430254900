//! Catalog queries

use sqlx::SqlitePool;

use super::models::{Category, Page, Product};
use crate::common::ApiError;

const PRODUCT_COLUMNS: &str = "id, created_at, updated_at, name, description, price, image_url, \
                               category, in_stock, rating, views";

/// `%` and `_` in user input match literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct ProductRepository {
    db: SqlitePool,
}

impl ProductRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: Page) -> Result<(Vec<Product>, i64), ApiError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        Ok((products, total))
    }

    pub async fn by_category(
        &self,
        category: &str,
        page: Page,
    ) -> Result<(Vec<Product>, i64), ApiError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE category = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS
        ))
        .bind(category)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category = ?")
            .bind(category)
            .fetch_one(&self.db)
            .await?;

        Ok((products, total))
    }

    /// Case-insensitive substring match on name or description
    pub async fn search(&self, query: &str, page: Page) -> Result<(Vec<Product>, i64), ApiError> {
        let pattern = like_pattern(query);

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\' \
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            PRODUCT_COLUMNS
        ))
        .bind(&pattern)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok((products, total))
    }

    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, ApiError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE in_stock = 1 \
             ORDER BY rating DESC, views DESC LIMIT ?",
            PRODUCT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Product, ApiError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, created_at, updated_at, name, description, image_url \
             FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(categories)
    }
}

pub async fn increment_views(db: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
