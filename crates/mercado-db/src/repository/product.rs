//! # Product Repository
//!
//! Database operations for the product catalog: CRUD plus the stock and
//! expiry views the dashboard alerts feed on.
//!
//! Stock quantities are mutated only by the sale transaction processor
//! ([`crate::repository::sale`]) and by explicit product edits.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mercado_core::validation;
use mercado_core::{CoreError, Product, DEFAULT_USER_ID};

const PRODUCT_COLUMNS: &str = "id, user_id, name, category, cost_price_cents, sale_price_cents, \
     supplier_id, stock_quantity, min_stock, entry_date, expiry_date, notes, \
     created_at, updated_at";

/// Input for creating a product. IDs and timestamps are generated by the
/// repository.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub supplier_id: Option<String>,
    pub stock_quantity: i64,
    pub min_stock: i64,
    pub entry_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns the stored row.
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        validation::validate_product_name(&input.name).map_err(CoreError::from)?;
        validation::validate_category(&input.category).map_err(CoreError::from)?;
        validation::validate_amount_cents("cost_price", input.cost_price_cents)
            .map_err(CoreError::from)?;
        validation::validate_amount_cents("sale_price", input.sale_price_cents)
            .map_err(CoreError::from)?;
        validation::validate_stock_level("stock_quantity", input.stock_quantity)
            .map_err(CoreError::from)?;
        validation::validate_stock_level("min_stock", input.min_stock)
            .map_err(CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            name: input.name.trim().to_string(),
            category: input.category,
            cost_price_cents: input.cost_price_cents,
            sale_price_cents: input.sale_price_cents,
            supplier_id: input.supplier_id,
            stock_quantity: input.stock_quantity,
            min_stock: input.min_stock,
            entry_date: input.entry_date,
            expiry_date: input.expiry_date,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, user_id, name, category, cost_price_cents, sale_price_cents,
                supplier_id, stock_quantity, min_stock, entry_date, expiry_date,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&product.id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.sale_price_cents)
        .bind(&product.supplier_id)
        .bind(product.stock_quantity)
        .bind(product.min_stock)
        .bind(product.entry_date)
        .bind(product.expiry_date)
        .bind(&product.notes)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates all editable fields of a product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validation::validate_product_name(&product.name).map_err(CoreError::from)?;
        validation::validate_category(&product.category).map_err(CoreError::from)?;
        validation::validate_amount_cents("cost_price", product.cost_price_cents)
            .map_err(CoreError::from)?;
        validation::validate_amount_cents("sale_price", product.sale_price_cents)
            .map_err(CoreError::from)?;
        validation::validate_stock_level("stock_quantity", product.stock_quantity)
            .map_err(CoreError::from)?;
        validation::validate_stock_level("min_stock", product.min_stock)
            .map_err(CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET
                name = ?2, category = ?3, cost_price_cents = ?4, sale_price_cents = ?5,
                supplier_id = ?6, stock_quantity = ?7, min_stock = ?8, entry_date = ?9,
                expiry_date = ?10, notes = ?11, updated_at = ?12
            WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.sale_price_cents)
        .bind(&product.supplier_id)
        .bind(product.stock_quantity)
        .bind(product.min_stock)
        .bind(product.entry_date)
        .bind(product.expiry_date)
        .bind(&product.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product. Historical sales survive with a NULL product
    /// reference (ON DELETE SET NULL).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the whole catalog in name order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products at or below their minimum stock threshold (inclusive),
    /// lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE stock_quantity <= min_stock
             ORDER BY stock_quantity"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products whose expiry date falls within the next `days` days,
    /// already-expired included, soonest first.
    pub async fn expiring(&self, days: i64, now: DateTime<Utc>) -> DbResult<Vec<Product>> {
        let limit = now.date_naive() + Duration::days(days);

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE expiry_date IS NOT NULL AND expiry_date <= ?1
             ORDER BY expiry_date"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(name: &str, stock: i64, min_stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "laticinios".to_string(),
            cost_price_cents: 200,
            sale_price_cents: 500,
            supplier_id: None,
            stock_quantity: stock,
            min_stock,
            entry_date: Utc::now().date_naive(),
            expiry_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.create(sample_product("Leite Integral 1L", 10, 5)).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Leite Integral 1L");
        assert_eq!(fetched.stock_quantity, 10);
        assert_eq!(fetched.sale_price_cents, 500);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut bad = sample_product("  ", 10, 5);
        assert!(matches!(
            repo.create(bad.clone()).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));

        bad.name = "Leite".to_string();
        bad.cost_price_cents = -1;
        assert!(matches!(
            repo.create(bad).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_list_is_name_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.create(sample_product("Queijo Minas", 5, 2)).await.unwrap();
        repo.create(sample_product("Arroz 5kg", 5, 2)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Arroz 5kg", "Queijo Minas"]);
    }

    #[tokio::test]
    async fn test_low_stock_is_inclusive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.create(sample_product("No limite", 5, 5)).await.unwrap();
        repo.create(sample_product("Acima", 6, 5)).await.unwrap();

        let low = repo.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "No limite");
    }

    #[tokio::test]
    async fn test_expiring_includes_already_expired() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let now = Utc::now();

        let mut soon = sample_product("Iogurte", 5, 2);
        soon.expiry_date = Some(now.date_naive() + Duration::days(10));
        let mut past = sample_product("Queijo", 5, 2);
        past.expiry_date = Some(now.date_naive() - Duration::days(3));
        let mut far = sample_product("Leite UHT", 5, 2);
        far.expiry_date = Some(now.date_naive() + Duration::days(90));

        repo.create(soon).await.unwrap();
        repo.create(past).await.unwrap();
        repo.create(far).await.unwrap();

        let expiring = repo.expiring(30, now).await.unwrap();
        assert_eq!(expiring.len(), 2);
        // Soonest (already expired) first
        assert_eq!(expiring[0].name, "Queijo");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut product = repo.create(sample_product("Leite", 10, 5)).await.unwrap();
        product.sale_price_cents = 650;
        repo.update(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale_price_cents, 650);

        repo.delete(&product.id).await.unwrap();
        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
