//! # Supplier Repository
//!
//! Product suppliers. Products reference suppliers optionally; deleting a
//! supplier nulls the reference (ON DELETE SET NULL) and leaves the
//! product untouched.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mercado_core::validation;
use mercado_core::{CoreError, Supplier, DEFAULT_USER_ID};

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers in name order.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, user_id, name, phone, email, created_at FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Creates a supplier.
    pub async fn create(&self, input: NewSupplier) -> DbResult<Supplier> {
        validation::validate_supplier_name(&input.name).map_err(CoreError::from)?;

        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            name: input.name.trim().to_string(),
            phone: input.phone,
            email: input.email,
            created_at: Utc::now(),
        };

        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            "INSERT INTO suppliers (id, user_id, name, phone, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&supplier.id)
        .bind(&supplier.user_id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Deletes a supplier. Referencing products keep running with a NULL
    /// supplier.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        repo.create(NewSupplier {
            name: "Laticínios Boa Vista".to_string(),
            phone: Some("(31) 99999-0000".to_string()),
            email: None,
        })
        .await
        .unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Laticínios Boa Vista");
    }

    #[tokio::test]
    async fn test_delete_nulls_product_reference() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let supplier = db
            .suppliers()
            .create(NewSupplier {
                name: "Distribuidora Central".to_string(),
                phone: None,
                email: None,
            })
            .await
            .unwrap();

        let product = db
            .products()
            .create(NewProduct {
                name: "Leite Integral 1L".to_string(),
                category: "laticinios".to_string(),
                cost_price_cents: 200,
                sale_price_cents: 500,
                supplier_id: Some(supplier.id.clone()),
                stock_quantity: 10,
                min_stock: 5,
                entry_date: Utc::now().date_naive(),
                expiry_date: None,
                notes: None,
            })
            .await
            .unwrap();

        db.suppliers().delete(&supplier.id).await.unwrap();

        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.supplier_id, None);
    }
}
