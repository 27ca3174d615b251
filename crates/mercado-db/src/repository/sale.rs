//! # Sale Repository
//!
//! The sale transaction processor: every stock-mutating operation runs in
//! a single SQLite transaction so a sale row can never exist without its
//! matching stock adjustment.
//!
//! ## Operation Flow
//! ```text
//! create_sale(product, qty, method)
//!      │
//!      ▼
//! BEGIN ── read product ── check stock ── INSERT sale ──┐
//!                                                       ▼
//!          UPDATE products SET stock = stock - qty
//!          WHERE id = ? AND stock >= qty   ← guard against races
//!                                                       │
//! COMMIT ◄──────────────────────────────────────────────┘
//!
//! delete_sale: restore stock (skipped when the product is gone), delete row
//! update_sale_quantity: adjust stock by the delta, re-snapshot prices
//! ```
//!
//! ## Snapshot Pattern
//! Unit and cost prices are copied onto the sale at creation time, so
//! later product price edits never alter historical revenue or profit.
//! Editing a sale's quantity deliberately re-snapshots from the current
//! product prices.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use mercado_core::quick_sale::{self, QuickSaleError};
use mercado_core::validation;
use mercado_core::{CoreError, PaymentMethod, Product, Sale, SaleWithProduct};

const SALE_COLUMNS: &str = "id, user_id, product_id, quantity, unit_price_cents, \
     cost_price_cents, total_price_cents, profit_cents, payment_method, sale_date, created_at";

const PRODUCT_COLUMNS: &str = "id, user_id, name, category, cost_price_cents, sale_price_cents, \
     supplier_id, stock_quantity, min_stock, entry_date, expiry_date, notes, \
     created_at, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists sales, optionally bounded by an inclusive timestamp range,
    /// newest first.
    pub async fn list(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Sale>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales"));

        if let Some(start) = start {
            query.push(" WHERE sale_date >= ").push_bind(start);
            if let Some(end) = end {
                query.push(" AND sale_date <= ").push_bind(end);
            }
        } else if let Some(end) = end {
            query.push(" WHERE sale_date <= ").push_bind(end);
        }

        query.push(" ORDER BY sale_date DESC");

        let sales = query.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// Sales of the calendar month containing `now`.
    pub async fn month_to_date(&self, now: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        self.list(Some(month_start(now)), None).await
    }

    /// Lists sales with their product expanded, newest first.
    ///
    /// The expansion is an in-memory join; `product` is `None` for sales
    /// whose product was deleted.
    pub async fn list_with_product(&self) -> DbResult<Vec<SaleWithProduct>> {
        let sales = self.list(None, None).await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products"
        ))
        .fetch_all(&self.pool)
        .await?;
        let by_id: HashMap<String, Product> =
            products.into_iter().map(|p| (p.id.clone(), p)).collect();

        Ok(sales
            .into_iter()
            .map(|sale| {
                let product = sale
                    .product_id
                    .as_deref()
                    .and_then(|id| by_id.get(id))
                    .cloned();
                SaleWithProduct { sale, product }
            })
            .collect())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Records a sale: snapshots the product's prices, inserts the sale
    /// row, and decrements stock, all in one transaction.
    ///
    /// ## Errors
    /// - [`CoreError::ProductNotFound`] when the product does not exist
    /// - [`CoreError::InsufficientStock`] when stock is below `quantity`,
    ///   reporting the available amount
    /// - Validation failure when `quantity < 1`
    pub async fn create_sale(
        &self,
        product_id: &str,
        quantity: i64,
        payment_method: PaymentMethod,
    ) -> DbResult<Sale> {
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        debug!(product_id = %product_id, quantity, "Creating sale");

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if product.stock_quantity < quantity {
            return Err(CoreError::InsufficientStock {
                available: product.stock_quantity,
                requested: quantity,
            }
            .into());
        }

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            user_id: product.user_id.clone(),
            product_id: Some(product.id.clone()),
            quantity,
            unit_price_cents: product.sale_price_cents,
            cost_price_cents: product.cost_price_cents,
            total_price_cents: product.sale_price_cents * quantity,
            profit_cents: (product.sale_price_cents - product.cost_price_cents) * quantity,
            payment_method,
            sale_date: now,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO sales (
                id, user_id, product_id, quantity, unit_price_cents, cost_price_cents,
                total_price_cents, profit_cents, payment_method, sale_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.product_id)
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.cost_price_cents)
        .bind(sale.total_price_cents)
        .bind(sale.profit_cents)
        .bind(sale.payment_method)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        // Guarded decrement: rows_affected is 0 when another writer drained
        // the stock between our read and this update.
        let updated = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - ?1, updated_at = ?2
             WHERE id = ?3 AND stock_quantity >= ?1",
        )
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                available: product.stock_quantity,
                requested: quantity,
            }
            .into());
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            product_id = %product_id,
            quantity,
            total = sale.total_price_cents,
            "Sale recorded"
        );

        Ok(sale)
    }

    /// Deletes a sale and restores the decremented stock in one
    /// transaction.
    ///
    /// When the product was deleted in the meantime there is nothing to
    /// restore: the stock update affects zero rows and the sale row is
    /// removed anyway.
    pub async fn delete_sale(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if let Some(product_id) = &sale.product_id {
            sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity + ?1, updated_at = ?2
                 WHERE id = ?3",
            )
            .bind(sale.quantity)
            .bind(Utc::now())
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, quantity = sale.quantity, "Sale deleted, stock restored");
        Ok(())
    }

    /// Changes a sale's quantity, adjusting stock by the delta and
    /// recomputing totals from the product's **current** prices (a
    /// deliberate re-snapshot on edit).
    ///
    /// A negative delta restores stock. No-op when the quantity does not
    /// change. Fails with [`CoreError::ProductNotFound`] when the product
    /// was deleted.
    pub async fn update_sale_quantity(&self, sale_id: &str, new_quantity: i64) -> DbResult<()> {
        validation::validate_quantity(new_quantity).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let diff = new_quantity - sale.quantity;
        if diff == 0 {
            return Ok(());
        }

        let product_id = sale
            .product_id
            .clone()
            .ok_or_else(|| CoreError::ProductNotFound("(removed)".to_string()))?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(&product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        if diff > 0 && product.stock_quantity < diff {
            return Err(CoreError::InsufficientStock {
                available: product.stock_quantity,
                requested: diff,
            }
            .into());
        }

        let now = Utc::now();

        // Subtracting a negative diff increases stock; the guard only
        // bites when diff is positive.
        let updated = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity - ?1, updated_at = ?2
             WHERE id = ?3 AND stock_quantity - ?1 >= 0",
        )
        .bind(diff)
        .bind(now)
        .bind(&product_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                available: product.stock_quantity,
                requested: diff,
            }
            .into());
        }

        let unit = product.sale_price_cents;
        let cost = product.cost_price_cents;
        sqlx::query(
            "UPDATE sales SET quantity = ?2, unit_price_cents = ?3, cost_price_cents = ?4,
                total_price_cents = ?5, profit_cents = ?6
             WHERE id = ?1",
        )
        .bind(sale_id)
        .bind(new_quantity)
        .bind(unit)
        .bind(cost)
        .bind(unit * new_quantity)
        .bind((unit - cost) * new_quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, new_quantity, diff, "Sale quantity updated");
        Ok(())
    }

    /// Records a sale from a free-text quick-sale line
    /// (`"Leite - 2 pix"`).
    ///
    /// Parsing and product resolution happen in
    /// [`mercado_core::quick_sale`]; the sale itself goes through
    /// [`SaleRepository::create_sale`] with all of its checks.
    pub async fn create_quick_sale(&self, input: &str) -> DbResult<Sale> {
        let parsed = quick_sale::parse(input).map_err(CoreError::from)?;

        // Name order keeps "first match" deterministic.
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        let product = quick_sale::resolve_product(&products, &parsed.name_query)
            .ok_or_else(|| {
                CoreError::QuickSale(QuickSaleError::ProductNotFound(parsed.name_query.clone()))
            })?;
        let product_id = product.id.clone();

        debug!(
            input = %input,
            product_id = %product_id,
            quantity = parsed.quantity,
            "Quick sale parsed"
        );

        self.create_sale(&product_id, parsed.quantity, parsed.payment_method)
            .await
    }
}

/// Start of the calendar month containing `now`, at midnight UTC.
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive());
    match date.and_hms_opt(0, 0, 0) {
        Some(naive) => Utc.from_utc_datetime(&naive),
        None => now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
