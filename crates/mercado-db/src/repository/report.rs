//! # Report Repository
//!
//! Fetches the rows a report needs and delegates every reduction to
//! [`mercado_core::metrics`]. Datasets are small (one user's month or
//! trailing window), so rows are loaded in full and aggregated in memory,
//! in the same shape the dashboard charts consume.
//!
//! Aggregation here runs in UTC, the storage timezone; callers that need
//! business-local bucketing use the core functions directly with a zoned
//! clock.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::expense::ExpenseRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{month_start, SaleRepository};
use mercado_core::metrics::{
    self, BreakdownEntry, DashboardMetrics, Period, ProductRank, SeriesPoint,
};
use mercado_core::PaymentMethod;

/// Repository for dashboard and report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool.clone())
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Month-to-date dashboard summary for the month containing `now`.
    pub async fn dashboard_metrics(&self, now: DateTime<Utc>) -> DbResult<DashboardMetrics> {
        let sales = self.sales().month_to_date(now).await?;
        let expenses = self.expenses().month_to_date(now).await?;
        let products = self.products().list().await?;

        Ok(metrics::dashboard_metrics(&sales, &expenses, &products, now))
    }

    /// Revenue/profit/costs chart series for the period ending at `now`.
    pub async fn time_series(
        &self,
        period: Period,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<SeriesPoint>> {
        let window_start = match period {
            Period::Today => day_start(now),
            Period::Weekly => day_start(now - Duration::days(6)),
            Period::Monthly => {
                let back = now
                    .checked_sub_months(Months::new(5))
                    .unwrap_or(now);
                month_start(back)
            }
        };

        let sales = self.sales().list(Some(window_start), None).await?;
        let expenses = self
            .expenses()
            .list(Some(window_start.date_naive()), None)
            .await?;

        Ok(metrics::time_series(period, &sales, &expenses, now))
    }

    /// Current-month sales grouped by product category.
    pub async fn sales_by_category(
        &self,
        now: DateTime<Utc>,
    ) -> DbResult<BTreeMap<String, BreakdownEntry>> {
        let sales = self.sales().month_to_date(now).await?;
        let products = self.products().list().await?;

        Ok(metrics::sales_by_category(&sales, &products, now))
    }

    /// Current-month sales grouped by payment method.
    pub async fn sales_by_payment_method(
        &self,
        now: DateTime<Utc>,
    ) -> DbResult<BTreeMap<PaymentMethod, BreakdownEntry>> {
        let sales = self.sales().month_to_date(now).await?;

        Ok(metrics::sales_by_payment_method(&sales, now))
    }

    /// Top current-month products by profit.
    pub async fn top_products(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<ProductRank>> {
        let sales = self.sales().month_to_date(now).await?;
        let products = self.products().list().await?;

        Ok(metrics::top_products(&sales, &products, limit, now))
    }
}

/// Midnight UTC of the day containing `now`.
fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    match now.date_naive().and_hms_opt(0, 0, 0) {
        Some(naive) => DateTime::from_naive_utc_and_offset(naive, Utc),
        None => now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::expense::NewExpense;
    use crate::repository::product::NewProduct;
    use mercado_core::Money;

    async fn seed_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let leite = db
            .products()
            .create(NewProduct {
                name: "Leite Integral 1L".to_string(),
                category: "laticinios".to_string(),
                cost_price_cents: 200,
                sale_price_cents: 500,
                supplier_id: None,
                stock_quantity: 10,
                min_stock: 5,
                entry_date: Utc::now().date_naive(),
                expiry_date: None,
                notes: None,
            })
            .await
            .unwrap();

        db.sales()
            .create_sale(&leite.id, 3, PaymentMethod::Pix)
            .await
            .unwrap();
        db.expenses()
            .create(NewExpense {
                description: "Conta de luz".to_string(),
                amount_cents: 400,
                category: None,
                expense_date: Utc::now().date_naive(),
            })
            .await
            .unwrap();

        db
    }

    #[tokio::test]
    async fn test_dashboard_metrics_combines_collections() {
        let db = seed_db().await;
        let m = db.reports().dashboard_metrics(Utc::now()).await.unwrap();

        assert_eq!(m.total_revenue, Money::from_cents(1500));
        assert_eq!(m.total_expenses, Money::from_cents(400));
        // Sales profit 900 - expenses 400
        assert_eq!(m.total_profit, Money::from_cents(500));
        assert_eq!(m.total_products_sold, 3);
        // Stock dropped 10 → 7, still above min_stock 5
        assert_eq!(m.low_stock_count, 0);
    }

    #[tokio::test]
    async fn test_monthly_series_is_complete() {
        let db = seed_db().await;
        let series = db
            .reports()
            .time_series(Period::Monthly, Utc::now())
            .await
            .unwrap();

        assert_eq!(series.len(), 6);
        // Current month is the last bucket and holds the seeded activity.
        let last = series.last().unwrap();
        assert_eq!(last.revenue, Money::from_cents(1500));
        assert_eq!(last.costs, Money::from_cents(600 + 400)); // product cost + expense
        assert_eq!(last.profit, Money::from_cents(500));
        // Earlier months are zero rows, not omitted.
        assert_eq!(series[0].revenue, Money::zero());
    }

    #[tokio::test]
    async fn test_breakdowns_and_ranking() {
        let db = seed_db().await;
        let now = Utc::now();

        let by_category = db.reports().sales_by_category(now).await.unwrap();
        assert_eq!(by_category["laticinios"].count, 3);
        assert_eq!(by_category["laticinios"].total, Money::from_cents(1500));

        let by_method = db.reports().sales_by_payment_method(now).await.unwrap();
        assert_eq!(by_method[&PaymentMethod::Pix].count, 3);

        let top = db.reports().top_products(5, now).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Leite Integral 1L");
        assert_eq!(top[0].profit, Money::from_cents(900));
    }
}
