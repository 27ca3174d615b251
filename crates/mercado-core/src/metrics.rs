//! # Metrics Aggregator
//!
//! Turns raw sales/expenses/products into the dashboard's derived numbers:
//! month-to-date summary, time-bucketed chart series, category and
//! payment-method breakdowns, and the top-product ranking.
//!
//! ## Aggregation Model
//! ```text
//! rows (sales, expenses, products)          clock (as_of / now)
//!        │                                        │
//!        └────────────────┬───────────────────────┘
//!                         ▼
//!            pure reductions in this module
//!                         │
//!        ┌────────────────┼─────────────────────┐
//!        ▼                ▼                     ▼
//!  DashboardMetrics  Vec<SeriesPoint>   BTreeMap<_, BreakdownEntry>
//! ```
//!
//! Everything takes the clock as a parameter and the bucketing functions
//! are generic over [`chrono::TimeZone`], so callers aggregate in the
//! business's local time and tests pin exact instants. Buckets are
//! pre-initialized to zero before any record is scanned: series output has
//! a fixed length and emits zero rows for empty periods.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Expense, PaymentMethod, Product, Sale, FALLBACK_CATEGORY};

// =============================================================================
// Constants
// =============================================================================

/// Products whose expiry date falls within this many days (or already
/// passed) count as expiring.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Ranking label for sales whose product was deleted.
pub const REMOVED_PRODUCT_LABEL: &str = "Produto removido";

/// Month abbreviations, indexed by `month0`.
const PT_MONTHS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Weekday abbreviations, indexed by days-from-Sunday.
const PT_WEEKDAYS: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

// =============================================================================
// Output Types
// =============================================================================

/// Month-to-date dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DashboardMetrics {
    /// Sum of sale totals for the month.
    pub total_revenue: Money,
    /// Operating profit: sale profits minus expenses.
    pub total_profit: Money,
    pub total_expenses: Money,
    /// `total_profit / total_revenue * 100`; exactly 0 when revenue is 0.
    pub profit_margin: f64,
    /// Units sold across all sales.
    pub total_products_sold: i64,
    /// `total_revenue / sales count`; zero when there are no sales.
    pub average_ticket: Money,
    /// Products at or below their minimum stock (inclusive).
    pub low_stock_count: usize,
    /// Products expiring within [`EXPIRY_WINDOW_DAYS`], expired included.
    pub expiring_count: usize,
}

/// Chart granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Hour buckets, midnight through the current hour.
    Today,
    /// Seven day buckets, trailing week.
    Weekly,
    /// Six month buckets, trailing half year.
    Monthly,
}

/// One chart bucket. `profit = revenue - costs`, settled after every
/// contribution has landed.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SeriesPoint {
    pub label: String,
    pub revenue: Money,
    pub profit: Money,
    pub costs: Money,
}

/// Accumulated totals per category or payment method.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BreakdownEntry {
    pub total: Money,
    pub profit: Money,
    /// Units sold.
    pub count: i64,
}

impl BreakdownEntry {
    fn zero() -> Self {
        BreakdownEntry {
            total: Money::zero(),
            profit: Money::zero(),
            count: 0,
        }
    }
}

/// One row of the top-product ranking.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ProductRank {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub profit: Money,
}

// =============================================================================
// Dashboard Summary
// =============================================================================

/// Computes the month-to-date dashboard summary for the calendar month
/// containing `as_of`.
///
/// Sales are scoped by timestamp, expenses by date only (they carry no time
/// component). Low-stock and expiring counts look at the whole catalog,
/// not just the month.
pub fn dashboard_metrics<Tz: TimeZone>(
    sales: &[Sale],
    expenses: &[Expense],
    products: &[Product],
    as_of: DateTime<Tz>,
) -> DashboardMetrics {
    let mut total_revenue = Money::zero();
    let mut sales_profit = Money::zero();
    let mut total_products_sold = 0i64;
    let mut sales_count = 0i64;

    for sale in sales.iter().filter(|s| in_month(s.sale_date, &as_of)) {
        total_revenue += sale.total_price();
        sales_profit += sale.profit();
        total_products_sold += sale.quantity;
        sales_count += 1;
    }

    let today = as_of.date_naive();
    let mut total_expenses = Money::zero();
    for expense in expenses {
        if expense.expense_date.year() == today.year()
            && expense.expense_date.month() == today.month()
        {
            total_expenses += expense.amount();
        }
    }

    let total_profit = sales_profit - total_expenses;

    let profit_margin = if total_revenue.is_zero() {
        0.0
    } else {
        total_profit.cents() as f64 / total_revenue.cents() as f64 * 100.0
    };

    let average_ticket = if sales_count == 0 {
        Money::zero()
    } else {
        Money::from_cents(total_revenue.cents() / sales_count)
    };

    let expiry_limit = today + Duration::days(EXPIRY_WINDOW_DAYS);
    let low_stock_count = products.iter().filter(|p| p.is_low_stock()).count();
    let expiring_count = products
        .iter()
        .filter(|p| p.expiry_date.map(|d| d <= expiry_limit).unwrap_or(false))
        .count();

    DashboardMetrics {
        total_revenue,
        total_profit,
        total_expenses,
        profit_margin,
        total_products_sold,
        average_ticket,
        low_stock_count,
        expiring_count,
    }
}

// =============================================================================
// Time Series
// =============================================================================

struct Bucket {
    label: String,
    revenue: Money,
    costs: Money,
}

impl Bucket {
    fn new(label: String) -> Self {
        Bucket {
            label,
            revenue: Money::zero(),
            costs: Money::zero(),
        }
    }
}

/// Builds the revenue/profit/costs chart series for a period ending at
/// `now`.
///
/// Every sale contributes its total to revenue and its cost share
/// (`total - profit`) to costs; every expense contributes its amount to
/// costs in the bucket matching its date. Expenses are excluded from the
/// hourly series since they only have date precision. Output is in
/// chronological bucket order regardless of input order.
pub fn time_series<Tz: TimeZone>(
    period: Period,
    sales: &[Sale],
    expenses: &[Expense],
    now: DateTime<Tz>,
) -> Vec<SeriesPoint> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut buckets: Vec<Bucket> = match period {
        Period::Today => {
            let current_hour = now.hour() as usize;
            let mut buckets: Vec<Bucket> = (0..=current_hour)
                .map(|h| Bucket::new(format!("{:02}:00", h)))
                .collect();

            for sale in sales {
                let local = sale.sale_date.with_timezone(&tz);
                if local.date_naive() != today {
                    continue;
                }
                let hour = local.hour() as usize;
                if hour <= current_hour {
                    buckets[hour].revenue += sale.total_price();
                    buckets[hour].costs += sale.cost();
                }
            }
            // Expenses skipped: date precision only.
            buckets
        }

        Period::Weekly => {
            let start = today - Duration::days(6);
            let mut buckets: Vec<Bucket> = (0..7)
                .map(|i| {
                    let date = start + Duration::days(i);
                    let weekday = date.weekday().num_days_from_sunday() as usize;
                    Bucket::new(PT_WEEKDAYS[weekday].to_string())
                })
                .collect();

            for sale in sales {
                let date = sale.sale_date.with_timezone(&tz).date_naive();
                let offset = (date - start).num_days();
                if (0..7).contains(&offset) {
                    buckets[offset as usize].revenue += sale.total_price();
                    buckets[offset as usize].costs += sale.cost();
                }
            }
            for expense in expenses {
                let offset = (expense.expense_date - start).num_days();
                if (0..7).contains(&offset) {
                    buckets[offset as usize].costs += expense.amount();
                }
            }
            buckets
        }

        Period::Monthly => {
            let start_ord = month_ordinal(today.year(), today.month0()) - 5;
            let mut buckets: Vec<Bucket> = (0..6)
                .map(|i| {
                    let month0 = (start_ord + i).rem_euclid(12) as usize;
                    Bucket::new(PT_MONTHS[month0].to_string())
                })
                .collect();

            for sale in sales {
                let local = sale.sale_date.with_timezone(&tz);
                let offset = month_ordinal(local.year(), local.month0()) - start_ord;
                if (0..6).contains(&offset) {
                    buckets[offset as usize].revenue += sale.total_price();
                    buckets[offset as usize].costs += sale.cost();
                }
            }
            for expense in expenses {
                let offset =
                    month_ordinal(expense.expense_date.year(), expense.expense_date.month0())
                        - start_ord;
                if (0..6).contains(&offset) {
                    buckets[offset as usize].costs += expense.amount();
                }
            }
            buckets
        }
    };

    // Profit settles only after every revenue/cost contribution landed.
    buckets
        .drain(..)
        .map(|b| SeriesPoint {
            label: b.label,
            revenue: b.revenue,
            profit: b.revenue - b.costs,
            costs: b.costs,
        })
        .collect()
}

// =============================================================================
// Breakdowns
// =============================================================================

/// Current-month sales grouped by product category.
///
/// Sales whose product was deleted fall back to the
/// [`FALLBACK_CATEGORY`] (`outros`) group.
pub fn sales_by_category<Tz: TimeZone>(
    sales: &[Sale],
    products: &[Product],
    as_of: DateTime<Tz>,
) -> BTreeMap<String, BreakdownEntry> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut out: BTreeMap<String, BreakdownEntry> = BTreeMap::new();
    for sale in sales.iter().filter(|s| in_month(s.sale_date, &as_of)) {
        let category = sale
            .product_id
            .as_deref()
            .and_then(|id| by_id.get(id))
            .map(|p| p.category.clone())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

        let entry = out.entry(category).or_insert_with(BreakdownEntry::zero);
        entry.total += sale.total_price();
        entry.profit += sale.profit();
        entry.count += sale.quantity;
    }
    out
}

/// Current-month sales grouped by payment method.
pub fn sales_by_payment_method<Tz: TimeZone>(
    sales: &[Sale],
    as_of: DateTime<Tz>,
) -> BTreeMap<PaymentMethod, BreakdownEntry> {
    let mut out = BTreeMap::new();
    for sale in sales.iter().filter(|s| in_month(s.sale_date, &as_of)) {
        let entry = out
            .entry(sale.payment_method)
            .or_insert_with(BreakdownEntry::zero);
        entry.total += sale.total_price();
        entry.profit += sale.profit();
        entry.count += sale.quantity;
    }
    out
}

// =============================================================================
// Ranking
// =============================================================================

/// Top products of the current month by accumulated profit, descending,
/// truncated to `limit`. Ties keep accumulation order (stable sort).
///
/// Sales whose product was deleted group under a single
/// [`REMOVED_PRODUCT_LABEL`] entry.
pub fn top_products<Tz: TimeZone>(
    sales: &[Sale],
    products: &[Product],
    limit: usize,
    as_of: DateTime<Tz>,
) -> Vec<ProductRank> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut ranks: Vec<ProductRank> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sale in sales.iter().filter(|s| in_month(s.sale_date, &as_of)) {
        let key = sale.product_id.clone().unwrap_or_default();
        let slot = match index.get(&key) {
            Some(slot) => *slot,
            None => {
                let name = by_id
                    .get(key.as_str())
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| REMOVED_PRODUCT_LABEL.to_string());
                ranks.push(ProductRank {
                    id: key.clone(),
                    name,
                    quantity: 0,
                    profit: Money::zero(),
                });
                index.insert(key, ranks.len() - 1);
                ranks.len() - 1
            }
        };
        ranks[slot].quantity += sale.quantity;
        ranks[slot].profit += sale.profit();
    }

    ranks.sort_by(|a, b| b.profit.cmp(&a.profit));
    ranks.truncate(limit);
    ranks
}

// =============================================================================
// Helpers
// =============================================================================

/// True when the timestamp falls in the calendar month containing `as_of`,
/// evaluated in `as_of`'s timezone.
fn in_month<Tz: TimeZone>(ts: DateTime<chrono::Utc>, as_of: &DateTime<Tz>) -> bool {
    let local = ts.with_timezone(&as_of.timezone());
    local.year() == as_of.year() && local.month() == as_of.month()
}

fn month_ordinal(year: i32, month0: u32) -> i64 {
    year as i64 * 12 + month0 as i64
}

// =============================================================================
// Unit Tests
// =============================================================================
