//! # Domain Types
//!
//! Core domain types used throughout Mercado Gestor.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────────┐     │
//! │  │   Product     │   │     Sale      │   │     Expense       │     │
//! │  │  ───────────  │   │  ───────────  │   │  ───────────────  │     │
//! │  │  id (UUID)    │   │  id (UUID)    │   │  id (UUID)        │     │
//! │  │  category     │   │  product_id?  │   │  amount_cents     │     │
//! │  │  *_price_cents│   │  snapshots    │   │  expense_date     │     │
//! │  │  stock/min    │   │  profit_cents │   │  (date, no time)  │     │
//! │  └───────────────┘   └───────────────┘   └───────────────────┘     │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────────┐     │
//! │  │ PaymentMethod │   │   PlanType    │   │   Subscription    │     │
//! │  │  Dinheiro     │   │  Monthly      │   │  user_id (UNIQUE) │     │
//! │  │  Pix          │   │  Quarterly    │   │  status           │     │
//! │  │  Credito      │   │  Yearly       │   │  expires_at       │     │
//! │  │  Debito       │   └───────────────┘   └───────────────────┘     │
//! │  └───────────────┘                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are raw integer cents (`*_cents: i64`) so rows map
//! directly onto database columns; [`Money`] accessors wrap them for
//! arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default user ID for the single-user runtime.
///
/// The schema keeps a `user_id` column on every row for parity with the
/// hosted store's per-user isolation; this constant fills it until real
/// session wiring lands.
pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

// =============================================================================
// Categories
// =============================================================================

/// The 11 built-in product category slugs and their display labels.
///
/// Products may also carry a user-defined category name (managed through
/// the categories table); those fall through [`category_label`] unchanged.
pub const FIXED_CATEGORIES: &[(&str, &str)] = &[
    ("bebidas", "Bebidas"),
    ("laticinios", "Laticínios"),
    ("carnes", "Carnes"),
    ("frutas_verduras", "Frutas e Verduras"),
    ("padaria", "Padaria"),
    ("limpeza", "Limpeza"),
    ("higiene", "Higiene"),
    ("congelados", "Congelados"),
    ("graos_cereais", "Grãos e Cereais"),
    ("enlatados", "Enlatados"),
    ("outros", "Outros"),
];

/// Category assigned to sales whose product was deleted, and the default
/// for new products.
pub const FALLBACK_CATEGORY: &str = "outros";

/// Returns the display label for a category slug.
///
/// Custom categories are their own label.
pub fn category_label(slug: &str) -> &str {
    FIXED_CATEGORIES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, label)| *label)
        .unwrap_or(slug)
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Wire names are the lowercase Portuguese slugs stored in the database
/// (`dinheiro`, `pix`, `credito`, `debito`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Dinheiro,
    /// Instant bank transfer (PIX).
    Pix,
    /// Credit card.
    Credito,
    /// Debit card.
    Debito,
}

impl PaymentMethod {
    /// Display label for charts and receipts.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "Dinheiro",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Credito => "Crédito",
            PaymentMethod::Debito => "Débito",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Dinheiro
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning user.
    pub user_id: String,

    /// Display name.
    pub name: String,

    /// Category slug: one of [`FIXED_CATEGORIES`] or a custom category name.
    pub category: String,

    /// Purchase cost in cents.
    pub cost_price_cents: i64,

    /// Selling price in cents. Conceptually >= cost price, not enforced.
    pub sale_price_cents: i64,

    /// Optional supplier reference.
    pub supplier_id: Option<String>,

    /// Units currently in stock. Never negative.
    pub stock_quantity: i64,

    /// Threshold at or below which the product counts as low stock.
    pub min_stock: i64,

    /// Date the product entered the catalog.
    #[ts(as = "String")]
    pub entry_date: NaiveDate,

    /// Optional expiry date for perishables.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Free-text notes.
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Cost price as [`Money`].
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Sale price as [`Money`].
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// True when stock is at or below the minimum threshold (inclusive).
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// Prices are snapshotted at sale time so later product edits never alter
/// historical sales. `product_id` goes `None` when the product is deleted;
/// the sale survives as an orphan.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub product_id: Option<String>,
    /// Units sold. At least 1, bounded by stock at creation time.
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Product cost at time of sale (frozen).
    pub cost_price_cents: i64,
    /// `unit_price * quantity`.
    pub total_price_cents: i64,
    /// `(unit_price - cost_price) * quantity`.
    pub profit_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Product cost attributed to this sale (`total - profit`).
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.total_price_cents - self.profit_cents)
    }
}

/// A sale expanded with its product (foreign-key expansion).
///
/// `product` is `None` when the product was deleted after the sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithProduct {
    pub sale: Sale,
    pub product: Option<Product>,
}

// =============================================================================
// Expense
// =============================================================================

/// A standalone expense. Affects only aggregated profit; never touches
/// products or sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount_cents: i64,
    /// Free-form label, not a product category.
    pub category: String,
    /// Date only; expenses carry no time component.
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Category / Supplier
// =============================================================================

/// A user-defined product category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Subscription
// =============================================================================

/// Subscription billing period.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Quarterly,
    Yearly,
}

impl PlanType {
    /// Subscription length granted by the payment collaborator.
    pub const fn days(&self) -> i64 {
        match self {
            PlanType::Monthly => 30,
            PlanType::Quarterly => 90,
            PlanType::Yearly => 365,
        }
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            PlanType::Monthly => "Mensal",
            PlanType::Quarterly => "Trimestral",
            PlanType::Yearly => "Anual",
        }
    }
}

/// Persisted subscription status.
///
/// `Active` rows can still be past `expires_at`; the gating derivation in
/// [`crate::access`] checks the timestamp, not just this flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

/// A subscription row.
///
/// Written exclusively by the external payment collaborator (single-row
/// upsert per user); read-only from the application's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
