//! # mercado-db: Database Layer for Mercado Gestor
//!
//! SQLite persistence for the retail management core, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Mercado Gestor Data Flow                        │
//! │                                                                     │
//! │  API / IPC layer (outside this repo)                                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                  mercado-db (THIS CRATE)                    │   │
//! │  │                                                             │   │
//! │  │  ┌────────────┐   ┌────────────────┐   ┌────────────────┐  │   │
//! │  │  │  Database  │   │  Repositories  │   │   Migrations   │  │   │
//! │  │  │ (pool.rs)  │◄──│ product, sale, │   │   (embedded)   │  │   │
//! │  │  │ SqlitePool │   │ expense, ...   │   │ 001_initial…   │  │   │
//! │  │  └────────────┘   └────────┬───────┘   └────────────────┘  │   │
//! │  │                           │ reductions                     │   │
//! │  │                           ▼                                │   │
//! │  │                    mercado-core                            │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode, foreign keys on)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercado_db::{Database, DbConfig};
//! use mercado_core::PaymentMethod;
//!
//! let db = Database::new(DbConfig::new("path/to/mercado.db")).await?;
//!
//! // Record a sale (stock decrements in the same transaction)
//! let sale = db.sales().create_sale(&product_id, 2, PaymentMethod::Pix).await?;
//!
//! // Or from free text
//! let sale = db.sales().create_quick_sale("Leite - 2 pix").await?;
//!
//! // Dashboard numbers
//! let metrics = db.reports().dashboard_metrics(chrono::Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::expense::{ExpenseRepository, NewExpense};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::subscription::SubscriptionRepository;
pub use repository::supplier::{NewSupplier, SupplierRepository};
pub use repository::trial::TrialMarkerRepository;
