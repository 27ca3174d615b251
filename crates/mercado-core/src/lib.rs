//! # mercado-core: Pure Business Logic for Mercado Gestor
//!
//! This crate is the heart of Mercado Gestor. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Mercado Gestor Architecture                      │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard Frontend (React/TS)               │   │
//! │  │   Catálogo ──► Vendas ──► Relatórios ──► Planos             │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │              ★ mercado-core (THIS CRATE) ★                  │   │
//! │  │                                                             │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │  │  types  │ │  money  │ │ metrics │ │ access │ │ quick_ │ │   │
//! │  │  │ Product │ │  Money  │ │ buckets │ │ gating │ │  sale  │ │   │
//! │  │  │  Sale   │ │ (cents) │ │rankings │ │ trial  │ │ parser │ │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────┘ └────────┘ │   │
//! │  │                                                             │   │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS         │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │                mercado-db (Database Layer)                  │   │
//! │  │        SQLite queries, transactions, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Expense, Subscription, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`metrics`] - Dashboard summary, chart series, breakdowns, rankings
//! - [`access`] - Subscription/trial gating state machine
//! - [`quick_sale`] - Free-text quick-sale parser
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, clocks passed in as parameters
//! 2. **No I/O**: database, network, and file system access are forbidden
//! 3. **Integer Money**: monetary values are centavos (`i64`), never floats
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mercado_core::money::Money;
//! use mercado_core::quick_sale;
//!
//! let price = Money::from_cents(549); // R$ 5,49
//! assert_eq!(price.multiply_quantity(2).cents(), 1098);
//!
//! let parsed = quick_sale::parse("Leite - 2 pix").unwrap();
//! assert_eq!(parsed.quantity, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod metrics;
pub mod money;
pub mod quick_sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mercado_core::Money` instead of
// `use mercado_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
