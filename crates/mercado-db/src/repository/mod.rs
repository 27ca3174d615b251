//! # Repository Implementations
//!
//! One repository per collection, each a thin struct over the shared
//! [`sqlx::SqlitePool`]:
//!
//! - [`product`] - catalog CRUD, low-stock and expiry views
//! - [`category`] - user-defined categories
//! - [`supplier`] - product suppliers
//! - [`sale`] - the sale transaction processor (stock-consistent
//!   create/delete/update, quick sale)
//! - [`expense`] - standalone expenses
//! - [`subscription`] - subscription rows and gating state
//! - [`trial`] - write-once trial markers
//! - [`report`] - metric queries delegating to `mercado_core::metrics`

pub mod category;
pub mod expense;
pub mod product;
pub mod report;
pub mod sale;
pub mod subscription;
pub mod supplier;
pub mod trial;
