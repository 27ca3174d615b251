//! # Expense Repository
//!
//! Standalone expenses. They only affect aggregated profit; products and
//! sales never see them. Expenses carry a date, not a timestamp, so every
//! range filter here is a date-only comparison.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mercado_core::validation;
use mercado_core::{CoreError, Expense, DEFAULT_USER_ID};

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: i64,
    /// Free-form label; defaults to "geral" when empty.
    pub category: Option<String>,
    pub expense_date: NaiveDate,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense and returns the stored row.
    pub async fn create(&self, input: NewExpense) -> DbResult<Expense> {
        validation::validate_description(&input.description).map_err(CoreError::from)?;
        validation::validate_amount_cents("amount", input.amount_cents)
            .map_err(CoreError::from)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            description: input.description.trim().to_string(),
            amount_cents: input.amount_cents,
            category: input
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "geral".to_string()),
            expense_date: input.expense_date,
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, amount = expense.amount_cents, "Inserting expense");

        sqlx::query(
            "INSERT INTO expenses (id, user_id, description, amount_cents, category, expense_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&expense.id)
        .bind(&expense.user_id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(&expense.category)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists expenses, optionally bounded by an inclusive date range,
    /// newest first.
    pub async fn list(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<Vec<Expense>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, user_id, description, amount_cents, category, expense_date, created_at
             FROM expenses",
        );

        if let Some(start) = start {
            query.push(" WHERE expense_date >= ").push_bind(start);
            if let Some(end) = end {
                query.push(" AND expense_date <= ").push_bind(end);
            }
        } else if let Some(end) = end {
            query.push(" WHERE expense_date <= ").push_bind(end);
        }

        query.push(" ORDER BY expense_date DESC, created_at DESC");

        let expenses = query.build_query_as::<Expense>().fetch_all(&self.pool).await?;
        Ok(expenses)
    }

    /// Expenses of the calendar month containing `now`.
    pub async fn month_to_date(&self, now: DateTime<Utc>) -> DbResult<Vec<Expense>> {
        let month_start = now
            .date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive());
        self.list(Some(month_start), None).await
    }

    /// Deletes an expense.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
