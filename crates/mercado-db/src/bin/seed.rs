//! # Seed Data Generator
//!
//! Populates the database with sample catalog, sales, and expense data for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./data/mercado.db)
//! cargo run -p mercado-db --bin seed
//!
//! # Custom path
//! cargo run -p mercado-db --bin seed -- --db ./data/dev.db
//! ```

use std::env;

use chrono::{Duration, Utc};
use tracing::info;

use mercado_core::{PaymentMethod, PlanType, DEFAULT_USER_ID};
use mercado_db::{Database, DbConfig, NewExpense, NewProduct};

/// Sample catalog: (name, category, cost cents, sale cents, stock, min).
const PRODUCTS: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("Leite Integral 1L", "laticinios", 350, 599, 48, 12),
    ("Queijo Minas 500g", "laticinios", 1400, 2290, 9, 4),
    ("Pão Francês kg", "padaria", 650, 1190, 25, 8),
    ("Arroz Branco 5kg", "graos_cereais", 1800, 2690, 30, 10),
    ("Feijão Preto 1kg", "graos_cereais", 550, 899, 35, 10),
    ("Coca-Cola 2L", "bebidas", 550, 999, 60, 20),
    ("Suco de Laranja 1L", "bebidas", 400, 749, 18, 6),
    ("Sabão em Pó 1kg", "limpeza", 700, 1249, 14, 5),
    ("Detergente 500ml", "limpeza", 120, 279, 40, 15),
    ("Papel Higiênico 12un", "higiene", 900, 1590, 22, 8),
    ("Frango Congelado kg", "congelados", 800, 1399, 16, 6),
    ("Milho Enlatado 200g", "enlatados", 180, 349, 3, 6),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./data/mercado.db".to_string());

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let today = Utc::now().date_naive();
    let mut product_ids = Vec::new();

    for (name, category, cost, sale, stock, min_stock) in PRODUCTS {
        let product = db
            .products()
            .create(NewProduct {
                name: (*name).to_string(),
                category: (*category).to_string(),
                cost_price_cents: *cost,
                sale_price_cents: *sale,
                supplier_id: None,
                stock_quantity: *stock,
                min_stock: *min_stock,
                entry_date: today,
                expiry_date: None,
                notes: None,
            })
            .await?;
        product_ids.push(product.id);
    }
    info!(count = product_ids.len(), "Products created");

    // A handful of sales spread over the payment methods.
    let methods = [
        PaymentMethod::Dinheiro,
        PaymentMethod::Pix,
        PaymentMethod::Credito,
        PaymentMethod::Debito,
    ];
    let mut sale_count = 0;
    for (i, product_id) in product_ids.iter().enumerate().take(8) {
        let quantity = (i as i64 % 3) + 1;
        let method = methods[i % methods.len()];
        db.sales().create_sale(product_id, quantity, method).await?;
        sale_count += 1;
    }
    info!(count = sale_count, "Sales recorded");

    for (description, cents, days_ago) in [
        ("Conta de luz", 18500, 2),
        ("Aluguel do ponto", 120000, 5),
        ("Frete de mercadorias", 7500, 0),
    ] {
        db.expenses()
            .create(NewExpense {
                description: description.to_string(),
                amount_cents: cents,
                category: None,
                expense_date: today - Duration::days(days_ago),
            })
            .await?;
    }
    info!("Expenses recorded");

    db.subscriptions()
        .upsert(DEFAULT_USER_ID, PlanType::Monthly, Utc::now())
        .await?;
    db.trial_markers().init(DEFAULT_USER_ID, Utc::now()).await?;
    info!("Subscription and trial marker seeded");

    let metrics = db.reports().dashboard_metrics(Utc::now()).await?;
    info!(
        revenue = %metrics.total_revenue,
        profit = %metrics.total_profit,
        low_stock = metrics.low_stock_count,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Reads `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}
