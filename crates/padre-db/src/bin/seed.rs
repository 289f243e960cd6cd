//! # Seed Data Generator
//!
//! Populates a database with sample products and orders for development.
//!
//! ## Usage
//! ```bash
//! # 200 products and 200 orders (default)
//! cargo run -p padre-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p padre-db --bin seed -- --count 1000 --db ./data/padre.db
//!
//! # More logging
//! RUST_LOG=padre_db=debug cargo run -p padre-db --bin seed
//! ```
//!
//! `PADRE_DB_PATH` overrides the default path when `--db` is not given.

use std::env;

use padre_core::{Order, OrderStatus, Product};
use padre_db::{Database, DbConfig, EntityStore, PageRequest};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Product families and their base prices in cents
const FAMILIES: &[(&str, &str, i64)] = &[
    ("WDG", "Widget", 250),
    ("GDG", "Gadget", 1299),
    ("SPR", "Sprocket", 75),
    ("GIZ", "Gizmo", 4999),
    ("DOO", "Doohickey", 599),
];

const COLOURS: &[&str] = &["Red", "Blue", "Green", "Black", "White"];

const STATUSES: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Paid,
    OrderStatus::Shipped,
    OrderStatus::Cancelled,
];

const DEFAULT_COUNT: usize = 200;
const DEFAULT_DB_PATH: &str = "./padre_dev.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut db_path = env::var("PADRE_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(DEFAULT_COUNT);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Padre Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Products and orders to generate (default: {DEFAULT_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: $PADRE_DB_PATH or {DEFAULT_DB_PATH})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let products = db.products();
    let orders = db.orders();

    let existing = products.count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let batch: Vec<Product> = (0..count).map(generate_product).collect();
    let saved = products.save_all(batch).await?;
    info!(count = saved.len(), "Products saved");

    let batch: Vec<Order> = (0..count).map(generate_order).collect();
    let saved = orders.save_all(batch).await?;
    info!(count = saved.len(), "Orders saved");

    info!(elapsed = ?start.elapsed(), "Seed complete");

    let first_page = orders.find_page(PageRequest::new(0, 5)).await?;
    for order in &first_page.items {
        info!(
            id = ?order.id,
            reference = %order.reference,
            status = ?order.status,
            total_cents = order.total_cents,
            "Sample order"
        );
    }
    info!(
        products = products.count().await?,
        orders = first_page.total,
        pages = first_page.total_pages(),
        "Row counts"
    );

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Default: INFO, with sqlx statements at WARN.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,padre_db=info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Deterministic product for position `seed`.
fn generate_product(seed: usize) -> Product {
    let (code, family, base_price) = FAMILIES[seed % FAMILIES.len()];
    let colour = COLOURS[(seed / FAMILIES.len()) % COLOURS.len()];

    let sku = format!("{code}-{seed:05}");
    let name = format!("{colour} {family}");
    let price_cents = base_price + ((seed * 37) % 500) as i64;

    Product::new(sku, name, price_cents)
}

/// Deterministic order for position `seed`.
fn generate_order(seed: usize) -> Order {
    let mut order = Order::new(
        format!("customer{:03}@example.com", seed % 50),
        1_000 + ((seed * 113) % 20_000) as i64,
    );
    order.status = STATUSES[seed % STATUSES.len()];
    order
}
