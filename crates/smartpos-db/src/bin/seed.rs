//! # Seed Data Generator
//!
//! Populates a database with a demo business ready to ring up sales.
//!
//! ## Usage
//! ```bash
//! # Seed ./smartpos_dev.db with 40 products (default)
//! cargo run -p smartpos-db --bin seed
//!
//! # Custom product count and database path
//! cargo run -p smartpos-db --bin seed -- --count 200 --db ./data/smartpos.db
//! ```
//!
//! ## Generated Data
//! - One business and one cashier, linked to identity subject `demo-cashier`
//! - Products across a few categories, priced $0.50 - $25.00
//! - One customer with a $500.00 credit limit
//! - An OPEN cash session for the cashier with a $50.00 float
//!
//! Prints the generated ids as JSON so they can be pasted into requests.

use std::env;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use smartpos_core::{Customer, Money, Product, User};
use smartpos_db::repository::product::generate_product_id;
use smartpos_db::{Database, DbConfig};

/// Product categories for demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEB",
        &["Agua 500ml", "Cola 1L", "Jugo Naranja", "Cafe Molido", "Te Verde"],
    ),
    (
        "ABA",
        &["Arroz 1kg", "Azucar 1kg", "Aceite 1L", "Fideos 500g", "Atun Lata"],
    ),
    (
        "LAC",
        &["Leche Entera", "Queso Fresco", "Yogurt Fresa", "Mantequilla", "Huevos x12"],
    ),
    (
        "LIM",
        &["Detergente 1kg", "Jabon Barra", "Cloro 1L", "Papel Higienico", "Esponja"],
    ),
];

/// Identity provider subject the demo cashier is linked to.
const DEMO_AUTH_USER: &str = "demo-cashier";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeedSummary {
    negocio_id: String,
    usuario_id: String,
    auth_user_id: String,
    cliente_id: String,
    caja_id: String,
    productos: Vec<SeededProduct>,
}

#[derive(Debug, Serialize)]
struct SeededProduct {
    id: String,
    sku: String,
    name: String,
    price_cents: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./smartpos_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
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
                println!("SmartPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./smartpos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 SmartPOS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    if db.users().find_by_auth_id(DEMO_AUTH_USER).await?.is_some() {
        println!("⚠ Demo cashier already exists, skipping seed.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Business and cashier
    let business_id = Uuid::new_v4().to_string();
    db.users().insert_business(&business_id, "Tienda Demo").await?;

    let cashier = User {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        auth_user_id: DEMO_AUTH_USER.to_string(),
        name: "Cajero Demo".to_string(),
        email: Some("cajero@demo.local".to_string()),
        is_active: true,
    };
    db.users().insert(&cashier).await?;
    println!("✓ Business and cashier created");

    // Products
    let mut productos = Vec::with_capacity(count);
    let mut seed = 0usize;
    'outer: loop {
        for (code, names) in CATEGORIES {
            for name in names.iter() {
                if productos.len() >= count {
                    break 'outer;
                }
                let product = generate_product(&business_id, code, name, seed, now);
                db.products().insert(&product).await?;
                productos.push(SeededProduct {
                    id: product.id,
                    sku: product.sku.unwrap_or_default(),
                    name: product.name,
                    price_cents: product.price_cents,
                });
                seed += 1;
            }
        }
    }
    println!("✓ Generated {} products", productos.len());

    // Customer with store credit
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        name: "Cliente Frecuente".to_string(),
        phone: Some("0990000000".to_string()),
        national_id: Some("0102030405".to_string()),
        email: None,
        address: None,
        credit_limit_cents: Money::from_major(500).cents(),
        credit_days: Some(15),
        debt_balance_cents: 0,
        points: 0,
        is_active: true,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await?;
    println!("✓ Customer created");

    // Open drawer
    let session = db
        .cash()
        .open_session(&business_id, &cashier.id, Money::from_major(50))
        .await?;
    println!("✓ Cash session opened");

    let summary = SeedSummary {
        negocio_id: business_id,
        usuario_id: cashier.id,
        auth_user_id: cashier.auth_user_id,
        cliente_id: customer.id,
        caja_id: session.id,
        productos,
    };

    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(
    business_id: &str,
    category: &str,
    name: &str,
    seed: usize,
    now: chrono::DateTime<Utc>,
) -> Product {
    // $0.50 - $25.00
    let price_cents = 50 + ((seed * 397) % 2451) as i64;
    // 60-80% of price
    let cost_cents = price_cents * (60 + (seed % 20) as i64) / 100;

    Product {
        id: generate_product_id(),
        business_id: business_id.to_string(),
        sku: Some(format!("{}-{:04}", category, seed)),
        name: name.to_string(),
        cost_cents,
        price_cents,
        stock: (seed % 51) as i64,
        is_active: true,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}
