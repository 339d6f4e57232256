//! # Seed Data Generator
//!
//! Populates a development database with branches, a small wellness
//! catalog, stock levels and a walk-in customer.
//!
//! ## Usage
//! ```bash
//! # Seed ./aurora_dev.db with 10 units of everything per branch
//! cargo run -p aurora-db --bin seed
//!
//! # Custom stock level
//! cargo run -p aurora-db --bin seed -- --stock 50
//!
//! # Specify database path
//! cargo run -p aurora-db --bin seed -- --db ./data/aurora.db
//! ```
//!
//! ## Generated Data
//! - Branches: one company-owned, two managed
//! - Products across Product / Supplement / Skincare, plus Service entries
//!   that never get a stock row
//! - Size variants for skincare, stocked separately
//! - Two bundles mixing goods and a service
//! - One customer with ₱1,000.00 store credit

use std::env;

use aurora_core::{Ownership, SERVICE_CATEGORY};
use aurora_db::repository::{NewCustomer, NewProduct};
use aurora_db::{Database, DbConfig};

const BRANCHES: &[(&str, &str, Ownership)] = &[
    ("BR-MAIN", "Main Clinic", Ownership::CompanyOwned),
    ("BR-NORTH", "North Mall Kiosk", Ownership::Managed),
    ("BR-SOUTH", "South Plaza", Ownership::Managed),
];

/// `(name, category, price in centavos)`
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("Vitamin C 500mg", "Supplement", 15_000),
    ("Fish Oil 1000mg", "Supplement", 45_000),
    ("Zinc Tablets", "Supplement", 12_000),
    ("Collagen Drink", "Supplement", 89_000),
    ("Digital Thermometer", "Product", 35_000),
    ("Face Mask Box", "Product", 18_000),
    ("Alcohol 70%", "Product", 9_500),
    ("Gentle Facial Wash", "Skincare", 32_000),
    ("Sunscreen SPF50", "Skincare", 65_000),
    ("Moisturizer", "Skincare", 48_000),
];

const SERVICES: &[(&str, i64)] = &[
    ("General Consultation", 50_000),
    ("Skin Assessment", 80_000),
    ("Blood Pressure Check", 10_000),
];

/// Size variants added to every skincare product: `(name, price adjustment)`
const SIZES: &[(&str, i64)] = &[("Travel", -10_000), ("Family", 25_000)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut stock: i64 = 10;
    let mut db_path = String::from("./aurora_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(10);
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
                println!("Aurora POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stock <N>    Units per stock row (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./aurora_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Aurora POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Stock:    {} per row", stock);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.branches().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} branches", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name, ownership) in BRANCHES {
        db.branches().insert(id, name, *ownership).await?;
    }
    println!("✓ {} branches", BRANCHES.len());

    let catalog = db.catalog();
    let mut goods = Vec::new();
    let mut variants = Vec::new();

    for (name, category, price) in PRODUCTS {
        let product = catalog
            .insert_product(&NewProduct::new(*name, *category, *price))
            .await?;

        if *category == "Skincare" {
            for (size, adjustment) in SIZES {
                variants.push(catalog.insert_variant(product.id, size, *adjustment).await?);
            }
        }
        goods.push(product);
    }

    let mut services = Vec::new();
    for (name, price) in SERVICES {
        services.push(
            catalog
                .insert_product(&NewProduct::new(*name, SERVICE_CATEGORY, *price).unit("session"))
                .await?,
        );
    }
    println!(
        "✓ {} products, {} variants, {} services",
        goods.len(),
        variants.len(),
        services.len()
    );

    // goods[0] Vitamin C, goods[2] Zinc, goods[7] Facial Wash, goods[8] Sunscreen
    catalog
        .insert_bundle(
            "Immunity Pack",
            50_000,
            &[(goods[0].id, 2), (goods[2].id, 1), (services[2].id, 1)],
        )
        .await?;
    catalog
        .insert_bundle(
            "Skin Starter Kit",
            150_000,
            &[(goods[7].id, 1), (goods[8].id, 1), (services[1].id, 1)],
        )
        .await?;
    println!("✓ 2 bundles");

    let stock_repo = db.stock();
    let mut rows = 0;
    for (branch_id, _, _) in BRANCHES {
        for product in &goods {
            stock_repo.set_product_stock(product.id, branch_id, stock).await?;
            rows += 1;
        }
        for variant in &variants {
            stock_repo.set_variant_stock(variant.id, branch_id, stock).await?;
            rows += 1;
        }
    }
    println!("✓ {} stock rows", rows);

    let customer = db
        .customers()
        .insert(&NewCustomer::new("Juan dela Cruz").store_credit(100_000))
        .await?;
    println!("✓ Customer #{} with {}", customer.id, customer.store_credit());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
