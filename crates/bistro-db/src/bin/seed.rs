//! # Seed Data Generator
//!
//! Populates the database with a small demo restaurant for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bistro_dev.db (default)
//! cargo run -p bistro-db --bin seed
//!
//! # Specify database path
//! cargo run -p bistro-db --bin seed -- --db ./data/bistro.db
//! ```
//!
//! ## Generated Data
//! - Staff accounts (admin / manager / cashier / waiter / kitchen),
//!   all with the password `bistro123`
//! - 8 dining tables across two zones
//! - Stock items with on-hand quantities and reorder levels
//! - A short menu with recipes wired to the stock items, plus a few
//!   recipe-less items (fountain drinks) the consumption engine skips

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use std::env;

use bistro_core::{DiningTable, MenuItem, StockItem, User, UserRole};
use bistro_db::{Database, DbConfig};
use uuid::Uuid;

const DEMO_PASSWORD: &str = "bistro123";

/// (username, display name, role)
const STAFF: &[(&str, &str, UserRole)] = &[
    ("admin", "Administrator", UserRole::Admin),
    ("maria", "Maria Rodriguez", UserRole::Manager),
    ("ana", "Ana Petrov", UserRole::Cashier),
    ("sam", "Sam Okafor", UserRole::Waiter),
    ("luis", "Luis Chen", UserRole::Kitchen),
];

/// (name, zone, seats)
const TABLES: &[(&str, &str, i64)] = &[
    ("T1", "main", 2),
    ("T2", "main", 4),
    ("T3", "main", 4),
    ("T4", "main", 6),
    ("T5", "main", 8),
    ("P1", "patio", 2),
    ("P2", "patio", 4),
    ("P3", "patio", 4),
];

/// (name, unit, on-hand qty, unit cost cents, reorder level)
const STOCK: &[(&str, &str, i64, i64, Option<i64>)] = &[
    ("Ground Beef", "lb", 40, 450, Some(10)),
    ("Burger Bun", "pcs", 96, 35, Some(24)),
    ("Cheddar Slice", "pcs", 120, 20, Some(40)),
    ("Lettuce Head", "pcs", 18, 120, Some(6)),
    ("Tomato", "pcs", 30, 45, Some(10)),
    ("Potato", "lb", 50, 80, Some(15)),
    ("Chicken Breast", "lb", 25, 520, Some(8)),
    ("Tortilla", "pcs", 60, 25, Some(20)),
    ("Coffee Beans", "lb", 12, 1100, Some(4)),
];

/// (name, category, price cents, tax bps, recipe: (stock name, milli per unit))
const MENU: &[(&str, &str, i64, u32, &[(&str, i64)])] = &[
    (
        "Classic Burger",
        "mains",
        1099,
        825,
        &[
            ("Ground Beef", 250),
            ("Burger Bun", 1000),
            ("Lettuce Head", 100),
            ("Tomato", 500),
        ],
    ),
    (
        "Cheeseburger",
        "mains",
        1249,
        825,
        &[
            ("Ground Beef", 250),
            ("Burger Bun", 1000),
            ("Cheddar Slice", 2000),
            ("Lettuce Head", 100),
        ],
    ),
    (
        "Chicken Tacos",
        "mains",
        1149,
        825,
        &[
            ("Chicken Breast", 330),
            ("Tortilla", 3000),
            ("Tomato", 500),
            ("Lettuce Head", 150),
        ],
    ),
    ("Fries", "sides", 399, 825, &[("Potato", 500)]),
    ("Side Salad", "sides", 449, 825, &[("Lettuce Head", 250), ("Tomato", 1000)]),
    ("Coffee", "drinks", 299, 825, &[("Coffee Beans", 40)]),
    // No recipe: inventory untouched when these sell
    ("Fountain Soda", "drinks", 249, 825, &[]),
    ("Iced Tea", "drinks", 279, 825, &[]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bistro_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bistro POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bistro_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bistro POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} active user(s)", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let argon2 = Argon2::default();

    println!();
    println!("Creating staff accounts (password: {})...", DEMO_PASSWORD);
    for (username, display_name, role) in STAFF {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(DEMO_PASSWORD.as_bytes(), &salt)
            .map_err(|e| format!("password hashing failed: {}", e))?
            .to_string();

        db.users()
            .insert(&User {
                id: Uuid::new_v4().to_string(),
                username: username.to_string(),
                display_name: display_name.to_string(),
                password_hash,
                role: *role,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        println!("  {} ({})", username, role);
    }

    println!();
    println!("Creating dining tables...");
    for (name, zone, seats) in TABLES {
        db.tables()
            .insert(&DiningTable {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                zone: Some(zone.to_string()),
                seats: *seats,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("  {} tables", TABLES.len());

    println!();
    println!("Creating stock items...");
    let mut stock_ids = std::collections::HashMap::new();
    for (name, unit, qty, cost, reorder) in STOCK {
        let id = Uuid::new_v4().to_string();
        db.stock()
            .insert(&StockItem {
                id: id.clone(),
                name: name.to_string(),
                unit: unit.to_string(),
                on_hand_qty: *qty,
                unit_cost_cents: *cost,
                reorder_level: *reorder,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        stock_ids.insert(*name, id);
        println!("  {} ({} {})", name, qty, unit);
    }

    println!();
    println!("Creating menu with recipes...");
    for (name, category, price_cents, tax_rate_bps, recipe) in MENU {
        let menu_item_id = Uuid::new_v4().to_string();
        db.menu()
            .insert(&MenuItem {
                id: menu_item_id.clone(),
                name: name.to_string(),
                category: category.to_string(),
                price_cents: *price_cents,
                tax_rate_bps: *tax_rate_bps,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        if !recipe.is_empty() {
            let entries: Vec<(String, i64)> = recipe
                .iter()
                .map(|(stock_name, milli)| (stock_ids[stock_name].clone(), *milli))
                .collect();
            db.menu().replace_recipe(&menu_item_id, &entries).await?;
        }

        println!("  {} ({} ingredients)", name, recipe.len());
    }

    println!();
    println!("✓ Seed complete!");
    println!("  Log in as admin / {}", DEMO_PASSWORD);

    Ok(())
}
