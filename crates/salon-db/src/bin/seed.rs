//! # Seed Data Generator
//!
//! Populates the database with a demo salon for development.
//!
//! ## Usage
//! ```bash
//! # Catalog plus 50 demo sales (default)
//! cargo run -p salon-db --bin seed
//!
//! # More history for report screens
//! cargo run -p salon-db --bin seed -- --sales 500
//!
//! # Specify database path
//! cargo run -p salon-db --bin seed -- --db ./data/salon.db
//! ```
//!
//! ## Generated Data
//! - A fixed service menu (hair, skin, nails, spa)
//! - A handful of stylists
//! - Customers with phone-number contacts
//! - Demo sales spread over the last 90 days, priced through the same
//!   settlement path the front desk uses

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use salon_core::settlement::plan_settlement;
use salon_core::{Cart, Customer, Discount, Money, PaymentMode, Percent, Service, Staff};
use salon_db::{Database, DbConfig};

/// Service menu: (name, price in minor units)
const SERVICES: &[(&str, i64)] = &[
    ("Haircut", 10_000),
    ("Haircut & Styling", 25_000),
    ("Beard Trim", 8_000),
    ("Hair Colour", 150_000),
    ("Hair Spa", 60_000),
    ("Head Massage", 5_000),
    ("Classic Facial", 80_000),
    ("Threading", 3_000),
    ("Manicure", 40_000),
    ("Pedicure", 50_000),
    ("Full Body Massage", 200_000),
];

const STAFF: &[&str] = &["Asha", "Vikram", "Neha", "Imran", "Priya"];

const CUSTOMERS: &[&str] = &[
    "Meera Nair",
    "Ravi Kumar",
    "Ananya Rao",
    "Farhan Sheikh",
    "Kavya Menon",
    "Rohit Verma",
    "Sneha Iyer",
    "Arjun Das",
    "Pooja Shah",
    "Karan Malhotra",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,salon_db=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 50;
    let mut db_path = String::from("./salon_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(50);
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
                println!("Salon POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of demo sales to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./salon_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Salon POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let status = db.migration_status().await?;
    println!("✓ Connected to database");
    println!("✓ Schema at {}/{} migrations", status.applied, status.embedded);

    let existing = db.services().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} services", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    println!();
    println!("Creating catalog...");

    let mut services = Vec::with_capacity(SERVICES.len());
    for (name, price_cents) in SERVICES {
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            created_at: now,
        };
        services.push(db.services().insert(&service).await?);
    }

    let mut staff = Vec::with_capacity(STAFF.len());
    for name in STAFF {
        let member = Staff {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
        };
        staff.push(db.staff().insert(&member).await?);
    }

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (idx, name) in CUSTOMERS.iter().enumerate() {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            contact: Some(format!("98450 {:05}", 10_000 + idx * 1_111)),
            created_at: now,
        };
        customers.push(db.customers().insert(&customer).await?);
    }

    println!(
        "  {} services, {} staff, {} customers",
        services.len(),
        staff.len(),
        customers.len()
    );

    println!();
    println!("Generating sales...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut units = 0;

    for seed in 0..sales {
        let cart = demo_cart(seed, &services, &staff, &customers)?;
        // Spread over the last 90 days, a few minutes apart within a day
        let date = now - Duration::days((seed % 90) as i64) - Duration::minutes((seed * 37 % 600) as i64);

        let plan = plan_settlement(&cart, date)?;
        match db.sale_units().insert_batch(&plan.rows).await {
            Ok(ids) => {
                generated += 1;
                units += ids.len();
            }
            Err(e) => {
                eprintln!("Failed to write sale {}: {}", seed, e);
                continue;
            }
        }

        if generated % 100 == 0 && generated > 0 {
            println!("  Generated {} sales...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} sales ({} unit rows) in {:?}", generated, units, elapsed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a deterministic cart for the given seed.
fn demo_cart(
    seed: usize,
    services: &[Service],
    staff: &[Staff],
    customers: &[Customer],
) -> Result<Cart, Box<dyn std::error::Error>> {
    let mut cart = Cart::new();
    cart.select_customer(customers[seed % customers.len()].clone());
    cart.set_payment_mode(PaymentMode::ALL[seed % PaymentMode::ALL.len()]);

    let line_count = 1 + seed % 3;
    for offset in 0..line_count {
        let service = &services[(seed * 7 + offset * 3) % services.len()];
        if cart.contains(&service.id) {
            continue;
        }
        let quantity = if offset == 0 { 1 + (seed % 2) as i64 } else { 1 };
        cart.add_service(service, quantity)?;
        cart.assign_staff(&service.id, &staff[(seed + offset) % staff.len()])?;

        if seed % 5 == 0 {
            cart.set_line_discount(&service.id, Discount::Percentage(Percent::from_bps(1_000)))?;
        }
    }

    if seed % 7 == 0 {
        cart.set_overall_discount(Discount::Amount(Money::from_cents(2_000)));
    }

    Ok(cart)
}
