//! # salon-core: Pure Business Logic for Salon POS
//!
//! Pricing, settlement planning, receipts, history and reports for a salon
//! front desk. Everything here is a pure function of its inputs: no
//! database, no network, no clock reads.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Salon POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front desk UI (out of tree)                     │   │
//! │  │   Customer ──► Services ──► Staff ──► Discounts ──► Payment     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 salon-service (orchestration)                   │   │
//! │  │   checkout, deletion + authorization, history, reports, config │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ salon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   money ─► discount ─► cart ─► pricing ─► settlement ─► receipt │   │
//! │  │   history        reports        auth        validation          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    salon-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic
//! - [`discount`] - Percentage / amount discounts and the line resolver
//! - [`cart`] - The in-progress sale
//! - [`pricing`] - Aggregation, overall discount, proportional allocation
//! - [`settlement`] - Checkout preconditions and per-unit rows
//! - [`receipt`] - Structured receipt and text renderer
//! - [`history`] - Logical sales, filtering, CSV export
//! - [`reports`] - Revenue, staff, payment and service aggregations
//! - [`auth`] - Re-authentication cooldown window
//! - [`types`] - Domain types (Customer, Staff, Service, SaleUnit, ...)
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use salon_core::{Cart, Customer, Discount, Money, Percent, Service, Staff};
//! use salon_core::settlement::plan_settlement;
//!
//! let now = Utc::now();
//! let haircut = Service { id: "svc-a".into(), name: "Haircut".into(), price_cents: 10_000, created_at: now };
//! let massage = Service { id: "svc-b".into(), name: "Head Massage".into(), price_cents: 5_000, created_at: now };
//! let stylist = Staff { id: "stf-1".into(), name: "Asha".into(), created_at: now };
//!
//! let mut cart = Cart::new();
//! cart.select_customer(Customer { id: "cus-1".into(), name: "Meera".into(), contact: None, created_at: now });
//! cart.add_service(&haircut, 2).unwrap();
//! cart.add_service(&massage, 1).unwrap();
//! cart.assign_staff("svc-a", &stylist).unwrap();
//! cart.assign_staff("svc-b", &stylist).unwrap();
//! cart.set_line_discount("svc-b", Discount::Percentage(Percent::from_bps(1_000))).unwrap();
//! cart.set_overall_discount(Discount::Amount(Money::from_cents(2_000)));
//!
//! let plan = plan_settlement(&cart, now).unwrap();
//! assert_eq!(plan.rows.len(), 3);
//! assert_eq!(plan.grand_total().cents(), 22_500);
//! assert_eq!(plan.rows_total(), plan.grand_total());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cart;
pub mod discount;
pub mod error;
pub mod history;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod reports;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use discount::Discount;
pub use error::{CoreError, CoreResult, DiscountRangeError, ValidationError};
pub use money::Money;
pub use pricing::{CartTotals, PricedCart};
pub use settlement::{CompletedSaleSummary, SettlementPlan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines (distinct services) in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single service in the cart.
///
/// Catches typos such as 100 instead of 1.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest catalog price in minor units (10 billion at two decimals).
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_CART_LINES`] this keeps every cart
/// sum far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// How long a correct admin passphrase stays valid (5 minutes).
pub const DEFAULT_AUTH_COOLDOWN_SECS: i64 = 300;

/// Longest allowed admin cooldown (one day).
pub const MAX_AUTH_COOLDOWN_SECS: i64 = 86_400;
