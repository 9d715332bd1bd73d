//! # Repository Module
//!
//! Database repository implementations for Salon POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  salon-service                                                         │
//! │       │                                                                 │
//! │       │  db.customers().search("mee", 20)                              │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, customer)                                           │
//! │  ├── update(&self, customer)                                           │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customer CRUD and search
//! - [`staff::StaffRepository`] - Staff roster CRUD
//! - [`service::ServiceRepository`] - Service catalog CRUD
//! - [`sale_unit::SaleUnitRepository`] - Per-unit sale rows, batches, history reads
//! - [`settings::SettingsRepository`] - Key/value settings

use uuid::Uuid;

pub mod customer;
pub mod sale_unit;
pub mod service;
pub mod settings;
pub mod staff;

/// Generates a new row id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Escapes `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mee"), "%mee%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_generate_id_is_uuid() {
        let id = generate_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, generate_id());
    }
}
