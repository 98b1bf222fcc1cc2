//! # Pantry Shared Library
//!
//! This crate contains the domain types, persistence layer and pure inventory
//! logic used by the Pantry API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT issuance/validation and the request auth context
//! - `db`: Connection pool and migration runner
//! - `inventory`: Stock status, storage breadcrumbs and purchase line totals
//! - `models`: Database models and their ownership-scoped queries
//! - `validation`: Field-level validation errors shared by all models

pub mod auth;
pub mod db;
pub mod inventory;
pub mod models;
pub mod validation;

/// Current version of the Pantry shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
