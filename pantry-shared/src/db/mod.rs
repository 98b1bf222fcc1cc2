//! Database layer
//!
//! - `pool`: PostgreSQL connection pool with a startup health check
//! - `migrations`: embedded schema migrations
//!
//! Models live in the crate-level `models` module and take a `&PgPool`
//! (or any executor) as their first argument.

pub mod migrations;
pub mod pool;
