//! # looprule-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `RuleRepository` port defined in `looprule-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between rules and database rows; triggers and actions are stored
//!   as tagged JSON records and decoded leniently through the registry
//!
//! ## Dependency rule
//! Depends on `looprule-app` (for port traits) and `looprule-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod rule_repo;

pub use pool::{Config, Database};
pub use rule_repo::SqliteRuleRepository;
