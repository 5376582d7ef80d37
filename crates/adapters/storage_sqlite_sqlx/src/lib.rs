//! # homelog-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ReadingStore` port defined in `homelog-app::ports`
//! - Own the single writer connection to the database file
//! - Create the `value` table the first time an empty database is opened
//! - Batch writes into explicit transactions committed on `flush`
//!
//! ## Dependency rule
//! Depends on `homelog-app` (for port traits) and `homelog-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod store;

pub use error::StorageError;
pub use store::{Config, SqliteReadingStore};
