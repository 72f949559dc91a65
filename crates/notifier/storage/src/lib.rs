//! Notifier Storage Layer
//!
//! The narrow target-store and credential-store contracts, an in-memory
//! implementation, and a diesel/SQLite implementation.

mod error;
mod memory;
mod models;
mod schema;
mod sqlite;
mod traits;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStorage;
pub use traits::*;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
