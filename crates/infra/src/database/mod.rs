//! Database implementations

pub mod instance_repository;
pub mod manager;

pub use instance_repository::SqliteInstanceRepository;
pub use manager::{DbManager, SqliteConnection, SqlitePool};
