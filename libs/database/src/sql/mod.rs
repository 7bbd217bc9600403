//! SeaORM connection management and migration running.

mod config;
mod connector;

pub use config::DatabaseConfig;
pub use connector::{connect, connect_with_retry, run_migrations};

pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
pub use sea_orm_migration::MigratorTrait;
