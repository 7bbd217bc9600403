//! Relational store plumbing shared by the services in the workspace.
//!
//! Wraps SeaORM connection setup: pool configuration loaded from the
//! environment, connecting with exponential backoff, and running a
//! migrator before the service starts taking traffic.
//!
//! Any backend SeaORM was built with can be targeted through the URL; the
//! services use PostgreSQL and the tests use in-memory SQLite.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::sql::{DatabaseConfig, connect_with_retry, run_migrations};
//! use migration::Migrator;
//!
//! let config = DatabaseConfig::from_env()?;
//! let db = connect_with_retry(&config, None).await?;
//! run_migrations::<Migrator>(&db, "todo").await?;
//! ```

pub mod common;
pub mod sql;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
