use core_config::ConfigError;

/// Failure while preparing the database for a service.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("database configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every connection attempt failed; carries the last error.
    #[error("could not connect after {attempts} attempts: {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("migration failed for {app}: {source}")]
    Migration {
        app: String,
        #[source]
        source: sea_orm::DbErr,
    },
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
