pub mod category_repository;
pub mod expense_repository;
pub mod statement_builder;
pub mod user_repository;

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Update contains no fields")]
    NothingToUpdate,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::InvalidReference(db_err.message().to_string())
            }
            _ => RepositoryError::DatabaseError(error.to_string()),
        }
    }
}

impl From<statement_builder::EmptyUpdate> for RepositoryError {
    fn from(_: statement_builder::EmptyUpdate) -> Self {
        RepositoryError::NothingToUpdate
    }
}

/// Rows a query may see or touch, decided by the caller's role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// No ownership predicate
    Any,
    /// Only rows whose `owner_id` matches
    Owner(i32),
}
