use crate::domain::validation::ValidationErrors;
use sqlx::error::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error("check constraint violation: {0}")]
    CheckViolation(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    /// Input that can only be judged against the live schema, e.g. an unknown column.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// Caller supplied SQL that the engine refused.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A stored row could not be mapped back into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// Constraint failures are surfaced as their own variants so callers can map them without
// string matching on engine messages.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let message = db_err.message().to_string();
            match db_err.kind() {
                ErrorKind::ForeignKeyViolation => return Self::ForeignKeyViolation(message),
                ErrorKind::UniqueViolation => return Self::UniqueViolation(message),
                ErrorKind::CheckViolation => return Self::CheckViolation(message),
                _ => {}
            }
        }
        Self::Database(err)
    }
}
