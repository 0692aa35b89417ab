use thiserror::Error;

/// Failures reported by either store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write collided with a uniqueness constraint: username, citizen id, or
    /// a second document under a single-key collection.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("migration {name} failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn unique(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Lifts driver-level unique violations into [`StoreError::UniqueViolation`]
    /// so callers never have to inspect raw sqlx errors.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::unique(db_err.constraint().unwrap_or("unique"));
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_helper() {
        let err = StoreError::unique("staff_username_key");
        assert!(err.is_unique_violation());
        assert_eq!(
            err.to_string(),
            "unique constraint violated: staff_username_key"
        );
    }

    #[test]
    fn test_non_database_sqlx_error_is_not_unique() {
        let err = StoreError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(matches!(err, StoreError::Database(_)));
    }
}
