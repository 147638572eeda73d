use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let db = match err {
        sqlx::Error::RowNotFound => return RepoError::NotFound,
        sqlx::Error::PoolTimedOut => return RepoError::Timeout,
        sqlx::Error::Database(db) => db,
        other => return RepoError::from_persistence(other),
    };

    if db.code().as_deref() == Some(QUERY_CANCELED) {
        return RepoError::Timeout;
    }

    match db.kind() {
        ErrorKind::UniqueViolation => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        ErrorKind::ForeignKeyViolation => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => RepoError::Integrity {
            message: db.message().to_string(),
        },
        _ if db.message().contains("invalid input syntax") => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        _ => RepoError::from_persistence(db.message()),
    }
}
