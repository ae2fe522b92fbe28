// sqlx::Error -> AppError mapping

use fairqueue_core::domain::Entry;
use fairqueue_core::error::AppError;

/// SQLite extended result codes for UNIQUE / PRIMARY KEY violations
/// (https://www.sqlite.org/rescode.html)
const UNIQUE_VIOLATION_CODES: [&str; 2] = ["2067", "1555"];

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| UNIQUE_VIOLATION_CODES.contains(&code.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}

/// Convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => {
                let code_str = code.as_ref();
                match code_str {
                    "2067" | "1555" => AppError::Persistence(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "787" | "3850" => AppError::Persistence(format!(
                        "Foreign key constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Persistence(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Persistence(format!("Database full: {}", db_err.message())),
                    _ => AppError::Persistence(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            }
            None => AppError::Persistence(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Persistence(format!("Column not found: {}", col))
        }
        _ => AppError::Persistence(err.to_string()),
    }
}

/// Like `map_sqlx_error`, but a uniqueness clash on an entry insert becomes
/// the retryable `DuplicateSubmission`
pub(crate) fn map_insert_error(err: sqlx::Error, entry: &Entry) -> AppError {
    if is_unique_violation(&err) {
        return AppError::DuplicateSubmission {
            participant_id: entry.owner.clone(),
            submitted_at: entry.submitted_at,
        };
    }
    map_sqlx_error(err)
}
