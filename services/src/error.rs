use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Error taxonomy for the data access layer. Absence of a row is never an
/// error; reads return `Option` or an empty `Vec` instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    DuplicateKey(String),
    #[error("attendance already recorded for this session")]
    DuplicateAttendance,
    #[error("course already assigned to this professor")]
    DuplicateAssignment,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Turns a unique-constraint violation into `dup`; any other storage
    /// error passes through unchanged.
    pub(crate) fn on_conflict(err: DbErr, dup: ServiceError) -> ServiceError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => dup,
            _ => ServiceError::Storage(err),
        }
    }
}
