use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification a caller branches on; `code` carries the precise reason.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing mandatory field, malformed date, unsupported filter or sort input.
    Validation,
    /// A uniqueness constraint rejected the write.
    ConstraintViolation,
    /// The targeted identity does not exist.
    NotFound,
    /// The store could not be opened or migrated. Fatal to the session.
    StorageUnavailable,
    /// A statement failed against an otherwise reachable store.
    Storage,
}

/// Single structured error shape used across the core and handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    /// Name of the offending field for validation and constraint errors.
    pub field: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            details: None,
            field: None,
            retryable: false,
        }
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "DB_NOT_FOUND", message)
    }

    pub fn storage(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, code, message)
    }

    pub fn unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable, code, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {} ({field})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}

/// Map a failed write to `ConstraintViolation` when SQLite rejected it on a UNIQUE column.
///
/// `unique_field` names the only unique column of the table being written.
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    unique_field: Option<&str>,
    message: &str,
) -> AppError {
    if let rusqlite::Error::SqliteFailure(ref code, ref msg) = err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation
            && code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            let field = unique_field.unwrap_or("unknown");
            return AppError::new(
                ErrorKind::ConstraintViolation,
                "DB_CONSTRAINT_UNIQUE",
                format!("A record with this {field} already exists"),
            )
            .with_field(field)
            .with_details(msg.clone().unwrap_or_else(|| err.to_string()));
        }
    }
    AppError::storage("DB_WRITE_FAILED", message).with_details(err.to_string())
}
