use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::query::EntityKind;
use crate::repo::count_rows;

/// How [`connect`] treats the database file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Open an existing file, creating a fresh database when it is missing.
    #[default]
    OpenOrCreate,
    OpenExisting,
    CreateNew,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub db_path: PathBuf,
    #[serde(default)]
    pub mode: OpenMode,
}

impl WorkspaceConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            mode: OpenMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceMetadata {
    pub db_path: String,
    pub incident_count: i64,
    pub brigade_count: i64,
    pub equipment_count: i64,
    pub is_empty: bool,
}

fn validate_db_path(path: &Path) -> Result<(), AppError> {
    if path.as_os_str().is_empty() {
        return Err(AppError::validation(
            "WORKSPACE_INVALID_PATH",
            "Workspace DB path is empty",
        ));
    }
    if path.exists() && path.is_dir() {
        return Err(AppError::validation(
            "WORKSPACE_INVALID_PATH",
            "Workspace DB path must be a file (not a directory)",
        )
        .with_details(path.display().to_string()));
    }
    Ok(())
}

fn open_and_migrate(db_path: &Path, code: &str, message: &str) -> Result<Connection, AppError> {
    let mut conn = crate::db::open(db_path).map_err(|e| {
        let details = e.details.clone().unwrap_or_else(|| e.to_string());
        AppError::unavailable(code, message).with_details(details)
    })?;

    crate::db::migrate(&mut conn).map_err(|e| {
        let details = e.details.clone().unwrap_or_else(|| e.to_string());
        AppError::unavailable(
            "WORKSPACE_MIGRATION_FAILED",
            "Failed to migrate workspace database",
        )
        .with_details(details)
    })?;

    Ok(conn)
}

pub fn open_workspace_connection(db_path: &Path) -> Result<Connection, AppError> {
    validate_db_path(db_path)?;

    if !db_path.exists() {
        return Err(AppError::new(
            ErrorKind::StorageUnavailable,
            "WORKSPACE_DB_NOT_FOUND",
            "Workspace database file not found",
        )
        .with_details(db_path.display().to_string()));
    }

    open_and_migrate(db_path, "WORKSPACE_OPEN_FAILED", "Failed to open workspace database")
}

pub fn create_workspace_connection(db_path: &Path) -> Result<Connection, AppError> {
    validate_db_path(db_path)?;

    if db_path.exists() {
        return Err(AppError::validation(
            "WORKSPACE_CREATE_FAILED",
            "Workspace DB file already exists",
        )
        .with_details(db_path.display().to_string()));
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::unavailable(
                "WORKSPACE_CREATE_FAILED",
                "Failed to create workspace directory",
            )
            .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }

    // Opening a non-existent SQLite path creates the file.
    let conn = open_and_migrate(
        db_path,
        "WORKSPACE_CREATE_FAILED",
        "Failed to create workspace database",
    )?;
    log::info!("Created workspace database at {}", db_path.display());
    Ok(conn)
}

pub fn connect(config: &WorkspaceConfig) -> Result<Connection, AppError> {
    let path = config.db_path.as_path();
    match config.mode {
        OpenMode::OpenExisting => open_workspace_connection(path),
        OpenMode::CreateNew => create_workspace_connection(path),
        OpenMode::OpenOrCreate if path.exists() => open_workspace_connection(path),
        OpenMode::OpenOrCreate => create_workspace_connection(path),
    }
}

pub fn workspace_metadata(conn: &Connection, db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
    let incident_count = count_rows(conn, EntityKind::Incident)?;
    let brigade_count = count_rows(conn, EntityKind::Brigade)?;
    let equipment_count = count_rows(conn, EntityKind::Equipment)?;
    Ok(WorkspaceMetadata {
        db_path: db_path.to_string_lossy().to_string(),
        incident_count,
        brigade_count,
        equipment_count,
        is_empty: incident_count == 0 && brigade_count == 0 && equipment_count == 0,
    })
}

pub fn create_workspace(db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
    let conn = create_workspace_connection(db_path)?;
    workspace_metadata(&conn, db_path)
}

pub fn open_workspace(db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
    let conn = open_workspace_connection(db_path)?;
    workspace_metadata(&conn, db_path)
}
