//! Entity Store: row-level persistence for incidents, brigades and equipment.
//!
//! Callers hand in values that the record service has already validated. Each
//! write touches one row; partial-merge updates read and write inside a single
//! transaction so a failure leaves the previous row intact.

pub mod brigades;
pub mod equipment;
pub mod incidents;

use rusqlite::{params_from_iter, Connection, Row};

use crate::error::AppError;
use crate::query::{BuiltQuery, EntityKind};

pub(crate) fn run_list_query<T, F>(
    conn: &Connection,
    kind: EntityKind,
    query: &BuiltQuery,
    map: F,
) -> Result<Vec<T>, AppError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&query.sql).map_err(|e| {
        AppError::storage(
            "DB_QUERY_FAILED",
            format!("Failed to prepare {} list query", kind.table()),
        )
        .with_details(e.to_string())
    })?;

    let rows = stmt
        .query_map(params_from_iter(query.params.iter()), map)
        .map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", format!("Failed to query {}", kind.table()))
                .with_details(e.to_string())
        })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| {
            AppError::storage(
                "DB_QUERY_FAILED",
                format!("Failed to decode {} row", kind.label().to_lowercase()),
            )
            .with_details(e.to_string())
        })?);
    }

    log::debug!("Fetched {} {} with filters", out.len(), kind.table());
    Ok(out)
}

pub(crate) fn get_by_id<T, F>(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    map: F,
) -> Result<T, AppError>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        kind.select_list(),
        kind.table()
    );
    conn.query_row(&sql, [id], map).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::not_found(format!("{} not found", kind.label())).with_details(format!("id={id}"))
        }
        other => AppError::storage(
            "DB_QUERY_FAILED",
            format!("Failed to load {}", kind.label().to_lowercase()),
        )
        .with_details(other.to_string()),
    })
}

pub(crate) fn delete_by_id(conn: &Connection, kind: EntityKind, id: i64) -> Result<(), AppError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
    let changed = conn.execute(&sql, [id]).map_err(|e| {
        AppError::storage(
            "DB_WRITE_FAILED",
            format!("Failed to delete {}", kind.label().to_lowercase()),
        )
        .with_details(e.to_string())
    })?;

    if changed == 0 {
        return Err(AppError::not_found(format!("{} not found", kind.label()))
            .with_details(format!("id={id}")));
    }
    log::info!("{} ID:{id} deleted", kind.label());
    Ok(())
}

pub fn count_rows(conn: &Connection, kind: EntityKind) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    conn.query_row(&sql, [], |row| row.get(0)).map_err(|e| {
        AppError::storage("DB_QUERY_FAILED", format!("Failed to count {}", kind.table()))
            .with_details(e.to_string())
    })
}

pub(crate) fn begin(conn: &mut Connection) -> Result<rusqlite::Transaction<'_>, AppError> {
    conn.transaction().map_err(|e| {
        AppError::storage("DB_TX_FAILED", "Failed to start transaction").with_details(e.to_string())
    })
}

pub(crate) fn commit(tx: rusqlite::Transaction<'_>) -> Result<(), AppError> {
    tx.commit().map_err(|e| {
        AppError::storage("DB_TX_FAILED", "Failed to commit transaction").with_details(e.to_string())
    })
}

/// Apply a patch value to a mandatory column.
pub(crate) fn merge_required(current: String, patch: &Option<String>) -> String {
    match patch {
        Some(v) => v.clone(),
        None => current,
    }
}

/// Apply a patch value to an optional column; an empty patch value clears it.
pub(crate) fn merge_optional(current: Option<String>, patch: &Option<String>) -> Option<String> {
    match patch {
        Some(v) if v.is_empty() => None,
        Some(v) => Some(v.clone()),
        None => current,
    }
}
