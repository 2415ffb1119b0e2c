use rusqlite::{Connection, Row};

use crate::domain::{Brigade, BrigadePatch, NewBrigade};
use crate::error::{map_write_error, AppError};
use crate::query::{build_list_query, EntityKind, FilterSpec, SortSpec};

use super::{begin, commit, delete_by_id, get_by_id, merge_optional, merge_required, run_list_query};

pub(crate) fn brigade_from_row(row: &Row<'_>) -> rusqlite::Result<Brigade> {
    Ok(Brigade {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        contact_info: row.get(3)?,
    })
}

pub fn insert_brigade(conn: &Connection, new: &NewBrigade) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO brigades(name, specialization, contact_info) VALUES (?1, ?2, ?3)",
        rusqlite::params![new.name, new.specialization, new.contact_info],
    )
    .map_err(|e| map_write_error(e, Some("name"), "Failed to create brigade"))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_brigade(conn: &Connection, id: i64) -> Result<Brigade, AppError> {
    get_by_id(conn, EntityKind::Brigade, id, brigade_from_row)
}

pub fn list_brigades(
    conn: &Connection,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<Vec<Brigade>, AppError> {
    let query = build_list_query(EntityKind::Brigade, filter, sort)?;
    run_list_query(conn, EntityKind::Brigade, &query, brigade_from_row)
}

pub fn update_brigade(
    conn: &mut Connection,
    id: i64,
    patch: &BrigadePatch,
) -> Result<Brigade, AppError> {
    let tx = begin(conn)?;
    let current = get_brigade(&tx, id)?;

    let merged = Brigade {
        name: merge_required(current.name, &patch.name),
        specialization: merge_optional(current.specialization, &patch.specialization),
        contact_info: merge_optional(current.contact_info, &patch.contact_info),
        ..current
    };

    tx.execute(
        "UPDATE brigades SET name = ?1, specialization = ?2, contact_info = ?3 WHERE id = ?4",
        rusqlite::params![merged.name, merged.specialization, merged.contact_info, id],
    )
    .map_err(|e| map_write_error(e, Some("name"), "Failed to update brigade"))?;

    commit(tx)?;
    Ok(merged)
}

pub fn delete_brigade(conn: &Connection, id: i64) -> Result<(), AppError> {
    delete_by_id(conn, EntityKind::Brigade, id)
}
