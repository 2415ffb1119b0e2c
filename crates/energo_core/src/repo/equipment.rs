use rusqlite::{Connection, Row};

use crate::domain::{Equipment, EquipmentPatch, NewEquipment};
use crate::error::{map_write_error, AppError};
use crate::query::{build_list_query, EntityKind, FilterSpec, SortSpec};

use super::{begin, commit, delete_by_id, get_by_id, merge_optional, merge_required, run_list_query};

pub(crate) fn equipment_from_row(row: &Row<'_>) -> rusqlite::Result<Equipment> {
    Ok(Equipment {
        id: row.get(0)?,
        name: row.get(1)?,
        equipment_type: row.get(2)?,
        model: row.get(3)?,
        serial_number: row.get(4)?,
        installation_date: row.get(5)?,
        status: row.get(6)?,
        last_maintenance_date: row.get(7)?,
        location: row.get(8)?,
    })
}

pub fn insert_equipment(conn: &Connection, new: &NewEquipment) -> Result<i64, AppError> {
    conn.execute(
        r#"
      INSERT INTO equipment(
        name, type, model, serial_number, installation_date,
        status, last_maintenance_date, location
      ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
      "#,
        rusqlite::params![
            new.name,
            new.equipment_type,
            new.model,
            new.serial_number,
            new.installation_date,
            new.status,
            new.last_maintenance_date,
            new.location,
        ],
    )
    .map_err(|e| map_write_error(e, Some("serial_number"), "Failed to create equipment"))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_equipment(conn: &Connection, id: i64) -> Result<Equipment, AppError> {
    get_by_id(conn, EntityKind::Equipment, id, equipment_from_row)
}

pub fn list_equipment(
    conn: &Connection,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<Vec<Equipment>, AppError> {
    let query = build_list_query(EntityKind::Equipment, filter, sort)?;
    run_list_query(conn, EntityKind::Equipment, &query, equipment_from_row)
}

pub fn update_equipment(
    conn: &mut Connection,
    id: i64,
    patch: &EquipmentPatch,
) -> Result<Equipment, AppError> {
    let tx = begin(conn)?;
    let current = get_equipment(&tx, id)?;

    let merged = Equipment {
        name: merge_required(current.name, &patch.name),
        equipment_type: merge_required(current.equipment_type, &patch.equipment_type),
        model: merge_optional(current.model, &patch.model),
        serial_number: merge_required(current.serial_number, &patch.serial_number),
        installation_date: merge_optional(current.installation_date, &patch.installation_date),
        status: merge_optional(current.status, &patch.status),
        last_maintenance_date: merge_optional(
            current.last_maintenance_date,
            &patch.last_maintenance_date,
        ),
        location: merge_optional(current.location, &patch.location),
        ..current
    };

    tx.execute(
        r#"
      UPDATE equipment SET
        name = ?1, type = ?2, model = ?3, serial_number = ?4, installation_date = ?5,
        status = ?6, last_maintenance_date = ?7, location = ?8
      WHERE id = ?9
      "#,
        rusqlite::params![
            merged.name,
            merged.equipment_type,
            merged.model,
            merged.serial_number,
            merged.installation_date,
            merged.status,
            merged.last_maintenance_date,
            merged.location,
            id,
        ],
    )
    .map_err(|e| map_write_error(e, Some("serial_number"), "Failed to update equipment"))?;

    commit(tx)?;
    Ok(merged)
}

pub fn delete_equipment(conn: &Connection, id: i64) -> Result<(), AppError> {
    delete_by_id(conn, EntityKind::Equipment, id)
}
