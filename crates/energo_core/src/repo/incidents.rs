use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::domain::{Incident, IncidentPatch, IncidentStatus, NewIncident};
use crate::error::AppError;
use crate::query::{build_list_query, EntityKind, FilterSpec, SortSpec};

use super::{begin, commit, delete_by_id, get_by_id, merge_optional, merge_required, run_list_query};

pub(crate) fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<Incident> {
    let raw_status: String = row.get(6)?;
    let status = IncidentStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            Box::new(
                AppError::storage("DB_DECODE_FAILED", "Unknown incident status")
                    .with_details(format!("status={raw_status}")),
            ),
        )
    })?;

    Ok(Incident {
        id: row.get(0)?,
        incident_type: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        affected_consumers: row.get(4)?,
        assigned_brigade: row.get(5)?,
        status,
        registered_at: row.get(7)?,
        resolved_at: row.get(8)?,
    })
}

/// Insert a validated incident in `Registered` status and return its identity.
pub fn insert_incident(
    conn: &Connection,
    new: &NewIncident,
    registered_at: &str,
) -> Result<i64, AppError> {
    conn.execute(
        r#"
      INSERT INTO incidents(
        incident_type, description, location, affected_consumers, assigned_brigade,
        status, registered_at, resolved_at
      ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)
      "#,
        rusqlite::params![
            new.incident_type,
            new.description,
            new.location,
            new.affected_consumers,
            new.assigned_brigade,
            IncidentStatus::Registered.as_str(),
            registered_at,
        ],
    )
    .map_err(|e| {
        AppError::storage("DB_WRITE_FAILED", "Failed to register incident").with_details(e.to_string())
    })?;

    Ok(conn.last_insert_rowid())
}

pub fn get_incident(conn: &Connection, id: i64) -> Result<Incident, AppError> {
    get_by_id(conn, EntityKind::Incident, id, incident_from_row)
}

pub fn list_incidents(
    conn: &Connection,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<Vec<Incident>, AppError> {
    let query = build_list_query(EntityKind::Incident, filter, sort)?;
    run_list_query(conn, EntityKind::Incident, &query, incident_from_row)
}

/// Merge `patch` into the stored editable fields. Status and timestamps are untouched.
pub fn update_incident(
    conn: &mut Connection,
    id: i64,
    patch: &IncidentPatch,
) -> Result<Incident, AppError> {
    let tx = begin(conn)?;
    let current = get_incident(&tx, id)?;

    let merged = Incident {
        incident_type: merge_required(current.incident_type, &patch.incident_type),
        description: merge_required(current.description, &patch.description),
        location: merge_required(current.location, &patch.location),
        affected_consumers: merge_optional(current.affected_consumers, &patch.affected_consumers),
        assigned_brigade: merge_optional(current.assigned_brigade, &patch.assigned_brigade),
        ..current
    };

    tx.execute(
        r#"
      UPDATE incidents SET
        incident_type = ?1, description = ?2, location = ?3,
        affected_consumers = ?4, assigned_brigade = ?5
      WHERE id = ?6
      "#,
        rusqlite::params![
            merged.incident_type,
            merged.description,
            merged.location,
            merged.affected_consumers,
            merged.assigned_brigade,
            id,
        ],
    )
    .map_err(|e| {
        AppError::storage("DB_WRITE_FAILED", "Failed to update incident").with_details(e.to_string())
    })?;

    commit(tx)?;
    Ok(merged)
}

/// Persist a status change. `resolved_at` must be `Some` exactly when `status` is `Resolved`.
pub fn write_incident_status(
    conn: &Connection,
    id: i64,
    status: IncidentStatus,
    resolved_at: Option<&str>,
) -> Result<(), AppError> {
    let changed = conn
        .execute(
            "UPDATE incidents SET status = ?1, resolved_at = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), resolved_at, id],
        )
        .map_err(|e| {
            AppError::storage("DB_WRITE_FAILED", "Failed to update incident status")
                .with_details(e.to_string())
        })?;

    if changed == 0 {
        return Err(AppError::not_found("Incident not found").with_details(format!("id={id}")));
    }
    Ok(())
}

pub fn delete_incident(conn: &Connection, id: i64) -> Result<(), AppError> {
    delete_by_id(conn, EntityKind::Incident, id)
}

/// Distinct non-empty incident types, ascending.
pub fn list_distinct_incident_types(conn: &Connection) -> Result<Vec<String>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT DISTINCT incident_type FROM incidents
      WHERE incident_type IS NOT NULL AND incident_type != ''
      ORDER BY incident_type ASC
      "#,
        )
        .map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", "Failed to prepare incident types query")
                .with_details(e.to_string())
        })?;

    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(|e| {
        AppError::storage("DB_QUERY_FAILED", "Failed to query incident types")
            .with_details(e.to_string())
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", "Failed to decode incident type row")
                .with_details(e.to_string())
        })?);
    }
    Ok(out)
}
