//! Record Service: validates operator input, then delegates to the Entity Store.
//!
//! Every check here runs before the first statement touches the store, so a
//! rejected call never leaves a partial write behind.

use rusqlite::Connection;

use crate::domain::{
    Brigade, BrigadePatch, DeleteConfirmation, Equipment, EquipmentPatch, Incident,
    IncidentPatch, IncidentStatus, NewBrigade, NewEquipment, NewIncident,
};
use crate::error::AppError;
use crate::lifecycle::{plan_transition, TransitionOutcome, TransitionPlan};
use crate::repo::{self, brigades, equipment, incidents};
use crate::timestamps::{format_timestamp, normalize_optional_date, Clock};

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        log::warn!("Rejected write with missing mandatory field {field}");
        return Err(
            AppError::validation("VALIDATION_REQUIRED_FIELD", format!("{field} is required"))
                .with_field(field),
        );
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a patch value for a mandatory column; clearing it is not allowed.
fn patch_required(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    value.map(|v| required(field, &v)).transpose()
}

/// Trim a patch value for an optional column; an empty result means "clear".
fn patch_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn patch_date(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    match patch_optional(value) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(Some(v)),
        Some(v) => normalize_optional_date(field, Some(&v)),
    }
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

pub fn create_incident(
    conn: &Connection,
    clock: &dyn Clock,
    new: NewIncident,
) -> Result<Incident, AppError> {
    let new = NewIncident {
        incident_type: required("incident_type", &new.incident_type)?,
        description: required("description", &new.description)?,
        location: required("location", &new.location)?,
        affected_consumers: optional(new.affected_consumers),
        assigned_brigade: optional(new.assigned_brigade),
    };

    let registered_at = format_timestamp(clock.now())?;
    let id = incidents::insert_incident(conn, &new, &registered_at)?;
    log::info!("New incident registered with ID: {id}");

    Ok(Incident {
        id,
        incident_type: new.incident_type,
        description: new.description,
        location: new.location,
        affected_consumers: new.affected_consumers,
        assigned_brigade: new.assigned_brigade,
        status: IncidentStatus::Registered,
        registered_at,
        resolved_at: None,
    })
}

pub fn update_incident(
    conn: &mut Connection,
    id: i64,
    patch: IncidentPatch,
) -> Result<Incident, AppError> {
    let patch = IncidentPatch {
        incident_type: patch_required("incident_type", patch.incident_type)?,
        description: patch_required("description", patch.description)?,
        location: patch_required("location", patch.location)?,
        affected_consumers: patch_optional(patch.affected_consumers),
        assigned_brigade: patch_optional(patch.assigned_brigade),
    };

    let updated = incidents::update_incident(conn, id, &patch)?;
    log::info!("Incident ID:{id} updated");
    Ok(updated)
}

pub fn delete_incident(
    conn: &Connection,
    id: i64,
    _confirmed: DeleteConfirmation,
) -> Result<(), AppError> {
    incidents::delete_incident(conn, id)
}

/// Move an incident towards `target`, stamping the resolution time when it resolves.
pub fn transition_incident_status(
    conn: &mut Connection,
    clock: &dyn Clock,
    id: i64,
    target: IncidentStatus,
) -> Result<TransitionOutcome, AppError> {
    let tx = repo::begin(conn)?;
    let current = incidents::get_incident(&tx, id)?;

    match plan_transition(current.status, target)? {
        TransitionPlan::NoEffect => {
            log::info!("Incident ID:{id} is already {}", current.status);
            Ok(TransitionOutcome::NoEffect {
                id,
                current: current.status,
            })
        }
        TransitionPlan::Apply {
            to,
            stamp_resolution,
        } => {
            let resolved_at = if stamp_resolution {
                Some(format_timestamp(clock.now())?)
            } else {
                None
            };
            incidents::write_incident_status(&tx, id, to, resolved_at.as_deref())?;
            repo::commit(tx)?;
            log::info!("Incident ID:{id} status updated to '{to}'");

            Ok(TransitionOutcome::Applied {
                id,
                from: current.status,
                to,
                resolved_at,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Brigades
// ---------------------------------------------------------------------------

pub fn create_brigade(conn: &Connection, new: NewBrigade) -> Result<Brigade, AppError> {
    let new = NewBrigade {
        name: required("name", &new.name)?,
        specialization: optional(new.specialization),
        contact_info: optional(new.contact_info),
    };

    let id = brigades::insert_brigade(conn, &new).inspect_err(|e| {
        if e.kind == crate::error::ErrorKind::ConstraintViolation {
            log::warn!("Brigade with name '{}' already exists", new.name);
        }
    })?;
    log::info!("New brigade '{}' added with ID: {id}", new.name);

    Ok(Brigade {
        id,
        name: new.name,
        specialization: new.specialization,
        contact_info: new.contact_info,
    })
}

pub fn update_brigade(
    conn: &mut Connection,
    id: i64,
    patch: BrigadePatch,
) -> Result<Brigade, AppError> {
    let patch = BrigadePatch {
        name: patch_required("name", patch.name)?,
        specialization: patch_optional(patch.specialization),
        contact_info: patch_optional(patch.contact_info),
    };

    let updated = brigades::update_brigade(conn, id, &patch)?;
    log::info!("Brigade ID:{id} updated");
    Ok(updated)
}

pub fn delete_brigade(
    conn: &Connection,
    id: i64,
    _confirmed: DeleteConfirmation,
) -> Result<(), AppError> {
    brigades::delete_brigade(conn, id)
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

pub fn create_equipment(conn: &Connection, new: NewEquipment) -> Result<Equipment, AppError> {
    let new = NewEquipment {
        name: required("name", &new.name)?,
        equipment_type: required("type", &new.equipment_type)?,
        model: optional(new.model),
        serial_number: required("serial_number", &new.serial_number)?,
        installation_date: normalize_optional_date(
            "installation_date",
            new.installation_date.as_deref(),
        )?,
        status: optional(new.status),
        last_maintenance_date: normalize_optional_date(
            "last_maintenance_date",
            new.last_maintenance_date.as_deref(),
        )?,
        location: optional(new.location),
    };

    let id = equipment::insert_equipment(conn, &new).inspect_err(|e| {
        if e.kind == crate::error::ErrorKind::ConstraintViolation {
            log::warn!(
                "Equipment with serial number '{}' already exists",
                new.serial_number
            );
        }
    })?;
    log::info!("New equipment '{}' added with ID: {id}", new.name);

    Ok(Equipment {
        id,
        name: new.name,
        equipment_type: new.equipment_type,
        model: new.model,
        serial_number: new.serial_number,
        installation_date: new.installation_date,
        status: new.status,
        last_maintenance_date: new.last_maintenance_date,
        location: new.location,
    })
}

pub fn update_equipment(
    conn: &mut Connection,
    id: i64,
    patch: EquipmentPatch,
) -> Result<Equipment, AppError> {
    let patch = EquipmentPatch {
        name: patch_required("name", patch.name)?,
        equipment_type: patch_required("type", patch.equipment_type)?,
        model: patch_optional(patch.model),
        serial_number: patch_required("serial_number", patch.serial_number)?,
        installation_date: patch_date("installation_date", patch.installation_date)?,
        status: patch_optional(patch.status),
        last_maintenance_date: patch_date("last_maintenance_date", patch.last_maintenance_date)?,
        location: patch_optional(patch.location),
    };

    let updated = equipment::update_equipment(conn, id, &patch)?;
    log::info!("Equipment ID:{id} updated");
    Ok(updated)
}

pub fn delete_equipment(
    conn: &Connection,
    id: i64,
    _confirmed: DeleteConfirmation,
) -> Result<(), AppError> {
    equipment::delete_equipment(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_date_keeps_clear_marker_and_canonicalizes() {
        assert_eq!(patch_date("d", None).unwrap(), None);
        assert_eq!(patch_date("d", Some("  ".to_string())).unwrap().as_deref(), Some(""));
        assert_eq!(
            patch_date("d", Some("2023-06-01".to_string())).unwrap().as_deref(),
            Some("2023-06-01")
        );
        assert_eq!(
            patch_date("d", Some("2023-06-31".to_string())).unwrap_err().code,
            "VALIDATION_INVALID_DATE"
        );
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Alpha ").unwrap(), "Alpha");
        let err = required("name", " \t").unwrap_err();
        assert_eq!(err.code, "VALIDATION_REQUIRED_FIELD");
        assert_eq!(err.field.as_deref(), Some("name"));
    }
}
