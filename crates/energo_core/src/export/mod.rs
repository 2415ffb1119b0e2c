use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::domain::Incident;
use crate::error::AppError;
use crate::query::{FilterSpec, SortSpec};
use crate::repo::incidents::list_incidents;

pub const INCIDENT_EXPORT_HEADERS: [&str; 9] = [
    "id",
    "incident_type",
    "description",
    "location",
    "affected_consumers",
    "assigned_brigade",
    "status",
    "registered_at",
    "resolved_at",
];

/// Flat incident row handed to an external file writer; `None` renders as an empty cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRow {
    pub id: i64,
    pub incident_type: String,
    pub description: String,
    pub location: String,
    pub affected_consumers: Option<String>,
    pub assigned_brigade: Option<String>,
    pub status: String,
    pub registered_at: String,
    pub resolved_at: Option<String>,
}

impl From<Incident> for ExportRow {
    fn from(inc: Incident) -> Self {
        Self {
            id: inc.id,
            incident_type: inc.incident_type,
            description: inc.description,
            location: inc.location,
            affected_consumers: inc.affected_consumers,
            assigned_brigade: inc.assigned_brigade,
            status: inc.status.as_str().to_string(),
            registered_at: inc.registered_at,
            resolved_at: inc.resolved_at,
        }
    }
}

/// Rows in exactly the order `list_incidents` returns for the same specs.
pub fn export_incidents(
    conn: &Connection,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<Vec<ExportRow>, AppError> {
    let rows = list_incidents(conn, filter, sort)?
        .into_iter()
        .map(ExportRow::from)
        .collect::<Vec<_>>();
    log::info!("Prepared {} incidents for export", rows.len());
    Ok(rows)
}

pub fn render_incidents_csv(rows: &[ExportRow]) -> Result<String, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(INCIDENT_EXPORT_HEADERS).map_err(|e| {
        AppError::storage("EXPORT_CSV_FAILED", "Failed to write CSV header").with_details(e.to_string())
    })?;

    for row in rows {
        let id = row.id.to_string();
        wtr.write_record([
            id.as_str(),
            row.incident_type.as_str(),
            row.description.as_str(),
            row.location.as_str(),
            row.affected_consumers.as_deref().unwrap_or(""),
            row.assigned_brigade.as_deref().unwrap_or(""),
            row.status.as_str(),
            row.registered_at.as_str(),
            row.resolved_at.as_deref().unwrap_or(""),
        ])
        .map_err(|e| {
            AppError::storage("EXPORT_CSV_FAILED", "Failed to write CSV row")
                .with_details(format!("id={}; err={e}", row.id))
        })?;
    }

    let bytes = wtr.into_inner().map_err(|e| {
        AppError::storage("EXPORT_CSV_FAILED", "Failed to flush CSV output").with_details(e.to_string())
    })?;
    String::from_utf8(bytes).map_err(|e| {
        AppError::storage("EXPORT_CSV_FAILED", "CSV output is not valid UTF-8").with_details(e.to_string())
    })
}
