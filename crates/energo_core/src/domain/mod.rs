use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an incident. Persisted as [`IncidentStatus::as_str`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Registered,
    InProgress,
    Resolved,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 3] = [
        IncidentStatus::Registered,
        IncidentStatus::InProgress,
        IncidentStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Registered => "registered",
            IncidentStatus::InProgress => "in_progress",
            IncidentStatus::Resolved => "resolved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported grid fault tracked from registration to resolution.
///
/// Notes:
/// - `registered_at` is stamped once at creation and never rewritten.
/// - `resolved_at` is `Some` exactly when `status` is `Resolved`.
/// - `assigned_brigade` is a free-text label, not a reference to a [`Brigade`] row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Incident {
    pub id: i64,
    pub incident_type: String,
    pub description: String,
    pub location: String,
    pub affected_consumers: Option<String>,
    pub assigned_brigade: Option<String>,
    pub status: IncidentStatus,
    pub registered_at: String,
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Brigade {
    pub id: i64,
    pub name: String,
    pub specialization: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    pub equipment_type: String,
    pub model: Option<String>,
    pub serial_number: String,
    pub installation_date: Option<String>,
    pub status: Option<String>,
    pub last_maintenance_date: Option<String>,
    pub location: Option<String>,
}

/// Operator-supplied fields for a new incident. Status and timestamps are not settable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewIncident {
    pub incident_type: String,
    pub description: String,
    pub location: String,
    pub affected_consumers: Option<String>,
    pub assigned_brigade: Option<String>,
}

/// Partial edit of an incident.
///
/// `None` leaves a field unchanged; `Some("")` clears an optional field and is
/// rejected for a mandatory one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentPatch {
    pub incident_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub affected_consumers: Option<String>,
    pub assigned_brigade: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBrigade {
    pub name: String,
    pub specialization: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrigadePatch {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEquipment {
    pub name: String,
    pub equipment_type: String,
    pub model: Option<String>,
    pub serial_number: String,
    pub installation_date: Option<String>,
    pub status: Option<String>,
    pub last_maintenance_date: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub equipment_type: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub installation_date: Option<String>,
    pub status: Option<String>,
    pub last_maintenance_date: Option<String>,
    pub location: Option<String>,
}

/// Caller-side proof that the operator confirmed an irreversible delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfirmation(());

impl DeleteConfirmation {
    pub fn confirmed() -> Self {
        DeleteConfirmation(())
    }
}
