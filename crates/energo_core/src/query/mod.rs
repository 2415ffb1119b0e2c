//! Filter/sort specifications and the parameterized list queries built from them.
//!
//! Column names reach SQL only through the static tables below; every caller
//! value (search text, status, type) is bound as a parameter.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::domain::IncidentStatus;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Incident,
    Brigade,
    Equipment,
}

const INCIDENT_SELECT: &str = "id, incident_type, description, location, affected_consumers, assigned_brigade, status, registered_at, resolved_at";
const BRIGADE_SELECT: &str = "id, name, specialization, contact_info";
const EQUIPMENT_SELECT: &str = "id, name, type, model, serial_number, installation_date, status, last_maintenance_date, location";

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Incident => "incidents",
            EntityKind::Brigade => "brigades",
            EntityKind::Equipment => "equipment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Incident => "Incident",
            EntityKind::Brigade => "Brigade",
            EntityKind::Equipment => "Equipment",
        }
    }

    /// Column list in the order the repo row mappers decode.
    pub fn select_list(&self) -> &'static str {
        match self {
            EntityKind::Incident => INCIDENT_SELECT,
            EntityKind::Brigade => BRIGADE_SELECT,
            EntityKind::Equipment => EQUIPMENT_SELECT,
        }
    }

    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Incident => &["description", "location"],
            EntityKind::Brigade => &["name", "specialization"],
            EntityKind::Equipment => &["name", "type", "serial_number", "location"],
        }
    }

    pub fn sort_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Incident => &[
                "id",
                "incident_type",
                "description",
                "location",
                "affected_consumers",
                "assigned_brigade",
                "status",
                "registered_at",
                "resolved_at",
            ],
            EntityKind::Brigade => &["id", "name", "specialization", "contact_info"],
            EntityKind::Equipment => &[
                "id",
                "name",
                "type",
                "model",
                "serial_number",
                "installation_date",
                "status",
                "last_maintenance_date",
                "location",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Newest registrations first for incidents; name ascending otherwise.
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Incident => Self::new("registered_at", SortDirection::Desc),
            EntityKind::Brigade | EntityKind::Equipment => Self::new("name", SortDirection::Asc),
        }
    }

    /// Reselecting the active column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: &str) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column.to_string();
            self.direction = SortDirection::Asc;
        }
    }
}

/// Orthogonal list predicates, combined with AND.
///
/// `status`, `incident_type` and `active_only` only apply to incidents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSpec {
    /// Case-sensitive substring matched against the entity's search columns.
    pub search: Option<String>,
    pub status: Option<IncidentStatus>,
    pub incident_type: Option<String>,
    /// Exclude resolved incidents.
    pub active_only: bool,
}

impl FilterSpec {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn incident_type_value(&self) -> Option<&str> {
        self.incident_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn has_incident_predicates(&self) -> bool {
        self.status.is_some() || self.incident_type_value().is_some() || self.active_only
    }
}

/// SQL text plus positional parameters, ready for `rusqlite::params_from_iter`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

pub fn resolve_sort_column(kind: EntityKind, column: &str) -> Result<&'static str, AppError> {
    kind.sort_columns()
        .iter()
        .copied()
        .find(|c| *c == column)
        .ok_or_else(|| {
            AppError::validation(
                "QUERY_UNKNOWN_SORT_COLUMN",
                format!("Cannot sort {} by this column", kind.table()),
            )
            .with_field("sort")
            .with_details(format!("column={column}"))
        })
}

pub fn build_list_query(
    kind: EntityKind,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<BuiltQuery, AppError> {
    let sort_column = resolve_sort_column(kind, &sort.column)?;

    if kind != EntityKind::Incident && filter.has_incident_predicates() {
        return Err(AppError::validation(
            "QUERY_FILTER_UNSUPPORTED",
            format!(
                "Status, type and active-only filters do not apply to {}",
                kind.table()
            ),
        )
        .with_field("filter"));
    }

    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(text) = filter.search_text() {
        params.push(Value::Text(text.to_string()));
        let n = params.len();
        let any_column = kind
            .search_columns()
            .iter()
            .map(|c| format!("instr({c}, ?{n}) > 0"))
            .collect::<Vec<_>>()
            .join(" OR ");
        clauses.push(format!("({any_column})"));
    }

    if let Some(status) = filter.status {
        params.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("status = ?{}", params.len()));
    }

    if let Some(incident_type) = filter.incident_type_value() {
        params.push(Value::Text(incident_type.to_string()));
        clauses.push(format!("incident_type = ?{}", params.len()));
    }

    if filter.active_only {
        params.push(Value::Text(IncidentStatus::Resolved.as_str().to_string()));
        clauses.push(format!("status != ?{}", params.len()));
    }

    let mut sql = format!("SELECT {} FROM {}", kind.select_list(), kind.table());
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {sort_column} {}", sort.direction.as_sql()));
    if sort_column != "id" {
        sql.push_str(", id ASC");
    }

    Ok(BuiltQuery { sql, params })
}
