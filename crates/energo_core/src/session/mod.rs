//! The narrow command/query surface offered to the presentation layer.
//!
//! A `Session` exists only once its store has been opened and migrated; a store
//! failure at that point is reported once and no session is handed out.

use std::path::Path;

use rusqlite::Connection;

use crate::analytics::{self, AggregationKind, AggregationOutcome, DateWindow};
use crate::db;
use crate::demo::{self, DemoSeedSummary};
use crate::domain::{
    Brigade, BrigadePatch, DeleteConfirmation, Equipment, EquipmentPatch, Incident,
    IncidentPatch, IncidentStatus, NewBrigade, NewEquipment, NewIncident,
};
use crate::error::AppError;
use crate::export::{self, ExportRow};
use crate::lifecycle::TransitionOutcome;
use crate::query::{EntityKind, FilterSpec, SortSpec};
use crate::records;
use crate::repo::{self, brigades, equipment, incidents};
use crate::timestamps::{Clock, SystemClock};
use crate::workspace::{self, WorkspaceConfig, WorkspaceMetadata};

pub struct Session {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl Session {
    pub fn open(config: &WorkspaceConfig) -> Result<Self, AppError> {
        Self::open_with_clock(config, Box::new(SystemClock))
    }

    pub fn open_with_clock(config: &WorkspaceConfig, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let conn = workspace::connect(config).inspect_err(|e| {
            log::error!("Storage unavailable, refusing to start session: {e}");
        })?;
        log::info!("Session opened on {}", config.db_path.display());
        Ok(Self { conn, clock })
    }

    pub fn in_memory(clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let mut conn = db::open_in_memory()?;
        db::migrate(&mut conn)?;
        Ok(Self { conn, clock })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn metadata(&self, db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
        workspace::workspace_metadata(&self.conn, db_path)
    }

    pub fn count(&self, kind: EntityKind) -> Result<i64, AppError> {
        repo::count_rows(&self.conn, kind)
    }

    pub fn seed_demo(&mut self) -> Result<DemoSeedSummary, AppError> {
        demo::seed_demo_dataset(&mut self.conn)
    }

    // Incidents

    pub fn list_incidents(&self, filter: &FilterSpec, sort: &SortSpec) -> Result<Vec<Incident>, AppError> {
        incidents::list_incidents(&self.conn, filter, sort)
    }

    pub fn get_incident(&self, id: i64) -> Result<Incident, AppError> {
        incidents::get_incident(&self.conn, id)
    }

    pub fn create_incident(&mut self, new: NewIncident) -> Result<Incident, AppError> {
        records::create_incident(&self.conn, self.clock.as_ref(), new)
    }

    pub fn update_incident(&mut self, id: i64, patch: IncidentPatch) -> Result<Incident, AppError> {
        records::update_incident(&mut self.conn, id, patch)
    }

    pub fn delete_incident(&mut self, id: i64, confirmed: DeleteConfirmation) -> Result<(), AppError> {
        records::delete_incident(&self.conn, id, confirmed)
    }

    pub fn transition_incident_status(
        &mut self,
        id: i64,
        target: IncidentStatus,
    ) -> Result<TransitionOutcome, AppError> {
        records::transition_incident_status(&mut self.conn, self.clock.as_ref(), id, target)
    }

    pub fn list_distinct_incident_types(&self) -> Result<Vec<String>, AppError> {
        incidents::list_distinct_incident_types(&self.conn)
    }

    // Brigades

    pub fn list_brigades(&self, filter: &FilterSpec, sort: &SortSpec) -> Result<Vec<Brigade>, AppError> {
        brigades::list_brigades(&self.conn, filter, sort)
    }

    pub fn get_brigade(&self, id: i64) -> Result<Brigade, AppError> {
        brigades::get_brigade(&self.conn, id)
    }

    pub fn create_brigade(&mut self, new: NewBrigade) -> Result<Brigade, AppError> {
        records::create_brigade(&self.conn, new)
    }

    pub fn update_brigade(&mut self, id: i64, patch: BrigadePatch) -> Result<Brigade, AppError> {
        records::update_brigade(&mut self.conn, id, patch)
    }

    pub fn delete_brigade(&mut self, id: i64, confirmed: DeleteConfirmation) -> Result<(), AppError> {
        records::delete_brigade(&self.conn, id, confirmed)
    }

    // Equipment

    pub fn list_equipment(&self, filter: &FilterSpec, sort: &SortSpec) -> Result<Vec<Equipment>, AppError> {
        equipment::list_equipment(&self.conn, filter, sort)
    }

    pub fn get_equipment(&self, id: i64) -> Result<Equipment, AppError> {
        equipment::get_equipment(&self.conn, id)
    }

    pub fn create_equipment(&mut self, new: NewEquipment) -> Result<Equipment, AppError> {
        records::create_equipment(&self.conn, new)
    }

    pub fn update_equipment(&mut self, id: i64, patch: EquipmentPatch) -> Result<Equipment, AppError> {
        records::update_equipment(&mut self.conn, id, patch)
    }

    pub fn delete_equipment(&mut self, id: i64, confirmed: DeleteConfirmation) -> Result<(), AppError> {
        records::delete_equipment(&self.conn, id, confirmed)
    }

    // Reports and export

    pub fn aggregate_incidents(
        &self,
        window: &DateWindow,
        kind: AggregationKind,
    ) -> Result<AggregationOutcome, AppError> {
        analytics::aggregate_incidents(&self.conn, window, kind)
    }

    pub fn export_incidents(&self, filter: &FilterSpec, sort: &SortSpec) -> Result<Vec<ExportRow>, AppError> {
        export::export_incidents(&self.conn, filter, sort)
    }
}
